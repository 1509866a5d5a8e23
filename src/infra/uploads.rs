//! Filesystem storage for profile images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Formats accepted for avatars and banners.
const ALLOWED_IMAGE_TYPES: &[(imagesize::ImageType, &str)] = &[
    (imagesize::ImageType::Png, "png"),
    (imagesize::ImageType::Jpeg, "jpg"),
    (imagesize::ImageType::Gif, "gif"),
    (imagesize::ImageType::Webp, "webp"),
];

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file is not a supported image")]
    NotAnImage,
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Check the payload is an image, then write it under
    /// `<owner>/<prefix>-<uuid>.<ext>` and return that stored path.
    pub async fn store(
        &self,
        owner: &str,
        prefix: &str,
        data: Bytes,
    ) -> Result<String, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }
        let extension = image_extension(&data).ok_or(UploadStorageError::NotAnImage)?;

        let stored_path = format!("{owner}/{prefix}-{}.{extension}", Uuid::new_v4());
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = write_all(&mut file, &data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        Ok(stored_path)
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the stored payload. Missing files are treated as success.
    pub async fn delete(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> Result<(), std::io::Error> {
    file.write_all(data).await?;
    file.flush().await
}

/// Sniffed type, accepted only when the header also yields dimensions.
fn image_extension(data: &[u8]) -> Option<&'static str> {
    let kind = imagesize::image_type(data).ok()?;
    imagesize::blob_size(data).ok()?;
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == kind)
        .map(|(_, extension)| *extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 transparent PNG.
    const PIXEL_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[tokio::test]
    async fn stores_png_under_owner_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        let stored = storage
            .store("user-1", "avatar", Bytes::from_static(PIXEL_PNG))
            .await
            .unwrap();

        assert!(stored.starts_with("user-1/avatar-"));
        assert!(stored.ends_with(".png"));

        let read = storage.read(&stored).await.unwrap();
        assert_eq!(read.as_ref(), PIXEL_PNG);

        storage.delete(&stored).await.unwrap();
        assert!(matches!(
            storage.read(&stored).await,
            Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound
        ));
        storage.delete(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        let err = storage
            .store("user-1", "avatar", Bytes::from_static(b"plain text, not pixels"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadStorageError::NotAnImage));

        let err = storage
            .store("user-1", "avatar", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadStorageError::EmptyPayload));
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(matches!(
            storage.read("../etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }
}
