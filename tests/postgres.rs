use sqlx::PgPool;

use time::{Duration, OffsetDateTime};

use creatorhub::application::repos::{
    AuthTokensRepo, CreateUserParams, FollowsRepo, IssueTokenParams, MediaRepo, RepoError,
    UpsertMediaParams, UsersRepo,
};
use creatorhub::domain::types::{AuthTokenKind, MediaSource, MediaType, UserRole, WatchStatus};
use creatorhub::infra::db::PostgresRepositories;

fn user(username: &str) -> CreateUserParams {
    CreateUserParams {
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        password_hash: "not-a-real-hash".to_string(),
        role: UserRole::Creator,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn usernames_are_unique_ignoring_case(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let created = repos.create_user(user("Neo")).await.expect("create user");

    let found = repos
        .find_by_username("NEO")
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(found.id, created.id);

    let mut clash = user("neo");
    clash.email = "other@example.com".to_string();
    let err = repos.create_user(clash).await.expect_err("duplicate");
    assert!(
        matches!(err, RepoError::Duplicate { .. }) && err.is_duplicate_of("username"),
        "unexpected error: {err:?}"
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn media_upsert_and_tracking_are_idempotent(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let owner = repos.create_user(user("Trinity")).await.expect("create user");

    let params = UpsertMediaParams {
        media_type: MediaType::Series,
        source: MediaSource::Tmdb,
        external_id: "1399".to_string(),
        title: "Game of Thrones".to_string(),
        poster_url: None,
        total_seasons: Some(8),
        release_year: Some(2011),
    };
    let first = repos.upsert_media(params.clone()).await.expect("insert");
    let second = repos
        .upsert_media(UpsertMediaParams {
            title: "Game of Thrones (2011)".to_string(),
            ..params
        })
        .await
        .expect("refresh");
    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "Game of Thrones (2011)");

    let tracked = repos
        .track(owner.id, first.id, None)
        .await
        .expect("track");
    assert_eq!(tracked.status, WatchStatus::Planned);
    let again = repos
        .track(owner.id, first.id, Some(WatchStatus::Watching))
        .await
        .expect("retrack");
    assert_eq!(again.id, tracked.id);
    assert_eq!(again.status, WatchStatus::Watching);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn follow_edges_are_counted_once(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let fan = repos.create_user(user("Dozer")).await.expect("fan");
    let star = repos.create_user(user("Link")).await.expect("star");

    assert!(repos.follow(fan.id, star.id).await.expect("follow"));
    assert!(!repos.follow(fan.id, star.id).await.expect("follow again"));

    let counts = repos.counts(star.id).await.expect("counts");
    assert_eq!(counts.followers, 1);
    assert_eq!(counts.following, 0);

    let followers = repos.list_followers(star.id, 10).await.expect("followers");
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].username, "Dozer");

    assert!(repos.unfollow(fan.id, star.id).await.expect("unfollow"));
    assert_eq!(repos.counts(star.id).await.expect("counts").followers, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn tokens_are_consumed_once(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let issued = repos
        .replace_token(IssueTokenParams {
            kind: AuthTokenKind::PasswordReset,
            email: "tank@example.com".to_string(),
            token_hash: vec![7; 32],
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
        })
        .await
        .expect("issue");

    let (first, second) = tokio::join!(
        repos.consume_token(AuthTokenKind::PasswordReset, &[7; 32]),
        repos.consume_token(AuthTokenKind::PasswordReset, &[7; 32]),
    );
    let consumed: Vec<_> = [first.expect("consume"), second.expect("consume")]
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(consumed.len(), 1);
    assert_eq!(consumed[0].id, issued.id);
}
