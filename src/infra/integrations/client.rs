//! Shared request plumbing for the third-party API clients.

use std::time::Duration;

use metrics::counter;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::ports::IntegrationError;
use crate::infra::error::InfraError;

const METRIC_INTEGRATION_REQUEST: &str = "creatorhub_integration_request_total";

pub fn build_client(timeout: Duration) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(concat!("creatorhub/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|err| InfraError::HttpClient(err.to_string()))
}

/// Send `request` and decode a JSON body, mapping every failure onto
/// [`IntegrationError`] for `service`.
pub async fn send_json<T>(service: &'static str, request: RequestBuilder) -> Result<T, IntegrationError>
where
    T: DeserializeOwned,
{
    let response = send(service, request).await?;
    response.json::<T>().await.map_err(|err| {
        counter!(METRIC_INTEGRATION_REQUEST, "service" => service, "outcome" => "decode").increment(1);
        IntegrationError::decode(service, err)
    })
}

/// Send `request` and require a 2xx status; the body is discarded.
pub async fn send_unit(service: &'static str, request: RequestBuilder) -> Result<(), IntegrationError> {
    send(service, request).await.map(|_| ())
}

async fn send(
    service: &'static str,
    request: RequestBuilder,
) -> Result<reqwest::Response, IntegrationError> {
    let response = request.send().await.map_err(|err| {
        counter!(METRIC_INTEGRATION_REQUEST, "service" => service, "outcome" => "transport").increment(1);
        IntegrationError::transport(service, err)
    })?;

    let status = response.status();
    if !status.is_success() {
        counter!(METRIC_INTEGRATION_REQUEST, "service" => service, "outcome" => "status").increment(1);
        debug!(
            target = "creatorhub::integrations",
            service,
            status = status.as_u16(),
            "Upstream returned an error status"
        );
        return Err(IntegrationError::Status {
            service,
            status: status.as_u16(),
        });
    }

    counter!(METRIC_INTEGRATION_REQUEST, "service" => service, "outcome" => "ok").increment(1);
    Ok(response)
}

/// Join `path` onto a base URL that ends in a slash.
pub fn endpoint(
    service: &'static str,
    base: &url::Url,
    path: &str,
) -> Result<url::Url, IntegrationError> {
    base.join(path)
        .map_err(|err| IntegrationError::transport(service, format!("invalid endpoint: {err}")))
}

/// Append query pairs without going through reqwest's optional `query` feature.
pub fn with_query(mut url: url::Url, pairs: &[(&str, &str)]) -> url::Url {
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url
}

/// First four characters of an ISO date, as a year.
pub fn year_from_date(date: Option<&str>) -> Option<i32> {
    date.and_then(|value| value.get(..4)).and_then(|year| year.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_come_from_iso_dates() {
        assert_eq!(year_from_date(Some("2011-04-17")), Some(2011));
        assert_eq!(year_from_date(Some("")), None);
        assert_eq!(year_from_date(None), None);
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let base = url::Url::parse("https://api.themoviedb.org/3/").unwrap();
        let url = endpoint("tmdb", &base, "search/movie").unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/search/movie");

        let url = with_query(url, &[("query", "game of thrones")]);
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/search/movie?query=game+of+thrones"
        );
    }
}
