use crate::utils::error::{FetchError, Result};
use reqwest::Client;
use std::time::Duration;

/// 讀取回應內容；非 2xx 狀態碼轉為 `HttpStatusError`
pub async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("GET {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::HttpStatusError {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

/// Retries only errors where `is_retryable()` holds; `retries` counts extra attempts.
pub async fn get_bytes_with_retry(
    client: &Client,
    url: &str,
    retries: u32,
    delay: Duration,
) -> Result<Vec<u8>> {
    let mut attempt = 0;
    loop {
        match get_bytes(client, url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < retries && e.is_retryable() => {
                attempt += 1;
                tracing::warn!(
                    "⚠️ Attempt {}/{} for {} failed: {}",
                    attempt,
                    retries + 1,
                    url,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_get_bytes_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/img.jpg");
            then.status(200).body("jpeg-bytes");
        });

        let bytes = get_bytes(&Client::new(), &server.url("/img.jpg")).await.unwrap();

        mock.assert();
        assert_eq!(bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let err = get_bytes_with_retry(
            &Client::new(),
            &server.url("/missing"),
            3,
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, FetchError::HttpStatusError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_retried_until_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let err = get_bytes_with_retry(
            &Client::new(),
            &server.url("/flaky"),
            2,
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        mock.assert_hits(3);
        assert!(matches!(err, FetchError::HttpStatusError { status: 503, .. }));
    }
}
