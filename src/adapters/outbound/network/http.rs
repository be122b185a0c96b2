use crate::shared::Result;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts for a checksum request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Largest response body accepted from a checksum authority (1 MiB)
const MAX_BODY_SIZE: usize = 1 << 20;

/// Builds the HTTP client shared by the checksum authority adapters
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let user_agent = format!("vcn-bom/{}", env!("CARGO_PKG_VERSION"));
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Fetches `url` as text, retrying failed attempts with linear back-off
///
/// # Errors
/// Returns the last error once every attempt failed
pub async fn get_text_with_retry(
    client: &reqwest::Client,
    url: &str,
    max_retries: u32,
) -> Result<String> {
    retry(max_retries, || get_text(client, url)).await
}

/// Runs `attempt` until it succeeds, at most `max_retries` times (at least once)
async fn retry<T, F, Fut>(max_retries: u32, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = max_retries.max(1);
    let mut last_error = None;

    for n in 1..=attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = Some(e);
                if n < attempts {
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(n))).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("request was never attempted")))
}

async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("GET {} returned status code {}", url, response.status());
    }

    let body = response.bytes().await?;
    if body.len() > MAX_BODY_SIZE {
        anyhow::bail!(
            "GET {} returned {} bytes, more than the {} bytes allowed",
            url,
            body.len(),
            MAX_BODY_SIZE
        );
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
