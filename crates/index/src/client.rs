//! Plumbing shared by the HTTP embedding backends.

use std::time::Duration;

use crate::traits::EmbeddingError;

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Turn a non-success response into a uniform `Api` error carrying the
/// backend name, status, and response body.
pub(crate) async fn expect_success(
    response: reqwest::Response,
    backend: &str,
) -> Result<reqwest::Response, EmbeddingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(EmbeddingError::Api(format!(
        "{backend} request failed ({status}): {body}"
    )))
}

/// Check every returned vector against the configured dimensionality,
/// not just the first one.
pub(crate) fn expect_dimensions(
    vectors: &[Vec<f32>],
    expected: usize,
) -> Result<(), EmbeddingError> {
    for vector in vectors {
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}
