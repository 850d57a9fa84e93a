//! Shared request plumbing: client construction and response classification.

use std::time::Duration;

use diachi_core::ProviderError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use tracing::debug;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
  Client::builder()
    .timeout(timeout)
    .build()
    .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))
}

/// Send `req` and decode a JSON body into `T`.
///
/// `what` names the request in error messages, e.g. `"GET /addresses/search"`.
pub(crate) async fn get_json<T: DeserializeOwned>(
  req: RequestBuilder,
  what: &str,
) -> Result<T, ProviderError> {
  let resp = req
    .send()
    .await
    .map_err(|e| ProviderError::Transport(format!("{what} failed: {e}")))?;

  let status = resp.status();
  debug!(what, %status, "upstream responded");
  if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
    return Err(ProviderError::Config(format!("{what} → {status}")));
  }
  if !status.is_success() {
    return Err(ProviderError::Transport(format!("{what} → {status}")));
  }

  let body = resp
    .bytes()
    .await
    .map_err(|e| ProviderError::Transport(format!("{what}: reading body: {e}")))?;
  serde_json::from_slice(&body)
    .map_err(|e| ProviderError::Data(format!("{what}: {e}")))
}

/// Accept an identifier written either as a JSON string or a number.
pub(crate) fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  use serde::de::Error as _;
  match serde_json::Value::deserialize(d)? {
    serde_json::Value::String(s) => Ok(s),
    serde_json::Value::Number(n) => Ok(n.to_string()),
    other => Err(D::Error::custom(format!("expected string or number id, got {other}"))),
  }
}

/// Optional variant of [`string_or_number`]; `null` and absent both map to
/// `None`.
pub(crate) fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  use serde::de::Error as _;
  match Option::<serde_json::Value>::deserialize(d)? {
    None | Some(serde_json::Value::Null) => Ok(None),
    Some(serde_json::Value::String(s)) => Ok(Some(s)),
    Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
    Some(other) => Err(D::Error::custom(format!("expected string or number id, got {other}"))),
  }
}

/// `"<base>/<path>"` with exactly one slash between the two.
pub(crate) fn join_url(base: &str, path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
