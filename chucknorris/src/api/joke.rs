use serde::{Deserialize, Deserializer, Serialize};

use super::{Client, LookupError};

/// A joke as returned by `GET /jokes/{id}`
///
/// `id` and `value` must be present; every other field falls back to an empty
/// value when it is missing, null, or not of the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeRecord {
    pub id: String,
    pub value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub categories: Vec<String>,
}

impl JokeRecord {
    pub fn from_slice(body: &[u8]) -> Result<Self, LookupError> {
        Ok(serde_json::from_slice(body)?)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Reject IDs that cannot be sent as a single `/jokes/<id>` path segment.
/// URL path handling drops `.` and `..` segments, so those would address
/// `/jokes` itself instead of a joke.
pub fn check_joke_id(joke_id: &str) -> Result<(), LookupError> {
    match joke_id {
        "" => Err(LookupError::InvalidJokeId("must not be empty")),
        "." | ".." => Err(LookupError::InvalidJokeId(
            "must not be a relative path segment",
        )),
        _ => Ok(()),
    }
}

impl Client {
    /// Fetch one joke by ID. One GET, no retries.
    pub async fn lookup_joke(&self, joke_id: &str) -> Result<JokeRecord, LookupError> {
        check_joke_id(joke_id)?;

        let url = self.url_for(&["jokes", joke_id]);
        let body = self.get_bounded(url).await?;

        let joke = JokeRecord::from_slice(&body).inspect_err(|e| {
            tracing::error!(joke_id, error = %e, "failed to decode joke");
        })?;
        tracing::debug!(joke_id, id = %joke.id, "fetched joke");

        Ok(joke)
    }
}
