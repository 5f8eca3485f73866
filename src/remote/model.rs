use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A note as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Note {
    pub fn detail_or_empty(&self) -> &str {
        self.detail.as_deref().unwrap_or("")
    }
}

/// Payload sent on create and update. Persisted notes carry an id; drafts never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub detail: String,
}

impl NoteDraft {
    pub fn trimmed(title: &str, detail: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            detail: detail.trim().to_string(),
        }
    }
}

pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match OffsetDateTime::parse(trimmed, &Rfc3339) {
        Ok(dt) => Some(dt),
        Err(err) => {
            tracing::debug!(%err, raw = trimmed, "ignoring unparseable timestamp");
            None
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
