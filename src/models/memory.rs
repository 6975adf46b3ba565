use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Text,
    Image,
    Audio,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Text => "text",
            MemoryKind::Image => "image",
            MemoryKind::Audio => "audio",
        }
    }

    /// Subdirectory under the uploads root where binary payloads of this
    /// kind are stored. Text memories carry no payload.
    pub fn upload_subdir(&self) -> Option<&'static str> {
        match self {
            MemoryKind::Text => None,
            MemoryKind::Image => Some("images"),
            MemoryKind::Audio => Some("audio"),
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted journal entry. Text memories carry `content`, image and
/// audio memories carry a server-relative `url`; the unused field is left
/// out of the wire format. Entries are never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Entries in hand-edited or legacy files may lack an id; they count
    /// as 0 when the next id is assigned.
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Absent in files written before timestamps were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Memory {
    pub fn text(id: i64, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: MemoryKind::Text,
            content: Some(content.into()),
            url: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn media(id: i64, kind: MemoryKind, url: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: None,
            url: Some(url.into()),
            created_at: Some(Utc::now()),
        }
    }
}
