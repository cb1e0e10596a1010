use serde::{Deserialize, Serialize};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// A short-lived toast shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn success(message: &str) -> Self {
        Self { message: message.to_string(), kind: NoticeKind::Success }
    }

    pub fn info(message: &str) -> Self {
        Self { message: message.to_string(), kind: NoticeKind::Info }
    }

    pub fn error(message: &str) -> Self {
        Self { message: message.to_string(), kind: NoticeKind::Error }
    }
}

/// Broadcast by the bookmark manager to interested views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkEvent {
    /// The bookmarked set changed (load, add, remove, clear, sign-out).
    Changed,
    /// A toast for the user.
    Notice(Notice),
}
