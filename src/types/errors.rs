use std::fmt;

// === StoreError ===

/// Errors raised by a bookmark backing store (remote document store or local database).
#[derive(Debug)]
pub enum StoreError {
    /// The request never produced a response (connection, DNS, timeout).
    Network(String),
    /// The remote store answered with a non-success status.
    Http { status: u16, body: String },
    /// Local database operation failed.
    Database(String),
    /// A payload could not be encoded or decoded.
    Serialization(String),
    /// A stored document is missing required fields or has the wrong shape.
    InvalidDocument(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(msg) => write!(f, "Store network error: {}", msg),
            StoreError::Http { status, body } => {
                write!(f, "Store request failed with status {}: {}", status, body)
            }
            StoreError::Database(msg) => write!(f, "Store database error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Store serialization error: {}", msg),
            StoreError::InvalidDocument(msg) => write!(f, "Invalid stored document: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

#[cfg(feature = "network")]
impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => StoreError::Http {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => StoreError::Network(e.to_string()),
        }
    }
}

// === BookmarkError ===

/// Errors related to bookmark management operations.
#[derive(Debug)]
pub enum BookmarkError {
    /// The operation needs a signed-in user and there is none.
    Unauthenticated,
    /// The meal id or recipe snapshot is missing.
    InvalidInput(String),
    /// Another add/remove for the same meal has not finished yet.
    AlreadyInFlight(String),
    /// The backing store rejected the operation.
    Store(StoreError),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::Unauthenticated => write!(f, "No authenticated user"),
            BookmarkError::InvalidInput(msg) => write!(f, "Invalid bookmark input: {}", msg),
            BookmarkError::AlreadyInFlight(meal_id) => {
                write!(f, "Bookmark operation already in progress for meal: {}", meal_id)
            }
            BookmarkError::Store(e) => write!(f, "Bookmark store error: {}", e),
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookmarkError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for BookmarkError {
    fn from(e: StoreError) -> Self {
        BookmarkError::Store(e)
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// File system I/O error.
    IoError(String),
    /// Serialization or deserialization failed.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided value is invalid for the setting.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}
