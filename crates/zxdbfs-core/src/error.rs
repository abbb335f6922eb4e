//! Error taxonomy for the filesystem core.
//!
//! Fetch failures keep their cause distinct (transport vs HTTP status vs
//! body parse) so the daemon can map each to a sensible errno instead of
//! collapsing everything into "not found".

use thiserror::Error;

use zxdbfs_types::GameIdError;

pub type Result<T> = std::result::Result<T, ZxdbError>;

#[derive(Debug, Error)]
pub enum ZxdbError {
    /// The path does not match any virtual-path production.
    #[error("unparseable virtual path: {0}")]
    PathParse(String),

    /// The request never produced an HTTP response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    /// The response body was not valid JSON.
    #[error("malformed JSON body from {url}: {source}")]
    JsonParse {
        url: String,
        source: serde_json::Error,
    },

    /// The JSON was well-formed but missing a structural field.
    #[error("missing `{field}` in {context} response")]
    Schema {
        field: &'static str,
        context: &'static str,
    },

    /// A directory stub could not be expanded into its full tree.
    #[error("failed to expand stub at {0}")]
    Unstub(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ZxdbError {
    pub fn path_parse(path: impl Into<String>) -> Self {
        ZxdbError::PathParse(path.into())
    }

    pub fn schema(field: &'static str, context: &'static str) -> Self {
        ZxdbError::Schema { field, context }
    }

    pub fn unstub(path: impl Into<String>) -> Self {
        ZxdbError::Unstub(path.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ZxdbError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            what.into(),
        ))
    }

    /// True when the failure means "no such entry" rather than a broken pipe.
    pub fn is_not_found(&self) -> bool {
        match self {
            ZxdbError::Http { status, .. } => *status == 404,
            ZxdbError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            ZxdbError::PathParse(_) | ZxdbError::Unstub(_) => true,
            _ => false,
        }
    }
}

impl From<GameIdError> for ZxdbError {
    fn from(err: GameIdError) -> Self {
        ZxdbError::PathParse(err.to_string())
    }
}
