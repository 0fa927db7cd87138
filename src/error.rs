/// Error type
#[derive(Debug)]
pub enum Error {
    /// An IO error.
    Io(std::io::Error),

    /// A JSON payload could not be encoded or a feed body could not be decoded.
    Json(serde_json::Error),

    /// A file name does not encode a station or observation day.
    InvalidFilename(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => {
                write!(f, "{e}")
            }
            Self::Json(e) => {
                write!(f, "{e}")
            }
            Self::InvalidFilename(name) => {
                write!(f, "InvalidFilename({name:?})")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidFilename(_) => None,
        }
    }
}

/// Result helper type
pub type Result<T> = std::result::Result<T, Error>;
