//! The set of values shared by every part of the gateway

use std::fmt;
use std::io;
use std::str::FromStr;

/// A shorthand for a Result whose error type is always a GatewayError.
pub type Result<T> = ::std::result::Result<T, GatewayError>;

/// `GatewayError` is a library-global error type describing why a gateway
/// operation did not complete. Every variant is meant to be shown to the
/// requesting caller once; none of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The FTP backend cannot be reached, refused the connection or dropped it.
    #[error("FTP server is not available: {0}")]
    Unavailable(String),
    /// The backend rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    /// An authorization rule was violated before any backend call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The backend reported that the target does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backend refused the operation.
    #[error("FTP server rejected the request ({code}): {message}")]
    BackendRejected { code: u32, message: String },
    /// A required field was empty or missing.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Local temporary storage could not be written or read.
    #[error("staging error: {0}")]
    Staging(#[from] io::Error),
}

/// Failure reported by the black-box FTP client underneath the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),
    #[error("secure channel error: {0}")]
    Secure(String),
    /// A complete reply with a code the client did not expect.
    #[error("{code} {message}")]
    Reply { code: u32, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<suppaftp::FtpError> for BackendError {
    fn from(err: suppaftp::FtpError) -> Self {
        match err {
            suppaftp::FtpError::ConnectionError(ioerr) => BackendError::Connection(ioerr),
            #[cfg(feature = "secure")]
            suppaftp::FtpError::SecureError(desc) => BackendError::Secure(desc),
            suppaftp::FtpError::UnexpectedResponse(resp) => {
                let code = resp.status.code();
                let body = String::from_utf8_lossy(&resp.body);
                BackendError::Reply { code, message: reply_text(code, &body) }
            }
            other => BackendError::Protocol(other.to_string()),
        }
    }
}

// The reply body may still carry its "NNN " or "NNN-" prefix.
fn reply_text(code: u32, body: &str) -> String {
    let body = body.trim();
    let prefix = code.to_string();
    match body.strip_prefix(prefix.as_str()) {
        Some(rest) if rest.starts_with(' ') || rest.starts_with('-') => rest[1..].trim().to_string(),
        _ => body.to_string(),
    }
}

/// Returned by the per-record listing parsers when a record cannot be
/// understood. Never escapes the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed listing entry: {0}")]
pub struct MalformedEntry(pub String);

/// Kind of a normalized listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    /// Sorts first
    Directory,
    File,
}

/// One normalized directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size; files only.
    pub size: Option<u64>,
    pub modified_at: String,
    /// Magnitude-suffixed size for files, empty for directories.
    pub human_size: String,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Declared kind of an item to delete, as submitted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Dir,
}

impl FromStr for ItemKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<ItemKind> {
        match s {
            "file" => Ok(ItemKind::File),
            "dir" => Ok(ItemKind::Dir),
            other => Err(GatewayError::InvalidRequest(format!("unknown item type '{}'", other))),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ItemKind::File => write!(f, "File"),
            ItemKind::Dir => write!(f, "Directory"),
        }
    }
}
