//! FTP reply codes the gateway reacts to, and how backend failures map
//! onto the gateway's error taxonomy.

use super::types::{BackendError, GatewayError};

// 4xx: Transient Negative Completion Reply
pub const NOT_AVAILABLE: u32 = 421;
pub const CANNOT_OPEN_DATA_CONNECTION: u32 = 425;
pub const TRANSFER_ABORTED: u32 = 426;
pub const INVALID_CREDENTIALS: u32 = 430;
pub const HOST_UNAVAILABLE: u32 = 434;

// 5xx: Permanent Negative Completion Reply
pub const BAD_COMMAND: u32 = 500;
pub const BAD_ARGUMENTS: u32 = 501;
pub const NOT_IMPLEMENTED: u32 = 502;
pub const NOT_IMPLEMENTED_PARAMETER: u32 = 504;
pub const NOT_LOGGED_IN: u32 = 530;
pub const FILE_UNAVAILABLE: u32 = 550;

/// Whether the reply to a structured listing request (`MLSD`) means the
/// server does not support it, so the legacy `LIST` must be used instead.
pub fn is_unsupported(err: &BackendError) -> bool {
    match *err {
        BackendError::Reply { code, .. } => {
            [BAD_COMMAND, BAD_ARGUMENTS, NOT_IMPLEMENTED, NOT_IMPLEMENTED_PARAMETER].contains(&code)
        }
        _ => false,
    }
}

/// Classify a failure raised while connecting or authenticating.
pub fn classify_login(err: BackendError) -> GatewayError {
    match err {
        BackendError::Reply { code, message } if code == NOT_LOGGED_IN || code == INVALID_CREDENTIALS => {
            GatewayError::AuthFailed(message)
        }
        other => classify(other),
    }
}

/// Classify a failure raised by a single FTP operation.
pub fn classify(err: BackendError) -> GatewayError {
    match err {
        BackendError::Connection(ioerr) => GatewayError::Unavailable(ioerr.to_string()),
        BackendError::Secure(desc) => GatewayError::Unavailable(desc),
        BackendError::Protocol(desc) => GatewayError::Unavailable(desc),
        BackendError::Reply { code, message } => match code {
            NOT_AVAILABLE | CANNOT_OPEN_DATA_CONNECTION | TRANSFER_ABORTED | HOST_UNAVAILABLE => {
                GatewayError::Unavailable(format!("{} {}", code, message))
            }
            FILE_UNAVAILABLE if reports_missing(&message) => GatewayError::NotFound(message),
            _ => GatewayError::BackendRejected { code, message },
        },
    }
}

// 550 covers both "no such file" and refusals like "directory not empty".
fn reports_missing(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no such file") || lower.contains("not found") || lower.contains("does not exist")
}
