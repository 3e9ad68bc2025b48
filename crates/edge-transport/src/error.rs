//! Error taxonomy for the transport loader.
//!
//! Errors the loader originates itself (validation, allocation, load
//! failures) and errors reported by the transport share one type.
//! [`EdgeError::code`] always reproduces the exact status a transport
//! returned, so callers see implementation codes verbatim.

use edge_transport_sdk::status::{self, RawStatus};

/// Result type for loader and dispatch operations.
pub type Result<T> = std::result::Result<T, EdgeError>;

/// Loader and dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeError {
    /// Malformed or missing argument.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Allocation failure.
    #[error("Out of memory")]
    OutOfMemory,

    /// Data transfer failed or no connection is available.
    #[error("I/O error")]
    Io,

    /// Connecting to the destination failed.
    #[error("Connection failure")]
    ConnectionFailure,

    /// Library open, symbol resolution or construction failure, or a generic
    /// failure reported by the transport.
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Optional capability not provided by the transport.
    #[error("Not supported")]
    NotSupported,

    /// The connection handle was already released.
    #[error("Connection handle has been released")]
    Released,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport specific status code.
    #[error("Transport returned status {0}")]
    Transport(RawStatus),
}

impl EdgeError {
    /// Map a non-zero transport status to an error.
    ///
    /// `from_code(c).code() == c` holds for every `c != 0`.
    pub fn from_code(code: RawStatus) -> Self {
        match code {
            status::INVALID_PARAMETER => {
                EdgeError::InvalidParameter("reported by transport".to_string())
            }
            status::OUT_OF_MEMORY => EdgeError::OutOfMemory,
            status::IO => EdgeError::Io,
            status::CONNECTION_FAILURE => EdgeError::ConnectionFailure,
            status::UNKNOWN => EdgeError::Unknown("reported by transport".to_string()),
            status::NOT_SUPPORTED => EdgeError::NotSupported,
            other => EdgeError::Transport(other),
        }
    }

    /// The C status code for this error.
    pub fn code(&self) -> RawStatus {
        match self {
            EdgeError::InvalidParameter(_) | EdgeError::Released | EdgeError::Config(_) => {
                status::INVALID_PARAMETER
            }
            EdgeError::OutOfMemory => status::OUT_OF_MEMORY,
            EdgeError::Io => status::IO,
            EdgeError::ConnectionFailure => status::CONNECTION_FAILURE,
            EdgeError::Unknown(_) => status::UNKNOWN,
            EdgeError::NotSupported => status::NOT_SUPPORTED,
            EdgeError::Transport(code) => *code,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EdgeError::InvalidParameter(msg.into())
    }

    pub(crate) fn unknown(msg: impl Into<String>) -> Self {
        EdgeError::Unknown(msg.into())
    }
}

/// Turn a raw status into a `Result`.
pub fn check(code: RawStatus) -> Result<()> {
    if code == status::NONE {
        Ok(())
    } else {
        Err(EdgeError::from_code(code))
    }
}

/// Flatten a `Result` back into a raw status.
pub fn to_status<T>(result: &Result<T>) -> RawStatus {
    match result {
        Ok(_) => status::NONE,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_verbatim() {
        let codes = [
            status::INVALID_PARAMETER,
            status::OUT_OF_MEMORY,
            status::IO,
            status::CONNECTION_FAILURE,
            status::UNKNOWN,
            status::NOT_SUPPORTED,
            -1,
            -4242,
            7,
        ];
        for code in codes {
            assert_eq!(EdgeError::from_code(code).code(), code, "code {}", code);
        }
    }

    #[test]
    fn test_check() {
        assert!(check(status::NONE).is_ok());
        assert_eq!(check(status::NOT_SUPPORTED), Err(EdgeError::NotSupported));
        assert_eq!(check(-77), Err(EdgeError::Transport(-77)));
    }

    #[test]
    fn test_released_is_invalid_parameter() {
        assert_eq!(EdgeError::Released.code(), status::INVALID_PARAMETER);
        assert_eq!(
            EdgeError::Released.to_string(),
            "Connection handle has been released"
        );
    }

    #[test]
    fn test_to_status() {
        assert_eq!(to_status(&Ok::<(), EdgeError>(())), status::NONE);
        assert_eq!(to_status::<()>(&Err(EdgeError::Io)), status::IO);
    }
}
