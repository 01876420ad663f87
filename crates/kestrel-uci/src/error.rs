//! UCI protocol errors.

/// Errors that can occur during UCI protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// Failed to parse a FEN string.
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
        reason: String,
    },

    /// A move in the `position` command is not legal in its position.
    #[error("invalid move: {uci_move}")]
    InvalidMove {
        /// The UCI move string that was rejected.
        uci_move: String,
    },

    /// A `go` parameter was given without its value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue { param: String },

    /// A `go` parameter value could not be parsed.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue { param: String, value: String },

    /// `setoption` named an option the engine does not have, or gave it a
    /// value it cannot use.
    #[error("unsupported option: {line}")]
    UnknownOption { line: String },

    /// An I/O error occurred while talking to the GUI.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = UciError::InvalidMove {
            uci_move: "e2e5".to_string(),
        };
        assert_eq!(err.to_string(), "invalid move: e2e5");

        let err = UciError::InvalidGoValue {
            param: "depth".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for go parameter depth: abc");
    }

    #[test]
    fn io_errors_convert() {
        let err: UciError = std::io::Error::other("pipe closed").into();
        assert!(matches!(err, UciError::Io { .. }));
    }
}
