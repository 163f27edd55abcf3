//! Error types reported by the command engine

/// The error code carried by a terminal error reply.
///
/// The module does not report resource exhaustion (no free cid, certificate
/// store full) with a distinct code; it arrives as a plain [`ErrorCode::Error`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorCode {
    /// Plain `ERROR`.
    Error,
    /// `ERROR: INVALID INPUT`, the module rejected a parameter.
    InvalidInput,
    /// `ERROR: SOCKET FAILURE`, the connection could not be set up.
    SocketFailure,
    /// `ERROR: IP CONFIG FAIL`, DHCP or static addressing failed.
    IpConfigFail,
}

impl ErrorCode {
    /// Parses a terminal error line, or returns `None` when `line` is not
    /// one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gs_wifi::command::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::from_line("ERROR"), Some(ErrorCode::Error));
    /// assert_eq!(
    ///     ErrorCode::from_line("ERROR: SOCKET FAILURE 2"),
    ///     Some(ErrorCode::SocketFailure)
    /// );
    /// assert_eq!(ErrorCode::from_line("CONNECT 2"), None);
    /// ```
    pub fn from_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix("ERROR")?;
        let detail = rest.trim_start_matches(':').trim();
        let code = if detail.starts_with("INVALID INPUT") {
            ErrorCode::InvalidInput
        } else if detail.starts_with("SOCKET FAILURE") {
            ErrorCode::SocketFailure
        } else if detail.starts_with("IP CONFIG FAIL") {
            ErrorCode::IpConfigFail
        } else {
            ErrorCode::Error
        };
        Some(code)
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ErrorCode::Error => "ERROR",
            ErrorCode::InvalidInput => "ERROR: INVALID INPUT",
            ErrorCode::SocketFailure => "ERROR: SOCKET FAILURE",
            ErrorCode::IpConfigFail => "ERROR: IP CONFIG FAIL",
        })
    }
}

/// Failure of a single [`CommandEngine`](super::CommandEngine) request.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandError {
    /// The module answered with a terminal error line.
    Rejected(ErrorCode),
    /// The link to the module is gone (write failure, reply timeout).
    Transport,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorCode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ErrorCode::Error => defmt::write!(f, "Error"),
            ErrorCode::InvalidInput => defmt::write!(f, "InvalidInput"),
            ErrorCode::SocketFailure => defmt::write!(f, "SocketFailure"),
            ErrorCode::IpConfigFail => defmt::write!(f, "IpConfigFail"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            CommandError::Rejected(code) => defmt::write!(f, "Rejected({})", code),
            CommandError::Transport => defmt::write!(f, "Transport"),
        }
    }
}
