//! Driver error type

use crate::command::{CommandError, ErrorCode};

/// Error returned by every [`Module`](crate::Module) operation.
///
/// Only [`Error::Transport`] is fatal: the link to the module is gone and the
/// caller has to re-establish it. Everything else leaves the driver usable and
/// the caller decides whether to retry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The module rejected the request. Resource exhaustion (no free cid,
    /// certificate store full) also lands here.
    Rejected(ErrorCode),
    /// The cid or name is not tracked by the driver. No request was sent.
    InvalidHandle,
    /// The cid belongs to the network connection manager and must not be
    /// closed by hand. No request was sent.
    NcmOwned,
    /// TLS certificate validation failed. The module already closed the
    /// connection and the cid is gone.
    HandshakeFailed,
    /// The connection manager cannot be enabled with the staged profile.
    IncompleteProfile,
    /// A parameter is outside the range the module accepts.
    InvalidParameter,
    /// The certificate is referenced by a live TLS connection.
    CertificateInUse,
    /// A request or reply did not fit its bounded buffer.
    BufferOverflow,
    /// The module answered `OK` without the expected value.
    MalformedReply,
    /// The command engine lost the link to the module.
    Transport,
}

impl Error {
    /// `true` when the driver cannot continue without a new link.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Transport)
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Rejected(code) => Error::Rejected(code),
            CommandError::Transport => Error::Transport,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Rejected(code) => write!(f, "module rejected the request ({})", code),
            Error::InvalidHandle => f.write_str("unknown connection id or name"),
            Error::NcmOwned => f.write_str("connection is owned by the connection manager"),
            Error::HandshakeFailed => f.write_str("TLS handshake failed"),
            Error::IncompleteProfile => f.write_str("network profile is incomplete"),
            Error::InvalidParameter => f.write_str("parameter out of range"),
            Error::CertificateInUse => f.write_str("certificate in use"),
            Error::BufferOverflow => f.write_str("buffer overflow"),
            Error::MalformedReply => f.write_str("malformed reply"),
            Error::Transport => f.write_str("link to the module lost"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Rejected(code) => defmt::write!(f, "Rejected({})", code),
            Error::InvalidHandle => defmt::write!(f, "InvalidHandle"),
            Error::NcmOwned => defmt::write!(f, "NcmOwned"),
            Error::HandshakeFailed => defmt::write!(f, "HandshakeFailed"),
            Error::IncompleteProfile => defmt::write!(f, "IncompleteProfile"),
            Error::InvalidParameter => defmt::write!(f, "InvalidParameter"),
            Error::CertificateInUse => defmt::write!(f, "CertificateInUse"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::MalformedReply => defmt::write!(f, "MalformedReply"),
            Error::Transport => defmt::write!(f, "Transport"),
        }
    }
}
