use std::io;
use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors which abort a run before any probe is sent.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open raw ICMP channel: {0}")]
    TransportUnavailable(#[source] io::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("buffer of {0} bytes cannot hold an echo request")]
    BufferTooSmall(usize),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated ICMP message: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// Why a single probe slot produced no measurement.
///
/// None of these abort the run, the prober moves on to the next sequence or TTL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("timeout")]
    Timeout,
    #[error("write error: {0}")]
    WriteError(String),
    #[error("read error: {0}")]
    ReadError(String),
    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("mismatched identifier {received}")]
    IdentifierMismatch { received: u16 },
    #[error("unexpected ICMP message type {icmp_type} code {code}")]
    UnexpectedType { icmp_type: u8, code: u8 },
    #[error("encode error: {0}")]
    EncodeError(#[from] EncodeError),
}

impl FailureReason {
    pub(crate) fn write(err: &io::Error) -> Self {
        Self::WriteError(err.to_string())
    }

    pub(crate) fn read(err: &io::Error) -> Self {
        Self::ReadError(err.to_string())
    }
}
