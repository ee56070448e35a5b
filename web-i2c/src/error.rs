use crate::UINT16_MAX;
use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A number, or the numeric part of a port name, is not a valid `u16`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Must be between 0 and {}.", UINT16_MAX)]
pub struct RangeError {
    input: String,
}

impl RangeError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The rejected text.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// The bus operation an [`OperationError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Read8,
    Read16,
    Write8,
    Write16,
    ReadByte,
    ReadBytes,
    WriteByte,
    WriteBytes,
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Read8 => "read8",
            Self::Read16 => "read16",
            Self::Write8 => "write8",
            Self::Write16 => "write16",
            Self::ReadByte => "read_byte",
            Self::ReadBytes => "read_bytes",
            Self::WriteByte => "write_byte",
            Self::WriteBytes => "write_bytes",
            Self::Close => "close",
        })
    }
}

/// The driver failed to carry out a bus operation
///
/// The driver's own error is kept as [`std::error::Error::source`], so it can be
/// inspected with `downcast_ref` without going through its message.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct OperationError {
    operation: Operation,
    #[source]
    source: BoxError,
}

impl OperationError {
    pub(crate) fn new<E>(operation: Operation, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            operation,
            source: Box::new(source),
        }
    }

    /// Always `"OperationError"`.
    pub const fn name(&self) -> &'static str {
        "OperationError"
    }

    /// Which operation failed.
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Take the driver's error out.
    pub fn into_source(self) -> BoxError {
        self.source
    }
}
