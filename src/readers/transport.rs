//! The boundary to a physical connection

use thiserror::Error;

use crate::registers::ReadFunction;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timed out waiting for response")]
    Timeout,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device exception {code} for function {function} at address {address}")]
    Exception { function: u8, address: u32, code: u8 },
    #[error("Short read at address {address}: expected {expected} words, got {actual}")]
    ShortRead {
        address: u32,
        expected: usize,
        actual: usize,
    },
}

impl TransportError {
    /// Errors worth retrying on the same connection. A device exception is a
    /// definite answer and is not retried.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Exception { .. })
    }
}

/// Address spaces that accept writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteFunction {
    Coils,
    HoldingRegisters,
}

impl WriteFunction {
    pub const fn code(self) -> u8 {
        match self {
            WriteFunction::Coils => 15,
            WriteFunction::HoldingRegisters => 16,
        }
    }

    /// The address space a write lands in
    pub const fn read_function(self) -> ReadFunction {
        match self {
            WriteFunction::Coils => ReadFunction::Coil,
            WriteFunction::HoldingRegisters => ReadFunction::HoldingRegister,
        }
    }
}

/// Blocking word access to one device.
///
/// Bit address spaces (coils, discrete inputs) are exchanged as one word per
/// address, 0 or 1.
pub trait WordTransport {
    fn read_words(
        &mut self,
        function: ReadFunction,
        address: u32,
        count: usize,
    ) -> Result<Vec<u16>, TransportError>;

    fn write_words(
        &mut self,
        function: WriteFunction,
        address: u32,
        values: &[u16],
    ) -> Result<(), TransportError>;
}
