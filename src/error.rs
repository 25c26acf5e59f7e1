use std::fmt;

/// Construction-time failures. Nothing in the simulated machine itself
/// (register access, bus lines, a single `tick()`) is fallible; see the
/// module docs on the distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// `Motherboard::plug_device` could not find `needed` contiguous free
    /// port slots anywhere in the 256-slot table.
    PortTableExhausted { needed: u8 },
    /// `Ram::load` was asked to place `len` bytes starting at `address`,
    /// which runs past the end of the 16 MiB backing store.
    ImageOutOfBounds { address: u32, len: usize },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::PortTableExhausted { needed } => {
                write!(f, "no run of {needed} contiguous free port slots available")
            }
            CoreError::ImageOutOfBounds { address, len } => write!(
                f,
                "image of {len} bytes at address {address:#08x} overruns the 16 MiB address space"
            ),
        }
    }
}

impl std::error::Error for CoreError {}
