use thiserror_no_std::Error;

use super::ByteStore;

/// Value of an erased EEPROM cell
pub const ERASED_BYTE: u8 = 0xFF;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("Access of {len} bytes at address {address} is out of range")]
    OutOfRange { address: u16, len: usize },
}

/// RAM-backed EEPROM image of `N` bytes.
///
/// Starts out erased like a factory-fresh part. The raw image can be taken
/// out and put back, which lets a host keep it in a file between runs.
#[derive(Debug, Clone)]
pub struct EepromBuffer<const N: usize> {
    cells: [u8; N],
    writes: u32,
}

impl<const N: usize> EepromBuffer<N> {
    pub const fn new() -> Self {
        Self {
            cells: [ERASED_BYTE; N],
            writes: 0,
        }
    }

    /// Restore a previously saved image
    pub const fn from_image(cells: [u8; N]) -> Self {
        Self { cells, writes: 0 }
    }

    /// Raw contents, suitable for saving
    pub const fn image(&self) -> &[u8; N] {
        &self.cells
    }

    /// Number of write operations since this buffer was created
    pub const fn write_count(&self) -> u32 {
        self.writes
    }

    fn range(address: u16, len: usize) -> Result<core::ops::Range<usize>, StoreError> {
        let start = address as usize;
        match start.checked_add(len) {
            Some(end) if end <= N => Ok(start..end),
            _ => Err(StoreError::OutOfRange { address, len }),
        }
    }
}

impl<const N: usize> Default for EepromBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStore for EepromBuffer<N> {
    type Error = StoreError;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        let range = Self::range(address, buf.len())?;
        buf.copy_from_slice(&self.cells[range]);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        let range = Self::range(address, data.len())?;
        self.cells[range].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}
