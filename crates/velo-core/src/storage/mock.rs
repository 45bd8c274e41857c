//! Byte store with switchable read and write faults

use core::cell::Cell;

use super::{ByteStore, EepromBuffer, StoreError};

/// [`EepromBuffer`] whose reads and writes can be made to fail from the test
/// through shared cells, while the image underneath stays intact.
pub(crate) struct FlakyStore<'a, const N: usize> {
    pub(crate) cells: EepromBuffer<N>,
    pub(crate) read_fault: &'a Cell<bool>,
    pub(crate) write_fault: &'a Cell<bool>,
}

impl<const N: usize> ByteStore for FlakyStore<'_, N> {
    type Error = StoreError;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        if self.read_fault.get() {
            return Err(StoreError::OutOfRange {
                address,
                len: buf.len(),
            });
        }
        self.cells.read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        if self.write_fault.get() {
            return Err(StoreError::OutOfRange {
                address,
                len: data.len(),
            });
        }
        self.cells.write(address, data)
    }
}
