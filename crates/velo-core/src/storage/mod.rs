//! Persistent storage of the odometer.
//!
//! The target keeps the lifetime distance in a small byte-addressable
//! non-volatile memory (EEPROM or an emulated EEPROM page). [`ByteStore`]
//! is the only thing the core needs from it; [`DistanceStore`] puts the
//! scalar get/put contract on top.

mod distance;
mod eeprom;

pub use distance::{DistanceStore, ODOMETER_RECORD_LEN, PersistError};
pub use eeprom::{ERASED_BYTE, EepromBuffer, StoreError};

/// Byte-addressable persistent memory
pub trait ByteStore {
    type Error: core::fmt::Debug;

    /// Fill `buf` with the bytes stored starting at `address`.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Store `data` starting at `address`. Must be durable once it returns.
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error>;
}

impl<B: ByteStore + ?Sized> ByteStore for &mut B {
    type Error = B::Error;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, data)
    }
}

#[cfg(test)]
pub(crate) mod mock;
