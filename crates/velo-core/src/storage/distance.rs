use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use super::ByteStore;

/// Size of the encoded odometer record in bytes
pub const ODOMETER_RECORD_LEN: usize = 4;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    #[error("Failed to read odometer record at address {address}")]
    Read { address: u16 },
    #[error("Failed to encode odometer record for address {address}")]
    Encode { address: u16 },
    #[error("Failed to write odometer record at address {address}")]
    Write { address: u16 },
}

/// On-storage layout of the odometer: a single little-endian `f32`.
///
/// An erased cell (all `0xFF`) decodes to NaN, which is how a blank part is
/// recognised.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct OdometerRecord {
    total_km: f32,
}

/// Scalar get/put access to the lifetime distance kept in a [`ByteStore`].
pub struct DistanceStore<B> {
    store: B,
    address: u16,
}

impl<B: ByteStore> DistanceStore<B> {
    pub const fn new(store: B, address: u16) -> Self {
        Self { store, address }
    }

    /// Read the stored lifetime distance.
    ///
    /// Returns `Ok(None)` when the bytes were read but hold nothing usable:
    /// blank or corrupted cells, or a non-finite or negative value. A failed
    /// read is an error, since the cells may still hold a good total.
    pub fn load(&mut self) -> Result<Option<f32>, PersistError> {
        let address = self.address;
        let mut bytes = [0u8; ODOMETER_RECORD_LEN];
        self.store.read(address, &mut bytes).map_err(|e| {
            error!("Odometer read at {} failed: {:?}", address, e);
            PersistError::Read { address }
        })?;

        let total_km = match postcard::from_bytes::<OdometerRecord>(&bytes) {
            Ok(record) => record.total_km,
            Err(e) => {
                warn!("Odometer at {} does not decode: {:?}", address, e);
                return Ok(None);
            }
        };
        Ok((total_km.is_finite() && total_km >= 0.0).then_some(total_km))
    }

    /// Write the lifetime distance.
    pub fn save(&mut self, total_km: f32) -> Result<(), PersistError> {
        let address = self.address;
        let mut bytes = [0u8; ODOMETER_RECORD_LEN];
        let record = OdometerRecord { total_km };
        let encoded = postcard::to_slice(&record, &mut bytes).map_err(|e| {
            error!("Odometer encode failed: {:?}", e);
            PersistError::Encode { address }
        })?;

        self.store.write(address, encoded).map_err(|e| {
            error!("Odometer write at {} failed: {:?}", address, e);
            PersistError::Write { address }
        })
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn into_inner(self) -> B {
        self.store
    }
}
