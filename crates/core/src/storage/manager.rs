use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

use super::format;

/// High-level storage operations: save/load the portfolio to/from bytes
/// or files.
pub struct StorageManager;

impl StorageManager {
    /// Serialize a portfolio to raw bytes (portable, platform-independent).
    ///
    /// Flow: Portfolio → bincode → PTRK format bytes
    pub fn save_to_bytes(portfolio: &Portfolio) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))?;

        Ok(format::write_file(format::CURRENT_VERSION, &payload))
    }

    /// Deserialize a portfolio from raw bytes.
    ///
    /// Flow: PTRK bytes → parse header → bincode → Portfolio
    pub fn load_from_bytes(data: &[u8]) -> Result<Portfolio, CoreError> {
        let (_header, payload) = format::read_file(data)?;

        let portfolio: Portfolio = bincode::deserialize(payload).map_err(|e| {
            CoreError::Deserialization(format!("Failed to deserialize portfolio: {e}"))
        })?;

        Ok(portfolio)
    }

    /// Save the portfolio to a file on disk.
    pub fn save_to_file(portfolio: &Portfolio, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(portfolio)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a portfolio from a file on disk.
    pub fn load_from_file(path: &str) -> Result<Portfolio, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
