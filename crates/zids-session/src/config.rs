use serde::{Deserialize, Serialize};
use zids_codec::SeedMode;

use crate::error::SessionError;

/// Mirrors `session_manager.py`'s `SessionConfig`: how long-lived a session
/// is and how its GK table is derived. Unlike the prototype this carries no
/// configurable AAD prefix — the AAD format is fixed (spec §4.6) and both
/// sides must compute it byte-identically, so making it configurable here
/// would just be a way to accidentally break that agreement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub k_bytes: usize,
    pub gk_bytes: usize,
    pub ttl_seconds: u64,
    pub seed_mode: SeedMode,
    /// Required regardless of `seed_mode`: `MasterToGk` derives the whole GK
    /// table from it up front, `MasterToSeed` consults it on every step.
    #[serde(skip)]
    pub master_key: Option<Vec<u8>>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.seed_mode == SeedMode::Random {
            return Err(SessionError::RandomSeedModeRejected);
        }
        if self.master_key.is_none() {
            return Err(SessionError::MissingMasterKey);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            k_bytes: 16,
            gk_bytes: 32,
            ttl_seconds: 900,
            seed_mode: SeedMode::MasterToGk,
            master_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_random_seed_mode() {
        let config = SessionConfig {
            seed_mode: SeedMode::Random,
            master_key: Some(vec![1; 16]),
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::RandomSeedModeRejected)));
    }

    #[test]
    fn rejects_missing_master_key() {
        let config = SessionConfig::default();
        assert!(matches!(config.validate(), Err(SessionError::MissingMasterKey)));
    }

    #[test]
    fn accepts_a_well_formed_config() {
        let config = SessionConfig {
            master_key: Some(vec![9; 16]),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
