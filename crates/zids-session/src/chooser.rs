use std::collections::HashMap;

use serde::Deserialize;
use tracing::instrument;
use zids_engine::{aad_for_row, Chooser, EngineError};

use crate::error::SessionError;
use crate::store::SessionStore;

/// In-process chooser that trusts the AAD the engine hands it matches this
/// session (spec §4.7 "local trivial"). Looks `payload[col]` up directly;
/// no slot-probing, so a server-side payload permutation will desync it —
/// use [`ProbingLocalChooser`] when the server may reorder a row's payload.
pub struct LocalChooser<'a> {
    store: &'a SessionStore,
    session_id: String,
}

impl<'a> LocalChooser<'a> {
    pub fn new(store: &'a SessionStore, session_id: String) -> Self {
        Self { store, session_id }
    }
}

impl<'a> Chooser for LocalChooser<'a> {
    #[instrument(skip(self, aad), fields(session_id = %self.session_id))]
    fn acquire_gk(&mut self, row: u32, m: u32, col: u16, aad: &[u8]) -> Result<Vec<u8>, EngineError> {
        let expected = aad_for_row(&self.session_id, row);
        if aad != expected.as_slice() {
            return Err(SessionError::AadMismatch {
                session_id: self.session_id.clone(),
                row,
            }
            .into());
        }
        let (_, payload) = self.store.ot_row_payload(&self.session_id, row)?;
        if payload.len() as u32 != m {
            return Err(SessionError::PayloadLengthMismatch {
                row,
                expected: m as usize,
                actual: payload.len(),
            }
            .into());
        }
        payload.get(col as usize).cloned().ok_or_else(|| {
            SessionError::ColumnOutOfRange {
                row,
                col,
                num_cols: payload.len() as u32,
            }
            .into()
        })
    }
}

/// Matches a logical column to the server's payload slot by probing seeds,
/// tolerating a server-side reshuffle of one row's payload order (spec §4.7
/// second variant, §9 supplemented feature 2; grounded in
/// `src/client/online/ot_client.py`'s `LocalTrivialOTChooser`).
pub struct ProbingLocalChooser<'a> {
    store: &'a SessionStore,
    session_id: String,
    seed_k_bytes: usize,
    row_cache: HashMap<u32, Vec<Vec<u8>>>,
    slot_map: HashMap<(u32, u16), usize>,
}

impl<'a> ProbingLocalChooser<'a> {
    pub fn new(store: &'a SessionStore, session_id: String, seed_k_bytes: usize) -> Self {
        Self {
            store,
            session_id,
            seed_k_bytes,
            row_cache: HashMap::new(),
            slot_map: HashMap::new(),
        }
    }

    /// Seeds the row cache from an out-of-band fetch (e.g. a payload
    /// already retrieved through a different channel), skipping the normal
    /// `ot_row_payload` call the next `ensure_row_cached` would make.
    pub fn preload_row(&mut self, row: u32, payload: Vec<Vec<u8>>) {
        self.row_cache.insert(row, payload);
    }

    fn resolve_slot(&mut self, row: u32, col: u16) -> Result<usize, EngineError> {
        if let Some(&slot) = self.slot_map.get(&(row, col)) {
            return Ok(slot);
        }
        let seed_srv = self.store.derive_seed(&self.session_id, row, col, self.seed_k_bytes)?;
        let payload = self.row_cache.get(&row).expect("ensure_row_cached runs before resolve_slot");
        for (slot, gk) in payload.iter().enumerate() {
            let seed_cli = zids_codec::seed_from_gk(gk, row, col, self.seed_k_bytes)?;
            if seed_cli == seed_srv {
                self.slot_map.insert((row, col), slot);
                return Ok(slot);
            }
        }
        Err(SessionError::SlotResolutionFailed { row, col }.into())
    }
}

impl<'a> Chooser for ProbingLocalChooser<'a> {
    fn ensure_row_cached(&mut self, row: u32) -> Result<(), EngineError> {
        if !self.row_cache.contains_key(&row) {
            let (_, payload) = self.store.ot_row_payload(&self.session_id, row)?;
            self.row_cache.insert(row, payload);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %self.session_id))]
    fn choose_one(&mut self, row: u32, col: u16) -> Result<Vec<u8>, EngineError> {
        self.ensure_row_cached(row)?;
        let slot = self.resolve_slot(row, col)?;
        Ok(self.row_cache[&row][slot].clone())
    }
}

/// A 1-of-`m` selection primitive that a [`PluggableChooser`] delegates the
/// final obliviousness guarantee to (spec §4.7 "local pluggable"). This
/// workspace supplies no real OT math — only the seam an implementation
/// plugs into.
pub trait OtPrimitive {
    fn select(&mut self, payload: &[Vec<u8>], aad: &[u8], choice: u16) -> Result<Vec<u8>, EngineError>;
}

pub struct PluggableChooser<'a, P: OtPrimitive> {
    store: &'a SessionStore,
    session_id: String,
    primitive: P,
}

impl<'a, P: OtPrimitive> PluggableChooser<'a, P> {
    pub fn new(store: &'a SessionStore, session_id: String, primitive: P) -> Self {
        Self { store, session_id, primitive }
    }
}

impl<'a, P: OtPrimitive> Chooser for PluggableChooser<'a, P> {
    fn acquire_gk(&mut self, row: u32, m: u32, col: u16, aad: &[u8]) -> Result<Vec<u8>, EngineError> {
        let (server_aad, payload) = self.store.ot_row_payload(&self.session_id, row)?;
        if aad != server_aad.as_slice() {
            return Err(SessionError::AadMismatch {
                session_id: self.session_id.clone(),
                row,
            }
            .into());
        }
        if payload.len() as u32 != m {
            return Err(SessionError::PayloadLengthMismatch {
                row,
                expected: m as usize,
                actual: payload.len(),
            }
            .into());
        }
        self.primitive.select(&payload, aad, col)
    }
}

#[derive(Deserialize)]
struct OtResponse {
    gk_b64: Option<String>,
    gk_hex: Option<String>,
    gk: Option<String>,
}

/// Speaks to a remote server over the blocking HTTP client, grounded in
/// `src/client/online/chooser_http.py`'s `HttpChooser`: tries `/ot`, then
/// falls back to `/choose_one`, and accepts `gk_b64` | `gk_hex` | `gk`
/// (trying base64 first, then hex) in the response body.
pub struct RemoteChooser {
    base_url: String,
    client: reqwest::blocking::Client,
    session_id: String,
}

impl RemoteChooser {
    pub fn new(base_url: impl Into<String>, session_id: String) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| EngineError::ChooserFailed(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            session_id,
        })
    }

    fn decode_gk(resp: OtResponse) -> Option<Vec<u8>> {
        use base64::Engine as _;
        if let Some(b64) = resp.gk_b64 {
            return base64::engine::general_purpose::STANDARD.decode(b64).ok();
        }
        if let Some(hex_str) = resp.gk_hex {
            return hex::decode(hex_str).ok();
        }
        if let Some(raw) = resp.gk {
            use base64::Engine as _;
            if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&raw) {
                return Some(bytes);
            }
            return hex::decode(raw).ok();
        }
        None
    }
}

impl Chooser for RemoteChooser {
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    fn acquire_gk(&mut self, row: u32, _m: u32, col: u16, _aad: &[u8]) -> Result<Vec<u8>, EngineError> {
        let body = serde_json::json!({ "row": row, "col": col });
        for path in ["/ot", "/choose_one"] {
            let url = format!("{}{}", self.base_url, path);
            let resp = match self.client.post(&url).json(&body).send() {
                Ok(resp) if resp.status().is_success() => resp,
                Ok(resp) => {
                    log::debug!("{url} returned {}, trying next path", resp.status());
                    continue;
                }
                Err(e) => {
                    log::warn!("{url} request failed: {e}");
                    continue;
                }
            };
            if let Ok(parsed) = resp.json::<OtResponse>() {
                if let Some(gk) = Self::decode_gk(parsed) {
                    return Ok(gk);
                }
            }
        }
        log::error!("remote chooser exhausted all paths for row={row} col={col}");
        Err(EngineError::ChooserFailed(format!(
            "remote chooser could not fetch GK for row={row} col={col}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use zids_codec::SeedMode;

    fn store_with_session(seed_mode: SeedMode) -> (SessionStore, String) {
        let config = SessionConfig {
            master_key: Some(vec![0x22; 16]),
            seed_mode,
            ..SessionConfig::default()
        };
        let store = SessionStore::new(vec![2, 1], config).unwrap();
        let sid = store.init_session();
        (store, sid)
    }

    #[test]
    fn local_chooser_fetches_the_genuine_gk() {
        let (store, sid) = store_with_session(SeedMode::MasterToGk);
        let mut chooser = LocalChooser::new(&store, sid.clone());
        let aad = aad_for_row(&sid, 0);
        let gk = chooser.acquire_gk(0, 2, 1, &aad).unwrap();
        let (_, payload) = store.ot_row_payload(&sid, 0).unwrap();
        assert_eq!(gk, payload[1]);
    }

    #[test]
    fn local_chooser_rejects_aad_for_the_wrong_session() {
        let (store, sid) = store_with_session(SeedMode::MasterToGk);
        let mut chooser = LocalChooser::new(&store, sid);
        let wrong_aad = aad_for_row("someone-elses-session", 0);
        assert!(chooser.acquire_gk(0, 2, 0, &wrong_aad).is_err());
    }

    #[test]
    fn probing_chooser_resolves_a_shuffled_payload() {
        let (store, sid) = store_with_session(SeedMode::MasterToGk);
        let mut chooser = ProbingLocalChooser::new(&store, sid.clone(), 16);

        // Simulate the server handing back row 0's payload with columns
        // 0 and 1 swapped relative to their logical indices.
        let (_, real_payload) = store.ot_row_payload(&sid, 0).unwrap();
        chooser.preload_row(0, vec![real_payload[1].clone(), real_payload[0].clone()]);

        let gk_for_logical_0 = chooser.choose_one(0, 0).unwrap();
        assert_eq!(gk_for_logical_0, real_payload[0]);
        let gk_for_logical_1 = chooser.choose_one(0, 1).unwrap();
        assert_eq!(gk_for_logical_1, real_payload[1]);
    }
}
