use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::instrument;
use zids_codec::{gk_from_master, seed_from_gk, seed_from_master, SeedMode};

use crate::config::SessionConfig;
use crate::error::SessionError;

pub type SessionId = String;

/// Server-held per-session state (spec §3 "Session"). Under `MasterToSeed`
/// no GK table is ever materialised — see [`SeedMode::MasterToSeed`].
struct SessionState {
    created_at: Instant,
    gk_table: Option<Vec<Vec<Vec<u8>>>>,
}

/// Owns every live session's GK table; guarded by an `RwLock` per spec §5
/// ("the server must use internal synchronisation to protect the session
/// table... an individual session is only read from one engine at a time").
pub struct SessionStore {
    cols_per_row: Vec<u32>,
    config: SessionConfig,
    sessions: RwLock<HashMap<SessionId, SessionState>>,
}

impl SessionStore {
    pub fn new(cols_per_row: Vec<u32>, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            cols_per_row,
            config,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    #[instrument(skip(self))]
    pub fn init_session(&self) -> SessionId {
        let sid = new_session_id();
        let gk_table = match self.config.seed_mode {
            SeedMode::MasterToGk => Some(self.build_gk_table()),
            SeedMode::MasterToSeed => None,
            SeedMode::Random => unreachable!("rejected by SessionConfig::validate"),
        };
        let state = SessionState {
            created_at: Instant::now(),
            gk_table,
        };
        self.sessions.write().expect("session table lock poisoned").insert(sid.clone(), state);
        log::debug!("session {sid} opened under {:?}", self.config.seed_mode);
        sid
    }

    fn build_gk_table(&self) -> Vec<Vec<Vec<u8>>> {
        let master = self.config.master_key.as_ref().expect("validated by SessionConfig::validate");
        self.cols_per_row
            .iter()
            .enumerate()
            .map(|(row, &m)| {
                (0..m as u16)
                    .map(|col| gk_from_master(master, row as u32, col, self.config.gk_bytes).expect("gk derivation cannot fail for a non-empty master"))
                    .collect()
            })
            .collect()
    }

    /// Opens a session from a persisted [`zids_artifact::GkTable`] instead
    /// of deriving one from a master key (spec §4.7 "loaded from disk").
    pub fn init_session_from_table(&self, gk_table: zids_artifact::GkTable) -> Result<SessionId, SessionError> {
        if gk_table.table.len() != self.cols_per_row.len() {
            return Err(SessionError::ColumnOutOfRange {
                row: 0,
                col: 0,
                num_cols: gk_table.table.len() as u32,
            });
        }
        let sid = new_session_id();
        let state = SessionState {
            created_at: Instant::now(),
            gk_table: Some(gk_table.table),
        };
        self.sessions.write().expect("session table lock poisoned").insert(sid.clone(), state);
        Ok(sid)
    }

    pub fn drop_session(&self, session_id: &str) {
        self.sessions.write().expect("session table lock poisoned").remove(session_id);
    }

    /// Sweeps every session past its TTL. Returns the number removed
    /// (`SessionManager.gc()` in the prototype).
    pub fn gc(&self) -> usize {
        let ttl = Duration::from_secs(self.config.ttl_seconds);
        let now = Instant::now();
        let mut sessions = self.sessions.write().expect("session table lock poisoned");
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, state)| now.duration_since(state.created_at) > ttl)
            .map(|(sid, _)| sid.clone())
            .collect();
        for sid in &expired {
            sessions.remove(sid);
        }
        if !expired.is_empty() {
            log::info!("gc removed {} expired session(s)", expired.len());
        }
        expired.len()
    }

    /// Returns `payload[c] = GK[row][c]` for the full row, plus the fixed
    /// AAD for `(session_id, row)` (spec §4.7 `ot_row_payload`).
    ///
    /// Only meaningful under `MasterToGk`: `MasterToSeed` never materialises
    /// a GK table, so there is nothing to hand across the OT channel in
    /// that mode (client and server both already hold `master`).
    #[instrument(skip(self))]
    pub fn ot_row_payload(&self, session_id: &str, row: u32) -> Result<(Vec<u8>, Vec<Vec<u8>>), SessionError> {
        let aad = zids_engine::aad_for_row(session_id, row);
        let sessions = self.sessions.read().expect("session table lock poisoned");
        let state = self.live(&sessions, session_id)?;
        let gk_table = state.gk_table.as_ref().ok_or_else(|| {
            SessionError::PayloadLengthMismatch {
                row,
                expected: self.cols_per_row.get(row as usize).copied().unwrap_or(0) as usize,
                actual: 0,
            }
        })?;
        let row_table = gk_table.get(row as usize).ok_or(SessionError::ColumnOutOfRange { row, col: 0, num_cols: gk_table.len() as u32 })?;
        Ok((aad, row_table.clone()))
    }

    /// Test-only oracle (spec §4.7): recompute the seed a client with the
    /// genuine GK would derive, without going through the OT channel.
    #[instrument(skip(self))]
    pub fn derive_seed(&self, session_id: &str, row: u32, col: u16, out_len: usize) -> Result<Vec<u8>, SessionError> {
        let sessions = self.sessions.read().expect("session table lock poisoned");
        let state = self.live(&sessions, session_id)?;
        match &state.gk_table {
            Some(gk_table) => {
                let row_table = gk_table.get(row as usize).ok_or(SessionError::ColumnOutOfRange { row, col, num_cols: gk_table.len() as u32 })?;
                let gk = row_table.get(col as usize).ok_or(SessionError::ColumnOutOfRange { row, col, num_cols: row_table.len() as u32 })?;
                Ok(seed_from_gk(gk, row, col, out_len)?)
            }
            None => {
                let master = self.config.master_key.as_ref().expect("validated by SessionConfig::validate");
                Ok(seed_from_master(master, row, col, out_len)?)
            }
        }
    }

    /// Verifies `session_id` is live (lazily honouring TTL) and returns it
    /// for further AAD comparison by the caller.
    pub fn verify_session(&self, session_id: &str) -> Result<(), SessionError> {
        let sessions = self.sessions.read().expect("session table lock poisoned");
        self.live(&sessions, session_id)?;
        Ok(())
    }

    fn live<'a>(&self, sessions: &'a HashMap<SessionId, SessionState>, session_id: &str) -> Result<&'a SessionState, SessionError> {
        let state = sessions.get(session_id).ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        let ttl = Duration::from_secs(self.config.ttl_seconds);
        if Instant::now().duration_since(state.created_at) > ttl {
            log::warn!("session {session_id} used past its ttl");
            return Err(SessionError::SessionExpired(session_id.to_string()));
        }
        Ok(state)
    }
}

fn new_session_id() -> SessionId {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
