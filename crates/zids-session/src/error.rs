use thiserror::Error;

/// Server-side session/GK-table errors (spec §7 `SessionError`).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unknown session {0:?}")]
    UnknownSession(String),

    #[error("session {0:?} expired")]
    SessionExpired(String),

    #[error("AAD mismatch for session {session_id:?} row {row}")]
    AadMismatch { session_id: String, row: u32 },

    #[error("row {row}: payload length {actual} != expected {expected}")]
    PayloadLengthMismatch { row: u32, expected: usize, actual: usize },

    #[error("row {row}: column {col} out of range, num_cols={num_cols}")]
    ColumnOutOfRange { row: u32, col: u16, num_cols: u32 },

    #[error("cannot resolve payload slot for row={row} logical_col={col}: no GK in this row's payload matches the server's seed")]
    SlotResolutionFailed { row: u32, col: u16 },

    #[error("random seed mode is not permitted for an online session (spec §9: configuration error)")]
    RandomSeedModeRejected,

    #[error("master_to_gk seed mode requires a master key but none was configured")]
    MissingMasterKey,

    #[error(transparent)]
    Codec(#[from] zids_codec::CodecError),

    #[error(transparent)]
    Artifact(#[from] zids_artifact::ArtifactError),
}

impl From<SessionError> for zids_engine::EngineError {
    fn from(err: SessionError) -> Self {
        zids_engine::EngineError::ChooserFailed(err.to_string())
    }
}
