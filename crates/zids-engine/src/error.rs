use thiserror::Error;

/// Folds the spec's `DecodeError` and `ProtocolError` kinds in here (§7),
/// since both only ever surface from inside [`crate::engine::Engine::step`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("row {row}: no candidate columns for byte {byte:#04x}")]
    NoCandidates { row: u32, byte: u8 },

    #[error("row {row}: candidate column {col} >= num_cols={num_cols}")]
    CandidateOutOfRange { row: u32, col: u16, num_cols: u32 },

    #[error(
        "row {row}, offset {offset}: every candidate column failed to decode; \
         this indicates key desynchronisation or a corrupt artifact"
    )]
    AllCandidatesFailed { row: u32, offset: usize },

    #[error("chooser method {0:?} is not implemented by this chooser")]
    ChooserMethodUnsupported(&'static str),

    #[error("chooser returned a group key of length {actual}, expected {expected}")]
    BadGkLength { expected: usize, actual: usize },

    #[error("chooser call timed out for (row={row}, col={col})")]
    ChooserTimeout { row: u32, col: u16 },

    /// Catch-all for chooser-side failures that don't fit the categories
    /// above (an unknown/expired session, an AAD mismatch, a transport
    /// error) — the chooser implementation is responsible for formatting
    /// enough context into the message.
    #[error("chooser failed: {0}")]
    ChooserFailed(String),

    #[error(transparent)]
    Codec(#[from] zids_codec::CodecError),

    #[error(transparent)]
    Artifact(#[from] zids_artifact::ArtifactError),
}
