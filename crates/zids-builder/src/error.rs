use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("state {state} has a non-total transition function: missing bytes {missing:?}{more}")]
    NonTotalTransitions {
        state: usize,
        missing: Vec<u8>,
        more: &'static str,
    },

    #[error("row {row}: outdegree {num_groups} exceeds outmax={outmax}")]
    OutdegreeExceedsOutmax { row: usize, num_groups: usize, outmax: u32 },

    #[error("attack id {aid} does not fit in aid_bits={aid_bits}")]
    AidOverflow { aid: u32, aid_bits: u32 },

    #[error("cell layout overflow: row_bits={row_bits} + aid_bits={aid_bits} exceeds 64 bits")]
    CellLayoutOverflow { row_bits: u32, aid_bits: u32 },

    #[error("seed mode is ambiguous: exactly one of master_to_seed/master_to_gk must be selected")]
    AmbiguousSeedMode,

    #[error("num_states must be positive")]
    EmptyAutomaton,

    #[error(transparent)]
    Codec(#[from] zids_codec::CodecError),

    #[error(transparent)]
    Artifact(#[from] zids_artifact::ArtifactError),
}
