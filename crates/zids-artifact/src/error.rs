use thiserror::Error;

/// Errors raised while loading, validating, or serializing a GDFA artifact
/// and its auxiliary tables (row-alphabet, row-accept, group-key).
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("bad container magic: expected \"ZIDSv1\\0\"")]
    BadMagic,

    #[error("rows buffer hash mismatch: artifact has been corrupted or truncated")]
    RowsHashMismatch,

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("alphabet_size must be 256, got {0}")]
    BadAlphabetSize(u32),

    #[error("cmax must be 1, got {0}")]
    BadCmax(u32),

    #[error("row_bytes ({row_bytes}) is not a multiple of cell_bytes ({cell_bytes})")]
    RowBytesNotMultiple { row_bytes: usize, cell_bytes: usize },

    #[error("rows buffer length {actual} does not match num_states*row_bytes={expected}")]
    RowsSizeMismatch { expected: usize, actual: usize },

    #[error("permutation is not a bijection on [0, {num_states})")]
    InvalidPermutation { num_states: usize },

    #[error("row {row} out of range (num_states={num_states})")]
    RowOutOfRange { row: u32, num_states: usize },

    #[error("column {col} out of range for row {row} (num_cols={num_cols})")]
    ColOutOfRange { row: u32, col: u16, num_cols: usize },

    #[error("row-alphabet table length {actual} != num_rows*256={expected}")]
    RowAlphabetSizeMismatch { expected: usize, actual: usize },

    #[error("row-alphabet column {col} for row {row} is not < cols_per_row[{row}]={limit}")]
    RowAlphabetColOutOfRange { row: u32, col: u8, limit: u16 },

    #[error("cols_per_row[{row}]={value} out of the valid range 1..=256")]
    BadColsPerRow { row: u32, value: u32 },

    #[error("row-accept table length {actual} != num_states*4={expected}")]
    RowAidsSizeMismatch { expected: usize, actual: usize },

    #[error("group-key table row {row} has {actual} keys, expected cols_per_row[{row}]={expected}")]
    GkRowLenMismatch { row: u32, expected: usize, actual: usize },

    #[error("group key length {actual} != configured k_bytes={expected}")]
    GkKeyLenMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Codec(#[from] zids_codec::CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}
