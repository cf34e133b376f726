use thiserror::Error;

/// Errors raised by the PRF/PRG primitives and the seed schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("PRF/PRG key or seed must be non-empty")]
    EmptyKey,

    #[error("requested output length {0} is not representable")]
    BadOutLen(usize),

    #[error("group key length {actual} does not match the configured gk_bytes={expected}")]
    BadGkLen { expected: usize, actual: usize },

    #[error("I2OSP: value {value} does not fit in {len} byte(s)")]
    I2ospOverflow { value: u64, len: usize },

    #[error("I2OSP: length {len} exceeds the 8-byte width of a u64")]
    I2ospLengthTooLarge { len: usize },
}
