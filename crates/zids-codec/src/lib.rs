//! Keyed PRF/PRG primitives and the deterministic GDFA seed schedule.
//!
//! This crate has no notion of rows, columns as "DFA state" concepts, or
//! cell ciphertexts beyond the byte arithmetic needed to derive seeds and
//! pads; [`zids_artifact`](../zids_artifact) and
//! [`zids_builder`](../zids_builder) build the rest of the format on top.

pub mod error;
pub mod i2osp;
pub mod prf;
pub mod prg;
pub mod seed;

pub use error::CodecError;
pub use i2osp::i2osp;
pub use prf::prf;
pub use prg::prg;
pub use seed::{gk_from_master, gk_info, seed_from_gk, seed_from_master, seed_info, SeedMode, PRG_LABEL_CELL};
