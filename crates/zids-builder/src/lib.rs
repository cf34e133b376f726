//! Offline pipeline: compiled DFA + security/sparsity parameters in,
//! encrypted GDFA artifact out.

pub mod cell_layout;
pub mod config;
pub mod error;
pub mod orchestrate;
pub mod permutation;
pub mod pipeline;
pub mod row_alphabet;

pub use cell_layout::CellLayout;
pub use config::{BuilderConfig, SeedModeName};
pub use error::BuilderError;
pub use orchestrate::build_and_package;
pub use permutation::sample_permutation;
pub use pipeline::{build, BuildOutput, CompiledDfa};
pub use row_alphabet::{build_row_alphabets, flatten_row_alphabets, RowAlphabetBuild};
