//! The GDFA artifact: header, encrypted rows buffer, row-alphabet partition,
//! and the on-disk container/directory/manifest formats around them.

pub mod container;
pub mod directory;
pub mod error;
pub mod gk_table;
pub mod header;
pub mod image;
pub mod manifest;
pub mod package;
pub mod partition;
pub mod row_aids;

pub use container::{load_container, write_container};
pub use directory::{load_directory, write_directory};
pub use error::ArtifactError;
pub use gk_table::{GkTable, GkTableMeta};
pub use header::GdfaHeader;
pub use image::GdfaImage;
pub use manifest::{CryptoParams, Manifest, ManifestSeedMode};
pub use package::{load_package, write_package, Package};
pub use partition::{load_row_alphabet, write_row_alphabet, RowAlphabetMap, RowAlphabetMeta};
pub use row_aids::{decode_row_aids, encode_row_aids, read_row_aids, write_row_aids};
