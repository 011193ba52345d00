//! Document verification
//!
//! Checksums let a consumer of a written report confirm the file was not
//! altered after generation.

pub mod checksum;

pub use checksum::{calculate_checksum_bytes, checksum_path, verify_checksum_file, write_checksum_file};
