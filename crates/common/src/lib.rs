//! Ambient helpers shared by the storage crates: logging setup and the
//! wall clock used to stamp blobs.

pub mod clock;
pub mod utils;
