pub mod codec;
pub mod cp437;
pub mod directory;
pub mod raw_file;

pub use directory::{Directory, ScanError, Scanned, Unscanned, WriteError, WriteFailures};
pub use raw_file::{LoadError, RawFile, RAW_EXTENSION};
