pub mod bin_common;
pub mod convert;
pub mod deck;
pub mod dedup;
pub mod imghash;
pub mod render;
pub mod report;

/// For stand-alone functionality that fit comfortably within one file.
pub mod utils;
