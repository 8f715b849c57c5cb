// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

// assembling the run configuration for a pipeline invocation
pub mod cluster;
pub mod gitinfo;
pub mod rawdata;
pub mod setup;
pub mod templates;
pub mod utils;
