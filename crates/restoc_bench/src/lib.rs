//! Shared setup for the RestOC benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
