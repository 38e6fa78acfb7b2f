//! # RestOC Testkit
//!
//! Test utilities for RestOC.
//!
//! This crate provides:
//! - Sample structures and a table harness over the recording executor
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use restoc_testkit::prelude::*;
//!
//! let t = TestTable::new(users_structure());
//! t.count(None, &restoc_core::Filter::new()).unwrap();
//! assert_eq!(t.sql(), vec!["SELECT COUNT(*) FROM `app`.`users`"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
