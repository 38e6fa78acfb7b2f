//! # RestOC Codec
//!
//! The dynamic [`Value`] type shared by every RestOC crate, and the JSON
//! text encoding used for structured fields and change-audit payloads.
//!
//! ## Usage
//!
//! ```
//! use restoc_codec::{from_json, to_json, Value};
//!
//! let value = Value::map([("tags", Value::from(vec!["a", "b"]))]);
//! let text = to_json(&value).unwrap();
//! assert_eq!(text, r#"{"tags":["a","b"]}"#);
//! assert_eq!(from_json(&text).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod value;

pub use error::{CodecError, CodecResult};
pub use json::{from_json, to_json, to_json_value};
pub use value::{Value, ValueMap};
