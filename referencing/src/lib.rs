//! Implementation-agnostic JSON reference resolution: URIs, JSON Schema
//! draft detection, JSON Pointer token handling, and the `$id`/`$anchor`
//! scanner that builds a schema document's known-identifiers index.
mod error;
mod pointer;
mod scanner;
mod specification;
mod uri;

pub use error::{Error, UriError};
pub use pointer::{decode_token, encode_token, split_pointer};
pub use scanner::{identity_key, scan, Id, ScanIndex};
pub use specification::{guess, is_valid_anchor_name, Specification};
pub use uri::Uri;
