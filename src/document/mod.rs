//! Document helpers
//!
//! Reading untrusted JSON documents into typed values with user-facing,
//! field-qualified error messages.
//!
//! - `converter.rs` - object field consumption and scalar conversions
//! - `error.rs` - decode errors

mod converter;
mod error;

pub use converter::{
    ObjectConverter, display_value, is_valid_name, name_from_value, string_from_value,
    uuid_from_value, vector_from_value,
};
pub use error::{DocumentError, DocumentResult};
