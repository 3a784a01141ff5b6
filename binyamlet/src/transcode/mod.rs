//! Conversions from yamlet documents to other data formats.

pub mod cbor;
pub mod json;
pub mod toml;
pub mod yaml;
