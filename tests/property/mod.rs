pub mod cache_roundtrip;
pub mod canonical_json;
pub mod command_builder;
