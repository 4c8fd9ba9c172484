//! HTTP message schemas for the string service.
//!
//! Field names are single letters (`s` for the input, `v` for the value,
//! `err` for an in-band error) to stay wire-compatible with existing
//! string-service clients.

pub mod string_ops;

pub use string_ops::{CountRequest, CountResponse, UppercaseRequest, UppercaseResponse};
