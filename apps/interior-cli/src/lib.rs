//! Shared wiring for the `interior-*` binaries: gateway construction,
//! record loading and the HTTP API.

pub mod api;
pub mod bootstrap;
