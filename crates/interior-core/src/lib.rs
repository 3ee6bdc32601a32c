//! interior-core
//!
//! Domain types, the error taxonomy, gateway traits, configuration and the
//! flat-file catalog shared by every crate in the workspace.
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
