//! Row Actions Common Types and Utilities
//!
//! Shared wire types, configuration, and error handling for the row action engine.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

pub use config::RowActionsConfig;
pub use error::{Error, Result};
pub use types::{
    ActionPayload, AttributeMap, ChartId, HostId, PayloadKind, Row, RowId, VisibilityResult,
};
