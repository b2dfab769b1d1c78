//! Row Action Visibility Engine
//!
//! Decides, per table row, which configured actions are offered and what
//! context accompanies an invocation:
//! - Attribute resolution from a host-injected object or a stored bearer token
//! - Single condition evaluation with numeric-aware comparison
//! - Flat and grouped (AND/OR) condition evaluation over RLS attributes
//! - Per-action filtering and payload construction
//!
//! RLS attributes are read from client-controlled state. They filter what a
//! user is offered and annotate outgoing events; they are not an access control
//! mechanism.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod attributes;
pub mod condition;
pub mod filter;
pub mod group;
mod lenient;
pub mod payload;
mod value;

pub use action::{ActionConfig, ActionIcon, ActionStyle, SelectionState, VisibilityCondition};
pub use attributes::{
    decode_token_claims, AttributeSource, HostAttributes, LayeredAttributeSource, MemoryStorage,
    TokenStorage,
};
pub use condition::{Condition, ConditionEvaluator, ConditionSource, Operator};
pub use filter::{ActionFilter, VisibleAction};
pub use group::{ConditionGroup, GroupEvaluator, JoinOperator, RlsConditions};
pub use payload::{trim_row, PayloadBuilder};
