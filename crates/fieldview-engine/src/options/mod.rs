//! Typed view configuration.
//!
//! Responsibilities:
//! - a closed set of option keys, each with one declared value kind
//! - a store holding a value for every key from construction on
//! - sparse change sets applied with value-equality diffing, so dependents
//!   only react to keys that actually changed

mod changes;
mod key;
mod store;
mod value;

pub use changes::{ChangedOptions, Configuration};
pub use key::{ValueKind, ViewOption};
pub use store::{Options, OptionsError, ALWAYS_VISIBLE_IMPLEMENTATION};
pub use value::{Color, OptionType, OptionValue};
