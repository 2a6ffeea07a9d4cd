//! Configuration for the markflow capture and rewrite engine.
//!
//! Configuration is consumed as an immutable snapshot: callers load a
//! [`FlowConfig`], inject it into the components that need it, and re-load
//! on change notifications. Nothing in this crate holds global state.
//!
//! The on-disk format is TOML:
//!
//! ```toml
//! debounce_window_ms = 500
//!
//! [[destination_rules]]
//! pattern = "docs/**/*.md"
//! destination = "assets/${documentBaseName}/"
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod error;
mod validate;

pub use config::{DestinationRule, FlowConfig, StabilizationConfig};
pub use error::{ConfigError, Result};
pub use validate::{ConfigIssue, IssueSeverity};
