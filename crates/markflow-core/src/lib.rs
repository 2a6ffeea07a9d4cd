//! # Markflow Core
//!
//! The pure, stateless half of the markflow engine: everything needed to
//! predict where a host editor saves a pasted image, scan markdown text for
//! image references, and rewrite a local reference to a remote URL.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │  PathVariables   │────▶│    predict()     │────▶│   Prediction    │
//! │  (vars)          │     │  (rule table)    │     │ (absolute path) │
//! └──────────────────┘     └──────────────────┘     └─────────────────┘
//!
//! ┌──────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ find_image_links │────▶│    rewrite()     │────▶│  RewriteEdit    │
//! │  (links)         │     │ (fuzzy matching) │     │ (range+cursor)  │
//! └──────────────────┘     └──────────────────┘     └─────────────────┘
//! ```
//!
//! The capability seams the watching half depends on ([`WorkspaceResolver`],
//! [`DocumentHost`], [`Uploader`]) live here too, together with headless
//! filesystem-backed implementations.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod host;
pub mod links;
pub mod paths;
pub mod patterns;
pub mod position;
pub mod predict;
pub mod rewrite;
pub mod traits;
pub mod vars;

pub use error::{Error, Result};
pub use host::{FsDocumentHost, StaticWorkspace};
pub use links::{find_image_links, is_local_image_path, resolve_absolute, ImageLink};
pub use patterns::generate_watch_patterns;
pub use position::{clamp_position, position_at, Position, Range};
pub use predict::{is_expected_path, predict, Prediction};
pub use rewrite::{find_reference, rewrite, ImageReference, RewriteEdit, SCORE_WEIGHTS};
pub use traits::{DocumentHost, Uploader, WorkspaceResolver};
pub use vars::PathVariables;
