//! # Markflow Watch
//!
//! The capture-and-correlate half of the markflow engine: observes
//! filesystem create/modify events for image files, debounces the noise a
//! single save produces, waits for the file to be fully written, and
//! decides which open markdown document caused the save.
//!
//! ```text
//! ┌───────────────┐   ┌────────────────┐   ┌───────────────────┐
//! │ NotifyWatcher │──▶│   dispatcher   │──▶│ CaptureCorrelator │
//! │ (fs events)   │   │ (filter +      │   │ (stabilize +      │
//! └───────────────┘   │  debounce)     │   │  pick owner)      │
//!                     └────────────────┘   └─────────┬─────────┘
//!                                                    ▼
//!                     ┌────────────────┐   ┌───────────────────┐
//!                     │ UploadPipeline │◀──│   ImageCapture    │
//!                     │ (upload +      │   │   (channel)       │
//!                     │  rewrite)      │   └───────────────────┘
//!                     └────────────────┘
//! ```
//!
//! [`CaptureService`] wires the left half together and hands captures to
//! the caller over a channel; [`UploadPipeline`] consumes them once an
//! external [`Uploader`](markflow_core::Uploader) is available.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod backend;
mod capture;
mod correlator;
pub mod error;
mod events;
mod pipeline;
pub mod scanner;
mod service;

pub use backend::{NotifyWatcher, SubscriptionReport, WatchPatternSet};
pub use capture::ImageCapture;
pub use correlator::{CaptureCorrelator, DebounceLedger};
pub use error::{Error, Result};
pub use events::{FileEvent, FileEventKind, ImageEventFilter};
pub use pipeline::{CaptureOutcome, RewriteOutcome, UploadPipeline};
pub use service::CaptureService;
