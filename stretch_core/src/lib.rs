#![forbid(unsafe_code)]

//! Core domain model and playback engine for the Stretch routine player.
//!
//! This crate provides:
//! - Domain types (exercises, routines, sides, phases)
//! - Routine catalog and configuration
//! - Host scheduler abstraction and the cancellable TimerController
//! - Transition policy for expired exercise slots
//! - The playback engine and its presenter events

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod events;
pub mod scheduler;
pub mod timer;
pub mod transition;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, RoutineCatalog};
pub use config::Config;
pub use events::{EventSink, JsonlEventSink, PlaybackEvent};
pub use scheduler::{RealtimeScheduler, Scheduler, UnavailableScheduler, VirtualScheduler};
pub use engine::{PlaybackEngine, PlaybackSession};
