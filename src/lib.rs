//! # MapKit
//!
//! Region editing and merge transaction engine for grid-based battle-map
//! editors. Regions are drawn or reshaped inside a transaction with its own
//! vertex-level undo, committed to a remote store, and merged automatically
//! with matching neighbours.
//!
//! ## Architecture
//!
//! MapKit is organized as a workspace with multiple crates:
//!
//! 1. **mapkit-core** - Scene and region data, errors, configuration, store interface
//! 2. **mapkit-regions** - Geometry, transactions, merges, history, dispatcher
//! 3. **mapkit** - This crate: re-exports, logging setup and the gesture replay tool

pub mod replay;

pub use mapkit_core::{
    EditorConfig, ErrorReporter, GridConfig, InMemoryRegionStore, Point, Region, RegionError,
    RegionIndex, RegionStore, Result, Scene, SceneId,
};
pub use mapkit_regions::{
    CommitResult, DocumentHistory, LocalAction, MergeExecutor, RegionCommand, RegionHandlers,
    RegionTransaction, SegmentProperties, TransactionKind,
};
pub use replay::{replay, Gesture, ReplayOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, leaving stdout for results
/// - RUST_LOG environment variable support, `info` otherwise
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
