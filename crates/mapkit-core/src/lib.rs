//! # MapKit Core
//!
//! Core types, traits, and configuration for MapKit.
//! Provides the scene and region data model, the error taxonomy shared by
//! the editing engine, and the interfaces through which the engine talks to
//! the remote store and to the user.

pub mod config;
pub mod data;
pub mod error;
pub mod memory_store;
pub mod notify;
pub mod store;

pub use config::EditorConfig;
pub use data::{CellSize, GridConfig, Point, Region, RegionIndex, Scene, SceneId};
pub use error::{ConfigError, ConfigResult, RegionError, Result};
pub use memory_store::{InMemoryRegionStore, StoreCall, StoreOperation};
pub use notify::{ErrorLog, ErrorReporter, LogErrorReporter};
pub use store::{
    AddRegionRequest, AddedRegion, RegionStore, RemoveRegionRequest, UpdateRegionRequest,
};
