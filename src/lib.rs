//! # homeflow: privacy pipelines for smart-home compositions
//!
//! A home is composed of physical sensors, processing modules and the
//! network domains those modules may contact. homeflow keeps that
//! composition as a validated graph and derives every information flow
//! ("pipeline") it permits, so each one can be allowed or denied.
//!
//! ## Architecture
//!
//! - **Graph**: the composition, with referential integrity on every edit
//!   and a canonical, deterministically ordered serialization
//! - **Catalog**: module and sensor templates looked up by id
//! - **Policy**: pipeline enumeration, permission decisions, overlay graphs
//!   with denied pipelines cut
//! - **Store**: loading and saving compositions
//! - **Events**: crossbeam channel notifications of every graph edit
//!
//! ## Example
//!
//! ```
//! use homeflow::{catalog::Catalog, graph::presets, policy::PathEnumerator};
//!
//! let catalog = Catalog::builtin();
//! let home = presets::voice_assistant(&catalog).unwrap();
//! for pipeline in PathEnumerator::enumerate(&home.to_format()) {
//!     println!("{}", pipeline);
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod policy;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use catalog::{Catalog, ModuleRepository};
pub use config::{AppConfig, GraphFile};
pub use error::{HomeflowError, Result};
pub use graph::{Graph, GraphError, GraphFormat};
pub use policy::{OverlayBuilder, PathEnumerator, Permissions, Pipeline};
pub use store::{GraphStore, JsonFileStore, MemoryStore};
