//! Privacy policy over a composition.
//!
//! The policy layer never mutates the composition it analyzes:
//!
//! 1. [`PathEnumerator`] lists every pipeline a [`GraphFormat`] permits
//!    (built over a [`FlowGraph`]).
//! 2. [`Permissions`] holds one allow/deny decision per pipeline.
//! 3. [`OverlayBuilder`] clones the graph and cuts the terminal hop of every
//!    denied pipeline.
//!
//! ```
//! use homeflow::catalog::Catalog;
//! use homeflow::graph::presets;
//! use homeflow::policy::{OverlayBuilder, PathEnumerator, Permissions};
//!
//! let catalog = Catalog::builtin();
//! let home = presets::security_camera(&catalog).unwrap();
//! let mut perms = Permissions::new(PathEnumerator::enumerate(&home.to_format()));
//! perms.deny(0).unwrap();
//! let overlay = OverlayBuilder::new(&catalog).build(&home, &perms).unwrap();
//! assert!(overlay.graph.network_edges("differential_privacy").is_empty());
//! ```
//!
//! [`GraphFormat`]: crate::graph::GraphFormat

pub mod enumerator;
pub mod flow_graph;
pub mod id;
pub mod overlay;
pub mod permissions;

pub use enumerator::{PathEnumerator, Pipeline};
pub use flow_graph::{FlowGraph, FlowNode, FlowNodeKind};
pub use id::FlowNodeId;
pub use overlay::{Overlay, OverlayBuilder, OverlayReport};
pub use permissions::{PermissionRecord, Permissions};
