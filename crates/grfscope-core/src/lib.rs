//! # grfscope Core
//!
//! Content-driven attribute resolution and entity introspection.
//!
//! Content packs customise the appearance and behaviour of game entities by
//! supplying decision graphs. This crate evaluates those graphs against live
//! entity state, and exposes a debug layer that shows, per entity, the
//! variables the graphs can see, the raw properties, the persistent storage
//! and the enabled callbacks.
//!
//! ## Architecture
//!
//! - **World**: tiles, vehicles, industries and their specifications
//! - **Resolvers**: one per entity kind, behind a common trait; a single
//!   graph walker serves all of them
//! - **Inspection**: per-kind descriptor tables, helpers and the surface
//!   render model
//! - **Session**: owns everything and exposes the entry points
//!
//! ## Usage
//!
//! ```
//! use grfscope_core::{ContentSet, FeatureKind, Session, World};
//! use grfscope_core::world::tile::WaterClass;
//!
//! let mut world = World::default();
//! let tile = world.tile_index(4, 4).unwrap();
//! world.make_water(tile, WaterClass::River);
//!
//! let mut session = Session::new(world, ContentSet::new());
//! let target = session.open_inspector(FeatureKind::Canals, tile.as_u32()).unwrap();
//! for line in session.render_inspector(target).unwrap() {
//!     println!("{line}");
//! }
//! assert!(session.close_inspector(FeatureKind::Canals, tile.as_u32()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod feature;
pub mod group;
pub mod inspect;
pub mod resolver;
pub mod session;
pub mod world;

#[cfg(test)]
mod tests;

pub use config::WorldConfig;
pub use content::ContentSet;
pub use diagnostics::{Diagnostic, DiagnosticsSink, RecordingSink, TracingSink};
pub use error::{GrfError, Result};
pub use feature::{CanalFeature, FeatureKind, GraphKey, InspectTarget};
pub use session::Session;
pub use world::World;
