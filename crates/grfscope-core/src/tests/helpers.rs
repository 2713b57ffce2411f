//! Test helper functions for setting up sessions and entities.
//!
//! Factory functions that build small worlds with water, vehicles and
//! industries, plus a surface host that records notifications.

use std::sync::{Arc, Mutex};

use crate::config::WorldConfig;
use crate::content::ContentSet;
use crate::feature::InspectTarget;
use crate::group::GrfFile;
use crate::inspect::surface::{InspectLine, SurfaceHost};
use crate::session::Session;
use crate::world::industry::{IndustryCallbacks, IndustryId, IndustrySpec, IndustryTileSpec};
use crate::world::tile::{TileIndex, WaterClass};
use crate::world::vehicle::{EngineId, EngineInfo, VehicleId, VehicleType};
use crate::world::World;

// =============================================================================
// Worlds
// =============================================================================

/// A 16x16 map.
pub fn small_world() -> World {
    World::new(WorldConfig {
        map_width: 16,
        map_height: 16,
        ..WorldConfig::default()
    })
}

/// Content file used by test graphs.
pub fn test_grf() -> Arc<GrfFile> {
    Arc::new(GrfFile::new(0x5445_5354, "test.grf"))
}

/// A session whose world has one water tile of `class` at (3,3), with
/// random bits `0b101`.
pub fn water_session(class: WaterClass, content: ContentSet) -> (Session, TileIndex) {
    let mut world = small_world();
    let tile = world.tile_index(3, 3).unwrap();
    world.make_water(tile, class);
    world.tile_mut(tile).unwrap().random_bits = 0b101;
    (Session::new(world, content), tile)
}

/// A session with a two-unit train: returns the head and the wagon.
pub fn train_session(content: ContentSet) -> (Session, VehicleId, VehicleId) {
    let mut world = small_world();
    world.register_engine(
        EngineId(7),
        EngineInfo {
            vehicle_type: VehicleType::Train,
            name: "Kirby Paul Tank".into(),
            ..EngineInfo::default()
        },
    );
    let head = world.spawn_vehicle(EngineId(7), None).unwrap();
    let wagon = world.spawn_vehicle(EngineId(7), Some(head)).unwrap();
    (Session::new(world, content), head, wagon)
}

/// A session with a 2x2 coal mine at (2,2) that enables the location
/// callback; returns the industry and its north tile.
pub fn industry_session(content: ContentSet) -> (Session, IndustryId, TileIndex) {
    let mut world = small_world();
    let kind = world
        .add_industry_spec(IndustrySpec {
            name: "Coal Mine".into(),
            callback_mask: IndustryCallbacks::LOCATION,
        })
        .unwrap();
    let gfx = world
        .add_industry_tile_spec(IndustryTileSpec {
            name: "Coal Mine tile".into(),
            ..IndustryTileSpec::default()
        })
        .unwrap();
    let origin = world.tile_index(2, 2).unwrap();
    let id = world.build_industry(kind, origin, 2, 2, gfx).unwrap();
    (Session::new(world, content), id, origin)
}

// =============================================================================
// Lines
// =============================================================================

/// Position and text of the variable line for `id`.
pub fn variable_line(lines: &[InspectLine], id: u8) -> Option<(usize, String)> {
    lines.iter().enumerate().find_map(|(n, line)| match line {
        InspectLine::Variable { id: found, .. } if *found == id => Some((n, line.to_string())),
        _ => None,
    })
}

/// Rendered text of every line.
pub fn texts(lines: &[InspectLine]) -> Vec<String> {
    lines.iter().map(ToString::to_string).collect()
}

// =============================================================================
// Surface host
// =============================================================================

/// Host that records every closed target.
#[derive(Debug, Clone, Default)]
pub struct ClosedLog(pub Arc<Mutex<Vec<InspectTarget>>>);

impl ClosedLog {
    /// Targets closed so far.
    pub fn closed(&self) -> Vec<InspectTarget> {
        self.0.lock().unwrap().clone()
    }
}

impl SurfaceHost for ClosedLog {
    fn surface_closed(&mut self, target: InspectTarget) {
        self.0.lock().unwrap().push(target);
    }
}
