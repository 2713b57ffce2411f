//! Resolver for water tiles.

use crate::config::TILE_HEIGHT;
use crate::feature::FeatureKind;
use crate::resolver::{FeatureResolver, VariableValue};
use crate::world::tile::TileIndex;
use crate::world::World;

/// Resolves canal, river and sea graphics for one tile.
///
/// Variables:
/// - `0x80`: height level of the tile
/// - `0x81`: terrain type (normal, desert, rainforest, snow)
/// - `0x83`: random bits of the water tile
#[derive(Debug, Clone, Copy)]
pub struct CanalScope<'a> {
    world: &'a World,
    tile: TileIndex,
}

impl<'a> CanalScope<'a> {
    /// Creates a resolver for `tile`.
    #[must_use]
    pub const fn new(world: &'a World, tile: TileIndex) -> Self {
        Self { world, tile }
    }

    /// The tile being resolved.
    #[must_use]
    pub const fn tile(&self) -> TileIndex {
        self.tile
    }

    fn water_bits(&self) -> u32 {
        self.world
            .tile(self.tile)
            .map_or(0, |tile| u32::from(tile.water_random_bits()))
    }
}

impl FeatureResolver for CanalScope<'_> {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Canals
    }

    fn index(&self) -> u32 {
        self.tile.as_u32()
    }

    fn random_bits(&self) -> u32 {
        self.water_bits()
    }

    fn variable(&self, id: u8, _param: u8) -> VariableValue {
        match id {
            0x80 => {
                let z = self.world.tile(self.tile).map_or(0, |tile| tile.z());
                VariableValue::available(z / TILE_HEIGHT)
            }
            0x81 => VariableValue::available(self.world.terrain_type(self.tile)),
            0x83 => VariableValue::available(self.water_bits()),
            _ => VariableValue::UNAVAILABLE,
        }
    }
}
