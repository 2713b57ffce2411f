//! Resolvers for industries and industry tiles.
//!
//! Several variables take a packed nearby-tile offset as parameter, decoded
//! with [`unpack_offset`]. Offsets leaving the map read as a tile of the
//! neutral defaults.

use crate::feature::FeatureKind;
use crate::resolver::{FeatureResolver, VariableValue};
use crate::world::industry::{Industry, IndustryId};
use crate::world::tile::{unpack_offset, Tile, TileIndex};
use crate::world::World;

/// Graphics id reported for a tile belonging to another industry.
pub const FOREIGN_INDUSTRY_TILE: u32 = 0xFFFE;

/// Graphics id reported for a tile that is not an industry tile.
pub const NOT_INDUSTRY_TILE: u32 = 0xFFFF;

// =============================================================================
// IndustryScope
// =============================================================================

/// Resolves callbacks of one industry.
///
/// Variables:
/// - `0x40`..`0x42`: incoming cargo waiting, per accepted cargo
/// - `0x44`: selected layout
/// - `0x46`: construction date
/// - `0x60`: industry tile graphics at offset `param` from the north tile
/// - `0x61`: random bits of the tile at offset, zero unless it is ours
/// - `0x62`: land info of the tile at offset
#[derive(Debug, Clone)]
pub struct IndustryScope<'a> {
    world: &'a World,
    id: IndustryId,
    industry: &'a Industry,
    pending_triggers: Option<u8>,
}

impl<'a> IndustryScope<'a> {
    /// Creates a resolver for industry `id`, or `None` if it does not exist.
    #[must_use]
    pub fn new(world: &'a World, id: IndustryId) -> Option<Self> {
        let industry = world.industry(id)?;
        Some(Self {
            world,
            id,
            industry,
            pending_triggers: None,
        })
    }

    /// Triggers to write back after the walk, if they changed.
    #[must_use]
    pub const fn pending_triggers(&self) -> Option<u8> {
        self.pending_triggers
    }

    fn nearby(&self, param: u8) -> Option<(TileIndex, &'a Tile)> {
        let index = self
            .world
            .offset_tile(self.industry.location, unpack_offset(param))?;
        Some((index, self.world.tile(index)?))
    }
}

impl FeatureResolver for IndustryScope<'_> {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Industries
    }

    fn index(&self) -> u32 {
        u32::from(self.id.as_u16())
    }

    fn random_bits(&self) -> u32 {
        u32::from(self.industry.random)
    }

    fn triggers(&self) -> u32 {
        u32::from(self.pending_triggers.unwrap_or(self.industry.random_triggers))
    }

    fn set_triggers(&mut self, triggers: u32) {
        self.pending_triggers = Some((triggers & 0xFF) as u8);
    }

    fn variable(&self, id: u8, param: u8) -> VariableValue {
        let industry = self.industry;
        match id {
            0x40..=0x42 => u32::from(industry.incoming_cargo_waiting[usize::from(id - 0x40)]).into(),
            0x44 => u32::from(industry.selected_layout).into(),
            0x46 => industry.construction_date.into(),
            0x60 => match self.nearby(param) {
                Some((_, tile)) => gfx_relative_to(tile, self.id).into(),
                None => NOT_INDUSTRY_TILE.into(),
            },
            0x61 => self
                .nearby(param)
                .filter(|(_, tile)| tile.industry == Some(self.id))
                .map_or(0, |(_, tile)| u32::from(tile.random_bits))
                .into(),
            0x62 => self
                .nearby(param)
                .map_or(0, |(index, _)| self.world.land_info(index))
                .into(),
            _ => VariableValue::UNAVAILABLE,
        }
    }
}

// =============================================================================
// IndustryTileScope
// =============================================================================

/// Resolves graphics and callbacks of one industry tile.
///
/// Variables:
/// - `0x40`: construction stage
/// - `0x41`: terrain type
/// - `0x43`: position relative to the industry's north tile, `x | y << 8`
/// - `0x44`: animation frame
/// - `0x60`: land info of the tile at offset `param`
/// - `0x61`: animation frame of the tile at offset, zero unless it is ours
/// - `0x62`: graphics of the tile at offset; [`FOREIGN_INDUSTRY_TILE`] for
///   another industry's tile, [`NOT_INDUSTRY_TILE`] for anything else
#[derive(Debug, Clone)]
pub struct IndustryTileScope<'a> {
    world: &'a World,
    index: TileIndex,
    tile: &'a Tile,
    pending_triggers: Option<u8>,
}

impl<'a> IndustryTileScope<'a> {
    /// Creates a resolver for the industry tile at `index`.
    ///
    /// Returns `None` if the tile is off the map or not an industry tile.
    #[must_use]
    pub fn new(world: &'a World, index: TileIndex) -> Option<Self> {
        let tile = world.tile(index).filter(|tile| tile.is_industry())?;
        Some(Self {
            world,
            index,
            tile,
            pending_triggers: None,
        })
    }

    /// Triggers to write back after the walk, if they changed.
    #[must_use]
    pub const fn pending_triggers(&self) -> Option<u8> {
        self.pending_triggers
    }

    fn industry(&self) -> Option<&'a Industry> {
        self.world.industry(self.tile.industry?)
    }

    fn nearby(&self, param: u8) -> Option<(TileIndex, &'a Tile)> {
        let index = self.world.offset_tile(self.index, unpack_offset(param))?;
        Some((index, self.world.tile(index)?))
    }

    fn relative_position(&self) -> u32 {
        let Some(industry) = self.industry() else {
            return 0;
        };
        let width = self.world.map_width();
        let at = self.index.xy(width).saturating_sub(industry.location.xy(width));
        (at.x & 0xFF) | (at.y & 0xFF) << 8
    }
}

impl FeatureResolver for IndustryTileScope<'_> {
    fn kind(&self) -> FeatureKind {
        FeatureKind::IndustryTiles
    }

    fn index(&self) -> u32 {
        self.index.as_u32()
    }

    fn random_bits(&self) -> u32 {
        u32::from(self.tile.random_bits)
    }

    fn triggers(&self) -> u32 {
        u32::from(self.pending_triggers.unwrap_or(self.tile.triggers))
    }

    fn set_triggers(&mut self, triggers: u32) {
        self.pending_triggers = Some((triggers & 0xFF) as u8);
    }

    fn variable(&self, id: u8, param: u8) -> VariableValue {
        let tile = self.tile;
        match id {
            0x40 => u32::from(tile.construction_stage).into(),
            0x41 => self.world.terrain_type(self.index).into(),
            0x43 => self.relative_position().into(),
            0x44 => u32::from(tile.animation_frame).into(),
            0x60 => self
                .nearby(param)
                .map_or(0, |(index, _)| self.world.land_info(index))
                .into(),
            0x61 => self
                .nearby(param)
                .filter(|(_, other)| other.industry.is_some() && other.industry == tile.industry)
                .map_or(0, |(_, other)| u32::from(other.animation_frame))
                .into(),
            0x62 => match (self.nearby(param), tile.industry) {
                (Some((_, other)), Some(owner)) => gfx_relative_to(other, owner).into(),
                _ => NOT_INDUSTRY_TILE.into(),
            },
            _ => VariableValue::UNAVAILABLE,
        }
    }
}

/// Graphics id of `tile` as seen from industry `owner`.
fn gfx_relative_to(tile: &Tile, owner: IndustryId) -> u32 {
    match tile.industry {
        Some(id) if tile.is_industry() && id == owner => u32::from(tile.industry_gfx.0),
        Some(_) if tile.is_industry() => FOREIGN_INDUSTRY_TILE,
        _ => NOT_INDUSTRY_TILE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::world::industry::{IndustrySpec, IndustryTileSpec};

    struct Fixture {
        world: World,
        ours: IndustryId,
        origin: TileIndex,
    }

    /// Two 2x2 industries side by side at (2,2) and (4,2), graphics 0 and 1.
    fn fixture() -> Fixture {
        let mut world = World::new(WorldConfig {
            map_width: 16,
            map_height: 16,
            ..WorldConfig::default()
        });
        let kind = world.add_industry_spec(IndustrySpec::default()).unwrap();
        let gfx_a = world.add_industry_tile_spec(IndustryTileSpec::default()).unwrap();
        let gfx_b = world.add_industry_tile_spec(IndustryTileSpec::default()).unwrap();
        let origin = world.tile_index(2, 2).unwrap();
        let ours = world.build_industry(kind, origin, 2, 2, gfx_a).unwrap();
        let theirs_at = world.tile_index(4, 2).unwrap();
        world.build_industry(kind, theirs_at, 2, 2, gfx_b).unwrap();
        Fixture { world, ours, origin }
    }

    mod industry_scope_tests {
        use super::*;

        #[test]
        fn waiting_cargo_and_layout() {
            let mut f = fixture();
            let industry = f.world.industry_mut(f.ours).unwrap();
            industry.incoming_cargo_waiting = [10, 20, 30];
            industry.selected_layout = 2;
            industry.construction_date = 700_000;

            let scope = IndustryScope::new(&f.world, f.ours).unwrap();
            assert_eq!(scope.variable(0x40, 0).get(), Some(10));
            assert_eq!(scope.variable(0x42, 0).get(), Some(30));
            assert_eq!(scope.variable(0x44, 0).get(), Some(2));
            assert_eq!(scope.variable(0x46, 0).get(), Some(700_000));
            assert!(!scope.variable(0x43, 0).available);
        }

        #[test]
        fn nearby_tile_graphics() {
            let f = fixture();
            let scope = IndustryScope::new(&f.world, f.ours).unwrap();
            assert_eq!(scope.variable(0x60, 0x11).get(), Some(0));
            assert_eq!(scope.variable(0x60, 0x02).get(), Some(FOREIGN_INDUSTRY_TILE));
            assert_eq!(scope.variable(0x60, 0xFF).get(), Some(NOT_INDUSTRY_TILE));
        }

        #[test]
        fn nearby_random_bits_only_for_own_tiles() {
            let f = fixture();
            let scope = IndustryScope::new(&f.world, f.ours).unwrap();
            let own = f.world.offset_tile(f.origin, glam::IVec2::new(1, 0)).unwrap();
            let bits = u32::from(f.world.tile(own).unwrap().random_bits);
            assert_eq!(scope.variable(0x61, 0x01).get(), Some(bits));
            assert_eq!(scope.variable(0x61, 0x02).get(), Some(0));
        }

        #[test]
        fn nearby_land_info() {
            let f = fixture();
            let scope = IndustryScope::new(&f.world, f.ours).unwrap();
            let value = scope.variable(0x62, 0x00).get().unwrap();
            assert_eq!(value >> 24, 8);
        }
    }

    mod industry_tile_scope_tests {
        use super::*;

        #[test]
        fn requires_industry_tile() {
            let f = fixture();
            let clear = f.world.tile_index(0, 0).unwrap();
            assert!(IndustryTileScope::new(&f.world, clear).is_none());
            assert!(IndustryTileScope::new(&f.world, f.origin).is_some());
        }

        #[test]
        fn own_state() {
            let mut f = fixture();
            let tile = f.world.tile_index(3, 3).unwrap();
            f.world.tile_mut(tile).unwrap().animation_frame = 7;

            let scope = IndustryTileScope::new(&f.world, tile).unwrap();
            assert_eq!(scope.variable(0x40, 0).get(), Some(3));
            assert_eq!(scope.variable(0x43, 0).get(), Some(1 | 1 << 8));
            assert_eq!(scope.variable(0x44, 0).get(), Some(7));
        }

        #[test]
        fn nearby_animation_frame() {
            let mut f = fixture();
            let left = f.world.tile_index(2, 2).unwrap();
            let right = f.world.tile_index(3, 2).unwrap();
            let foreign = f.world.tile_index(4, 2).unwrap();
            f.world.tile_mut(right).unwrap().animation_frame = 9;
            f.world.tile_mut(foreign).unwrap().animation_frame = 5;

            let scope = IndustryTileScope::new(&f.world, left).unwrap();
            assert_eq!(scope.variable(0x61, 0x01).get(), Some(9));
            assert_eq!(scope.variable(0x61, 0x02).get(), Some(0));
        }

        #[test]
        fn nearby_graphics() {
            let f = fixture();
            let right = f.world.tile_index(3, 2).unwrap();
            let scope = IndustryTileScope::new(&f.world, right).unwrap();
            assert_eq!(scope.variable(0x62, 0x0F).get(), Some(0));
            assert_eq!(scope.variable(0x62, 0x01).get(), Some(FOREIGN_INDUSTRY_TILE));
            assert_eq!(scope.variable(0x62, 0xF0).get(), Some(NOT_INDUSTRY_TILE));
        }
    }
}
