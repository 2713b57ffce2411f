//! Map tiles.
//!
//! Tiles are stored densely in row-major order and addressed by
//! [`TileIndex`]. A tile carries the small amount of per-tile state the
//! resolvers need: its type, height level, climate zone, water class and the
//! random/animation bytes shared by water and industry tiles.

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TILE_HEIGHT;
use crate::world::industry::{IndustryGfx, IndustryId};

/// Row-major index of a tile on the map.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates an index from its raw value.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Index of the tile at `(x, y)` on a map `map_width` tiles wide.
    #[must_use]
    pub const fn from_xy(x: u32, y: u32, map_width: u32) -> Self {
        Self(y * map_width + x)
    }

    /// Coordinates of this tile on a map `map_width` tiles wide.
    #[must_use]
    pub const fn xy(self, map_width: u32) -> UVec2 {
        UVec2::new(self.0 % map_width, self.0 / map_width)
    }
}

impl fmt::Debug for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileIndex({})", self.0)
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Decodes a packed nearby-tile offset.
///
/// Bits 0..3 hold a signed x offset and bits 4..7 a signed y offset, each in
/// `-8..=7`.
#[must_use]
pub fn unpack_offset(param: u8) -> IVec2 {
    let x = i32::from(((param & 0x0F) << 4) as i8 >> 4);
    let y = i32::from((param & 0xF0) as i8 >> 4);
    IVec2::new(x, y)
}

/// Basic class of a tile.
///
/// The discriminant is the value reported in bits 24..31 of land-info
/// variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileType {
    /// Bare land
    #[default]
    Clear = 0,
    /// Railway track
    Railway = 1,
    /// Road
    Road = 2,
    /// Town house
    House = 3,
    /// Trees
    Trees = 4,
    /// Station part
    Station = 5,
    /// Sea, canal or river
    Water = 6,
    /// Off-map border
    Void = 7,
    /// Industry tile
    Industry = 8,
    /// Tunnel entrance or bridge ramp
    TunnelBridge = 9,
    /// Object
    Object = 10,
}

/// Kind of water on a water tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterClass {
    /// Open sea
    #[default]
    Sea,
    /// Built canal
    Canal,
    /// River
    River,
}

/// Sub-tropical climate zone of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TropicZone {
    /// Neither desert nor rainforest
    #[default]
    Normal,
    /// Desert
    Desert,
    /// Rainforest
    Rainforest,
}

/// State of one map tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Basic class.
    pub tile_type: TileType,
    /// Height level of the lowest corner.
    pub height: u8,
    /// Slope bits; zero for flat tiles.
    pub slope: u8,
    /// Climate zone, only meaningful in the sub-tropical climate.
    pub tropic_zone: TropicZone,
    /// Water class, only meaningful on water tiles.
    pub water_class: WaterClass,
    /// Random bits of water and industry tiles.
    pub random_bits: u8,
    /// Waiting random triggers of industry tiles.
    pub triggers: u8,
    /// Owning industry of an industry tile.
    pub industry: Option<IndustryId>,
    /// Graphics id of an industry tile.
    pub industry_gfx: IndustryGfx,
    /// Construction stage (0..=3) of an industry tile.
    pub construction_stage: u8,
    /// Current animation frame.
    pub animation_frame: u8,
}

impl Tile {
    /// Height of the tile in world units.
    #[must_use]
    pub fn z(&self) -> u32 {
        u32::from(self.height) * TILE_HEIGHT
    }

    /// Whether this is a water tile.
    #[must_use]
    pub fn is_water(&self) -> bool {
        self.tile_type == TileType::Water
    }

    /// Random bits of a water tile; zero for every other tile type.
    #[must_use]
    pub fn water_random_bits(&self) -> u8 {
        if self.is_water() {
            self.random_bits
        } else {
            0
        }
    }

    /// Whether this is a tile of an industry.
    #[must_use]
    pub fn is_industry(&self) -> bool {
        self.tile_type == TileType::Industry && self.industry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_coordinates() {
        let tile = TileIndex::from_xy(5, 9, 64);
        assert_eq!(tile.as_u32(), 9 * 64 + 5);
        assert_eq!(tile.xy(64), UVec2::new(5, 9));
    }

    #[test]
    fn offsets_are_sign_extended_nibbles() {
        assert_eq!(unpack_offset(0x00), IVec2::ZERO);
        assert_eq!(unpack_offset(0x01), IVec2::new(1, 0));
        assert_eq!(unpack_offset(0x0F), IVec2::new(-1, 0));
        assert_eq!(unpack_offset(0x10), IVec2::new(0, 1));
        assert_eq!(unpack_offset(0xF0), IVec2::new(0, -1));
        assert_eq!(unpack_offset(0x87), IVec2::new(7, -8));
    }

    #[test]
    fn water_random_bits_are_gated_on_type() {
        let mut tile = Tile {
            tile_type: TileType::Water,
            random_bits: 0b101,
            ..Tile::default()
        };
        assert_eq!(tile.water_random_bits(), 5);

        tile.tile_type = TileType::Station;
        assert_eq!(tile.water_random_bits(), 0);
    }

    #[test]
    fn z_scales_height_levels() {
        let tile = Tile {
            height: 3,
            ..Tile::default()
        };
        assert_eq!(tile.z(), 3 * TILE_HEIGHT);
    }
}
