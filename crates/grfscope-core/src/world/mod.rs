//! Entity stores the resolvers and inspectors read from.
//!
//! The [`World`] owns the tile map and the keyed stores of vehicles and
//! industries, plus the content-defined specifications they refer to. It
//! provides:
//! - Stable lookup of entities by id (`BTreeMap`, deterministic iteration)
//! - Bounds-checked tile access and nearby-tile offsets
//! - Deterministic random bits for new water tiles, vehicles and industries,
//!   drawn from a `ChaCha8Rng` seeded by [`WorldConfig::seed`]
//!
//! Entity lifetime beyond construction is the host's business; the world only
//! offers the minimal mutators needed to set up state.
//!
//! # Example
//!
//! ```
//! use grfscope_core::config::WorldConfig;
//! use grfscope_core::world::{World, tile::WaterClass};
//!
//! let mut world = World::new(WorldConfig::default());
//! let tile = world.tile_index(3, 4).unwrap();
//! assert!(world.make_water(tile, WaterClass::Canal));
//! assert!(world.tile(tile).unwrap().is_water());
//! ```

pub mod cargo;
pub mod industry;
pub mod tile;
pub mod vehicle;

use std::collections::BTreeMap;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{Climate, WorldConfig};
use crate::feature::FeatureKind;
use crate::world::cargo::CargoTable;
use crate::world::industry::{
    Industry, IndustryGfx, IndustryId, IndustrySpec, IndustryTileSpec,
};
use crate::world::tile::{Tile, TileIndex, TileType, TropicZone, WaterClass};
use crate::world::vehicle::{EngineId, EngineInfo, Vehicle, VehicleId};

/// Container of all entity state.
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    tiles: Vec<Tile>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    industries: BTreeMap<IndustryId, Industry>,
    engines: BTreeMap<EngineId, EngineInfo>,
    industry_specs: Vec<IndustrySpec>,
    industry_tile_specs: Vec<IndustryTileSpec>,
    cargo: CargoTable,
    next_vehicle_id: u32,
    next_industry_id: u16,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a flat, empty map of clear tiles with the temperate cargos.
    ///
    /// The tile map is allocated up front; pass a config that passed
    /// [`WorldConfig::validate`].
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let tiles = vec![Tile::default(); config.tile_count()];
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            tiles,
            vehicles: BTreeMap::new(),
            industries: BTreeMap::new(),
            engines: BTreeMap::new(),
            industry_specs: Vec::new(),
            industry_tile_specs: Vec::new(),
            cargo: CargoTable::temperate(),
            next_vehicle_id: 0,
            next_industry_id: 0,
            rng,
        }
    }

    /// The configuration the world was built from.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn map_width(&self) -> u32 {
        self.config.map_width
    }

    // =========================================================================
    // Tiles
    // =========================================================================

    /// Index of the tile at `(x, y)`, or `None` if it is off the map.
    #[must_use]
    pub fn tile_index(&self, x: u32, y: u32) -> Option<TileIndex> {
        (x < self.config.map_width && y < self.config.map_height)
            .then(|| TileIndex::from_xy(x, y, self.config.map_width))
    }

    /// Tile at `index`, or `None` if it is off the map.
    #[must_use]
    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.get(index.as_u32() as usize)
    }

    /// Mutable tile at `index`, or `None` if it is off the map.
    pub fn tile_mut(&mut self, index: TileIndex) -> Option<&mut Tile> {
        self.tiles.get_mut(index.as_u32() as usize)
    }

    /// Tile `offset` away from `origin`, or `None` if that leaves the map.
    #[must_use]
    pub fn offset_tile(&self, origin: TileIndex, offset: IVec2) -> Option<TileIndex> {
        let at = origin.xy(self.config.map_width).as_ivec2() + offset;
        self.tile_index(u32::try_from(at.x).ok()?, u32::try_from(at.y).ok()?)
    }

    /// Sets the height level of a tile. Returns false if it is off the map.
    pub fn set_height(&mut self, index: TileIndex, height: u8) -> bool {
        self.tile_mut(index).map(|tile| tile.height = height).is_some()
    }

    /// Turns a tile into water of the given class with fresh random bits.
    ///
    /// Returns false if the tile is off the map.
    pub fn make_water(&mut self, index: TileIndex, class: WaterClass) -> bool {
        let bits: u8 = self.rng.gen();
        let Some(tile) = self.tile_mut(index) else {
            return false;
        };
        tile.tile_type = TileType::Water;
        tile.water_class = class;
        tile.random_bits = bits;
        true
    }

    /// Replaces the bits of `bits` selected by `mask` with fresh random ones.
    pub fn rerandomise(&mut self, bits: u32, mask: u32) -> u32 {
        let fresh: u32 = self.rng.gen();
        (bits & !mask) | (fresh & mask)
    }

    /// Terrain classification of a tile as seen by content.
    ///
    /// Normal 0, desert 1, rainforest 2, snow 4. Off-map tiles are normal.
    #[must_use]
    pub fn terrain_type(&self, index: TileIndex) -> u32 {
        let Some(tile) = self.tile(index) else {
            return 0;
        };
        match self.config.climate {
            Climate::Tropic => match tile.tropic_zone {
                TropicZone::Desert => 1,
                TropicZone::Rainforest => 2,
                TropicZone::Normal => 0,
            },
            Climate::Arctic if tile.height > self.config.snow_line_height => 4,
            _ => 0,
        }
    }

    /// Packed land information of a tile.
    ///
    /// Bits 24..31 tile type, 16..23 height level, 10..12 terrain type,
    /// 0..7 slope. Off-map tiles report zero.
    #[must_use]
    pub fn land_info(&self, index: TileIndex) -> u32 {
        let Some(tile) = self.tile(index) else {
            return 0;
        };
        (tile.tile_type as u32) << 24
            | u32::from(tile.height) << 16
            | self.terrain_type(index) << 10
            | u32::from(tile.slope)
    }

    /// Feature kind that customises the contents of a tile, if any.
    ///
    /// Water tiles report [`FeatureKind::Canals`] so water can be inspected
    /// by tile index; content packs themselves have no per-tile water
    /// feature. The map model does not tell rail stations from airports nor
    /// level crossings from plain road, so station and road tiles report
    /// `None` rather than `Stations`, `AirportTiles` or `RailTypes`.
    #[must_use]
    pub fn feature_for_tile(&self, index: TileIndex) -> Option<FeatureKind> {
        match self.tile(index)?.tile_type {
            TileType::Water => Some(FeatureKind::Canals),
            TileType::Industry => Some(FeatureKind::IndustryTiles),
            TileType::House => Some(FeatureKind::Houses),
            TileType::Railway => Some(FeatureKind::RailTypes),
            _ => None,
        }
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    /// Registers an engine specification under `id`.
    pub fn register_engine(&mut self, id: EngineId, info: EngineInfo) {
        self.engines.insert(id, info);
    }

    /// Engine specification by id.
    #[must_use]
    pub fn engine(&self, id: EngineId) -> Option<&EngineInfo> {
        self.engines.get(&id)
    }

    /// Builds a vehicle unit from a registered engine.
    ///
    /// With `head = None` the unit starts a new consist; otherwise it is
    /// appended to the consist led by `head`. Returns `None` if the engine
    /// or head is unknown, or if `head` is not itself a consist head.
    pub fn spawn_vehicle(&mut self, engine: EngineId, head: Option<VehicleId>) -> Option<VehicleId> {
        let info = self.engines.get(&engine)?;
        let (vehicle_type, cargo_type) = (info.vehicle_type, info.cargo_type);
        if let Some(head) = head {
            let leader = self.vehicles.get(&head)?;
            if leader.first != head {
                return None;
            }
        }

        let id = VehicleId::new(self.next_vehicle_id);
        self.next_vehicle_id += 1;
        let vehicle = Vehicle {
            vehicle_type,
            engine,
            first: head.unwrap_or(id),
            cargo_type,
            random_bits: self.rng.gen(),
            ..Vehicle::default()
        };
        self.vehicles.insert(id, vehicle);
        Some(id)
    }

    /// Vehicle unit by id.
    #[must_use]
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Mutable vehicle unit by id.
    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    /// Units of the consist led by `head`, front to back.
    pub fn consist(&self, head: VehicleId) -> impl Iterator<Item = (VehicleId, &Vehicle)> + '_ {
        self.vehicles
            .iter()
            .filter(move |(_, vehicle)| vehicle.first == head)
            .map(|(id, vehicle)| (*id, vehicle))
    }

    /// Number of vehicle units.
    #[must_use]
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    // =========================================================================
    // Industries
    // =========================================================================

    /// Adds an industry type and returns its index.
    ///
    /// Returns `None` once all 256 type slots are taken.
    pub fn add_industry_spec(&mut self, spec: IndustrySpec) -> Option<u8> {
        let index = u8::try_from(self.industry_specs.len()).ok()?;
        self.industry_specs.push(spec);
        Some(index)
    }

    /// Adds an industry tile type and returns its graphics id.
    ///
    /// Returns `None` once all 65536 graphics slots are taken.
    pub fn add_industry_tile_spec(&mut self, spec: IndustryTileSpec) -> Option<IndustryGfx> {
        let gfx = u16::try_from(self.industry_tile_specs.len()).ok()?;
        self.industry_tile_specs.push(spec);
        Some(IndustryGfx(gfx))
    }

    /// Industry type specification.
    #[must_use]
    pub fn industry_spec(&self, industry_type: u8) -> Option<&IndustrySpec> {
        self.industry_specs.get(usize::from(industry_type))
    }

    /// Industry tile type specification.
    #[must_use]
    pub fn industry_tile_spec(&self, gfx: IndustryGfx) -> Option<&IndustryTileSpec> {
        self.industry_tile_specs.get(usize::from(gfx.0))
    }

    /// Builds an industry covering a `width` x `height` rectangle.
    ///
    /// Every covered tile becomes a finished industry tile of graphics `gfx`
    /// with fresh random bits. Returns `None` if the type is unknown or the
    /// rectangle leaves the map.
    pub fn build_industry(
        &mut self,
        industry_type: u8,
        location: TileIndex,
        width: u8,
        height: u8,
        gfx: IndustryGfx,
    ) -> Option<IndustryId> {
        self.industry_spec(industry_type)?;
        let origin = location.xy(self.config.map_width);
        let mut covered = Vec::with_capacity(usize::from(width) * usize::from(height));
        for dy in 0..u32::from(height) {
            for dx in 0..u32::from(width) {
                covered.push(self.tile_index(origin.x + dx, origin.y + dy)?);
            }
        }

        let id = IndustryId::new(self.next_industry_id);
        self.next_industry_id += 1;
        for index in covered {
            let bits: u8 = self.rng.gen();
            if let Some(tile) = self.tile_mut(index) {
                tile.tile_type = TileType::Industry;
                tile.industry = Some(id);
                tile.industry_gfx = gfx;
                tile.construction_stage = 3;
                tile.random_bits = bits;
            }
        }

        let industry = Industry {
            location,
            width,
            height,
            industry_type,
            random: self.rng.gen(),
            ..Industry::default()
        };
        self.industries.insert(id, industry);
        Some(id)
    }

    /// Industry by id.
    #[must_use]
    pub fn industry(&self, id: IndustryId) -> Option<&Industry> {
        self.industries.get(&id)
    }

    /// Mutable industry by id.
    pub fn industry_mut(&mut self, id: IndustryId) -> Option<&mut Industry> {
        self.industries.get_mut(&id)
    }

    /// Number of industries.
    #[must_use]
    pub fn industry_count(&self) -> usize {
        self.industries.len()
    }

    // =========================================================================
    // Cargo
    // =========================================================================

    /// Cargo table of the loaded content.
    #[must_use]
    pub const fn cargo(&self) -> &CargoTable {
        &self.cargo
    }

    /// Mutable cargo table.
    pub fn cargo_mut(&mut self) -> &mut CargoTable {
        &mut self.cargo
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
