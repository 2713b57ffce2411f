//! JSON scenarios: a world to build and the content graphs to load.
//!
//! ```json
//! {
//!   "world": { "map_width": 16, "map_height": 16 },
//!   "water": [{ "x": 3, "y": 3, "class": "canal" }],
//!   "graphs": [{
//!     "feature": "Canals", "slot": 2,
//!     "root": { "type": "real", "loaded": [{ "type": "sprite", "sprite": 1200 }] }
//!   }]
//! }
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use grfscope_core::content::{ContentSet, WaterCallbacks, WaterFeature};
use grfscope_core::group::{
    DeterministicGroup, GrfFile, GroupRef, RandomizedGroup, RealGroup, SpriteGroup, TriggerMode,
};
use grfscope_core::world::cargo::CargoId;
use grfscope_core::world::industry::{
    IndustryCallbacks, IndustryGfx, IndustrySpec, IndustryTileCallbacks, IndustryTileSpec,
};
use grfscope_core::world::tile::WaterClass;
use grfscope_core::world::vehicle::{EngineId, EngineInfo, VehicleCallbacks, VehicleType};
use grfscope_core::{CanalFeature, FeatureKind, GrfError, GraphKey, World, WorldConfig};

// =============================================================================
// Document
// =============================================================================

/// A scenario document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub world: WorldConfig,
    pub water: Vec<WaterDef>,
    pub engines: Vec<EngineDef>,
    /// Consists as lists of engine ids, head first.
    pub consists: Vec<Vec<u16>>,
    pub industry_types: Vec<IndustryTypeDef>,
    pub industry_tile_types: Vec<IndustryTileTypeDef>,
    pub industries: Vec<IndustryDef>,
    pub grf: GrfDef,
    pub graphs: Vec<GraphDef>,
    pub water_features: Vec<WaterFeatureDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterDef {
    pub x: u32,
    pub y: u32,
    pub class: WaterClass,
    #[serde(default)]
    pub height: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineDef {
    pub id: u16,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cargo: u8,
    #[serde(default)]
    pub callback_mask: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndustryTypeDef {
    pub name: String,
    #[serde(default)]
    pub callback_mask: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndustryTileTypeDef {
    pub name: String,
    #[serde(default)]
    pub callback_mask: u8,
    #[serde(default)]
    pub animation_frames: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndustryDef {
    pub industry_type: u8,
    pub x: u32,
    pub y: u32,
    pub width: u8,
    pub height: u8,
    pub gfx: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrfDef {
    pub grfid: u32,
    pub filename: String,
    pub params: Vec<u32>,
}

impl Default for GrfDef {
    fn default() -> Self {
        Self {
            grfid: 0,
            filename: "scenario.grf".into(),
            params: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDef {
    pub feature: FeatureKind,
    #[serde(default)]
    pub slot: u8,
    pub root: NodeDef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterFeatureDef {
    pub feature: CanalFeature,
    #[serde(default)]
    pub callback_mask: u8,
    #[serde(default)]
    pub flags: u8,
}

/// One decision graph node.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum NodeDef {
    Sprite {
        sprite: u32,
        #[serde(default = "one")]
        count: u8,
    },
    Callback {
        result: u16,
    },
    Real {
        #[serde(default)]
        loaded: Vec<NodeDef>,
        #[serde(default)]
        loading: Vec<NodeDef>,
    },
    Switch {
        variable: u8,
        #[serde(default)]
        parameter: u8,
        #[serde(default)]
        shift: u8,
        #[serde(default = "full_mask")]
        mask: u32,
        #[serde(default)]
        ranges: Vec<RangeDef>,
        #[serde(default)]
        default: Option<Box<NodeDef>>,
    },
    Random {
        #[serde(default)]
        triggers: u8,
        #[serde(default)]
        all: bool,
        #[serde(default)]
        lowest_bit: u8,
        groups: Vec<NodeDef>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeDef {
    pub low: u32,
    pub high: u32,
    pub node: NodeDef,
}

const fn one() -> u8 {
    1
}

const fn full_mask() -> u32 {
    u32::MAX
}

// =============================================================================
// Building
// =============================================================================

impl NodeDef {
    /// Builds the graph rooted at this node.
    pub fn build(&self) -> Result<GroupRef> {
        Ok(match self {
            Self::Sprite { sprite, count } => SpriteGroup::sprite(*sprite, *count),
            Self::Callback { result } => SpriteGroup::callback(*result),
            Self::Real { loaded, loading } => {
                let mut real = RealGroup::new();
                for node in loaded {
                    real = real.loaded(node.build()?);
                }
                for node in loading {
                    real = real.loading(node.build()?);
                }
                SpriteGroup::real(real)
            }
            Self::Switch {
                variable,
                parameter,
                shift,
                mask,
                ranges,
                default,
            } => {
                let mut group = DeterministicGroup::on(*variable)
                    .with_parameter(*parameter)
                    .with_adjust(*shift, *mask);
                for range in ranges {
                    if range.low > range.high {
                        bail!("switch on 0x{variable:02x}: empty range {}..={}", range.low, range.high);
                    }
                    group = group.range(range.low, range.high, range.node.build()?);
                }
                if let Some(node) = default {
                    group = group.otherwise(node.build()?);
                }
                SpriteGroup::deterministic(group)
            }
            Self::Random {
                triggers,
                all,
                lowest_bit,
                groups,
            } => {
                if !groups.len().is_power_of_two() {
                    bail!("random node needs a power of two children, got {}", groups.len());
                }
                SpriteGroup::randomized(RandomizedGroup {
                    triggers: *triggers,
                    mode: if *all { TriggerMode::All } else { TriggerMode::Any },
                    lowest_bit: *lowest_bit,
                    groups: groups.iter().map(Self::build).collect::<Result<_>>()?,
                })
            }
        })
    }
}

impl Scenario {
    /// Parses a scenario document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(GrfError::from)?)
    }

    /// Builds the world and content the scenario describes.
    pub fn build(&self) -> Result<(World, ContentSet)> {
        self.world.validate().context("world settings")?;
        let mut world = World::new(self.world.clone());
        self.build_water(&mut world)?;
        self.build_vehicles(&mut world)?;
        self.build_industries(&mut world)?;
        Ok((world, self.build_content()?))
    }

    fn build_water(&self, world: &mut World) -> Result<()> {
        for water in &self.water {
            let tile = world
                .tile_index(water.x, water.y)
                .with_context(|| format!("water tile ({}, {}) is off the map", water.x, water.y))?;
            world.make_water(tile, water.class);
            world.set_height(tile, water.height);
        }
        Ok(())
    }

    fn build_vehicles(&self, world: &mut World) -> Result<()> {
        for engine in &self.engines {
            world.register_engine(
                EngineId(engine.id),
                EngineInfo {
                    vehicle_type: engine.vehicle_type,
                    name: engine.name.clone(),
                    callback_mask: VehicleCallbacks::from_bits_truncate(engine.callback_mask),
                    cargo_type: CargoId(engine.cargo),
                    ..EngineInfo::default()
                },
            );
        }
        for consist in &self.consists {
            let mut head = None;
            for &engine in consist {
                let id = world
                    .spawn_vehicle(EngineId(engine), head)
                    .with_context(|| format!("unknown engine {engine}"))?;
                if head.is_none() {
                    head = Some(id);
                }
            }
        }
        Ok(())
    }

    fn build_industries(&self, world: &mut World) -> Result<()> {
        for spec in &self.industry_types {
            world
                .add_industry_spec(IndustrySpec {
                    name: spec.name.clone(),
                    callback_mask: IndustryCallbacks::from_bits_truncate(spec.callback_mask),
                })
                .context("too many industry types")?;
        }
        for spec in &self.industry_tile_types {
            world
                .add_industry_tile_spec(IndustryTileSpec {
                    name: spec.name.clone(),
                    callback_mask: IndustryTileCallbacks::from_bits_truncate(spec.callback_mask),
                    animation_frames: spec.animation_frames,
                })
                .context("too many industry tile types")?;
        }
        for industry in &self.industries {
            let location = world
                .tile_index(industry.x, industry.y)
                .with_context(|| format!("industry at ({}, {}) is off the map", industry.x, industry.y))?;
            world
                .build_industry(
                    industry.industry_type,
                    location,
                    industry.width,
                    industry.height,
                    IndustryGfx(industry.gfx),
                )
                .with_context(|| {
                    format!(
                        "cannot build industry type {} at ({}, {})",
                        industry.industry_type, industry.x, industry.y
                    )
                })?;
        }
        Ok(())
    }

    fn build_content(&self) -> Result<ContentSet> {
        let grf = Arc::new(GrfFile {
            grfid: self.grf.grfid,
            filename: self.grf.filename.clone(),
            params: self.grf.params.clone(),
        });
        let mut content = ContentSet::new();
        for graph in &self.graphs {
            let key = GraphKey {
                kind: graph.feature,
                slot: graph.slot,
            };
            let root = graph
                .root
                .build()
                .with_context(|| format!("graph for {} slot {}", graph.feature, graph.slot))?;
            if content.insert(key, grf.clone(), root).is_some() {
                tracing::warn!(feature = %graph.feature, slot = graph.slot, "graph defined twice, keeping the last");
            }
        }
        for water in &self.water_features {
            *content.water_feature_mut(water.feature) = WaterFeature {
                callback_mask: WaterCallbacks::from_bits_truncate(water.callback_mask),
                flags: water.flags,
            };
        }
        Ok(content)
    }
}
