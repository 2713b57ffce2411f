//! World configuration.
//!
//! A [`WorldConfig`] fixes the map dimensions, climate and the seed that
//! drives every random value assigned while the world is built. It is usually
//! read from a JSON document:
//!
//! ```
//! use grfscope_core::config::{Climate, WorldConfig};
//!
//! let config = WorldConfig::from_json(r#"{ "climate": "arctic", "snow_line_height": 4 }"#)?;
//! assert_eq!(config.climate, Climate::Arctic);
//! assert_eq!(config.map_width, WorldConfig::default().map_width);
//! # Ok::<(), grfscope_core::error::GrfError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GrfError, Result};

/// Height of one height level in world units.
pub const TILE_HEIGHT: u32 = 8;

/// Longest map edge in tiles. A full map of 4096x4096 tiles numbers its
/// tiles within 24 bits, the range of an inspector index.
pub const MAX_MAP_EDGE: u32 = 4096;

/// Landscape climate; decides how terrain is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    /// Temperate: all terrain is normal.
    #[default]
    Temperate,
    /// Sub-arctic: terrain above the snow line is snowy.
    Arctic,
    /// Sub-tropical: terrain is desert, rainforest or normal by zone.
    Tropic,
    /// Toyland: all terrain is normal.
    Toyland,
}

/// Settings used to build a [`World`](crate::world::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Map width in tiles.
    pub map_width: u32,
    /// Map height in tiles.
    pub map_height: u32,
    /// Landscape climate.
    pub climate: Climate,
    /// Height level from which arctic terrain counts as snow.
    pub snow_line_height: u8,
    /// Seed for random bits assigned to new tiles and entities.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_width: 64,
            map_height: 64,
            climate: Climate::Temperate,
            snow_line_height: 7,
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GrfError::Config`] if the document is not valid JSON for
    /// this type, or [`GrfError::MapSize`] if the map dimensions are out of
    /// bounds.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the map has between 1 and [`MAX_MAP_EDGE`] tiles per edge.
    ///
    /// # Errors
    ///
    /// Returns [`GrfError::MapSize`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let edges = 1..=MAX_MAP_EDGE;
        if edges.contains(&self.map_width) && edges.contains(&self.map_height) {
            Ok(())
        } else {
            Err(GrfError::MapSize {
                width: self.map_width,
                height: self.map_height,
            })
        }
    }

    /// Number of tiles on the map.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        (self.map_width as usize) * (self.map_height as usize)
    }
}
