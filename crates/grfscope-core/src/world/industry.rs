//! Industries, industry tiles and their specifications.
//!
//! An [`Industry`] occupies a rectangle of tiles. Each of its tiles is a
//! [`Tile`](crate::world::tile::Tile) of type `Industry` pointing back at the
//! industry and carrying an [`IndustryGfx`] that selects its
//! [`IndustryTileSpec`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::world::cargo::CargoId;
use crate::world::tile::TileIndex;

/// Number of 32-bit persistent storage slots of an industry.
pub const INDUSTRY_STORAGE_SLOTS: usize = 16;

/// Unique identifier of an industry.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndustryId(u16);

impl IndustryId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for IndustryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndustryId({})", self.0)
    }
}

/// Graphics id of an industry tile; indexes the tile specifications.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndustryGfx(pub u16);

bitflags! {
    /// Callbacks an industry type has enabled.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IndustryCallbacks: u16 {
        /// Availability check
        const AVAILABLE = 1 << 0;
        /// Production on cargo arrival
        const PRODUCTION_CARGO_ARRIVAL = 1 << 1;
        /// Production every 256 ticks
        const PRODUCTION_256_TICKS = 1 << 2;
        /// Location check
        const LOCATION = 1 << 3;
        /// Random production change
        const PRODUCTION_CHANGE = 1 << 4;
        /// Monthly production change
        const MONTHLYPROD_CHANGE = 1 << 5;
        /// Cargo suffix
        const CARGO_SUFFIX = 1 << 6;
        /// Extra fund text
        const FUND_MORE_TEXT = 1 << 7;
        /// Cargo sub-type display
        const CARGO_SUBTYPE_DISPLAY = 1 << 8;
        /// Extra text in the industry window
        const WINDOW_MORE_TEXT = 1 << 9;
        /// Special effects
        const SPECIAL_EFFECT = 1 << 10;
        /// Refuse cargo
        const REFUSE_CARGO = 1 << 11;
        /// Decide colour
        const DECIDE_COLOUR = 1 << 12;
        /// Input cargo types
        const INPUT_CARGO_TYPES = 1 << 13;
        /// Output cargo types
        const OUTPUT_CARGO_TYPES = 1 << 14;
    }
}

bitflags! {
    /// Callbacks an industry tile type has enabled.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IndustryTileCallbacks: u8 {
        /// Next animation frame
        const ANIM_NEXT_FRAME = 1 << 0;
        /// Animation speed
        const ANIM_SPEED = 1 << 1;
        /// Foundation drawing
        const DRAW_FOUNDATIONS = 1 << 2;
        /// Cargo acceptance
        const ACCEPT_CARGO = 1 << 3;
        /// Shape check
        const SHAPE_CHECK = 1 << 4;
        /// Cargo acceptance amount
        const CARGO_ACCEPTANCE = 1 << 5;
        /// Autoslope
        const AUTOSLOPE = 1 << 6;
    }
}

/// Content-defined specification of an industry type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustrySpec {
    /// Display name.
    pub name: String,
    /// Enabled callbacks.
    pub callback_mask: IndustryCallbacks,
}

/// Content-defined specification of an industry tile type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryTileSpec {
    /// Display name.
    pub name: String,
    /// Enabled callbacks.
    pub callback_mask: IndustryTileCallbacks,
    /// Number of animation frames.
    pub animation_frames: u8,
}

/// One industry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    /// North tile of the industry area.
    pub location: TileIndex,
    /// Width of the area in tiles.
    pub width: u8,
    /// Height of the area in tiles.
    pub height: u8,
    /// Index into the industry specifications.
    pub industry_type: u8,
    /// Layout chosen at construction.
    pub selected_layout: u8,
    /// Produced cargos.
    pub produced_cargo: [CargoId; 2],
    /// Production rate per cargo.
    pub production_rate: [u8; 2],
    /// Accepted cargos.
    pub accepts_cargo: [CargoId; 3],
    /// Delivered cargo waiting to be processed.
    pub incoming_cargo_waiting: [u16; 3],
    /// Production counter.
    pub counter: u16,
    /// Random bits.
    pub random: u16,
    /// Whether cargo was delivered this month.
    pub was_cargo_delivered: u8,
    /// Company that funded the industry.
    pub founder: u8,
    /// Day the industry was built.
    pub construction_date: u32,
    /// How the industry came to be (generation, funding, prospecting).
    pub construction_type: u8,
    /// Random triggers waiting to be consumed.
    pub random_triggers: u8,
    /// Persistent storage read and written by content.
    pub psa: [i32; INDUSTRY_STORAGE_SLOTS],
}

impl Industry {
    /// Whether `tile` lies inside the industry area on a map `map_width` wide.
    #[must_use]
    pub fn covers(&self, tile: TileIndex, map_width: u32) -> bool {
        let origin = self.location.xy(map_width);
        let at = tile.xy(map_width);
        at.x >= origin.x
            && at.y >= origin.y
            && at.x < origin.x + u32::from(self.width)
            && at.y < origin.y + u32::from(self.height)
    }
}
