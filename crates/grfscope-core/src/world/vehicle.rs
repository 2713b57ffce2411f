//! Vehicles and engine specifications.
//!
//! A vehicle is one unit of a consist. Every unit records the id of the
//! consist head in `first`; the head refers to itself. Engine records hold
//! the content-defined specification shared by all units built from them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::feature::FeatureKind;
use crate::world::cargo::CargoId;
use crate::world::tile::TileIndex;

/// Unique identifier of a vehicle unit.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(u32);

impl VehicleId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VehicleId({})", self.0)
    }
}

/// Identifier of an engine specification.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngineId(pub u16);

/// Vehicle class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Rail vehicle
    #[default]
    Train,
    /// Road vehicle
    Road,
    /// Ship
    Ship,
    /// Aircraft
    Aircraft,
}

impl VehicleType {
    /// Feature kind customising this vehicle class.
    #[must_use]
    pub const fn feature(self) -> FeatureKind {
        match self {
            Self::Train => FeatureKind::Trains,
            Self::Road => FeatureKind::RoadVehicles,
            Self::Ship => FeatureKind::Ships,
            Self::Aircraft => FeatureKind::Aircraft,
        }
    }
}

/// Feature kind for a vehicle class.
///
/// Every vehicle class is customisable, so unlike tiles this never fails.
#[must_use]
pub const fn feature_for_vehicle(vehicle_type: VehicleType) -> FeatureKind {
    vehicle_type.feature()
}

bitflags! {
    /// Callbacks a vehicle engine has enabled.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VehicleCallbacks: u8 {
        /// Visual effect and wagon power
        const VISUAL_EFFECT = 1 << 0;
        /// Vehicle length
        const LENGTH = 1 << 1;
        /// Load amount
        const LOAD_AMOUNT = 1 << 2;
        /// Refitted capacity
        const REFIT_CAPACITY = 1 << 3;
        /// Articulated parts
        const ARTIC_ENGINE = 1 << 4;
        /// Cargo suffix
        const CARGO_SUFFIX = 1 << 5;
        /// Colour remap
        const COLOUR_REMAP = 1 << 6;
        /// Sound effects
        const SOUND_EFFECT = 1 << 7;
    }
}

/// Content-defined specification of an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Vehicle class built from this engine.
    pub vehicle_type: VehicleType,
    /// Display name.
    pub name: String,
    /// Enabled callbacks.
    pub callback_mask: VehicleCallbacks,
    /// Miscellaneous content flags.
    pub misc_flags: u8,
    /// Default cargo.
    pub cargo_type: CargoId,
}

/// One vehicle unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle class.
    pub vehicle_type: VehicleType,
    /// Engine the unit was built from.
    pub engine: EngineId,
    /// Head of the consist this unit belongs to.
    pub first: VehicleId,
    /// Tile the unit is on.
    pub tile: TileIndex,
    /// Carried cargo.
    pub cargo_type: CargoId,
    /// Refit variant of the carried cargo.
    pub cargo_subtype: u8,
    /// Capacity.
    pub cargo_cap: u16,
    /// Amount loaded.
    pub cargo_count: u16,
    /// Counter advanced as the unit moves.
    pub motion_counter: u32,
    /// Persisted random bits.
    pub random_bits: u8,
    /// Random triggers waiting to be consumed.
    pub waiting_triggers: u8,
    /// Days since the last daily callback.
    pub day_counter: u8,
    /// Ticks since the last tick callback.
    pub tick_counter: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_types_map_to_features() {
        assert_eq!(feature_for_vehicle(VehicleType::Train), FeatureKind::Trains);
        assert_eq!(feature_for_vehicle(VehicleType::Road), FeatureKind::RoadVehicles);
        assert_eq!(feature_for_vehicle(VehicleType::Ship), FeatureKind::Ships);
        assert_eq!(feature_for_vehicle(VehicleType::Aircraft), FeatureKind::Aircraft);
    }

    #[test]
    fn callback_bits_match_mask_layout() {
        assert_eq!(VehicleCallbacks::LOAD_AMOUNT.bits(), 0b100);
        assert_eq!(VehicleCallbacks::SOUND_EFFECT.bits(), 0x80);
    }
}
