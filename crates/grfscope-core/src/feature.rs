//! Feature kinds and inspection targets.
//!
//! A *feature* is a category of simulated object whose appearance or behavior
//! content packs can customise (trains, canals, industries, ...). Features are
//! identified by a dense numeric tag that matches the numbering used inside
//! content packs, so the tag doubles as an index into per-feature tables.
//!
//! # Example
//!
//! ```
//! use grfscope_core::feature::{FeatureKind, InspectTarget};
//!
//! let kind = FeatureKind::try_from(0x05).unwrap();
//! assert_eq!(kind, FeatureKind::Canals);
//!
//! let target = InspectTarget::new(kind, 1234).unwrap();
//! assert_eq!(target.window_number(), 0x0500_04D2);
//! assert_eq!(InspectTarget::from_window_number(0x0500_04D2), Some(target));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GrfError;

/// Dense kind tag of a customisable feature.
///
/// The discriminants are the feature numbers used by content packs. Lookups
/// keyed by `FeatureKind` index a fixed-size array with [`FeatureKind::index`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeatureKind {
    /// Rail vehicles
    Trains = 0x00,
    /// Road vehicles
    RoadVehicles = 0x01,
    /// Ships
    Ships = 0x02,
    /// Aircraft
    Aircraft = 0x03,
    /// Rail stations
    Stations = 0x04,
    /// Canals, rivers and other water graphics
    Canals = 0x05,
    /// Bridges
    Bridges = 0x06,
    /// Town houses
    Houses = 0x07,
    /// Global settings
    GlobalVar = 0x08,
    /// Industry tiles
    IndustryTiles = 0x09,
    /// Industries
    Industries = 0x0A,
    /// Cargo types
    Cargoes = 0x0B,
    /// Sound effects
    SoundEffects = 0x0C,
    /// Airports
    Airports = 0x0D,
    /// Signals
    Signals = 0x0E,
    /// Objects
    Objects = 0x0F,
    /// Rail types
    RailTypes = 0x10,
    /// Airport tiles
    AirportTiles = 0x11,
}

impl FeatureKind {
    /// Number of feature kinds; one past the highest tag.
    pub const COUNT: usize = 0x12;

    /// All kinds in tag order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Trains,
        Self::RoadVehicles,
        Self::Ships,
        Self::Aircraft,
        Self::Stations,
        Self::Canals,
        Self::Bridges,
        Self::Houses,
        Self::GlobalVar,
        Self::IndustryTiles,
        Self::Industries,
        Self::Cargoes,
        Self::SoundEffects,
        Self::Airports,
        Self::Signals,
        Self::Objects,
        Self::RailTypes,
        Self::AirportTiles,
    ];

    /// Returns the raw tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns the tag as an array index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this kind is one of the four vehicle kinds.
    #[must_use]
    pub const fn is_vehicle(self) -> bool {
        matches!(
            self,
            Self::Trains | Self::RoadVehicles | Self::Ships | Self::Aircraft
        )
    }
}

impl TryFrom<u8> for FeatureKind {
    type Error = GrfError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(GrfError::UnknownFeature(tag))
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Sub-feature slots of [`FeatureKind::Canals`].
///
/// Each water graphic family has its own root graph in the content set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CanalFeature {
    /// Slopes of canals and locks
    WaterSlope = 0,
    /// Lock parts
    Locks = 1,
    /// Canal edges
    Dikes = 2,
    /// Build menu icon
    Icon = 3,
    /// Flat docks
    Docks = 4,
    /// River slopes
    RiverSlope = 5,
    /// River edges
    RiverEdge = 6,
    /// River build menu icon
    RiverGui = 7,
    /// Buoys
    Buoy = 8,
}

impl CanalFeature {
    /// Number of canal sub-features.
    pub const COUNT: usize = 9;

    /// Returns the slot as an array index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Key of a content-supplied root graph.
///
/// Most features have one root graph; canals have one per [`CanalFeature`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphKey {
    /// Feature the graph customises.
    pub kind: FeatureKind,
    /// Sub-feature slot, zero for features without sub-features.
    pub slot: u8,
}

impl GraphKey {
    /// Key of the canal graph for a water sub-feature.
    #[must_use]
    pub const fn canal(feature: CanalFeature) -> Self {
        Self {
            kind: FeatureKind::Canals,
            slot: feature as u8,
        }
    }
}

impl From<FeatureKind> for GraphKey {
    fn from(kind: FeatureKind) -> Self {
        Self { kind, slot: 0 }
    }
}

/// A (kind, index) pair naming one inspectable entity.
///
/// Inspector surfaces are keyed by target. The index must fit in 24 bits so
/// that the pair packs into a single window number.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InspectTarget {
    kind: FeatureKind,
    index: u32,
}

impl InspectTarget {
    /// Largest index representable in a window number.
    pub const MAX_INDEX: u32 = (1 << 24) - 1;

    /// Creates a target, rejecting indices wider than 24 bits.
    ///
    /// # Errors
    ///
    /// Returns [`GrfError::IndexOutOfRange`] if `index` exceeds [`Self::MAX_INDEX`].
    pub fn new(kind: FeatureKind, index: u32) -> Result<Self, GrfError> {
        if index > Self::MAX_INDEX {
            return Err(GrfError::IndexOutOfRange(index));
        }
        Ok(Self { kind, index })
    }

    /// The feature kind.
    #[must_use]
    pub const fn kind(self) -> FeatureKind {
        self.kind
    }

    /// The entity index within the kind.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Packs the target as `kind << 24 | index`.
    #[must_use]
    pub const fn window_number(self) -> u32 {
        ((self.kind as u32) << 24) | self.index
    }

    /// Unpacks a window number; `None` if the kind byte is out of range.
    #[must_use]
    pub fn from_window_number(number: u32) -> Option<Self> {
        let kind = FeatureKind::try_from((number >> 24) as u8).ok()?;
        Some(Self {
            kind,
            index: number & Self::MAX_INDEX,
        })
    }
}

impl fmt::Debug for InspectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InspectTarget({:?}, {})", self.kind, self.index)
    }
}

impl fmt::Display for InspectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod feature_kind_tests {
        use super::*;

        #[test]
        fn tags_are_dense() {
            for (i, kind) in FeatureKind::ALL.iter().enumerate() {
                assert_eq!(kind.index(), i);
                assert_eq!(FeatureKind::try_from(kind.tag()).unwrap(), *kind);
            }
        }

        #[test]
        fn out_of_range_tag_is_rejected() {
            let err = FeatureKind::try_from(0x12).unwrap_err();
            assert!(matches!(err, GrfError::UnknownFeature(0x12)));
            assert!(FeatureKind::try_from(0xFF).is_err());
        }

        #[test]
        fn vehicle_kinds() {
            assert!(FeatureKind::Trains.is_vehicle());
            assert!(FeatureKind::Aircraft.is_vehicle());
            assert!(!FeatureKind::Canals.is_vehicle());
            assert!(!FeatureKind::Industries.is_vehicle());
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn window_number_packs_kind_and_index() {
            let target = InspectTarget::new(FeatureKind::Industries, 7).unwrap();
            assert_eq!(target.window_number(), 0x0A00_0007);
        }

        #[test]
        fn index_wider_than_24_bits_is_rejected() {
            assert!(InspectTarget::new(FeatureKind::Trains, 1 << 24).is_err());
            assert!(InspectTarget::new(FeatureKind::Trains, InspectTarget::MAX_INDEX).is_ok());
        }

        #[test]
        fn unknown_kind_byte_does_not_unpack() {
            assert_eq!(InspectTarget::from_window_number(0xFF00_0001), None);
        }
    }

    #[test]
    fn canal_graph_key_uses_slot() {
        let key = GraphKey::canal(CanalFeature::RiverEdge);
        assert_eq!(key.kind, FeatureKind::Canals);
        assert_eq!(key.slot, 6);
        assert_eq!(GraphKey::from(FeatureKind::Trains).slot, 0);
    }
}
