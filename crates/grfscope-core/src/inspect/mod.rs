//! Introspection registry: declarative descriptions of inspectable features.
//!
//! Every inspectable [`FeatureKind`] registers a [`FeatureTable`] listing the
//! raw fields, callbacks and variables the debug surface shows for it, plus
//! the [`InspectHelper`] that knows how to find its records.
//!
//! # Architecture
//!
//! - [`Record`]: borrowed view of one entity or specification record
//! - [`PropertyDescriptor`] / [`CallbackDescriptor`]: typed field accessors
//!   declared with their width; a read is checked against the declaration
//! - [`VariableDescriptor`]: computed values, always obtained through the
//!   feature's resolver, never read from a record
//! - [`StorageLayout`]: the persistent storage slots of a record
//! - [`FeatureRegistry`]: dense per-kind lookup of tables
//! - [`VariableParams`]: user-set parameters of variables `0x60..0x80`
//!
//! # Invariants
//!
//! - Descriptor lists are plain sized sequences; names are non-empty
//! - A field read either yields a value of exactly the declared width or a
//!   [`GrfError::MalformedDescriptor`]
//! - Storage slot counts are multiples of four
//!
//! # Example
//!
//! ```
//! use grfscope_core::feature::FeatureKind;
//! use grfscope_core::inspect::{FeatureRegistry, Record};
//! use grfscope_core::world::industry::Industry;
//!
//! let registry = FeatureRegistry::standard();
//! let table = registry.table(FeatureKind::Industries).unwrap();
//!
//! let industry = Industry::default();
//! for property in &table.properties {
//!     let value = property.read(FeatureKind::Industries, &Record::Industry(&industry))?;
//!     assert_eq!(value, 0);
//! }
//! # Ok::<(), grfscope_core::error::GrfError>(())
//! ```

pub mod helper;
pub mod surface;
mod tables;

pub use helper::{Caption, InspectHelper, InspectView};

use std::fmt;

use crate::content::WaterFeature;
use crate::error::{DescriptorFault, GrfError, Result};
use crate::feature::FeatureKind;
use crate::world::industry::{Industry, IndustrySpec, IndustryTileSpec};
use crate::world::tile::Tile;
use crate::world::vehicle::{EngineInfo, Vehicle};

/// First variable id taking a parameter.
pub const PARAM_VARIABLE_FIRST: u8 = 0x60;

/// Number of parameterised variable ids.
pub const PARAM_VARIABLE_COUNT: usize = 0x20;

// =============================================================================
// Records and raw fields
// =============================================================================

/// Borrowed view of one record that descriptors read from.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    /// Vehicle unit.
    Vehicle(&'a Vehicle),
    /// Engine specification.
    Engine(&'a EngineInfo),
    /// Industry.
    Industry(&'a Industry),
    /// Industry type specification.
    IndustrySpec(&'a IndustrySpec),
    /// Map tile (water and industry tiles).
    Tile(&'a Tile),
    /// Industry tile type specification.
    IndustryTileSpec(&'a IndustryTileSpec),
    /// Canal sub-feature record.
    WaterFeature(&'a WaterFeature),
}

/// A field value as stored, with its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawField {
    /// One byte.
    U8(u8),
    /// Two bytes.
    U16(u16),
    /// Four bytes.
    U32(u32),
}

impl RawField {
    /// Width of the stored field.
    #[must_use]
    pub const fn width(self) -> FieldWidth {
        match self {
            Self::U8(_) => FieldWidth::One,
            Self::U16(_) => FieldWidth::Two,
            Self::U32(_) => FieldWidth::Four,
        }
    }

    /// The value zero-extended to 32 bits.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::U8(v) => v as u32,
            Self::U16(v) => v as u32,
            Self::U32(v) => v,
        }
    }
}

/// Declared width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldWidth {
    /// One byte.
    One = 1,
    /// Two bytes.
    Two = 2,
    /// Four bytes.
    Four = 4,
}

impl FieldWidth {
    /// Width from a byte count.
    ///
    /// # Errors
    ///
    /// [`DescriptorFault::UnsupportedWidth`] for anything but 1, 2 or 4.
    pub const fn from_bytes(bytes: u8) -> std::result::Result<Self, DescriptorFault> {
        match bytes {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            other => Err(DescriptorFault::UnsupportedWidth(other)),
        }
    }

    /// Byte count.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        self as u8
    }
}

/// Accessor of a raw field; `None` when applied to a foreign record.
pub type FieldReader = fn(&Record<'_>) -> Option<RawField>;

/// Accessor of a persistent storage array.
pub type StorageReader = for<'r> fn(&Record<'r>) -> Option<&'r [i32]>;

fn width_of(kind: FeatureKind, name: &'static str, bytes: u8) -> Result<FieldWidth> {
    FieldWidth::from_bytes(bytes).map_err(|reason| GrfError::MalformedDescriptor { kind, name, reason })
}

fn read_field(
    kind: FeatureKind,
    name: &'static str,
    width: FieldWidth,
    reader: FieldReader,
    record: &Record<'_>,
) -> Result<u32> {
    let malformed = |reason| GrfError::MalformedDescriptor { kind, name, reason };
    let raw = reader(record).ok_or_else(|| malformed(DescriptorFault::ForeignRecord))?;
    if raw.width() != width {
        return Err(malformed(DescriptorFault::WidthMismatch {
            declared: width.bytes(),
            actual: raw.width().bytes(),
        }));
    }
    Ok(raw.value())
}

// =============================================================================
// Descriptors
// =============================================================================

/// How a property value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Plain decimal integer.
    Int,
    /// Cargo id, shown as the cargo's name.
    Cargo,
}

/// A raw field of the instance record.
#[derive(Clone, Copy)]
pub struct PropertyDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Property number in content terms.
    pub prop: u8,
    /// Declared width.
    pub width: FieldWidth,
    /// Presentation.
    pub ty: PropertyType,
    /// Accessor.
    pub reader: FieldReader,
}

impl PropertyDescriptor {
    /// Builds a descriptor whose width is given as a byte count.
    ///
    /// # Errors
    ///
    /// [`GrfError::MalformedDescriptor`] if `bytes` is not 1, 2 or 4.
    pub fn with_byte_width(
        kind: FeatureKind,
        name: &'static str,
        prop: u8,
        bytes: u8,
        ty: PropertyType,
        reader: FieldReader,
    ) -> Result<Self> {
        Ok(Self {
            name,
            prop,
            width: width_of(kind, name, bytes)?,
            ty,
            reader,
        })
    }

    /// Reads the property from `record`.
    ///
    /// # Errors
    ///
    /// [`GrfError::MalformedDescriptor`] if the accessor does not apply to
    /// the record or yields a field of another width.
    pub fn read(&self, kind: FeatureKind, record: &Record<'_>) -> Result<u32> {
        read_field(kind, self.name, self.width, self.reader, record)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("prop", &self.prop)
            .field("width", &self.width)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A callback and the spec field holding its enabling mask.
#[derive(Clone, Copy)]
pub struct CallbackDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Callback number.
    pub id: u16,
    /// Declared width of the mask field.
    pub width: FieldWidth,
    /// Bit of the mask enabling the callback; `None` if always enabled.
    pub bit: Option<u8>,
    /// Accessor of the mask field on the spec record.
    pub reader: FieldReader,
}

impl CallbackDescriptor {
    /// Builds a descriptor whose mask width is given as a byte count.
    ///
    /// # Errors
    ///
    /// [`GrfError::MalformedDescriptor`] if `bytes` is not 1, 2 or 4.
    pub fn with_byte_width(
        kind: FeatureKind,
        name: &'static str,
        id: u16,
        bit: Option<u8>,
        bytes: u8,
        reader: FieldReader,
    ) -> Result<Self> {
        Ok(Self {
            name,
            id,
            width: width_of(kind, name, bytes)?,
            bit,
            reader,
        })
    }

    /// Whether the callback is enabled on `spec`.
    ///
    /// Always-enabled callbacks do not read the record at all.
    ///
    /// # Errors
    ///
    /// [`GrfError::MalformedDescriptor`] if the mask read fails.
    pub fn enabled(&self, kind: FeatureKind, spec: &Record<'_>) -> Result<bool> {
        let Some(bit) = self.bit else {
            return Ok(true);
        };
        let mask = read_field(kind, self.name, self.width, self.reader, spec)?;
        Ok(mask.checked_shr(u32::from(bit)).unwrap_or(0) & 1 != 0)
    }
}

impl fmt::Debug for CallbackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("width", &self.width)
            .field("bit", &self.bit)
            .finish_non_exhaustive()
    }
}

/// A computed variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Variable id.
    pub id: u8,
}

impl VariableDescriptor {
    /// Whether the variable takes a parameter.
    #[must_use]
    pub const fn has_parameter(&self) -> bool {
        has_parameter(self.id)
    }
}

/// Whether variable `id` takes a parameter.
#[must_use]
pub const fn has_parameter(id: u8) -> bool {
    id >= PARAM_VARIABLE_FIRST && id < PARAM_VARIABLE_FIRST + PARAM_VARIABLE_COUNT as u8
}

/// Persistent storage of a record, in 32-bit slots.
#[derive(Clone, Copy)]
pub struct StorageLayout {
    /// Number of slots shown.
    pub slots: usize,
    /// Accessor of the storage array.
    pub reader: StorageReader,
}

impl StorageLayout {
    /// Reads the first `slots` storage slots of `record`.
    ///
    /// # Errors
    ///
    /// [`GrfError::MalformedDescriptor`] if the slot count is not a multiple
    /// of four, the accessor does not apply, or the storage is too short.
    pub fn read<'r>(&self, kind: FeatureKind, record: &Record<'r>) -> Result<&'r [i32]> {
        let malformed = |reason| GrfError::MalformedDescriptor {
            kind,
            name: "persistent storage",
            reason,
        };
        if self.slots % 4 != 0 {
            return Err(malformed(DescriptorFault::StorageNotAligned(self.slots)));
        }
        let storage = (self.reader)(record).ok_or_else(|| malformed(DescriptorFault::ForeignRecord))?;
        storage.get(..self.slots).ok_or_else(|| {
            malformed(DescriptorFault::StorageTooShort {
                declared: self.slots,
                actual: storage.len(),
            })
        })
    }
}

impl fmt::Debug for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLayout")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Everything the debug surface knows about one feature.
pub struct FeatureTable {
    /// Raw fields of the instance record.
    pub properties: Vec<PropertyDescriptor>,
    /// Callbacks with their enabling bits on the spec record.
    pub callbacks: Vec<CallbackDescriptor>,
    /// Computed variables.
    pub variables: Vec<VariableDescriptor>,
    /// Record lookup and variable resolution.
    pub helper: Box<dyn InspectHelper>,
    /// Persistent storage, if the feature has any.
    pub storage: Option<StorageLayout>,
}

impl fmt::Debug for FeatureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureTable")
            .field("properties", &self.properties)
            .field("callbacks", &self.callbacks)
            .field("variables", &self.variables)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

/// Dense lookup of feature tables by kind.
#[derive(Debug)]
pub struct FeatureRegistry {
    tables: [Option<FeatureTable>; FeatureKind::COUNT],
}

impl FeatureRegistry {
    /// Creates a registry with no inspectable features.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: std::array::from_fn(|_| None),
        }
    }

    /// Registry with the built-in tables (vehicles, canals, industries,
    /// industry tiles).
    #[must_use]
    pub fn standard() -> Self {
        tables::standard()
    }

    /// Installs the table of `kind`, returning the one it replaces.
    pub fn register(&mut self, kind: FeatureKind, table: FeatureTable) -> Option<FeatureTable> {
        self.tables[kind.index()].replace(table)
    }

    /// Table of `kind`, `None` if the kind is not inspectable.
    #[must_use]
    pub fn table(&self, kind: FeatureKind) -> Option<&FeatureTable> {
        self.tables[kind.index()].as_ref()
    }

    /// Table for a raw feature tag; `None` for unknown or unregistered tags.
    #[must_use]
    pub fn table_for_tag(&self, tag: u8) -> Option<&FeatureTable> {
        self.tables.get(usize::from(tag))?.as_ref()
    }

    /// Kinds with a table, in tag order.
    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        FeatureKind::ALL
            .into_iter()
            .filter(|kind| self.tables[kind.index()].is_some())
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Variable parameters
// =============================================================================

/// User-set parameters of variables `0x60..0x80`, default zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VariableParams([u8; PARAM_VARIABLE_COUNT]);

impl VariableParams {
    /// All parameters zero.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; PARAM_VARIABLE_COUNT])
    }

    /// Parameter for variable `id`; zero for variables without one.
    #[must_use]
    pub fn get(&self, id: u8) -> u8 {
        if has_parameter(id) {
            self.0[usize::from(id - PARAM_VARIABLE_FIRST)]
        } else {
            0
        }
    }

    /// Sets the parameter for `id`. Returns false if `id` takes none.
    pub fn set(&mut self, id: u8, value: u8) -> bool {
        if !has_parameter(id) {
            return false;
        }
        self.0[usize::from(id - PARAM_VARIABLE_FIRST)] = value;
        true
    }

    /// Resets every parameter to zero.
    pub fn reset(&mut self) {
        self.0 = [0; PARAM_VARIABLE_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::vehicle::VehicleCallbacks;

    fn vehicle_cap(record: &Record<'_>) -> Option<RawField> {
        match *record {
            Record::Vehicle(v) => Some(RawField::U16(v.cargo_cap)),
            _ => None,
        }
    }

    fn cap_descriptor(width: FieldWidth) -> PropertyDescriptor {
        PropertyDescriptor {
            name: "cargo capacity",
            prop: 0x14,
            width,
            ty: PropertyType::Int,
            reader: vehicle_cap,
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn widths_from_bytes() {
            assert_eq!(FieldWidth::from_bytes(1), Ok(FieldWidth::One));
            assert_eq!(FieldWidth::from_bytes(4).map(FieldWidth::bytes), Ok(4));
            assert_eq!(
                FieldWidth::from_bytes(3),
                Err(DescriptorFault::UnsupportedWidth(3))
            );
            assert!(FieldWidth::from_bytes(8).is_err());
        }

        #[test]
        fn byte_width_outside_one_two_four_is_malformed() {
            let err = PropertyDescriptor::with_byte_width(
                FeatureKind::Trains,
                "cargo capacity",
                0x14,
                3,
                PropertyType::Int,
                vehicle_cap,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                GrfError::MalformedDescriptor {
                    kind: FeatureKind::Trains,
                    name: "cargo capacity",
                    reason: DescriptorFault::UnsupportedWidth(3),
                }
            ));
            let descriptor = PropertyDescriptor::with_byte_width(
                FeatureKind::Trains,
                "cargo capacity",
                0x14,
                2,
                PropertyType::Int,
                vehicle_cap,
            )
            .unwrap();
            assert_eq!(descriptor.width, FieldWidth::Two);
        }

        #[test]
        fn raw_values_zero_extend() {
            assert_eq!(RawField::U8(0xFF).value(), 0xFF);
            assert_eq!(RawField::U16(0xBEEF).value(), 0xBEEF);
            assert_eq!(RawField::U32(u32::MAX).value(), u32::MAX);
        }

        #[test]
        fn matching_read() {
            let vehicle = Vehicle {
                cargo_cap: 45,
                ..Vehicle::default()
            };
            let value = cap_descriptor(FieldWidth::Two)
                .read(FeatureKind::Trains, &Record::Vehicle(&vehicle))
                .unwrap();
            assert_eq!(value, 45);
        }

        #[test]
        fn width_mismatch_is_malformed() {
            let vehicle = Vehicle::default();
            let err = cap_descriptor(FieldWidth::Four)
                .read(FeatureKind::Trains, &Record::Vehicle(&vehicle))
                .unwrap_err();
            assert!(matches!(
                err,
                GrfError::MalformedDescriptor {
                    reason: DescriptorFault::WidthMismatch { declared: 4, actual: 2 },
                    ..
                }
            ));
        }

        #[test]
        fn foreign_record_is_malformed() {
            let tile = Tile::default();
            let err = cap_descriptor(FieldWidth::Two)
                .read(FeatureKind::Trains, &Record::Tile(&tile))
                .unwrap_err();
            assert!(matches!(
                err,
                GrfError::MalformedDescriptor {
                    reason: DescriptorFault::ForeignRecord,
                    ..
                }
            ));
        }
    }

    mod callback_tests {
        use super::*;

        fn engine_mask(record: &Record<'_>) -> Option<RawField> {
            match *record {
                Record::Engine(e) => Some(RawField::U8(e.callback_mask.bits())),
                _ => None,
            }
        }

        #[test]
        fn enabled_follows_mask_bit() {
            let descriptor =
                CallbackDescriptor::with_byte_width(FeatureKind::Trains, "load amount", 0x12, Some(2), 1, engine_mask)
                    .unwrap();
            let mut engine = EngineInfo::default();
            assert!(!descriptor.enabled(FeatureKind::Trains, &Record::Engine(&engine)).unwrap());
            engine.callback_mask = VehicleCallbacks::LOAD_AMOUNT;
            assert!(descriptor.enabled(FeatureKind::Trains, &Record::Engine(&engine)).unwrap());
        }

        #[test]
        fn eight_byte_mask_is_malformed() {
            let err = CallbackDescriptor::with_byte_width(FeatureKind::Ships, "load amount", 0x12, Some(2), 8, engine_mask)
                .unwrap_err();
            assert!(matches!(
                err,
                GrfError::MalformedDescriptor {
                    reason: DescriptorFault::UnsupportedWidth(8),
                    ..
                }
            ));
        }

        #[test]
        fn unmasked_callback_never_reads() {
            let descriptor = CallbackDescriptor {
                name: "refit",
                id: 0x1D,
                width: FieldWidth::One,
                bit: None,
                reader: engine_mask,
            };
            let tile = Tile::default();
            assert!(descriptor.enabled(FeatureKind::Trains, &Record::Tile(&tile)).unwrap());
        }
    }

    mod storage_tests {
        use super::*;

        fn psa<'r>(record: &Record<'r>) -> Option<&'r [i32]> {
            match *record {
                Record::Industry(i) => Some(&i.psa[..]),
                _ => None,
            }
        }

        #[test]
        fn reads_declared_slots() {
            let mut industry = Industry::default();
            industry.psa[5] = -3;
            let layout = StorageLayout { slots: 8, reader: psa };
            let slots = layout.read(FeatureKind::Industries, &Record::Industry(&industry)).unwrap();
            assert_eq!(slots.len(), 8);
            assert_eq!(slots[5], -3);
        }

        #[test]
        fn unaligned_count_is_malformed() {
            let industry = Industry::default();
            let layout = StorageLayout { slots: 6, reader: psa };
            let err = layout
                .read(FeatureKind::Industries, &Record::Industry(&industry))
                .unwrap_err();
            assert!(matches!(
                err,
                GrfError::MalformedDescriptor {
                    reason: DescriptorFault::StorageNotAligned(6),
                    ..
                }
            ));
        }

        #[test]
        fn oversized_count_is_malformed() {
            let industry = Industry::default();
            let layout = StorageLayout { slots: 20, reader: psa };
            assert!(layout
                .read(FeatureKind::Industries, &Record::Industry(&industry))
                .is_err());
        }
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn empty_registry_has_no_tables() {
            let registry = FeatureRegistry::new();
            assert!(registry.table(FeatureKind::Canals).is_none());
            assert_eq!(registry.kinds().count(), 0);
        }

        #[test]
        fn raw_tags_outside_range_are_absent() {
            let registry = FeatureRegistry::standard();
            assert!(registry.table_for_tag(0x05).is_some());
            assert!(registry.table_for_tag(0x12).is_none());
            assert!(registry.table_for_tag(0xFF).is_none());
        }

        #[test]
        fn standard_registry_covers_resolvable_kinds() {
            let registry = FeatureRegistry::standard();
            let kinds: Vec<_> = registry.kinds().collect();
            assert_eq!(
                kinds,
                vec![
                    FeatureKind::Trains,
                    FeatureKind::RoadVehicles,
                    FeatureKind::Ships,
                    FeatureKind::Aircraft,
                    FeatureKind::Canals,
                    FeatureKind::IndustryTiles,
                    FeatureKind::Industries,
                ]
            );
        }
    }

    mod params_tests {
        use super::*;

        #[test]
        fn untouched_slots_are_zero() {
            let params = VariableParams::new();
            assert_eq!(params.get(0x60), 0);
            assert_eq!(params.get(0x7F), 0);
        }

        #[test]
        fn only_parameterised_ids_are_settable() {
            let mut params = VariableParams::new();
            assert!(params.set(0x61, 0x21));
            assert_eq!(params.get(0x61), 0x21);
            assert!(!params.set(0x40, 1));
            assert!(!params.set(0x80, 1));
            assert_eq!(params.get(0x40), 0);
            params.reset();
            assert_eq!(params.get(0x61), 0);
        }
    }
}
