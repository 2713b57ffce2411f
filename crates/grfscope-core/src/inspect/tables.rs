//! Built-in descriptor tables.

use crate::content::CALLBACK_CANAL_SPRITE_OFFSET;
use crate::feature::FeatureKind;
use crate::inspect::helper::{CanalHelper, IndustryHelper, IndustryTileHelper, VehicleHelper};
use crate::inspect::{
    CallbackDescriptor, FeatureRegistry, FeatureTable, FieldReader, FieldWidth,
    PropertyDescriptor, PropertyType, RawField, Record, StorageLayout, VariableDescriptor,
};
use crate::world::industry::INDUSTRY_STORAGE_SLOTS;

/// Builds a [`FieldReader`] for one record variant.
macro_rules! field {
    ($variant:ident, |$r:ident| $value:expr) => {{
        fn reader(record: &Record<'_>) -> Option<RawField> {
            match *record {
                Record::$variant($r) => Some($value),
                _ => None,
            }
        }
        reader as FieldReader
    }};
}

fn prop(
    prop: u8,
    name: &'static str,
    width: FieldWidth,
    ty: PropertyType,
    reader: FieldReader,
) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        prop,
        width,
        ty,
        reader,
    }
}

fn cb(id: u16, name: &'static str, bit: Option<u8>, width: FieldWidth, reader: FieldReader) -> CallbackDescriptor {
    CallbackDescriptor {
        name,
        id,
        width,
        bit,
        reader,
    }
}

fn var(id: u8, name: &'static str) -> VariableDescriptor {
    VariableDescriptor { name, id }
}

pub(super) fn standard() -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    for kind in [
        FeatureKind::Trains,
        FeatureKind::RoadVehicles,
        FeatureKind::Ships,
        FeatureKind::Aircraft,
    ] {
        registry.register(kind, vehicles(kind));
    }
    registry.register(FeatureKind::Canals, canals());
    registry.register(FeatureKind::IndustryTiles, industry_tiles());
    registry.register(FeatureKind::Industries, industries());
    registry
}

// =============================================================================
// Vehicles
// =============================================================================

fn vehicles(kind: FeatureKind) -> FeatureTable {
    use FieldWidth::{Four, One, Two};
    use PropertyType::{Cargo, Int};

    let mask = field!(Engine, |e| RawField::U8(e.callback_mask.bits()));
    FeatureTable {
        properties: vec![
            prop(0x14, "cargo capacity", Two, Int, field!(Vehicle, |v| RawField::U16(v.cargo_cap))),
            prop(0x15, "cargo type", One, Cargo, field!(Vehicle, |v| RawField::U8(v.cargo_type.0))),
            prop(0x16, "cargo subtype", One, Int, field!(Vehicle, |v| RawField::U8(v.cargo_subtype))),
            prop(0x17, "cargo count", Two, Int, field!(Vehicle, |v| RawField::U16(v.cargo_count))),
            prop(0x18, "motion counter", Four, Int, field!(Vehicle, |v| RawField::U32(v.motion_counter))),
        ],
        callbacks: vec![
            cb(0x10, "CBID_VEHICLE_VISUAL_EFFECT", Some(0), One, mask),
            cb(0x11, "CBID_VEHICLE_LENGTH", Some(1), One, mask),
            cb(0x12, "CBID_VEHICLE_LOAD_AMOUNT", Some(2), One, mask),
            cb(0x15, "CBID_VEHICLE_REFIT_CAPACITY", Some(3), One, mask),
            cb(0x16, "CBID_VEHICLE_ARTIC_ENGINE", Some(4), One, mask),
            cb(0x19, "CBID_VEHICLE_CARGO_SUFFIX", Some(5), One, mask),
            cb(0x1D, "CBID_TRAIN_ALLOW_WAGON_ATTACH", None, One, mask),
            cb(0x23, "CBID_VEHICLE_ADDITIONAL_TEXT", None, One, mask),
            cb(0x2D, "CBID_VEHICLE_COLOUR_MAPPING", Some(6), One, mask),
            cb(0x31, "CBID_VEHICLE_START_STOP_CHECK", None, One, mask),
            cb(0x32, "CBID_VEHICLE_32DAY_CALLBACK", None, One, mask),
            cb(0x33, "CBID_VEHICLE_SOUND_EFFECT", Some(7), One, mask),
            cb(0x34, "CBID_VEHICLE_AUTOREPLACE_SELECTION", None, One, mask),
            cb(0x36, "CBID_VEHICLE_MODIFY_PROPERTY", None, One, mask),
        ],
        variables: vec![
            var(0x40, "position in consist and length"),
            var(0x41, "position and length of chain of same vehicles"),
            var(0x42, "transported cargo types"),
            var(0x46, "motion counter"),
            var(0x47, "vehicle cargo info"),
            var(0x60, "count vehicle id occurrences"),
        ],
        helper: Box::new(VehicleHelper::new(kind)),
        storage: None,
    }
}

// =============================================================================
// Canals
// =============================================================================

fn canals() -> FeatureTable {
    FeatureTable {
        properties: Vec::new(),
        callbacks: vec![cb(
            CALLBACK_CANAL_SPRITE_OFFSET,
            "CBID_CANALS_SPRITE_OFFSET",
            Some(0),
            FieldWidth::One,
            field!(WaterFeature, |w| RawField::U8(w.callback_mask.bits())),
        )],
        variables: vec![
            var(0x80, "tile height"),
            var(0x81, "terrain type"),
            var(0x83, "random bits"),
        ],
        helper: Box::new(CanalHelper),
        storage: None,
    }
}

// =============================================================================
// Industry tiles
// =============================================================================

fn industry_tiles() -> FeatureTable {
    let mask = field!(IndustryTileSpec, |s| RawField::U8(s.callback_mask.bits()));
    let one = FieldWidth::One;
    FeatureTable {
        properties: Vec::new(),
        callbacks: vec![
            cb(0x25, "CBID_INDTILE_ANIM_START_STOP", None, one, mask),
            cb(0x26, "CBID_INDTILE_ANIM_NEXT_FRAME", Some(0), one, mask),
            cb(0x27, "CBID_INDTILE_ANIMATION_SPEED", Some(1), one, mask),
            cb(0x2B, "CBID_INDTILE_CARGO_ACCEPTANCE", Some(5), one, mask),
            cb(0x2C, "CBID_INDTILE_ACCEPT_CARGO", Some(3), one, mask),
            cb(0x2F, "CBID_INDTILE_SHAPE_CHECK", Some(4), one, mask),
            cb(0x30, "CBID_INDTILE_DRAW_FOUNDATIONS", Some(2), one, mask),
            cb(0x3C, "CBID_INDTILE_AUTOSLOPE", Some(6), one, mask),
        ],
        variables: vec![
            var(0x40, "construction state of tile"),
            var(0x41, "ground type"),
            var(0x43, "relative position"),
            var(0x44, "animation frame"),
            var(0x60, "land info of nearby tiles"),
            var(0x61, "animation stage of nearby tiles"),
            var(0x62, "get industry or airport tile ID at offset"),
        ],
        helper: Box::new(IndustryTileHelper),
        storage: None,
    }
}

// =============================================================================
// Industries
// =============================================================================

fn industries() -> FeatureTable {
    use PropertyType::Cargo;

    let one = FieldWidth::One;
    let two = FieldWidth::Two;
    let mask = field!(IndustrySpec, |s| RawField::U16(s.callback_mask.bits()));
    FeatureTable {
        properties: vec![
            prop(0x25, "produced cargo 0", one, Cargo, field!(Industry, |i| RawField::U8(i.produced_cargo[0].0))),
            prop(0x25, "produced cargo 1", one, Cargo, field!(Industry, |i| RawField::U8(i.produced_cargo[1].0))),
            prop(0x26, "accepted cargo 0", one, Cargo, field!(Industry, |i| RawField::U8(i.accepts_cargo[0].0))),
            prop(0x26, "accepted cargo 1", one, Cargo, field!(Industry, |i| RawField::U8(i.accepts_cargo[1].0))),
            prop(0x26, "accepted cargo 2", one, Cargo, field!(Industry, |i| RawField::U8(i.accepts_cargo[2].0))),
        ],
        callbacks: vec![
            cb(0x22, "CBID_INDUSTRY_PROBABILITY", Some(0), two, mask),
            cb(0x28, "CBID_INDUSTRY_LOCATION", Some(3), two, mask),
            cb(0x29, "CBID_INDUSTRY_PRODUCTION_CHANGE", Some(4), two, mask),
            cb(0x35, "CBID_INDUSTRY_MONTHLYPROD_CHANGE", Some(5), two, mask),
            cb(0x37, "CBID_INDUSTRY_CARGO_SUFFIX", Some(6), two, mask),
            cb(0x38, "CBID_INDUSTRY_FUND_MORE_TEXT", Some(7), two, mask),
            cb(0x3A, "CBID_INDUSTRY_WINDOW_MORE_TEXT", Some(9), two, mask),
            cb(0x3B, "CBID_INDUSTRY_SPECIAL_EFFECT", Some(10), two, mask),
            cb(0x3D, "CBID_INDUSTRY_REFUSE_CARGO", Some(11), two, mask),
            cb(0x14A, "CBID_INDUSTRY_DECIDE_COLOUR", Some(12), two, mask),
            cb(0x14B, "CBID_INDUSTRY_INPUT_CARGO_TYPES", Some(13), two, mask),
            cb(0x14C, "CBID_INDUSTRY_OUTPUT_CARGO_TYPES", Some(14), two, mask),
        ],
        variables: vec![
            var(0x40, "waiting cargo 0"),
            var(0x41, "waiting cargo 1"),
            var(0x42, "waiting cargo 2"),
            var(0x44, "layout number"),
            var(0x46, "date when built"),
            var(0x60, "get industry tile ID at offset"),
            var(0x61, "get random tile bits at offset"),
            var(0x62, "land info of nearby tiles"),
        ],
        helper: Box::new(IndustryHelper),
        storage: Some(StorageLayout {
            slots: INDUSTRY_STORAGE_SLOTS,
            reader: industry_storage,
        }),
    }
}

fn industry_storage<'r>(record: &Record<'r>) -> Option<&'r [i32]> {
    match *record {
        Record::Industry(industry) => Some(&industry.psa[..]),
        _ => None,
    }
}
