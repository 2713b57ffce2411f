//! Cargo types.

use serde::{Deserialize, Serialize};

/// Index of a cargo type; [`CargoId::INVALID`] marks "no cargo".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CargoId(pub u8);

impl CargoId {
    /// Sentinel for "no cargo".
    pub const INVALID: Self = Self(0xFF);

    /// Whether this id names a cargo slot.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

/// Specification of one cargo type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoSpec {
    /// Four-character label, e.g. `PASS`.
    pub label: String,
    /// Display name.
    pub name: String,
}

/// Cargo slots of the loaded content, indexed by [`CargoId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoTable {
    specs: Vec<Option<CargoSpec>>,
}

impl CargoTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Temperate default cargos in their usual slots.
    #[must_use]
    pub fn temperate() -> Self {
        let mut table = Self::new();
        let defaults = [
            ("PASS", "Passengers"),
            ("COAL", "Coal"),
            ("MAIL", "Mail"),
            ("OIL_", "Oil"),
            ("LVST", "Livestock"),
            ("GOOD", "Goods"),
            ("GRAI", "Grain"),
            ("WOOD", "Wood"),
            ("IORE", "Iron Ore"),
            ("STEL", "Steel"),
            ("VALU", "Valuables"),
        ];
        for (slot, (label, name)) in defaults.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = CargoId(slot as u8);
            table.insert(
                id,
                CargoSpec {
                    label: label.to_string(),
                    name: name.to_string(),
                },
            );
        }
        table
    }

    /// Places a cargo in a slot, replacing any previous one.
    pub fn insert(&mut self, id: CargoId, spec: CargoSpec) {
        let slot = usize::from(id.0);
        if self.specs.len() <= slot {
            self.specs.resize(slot + 1, None);
        }
        self.specs[slot] = Some(spec);
    }

    /// Looks up a cargo; `None` for invalid or empty slots.
    #[must_use]
    pub fn get(&self, id: CargoId) -> Option<&CargoSpec> {
        if !id.is_valid() {
            return None;
        }
        self.specs.get(usize::from(id.0))?.as_ref()
    }

    /// Display name of a cargo, if the slot is populated.
    #[must_use]
    pub fn name(&self, id: CargoId) -> Option<&str> {
        self.get(id).map(|spec| spec.name.as_str())
    }
}
