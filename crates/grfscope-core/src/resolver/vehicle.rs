//! Resolver for vehicle units.

use crate::feature::FeatureKind;
use crate::resolver::{FeatureResolver, VariableValue};
use crate::world::vehicle::{EngineId, Vehicle, VehicleId};
use crate::world::World;

/// Resolves graphics and callbacks of one vehicle unit.
///
/// Serves all four vehicle features; [`FeatureResolver::kind`] follows the
/// unit's vehicle type.
///
/// Variables:
/// - `0x40`: position in consist, `front | back << 8 | length << 16`
/// - `0x41`: same, counted over the run of units sharing this unit's engine
/// - `0x42`: most common cargo of the consist, `cargo << 8 | subtype << 16`
/// - `0x46`: motion counter
/// - `0x47`: carried cargo, `cargo | subtype << 8 | capacity << 16`
/// - `0x60`: number of units in the consist built from engine `param`
#[derive(Debug, Clone)]
pub struct VehicleScope<'a> {
    world: &'a World,
    id: VehicleId,
    vehicle: &'a Vehicle,
    pending_triggers: Option<u8>,
}

impl<'a> VehicleScope<'a> {
    /// Creates a resolver for vehicle `id`, or `None` if it does not exist.
    #[must_use]
    pub fn new(world: &'a World, id: VehicleId) -> Option<Self> {
        let vehicle = world.vehicle(id)?;
        Some(Self {
            world,
            id,
            vehicle,
            pending_triggers: None,
        })
    }

    /// The unit being resolved.
    #[must_use]
    pub const fn vehicle(&self) -> &'a Vehicle {
        self.vehicle
    }

    /// Triggers to write back to the unit after the walk, if they changed.
    #[must_use]
    pub const fn pending_triggers(&self) -> Option<u8> {
        self.pending_triggers
    }

    fn consist(&self) -> Vec<(VehicleId, &'a Vehicle)> {
        self.world.consist(self.vehicle.first).collect()
    }

    fn position(&self, same_engine_only: bool) -> u32 {
        let units = self.consist();
        let Some(at) = units.iter().position(|(id, _)| *id == self.id) else {
            return 0;
        };
        let (front, back) = if same_engine_only {
            let matches = |(_, unit): &&(VehicleId, &Vehicle)| unit.engine == self.vehicle.engine;
            let front = units[..at].iter().rev().take_while(matches).count();
            let back = units[at + 1..].iter().take_while(matches).count();
            (front, back)
        } else {
            (at, units.len() - at - 1)
        };
        let clamp = |n: usize| u32::try_from(n).unwrap_or(u32::MAX).min(0xFF);
        clamp(front) | clamp(back) << 8 | clamp(front + back + 1) << 16
    }

    fn common_cargo(&self) -> u32 {
        let mut capacity = std::collections::BTreeMap::new();
        for (_, unit) in self.consist() {
            if unit.cargo_type.is_valid() && unit.cargo_cap > 0 {
                *capacity
                    .entry((unit.cargo_type.0, unit.cargo_subtype))
                    .or_insert(0u32) += u32::from(unit.cargo_cap);
            }
        }
        // Ties go to the lowest cargo id.
        let best = capacity
            .into_iter()
            .fold(None, |best: Option<((u8, u8), u32)>, (key, cap)| match best {
                Some((_, best_cap)) if best_cap >= cap => best,
                _ => Some((key, cap)),
            });
        match best {
            Some(((cargo, subtype), _)) => u32::from(cargo) << 8 | u32::from(subtype) << 16,
            None => 0xFF << 8,
        }
    }

    fn engine_count(&self, engine: u8) -> u32 {
        let engine = EngineId(u16::from(engine));
        let count = self
            .world
            .consist(self.vehicle.first)
            .filter(|(_, unit)| unit.engine == engine)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

impl FeatureResolver for VehicleScope<'_> {
    fn kind(&self) -> FeatureKind {
        self.vehicle.vehicle_type.feature()
    }

    fn index(&self) -> u32 {
        self.id.as_u32()
    }

    fn random_bits(&self) -> u32 {
        u32::from(self.vehicle.random_bits)
    }

    fn triggers(&self) -> u32 {
        u32::from(self.pending_triggers.unwrap_or(self.vehicle.waiting_triggers))
    }

    fn set_triggers(&mut self, triggers: u32) {
        self.pending_triggers = Some((triggers & 0xFF) as u8);
    }

    fn variable(&self, id: u8, param: u8) -> VariableValue {
        let v = self.vehicle;
        match id {
            0x40 => self.position(false).into(),
            0x41 => self.position(true).into(),
            0x42 => self.common_cargo().into(),
            0x46 => v.motion_counter.into(),
            0x47 => (u32::from(v.cargo_type.0)
                | u32::from(v.cargo_subtype) << 8
                | u32::from(v.cargo_cap) << 16)
                .into(),
            0x60 => self.engine_count(param).into(),
            _ => VariableValue::UNAVAILABLE,
        }
    }
}
