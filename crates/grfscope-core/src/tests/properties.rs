//! Property tests of graph selection, parameters and prompt parsing.

use proptest::prelude::*;

use crate::content::ContentSet;
use crate::feature::{CanalFeature, FeatureKind, GraphKey, InspectTarget};
use crate::group::{DeterministicGroup, RandomizedGroup, SpriteGroup, TriggerMode};
use crate::inspect::surface::{InspectLine, InspectSurface};
use crate::inspect::VariableParams;
use crate::world::tile::WaterClass;

use super::helpers::{test_grf, water_session};

fn prompt_surface() -> InspectSurface {
    let target = InspectTarget::new(FeatureKind::IndustryTiles, 0).unwrap();
    let mut surface = InspectSurface::new(target, None);
    surface.set_lines(vec![InspectLine::Variable {
        id: 0x62,
        param: Some(0),
        value: 0,
        name: "get industry or airport tile ID at offset",
    }]);
    surface
}

proptest! {
    #[test]
    fn randomized_node_selects_by_shifted_bits(bits in any::<u8>(), lowest in 0u8..8, order in 0u32..4) {
        let count = 1u32 << order;
        let graph = SpriteGroup::randomized(RandomizedGroup {
            triggers: 0,
            mode: TriggerMode::Any,
            lowest_bit: lowest,
            groups: (0..count).map(|n| SpriteGroup::sprite(n, 1)).collect(),
        });
        let mut content = ContentSet::new();
        content.insert(GraphKey::canal(CanalFeature::Dikes), test_grf(), graph);
        let (mut session, tile) = water_session(WaterClass::Canal, content);
        session.world_mut().tile_mut(tile).unwrap().random_bits = bits;

        let expected = (u32::from(bits) >> lowest) & (count - 1);
        prop_assert_eq!(session.canal_sprite(CanalFeature::Dikes, tile), expected);
    }

    #[test]
    fn height_switch_picks_matching_range(height in 0u8..16) {
        let graph = SpriteGroup::deterministic(
            DeterministicGroup::on(0x80)
                .range(0, 7, SpriteGroup::sprite(1, 1))
                .range(8, 15, SpriteGroup::sprite(2, 1)),
        );
        let mut content = ContentSet::new();
        content.insert(GraphKey::canal(CanalFeature::Locks), test_grf(), graph);
        let (mut session, tile) = water_session(WaterClass::Canal, content);
        session.world_mut().set_height(tile, height);

        let expected = if height < 8 { 1 } else { 2 };
        prop_assert_eq!(session.canal_sprite(CanalFeature::Locks, tile), expected);
    }

    #[test]
    fn parameter_slots_are_independent(id in 0x60u8..=0x7F, value in any::<u8>()) {
        let mut params = VariableParams::new();
        prop_assert!(params.set(id, value));
        prop_assert_eq!(params.get(id), value);
        for other in (0x60u8..=0x7F).filter(|&other| other != id) {
            prop_assert_eq!(params.get(other), 0);
        }
    }

    #[test]
    fn plain_variables_have_no_slot(id in 0u8..0x60, value in 1u8..) {
        let mut params = VariableParams::new();
        prop_assert!(!params.set(id, value));
        prop_assert_eq!(params.get(id), 0);
    }

    #[test]
    fn prompt_accepts_any_byte_in_hex(value in any::<u8>(), upper in any::<bool>()) {
        let text = if upper { format!("{value:X}") } else { format!("{value:x}") };
        let mut surface = prompt_surface();
        let mut params = VariableParams::new();
        prop_assert_eq!(surface.click_line(0), Some(0x62));
        prop_assert!(surface.finish_prompt(&text, &mut params));
        prop_assert_eq!(params.get(0x62), value);
    }

    #[test]
    fn prompt_rejects_more_than_two_digits(text in "[0-9a-f]{3,6}") {
        let mut surface = prompt_surface();
        let mut params = VariableParams::new();
        params.set(0x62, 0x11);
        surface.click_line(0);
        prop_assert!(!surface.finish_prompt(&text, &mut params));
        prop_assert_eq!(params.get(0x62), 0x11);
    }

    #[test]
    fn window_numbers_round_trip(tag in 0u8..0x12, index in 0u32..=InspectTarget::MAX_INDEX) {
        let kind = FeatureKind::try_from(tag).unwrap();
        let target = InspectTarget::new(kind, index).unwrap();
        prop_assert_eq!(InspectTarget::from_window_number(target.window_number()), Some(target));
    }
}
