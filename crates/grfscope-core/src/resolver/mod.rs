//! Feature resolvers and the decision graph walker.
//!
//! Content packs customise an entity by supplying a decision graph per
//! feature. Walking a graph needs entity facts (variables, random bits,
//! triggers) whose meaning differs per feature. The [`FeatureResolver`] trait
//! is the fixed capability set every feature implements, so that [`resolve`]
//! can be written once for all of them.
//!
//! # Architecture
//!
//! - [`FeatureResolver`]: five operations, one implementation per feature
//!   ([`CanalScope`], [`VehicleScope`], [`IndustryScope`], [`IndustryTileScope`])
//! - [`Scope`]: tagged union of the per-feature implementations
//! - [`ResolverContext`]: per-query state around a scope (callback info, last
//!   value, trigger/reseed masks, content file, diagnostics sink)
//! - [`resolve`]: the feature-agnostic walk from a root node to a leaf
//!
//! # Invariants
//!
//! - Variable evaluation is pure; only the trigger/reseed bookkeeping of the
//!   context and a scope's pending triggers change during a walk
//! - An unknown variable never aborts a walk: it is reported as unavailable,
//!   a diagnostic is emitted and the deterministic node falls back to its
//!   default child
//! - `None` from [`resolve`] means "use the feature's default outcome"
//!
//! # Example
//!
//! ```
//! use grfscope_core::config::WorldConfig;
//! use grfscope_core::diagnostics::RecordingSink;
//! use grfscope_core::group::{RealGroup, SpriteGroup};
//! use grfscope_core::resolver::{resolve, CanalScope, ResolverContext, Scope};
//! use grfscope_core::world::{tile::WaterClass, World};
//!
//! let mut world = World::new(WorldConfig::default());
//! let tile = world.tile_index(1, 1).unwrap();
//! world.make_water(tile, WaterClass::Canal);
//!
//! let root = SpriteGroup::real(RealGroup::new().loaded(SpriteGroup::sprite(4000, 1)));
//! let sink = RecordingSink::new();
//! let mut ctx = ResolverContext::new(Scope::Canal(CanalScope::new(&world, tile)), None, &sink);
//!
//! let leaf = resolve(Some(&root), &mut ctx).unwrap();
//! assert_eq!(leaf.result(), Some(4000));
//! ```

mod canal;
mod industry;
mod vehicle;

pub use canal::CanalScope;
pub use industry::{IndustryScope, IndustryTileScope};
pub use vehicle::VehicleScope;

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::feature::FeatureKind;
use crate::group::{GrfFile, GroupRef, RealGroup, SpriteGroup};

/// Maximum number of nodes visited in one walk.
pub const MAX_GRAPH_DEPTH: usize = 64;

/// Callback id meaning "no callback is being evaluated".
pub const NO_CALLBACK: u16 = 0;

// =============================================================================
// Variable values
// =============================================================================

/// Result of evaluating a variable.
///
/// Unavailable variables carry `u32::MAX` so that graphs switching on them
/// without checking availability still see a well-defined value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableValue {
    /// The computed value, `u32::MAX` when unavailable.
    pub value: u32,
    /// Whether the feature implements the variable.
    pub available: bool,
}

impl VariableValue {
    /// Value of a variable the feature does not implement.
    pub const UNAVAILABLE: Self = Self {
        value: u32::MAX,
        available: false,
    };

    /// An available value.
    #[must_use]
    pub const fn available(value: u32) -> Self {
        Self {
            value,
            available: true,
        }
    }

    /// The value if available.
    #[must_use]
    pub const fn get(self) -> Option<u32> {
        if self.available {
            Some(self.value)
        } else {
            None
        }
    }
}

impl From<u32> for VariableValue {
    fn from(value: u32) -> Self {
        Self::available(value)
    }
}

// =============================================================================
// FeatureResolver
// =============================================================================

/// Capability set a feature supplies to the graph walker.
///
/// # Implementation Guidelines
///
/// 1. **Purity**: `variable` must not mutate anything; it may be called any
///    number of times during a walk and by the inspector.
///
/// 2. **Unknown ids**: return [`VariableValue::UNAVAILABLE`]. The context
///    reports the diagnostic; implementations do not log.
///
/// 3. **Random state**: features without random bits keep the default
///    `random_bits`/`triggers`/`set_triggers`, which report zero and ignore
///    writes.
pub trait FeatureResolver {
    /// Feature this resolver serves.
    fn kind(&self) -> FeatureKind;

    /// Index of the entity being resolved, for diagnostics.
    fn index(&self) -> u32;

    /// Persisted random bits of the entity.
    fn random_bits(&self) -> u32 {
        0
    }

    /// Random triggers waiting on the entity.
    fn triggers(&self) -> u32 {
        0
    }

    /// Records the waiting triggers left after a walk.
    fn set_triggers(&mut self, _triggers: u32) {}

    /// Evaluates a feature-specific variable.
    fn variable(&self, id: u8, param: u8) -> VariableValue;

    /// Picks the candidate of a real node to continue with.
    ///
    /// The default takes the first loaded candidate in content order and
    /// never falls back to a loading one. `None` when nothing is loaded.
    fn resolve_real<'g>(&self, group: &'g RealGroup) -> Option<&'g GroupRef> {
        group.loaded_candidates().next()
    }
}

/// The per-feature resolver of one query.
#[derive(Debug, Clone)]
pub enum Scope<'a> {
    /// Water tiles.
    Canal(CanalScope<'a>),
    /// Vehicle units of any vehicle feature.
    Vehicle(VehicleScope<'a>),
    /// Industries.
    Industry(IndustryScope<'a>),
    /// Industry tiles.
    IndustryTile(IndustryTileScope<'a>),
}

macro_rules! dispatch {
    ($scope:expr, $inner:ident => $body:expr) => {
        match $scope {
            Scope::Canal($inner) => $body,
            Scope::Vehicle($inner) => $body,
            Scope::Industry($inner) => $body,
            Scope::IndustryTile($inner) => $body,
        }
    };
}

impl Scope<'_> {
    /// Waiting triggers to store on the entity after a walk, if a randomized
    /// node changed them.
    #[must_use]
    pub const fn pending_triggers(&self) -> Option<u8> {
        match self {
            Self::Canal(_) => None,
            Self::Vehicle(scope) => scope.pending_triggers(),
            Self::Industry(scope) => scope.pending_triggers(),
            Self::IndustryTile(scope) => scope.pending_triggers(),
        }
    }
}

impl FeatureResolver for Scope<'_> {
    fn kind(&self) -> FeatureKind {
        dispatch!(self, scope => scope.kind())
    }

    fn index(&self) -> u32 {
        dispatch!(self, scope => scope.index())
    }

    fn random_bits(&self) -> u32 {
        dispatch!(self, scope => scope.random_bits())
    }

    fn triggers(&self) -> u32 {
        dispatch!(self, scope => scope.triggers())
    }

    fn set_triggers(&mut self, triggers: u32) {
        dispatch!(self, scope => scope.set_triggers(triggers));
    }

    fn variable(&self, id: u8, param: u8) -> VariableValue {
        dispatch!(self, scope => scope.variable(id, param))
    }

    fn resolve_real<'g>(&self, group: &'g RealGroup) -> Option<&'g GroupRef> {
        dispatch!(self, scope => scope.resolve_real(group))
    }
}

// =============================================================================
// ResolverContext
// =============================================================================

/// Per-query state of a graph walk.
///
/// Built on the stack for one query and dropped afterwards. The public fields
/// mirror what content can observe through the generic variables.
pub struct ResolverContext<'a> {
    /// Feature resolver for the entity.
    pub scope: Scope<'a>,
    /// Callback being evaluated, [`NO_CALLBACK`] for plain sprite queries.
    pub callback: u16,
    /// First callback parameter.
    pub callback_param1: u32,
    /// Second callback parameter.
    pub callback_param2: u32,
    /// Value computed by the last deterministic node.
    pub last_value: u32,
    /// Triggers fired by the event that started this query.
    pub trigger: u32,
    /// Random bits to rerandomise after the query.
    pub reseed: u32,
    /// Number of randomized nodes visited.
    pub count: u32,
    /// Content file the graph belongs to.
    pub grf: Option<&'a GrfFile>,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl std::fmt::Debug for ResolverContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverContext")
            .field("scope", &self.scope)
            .field("callback", &self.callback)
            .field("last_value", &self.last_value)
            .field("trigger", &self.trigger)
            .field("reseed", &self.reseed)
            .finish_non_exhaustive()
    }
}

impl<'a> ResolverContext<'a> {
    /// Creates a context for a plain sprite query.
    #[must_use]
    pub fn new(scope: Scope<'a>, grf: Option<&'a GrfFile>, diagnostics: &'a dyn DiagnosticsSink) -> Self {
        Self {
            scope,
            callback: NO_CALLBACK,
            callback_param1: 0,
            callback_param2: 0,
            last_value: 0,
            trigger: 0,
            reseed: 0,
            count: 0,
            grf,
            diagnostics,
        }
    }

    /// Turns the query into a callback query.
    #[must_use]
    pub fn with_callback(mut self, callback: u16, param1: u32, param2: u32) -> Self {
        self.callback = callback;
        self.callback_param1 = param1;
        self.callback_param2 = param2;
        self
    }

    /// Sets the triggers fired by the current event.
    #[must_use]
    pub fn with_trigger(mut self, trigger: u32) -> Self {
        self.trigger = trigger;
        self
    }

    /// Evaluates a variable, generic ones first, then the feature's.
    ///
    /// Unknown ids are reported to the diagnostics sink as
    /// [`Diagnostic::UnknownVariable`] and come back unavailable.
    pub fn variable(&self, id: u8, param: u8) -> VariableValue {
        let value = match id {
            0x0C => VariableValue::available(u32::from(self.callback)),
            0x10 => VariableValue::available(self.callback_param1),
            0x18 => VariableValue::available(self.callback_param2),
            0x1C => VariableValue::available(self.last_value),
            0x5F => VariableValue::available(
                (self.scope.random_bits() << 8) | self.scope.triggers(),
            ),
            0x7F => VariableValue::available(self.grf.map_or(0, |grf| grf.param(param))),
            _ => self.scope.variable(id, param),
        };
        if !value.available {
            self.report(Diagnostic::UnknownVariable {
                id,
                kind: self.scope.kind(),
                index: self.scope.index(),
            });
        }
        value
    }

    /// Forwards a diagnostic to the sink.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }
}

// =============================================================================
// Graph walk
// =============================================================================

/// Walks a decision graph to its leaf.
///
/// Inner nodes are evaluated through the context: deterministic nodes switch
/// on a variable, randomized nodes on the entity's random bits (handling
/// triggers), real nodes defer to the feature's `resolve_real`. The walk ends
/// at a result or callback leaf.
///
/// Returns `None` for a missing root, a real node with nothing loaded, a
/// switch with no matching child, or a walk longer than [`MAX_GRAPH_DEPTH`].
/// Callers treat `None` as "use the default outcome", never as an error.
pub fn resolve<'g>(root: Option<&'g GroupRef>, ctx: &mut ResolverContext<'_>) -> Option<&'g SpriteGroup> {
    let mut node: &'g SpriteGroup = root?.as_ref();
    for _ in 0..MAX_GRAPH_DEPTH {
        node = match node {
            SpriteGroup::Result(_) | SpriteGroup::CallbackResult(_) => return Some(node),
            SpriteGroup::Real(real) => ctx.scope.resolve_real(real)?.as_ref(),
            SpriteGroup::Deterministic(group) => {
                let value = ctx.variable(group.variable, group.parameter);
                if value.available {
                    let adjusted = group.adjust(value.value);
                    ctx.last_value = adjusted;
                    group.select(adjusted)?.as_ref()
                } else {
                    group.default.as_deref()?
                }
            }
            SpriteGroup::Randomized(group) => {
                if group.groups.is_empty() {
                    return None;
                }
                ctx.count += 1;
                let mask = group.mask();
                if ctx.trigger != 0 {
                    let waiting = ctx.scope.triggers();
                    let matched = u32::from(group.triggers) & (waiting | ctx.trigger);
                    if group.triggered_by(waiting | ctx.trigger) {
                        ctx.reseed |= mask.checked_shl(u32::from(group.lowest_bit)).unwrap_or(0);
                        ctx.scope.set_triggers(waiting & !matched);
                    } else {
                        ctx.scope.set_triggers(waiting | ctx.trigger);
                    }
                }
                let bits = ctx
                    .scope
                    .random_bits()
                    .checked_shr(u32::from(group.lowest_bit))
                    .unwrap_or(0);
                group.groups.get((bits & mask) as usize)?.as_ref()
            }
        };
        tracing::trace!(target: "grf", kind = %ctx.scope.kind(), "descending graph");
    }
    ctx.report(Diagnostic::GraphTooDeep {
        kind: ctx.scope.kind(),
        index: ctx.scope.index(),
    });
    None
}

/// Walks a graph and reduces the leaf to its numeric outcome.
///
/// `None` (nothing resolved, or an inner node reached) maps to zero, the
/// neutral "no customisation" value.
pub fn resolve_outcome(root: Option<&GroupRef>, ctx: &mut ResolverContext<'_>) -> u32 {
    resolve(root, ctx).and_then(SpriteGroup::result).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::diagnostics::RecordingSink;
    use crate::group::{DeterministicGroup, RandomizedGroup, TriggerMode};
    use crate::world::tile::{TileIndex, WaterClass};
    use crate::world::World;

    fn water_world() -> (World, TileIndex) {
        let mut world = World::new(WorldConfig {
            map_width: 8,
            map_height: 8,
            ..WorldConfig::default()
        });
        let tile = world.tile_index(2, 3).unwrap();
        world.make_water(tile, WaterClass::Canal);
        world.tile_mut(tile).unwrap().random_bits = 0b0110;
        world.set_height(tile, 2);
        (world, tile)
    }

    fn canal_ctx<'a>(world: &'a World, tile: TileIndex, sink: &'a RecordingSink) -> ResolverContext<'a> {
        ResolverContext::new(Scope::Canal(CanalScope::new(world, tile)), None, sink)
    }

    mod resolve_real_tests {
        use super::*;

        #[test]
        fn empty_real_group_resolves_to_nothing() {
            let (world, tile) = water_world();
            let scope = CanalScope::new(&world, tile);
            assert!(scope.resolve_real(&RealGroup::new()).is_none());
        }

        #[test]
        fn first_loaded_wins() {
            let (world, tile) = water_world();
            let scope = CanalScope::new(&world, tile);
            let a = SpriteGroup::sprite(1, 1);
            let b = SpriteGroup::sprite(2, 1);

            let real = RealGroup::new().loaded(a.clone()).loading(b.clone());
            assert_eq!(scope.resolve_real(&real), Some(&a));

            let real = RealGroup::new().loading(a).loaded(b.clone());
            assert_eq!(scope.resolve_real(&real), Some(&b));
        }

        #[test]
        fn only_loading_candidates_resolve_to_nothing() {
            let (world, tile) = water_world();
            let scope = CanalScope::new(&world, tile);
            let real = RealGroup::new().loading(SpriteGroup::sprite(1, 1));
            assert!(scope.resolve_real(&real).is_none());
        }
    }

    mod context_tests {
        use super::*;

        #[test]
        fn generic_variables_read_context() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let ctx = canal_ctx(&world, tile, &sink).with_callback(0x147, 11, 22);
            assert_eq!(ctx.variable(0x0C, 0).get(), Some(0x147));
            assert_eq!(ctx.variable(0x10, 0).get(), Some(11));
            assert_eq!(ctx.variable(0x18, 0).get(), Some(22));
            assert_eq!(ctx.variable(0x1C, 0).get(), Some(0));
            assert_eq!(ctx.variable(0x5F, 0).get(), Some(0b0110 << 8));
        }

        #[test]
        fn grf_parameters_through_7f() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let mut grf = GrfFile::new(1, "test.grf");
            grf.params = vec![5, 6, 7];
            let ctx = ResolverContext::new(Scope::Canal(CanalScope::new(&world, tile)), Some(&grf), &sink);
            assert_eq!(ctx.variable(0x7F, 2).get(), Some(7));
            assert_eq!(ctx.variable(0x7F, 9).get(), Some(0));
        }

        #[test]
        fn unknown_variable_is_reported_with_identity() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let ctx = canal_ctx(&world, tile, &sink);
            let value = ctx.variable(0x82, 0);
            assert_eq!(value, VariableValue::UNAVAILABLE);
            assert_eq!(
                sink.take(),
                vec![Diagnostic::UnknownVariable {
                    id: 0x82,
                    kind: FeatureKind::Canals,
                    index: tile.as_u32(),
                }]
            );
        }
    }

    mod walk_tests {
        use super::*;

        #[test]
        fn missing_root_is_no_result() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let mut ctx = canal_ctx(&world, tile, &sink);
            assert!(resolve(None, &mut ctx).is_none());
            assert_eq!(resolve_outcome(None, &mut ctx), 0);
        }

        #[test]
        fn deterministic_switch_on_height() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let low = SpriteGroup::sprite(100, 1);
            let high = SpriteGroup::sprite(200, 1);
            let root = SpriteGroup::deterministic(
                DeterministicGroup::on(0x80).range(0, 1, low).range(2, 15, high),
            );
            let mut ctx = canal_ctx(&world, tile, &sink);
            assert_eq!(resolve_outcome(Some(&root), &mut ctx), 200);
            assert_eq!(ctx.last_value, 2);
        }

        #[test]
        fn unavailable_selector_takes_default() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let fallback = SpriteGroup::sprite(300, 1);
            let root = SpriteGroup::deterministic(
                DeterministicGroup::on(0x99)
                    .range(0, u32::MAX, SpriteGroup::sprite(1, 1))
                    .otherwise(fallback),
            );
            let mut ctx = canal_ctx(&world, tile, &sink);
            assert_eq!(resolve_outcome(Some(&root), &mut ctx), 300);
            assert_eq!(sink.len(), 1);
        }

        #[test]
        fn randomized_uses_shifted_bits() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let groups = (0..4).map(|i| SpriteGroup::sprite(i, 1)).collect();
            let root = SpriteGroup::randomized(RandomizedGroup {
                triggers: 0,
                mode: TriggerMode::Any,
                lowest_bit: 1,
                groups,
            });
            let mut ctx = canal_ctx(&world, tile, &sink);
            // bits 0b0110 >> 1 = 0b11
            assert_eq!(resolve_outcome(Some(&root), &mut ctx), 3);
            assert_eq!(ctx.count, 1);
            assert_eq!(ctx.reseed, 0);
        }

        #[test]
        fn matching_trigger_marks_bits_for_reseed() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let groups = (0..2).map(|i| SpriteGroup::sprite(i, 1)).collect();
            let root = SpriteGroup::randomized(RandomizedGroup {
                triggers: 0b01,
                mode: TriggerMode::Any,
                lowest_bit: 2,
                groups,
            });
            let mut ctx = canal_ctx(&world, tile, &sink).with_trigger(0b01);
            resolve(Some(&root), &mut ctx);
            assert_eq!(ctx.reseed, 0b100);
        }

        #[test]
        fn real_node_continues_into_chosen_candidate() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let inner = SpriteGroup::deterministic(
                DeterministicGroup::on(0x83).otherwise(SpriteGroup::sprite(42, 1)),
            );
            let root = SpriteGroup::real(RealGroup::new().loaded(inner));
            let mut ctx = canal_ctx(&world, tile, &sink);
            assert_eq!(resolve_outcome(Some(&root), &mut ctx), 42);
        }

        #[test]
        fn overly_deep_graph_gives_up() {
            let (world, tile) = water_world();
            let sink = RecordingSink::new();
            let mut node = SpriteGroup::sprite(1, 1);
            for _ in 0..MAX_GRAPH_DEPTH {
                node = SpriteGroup::real(RealGroup::new().loaded(node));
            }
            let mut ctx = canal_ctx(&world, tile, &sink);
            assert!(resolve(Some(&node), &mut ctx).is_none());
            assert!(matches!(sink.take()[..], [Diagnostic::GraphTooDeep { .. }]));
        }
    }

    #[test]
    fn scope_is_resolver_object_safe() {
        fn _accepts(_resolver: &dyn FeatureResolver) {}
    }
}
