//! Per-feature record lookup for the debug surface.
//!
//! An [`InspectHelper`] maps a raw entity index of its feature to the records
//! the descriptor tables read, names the entity, finds its parent and builds
//! the resolver used to evaluate variables.

use std::fmt;

use crate::content::{edge_feature, ContentSet};
use crate::diagnostics::DiagnosticsSink;
use crate::feature::{FeatureKind, GraphKey, InspectTarget};
use crate::group::GrfFile;
use crate::inspect::Record;
use crate::resolver::{
    CanalScope, IndustryScope, IndustryTileScope, ResolverContext, Scope, VariableValue,
    VehicleScope,
};
use crate::world::industry::{Industry, IndustryId};
use crate::world::tile::{Tile, TileIndex, WaterClass};
use crate::world::vehicle::{Vehicle, VehicleId};
use crate::world::World;

/// What a helper can see: the entity stores and the loaded content.
#[derive(Debug, Clone, Copy)]
pub struct InspectView<'w> {
    /// Entity stores.
    pub world: &'w World,
    /// Loaded content.
    pub content: &'w ContentSet,
}

// =============================================================================
// Caption
// =============================================================================

/// One positional caption argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionArg {
    /// Number.
    Int(u64),
    /// Text.
    Str(String),
}

impl fmt::Display for CaptionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Caption of an inspector: a format string and up to three arguments.
///
/// Each `{}` in the format takes the next argument; missing arguments render
/// as nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    format: &'static str,
    args: Vec<CaptionArg>,
}

impl Caption {
    /// Maximum number of arguments.
    pub const MAX_ARGS: usize = 3;

    /// Caption without arguments.
    #[must_use]
    pub const fn new(format: &'static str) -> Self {
        Self {
            format,
            args: Vec::new(),
        }
    }

    /// Appends an argument; ignored once [`Self::MAX_ARGS`] are set.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<CaptionArg>) -> Self {
        if self.args.len() < Self::MAX_ARGS {
            self.args.push(arg.into());
        }
        self
    }

    /// Format string.
    #[must_use]
    pub const fn format(&self) -> &'static str {
        self.format
    }

    /// Positional arguments.
    #[must_use]
    pub fn args(&self) -> &[CaptionArg] {
        &self.args
    }
}

impl From<u32> for CaptionArg {
    fn from(n: u32) -> Self {
        Self::Int(u64::from(n))
    }
}

impl From<&str> for CaptionArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = self.args.iter();
        let mut pieces = self.format.split("{}");
        if let Some(first) = pieces.next() {
            f.write_str(first)?;
        }
        for piece in pieces {
            if let Some(arg) = args.next() {
                write!(f, "{arg}")?;
            }
            f.write_str(piece)?;
        }
        Ok(())
    }
}

// =============================================================================
// InspectHelper
// =============================================================================

/// Record lookup and variable resolution for one feature.
///
/// Indices are the raw entity indices of the feature (vehicle id, tile
/// index, industry id). Every method must tolerate indices that do not name
/// an entity and answer `None`/`false` for them.
pub trait InspectHelper: Send + Sync {
    /// Whether `index` names an entity of this feature right now.
    fn is_inspectable(&self, view: InspectView<'_>, index: u32) -> bool;

    /// Entity to inspect via the parent control, if any.
    fn parent(&self, view: InspectView<'_>, index: u32) -> Option<InspectTarget>;

    /// Record the property descriptors read.
    fn instance<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>>;

    /// Record the callback descriptors read; may be the instance itself.
    fn spec<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>>;

    /// Caption of the surface.
    fn caption(&self, view: InspectView<'_>, index: u32) -> Caption;

    /// Resolver for the entity.
    fn scope<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Scope<'w>>;

    /// Content file customising the entity.
    fn grf<'w>(&self, _view: InspectView<'w>, _index: u32) -> Option<&'w GrfFile> {
        None
    }

    /// Evaluates variable `id` with `param` for the entity.
    ///
    /// Builds a resolver context through [`Self::scope`] and asks it, so
    /// generic variables are served as during a graph walk. Unavailable when
    /// the entity is gone.
    fn resolve(
        &self,
        view: InspectView<'_>,
        index: u32,
        id: u8,
        param: u8,
        diagnostics: &dyn DiagnosticsSink,
    ) -> VariableValue {
        let Some(scope) = self.scope(view, index) else {
            return VariableValue::UNAVAILABLE;
        };
        ResolverContext::new(scope, self.grf(view, index), diagnostics).variable(id, param)
    }
}

fn graph_grf<'w>(view: InspectView<'w>, key: GraphKey) -> Option<&'w GrfFile> {
    view.content.graph(key).map(|graph| &*graph.grf)
}

// =============================================================================
// Vehicles
// =============================================================================

/// Helper for one of the four vehicle features.
#[derive(Debug, Clone, Copy)]
pub struct VehicleHelper {
    kind: FeatureKind,
}

impl VehicleHelper {
    /// Helper serving vehicles of `kind`.
    #[must_use]
    pub const fn new(kind: FeatureKind) -> Self {
        Self { kind }
    }

    fn unit<'w>(&self, view: InspectView<'w>, index: u32) -> Option<&'w Vehicle> {
        view.world
            .vehicle(VehicleId::new(index))
            .filter(|v| v.vehicle_type.feature() == self.kind)
    }
}

impl InspectHelper for VehicleHelper {
    fn is_inspectable(&self, view: InspectView<'_>, index: u32) -> bool {
        self.unit(view, index).is_some()
    }

    fn parent(&self, view: InspectView<'_>, index: u32) -> Option<InspectTarget> {
        let head = self.unit(view, index)?.first;
        if head.as_u32() == index {
            return None;
        }
        InspectTarget::new(self.kind, head.as_u32()).ok()
    }

    fn instance<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        self.unit(view, index).map(Record::Vehicle)
    }

    fn spec<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        let unit = self.unit(view, index)?;
        view.world.engine(unit.engine).map(Record::Engine)
    }

    fn caption(&self, view: InspectView<'_>, index: u32) -> Caption {
        let name = self
            .unit(view, index)
            .and_then(|unit| view.world.engine(unit.engine))
            .map_or("", |engine| engine.name.as_str());
        Caption::new("{} (vehicle {})").arg(name).arg(index)
    }

    fn scope<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Scope<'w>> {
        self.unit(view, index)?;
        VehicleScope::new(view.world, VehicleId::new(index)).map(Scope::Vehicle)
    }

    fn grf<'w>(&self, view: InspectView<'w>, _index: u32) -> Option<&'w GrfFile> {
        graph_grf(view, GraphKey::from(self.kind))
    }
}

// =============================================================================
// Canals
// =============================================================================

/// Helper for water tiles; the index is the tile index.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanalHelper;

impl CanalHelper {
    fn water<'w>(view: InspectView<'w>, index: u32) -> Option<&'w Tile> {
        view.world.tile(TileIndex::new(index)).filter(|tile| tile.is_water())
    }
}

impl InspectHelper for CanalHelper {
    fn is_inspectable(&self, view: InspectView<'_>, index: u32) -> bool {
        Self::water(view, index).is_some()
    }

    fn parent(&self, _view: InspectView<'_>, _index: u32) -> Option<InspectTarget> {
        None
    }

    fn instance<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        Self::water(view, index).map(Record::Tile)
    }

    fn spec<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        let tile = Self::water(view, index)?;
        let feature = edge_feature(tile.water_class);
        Some(Record::WaterFeature(view.content.water_feature(feature)))
    }

    fn caption(&self, view: InspectView<'_>, index: u32) -> Caption {
        let class = Self::water(view, index).map_or("Water", |tile| match tile.water_class {
            WaterClass::Sea => "Sea",
            WaterClass::Canal => "Canal",
            WaterClass::River => "River",
        });
        Caption::new("{} tile {}").arg(class).arg(index)
    }

    fn scope<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Scope<'w>> {
        Self::water(view, index)?;
        Some(Scope::Canal(CanalScope::new(view.world, TileIndex::new(index))))
    }

    fn grf<'w>(&self, view: InspectView<'w>, index: u32) -> Option<&'w GrfFile> {
        let tile = Self::water(view, index)?;
        graph_grf(view, GraphKey::canal(edge_feature(tile.water_class)))
    }
}

// =============================================================================
// Industries
// =============================================================================

/// Helper for industries; the index is the industry id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndustryHelper;

impl IndustryHelper {
    fn industry<'w>(view: InspectView<'w>, index: u32) -> Option<&'w Industry> {
        view.world.industry(IndustryId::new(u16::try_from(index).ok()?))
    }
}

impl InspectHelper for IndustryHelper {
    fn is_inspectable(&self, view: InspectView<'_>, index: u32) -> bool {
        Self::industry(view, index).is_some()
    }

    fn parent(&self, _view: InspectView<'_>, _index: u32) -> Option<InspectTarget> {
        None
    }

    fn instance<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        Self::industry(view, index).map(Record::Industry)
    }

    fn spec<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        let industry = Self::industry(view, index)?;
        view.world
            .industry_spec(industry.industry_type)
            .map(Record::IndustrySpec)
    }

    fn caption(&self, view: InspectView<'_>, index: u32) -> Caption {
        let name = Self::industry(view, index)
            .and_then(|industry| view.world.industry_spec(industry.industry_type))
            .map_or("", |spec| spec.name.as_str());
        Caption::new("{} (industry {})").arg(name).arg(index)
    }

    fn scope<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Scope<'w>> {
        let id = IndustryId::new(u16::try_from(index).ok()?);
        IndustryScope::new(view.world, id).map(Scope::Industry)
    }

    fn grf<'w>(&self, view: InspectView<'w>, _index: u32) -> Option<&'w GrfFile> {
        graph_grf(view, GraphKey::from(FeatureKind::Industries))
    }
}

// =============================================================================
// Industry tiles
// =============================================================================

/// Helper for industry tiles; the index is the tile index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndustryTileHelper;

impl IndustryTileHelper {
    fn tile<'w>(view: InspectView<'w>, index: u32) -> Option<&'w Tile> {
        view.world
            .tile(TileIndex::new(index))
            .filter(|tile| tile.is_industry())
    }
}

impl InspectHelper for IndustryTileHelper {
    fn is_inspectable(&self, view: InspectView<'_>, index: u32) -> bool {
        Self::tile(view, index).is_some()
    }

    fn parent(&self, view: InspectView<'_>, index: u32) -> Option<InspectTarget> {
        let owner = Self::tile(view, index)?.industry?;
        InspectTarget::new(FeatureKind::Industries, u32::from(owner.as_u16())).ok()
    }

    fn instance<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        Self::tile(view, index).map(Record::Tile)
    }

    fn spec<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Record<'w>> {
        let tile = Self::tile(view, index)?;
        view.world
            .industry_tile_spec(tile.industry_gfx)
            .map(Record::IndustryTileSpec)
    }

    fn caption(&self, view: InspectView<'_>, index: u32) -> Caption {
        let name = Self::tile(view, index)
            .and_then(|tile| view.world.industry_tile_spec(tile.industry_gfx))
            .map_or("", |spec| spec.name.as_str());
        let at = TileIndex::new(index).xy(view.world.map_width());
        Caption::new("{} at {}x{}").arg(name).arg(at.x).arg(at.y)
    }

    fn scope<'w>(&self, view: InspectView<'w>, index: u32) -> Option<Scope<'w>> {
        IndustryTileScope::new(view.world, TileIndex::new(index)).map(Scope::IndustryTile)
    }

    fn grf<'w>(&self, view: InspectView<'w>, _index: u32) -> Option<&'w GrfFile> {
        graph_grf(view, GraphKey::from(FeatureKind::IndustryTiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::diagnostics::RecordingSink;
    use crate::world::industry::{IndustrySpec, IndustryTileSpec};
    use crate::world::vehicle::{EngineId, EngineInfo, VehicleType};

    mod caption_tests {
        use super::*;

        #[test]
        fn placeholders_take_arguments_in_order() {
            let caption = Caption::new("{} at {}x{}").arg("Coal mine").arg(3u32).arg(4u32);
            assert_eq!(caption.to_string(), "Coal mine at 3x4");
        }

        #[test]
        fn at_most_three_arguments() {
            let caption = Caption::new("{}{}{}{}").arg(1u32).arg(2u32).arg(3u32).arg(4u32);
            assert_eq!(caption.args().len(), 3);
            assert_eq!(caption.to_string(), "123");
        }
    }

    mod vehicle_helper_tests {
        use super::*;

        fn world() -> (World, VehicleId, VehicleId) {
            let mut world = World::default();
            world.register_engine(
                EngineId(3),
                EngineInfo {
                    vehicle_type: VehicleType::Ship,
                    name: "Oil Tanker".into(),
                    ..EngineInfo::default()
                },
            );
            let head = world.spawn_vehicle(EngineId(3), None).unwrap();
            let tail = world.spawn_vehicle(EngineId(3), Some(head)).unwrap();
            (world, head, tail)
        }

        #[test]
        fn only_matching_vehicle_kind_is_inspectable() {
            let (world, head, _) = world();
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };
            assert!(VehicleHelper::new(FeatureKind::Ships).is_inspectable(view, head.as_u32()));
            assert!(!VehicleHelper::new(FeatureKind::Trains).is_inspectable(view, head.as_u32()));
            assert!(!VehicleHelper::new(FeatureKind::Ships).is_inspectable(view, 99));
        }

        #[test]
        fn parent_is_consist_head() {
            let (world, head, tail) = world();
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };
            let helper = VehicleHelper::new(FeatureKind::Ships);
            assert_eq!(helper.parent(view, head.as_u32()), None);
            assert_eq!(
                helper.parent(view, tail.as_u32()),
                Some(InspectTarget::new(FeatureKind::Ships, head.as_u32()).unwrap())
            );
        }

        #[test]
        fn caption_names_engine() {
            let (world, head, _) = world();
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };
            let caption = VehicleHelper::new(FeatureKind::Ships).caption(view, head.as_u32());
            assert_eq!(caption.to_string(), "Oil Tanker (vehicle 0)");
        }
    }

    mod canal_helper_tests {
        use super::*;

        #[test]
        fn only_water_is_inspectable() {
            let mut world = World::default();
            let water = world.tile_index(1, 1).unwrap();
            let land = world.tile_index(2, 1).unwrap();
            world.make_water(water, WaterClass::River);
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };

            assert!(CanalHelper.is_inspectable(view, water.as_u32()));
            assert!(!CanalHelper.is_inspectable(view, land.as_u32()));
            assert!(CanalHelper.instance(view, land.as_u32()).is_none());
            assert!(matches!(
                CanalHelper.spec(view, water.as_u32()),
                Some(Record::WaterFeature(_))
            ));
        }

        #[test]
        fn resolve_goes_through_resolver() {
            let mut world = World::default();
            let tile = world.tile_index(1, 1).unwrap();
            world.make_water(tile, WaterClass::Canal);
            world.set_height(tile, 3);
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };
            let sink = RecordingSink::new();

            let value = CanalHelper.resolve(view, tile.as_u32(), 0x80, 0, &sink);
            assert_eq!(value.get(), Some(3));
            let missing = CanalHelper.resolve(view, tile.as_u32(), 0x84, 0, &sink);
            assert!(!missing.available);
            assert_eq!(sink.len(), 1);
        }
    }

    mod industry_helper_tests {
        use super::*;

        #[test]
        fn tile_parent_is_owning_industry() {
            let mut world = World::new(WorldConfig {
                map_width: 16,
                map_height: 16,
                ..WorldConfig::default()
            });
            let kind = world
                .add_industry_spec(IndustrySpec {
                    name: "Coal Mine".into(),
                    ..IndustrySpec::default()
                })
                .unwrap();
            let gfx = world.add_industry_tile_spec(IndustryTileSpec::default()).unwrap();
            let location = world.tile_index(4, 4).unwrap();
            let id = world.build_industry(kind, location, 2, 2, gfx).unwrap();
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };

            let parent = IndustryTileHelper.parent(view, location.as_u32()).unwrap();
            assert_eq!(parent.kind(), FeatureKind::Industries);
            assert_eq!(parent.index(), u32::from(id.as_u16()));
            assert!(IndustryHelper.is_inspectable(view, parent.index()));
            assert_eq!(IndustryHelper.parent(view, parent.index()), None);
            assert_eq!(
                IndustryHelper.caption(view, parent.index()).to_string(),
                "Coal Mine (industry 0)"
            );
        }

        #[test]
        fn industry_index_wider_than_id_is_not_inspectable() {
            let world = World::default();
            let content = ContentSet::new();
            let view = InspectView { world: &world, content: &content };
            assert!(!IndustryHelper.is_inspectable(view, 0x1_0000));
        }
    }
}
