//! Session: the owner of all state and the public entry points.
//!
//! A [`Session`] bundles the entity stores, the loaded content, the
//! introspection registry, the open inspectors and the diagnostics sink.
//! Hosts create one session and route every query through it:
//!
//! - **Resolution**: [`Session::resolve`], [`Session::callback`],
//!   [`Session::trigger`] and the canal forms [`Session::canal_sprite`] /
//!   [`Session::canal_sprite_offset`]
//! - **Introspection**: [`Session::is_inspectable`],
//!   [`Session::open_inspector`], [`Session::render_inspector`],
//!   [`Session::close_inspector`]
//! - **Lifecycle**: [`Session::reload_content`] swaps the content set and
//!   resets inspector parameters
//!
//! Nothing is global: two sessions never share state unless they share a
//! diagnostics sink.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use grfscope_core::content::ContentSet;
//! use grfscope_core::feature::{CanalFeature, FeatureKind, GraphKey};
//! use grfscope_core::group::{GrfFile, RealGroup, SpriteGroup};
//! use grfscope_core::session::Session;
//! use grfscope_core::world::{tile::WaterClass, World};
//!
//! let mut world = World::default();
//! let tile = world.tile_index(2, 2).unwrap();
//! world.make_water(tile, WaterClass::Canal);
//!
//! let mut content = ContentSet::new();
//! content.insert(
//!     GraphKey::canal(CanalFeature::Dikes),
//!     Arc::new(GrfFile::new(0x0102_0304, "water.grf")),
//!     SpriteGroup::real(RealGroup::new().loaded(SpriteGroup::sprite(1200, 1))),
//! );
//!
//! let mut session = Session::new(world, content);
//! assert_eq!(session.canal_sprite(CanalFeature::Dikes, tile), 1200);
//!
//! let target = session.open_inspector(FeatureKind::Canals, tile.as_u32()).unwrap();
//! let lines = session.render_inspector(target).unwrap();
//! assert_eq!(lines[0].to_string(), "Variables:");
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::content::{ContentSet, WaterCallbacks, CALLBACK_CANAL_SPRITE_OFFSET};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::error::{GrfError, Result};
use crate::feature::{CanalFeature, FeatureKind, GraphKey, InspectTarget};
use crate::inspect::surface::{self, InspectLine, Inspectors, SurfaceHost};
use crate::inspect::{Caption, FeatureRegistry, InspectView};
use crate::resolver::{
    resolve, resolve_outcome, CanalScope, IndustryScope, IndustryTileScope, ResolverContext,
    Scope, VehicleScope,
};
use crate::world::industry::IndustryId;
use crate::world::tile::TileIndex;
use crate::world::vehicle::VehicleId;
use crate::world::World;

/// Builds the resolver for entity `index` of `kind`.
///
/// Vehicles are looked up by id and must belong to `kind`; canals and
/// industry tiles by tile index; industries by id. Kinds without a resolver
/// yield `None`.
fn scope_for(world: &World, kind: FeatureKind, index: u32) -> Option<Scope<'_>> {
    match kind {
        FeatureKind::Trains | FeatureKind::RoadVehicles | FeatureKind::Ships | FeatureKind::Aircraft => {
            let scope = VehicleScope::new(world, VehicleId::new(index))?;
            (scope.vehicle().vehicle_type.feature() == kind).then_some(Scope::Vehicle(scope))
        }
        FeatureKind::Canals => {
            let tile = TileIndex::new(index);
            world.tile(tile)?;
            Some(Scope::Canal(CanalScope::new(world, tile)))
        }
        FeatureKind::Industries => {
            let id = IndustryId::new(u16::try_from(index).ok()?);
            IndustryScope::new(world, id).map(Scope::Industry)
        }
        FeatureKind::IndustryTiles => {
            IndustryTileScope::new(world, TileIndex::new(index)).map(Scope::IndustryTile)
        }
        _ => None,
    }
}

// =============================================================================
// Session
// =============================================================================

/// Owner of world, content, registry, inspectors and diagnostics.
pub struct Session {
    world: World,
    content: ContentSet,
    registry: FeatureRegistry,
    inspectors: Inspectors,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("vehicles", &self.world.vehicle_count())
            .field("industries", &self.world.industry_count())
            .field("graphs", &self.content.len())
            .field("inspectors", &self.inspectors.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with the standard registry and a [`TracingSink`].
    #[must_use]
    pub fn new(world: World, content: ContentSet) -> Self {
        Self {
            world,
            content,
            registry: FeatureRegistry::standard(),
            inspectors: Inspectors::new(),
            diagnostics: Arc::new(TracingSink::new()),
        }
    }

    /// Replaces the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Replaces the introspection registry.
    #[must_use]
    pub fn with_registry(mut self, registry: FeatureRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Installs the host notified when inspectors open and close.
    pub fn set_surface_host(&mut self, host: Box<dyn SurfaceHost>) {
        self.inspectors.set_host(host);
    }

    /// Entity stores.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable entity stores.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Loaded content.
    #[must_use]
    pub const fn content(&self) -> &ContentSet {
        &self.content
    }

    /// Introspection registry.
    #[must_use]
    pub const fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Open inspectors and variable parameters.
    #[must_use]
    pub const fn inspectors(&self) -> &Inspectors {
        &self.inspectors
    }

    /// Mutable inspectors, for prompt interaction and parameters.
    pub fn inspectors_mut(&mut self) -> &mut Inspectors {
        &mut self.inspectors
    }

    /// Shared diagnostics sink.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.diagnostics
    }

    /// Swaps in freshly loaded content.
    ///
    /// Variable parameters are reset, every open inspector is marked dirty
    /// and the diagnostics sink forgets what it already reported.
    pub fn reload_content(&mut self, content: ContentSet) {
        self.content = content;
        self.inspectors.reset();
        self.diagnostics.reset();
        info!(target: "grf", graphs = self.content.len(), "content reloaded");
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn context(&self, key: GraphKey, index: u32) -> Option<ResolverContext<'_>> {
        let scope = scope_for(&self.world, key.kind, index)?;
        let grf = self.content.graph(key).map(|graph| graph.grf.as_ref());
        Some(ResolverContext::new(scope, grf, self.diagnostics.as_ref()))
    }

    /// Resolves the graph for `key` against entity `index`.
    ///
    /// Zero means "no customisation": no graph, no such entity, or a walk
    /// that ended without a result.
    #[must_use]
    pub fn resolve(&self, key: GraphKey, index: u32) -> u32 {
        let Some(mut ctx) = self.context(key, index) else {
            return 0;
        };
        resolve_outcome(self.content.root(key), &mut ctx)
    }

    /// Sprite of a canal sub-feature on a water tile.
    #[must_use]
    pub fn canal_sprite(&self, feature: CanalFeature, tile: TileIndex) -> u32 {
        self.resolve(GraphKey::canal(feature), tile.as_u32())
    }

    /// Runs callback `callback` for entity `index`.
    ///
    /// `None` if the walk does not end in a callback result.
    #[must_use]
    pub fn callback(&self, key: GraphKey, index: u32, callback: u16, param1: u32, param2: u32) -> Option<u16> {
        let mut ctx = self.context(key, index)?.with_callback(callback, param1, param2);
        resolve(self.content.root(key), &mut ctx)?.callback_result()
    }

    /// Sprite offset of a canal sub-feature, adjusted by content if the
    /// feature enables the sprite offset callback.
    #[must_use]
    pub fn canal_sprite_offset(&self, feature: CanalFeature, tile: TileIndex, offset: u32) -> u32 {
        let mask = self.content.water_feature(feature).callback_mask;
        if !mask.contains(WaterCallbacks::SPRITE_OFFSET) {
            return offset;
        }
        self.callback(GraphKey::canal(feature), tile.as_u32(), CALLBACK_CANAL_SPRITE_OFFSET, offset, 0)
            .map_or(offset, |extra| offset.wrapping_add(u32::from(extra)))
    }

    /// Fires `trigger` on entity `index` and walks the graph for `key`.
    ///
    /// Randomized nodes matching the trigger mark their bits for reseeding;
    /// afterwards those bits are rerandomised and the entity's waiting
    /// triggers updated. Returns the reseed mask.
    pub fn trigger(&mut self, key: GraphKey, index: u32, trigger: u32) -> u32 {
        let (reseed, pending) = {
            let Some(ctx) = self.context(key, index) else {
                return 0;
            };
            let mut ctx = ctx.with_trigger(trigger);
            resolve(self.content.root(key), &mut ctx);
            (ctx.reseed, ctx.scope.pending_triggers())
        };
        self.store_random_state(key.kind, index, reseed, pending);
        reseed
    }

    fn store_random_state(&mut self, kind: FeatureKind, index: u32, reseed: u32, pending: Option<u8>) {
        let world = &mut self.world;
        match kind {
            FeatureKind::Trains | FeatureKind::RoadVehicles | FeatureKind::Ships | FeatureKind::Aircraft => {
                let id = VehicleId::new(index);
                let Some(bits) = world.vehicle(id).map(|v| u32::from(v.random_bits)) else {
                    return;
                };
                let bits = world.rerandomise(bits, reseed & 0xFF);
                if let Some(vehicle) = world.vehicle_mut(id) {
                    vehicle.random_bits = (bits & 0xFF) as u8;
                    vehicle.waiting_triggers = pending.unwrap_or(vehicle.waiting_triggers);
                }
            }
            FeatureKind::Industries => {
                let Ok(id) = u16::try_from(index).map(IndustryId::new) else {
                    return;
                };
                let Some(bits) = world.industry(id).map(|i| u32::from(i.random)) else {
                    return;
                };
                let bits = world.rerandomise(bits, reseed & 0xFFFF);
                if let Some(industry) = world.industry_mut(id) {
                    industry.random = (bits & 0xFFFF) as u16;
                    industry.random_triggers = pending.unwrap_or(industry.random_triggers);
                }
            }
            FeatureKind::IndustryTiles => {
                let tile = TileIndex::new(index);
                let Some(bits) = world.tile(tile).map(|t| u32::from(t.random_bits)) else {
                    return;
                };
                let bits = world.rerandomise(bits, reseed & 0xFF);
                if let Some(tile) = world.tile_mut(tile) {
                    tile.random_bits = (bits & 0xFF) as u8;
                    tile.triggers = pending.unwrap_or(tile.triggers);
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    fn view(&self) -> InspectView<'_> {
        InspectView {
            world: &self.world,
            content: &self.content,
        }
    }

    /// Whether entity `index` of `kind` can be inspected.
    #[must_use]
    pub fn is_inspectable(&self, kind: FeatureKind, index: u32) -> bool {
        self.registry
            .table(kind)
            .is_some_and(|table| table.helper.is_inspectable(self.view(), index))
    }

    /// Opens an inspector, or raises the one already open.
    ///
    /// # Errors
    ///
    /// - [`GrfError::IndexOutOfRange`] if `index` does not fit a target
    /// - [`GrfError::NotInspectable`] if the kind has no table or the entity
    ///   cannot be inspected
    pub fn open_inspector(&mut self, kind: FeatureKind, index: u32) -> Result<InspectTarget> {
        let target = InspectTarget::new(kind, index)?;
        let table = self
            .registry
            .table(kind)
            .ok_or(GrfError::NotInspectable(target))?;
        let view = self.view();
        if !table.helper.is_inspectable(view, index) {
            debug!(target: "grf", %target, "refusing to inspect");
            return Err(GrfError::NotInspectable(target));
        }
        let parent = table.helper.parent(view, index);
        if self.inspectors.open(target, parent) {
            info!(target: "grf", %target, "inspector opened");
        }
        Ok(target)
    }

    /// Opens the parent of an open inspector's entity.
    ///
    /// `Ok(None)` if `target` has no open inspector or no parent.
    ///
    /// # Errors
    ///
    /// Same as [`Session::open_inspector`] for the parent.
    pub fn open_parent(&mut self, target: InspectTarget) -> Result<Option<InspectTarget>> {
        let Some(parent) = self.inspectors.surface(target).and_then(|surface| surface.parent()) else {
            return Ok(None);
        };
        self.open_inspector(parent.kind(), parent.index()).map(Some)
    }

    /// Closes the inspector of entity `index`. Returns false if none was open.
    pub fn close_inspector(&mut self, kind: FeatureKind, index: u32) -> bool {
        let Ok(target) = InspectTarget::new(kind, index) else {
            return false;
        };
        let closed = self.inspectors.close(target);
        if closed {
            info!(target: "grf", %target, "inspector closed");
        }
        closed
    }

    /// Renders the lines for `target` and stores them on its open surface.
    ///
    /// # Errors
    ///
    /// - [`GrfError::NotInspectable`] if the kind has no table or the entity
    ///   is gone
    /// - [`GrfError::MalformedDescriptor`] if a descriptor does not fit the
    ///   records it reads
    pub fn render_inspector(&mut self, target: InspectTarget) -> Result<Vec<InspectLine>> {
        let table = self
            .registry
            .table(target.kind())
            .ok_or(GrfError::NotInspectable(target))?;
        let view = InspectView {
            world: &self.world,
            content: &self.content,
        };
        let lines = surface::render(
            table,
            target,
            view,
            self.inspectors.params(),
            self.diagnostics.as_ref(),
        )?;
        if let Some(surface) = self.inspectors.surface_mut(target) {
            surface.set_lines(lines.clone());
        }
        Ok(lines)
    }

    /// Caption of the inspector for `target`.
    #[must_use]
    pub fn caption(&self, target: InspectTarget) -> Option<Caption> {
        let table = self.registry.table(target.kind())?;
        let view = self.view();
        table
            .helper
            .is_inspectable(view, target.index())
            .then(|| table.helper.caption(view, target.index()))
    }
}
