//! Loaded content: root graphs per feature and water feature records.
//!
//! A [`ContentSet`] is what a content decoder produces when content is
//! loaded: the root decision graph of every customised [`GraphKey`] together
//! with the file that supplied it, plus the per-sub-feature records of the
//! canal feature. The set is built once and replaced wholesale on reload.

use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::feature::{CanalFeature, GraphKey};
use crate::group::{GrfFile, GroupRef};
use crate::world::tile::WaterClass;

/// Callback asking content for an offset into a water sprite set.
pub const CALLBACK_CANAL_SPRITE_OFFSET: u16 = 0x147;

bitflags! {
    /// Callbacks a water feature has enabled.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct WaterCallbacks: u8 {
        /// Sprite offset
        const SPRITE_OFFSET = 1 << 0;
    }
}

/// Content-defined record of one canal sub-feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaterFeature {
    /// Enabled callbacks.
    pub callback_mask: WaterCallbacks,
    /// Content flags.
    pub flags: u8,
}

/// Canal sub-feature whose record describes tiles of a water class.
#[must_use]
pub const fn edge_feature(class: WaterClass) -> CanalFeature {
    match class {
        WaterClass::Sea | WaterClass::Canal => CanalFeature::Dikes,
        WaterClass::River => CanalFeature::RiverEdge,
    }
}

/// A root graph and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGraph {
    /// Supplying content file.
    pub grf: Arc<GrfFile>,
    /// Root node.
    pub root: GroupRef,
}

/// Everything the loaded content customises.
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    graphs: BTreeMap<GraphKey, FeatureGraph>,
    water: [WaterFeature; CanalFeature::COUNT],
}

impl ContentSet {
    /// Creates a set that customises nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the root graph for `key`, returning the one it replaces.
    pub fn insert(&mut self, key: GraphKey, grf: Arc<GrfFile>, root: GroupRef) -> Option<FeatureGraph> {
        self.graphs.insert(key, FeatureGraph { grf, root })
    }

    /// Root graph and file for `key`.
    #[must_use]
    pub fn graph(&self, key: GraphKey) -> Option<&FeatureGraph> {
        self.graphs.get(&key)
    }

    /// Root node for `key`.
    #[must_use]
    pub fn root(&self, key: GraphKey) -> Option<&GroupRef> {
        self.graph(key).map(|graph| &graph.root)
    }

    /// Record of a canal sub-feature.
    #[must_use]
    pub const fn water_feature(&self, feature: CanalFeature) -> &WaterFeature {
        &self.water[feature.index()]
    }

    /// Mutable record of a canal sub-feature.
    pub fn water_feature_mut(&mut self, feature: CanalFeature) -> &mut WaterFeature {
        &mut self.water[feature.index()]
    }

    /// Number of installed graphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Whether no graph is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKind;
    use crate::group::SpriteGroup;

    #[test]
    fn insert_replaces_previous_graph() {
        let grf = Arc::new(GrfFile::new(0x4142_4344, "water.grf"));
        let mut content = ContentSet::new();
        let key = GraphKey::canal(CanalFeature::Locks);

        assert!(content.insert(key, grf.clone(), SpriteGroup::sprite(1, 1)).is_none());
        let previous = content.insert(key, grf, SpriteGroup::sprite(2, 1)).unwrap();
        assert_eq!(previous.root.result(), Some(1));
        assert_eq!(content.root(key).unwrap().result(), Some(2));
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn graphs_are_keyed_by_slot() {
        let grf = Arc::new(GrfFile::new(1, "a.grf"));
        let mut content = ContentSet::new();
        content.insert(GraphKey::canal(CanalFeature::Dikes), grf, SpriteGroup::sprite(1, 1));
        assert!(content.root(GraphKey::canal(CanalFeature::Buoy)).is_none());
        assert!(content.root(GraphKey::from(FeatureKind::Canals)).is_none());
    }

    #[test]
    fn water_features_start_without_callbacks() {
        let mut content = ContentSet::new();
        assert!(content.water_feature(CanalFeature::Docks).callback_mask.is_empty());
        content.water_feature_mut(CanalFeature::Docks).callback_mask = WaterCallbacks::SPRITE_OFFSET;
        assert!(content
            .water_feature(CanalFeature::Docks)
            .callback_mask
            .contains(WaterCallbacks::SPRITE_OFFSET));
    }

    #[test]
    fn rivers_use_their_own_record() {
        assert_eq!(edge_feature(WaterClass::River), CanalFeature::RiverEdge);
        assert_eq!(edge_feature(WaterClass::Canal), CanalFeature::Dikes);
    }
}
