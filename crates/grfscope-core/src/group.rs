//! Content-defined decision graphs ("sprite groups").
//!
//! A graph is a tree of [`SpriteGroup`] nodes shared through [`Arc`]. Inner
//! nodes select a child by evaluating entity state through a
//! [`FeatureResolver`](crate::resolver::FeatureResolver); leaves carry the
//! outcome. The structure is produced by an external content decoder; this
//! module only fixes the node shapes the walker understands.
//!
//! # Example
//!
//! ```
//! use grfscope_core::group::{RealGroup, SpriteGroup};
//!
//! let summer = SpriteGroup::sprite(4000, 1);
//! let winter = SpriteGroup::sprite(4100, 1);
//! let root = SpriteGroup::real(RealGroup::new().loading(winter).loaded(summer));
//!
//! assert!(matches!(&*root, SpriteGroup::Real(real) if real.candidates.len() == 2));
//! ```

use std::sync::Arc;

/// Shared reference to a graph node.
pub type GroupRef = Arc<SpriteGroup>;

/// A content file: identity plus the parameters the user configured for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrfFile {
    /// Content identifier.
    pub grfid: u32,
    /// File name, for display.
    pub filename: String,
    /// User-configured parameters.
    pub params: Vec<u32>,
}

impl GrfFile {
    /// Creates a file reference without parameters.
    #[must_use]
    pub fn new(grfid: u32, filename: impl Into<String>) -> Self {
        Self {
            grfid,
            filename: filename.into(),
            params: Vec::new(),
        }
    }

    /// Parameter `n`, zero when not configured.
    #[must_use]
    pub fn param(&self, n: u8) -> u32 {
        self.params.get(usize::from(n)).copied().unwrap_or(0)
    }
}

/// One node of a decision graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteGroup {
    /// Terminal choice among loaded and loading variants.
    Real(RealGroup),
    /// Selection by the value of a variable.
    Deterministic(DeterministicGroup),
    /// Selection by the entity's random bits.
    Randomized(RandomizedGroup),
    /// A sprite outcome.
    Result(ResultGroup),
    /// A callback answer.
    CallbackResult(CallbackResultGroup),
}

impl SpriteGroup {
    /// Sprite leaf.
    #[must_use]
    pub fn sprite(sprite: u32, num_sprites: u8) -> GroupRef {
        Arc::new(Self::Result(ResultGroup { sprite, num_sprites }))
    }

    /// Callback leaf. Only the low 15 bits are kept.
    #[must_use]
    pub fn callback(result: u16) -> GroupRef {
        Arc::new(Self::CallbackResult(CallbackResultGroup {
            result: result & 0x7FFF,
        }))
    }

    /// Real node.
    #[must_use]
    pub fn real(group: RealGroup) -> GroupRef {
        Arc::new(Self::Real(group))
    }

    /// Deterministic node.
    #[must_use]
    pub fn deterministic(group: DeterministicGroup) -> GroupRef {
        Arc::new(Self::Deterministic(group))
    }

    /// Randomized node.
    #[must_use]
    pub fn randomized(group: RandomizedGroup) -> GroupRef {
        Arc::new(Self::Randomized(group))
    }

    /// Numeric outcome of a leaf; `None` for inner nodes.
    #[must_use]
    pub const fn result(&self) -> Option<u32> {
        match self {
            Self::Result(group) => Some(group.sprite),
            Self::CallbackResult(group) => Some(group.result as u32),
            _ => None,
        }
    }

    /// Callback answer of a callback leaf.
    #[must_use]
    pub const fn callback_result(&self) -> Option<u16> {
        match self {
            Self::CallbackResult(group) => Some(group.result),
            _ => None,
        }
    }
}

/// Whether a real-group candidate is the finished or the in-progress variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Regular variant.
    Loaded,
    /// Preview variant shown while loading.
    Loading,
}

/// One candidate of a [`RealGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Loaded or loading.
    pub state: LoadState,
    /// Node to continue with when chosen.
    pub group: GroupRef,
}

/// Terminal node offering ordered candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealGroup {
    /// Candidates in content order.
    pub candidates: Vec<Candidate>,
}

impl RealGroup {
    /// Empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loaded candidate.
    #[must_use]
    pub fn loaded(mut self, group: GroupRef) -> Self {
        self.candidates.push(Candidate {
            state: LoadState::Loaded,
            group,
        });
        self
    }

    /// Appends a loading candidate.
    #[must_use]
    pub fn loading(mut self, group: GroupRef) -> Self {
        self.candidates.push(Candidate {
            state: LoadState::Loading,
            group,
        });
        self
    }

    /// Loaded candidates in order.
    pub fn loaded_candidates(&self) -> impl Iterator<Item = &GroupRef> {
        self.candidates
            .iter()
            .filter(|candidate| candidate.state == LoadState::Loaded)
            .map(|candidate| &candidate.group)
    }
}

/// Inclusive value range mapped to a child node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    /// Lowest matching value.
    pub low: u32,
    /// Highest matching value.
    pub high: u32,
    /// Child for matching values.
    pub group: GroupRef,
}

/// Inner node that switches on `(variable >> shift) & mask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterministicGroup {
    /// Variable id to evaluate.
    pub variable: u8,
    /// Parameter for variables 0x60..0x7F.
    pub parameter: u8,
    /// Right shift applied to the value.
    pub shift: u8,
    /// Mask applied after shifting.
    pub mask: u32,
    /// Ranges tried in order.
    pub ranges: Vec<Range>,
    /// Child when no range matches or the variable is unavailable.
    pub default: Option<GroupRef>,
}

impl DeterministicGroup {
    /// Switch on `variable` with no shift and a full mask.
    #[must_use]
    pub fn on(variable: u8) -> Self {
        Self {
            variable,
            parameter: 0,
            shift: 0,
            mask: u32::MAX,
            ranges: Vec::new(),
            default: None,
        }
    }

    /// Sets the variable parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: u8) -> Self {
        self.parameter = parameter;
        self
    }

    /// Sets shift and mask.
    #[must_use]
    pub fn with_adjust(mut self, shift: u8, mask: u32) -> Self {
        self.shift = shift;
        self.mask = mask;
        self
    }

    /// Appends an inclusive range.
    #[must_use]
    pub fn range(mut self, low: u32, high: u32, group: GroupRef) -> Self {
        self.ranges.push(Range { low, high, group });
        self
    }

    /// Sets the default child.
    #[must_use]
    pub fn otherwise(mut self, group: GroupRef) -> Self {
        self.default = Some(group);
        self
    }

    /// Applies shift and mask to a raw variable value.
    #[must_use]
    pub fn adjust(&self, value: u32) -> u32 {
        value.checked_shr(u32::from(self.shift)).unwrap_or(0) & self.mask
    }

    /// Child for an adjusted value.
    #[must_use]
    pub fn select(&self, value: u32) -> Option<&GroupRef> {
        self.ranges
            .iter()
            .find(|range| (range.low..=range.high).contains(&value))
            .map(|range| &range.group)
            .or(self.default.as_ref())
    }
}

/// How a randomized node matches waiting triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TriggerMode {
    /// Any of the node's triggers suffices.
    #[default]
    Any,
    /// All of the node's triggers must be waiting.
    All,
}

/// Inner node that picks a child from the entity's random bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomizedGroup {
    /// Triggers that rerandomise the bits this node uses.
    pub triggers: u8,
    /// Trigger matching mode.
    pub mode: TriggerMode,
    /// Lowest random bit used for selection.
    pub lowest_bit: u8,
    /// Children; the length is a power of two.
    pub groups: Vec<GroupRef>,
}

impl RandomizedGroup {
    /// Mask of the random bits this node consumes, unshifted.
    #[must_use]
    pub fn mask(&self) -> u32 {
        u32::try_from(self.groups.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Whether the waiting `triggers` fire this node.
    #[must_use]
    pub const fn triggered_by(&self, triggers: u32) -> bool {
        let own = self.triggers as u32;
        if own == 0 {
            return false;
        }
        match self.mode {
            TriggerMode::Any => triggers & own != 0,
            TriggerMode::All => triggers & own == own,
        }
    }
}

/// Sprite leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultGroup {
    /// First sprite.
    pub sprite: u32,
    /// Number of sprites in the set.
    pub num_sprites: u8,
}

/// Callback leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackResultGroup {
    /// 15-bit callback answer.
    pub result: u16,
}
