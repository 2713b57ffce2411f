//! Error types for resolution and introspection.
//!
//! Only authoring defects and caller mistakes are errors. Conditions that the
//! engine recovers from locally are modelled elsewhere:
//!
//! - an unknown variable id is a [`Diagnostic`](crate::diagnostics::Diagnostic),
//!   and the variable is reported as unavailable;
//! - a graph that yields nothing is `None`, and callers fall back to the
//!   feature's default outcome.

use crate::feature::{FeatureKind, InspectTarget};

/// Errors raised by the engine.
#[derive(Debug, thiserror::Error)]
pub enum GrfError {
    /// A descriptor table is inconsistent with the records it describes.
    ///
    /// This is a table-authoring defect. It is reported at the point of use
    /// and is not expected to be recovered from at runtime.
    #[error("malformed descriptor '{name}' for {kind}: {reason}")]
    MalformedDescriptor {
        /// Feature whose table holds the descriptor.
        kind: FeatureKind,
        /// Descriptor name.
        name: &'static str,
        /// What is wrong with it.
        reason: DescriptorFault,
    },

    /// The target cannot be inspected (unregistered kind or invalid index).
    #[error("{0} is not inspectable")]
    NotInspectable(InspectTarget),

    /// A raw feature tag lies outside the dense range.
    #[error("unknown feature tag 0x{0:02X}")]
    UnknownFeature(u8),

    /// An entity index does not fit in 24 bits.
    #[error("index {0} does not fit in 24 bits")]
    IndexOutOfRange(u32),

    /// A configuration or scenario document failed to parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Map dimensions are zero or longer than
    /// [`MAX_MAP_EDGE`](crate::config::MAX_MAP_EDGE) on an edge.
    #[error("map of {width}x{height} tiles is out of bounds")]
    MapSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Reason a descriptor is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorFault {
    /// Field width outside {1, 2, 4} bytes.
    #[error("unsupported read width of {0} bytes")]
    UnsupportedWidth(u8),

    /// The accessor produced a field of a different width than declared.
    #[error("declared {declared} bytes but the field is {actual} bytes wide")]
    WidthMismatch {
        /// Width in the descriptor.
        declared: u8,
        /// Width of the field the accessor read.
        actual: u8,
    },

    /// The accessor does not apply to the record it was given.
    #[error("accessor applied to a foreign record")]
    ForeignRecord,

    /// Persistent storage slot count not divisible into rows of four.
    #[error("storage of {0} slots is not a multiple of 4")]
    StorageNotAligned(usize),

    /// Persistent storage shorter than its declared slot count.
    #[error("storage declares {declared} slots but holds {actual}")]
    StorageTooShort {
        /// Slots in the layout.
        declared: usize,
        /// Slots in the record.
        actual: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GrfError>;
