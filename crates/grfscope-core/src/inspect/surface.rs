//! Render model and interaction state of inspector surfaces.
//!
//! Drawing is left to the host toolkit. This module produces the lines an
//! inspector shows ([`render`]), tracks per-surface interaction state
//! ([`InspectSurface`]) and the set of open surfaces ([`Inspectors`]).
//!
//! # Render order
//!
//! 1. Variables, resolved through the feature's helper; unavailable ones are
//!    left out
//! 2. Persistent storage, four slots per row
//! 3. Properties, read from the instance record
//! 4. Callbacks, enabled ones only; always-enabled ones are marked
//!    "(unmasked)"
//!
//! A section appears, with its header, only if the table declares entries
//! for it.

use std::collections::BTreeMap;
use std::fmt;

use crate::diagnostics::DiagnosticsSink;
use crate::error::{GrfError, Result};
use crate::feature::InspectTarget;
use crate::inspect::{
    FeatureTable, InspectView, PropertyType, VariableParams, PARAM_VARIABLE_FIRST,
};
use crate::world::cargo::CargoId;

/// Longest accepted parameter input, in hex digits.
pub const PROMPT_MAX_DIGITS: usize = 2;

// =============================================================================
// Lines
// =============================================================================

/// Section of an inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Computed variables.
    Variables,
    /// Persistent storage.
    PersistentStorage,
    /// Raw instance fields.
    Properties,
    /// Enabled callbacks.
    Callbacks,
}

/// One line of an inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectLine {
    /// Section header.
    Header(Section),
    /// A resolved variable; `param` is set for parameterised variables.
    Variable {
        /// Variable id.
        id: u8,
        /// Parameter used.
        param: Option<u8>,
        /// Value.
        value: u32,
        /// Display name.
        name: &'static str,
    },
    /// Four storage slots starting at `first`.
    Storage {
        /// Index of the first slot.
        first: usize,
        /// Slot values.
        slots: [i32; 4],
    },
    /// A property and its formatted value.
    Property {
        /// Property number.
        prop: u8,
        /// Formatted value.
        value: String,
        /// Display name.
        name: &'static str,
    },
    /// An enabled callback.
    Callback {
        /// Callback number.
        id: u16,
        /// Display name.
        name: &'static str,
        /// Whether the callback is always enabled.
        unmasked: bool,
    },
}

impl fmt::Display for InspectLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(Section::Variables) => f.write_str("Variables:"),
            Self::Header(Section::PersistentStorage) => f.write_str("Persistent storage:"),
            Self::Header(Section::Properties) => f.write_str("Properties:"),
            Self::Header(Section::Callbacks) => f.write_str("Callbacks:"),
            Self::Variable {
                id,
                param: Some(param),
                value,
                name,
            } => write!(f, "  {id:02x}[{param:02x}]: {value:08x} ({name})"),
            Self::Variable {
                id,
                param: None,
                value,
                name,
            } => write!(f, "  {id:02x}: {value:08x} ({name})"),
            Self::Storage { first, slots } => write!(
                f,
                "  {first}: {} {} {} {}",
                slots[0], slots[1], slots[2], slots[3]
            ),
            Self::Property { prop, value, name } => write!(f, "  {prop:02x}: {value} ({name})"),
            Self::Callback {
                id,
                name,
                unmasked: true,
            } => write!(f, "  {id:03x}: {name} (unmasked)"),
            Self::Callback { id, name, .. } => write!(f, "  {id:03x}: {name}"),
        }
    }
}

/// Renders the lines of the inspector for `target`.
///
/// # Errors
///
/// - [`GrfError::NotInspectable`] if the helper finds no instance record
/// - [`GrfError::MalformedDescriptor`] if any descriptor read fails
pub fn render(
    table: &FeatureTable,
    target: InspectTarget,
    view: InspectView<'_>,
    params: &VariableParams,
    diagnostics: &dyn DiagnosticsSink,
) -> Result<Vec<InspectLine>> {
    let (kind, index) = (target.kind(), target.index());
    let helper = &*table.helper;
    let instance = helper
        .instance(view, index)
        .ok_or(GrfError::NotInspectable(target))?;
    let mut lines = Vec::new();

    if !table.variables.is_empty() {
        lines.push(InspectLine::Header(Section::Variables));
        for variable in &table.variables {
            let param = variable.has_parameter().then(|| params.get(variable.id));
            let value = helper.resolve(view, index, variable.id, param.unwrap_or(0), diagnostics);
            if let Some(value) = value.get() {
                lines.push(InspectLine::Variable {
                    id: variable.id,
                    param,
                    value,
                    name: variable.name,
                });
            }
        }
    }

    if let Some(storage) = &table.storage {
        lines.push(InspectLine::Header(Section::PersistentStorage));
        let slots = storage.read(kind, &instance)?;
        for (row, chunk) in slots.chunks_exact(4).enumerate() {
            lines.push(InspectLine::Storage {
                first: row * 4,
                slots: [chunk[0], chunk[1], chunk[2], chunk[3]],
            });
        }
    }

    if !table.properties.is_empty() {
        lines.push(InspectLine::Header(Section::Properties));
        for property in &table.properties {
            let raw = property.read(kind, &instance)?;
            let value = match property.ty {
                PropertyType::Int => raw.to_string(),
                PropertyType::Cargo => u8::try_from(raw)
                    .ok()
                    .and_then(|id| view.world.cargo().name(CargoId(id)))
                    .unwrap_or("N/A")
                    .to_string(),
            };
            lines.push(InspectLine::Property {
                prop: property.prop,
                value,
                name: property.name,
            });
        }
    }

    if !table.callbacks.is_empty() {
        lines.push(InspectLine::Header(Section::Callbacks));
        let spec = helper.spec(view, index);
        for callback in &table.callbacks {
            let enabled = match (callback.bit, &spec) {
                (None, _) => true,
                (Some(_), Some(spec)) => callback.enabled(kind, spec)?,
                (Some(_), None) => false,
            };
            if enabled {
                lines.push(InspectLine::Callback {
                    id: callback.id,
                    name: callback.name,
                    unmasked: callback.bit.is_none(),
                });
            }
        }
    }

    Ok(lines)
}

// =============================================================================
// Surface
// =============================================================================

/// Interaction state of one open inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectSurface {
    target: InspectTarget,
    parent: Option<InspectTarget>,
    lines: Vec<InspectLine>,
    editing: Option<u8>,
    dirty: bool,
}

impl InspectSurface {
    /// Creates a surface that still needs rendering.
    #[must_use]
    pub const fn new(target: InspectTarget, parent: Option<InspectTarget>) -> Self {
        Self {
            target,
            parent,
            lines: Vec::new(),
            editing: None,
            dirty: true,
        }
    }

    /// Entity shown.
    #[must_use]
    pub const fn target(&self) -> InspectTarget {
        self.target
    }

    /// Whether the parent control is usable.
    #[must_use]
    pub const fn parent_enabled(&self) -> bool {
        self.parent.is_some()
    }

    /// Parent entity, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<InspectTarget> {
        self.parent
    }

    /// Lines of the last render.
    #[must_use]
    pub fn lines(&self) -> &[InspectLine] {
        &self.lines
    }

    /// Whether the surface must be rendered again.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Requests a new render.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Stores freshly rendered lines and clears the dirty flag.
    pub fn set_lines(&mut self, lines: Vec<InspectLine>) {
        self.lines = lines;
        self.dirty = false;
    }

    /// Variable whose parameter prompt is open.
    #[must_use]
    pub const fn editing(&self) -> Option<u8> {
        self.editing
    }

    /// Handles a click on rendered line `line`.
    ///
    /// Clicking a parameterised variable opens the parameter prompt for it
    /// and returns its id; any other line does nothing.
    pub fn click_line(&mut self, line: usize) -> Option<u8> {
        match self.lines.get(line)? {
            InspectLine::Variable {
                id, param: Some(_), ..
            } if *id >= PARAM_VARIABLE_FIRST => {
                self.editing = Some(*id);
                Some(*id)
            }
            _ => None,
        }
    }

    /// Completes the open prompt with `text`.
    ///
    /// Accepts one or two hex digits: the parameter is overwritten and the
    /// surface marked dirty. Empty, overlong or non-hex input leaves the
    /// parameter unchanged. The prompt is closed either way. Returns whether
    /// the parameter changed.
    pub fn finish_prompt(&mut self, text: &str, params: &mut VariableParams) -> bool {
        let Some(id) = self.editing.take() else {
            return false;
        };
        let Some(value) = parse_param(text) else {
            return false;
        };
        params.set(id, value);
        self.dirty = true;
        true
    }

    /// Closes the open prompt without changing anything.
    pub fn cancel_prompt(&mut self) {
        self.editing = None;
    }
}

fn parse_param(text: &str) -> Option<u8> {
    let valid = !text.is_empty()
        && text.len() <= PROMPT_MAX_DIGITS
        && text.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return None;
    }
    u8::from_str_radix(text, 16).ok()
}

// =============================================================================
// Open surfaces
// =============================================================================

/// Receives notice of surfaces opening and closing.
///
/// Displays derived from an inspected entity (e.g. a land information panel
/// that highlights inspected tiles) refresh themselves from here.
pub trait SurfaceHost: Send {
    /// A surface for `target` was closed.
    fn surface_closed(&mut self, target: InspectTarget);

    /// A surface for `target` was opened.
    fn surface_opened(&mut self, _target: InspectTarget) {}
}

/// Open inspector surfaces and the shared variable parameters.
#[derive(Default)]
pub struct Inspectors {
    surfaces: BTreeMap<InspectTarget, InspectSurface>,
    front: Option<InspectTarget>,
    params: VariableParams,
    host: Option<Box<dyn SurfaceHost>>,
}

impl fmt::Debug for Inspectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inspectors")
            .field("surfaces", &self.surfaces)
            .field("front", &self.front)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Inspectors {
    /// No surfaces open, all parameters zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the host notified of open/close.
    pub fn set_host(&mut self, host: Box<dyn SurfaceHost>) {
        self.host = Some(host);
    }

    /// Opens the surface for `target`, or brings an open one to the front.
    ///
    /// Returns true if a new surface was created.
    pub fn open(&mut self, target: InspectTarget, parent: Option<InspectTarget>) -> bool {
        self.front = Some(target);
        if self.surfaces.contains_key(&target) {
            return false;
        }
        self.surfaces.insert(target, InspectSurface::new(target, parent));
        if let Some(host) = &mut self.host {
            host.surface_opened(target);
        }
        true
    }

    /// Closes the surface for `target`. Returns false if none was open.
    pub fn close(&mut self, target: InspectTarget) -> bool {
        if self.surfaces.remove(&target).is_none() {
            return false;
        }
        if self.front == Some(target) {
            self.front = None;
        }
        if let Some(host) = &mut self.host {
            host.surface_closed(target);
        }
        true
    }

    /// Whether a surface for `target` is open.
    #[must_use]
    pub fn is_open(&self, target: InspectTarget) -> bool {
        self.surfaces.contains_key(&target)
    }

    /// Surface for `target`.
    #[must_use]
    pub fn surface(&self, target: InspectTarget) -> Option<&InspectSurface> {
        self.surfaces.get(&target)
    }

    /// Mutable surface for `target`.
    pub fn surface_mut(&mut self, target: InspectTarget) -> Option<&mut InspectSurface> {
        self.surfaces.get_mut(&target)
    }

    /// Most recently opened or raised surface.
    #[must_use]
    pub const fn front(&self) -> Option<InspectTarget> {
        self.front
    }

    /// Open targets in order.
    pub fn open_targets(&self) -> impl Iterator<Item = InspectTarget> + '_ {
        self.surfaces.keys().copied()
    }

    /// Number of open surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether no surface is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Shared variable parameters.
    #[must_use]
    pub const fn params(&self) -> &VariableParams {
        &self.params
    }

    /// Mutable variable parameters.
    pub fn params_mut(&mut self) -> &mut VariableParams {
        &mut self.params
    }

    /// Handles a click on line `line` of the surface for `target`.
    pub fn click_line(&mut self, target: InspectTarget, line: usize) -> Option<u8> {
        self.surfaces.get_mut(&target)?.click_line(line)
    }

    /// Completes the open prompt of the surface for `target`.
    pub fn finish_prompt(&mut self, target: InspectTarget, text: &str) -> bool {
        match self.surfaces.get_mut(&target) {
            Some(surface) => surface.finish_prompt(text, &mut self.params),
            None => false,
        }
    }

    /// Resets parameters and marks every surface dirty.
    pub fn reset(&mut self) {
        self.params.reset();
        for surface in self.surfaces.values_mut() {
            surface.cancel_prompt();
            surface.mark_dirty();
        }
    }
}
