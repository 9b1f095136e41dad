//! Text surface adapter.
//!
//! `TextSurface` owns the editable document and applies resolved characters,
//! paragraph breaks and backward deletions to it. Everything the document
//! cannot do on its own (focus, caret-movement availability, rich-text
//! formatting, the editable flag) goes through the [`SurfaceHost`] trait so
//! the adapter stays platform-agnostic.
//!
//! The adapter also owns the placeholder view state. While the view is on,
//! invisible markers live in the document as placeholder nodes; they are
//! collapsed back to raw markers for persistence without touching the view.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{self, Inline};
use crate::document::{Caret, Direction, EditableDocument, Granularity};
use crate::stats::Statistics;

/// Rich-text formatting commands delegated to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    /// Background highlight colour
    Highlight(String),
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    UnorderedList,
    OrderedList,
    /// Link target URL
    CreateLink(String),
    /// Image source (URL or data URI)
    InsertImage(String),
    FontName(String),
    /// Host size step, 1 through 7
    FontSize(u8),
}

impl FormatCommand {
    /// Yellow highlight, the toolbar default.
    pub fn highlight() -> Self {
        FormatCommand::Highlight("yellow".to_string())
    }

    /// Host command name.
    pub fn name(&self) -> &'static str {
        match self {
            FormatCommand::Bold => "bold",
            FormatCommand::Italic => "italic",
            FormatCommand::Underline => "underline",
            FormatCommand::StrikeThrough => "strikeThrough",
            FormatCommand::Highlight(_) => "backColor",
            FormatCommand::JustifyLeft => "justifyLeft",
            FormatCommand::JustifyCenter => "justifyCenter",
            FormatCommand::JustifyRight => "justifyRight",
            FormatCommand::JustifyFull => "justifyFull",
            FormatCommand::UnorderedList => "insertUnorderedList",
            FormatCommand::OrderedList => "insertOrderedList",
            FormatCommand::CreateLink(_) => "createLink",
            FormatCommand::InsertImage(_) => "insertImage",
            FormatCommand::FontName(_) => "fontName",
            FormatCommand::FontSize(_) => "fontSize",
        }
    }

    /// Host command argument, if the command takes one.
    pub fn value(&self) -> Option<String> {
        match self {
            FormatCommand::Highlight(v)
            | FormatCommand::CreateLink(v)
            | FormatCommand::InsertImage(v)
            | FormatCommand::FontName(v) => Some(v.clone()),
            FormatCommand::FontSize(size) => Some(size.to_string()),
            _ => None,
        }
    }

    /// Inverse of [`name`](Self::name) + [`value`](Self::value).
    ///
    /// Returns `None` for unknown names, for missing required values, and for
    /// font sizes outside 1..=7.
    pub fn parse(name: &str, value: Option<&str>) -> Option<Self> {
        let owned = || value.map(str::to_string);
        let command = match name {
            "bold" => FormatCommand::Bold,
            "italic" => FormatCommand::Italic,
            "underline" => FormatCommand::Underline,
            "strikeThrough" => FormatCommand::StrikeThrough,
            "backColor" => FormatCommand::Highlight(owned().unwrap_or_else(|| "yellow".into())),
            "justifyLeft" => FormatCommand::JustifyLeft,
            "justifyCenter" => FormatCommand::JustifyCenter,
            "justifyRight" => FormatCommand::JustifyRight,
            "justifyFull" => FormatCommand::JustifyFull,
            "insertUnorderedList" => FormatCommand::UnorderedList,
            "insertOrderedList" => FormatCommand::OrderedList,
            "createLink" => FormatCommand::CreateLink(owned()?),
            "insertImage" => FormatCommand::InsertImage(owned()?),
            "fontName" => FormatCommand::FontName(owned()?),
            "fontSize" => {
                let size: u8 = value?.parse().ok()?;
                if !(1..=7).contains(&size) {
                    return None;
                }
                FormatCommand::FontSize(size)
            }
            _ => return None,
        };
        Some(command)
    }
}

/// Inline formatting reported by the host at the caret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingAttributes {
    pub font_family: Option<String>,
    pub font_size: Option<String>,
}

/// Host primitives the surface depends on.
pub trait SurfaceHost {
    /// Whether the editable region currently has input focus.
    fn is_focused(&self) -> bool;

    /// Try to focus the editable region. Returns false if it cannot take
    /// focus (e.g. it is detached from the view tree).
    fn focus(&mut self) -> bool;

    /// Whether the host can move the caret by character/line.
    fn caret_movement_available(&self) -> bool {
        true
    }

    /// Execute a formatting command at the current selection.
    fn apply_command(&mut self, command: &FormatCommand);

    /// Font attributes at the caret.
    fn formatting_at_caret(&self) -> FormattingAttributes {
        FormattingAttributes::default()
    }

    /// Toggle whether the region accepts native editing.
    fn set_editable(&mut self, editable: bool);
}

/// In-process host with no view tree.
///
/// Records formatting commands and tracks the font attributes they set, so
/// tests and the demo binary can drive a surface without a real platform.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    attached: bool,
    focused: bool,
    editable: bool,
    caret_movement: bool,
    formatting: FormattingAttributes,
    commands: Vec<FormatCommand>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// Attached, unfocused, editable host with caret movement.
    pub fn new() -> Self {
        Self {
            attached: true,
            focused: false,
            editable: true,
            caret_movement: true,
            formatting: FormattingAttributes::default(),
            commands: Vec::new(),
        }
    }

    /// A host whose region can never take focus.
    pub fn detached() -> Self {
        Self { attached: false, ..Self::new() }
    }

    /// A host without a caret-movement primitive.
    pub fn without_caret_movement() -> Self {
        Self { caret_movement: false, ..Self::new() }
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
        if !attached {
            self.focused = false;
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Commands executed so far, oldest first.
    pub fn commands(&self) -> &[FormatCommand] {
        &self.commands
    }
}

impl SurfaceHost for HeadlessHost {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) -> bool {
        if self.attached {
            self.focused = true;
        }
        self.focused
    }

    fn caret_movement_available(&self) -> bool {
        self.caret_movement
    }

    fn apply_command(&mut self, command: &FormatCommand) {
        match command {
            FormatCommand::FontName(name) => self.formatting.font_family = Some(name.clone()),
            FormatCommand::FontSize(size) => self.formatting.font_size = Some(size.to_string()),
            _ => {}
        }
        self.commands.push(command.clone());
    }

    fn formatting_at_caret(&self) -> FormattingAttributes {
        self.formatting.clone()
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }
}

/// The editable surface: document, placeholder view and derived counts.
#[derive(Debug, Clone)]
pub struct TextSurface<H: SurfaceHost> {
    host: H,
    document: EditableDocument,
    show_invisibles: bool,
    stats: Statistics,
}

impl<H: SurfaceHost> TextSurface<H> {
    /// Blank surface with the placeholder view off.
    pub fn new(host: H) -> Self {
        Self {
            host,
            document: EditableDocument::new(),
            show_invisibles: false,
            stats: Statistics::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn document(&self) -> &EditableDocument {
        &self.document
    }

    pub fn show_invisibles(&self) -> bool {
        self.show_invisibles
    }

    /// Last computed counts.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Place a collapsed caret (as a click in the region would).
    pub fn set_caret(&mut self, caret: Caret) {
        self.document.set_caret(caret);
    }

    /// Select a unit range (as a drag in the region would).
    pub fn select_units(&mut self, start: usize, end: usize) {
        self.document.select_units(start, end);
    }

    /// Focus the region if it is not focused. False means input must be
    /// dropped.
    pub fn ensure_focus(&mut self) -> bool {
        if self.host.is_focused() || self.host.focus() {
            return true;
        }
        debug!("surface could not take focus, dropping input");
        false
    }

    /// Insert a resolved character (or string) at the caret, replacing any
    /// selection. Markers become placeholders while the view is on.
    pub fn insert_character(&mut self, text: &str) -> bool {
        if text.is_empty() || !self.ensure_focus() {
            return false;
        }
        if self.show_invisibles && codec::contains_marker(text) {
            self.document.insert_nodes(codec::expand_text(text));
        } else {
            self.document.insert_text(text);
        }
        trace!(text, "inserted");
        self.refresh_statistics();
        true
    }

    /// Split the paragraph at the caret.
    pub fn insert_paragraph_break(&mut self) -> bool {
        if !self.ensure_focus() {
            return false;
        }
        self.document.insert_paragraph();
        self.refresh_statistics();
        true
    }

    /// Backspace. A placeholder before the caret is removed as one unit;
    /// anything else gets the ordinary backward deletion.
    pub fn delete_backward(&mut self) -> bool {
        if !self.ensure_focus() {
            return false;
        }
        let deleted = match self.document.placeholder_before_caret() {
            Some((block, node)) => {
                trace!(block, node, "removing placeholder");
                self.document.remove_placeholder(block, node)
            }
            None => self.document.delete_backward(),
        };
        self.refresh_statistics();
        deleted
    }

    /// Switch the placeholder view. Returns whether the content changed;
    /// switching to the current state changes nothing.
    pub fn toggle_invisibles_view(&mut self, show: bool) -> bool {
        self.show_invisibles = show;
        let changed = if show {
            self.document.expand_markers()
        } else {
            self.document.collapse_placeholders()
        };
        debug!(show, changed, "invisibles view");
        self.ensure_focus();
        self.refresh_statistics();
        changed
    }

    /// Content in persisted form: placeholders always collapsed to raw
    /// markers, whatever the view state.
    pub fn serialize_for_persistence(&self) -> String {
        self.document.to_collapsed_markup()
    }

    /// Replace the content with a persisted fragment.
    ///
    /// Stray placeholder markup is collapsed first; the view is re-applied if
    /// it is on.
    pub fn load_content(&mut self, markup: &str) {
        let raw = codec::collapse_markup(markup);
        self.document = EditableDocument::from_markup(&raw);
        self.document.collapse_placeholders();
        if self.show_invisibles {
            self.document.expand_markers();
        }
        self.refresh_statistics();
    }

    /// Blank the content. The view state is kept.
    pub fn clear(&mut self) {
        self.document.clear();
        self.refresh_statistics();
    }

    /// Move the caret. A silent no-op if the host has no caret movement.
    pub fn move_caret(&mut self, direction: Direction, granularity: Granularity) -> bool {
        if !self.host.caret_movement_available() {
            trace!("caret movement unavailable");
            return false;
        }
        self.document.move_caret(direction, granularity);
        true
    }

    /// Delegate a formatting command to the host: focus first, counts after.
    pub fn apply_command(&mut self, command: &FormatCommand) {
        self.ensure_focus();
        debug!(command = command.name(), "format");
        self.host.apply_command(command);
        self.refresh_statistics();
    }

    pub fn formatting_at_caret(&self) -> FormattingAttributes {
        self.host.formatting_at_caret()
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.host.set_editable(editable);
    }

    /// Collapsed plain-text projection.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Recompute counts from the collapsed plain text.
    pub fn refresh_statistics(&mut self) -> Statistics {
        self.stats = Statistics::from_text(&self.document.plain_text());
        self.stats
    }

    /// Whether the node before the caret is a placeholder.
    pub fn caret_follows_placeholder(&self) -> bool {
        self.document.placeholder_before_caret().is_some()
    }

    /// Nodes of the first paragraph, for quick inspection.
    pub fn first_paragraph(&self) -> &[Inline] {
        self.document.blocks()[0].nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PLACEHOLDER_MARKUP;

    const Z: &str = "\u{200B}";

    fn surface() -> TextSurface<HeadlessHost> {
        TextSurface::new(HeadlessHost::new())
    }

    #[test]
    fn insert_focuses_first() {
        let mut s = surface();
        assert!(!s.host().is_focused());
        assert!(s.insert_character("ក"));
        assert!(s.host().is_focused());
        assert_eq!(s.plain_text(), "ក");
        assert_eq!(s.statistics().chars, 1);
    }

    #[test]
    fn detached_surface_drops_input() {
        let mut s = TextSurface::new(HeadlessHost::detached());
        assert!(!s.insert_character("ក"));
        assert!(!s.delete_backward());
        assert!(!s.insert_paragraph_break());
        assert_eq!(s.plain_text(), "");
    }

    #[test]
    fn marker_becomes_placeholder_when_view_is_on() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.insert_character("A");
        s.insert_character(Z);
        s.insert_character("B");
        assert_eq!(
            s.first_paragraph(),
            &[Inline::text("A"), Inline::Placeholder, Inline::text("B")]
        );
        assert_eq!(s.serialize_for_persistence(), format!("A{Z}B"));
        assert_eq!(s.plain_text(), format!("A{Z}B"));
    }

    #[test]
    fn marker_stays_raw_when_view_is_off() {
        let mut s = surface();
        s.insert_character(Z);
        assert_eq!(s.first_paragraph(), &[Inline::text(Z)]);
    }

    #[test]
    fn placeholder_is_deleted_in_one_backspace() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.insert_character("A");
        s.insert_character(Z);
        s.insert_character("B");
        // caret right after the placeholder, before B
        s.set_caret(Caret::Text { block: 0, node: 2, offset: 0 });
        assert!(s.caret_follows_placeholder());
        assert!(s.delete_backward());
        assert_eq!(s.plain_text(), "AB");
        assert_eq!(
            s.document().caret(),
            Caret::Text { block: 0, node: 0, offset: 1 }
        );
    }

    #[test]
    fn placeholder_at_end_is_deleted_in_one_backspace() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.insert_character("A");
        s.insert_character(Z);
        assert!(s.caret_follows_placeholder());
        s.delete_backward();
        assert_eq!(s.plain_text(), "A");
    }

    #[test]
    fn range_selection_uses_ordinary_delete() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.insert_character(&format!("A{Z}B{Z}C"));
        s.select_units(2, 4);
        assert!(!s.caret_follows_placeholder());
        s.delete_backward();
        assert_eq!(s.plain_text(), format!("A{Z}C"));
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut s = surface();
        s.insert_character(&format!("x{Z}y"));
        let before = s.serialize_for_persistence();

        assert!(s.toggle_invisibles_view(true));
        let expanded = s.document().clone();
        assert!(!s.toggle_invisibles_view(true));
        assert_eq!(s.document(), &expanded);

        assert!(s.toggle_invisibles_view(false));
        assert!(!s.toggle_invisibles_view(false));
        assert_eq!(s.serialize_for_persistence(), before);
    }

    #[test]
    fn load_reapplies_view() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.load_content(&format!("ក{Z}ខ<div>{PLACEHOLDER_MARKUP}</div>"));
        assert!(s.document().has_placeholders());
        assert_eq!(
            s.serialize_for_persistence(),
            format!("ក{Z}ខ<div>{Z}</div>")
        );

        s.toggle_invisibles_view(false);
        s.load_content(&format!("a{PLACEHOLDER_MARKUP}"));
        assert!(!s.document().has_placeholders());
        assert_eq!(s.plain_text(), format!("a{Z}"));
    }

    #[test]
    fn caret_movement_is_optional() {
        let mut s = TextSurface::new(HeadlessHost::without_caret_movement());
        s.insert_character("ab");
        assert!(!s.move_caret(Direction::Backward, Granularity::Character));
        assert_eq!(s.document().caret_offset(&s.document().caret()), 2);

        let mut s = surface();
        s.insert_character("ab");
        assert!(s.move_caret(Direction::Backward, Granularity::Character));
        assert_eq!(s.document().caret_offset(&s.document().caret()), 1);
    }

    #[test]
    fn commands_go_to_the_focused_host() {
        let mut s = surface();
        s.apply_command(&FormatCommand::Bold);
        s.apply_command(&FormatCommand::FontName("Battambang".into()));
        assert!(s.host().is_focused());
        assert_eq!(s.host().commands().len(), 2);
        assert_eq!(
            s.formatting_at_caret().font_family.as_deref(),
            Some("Battambang")
        );
    }

    #[test]
    fn command_names_round_trip() {
        let commands = [
            FormatCommand::Bold,
            FormatCommand::StrikeThrough,
            FormatCommand::highlight(),
            FormatCommand::JustifyFull,
            FormatCommand::OrderedList,
            FormatCommand::CreateLink("https://example.com".into()),
            FormatCommand::FontSize(3),
        ];
        for c in commands {
            let value = c.value();
            assert_eq!(FormatCommand::parse(c.name(), value.as_deref()), Some(c));
        }
        assert_eq!(FormatCommand::parse("fontSize", Some("9")), None);
        assert_eq!(FormatCommand::parse("createLink", None), None);
        assert_eq!(FormatCommand::parse("nope", None), None);
    }

    #[test]
    fn clear_keeps_view_state() {
        let mut s = surface();
        s.toggle_invisibles_view(true);
        s.insert_character("abc");
        s.clear();
        assert!(s.show_invisibles());
        assert_eq!(s.statistics(), Statistics::default());
    }
}
