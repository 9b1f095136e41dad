//! Invisible-marker codec.
//!
//! The invisible marker (U+200B ZERO WIDTH SPACE) has two representations:
//!
//! - **Collapsed**: the raw character inside a text run. This is the only form
//!   that is ever persisted.
//! - **Expanded**: a non-editable, zero-width placeholder element, so the
//!   marker can be seen and deleted as one unit.
//!
//! `expand` and `collapse` convert between the two on inline node sequences;
//! `expand_markup` and `collapse_markup` do the same on serialized markup.
//! The contract is `collapse(expand(x)) == collapse(x)` for every `x`.

use once_cell::sync::Lazy;
use regex::Regex;

/// The invisible marker character.
pub const INVISIBLE_MARKER: char = '\u{200B}';

/// Class that tags placeholder elements.
pub const PLACEHOLDER_CLASS: &str = "invisible-zwsp";

/// Markup emitted for one placeholder.
pub const PLACEHOLDER_MARKUP: &str =
    r#"<span class="invisible-zwsp" contenteditable="false"></span>"#;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="invisible-zwsp"[^>]*></span>"#).expect("placeholder pattern")
});

/// Inline content node of an editable paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Run of plain text (collapsed markers included as raw characters)
    Text(String),
    /// Expanded invisible marker
    Placeholder,
    /// Opaque tag from host formatting (e.g. `<b>`, `</b>`), kept verbatim
    Markup(String),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Inline::Placeholder)
    }

    /// Length in caret units: chars for text, one for a placeholder, zero for markup.
    pub fn units(&self) -> usize {
        match self {
            Inline::Text(s) => s.chars().count(),
            Inline::Placeholder => 1,
            Inline::Markup(_) => 0,
        }
    }
}

/// True if `s` contains the raw marker.
pub fn contains_marker(s: &str) -> bool {
    s.contains(INVISIBLE_MARKER)
}

/// Split plain text into text runs and placeholders.
pub fn expand_text(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut run = String::new();
    for ch in text.chars() {
        if ch == INVISIBLE_MARKER {
            if !run.is_empty() {
                out.push(Inline::Text(std::mem::take(&mut run)));
            }
            out.push(Inline::Placeholder);
        } else {
            run.push(ch);
        }
    }
    if !run.is_empty() {
        out.push(Inline::Text(run));
    }
    out
}

/// Expand every raw marker in `nodes` into a placeholder.
pub fn expand(nodes: &[Inline]) -> Vec<Inline> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Inline::Text(s) if contains_marker(s) => out.extend(expand_text(s)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Collapse every placeholder back into exactly one raw marker, merging
/// adjacent text runs.
pub fn collapse(nodes: &[Inline]) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let piece = match node {
            Inline::Placeholder => INVISIBLE_MARKER.to_string(),
            Inline::Text(s) => s.clone(),
            Inline::Markup(m) => {
                out.push(Inline::Markup(m.clone()));
                continue;
            }
        };
        if piece.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(Inline::Text(prev)) => prev.push_str(&piece),
            _ => out.push(Inline::Text(piece)),
        }
    }
    out
}

/// Plain-text projection of `nodes` in collapsed form.
pub fn collapse_to_text(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text(s) => out.push_str(s),
            Inline::Placeholder => out.push(INVISIBLE_MARKER),
            Inline::Markup(_) => {}
        }
    }
    out
}

/// True if serialized markup already carries placeholder elements.
pub fn markup_has_placeholders(markup: &str) -> bool {
    markup.contains(PLACEHOLDER_CLASS)
}

/// Expand raw markers in serialized markup.
///
/// Skipped entirely when placeholders are already present, so applying it
/// twice never nests or doubles placeholders.
pub fn expand_markup(markup: &str) -> String {
    if markup_has_placeholders(markup) {
        return markup.to_string();
    }
    markup.replace(INVISIBLE_MARKER, PLACEHOLDER_MARKUP)
}

/// Collapse placeholder elements in serialized markup back to raw markers.
pub fn collapse_markup(markup: &str) -> String {
    let marker = INVISIBLE_MARKER.to_string();
    PLACEHOLDER_RE.replace_all(markup, marker.as_str()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z: &str = "\u{200B}";

    #[test]
    fn expand_text_splits_on_markers() {
        let nodes = expand_text(&format!("ក{Z}ខ{Z}{Z}"));
        assert_eq!(
            nodes,
            vec![
                Inline::text("ក"),
                Inline::Placeholder,
                Inline::text("ខ"),
                Inline::Placeholder,
                Inline::Placeholder,
            ]
        );
    }

    #[test]
    fn collapse_merges_runs() {
        let nodes = vec![
            Inline::text("A"),
            Inline::Placeholder,
            Inline::text("B"),
            Inline::Markup("<b>".into()),
            Inline::Placeholder,
        ];
        assert_eq!(
            collapse(&nodes),
            vec![
                Inline::text(format!("A{Z}B")),
                Inline::Markup("<b>".into()),
                Inline::text(Z),
            ]
        );
    }

    #[test]
    fn collapse_after_expand_is_identity_on_collapsed_input() {
        let samples = [
            String::new(),
            "plain".to_string(),
            format!("{Z}"),
            format!("{Z}{Z}ក{Z}"),
            format!("សួស្តី{Z}ពិភពលោក"),
        ];
        for s in samples {
            let collapsed = collapse(&[Inline::text(s.clone())]);
            assert_eq!(collapse(&expand(&collapsed)), collapsed, "sample {s:?}");
            assert_eq!(collapse_to_text(&expand_text(&s)), s);
        }
    }

    #[test]
    fn placeholder_counts_as_one_unit() {
        assert_eq!(Inline::Placeholder.units(), 1);
        assert_eq!(Inline::text("កា").units(), 2);
        assert_eq!(Inline::Markup("<i>".into()).units(), 0);
    }

    #[test]
    fn markup_round_trip() {
        let raw = format!("a{Z}b<div>{Z}</div>");
        let expanded = expand_markup(&raw);
        assert_eq!(
            expanded,
            format!("a{PLACEHOLDER_MARKUP}b<div>{PLACEHOLDER_MARKUP}</div>")
        );
        assert_eq!(collapse_markup(&expanded), raw);
    }

    #[test]
    fn markup_expand_is_skipped_when_already_expanded() {
        let expanded = format!("x{PLACEHOLDER_MARKUP}y");
        assert_eq!(expand_markup(&expanded), expanded);
        assert_eq!(expand_markup(&expand_markup(&format!("x{Z}y"))), expanded);
    }

    #[test]
    fn collapse_markup_is_noop_without_placeholders() {
        let raw = format!("<b>x</b>{Z}");
        assert_eq!(collapse_markup(&raw), raw);
        assert_eq!(collapse_markup(&collapse_markup(&raw)), raw);
    }

    #[test]
    fn collapse_markup_accepts_attribute_variants() {
        let span = r#"<span class="invisible-zwsp" contenteditable="false" data-x="1"></span>"#;
        assert_eq!(collapse_markup(&format!("a{span}b")), format!("a{Z}b"));
    }
}
