//! Editable document model.
//!
//! The document is a list of paragraphs ("blocks"), each an ordered sequence
//! of inline nodes (text runs, placeholders, opaque markup tags). Caret
//! positions mirror the positions a content-editable selection can report:
//! inside a text node at a char offset, between two children of a paragraph,
//! or inside a placeholder element at its start.
//!
//! Every position also has a linear *unit offset*: one unit per char, one per
//! placeholder, one per paragraph boundary, none for markup. Because a
//! placeholder and the raw marker it stands for are both one unit, offsets are
//! stable across the expanded/collapsed rewrite.

use unicode_segmentation::UnicodeSegmentation;

use crate::codec::{self, Inline};
use crate::markup;

/// A caret position in DOM-like terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    /// Inside text node `node` of paragraph `block`, `offset` chars in
    Text { block: usize, node: usize, offset: usize },
    /// Between children of paragraph `block`, before child `index`
    Between { block: usize, index: usize },
    /// Inside placeholder `node` at its start boundary
    InPlaceholder { block: usize, node: usize },
}

impl Caret {
    pub fn block(&self) -> usize {
        match *self {
            Caret::Text { block, .. }
            | Caret::Between { block, .. }
            | Caret::InPlaceholder { block, .. } => block,
        }
    }
}

/// Anchor/focus pair. Collapsed when both ends are at the same unit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Caret,
    pub focus: Caret,
}

impl Selection {
    pub fn caret(caret: Caret) -> Self {
        Self { anchor: caret, focus: caret }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Character,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    /// Stop before zero-width nodes sitting at the offset
    Before,
    /// Skip past zero-width nodes sitting at the offset
    After,
}

/// One paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    nodes: Vec<Inline>,
}

impl Block {
    pub fn new(nodes: Vec<Inline>) -> Self {
        let mut block = Self { nodes };
        block.normalize();
        block
    }

    pub fn nodes(&self) -> &[Inline] {
        &self.nodes
    }

    pub fn units(&self) -> usize {
        self.nodes.iter().map(Inline::units).sum()
    }

    fn prefix_units(&self, index: usize) -> usize {
        self.nodes[..index.min(self.nodes.len())]
            .iter()
            .map(Inline::units)
            .sum()
    }

    /// Drop empty text runs and merge adjacent ones.
    fn normalize(&mut self) {
        let mut out: Vec<Inline> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            match node {
                Inline::Text(s) if s.is_empty() => {}
                Inline::Text(s) => match out.last_mut() {
                    Some(Inline::Text(prev)) => prev.push_str(&s),
                    _ => out.push(Inline::Text(s)),
                },
                other => out.push(other),
            }
        }
        self.nodes = out;
    }

    fn caret_at(&self, block: usize, mut rest: usize) -> Caret {
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Inline::Text(s) => {
                    let len = s.chars().count();
                    if rest <= len {
                        return Caret::Text { block, node: i, offset: rest };
                    }
                    rest -= len;
                }
                Inline::Placeholder => {
                    if rest == 0 {
                        return Caret::Between { block, index: i };
                    }
                    rest -= 1;
                }
                Inline::Markup(_) => {}
            }
        }
        Caret::Between { block, index: self.nodes.len() }
    }

    fn plain_text(&self) -> String {
        codec::collapse_to_text(&self.nodes)
    }
}

impl AsRef<[Inline]> for Block {
    fn as_ref(&self) -> &[Inline] {
        &self.nodes
    }
}

fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

/// Width in chars of the last legacy grapheme cluster of `s`.
///
/// Legacy clusters keep a base consonant with its combining signs (e.g. `ត់`)
/// but split spacing vowels off, which is how a backspace should eat Khmer.
fn last_cluster_width(s: &str) -> usize {
    s.graphemes(false)
        .next_back()
        .map(|g| g.chars().count())
        .unwrap_or(0)
}

fn first_cluster_width(s: &str) -> usize {
    s.graphemes(false)
        .next()
        .map(|g| g.chars().count())
        .unwrap_or(0)
}

/// The editable document: paragraphs plus the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableDocument {
    blocks: Vec<Block>,
    selection: Selection,
}

impl Default for EditableDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableDocument {
    /// Blank document: one empty paragraph, caret at the start.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::default()],
            selection: Selection::caret(Caret::Between { block: 0, index: 0 }),
        }
    }

    /// Build from paragraphs; the caret is placed at the end.
    pub fn from_blocks(blocks: Vec<Vec<Inline>>) -> Self {
        let mut blocks: Vec<Block> = blocks.into_iter().map(Block::new).collect();
        if blocks.is_empty() {
            blocks.push(Block::default());
        }
        let mut doc = Self {
            blocks,
            selection: Selection::caret(Caret::Between { block: 0, index: 0 }),
        };
        doc.collapse_to_offset(doc.total_units());
        doc
    }

    /// Build from plain text; `\n` separates paragraphs. Markers stay raw.
    pub fn from_plain_text(text: &str) -> Self {
        Self::from_blocks(
            text.split('\n')
                .map(|line| vec![Inline::text(line)])
                .collect(),
        )
    }

    /// Build from a serialized fragment.
    pub fn from_markup(fragment: &str) -> Self {
        Self::from_blocks(markup::parse_fragment(fragment))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The focus end of the selection.
    pub fn caret(&self) -> Caret {
        self.selection.focus
    }

    pub fn is_collapsed(&self) -> bool {
        self.caret_offset(&self.selection.anchor) == self.caret_offset(&self.selection.focus)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1 && self.blocks[0].nodes.is_empty()
    }

    /// Total unit length, paragraph boundaries included.
    pub fn total_units(&self) -> usize {
        let inner: usize = self.blocks.iter().map(Block::units).sum();
        inner + self.blocks.len() - 1
    }

    fn block_start(&self, block: usize) -> usize {
        self.blocks[..block].iter().map(|b| b.units() + 1).sum()
    }

    /// Unit offset of a caret position.
    pub fn caret_offset(&self, caret: &Caret) -> usize {
        let block = caret.block().min(self.blocks.len() - 1);
        let b = &self.blocks[block];
        let local = match *caret {
            Caret::Text { node, offset, .. } => b.prefix_units(node) + offset,
            Caret::Between { index, .. } => b.prefix_units(index),
            Caret::InPlaceholder { node, .. } => b.prefix_units(node),
        };
        self.block_start(block) + local
    }

    /// Canonical caret for a unit offset (clamped to the document end).
    pub fn caret_at(&self, offset: usize) -> Caret {
        let (block, local) = self.locate(offset);
        self.blocks[block].caret_at(block, local)
    }

    fn locate(&self, offset: usize) -> (usize, usize) {
        let mut rest = offset.min(self.total_units());
        for (i, block) in self.blocks.iter().enumerate() {
            let len = block.units();
            if rest <= len {
                return (i, rest);
            }
            rest -= len + 1;
        }
        let last = self.blocks.len() - 1;
        (last, self.blocks[last].units())
    }

    fn is_valid(&self, caret: &Caret) -> bool {
        let Some(block) = self.blocks.get(caret.block()) else {
            return false;
        };
        match *caret {
            Caret::Text { node, offset, .. } => matches!(
                block.nodes.get(node),
                Some(Inline::Text(s)) if offset <= s.chars().count()
            ),
            Caret::Between { index, .. } => index <= block.nodes.len(),
            Caret::InPlaceholder { node, .. } => {
                matches!(block.nodes.get(node), Some(Inline::Placeholder))
            }
        }
    }

    /// Place a collapsed caret. Invalid positions fall back to the end.
    pub fn set_caret(&mut self, caret: Caret) {
        let caret = if self.is_valid(&caret) {
            caret
        } else {
            self.caret_at(self.total_units())
        };
        self.selection = Selection::caret(caret);
    }

    /// Select the unit range `[start, end)`.
    pub fn select_units(&mut self, start: usize, end: usize) {
        let anchor = self.caret_at(start);
        let focus = self.caret_at(end);
        self.selection = Selection { anchor, focus };
    }

    fn collapse_to_offset(&mut self, offset: usize) {
        self.selection = Selection::caret(self.caret_at(offset));
    }

    fn selection_offsets(&self) -> (usize, usize) {
        let a = self.caret_offset(&self.selection.anchor);
        let f = self.caret_offset(&self.selection.focus);
        (a.min(f), a.max(f))
    }

    /// Collapsed plain-text projection, paragraphs joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize the live view (placeholders included when expanded).
    pub fn to_markup(&self) -> String {
        markup::render_fragment(&self.blocks)
    }

    /// Serialize with every placeholder collapsed, without touching the view.
    pub fn to_collapsed_markup(&self) -> String {
        let collapsed: Vec<Vec<Inline>> = self
            .blocks
            .iter()
            .map(|b| codec::collapse(&b.nodes))
            .collect();
        markup::render_fragment(&collapsed)
    }

    pub fn has_placeholders(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| b.nodes.iter().any(Inline::is_placeholder))
    }

    /// Reset to a blank document.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ---------- structural edits ----------

    /// Split so that a node boundary sits at `offset`; returns the paragraph
    /// and child index of that boundary.
    fn split_at(&mut self, offset: usize, bias: Bias) -> (usize, usize) {
        let (block, mut local) = self.locate(offset);
        let nodes = &mut self.blocks[block].nodes;
        let mut i = 0;
        while i < nodes.len() {
            let len = nodes[i].units();
            if local == 0 && (bias == Bias::Before || len > 0) {
                return (block, i);
            }
            if local > 0 && local < len {
                if let Inline::Text(s) = &mut nodes[i] {
                    let right = s.split_off(byte_index(s, local));
                    nodes.insert(i + 1, Inline::Text(right));
                    return (block, i + 1);
                }
            }
            local -= len.min(local);
            i += 1;
        }
        (block, nodes.len())
    }

    /// Child index where new nodes go for `caret`, splitting a text node if
    /// the caret is inside one.
    fn insertion_index(&mut self, caret: &Caret) -> (usize, usize) {
        match *caret {
            Caret::Text { block, node, offset } => {
                let nodes = &mut self.blocks[block].nodes;
                let count = nodes.len();
                let Some(Inline::Text(s)) = nodes.get_mut(node) else {
                    return (block, node.min(count));
                };
                let len = s.chars().count();
                if offset == 0 {
                    (block, node)
                } else if offset >= len {
                    (block, node + 1)
                } else {
                    let right = s.split_off(byte_index(s, offset));
                    nodes.insert(node + 1, Inline::Text(right));
                    (block, node + 1)
                }
            }
            Caret::Between { block, index } => {
                (block, index.min(self.blocks[block].nodes.len()))
            }
            Caret::InPlaceholder { block, node } => (block, node),
        }
    }

    /// Remove the unit range `[start, end)`, joining paragraphs it spans.
    fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (sb, si) = self.split_at(start, Bias::After);
        let (eb, ei) = self.split_at(end, Bias::Before);
        if sb == eb {
            self.blocks[sb].nodes.drain(si..ei.max(si));
        } else {
            let tail = self.blocks[eb].nodes.split_off(ei);
            self.blocks[sb].nodes.truncate(si);
            self.blocks.drain(sb + 1..=eb);
            self.blocks[sb].nodes.extend(tail);
        }
        self.blocks[sb].normalize();
    }

    /// Delete a non-collapsed selection. Returns false if it was collapsed.
    pub fn delete_selection(&mut self) -> bool {
        let (start, end) = self.selection_offsets();
        if start == end {
            return false;
        }
        self.delete_range(start, end);
        self.collapse_to_offset(start);
        true
    }

    /// Insert nodes at the caret, replacing any selection. The caret ends up
    /// after the inserted content.
    pub fn insert_nodes(&mut self, nodes: Vec<Inline>) {
        self.delete_selection();
        let caret = self.caret();
        let start = self.caret_offset(&caret);
        let inserted: usize = nodes.iter().map(Inline::units).sum();
        let (block, index) = self.insertion_index(&caret);
        let target = &mut self.blocks[block];
        target.nodes.splice(index..index, nodes);
        target.normalize();
        self.collapse_to_offset(start + inserted);
    }

    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.insert_nodes(vec![Inline::text(text)]);
    }

    /// Split the paragraph at the caret.
    pub fn insert_paragraph(&mut self) {
        self.delete_selection();
        let caret = self.caret();
        let start = self.caret_offset(&caret);
        let (block, index) = self.insertion_index(&caret);
        let tail = self.blocks[block].nodes.split_off(index);
        self.blocks[block].normalize();
        self.blocks.insert(block + 1, Block::new(tail));
        self.collapse_to_offset(start + 1);
    }

    /// Ordinary backward deletion: the selection if any, else one legacy
    /// grapheme cluster, one placeholder, or the paragraph boundary before
    /// the caret. Returns false at the document start.
    pub fn delete_backward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let offset = self.caret_offset(&self.caret());
        if offset == 0 {
            return false;
        }
        let (block, local) = self.locate(offset);
        let width = if local == 0 {
            1
        } else {
            self.width_before(block, local)
        };
        self.delete_range(offset - width, offset);
        self.collapse_to_offset(offset - width);
        true
    }

    /// Width of the unit cluster ending at `local` in paragraph `block`.
    fn width_before(&self, block: usize, local: usize) -> usize {
        let mut acc = 0;
        for node in &self.blocks[block].nodes {
            let len = node.units();
            if len > 0 && acc < local && local <= acc + len {
                return match node {
                    Inline::Text(s) => {
                        let prefix = &s[..byte_index(s, local - acc)];
                        last_cluster_width(prefix).max(1)
                    }
                    _ => 1,
                };
            }
            acc += len;
        }
        1
    }

    /// Width of the unit cluster starting at `local` in paragraph `block`.
    fn width_after(&self, block: usize, local: usize) -> usize {
        let mut acc = 0;
        for node in &self.blocks[block].nodes {
            let len = node.units();
            if len > 0 && acc <= local && local < acc + len {
                return match node {
                    Inline::Text(s) => {
                        let suffix = &s[byte_index(s, local - acc)..];
                        first_cluster_width(suffix).max(1)
                    }
                    _ => 1,
                };
            }
            acc += len;
        }
        1
    }

    /// Placeholder that a backspace at the caret should remove as a unit.
    ///
    /// Matches a caret inside a placeholder at its start, a caret at offset 0
    /// of a text node right after a placeholder, and a caret between children
    /// right after a placeholder. Never matches a non-collapsed selection.
    pub fn placeholder_before_caret(&self) -> Option<(usize, usize)> {
        if !self.is_collapsed() {
            return None;
        }
        let caret = self.caret();
        let nodes = &self.blocks.get(caret.block())?.nodes;
        let candidate = match caret {
            Caret::InPlaceholder { block, node } => Some((block, node)),
            Caret::Text { block, node, offset: 0 } => {
                node.checked_sub(1).map(|prev| (block, prev))
            }
            Caret::Between { block, index } => index.checked_sub(1).map(|prev| (block, prev)),
            Caret::Text { .. } => None,
        };
        candidate.filter(|&(_, n)| matches!(nodes.get(n), Some(Inline::Placeholder)))
    }

    /// Remove placeholder `node` of paragraph `block` and put the caret right
    /// after its previous sibling, or at the paragraph start if it had none.
    pub fn remove_placeholder(&mut self, block: usize, node: usize) -> bool {
        let Some(b) = self.blocks.get_mut(block) else {
            return false;
        };
        if !matches!(b.nodes.get(node), Some(Inline::Placeholder)) {
            return false;
        }
        b.nodes.remove(node);
        let caret = match node.checked_sub(1) {
            Some(prev) => match &b.nodes[prev] {
                Inline::Text(s) => Caret::Text { block, node: prev, offset: s.chars().count() },
                _ => Caret::Between { block, index: prev + 1 },
            },
            None => Caret::Between { block, index: 0 },
        };
        // Only `prev` and its new right neighbour can merge, so `caret` stays valid.
        b.normalize();
        self.selection = Selection::caret(caret);
        true
    }

    /// Rewrite raw markers into placeholders. Skipped if any placeholder is
    /// already present. Returns whether anything changed.
    pub fn expand_markers(&mut self) -> bool {
        if self.has_placeholders() {
            return false;
        }
        self.rewrite(codec::expand)
    }

    /// Rewrite placeholders back into raw markers. Returns whether anything
    /// changed.
    pub fn collapse_placeholders(&mut self) -> bool {
        if !self.has_placeholders() {
            return false;
        }
        self.rewrite(codec::collapse)
    }

    fn rewrite(&mut self, f: fn(&[Inline]) -> Vec<Inline>) -> bool {
        let anchor = self.caret_offset(&self.selection.anchor);
        let focus = self.caret_offset(&self.selection.focus);
        let mut changed = false;
        for block in &mut self.blocks {
            let next = Block::new(f(&block.nodes));
            if next != *block {
                *block = next;
                changed = true;
            }
        }
        if changed {
            self.selection = Selection {
                anchor: self.caret_at(anchor),
                focus: self.caret_at(focus),
            };
        }
        changed
    }

    /// Move the caret, collapsing any selection at its focus first.
    pub fn move_caret(&mut self, direction: Direction, granularity: Granularity) {
        let offset = self.caret_offset(&self.caret());
        let target = match granularity {
            Granularity::Character => self.step_character(offset, direction),
            Granularity::Line => self.step_line(offset, direction),
        };
        self.collapse_to_offset(target);
    }

    fn step_character(&self, offset: usize, direction: Direction) -> usize {
        let (block, local) = self.locate(offset);
        match direction {
            Direction::Backward if offset == 0 => 0,
            Direction::Backward if local == 0 => offset - 1,
            Direction::Backward => offset - self.width_before(block, local),
            Direction::Forward if offset >= self.total_units() => offset,
            Direction::Forward if local == self.blocks[block].units() => offset + 1,
            Direction::Forward => offset + self.width_after(block, local),
        }
    }

    fn step_line(&self, offset: usize, direction: Direction) -> usize {
        let (block, local) = self.locate(offset);
        let target = match direction {
            Direction::Backward => block.checked_sub(1),
            Direction::Forward => Some(block + 1).filter(|&b| b < self.blocks.len()),
        };
        match (target, direction) {
            (Some(b), _) => self.block_start(b) + local.min(self.blocks[b].units()),
            (None, Direction::Backward) => 0,
            (None, Direction::Forward) => self.total_units(),
        }
    }
}
