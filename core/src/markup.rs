//! Serialized fragment form of the editable document.
//!
//! The persisted document body is an HTML-like fragment in the shape a
//! content-editable region produces: the first paragraph is bare inline
//! content, every following paragraph is wrapped in `<div>…</div>`, and an
//! empty following paragraph is `<div><br></div>`. Placeholder spans are
//! recognised by tag and class. Any other tag is kept verbatim as an opaque
//! markup node so formatting applied by the host survives a load/save cycle.

use crate::codec::{Inline, PLACEHOLDER_CLASS, PLACEHOLDER_MARKUP};

const EMPTY_PARAGRAPH: &str = "<div><br></div>";

/// Render paragraphs of inline nodes as a fragment.
pub fn render_fragment<B: AsRef<[Inline]>>(blocks: &[B]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        let nodes = block.as_ref();
        if i == 0 {
            render_inline(nodes, &mut out);
        } else if nodes.is_empty() {
            out.push_str(EMPTY_PARAGRAPH);
        } else {
            out.push_str("<div>");
            render_inline(nodes, &mut out);
            out.push_str("</div>");
        }
    }
    out
}

fn render_inline(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(s) => escape_into(s, out),
            Inline::Placeholder => out.push_str(PLACEHOLDER_MARKUP),
            Inline::Markup(m) => out.push_str(m),
        }
    }
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Parse a fragment into paragraphs of inline nodes.
///
/// Always returns at least one paragraph. Text nodes are not merged here;
/// the document normalizes its blocks after loading.
pub fn parse_fragment(markup: &str) -> Vec<Vec<Inline>> {
    let mut parser = FragmentParser::default();
    let mut rest = markup;

    while !rest.is_empty() {
        if rest.starts_with('<') {
            if let Some(end) = rest.find('>') {
                let tag = &rest[..=end];
                rest = &rest[end + 1..];
                parser.tag(tag, rest);
                continue;
            }
            // Unterminated tag: keep the remainder as text.
            parser.text.push_str(rest);
            break;
        }
        let next = rest.find('<').unwrap_or(rest.len());
        parser.text.push_str(&rest[..next]);
        rest = &rest[next..];
    }

    parser.finish()
}

struct FragmentParser {
    blocks: Vec<Vec<Inline>>,
    text: String,
    /// Nesting depth inside the current top-level `<div>`
    depth: usize,
    /// Inside a placeholder span, skipping until its close tag
    in_placeholder: bool,
}

impl Default for FragmentParser {
    fn default() -> Self {
        Self {
            blocks: vec![Vec::new()],
            text: String::new(),
            depth: 0,
            in_placeholder: false,
        }
    }
}

impl FragmentParser {
    fn current(&mut self) -> &mut Vec<Inline> {
        // blocks is never empty
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let decoded = decode_entities(&std::mem::take(&mut self.text));
        if !self.in_placeholder && !decoded.is_empty() {
            self.current().push(Inline::Text(decoded));
        }
    }

    fn tag(&mut self, tag: &str, rest: &str) {
        self.flush_text();
        let closing = tag.starts_with("</");
        let name = tag_name(tag);

        if self.in_placeholder {
            if closing && name == "span" {
                self.in_placeholder = false;
            }
            return;
        }

        if name == "span" && !closing && has_class(tag, PLACEHOLDER_CLASS) {
            self.current().push(Inline::Placeholder);
            self.in_placeholder = !tag.ends_with("/>");
            return;
        }

        if name == "div" {
            match (closing, self.depth) {
                (false, 0) => {
                    self.blocks.push(Vec::new());
                    self.depth = 1;
                    return;
                }
                (true, 1) => {
                    self.depth = 0;
                    return;
                }
                (false, _) => self.depth += 1,
                (true, d) if d > 1 => self.depth -= 1,
                _ => {}
            }
        }

        if name == "br" && self.depth == 1 && self.current().is_empty() && rest.starts_with("</div>")
        {
            // Empty-paragraph filler.
            return;
        }

        self.current().push(Inline::Markup(tag.to_string()));
    }

    fn finish(mut self) -> Vec<Vec<Inline>> {
        self.flush_text();
        self.blocks
    }
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn has_class(tag: &str, class: &str) -> bool {
    let Some(pos) = tag.find("class=") else {
        return false;
    };
    let value = &tag[pos + "class=".len()..];
    let mut chars = value.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return false,
    };
    let body = &value[1..];
    let end = body.find(quote).unwrap_or(body.len());
    body[..end].split_whitespace().any(|c| c == class)
}

/// Decode the entities a content-editable region emits.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            decode_entity(entity).map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
