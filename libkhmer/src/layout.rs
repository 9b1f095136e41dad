//! Khmer (NiDA-style) keyboard layout.
//!
//! Five rows on a 30-column grid; regular keys are two columns wide. Each
//! character key carries the Latin pair (`english`/`english_shift`) and the
//! Khmer base/shift/AltGr variants. Space types U+200B in Khmer mode, the
//! conventional word separator, and a real space with Shift.

use libkhmer_core::{KeyDescriptor, KeyKind, LayoutError, LayoutTable};

fn ch(code: &str, en: &str, en_shift: &str, km: &str, km_shift: &str, km_alt: &str) -> KeyDescriptor {
    KeyDescriptor::character(code, km, km_shift, km_alt, en, en_shift)
}

fn action(code: &str, label: &str, width: u8) -> KeyDescriptor {
    KeyDescriptor::structural(code, label, KeyKind::Action).with_width(width)
}

fn modifier(code: &str, label: &str, width: u8) -> KeyDescriptor {
    KeyDescriptor::structural(code, label, KeyKind::Modifier).with_width(width)
}

/// Layout rows, top to bottom.
pub fn khmer_layout_rows() -> Vec<Vec<KeyDescriptor>> {
    vec![
        // Number row: 13 * 2 + 4
        vec![
            ch("Backquote", "`", "~", "«", "»", "\u{200D}"),
            ch("Digit1", "1", "!", "១", "!", "\u{200C}"),
            ch("Digit2", "2", "@", "២", "ៗ", "@"),
            ch("Digit3", "3", "#", "៣", "\"", "៑"),
            ch("Digit4", "4", "$", "៤", "៛", "$"),
            ch("Digit5", "5", "%", "៥", "%", "€"),
            ch("Digit6", "6", "^", "៦", "៍", "៙"),
            ch("Digit7", "7", "&", "៧", "័", "៚"),
            ch("Digit8", "8", "*", "៨", "៏", "*"),
            ch("Digit9", "9", "(", "៩", "(", "{"),
            ch("Digit0", "0", ")", "០", ")", "}"),
            ch("Minus", "-", "_", "ឥ", "៌", "×"),
            ch("Equal", "=", "+", "ឲ", "=", "៎"),
            action("Backspace", "Backspace", 4),
        ],
        // Top letter row: 3 + 12 * 2 + 3
        vec![
            action("Tab", "Tab", 3),
            ch("KeyQ", "Q", "Q", "ឆ", "ឈ", ""),
            ch("KeyW", "W", "W", "ឹ", "ឺ", ""),
            ch("KeyE", "E", "E", "េ", "ែ", "ឯ"),
            ch("KeyR", "R", "R", "រ", "ឬ", "ឫ"),
            ch("KeyT", "T", "T", "ត", "ទ", ""),
            ch("KeyY", "Y", "Y", "យ", "ួ", ""),
            ch("KeyU", "U", "U", "ុ", "ូ", ""),
            ch("KeyI", "I", "I", "ិ", "ី", "ឦ"),
            ch("KeyO", "O", "O", "ោ", "ៅ", "ឱ"),
            ch("KeyP", "P", "P", "ផ", "ភ", "ឰ"),
            ch("BracketLeft", "[", "{", "ៀ", "ឿ", "ឩ"),
            ch("BracketRight", "]", "}", "ឪ", "ឧ", "ឳ"),
            ch("Backslash", "\\", "|", "ឮ", "ឭ", "\\").with_width(3),
        ],
        // Home row: 4 + 11 * 2 + 4
        vec![
            action("CapsLock", "Caps Lock", 4),
            ch("KeyA", "A", "A", "ា", "ាំ", ""),
            ch("KeyS", "S", "S", "ស", "ៃ", ""),
            ch("KeyD", "D", "D", "ដ", "ឌ", ""),
            ch("KeyF", "F", "F", "ថ", "ធ", ""),
            ch("KeyG", "G", "G", "ង", "អ", ""),
            ch("KeyH", "H", "H", "ហ", "ះ", ""),
            ch("KeyJ", "J", "J", "្", "ញ", ""),
            ch("KeyK", "K", "K", "ក", "គ", ""),
            ch("KeyL", "L", "L", "ល", "ឡ", ""),
            ch("Semicolon", ";", ":", "ើ", "ោះ", "៖"),
            ch("Quote", "'", "\"", "់", "៉", "ៈ"),
            action("Enter", "Enter", 4),
        ],
        // Bottom letter row: 5 + 10 * 2 + 5
        vec![
            modifier("ShiftLeft", "Shift", 5),
            ch("KeyZ", "Z", "Z", "ឋ", "ឍ", ""),
            ch("KeyX", "X", "X", "ខ", "ឃ", ""),
            ch("KeyC", "C", "C", "ច", "ជ", ""),
            ch("KeyV", "V", "V", "វ", "េះ", ""),
            ch("KeyB", "B", "B", "ប", "ព", ""),
            ch("KeyN", "N", "N", "ន", "ណ", ""),
            ch("KeyM", "M", "M", "ម", "ំ", ""),
            ch("Comma", ",", "<", "ុំ", "ុះ", ","),
            ch("Period", ".", ">", "។", "៕", "."),
            ch("Slash", "/", "?", "៊", "?", "/"),
            modifier("ShiftRight", "Shift", 5),
        ],
        // Space row
        vec![
            modifier("ControlLeft", "Ctrl", 3),
            modifier("Fn", "Fn", 2),
            modifier("MetaLeft", "Win", 3),
            modifier("AltLeft", "Alt", 3),
            ch("Space", " ", " ", "\u{200B}", " ", "")
                .with_label("Space")
                .with_width(10),
            modifier("AltRight", "Alt", 3),
            modifier("ControlRight", "Ctrl", 3),
            action("ArrowLeft", "", 1),
            // Split key: the on-screen keyboard sends ArrowUp / ArrowDown
            action("ArrowUpDown", "", 1),
            action("ArrowRight", "", 1),
        ],
    ]
}

/// Validated Khmer layout table.
pub fn khmer_layout() -> Result<LayoutTable, LayoutError> {
    LayoutTable::from_rows(khmer_layout_rows())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_fill_the_grid() {
        for row in khmer_layout_rows() {
            let width: u32 = row.iter().map(|k| k.width as u32).sum();
            assert_eq!(width, 30, "row starting with {}", row[0].code);
        }
    }

    #[test]
    fn table_validates() {
        let table = khmer_layout().unwrap();
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.len(), 14 + 14 + 13 + 12 + 10);
    }

    #[test]
    fn space_types_the_invisible_marker() {
        let table = khmer_layout().unwrap();
        let space = table.get("Space").unwrap();
        assert_eq!(space.base, "\u{200B}");
        assert_eq!(space.shift, " ");
        assert_eq!(space.kind, KeyKind::Character);
    }

    #[test]
    fn caps_lock_is_an_action_key() {
        let table = khmer_layout().unwrap();
        assert_eq!(table.get("CapsLock").unwrap().kind, KeyKind::Action);
        assert_eq!(table.get("ShiftRight").unwrap().kind, KeyKind::Modifier);
    }
}
