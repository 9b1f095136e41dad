//! Textual keystroke notation for scripted input.
//!
//! A script is a whitespace-separated list of strokes:
//!
//! - `KeyK` - physical key by code
//! - `Shift+KeyA`, `AltGr+Digit5`, `Caps+KeyA` - physical key with the
//!   platform modifier flags set (`Shift`, `Ctrl`, `Alt`, `AltGr`, `Meta`,
//!   `Caps`) or reported as a dead key (`Dead`)
//! - `v:ShiftLeft` - click on the on-screen keyboard
//!
//! Each physical stroke is replayed as key-down then key-up, and deferred
//! work is drained after every stroke, like a platform timer would.

use libkhmer_core::{ImeEngine, KeyResult, ModifierFlags, PhysicalKeyEvent, SurfaceHost};
use phf::phf_map;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Shift,
    Ctrl,
    Alt,
    AltGraph,
    Meta,
    CapsLock,
    Dead,
}

static PREFIXES: phf::Map<&'static str, Prefix> = phf_map! {
    "shift" => Prefix::Shift,
    "ctrl" => Prefix::Ctrl,
    "control" => Prefix::Ctrl,
    "alt" => Prefix::Alt,
    "altgr" => Prefix::AltGraph,
    "altgraph" => Prefix::AltGraph,
    "meta" => Prefix::Meta,
    "caps" => Prefix::CapsLock,
    "capslock" => Prefix::CapsLock,
    "dead" => Prefix::Dead,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeystrokeError {
    #[error("empty keystroke")]
    Empty,
    #[error("unknown modifier `{0}` in keystroke `{1}`")]
    UnknownModifier(String, String),
    #[error("keystroke `{0}` has no key code")]
    MissingCode(String),
}

/// One scripted stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Physical(PhysicalKeyEvent),
    Virtual(String),
}

/// Parse a single stroke.
pub fn parse_keystroke(token: &str) -> Result<Keystroke, KeystrokeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(KeystrokeError::Empty);
    }
    if let Some(code) = token.strip_prefix("v:") {
        if code.is_empty() {
            return Err(KeystrokeError::MissingCode(token.to_string()));
        }
        return Ok(Keystroke::Virtual(code.to_string()));
    }

    let mut parts: Vec<&str> = token.split('+').collect();
    let code = match parts.pop() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(KeystrokeError::MissingCode(token.to_string())),
    };

    let mut flags = ModifierFlags::none();
    let mut dead = false;
    for part in parts {
        let prefix = PREFIXES
            .get(part.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| KeystrokeError::UnknownModifier(part.to_string(), token.to_string()))?;
        match prefix {
            Prefix::Shift => flags.shift = true,
            Prefix::Ctrl => flags.ctrl = true,
            Prefix::Alt => flags.alt = true,
            Prefix::AltGraph => flags.alt_graph = true,
            Prefix::Meta => flags.meta = true,
            Prefix::CapsLock => flags.caps_lock = true,
            Prefix::Dead => dead = true,
        }
    }

    let key = if dead { libkhmer_core::key::DEAD_KEY } else { code };
    Ok(Keystroke::Physical(PhysicalKeyEvent::new(code, key, flags)))
}

/// Parse a whitespace-separated script.
pub fn parse_script(script: &str) -> Result<Vec<Keystroke>, KeystrokeError> {
    script.split_whitespace().map(parse_keystroke).collect()
}

/// Replay strokes into `engine`. Returns how many were handled by the IME.
pub fn replay<H: SurfaceHost>(engine: &mut ImeEngine<H>, strokes: &[Keystroke]) -> usize {
    let mut handled = 0;
    for stroke in strokes {
        let result = match stroke {
            Keystroke::Physical(event) => {
                let result = engine.handle_key_down(event);
                // Everything but the caps indicator is released with the key
                let mut release = event.clone();
                release.flags = ModifierFlags {
                    caps_lock: event.flags.caps_lock,
                    ..ModifierFlags::none()
                };
                engine.handle_key_up(&release);
                result
            }
            Keystroke::Virtual(code) => engine.handle_virtual_key(code),
        };
        engine.drain_deferred();
        if result == KeyResult::Handled {
            handled += 1;
        }
    }
    handled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_modified_strokes() {
        assert_eq!(
            parse_keystroke("KeyK").unwrap(),
            Keystroke::Physical(PhysicalKeyEvent::new("KeyK", "KeyK", ModifierFlags::none()))
        );
        let Keystroke::Physical(event) = parse_keystroke("Shift+AltGr+Digit5").unwrap() else {
            panic!("expected physical stroke");
        };
        assert!(event.flags.shift && event.flags.alt_graph);
        assert!(!event.flags.ctrl);
        assert_eq!(event.code, "Digit5");
    }

    #[test]
    fn modifier_names_are_case_insensitive() {
        let Keystroke::Physical(event) = parse_keystroke("caps+KeyA").unwrap() else {
            panic!("expected physical stroke");
        };
        assert!(event.flags.caps_lock);
    }

    #[test]
    fn dead_prefix_sets_logical_key() {
        let Keystroke::Physical(event) = parse_keystroke("Dead+Quote").unwrap() else {
            panic!("expected physical stroke");
        };
        assert!(event.is_dead_key());
        assert_eq!(event.code, "Quote");
    }

    #[test]
    fn virtual_strokes() {
        assert_eq!(
            parse_keystroke("v:ShiftLeft").unwrap(),
            Keystroke::Virtual("ShiftLeft".into())
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_keystroke("  "), Err(KeystrokeError::Empty));
        assert_eq!(
            parse_keystroke("Shift+"),
            Err(KeystrokeError::MissingCode("Shift+".into()))
        );
        assert_eq!(parse_keystroke("v:"), Err(KeystrokeError::MissingCode("v:".into())));
        assert!(matches!(
            parse_keystroke("Hyper+KeyA"),
            Err(KeystrokeError::UnknownModifier(m, _)) if m == "Hyper"
        ));
    }

    #[test]
    fn script_splits_on_whitespace() {
        let strokes = parse_script("KeyK  KeyA\nv:Space").unwrap();
        assert_eq!(strokes.len(), 3);
        assert!(parse_script("KeyK Bogus+KeyA").is_err());
    }
}
