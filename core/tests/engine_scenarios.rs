//! Integration tests for the engine over an injected layout.
//!
//! Covers the full key path (modifier reducer -> resolver -> surface ->
//! statistics) for both input sources, plus the platform quirk queue.

use std::sync::Arc;

use libkhmer_core::{
    DeferredTask, HeadlessHost, ImeEngine, KeyDescriptor, KeyKind, KeyResult, LayoutTable,
    ModifierFlags, PhysicalKeyEvent, PlatformQuirks,
};

const Z: &str = "\u{200B}";

fn layout() -> Arc<LayoutTable> {
    let rows = vec![
        vec![
            KeyDescriptor::character("Digit5", "៥", "%", "€", "5", "%"),
            KeyDescriptor::structural("Backspace", "Backspace", KeyKind::Action).with_width(4),
        ],
        vec![
            KeyDescriptor::character("KeyT", "ត", "ទ", "", "T", "T"),
            KeyDescriptor::character("KeyA", "ា", "ាំ", "", "A", "A"),
            KeyDescriptor::character("KeyK", "ក", "គ", "", "K", "K"),
            KeyDescriptor::character("Quote", "់", "៉", "ៈ", "'", "\""),
        ],
        vec![
            KeyDescriptor::structural("ShiftLeft", "Shift", KeyKind::Modifier),
            KeyDescriptor::structural("ShiftRight", "Shift", KeyKind::Modifier),
        ],
        vec![
            KeyDescriptor::structural("ControlLeft", "Ctrl", KeyKind::Modifier),
            KeyDescriptor::character("Space", " ", " ", "", Z, " ").with_label("Space"),
            KeyDescriptor::structural("AltRight", "Alt", KeyKind::Modifier),
        ],
    ];
    Arc::new(LayoutTable::from_rows(rows).expect("valid layout"))
}

fn engine_with(quirks: PlatformQuirks) -> ImeEngine<HeadlessHost> {
    ImeEngine::new(layout(), HeadlessHost::new(), quirks)
}

fn engine() -> ImeEngine<HeadlessHost> {
    engine_with(PlatformQuirks::none())
}

fn tap(engine: &mut ImeEngine<HeadlessHost>, code: &str, flags: ModifierFlags) -> KeyResult {
    let result = engine.handle_key_down(&PhysicalKeyEvent::code(code, flags));
    engine.handle_key_up(&PhysicalKeyEvent::code(code, ModifierFlags::none()));
    result
}

#[test]
fn test_consonant_vowel_sign_then_backspace() {
    let mut e = engine();
    for code in ["KeyK", "KeyA", "KeyT", "Quote"] {
        assert_eq!(tap(&mut e, code, ModifierFlags::none()), KeyResult::Handled);
    }
    assert_eq!(e.surface().plain_text(), "កាត់");
    tap(&mut e, "Backspace", ModifierFlags::none());
    assert_eq!(e.surface().plain_text(), "កា");
    assert_eq!(e.context().char_count, 2);
}

#[test]
fn test_space_latin_variant_is_the_marker() {
    // Space here carries the marker only as its Latin variant, so native mode
    // types a plain space.
    let mut e = engine();
    tap(&mut e, "KeyK", ModifierFlags::none());
    tap(&mut e, "Space", ModifierFlags::none());
    tap(&mut e, "KeyK", ModifierFlags::none());
    assert_eq!(e.surface().plain_text(), "ក ក");
    assert_eq!(e.context().word_count, 2);
}

#[test]
fn test_held_shift_and_one_shot_shift() {
    let mut e = engine();
    e.handle_key_down(&PhysicalKeyEvent::code("ShiftLeft", ModifierFlags::shifted()));
    assert!(e.is_key_highlighted("ShiftLeft"));
    tap(&mut e, "KeyK", ModifierFlags::shifted());
    e.handle_virtual_key("KeyK");
    e.handle_key_up(&PhysicalKeyEvent::code("ShiftLeft", ModifierFlags::none()));
    assert!(!e.context().shift_active);

    e.handle_virtual_key("ShiftRight");
    e.handle_virtual_key("KeyA");
    e.handle_virtual_key("KeyA");
    assert_eq!(e.surface().plain_text(), "គគាំា");
}

#[test]
fn test_toggling_virtual_shift_twice_cancels() {
    let mut e = engine();
    e.handle_virtual_key("ShiftLeft");
    e.handle_virtual_key("ShiftLeft");
    e.handle_virtual_key("KeyK");
    assert_eq!(e.surface().plain_text(), "ក");
}

#[test]
fn test_caps_lock_sync_on_release() {
    let mut e = engine();
    let caps = ModifierFlags { caps_lock: true, ..ModifierFlags::none() };
    e.handle_key_down(&PhysicalKeyEvent::code("CapsLock", caps));
    e.handle_key_up(&PhysicalKeyEvent::code("CapsLock", caps));
    assert!(e.context().caps_lock_active);

    e.handle_virtual_key("Digit5");
    e.handle_virtual_key("KeyK");
    assert_eq!(e.surface().plain_text(), "៥គ");

    e.handle_key_up(&PhysicalKeyEvent::code("CapsLock", ModifierFlags::none()));
    assert!(!e.context().caps_lock_active);
}

#[test]
fn test_backspace_with_meta_is_left_to_the_host() {
    let mut e = engine();
    tap(&mut e, "KeyK", ModifierFlags::none());
    let meta = ModifierFlags { meta: true, ..ModifierFlags::none() };
    assert_eq!(tap(&mut e, "Backspace", meta), KeyResult::NotHandled);
    assert_eq!(e.surface().plain_text(), "ក");
}

#[test]
fn test_atomic_placeholder_deletion_between_words() {
    let mut e = engine();
    e.set_show_invisibles(true);
    e.surface_mut().insert_character(&format!("ក{Z}ខ"));
    e.surface_mut().select_units(2, 2);
    assert!(e.surface().caret_follows_placeholder());
    tap(&mut e, "Backspace", ModifierFlags::none());
    assert_eq!(e.surface().plain_text(), "កខ");
    assert!(!e.surface().document().has_placeholders());
}

#[test]
fn test_deferred_refresh_queue() {
    let quirks = PlatformQuirks {
        needs_deferred_refresh: true,
        needs_composition_suppression: false,
    };
    let mut e = engine_with(quirks);
    tap(&mut e, "KeyK", ModifierFlags::none());
    assert_eq!(
        e.pending_tasks().cloned().collect::<Vec<_>>(),
        vec![DeferredTask::RefreshStatistics]
    );
    assert_eq!(e.drain_deferred(), 1);
    assert_eq!(e.drain_deferred(), 0);
    assert_eq!(e.context().char_count, 1);
}

#[test]
fn test_latin_mode_round_trip() {
    let mut e = engine();
    assert!(!e.toggle_native_mode());
    assert_eq!(tap(&mut e, "KeyK", ModifierFlags::none()), KeyResult::NotHandled);
    assert!(e.toggle_native_mode());
    assert_eq!(tap(&mut e, "KeyK", ModifierFlags::none()), KeyResult::Handled);
    assert_eq!(e.surface().plain_text(), "ក");
}

#[test]
fn test_blurred_host_drops_input() {
    let mut e = ImeEngine::new(layout(), HeadlessHost::detached(), PlatformQuirks::none());
    tap(&mut e, "KeyK", ModifierFlags::none());
    assert_eq!(e.surface().plain_text(), "");
}
