//! Keymap definitions and layer management for the lard61.
//!
//! Two fixed layers: the base layer and the function layer, which is active
//! while the Fn key is held. Every slot of the function layer is spelled out,
//! there is no fall-through to the base layer.

use crate::keycode::Keycode;
use crate::keyset::KeySet;
use crate::layout::{KeyIndex, COLS, ROWS};

/// Active keymap layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    Base,
    Function,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Base, Layer::Function];

    /// Function layer while the Fn key is in the stable state, base otherwise.
    pub fn resolve(stable: &KeySet) -> Self {
        if stable.contains(FN_KEY) {
            Layer::Function
        } else {
            Layer::Base
        }
    }

    pub fn table(self) -> &'static [[Keycode; COLS]; ROWS] {
        match self {
            Layer::Base => &BASE,
            Layer::Function => &FUNCTION,
        }
    }
}

/// Position of the Fn key, bottom row between RGui and RCtrl.
pub const FN_KEY: KeyIndex = KeyIndex::at(4, 10);

/// LCtrl + LAlt + Fn + R: restart into the USB bootloader.
pub const RECOVERY_CHORD: [KeyIndex; 4] = [
    KeyIndex::at(4, 0),
    KeyIndex::at(4, 2),
    FN_KEY,
    KeyIndex::at(1, 4),
];

/// Look up the output code of a matrix position on a layer.
pub fn map(key: KeyIndex, layer: Layer) -> Keycode {
    layer.table()[key.row().index()][key.col().index()]
}

/// No key at this matrix position, or the Fn key.
const ___: Keycode = Keycode::No;

/// Shorthand aliases for readability.
const ENT: Keycode = Keycode::Enter;
const ESC: Keycode = Keycode::Escape;
const BSP: Keycode = Keycode::Backspace;
const TAB: Keycode = Keycode::Tab;
const SPC: Keycode = Keycode::Space;
const DEL: Keycode = Keycode::Delete;
const CAPS: Keycode = Keycode::CapsLock;
const LCTL: Keycode = Keycode::LCtrl;
const LSFT: Keycode = Keycode::LShift;
const LALT: Keycode = Keycode::LAlt;
const LGUI: Keycode = Keycode::LGui;
const RCTL: Keycode = Keycode::RCtrl;
const RSFT: Keycode = Keycode::RShift;
const RALT: Keycode = Keycode::RAlt;
const RGUI: Keycode = Keycode::RGui;
const PGUP: Keycode = Keycode::PageUp;
const PGDN: Keycode = Keycode::PageDown;
const LEFT: Keycode = Keycode::Left;
const DOWN: Keycode = Keycode::Down;
const UP: Keycode = Keycode::Up;
const RGHT: Keycode = Keycode::Right;

/// Base layer: ANSI 60% QWERTY.
pub static BASE: [[Keycode; COLS]; ROWS] = [
    // Row 0: Esc, 1..0, -, =, Bksp
    [ESC, Keycode::N1, Keycode::N2, Keycode::N3, Keycode::N4, Keycode::N5, Keycode::N6,
     Keycode::N7, Keycode::N8, Keycode::N9, Keycode::N0, Keycode::Minus, Keycode::Equal, BSP],

    // Row 1: Tab, Q..P, [, ], \
    [TAB, Keycode::Q, Keycode::W, Keycode::E, Keycode::R, Keycode::T, Keycode::Y,
     Keycode::U, Keycode::I, Keycode::O, Keycode::P, Keycode::LBracket, Keycode::RBracket, Keycode::Backslash],

    // Row 2: Caps, A..L, ;, ', Enter, _unused
    [CAPS, Keycode::A, Keycode::S, Keycode::D, Keycode::F, Keycode::G, Keycode::H,
     Keycode::J, Keycode::K, Keycode::L, Keycode::Semicolon, Keycode::Quote, ENT, ___],

    // Row 3: LShift, Z../, RShift, _unused, _unused
    [LSFT, Keycode::Z, Keycode::X, Keycode::C, Keycode::V, Keycode::B, Keycode::N,
     Keycode::M, Keycode::Comma, Keycode::Dot, Keycode::Slash, RSFT, ___, ___],

    // Row 4: LCtrl, LGui, LAlt, Space, (no switches under the space bar),
    //        RAlt, RGui, Fn, RCtrl, _unused, _unused
    [LCTL, LGUI, LALT, SPC, ___, ___, ___,
     ___, RALT, RGUI, ___, RCTL, ___, ___],
];

/// Function layer, active while Fn is held.
///
/// Grave on Esc, F1-F12 on the number row, Delete on Bksp, PgUp/Up/PgDn/Home
/// on QWER, Left/Down/Right/End on ASDF, and arrows on P ; ' L for the right
/// hand.
pub static FUNCTION: [[Keycode; COLS]; ROWS] = [
    // Row 0
    [Keycode::Grave, Keycode::F1, Keycode::F2, Keycode::F3, Keycode::F4, Keycode::F5, Keycode::F6,
     Keycode::F7, Keycode::F8, Keycode::F9, Keycode::F10, Keycode::F11, Keycode::F12, DEL],

    // Row 1
    [TAB, PGUP, UP, PGDN, Keycode::Home, Keycode::T, Keycode::Y,
     Keycode::U, Keycode::I, Keycode::O, UP, Keycode::LBracket, Keycode::RBracket, Keycode::Backslash],

    // Row 2
    [CAPS, LEFT, DOWN, RGHT, Keycode::End, Keycode::G, Keycode::H,
     Keycode::J, Keycode::K, LEFT, DOWN, RGHT, ENT, ___],

    // Row 3
    [LSFT, Keycode::Z, Keycode::X, Keycode::C, Keycode::V, Keycode::B, Keycode::N,
     Keycode::M, Keycode::Comma, Keycode::Dot, Keycode::Slash, RSFT, ___, ___],

    // Row 4
    [LCTL, LGUI, LALT, SPC, ___, ___, ___,
     ___, RALT, RGUI, ___, RCTL, ___, ___],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_follows_fn_key() {
        let mut stable = KeySet::empty();
        assert_eq!(Layer::resolve(&stable), Layer::Base);
        stable.insert(KeyIndex::at(0, 1));
        assert_eq!(Layer::resolve(&stable), Layer::Base);
        stable.insert(FN_KEY);
        assert_eq!(Layer::resolve(&stable), Layer::Function);
        stable.remove(FN_KEY);
        assert_eq!(Layer::resolve(&stable), Layer::Base);
    }

    #[test]
    fn lookup_switches_tables() {
        let esc = KeyIndex::at(0, 0);
        assert_eq!(map(esc, Layer::Base), Keycode::Escape);
        assert_eq!(map(esc, Layer::Function), Keycode::Grave);
        let r = KeyIndex::at(1, 4);
        assert_eq!(map(r, Layer::Base), Keycode::R);
        assert_eq!(map(r, Layer::Function), Keycode::Home);
    }

    #[test]
    fn non_physical_positions_have_no_code() {
        for key in KeyIndex::all().filter(|k| !k.is_physical()) {
            assert_eq!(map(key, Layer::Base), Keycode::No, "{key}");
            assert_eq!(map(key, Layer::Function), Keycode::No, "{key}");
        }
    }

    #[test]
    fn fn_key_has_no_code() {
        assert!(FN_KEY.is_physical());
        assert!(map(FN_KEY, Layer::Base).is_none());
        assert!(map(FN_KEY, Layer::Function).is_none());
    }

    #[test]
    fn recovery_chord_keys() {
        let [ctrl, alt, fun, r] = RECOVERY_CHORD;
        assert_eq!(map(ctrl, Layer::Base), Keycode::LCtrl);
        assert_eq!(map(alt, Layer::Base), Keycode::LAlt);
        assert_eq!(fun, FN_KEY);
        assert_eq!(map(r, Layer::Base), Keycode::R);
    }
}
