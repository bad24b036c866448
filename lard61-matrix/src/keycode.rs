//! USB HID keycodes used by the lard61.
//! See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).

/// Declares `Keycode` with its usage IDs and the short labels used by the
/// layout renderer, keeping the three in one table.
macro_rules! keycodes {
    ($($(#[$meta:meta])* $name:ident = $usage:literal $label:literal,)*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum Keycode {
            $($(#[$meta])* $name = $usage,)*
        }

        impl Keycode {
            /// Every keycode, in usage order.
            pub const ALL: &'static [Keycode] = &[$(Keycode::$name,)*];

            /// Short label for layout visualizations.
            pub fn display_name(self) -> &'static str {
                match self {
                    $(Keycode::$name => $label,)*
                }
            }

            /// Keycode with the given usage ID, if the lard61 uses it.
            pub fn from_usage(usage: u8) -> Option<Self> {
                match usage {
                    $($usage => Some(Keycode::$name),)*
                    _ => None,
                }
            }
        }
    };
}

keycodes! {
    /// No code: unused matrix position or the function key itself
    No = 0x00 "",

    A = 0x04 "A",  B = 0x05 "B",  C = 0x06 "C",  D = 0x07 "D",
    E = 0x08 "E",  F = 0x09 "F",  G = 0x0A "G",  H = 0x0B "H",
    I = 0x0C "I",  J = 0x0D "J",  K = 0x0E "K",  L = 0x0F "L",
    M = 0x10 "M",  N = 0x11 "N",  O = 0x12 "O",  P = 0x13 "P",
    Q = 0x14 "Q",  R = 0x15 "R",  S = 0x16 "S",  T = 0x17 "T",
    U = 0x18 "U",  V = 0x19 "V",  W = 0x1A "W",  X = 0x1B "X",
    Y = 0x1C "Y",  Z = 0x1D "Z",

    N1 = 0x1E "1", N2 = 0x1F "2", N3 = 0x20 "3", N4 = 0x21 "4", N5 = 0x22 "5",
    N6 = 0x23 "6", N7 = 0x24 "7", N8 = 0x25 "8", N9 = 0x26 "9", N0 = 0x27 "0",

    Enter = 0x28 "Ent",
    Escape = 0x29 "Esc",
    Backspace = 0x2A "Bksp",
    Tab = 0x2B "Tab",
    Space = 0x2C "Spc",
    Minus = 0x2D "-",
    Equal = 0x2E "=",
    LBracket = 0x2F "[",
    RBracket = 0x30 "]",
    Backslash = 0x31 "\\",
    Semicolon = 0x33 ";",
    Quote = 0x34 "'",
    Grave = 0x35 "`",
    Comma = 0x36 ",",
    Dot = 0x37 ".",
    Slash = 0x38 "/",
    CapsLock = 0x39 "Caps",

    F1 = 0x3A "F1",   F2 = 0x3B "F2",   F3 = 0x3C "F3",   F4 = 0x3D "F4",
    F5 = 0x3E "F5",   F6 = 0x3F "F6",   F7 = 0x40 "F7",   F8 = 0x41 "F8",
    F9 = 0x42 "F9",   F10 = 0x43 "F10", F11 = 0x44 "F11", F12 = 0x45 "F12",

    Home = 0x4A "Home",
    PageUp = 0x4B "PgUp",
    Delete = 0x4C "Del",
    End = 0x4D "End",
    PageDown = 0x4E "PgDn",
    Right = 0x4F "\u{2192}",
    Left = 0x50 "\u{2190}",
    Down = 0x51 "\u{2193}",
    Up = 0x52 "\u{2191}",

    // Reported in the key array like any other usage
    LCtrl = 0xE0 "Ctrl",
    LShift = 0xE1 "Shft",
    LAlt = 0xE2 "Alt",
    LGui = 0xE3 "Gui",
    RCtrl = 0xE4 "RCtl",
    RShift = 0xE5 "RSft",
    RAlt = 0xE6 "RAlt",
    RGui = 0xE7 "RGui",
}

impl Keycode {
    /// HID usage ID.
    pub const fn usage(self) -> u8 {
        self as u8
    }

    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.usage())
    }

    /// Check for the "no code" sentinel.
    pub fn is_none(self) -> bool {
        self == Keycode::No
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_lookup_is_inverse() {
        for &code in Keycode::ALL {
            assert_eq!(Keycode::from_usage(code.usage()), Some(code));
        }
        // Non-US # is not on the board
        assert_eq!(Keycode::from_usage(0x32), None);
    }

    #[test]
    fn modifiers_are_the_e0_block() {
        let modifiers = Keycode::ALL.iter().filter(|k| k.is_modifier()).count();
        assert_eq!(modifiers, 8);
        assert!(!Keycode::CapsLock.is_modifier());
        assert_eq!(Keycode::RGui.usage(), 0xE7);
    }
}
