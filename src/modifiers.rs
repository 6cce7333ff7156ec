//! Modifier keys and per-page modifier state
//!
//! Four independent momentary modifier keys select among alternate binding
//! sets for the same widget. A chord is the set of currently-held modifiers;
//! its canonical textual order is Shift, Option, Control, Alt.

use std::fmt;

/// One of the four modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Option,
    Control,
    Alt,
}

impl Modifier {
    /// All modifiers in canonical order.
    pub const ALL: [Modifier; 4] = [
        Modifier::Shift,
        Modifier::Option,
        Modifier::Control,
        Modifier::Alt,
    ];

    fn bit(self) -> u8 {
        match self {
            Modifier::Shift => 1,
            Modifier::Option => 2,
            Modifier::Control => 4,
            Modifier::Alt => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Shift => "Shift",
            Modifier::Option => "Option",
            Modifier::Control => "Control",
            Modifier::Alt => "Alt",
        }
    }

    /// Parse a single modifier name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shift" => Some(Modifier::Shift),
            "option" => Some(Modifier::Option),
            "control" => Some(Modifier::Control),
            "alt" => Some(Modifier::Alt),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of held modifiers, used as a binding-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierChord(u8);

impl ModifierChord {
    /// The empty chord (no modifiers held).
    pub const NONE: ModifierChord = ModifierChord(0);

    pub fn contains(self, m: Modifier) -> bool {
        self.0 & m.bit() != 0
    }

    pub fn with(self, m: Modifier) -> Self {
        ModifierChord(self.0 | m.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a chord like "Shift+Option". Empty or "None" parses to the
    /// empty chord. Returns the first unrecognized token on failure.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(ModifierChord::NONE);
        }
        let mut chord = ModifierChord::NONE;
        for token in s.split('+') {
            match Modifier::parse(token) {
                Some(m) => chord = chord.with(m),
                None => return Err(token.trim().to_string()),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for ModifierChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for m in Modifier::ALL {
            if self.contains(m) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(m.as_str())?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Momentary modifier flags for one page.
#[derive(Debug, Default)]
pub struct ModifierState {
    held: u8,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a modifier flag. Returns true if the chord changed.
    pub fn set(&mut self, m: Modifier, held: bool) -> bool {
        let before = self.held;
        if held {
            self.held |= m.bit();
        } else {
            self.held &= !m.bit();
        }
        self.held != before
    }

    pub fn is_held(&self, m: Modifier) -> bool {
        self.held & m.bit() != 0
    }

    /// The chord currently selected by the held flags.
    pub fn chord(&self) -> ModifierChord {
        ModifierChord(self.held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_parse() {
        assert_eq!(ModifierChord::parse("").unwrap(), ModifierChord::NONE);
        assert_eq!(ModifierChord::parse("None").unwrap(), ModifierChord::NONE);

        let chord = ModifierChord::parse("shift+alt").unwrap();
        assert!(chord.contains(Modifier::Shift));
        assert!(chord.contains(Modifier::Alt));
        assert!(!chord.contains(Modifier::Control));

        assert_eq!(ModifierChord::parse("shift+banana").unwrap_err(), "banana");
    }

    #[test]
    fn test_chord_canonical_order() {
        // Held order must not matter for display or equality
        let a = ModifierChord::NONE.with(Modifier::Alt).with(Modifier::Shift);
        let b = ModifierChord::NONE.with(Modifier::Shift).with(Modifier::Alt);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Shift+Alt");

        let all = Modifier::ALL
            .iter()
            .fold(ModifierChord::NONE, |c, m| c.with(*m));
        assert_eq!(all.to_string(), "Shift+Option+Control+Alt");
    }

    #[test]
    fn test_state_set_reports_change() {
        let mut state = ModifierState::new();
        assert!(state.set(Modifier::Shift, true));
        assert!(!state.set(Modifier::Shift, true)); // no change
        assert!(state.is_held(Modifier::Shift));
        assert!(state.set(Modifier::Shift, false));
        assert_eq!(state.chord(), ModifierChord::NONE);
    }
}
