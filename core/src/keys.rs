//! Key events and the host key-code space.
//!
//! Hosts send X11 keysym-style integers: printable lowercase letters use their
//! ASCII code, editing keys use the reserved `0xff00` block.

/// X11 `XK_BackSpace`.
pub const KEY_BACKSPACE: i32 = 0xff08;

/// X11 `XK_Return`.
pub const KEY_RETURN: i32 = 0xff0d;

const KEY_LOWER_A: i32 = b'a' as i32;
const KEY_LOWER_Z: i32 = b'z' as i32;

/// Key event types that a composition can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Symbol of the input alphabet (a-z)
    Char(char),
    /// Backspace key
    Backspace,
    /// Enter/Return key
    Enter,
    /// Anything outside the IME's alphabet, carried through for logging
    Other(i32),
}

impl KeyEvent {
    /// Decode a host key code.
    pub fn from_keysym(code: i32) -> Self {
        match code {
            KEY_LOWER_A..=KEY_LOWER_Z => match u8::try_from(code) {
                Ok(byte) => KeyEvent::Char(char::from(byte)),
                Err(_) => KeyEvent::Other(code),
            },
            KEY_BACKSPACE => KeyEvent::Backspace,
            KEY_RETURN => KeyEvent::Enter,
            other => KeyEvent::Other(other),
        }
    }

    /// Host key code for this event.
    pub fn keysym(self) -> i32 {
        match self {
            KeyEvent::Char(ch) => ch as i32,
            KeyEvent::Backspace => KEY_BACKSPACE,
            KeyEvent::Enter => KEY_RETURN,
            KeyEvent::Other(code) => code,
        }
    }
}

/// Result of processing a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the IME
    Handled,
    /// Key was not handled (pass through to application)
    NotHandled,
    /// A candidate was chosen; the composition has been reset
    Selected(String),
}
