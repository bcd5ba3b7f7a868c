/// Opaque host keycode. The runtime never interprets specific key identities itself -
/// hotkey bindings are a host/UI concern - but a handful of codes are reserved for
/// behaviour this crate implements directly (debug toggles).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Toggles the pathfinding debug overlay (spec §4.5).
    pub const TOGGLE_PATHFINDING_DEBUG: KeyCode = KeyCode(0xF001);

    /// Held while left-clicking or box-selecting to add to rather than replace the
    /// current selection (spec §4.2/§4.9's `additive` flag).
    pub const ADDITIVE_SELECT_MODIFIER: KeyCode = KeyCode(0xF002);
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum KeyEvent {
    Down(KeyCode),
    Up(KeyCode),
}

impl KeyEvent {
    pub fn is_down(self) -> bool {
        matches!(self, KeyEvent::Down(_))
    }

    pub fn code(self) -> KeyCode {
        match self {
            KeyEvent::Down(k) | KeyEvent::Up(k) => k,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EventHandled {
    Handled,
    NotHandled,
}
