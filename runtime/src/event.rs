use common::input::{KeyCode, KeyEvent};
use input::{MouseButton, RawInputEvent};

/// The abstract host-event stream the runtime consumes: pointer move/down/up, wheel,
/// key down/up, focus-lost, and resize, plus an `Unknown` catch-all for whatever a
/// host-side protocol decoder couldn't map onto one of the recognized kinds. Concrete
/// host binding (OS window, browser, TTY) stays on the other side of this boundary.
#[derive(Clone, Debug)]
pub enum HostEvent {
    PointerMove { x: f32, y: f32 },
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32 },
    Wheel { delta: f32, x: f32, y: f32, ctrl: bool },
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    FocusLost,
    Resize { width: u32, height: u32 },
    Unknown { kind: String },
}

/// What feeding a `HostEvent` into the runtime resulted in.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EventOutcome {
    /// Forwarded into the `InputAggregator`'s per-frame command queue.
    Dispatched,
    /// Handled directly by the runtime rather than the input layer (a resize).
    HandledDirectly,
    /// The kind wasn't recognized; dropped and counted in diagnostics.
    Dropped,
}

impl HostEvent {
    /// Translates to a `RawInputEvent` for every kind the `InputAggregator` itself
    /// understands. `Resize` and `Unknown` return `None`: the former is handled directly
    /// by the runtime (camera/input viewport sync), the latter has nowhere to go.
    pub(crate) fn to_raw(&self) -> Option<RawInputEvent> {
        match *self {
            HostEvent::PointerMove { x, y } => Some(RawInputEvent::MouseMove { x, y }),
            HostEvent::PointerDown { button, x, y } => {
                Some(RawInputEvent::MouseButton { button, down: true, x, y })
            }
            HostEvent::PointerUp { button, x, y } => {
                Some(RawInputEvent::MouseButton { button, down: false, x, y })
            }
            HostEvent::Wheel { delta, x, y, ctrl } => Some(RawInputEvent::Wheel {
                delta,
                x,
                y,
                ctrl_key: ctrl,
                precise: false,
            }),
            HostEvent::KeyDown(code) => Some(RawInputEvent::Key(KeyEvent::Down(code))),
            HostEvent::KeyUp(code) => Some(RawInputEvent::Key(KeyEvent::Up(code))),
            HostEvent::FocusLost => Some(RawInputEvent::WindowBlur),
            HostEvent::Resize { .. } | HostEvent::Unknown { .. } => None,
        }
    }
}
