//! Translates raw host device events into a normalized per-frame command stream, without
//! losing semantic intent - wheel vs. pinch, click vs. drag-select, held keys vs. edge
//! scroll are all resolved here so downstream systems only ever see [`Command`]s.

use std::collections::HashSet;

use common::input::{EventHandled, KeyCode, KeyEvent};

const ZOOM_DELTA_MAX: f32 = 0.25;
const WHEEL_DELTA_SCALE: f32 = 0.002;
const DRAG_THRESHOLD_PX: f32 = 4.0;
const EDGE_SCROLL_SPEED_PX_PER_SEC: f32 = 600.0;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Copy, Clone, Debug)]
pub enum RawInputEvent {
    Key(KeyEvent),
    MouseMove {
        x: f32,
        y: f32,
    },
    MouseButton {
        button: MouseButton,
        down: bool,
        x: f32,
        y: f32,
    },
    /// A scroll-wheel or trackpad-pinch delta. `precise` mirrors the host's
    /// "high-resolution/continuous source" flag (e.g. a trackpad rather than a
    /// notched mouse wheel).
    Wheel {
        delta: f32,
        x: f32,
        y: f32,
        ctrl_key: bool,
        precise: bool,
    },
    /// Two-finger trackpad swipe without a held ctrl key.
    TrackpadPan {
        dx: f32,
        dy: f32,
    },
    PointerCaptureLost,
    WindowBlur,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CommandKind {
    Move,
    Attack,
    Smart,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Move { dx: f32, dy: f32 },
    ZoomAtScreen { delta: f32, screen_x: f32, screen_y: f32 },
    Pan { dx: f32, dy: f32 },
    SelectAtScreen { x: f32, y: f32, additive: bool },
    BoxSelect { x0: f32, y0: f32, x1: f32, y1: f32, additive: bool },
    CommandAtScreen { x: f32, y: f32, kind: CommandKind },
    Hotkey { code: KeyCode },
}

#[derive(Copy, Clone, Debug)]
struct DragState {
    start: (f32, f32),
    additive: bool,
}

/// Tracks held device state and buffers the commands derived from it; drained once per
/// frame by the caller.
pub struct InputAggregator {
    held_keys: HashSet<KeyCode>,
    held_buttons: HashSet<MouseButton>,
    pointer: (f32, f32),
    drag: Option<DragState>,
    viewport: (f32, f32),
    edge_scroll_threshold: f32,
    queue: Vec<Command>,
}

impl InputAggregator {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            held_keys: HashSet::new(),
            held_buttons: HashSet::new(),
            pointer: (0.0, 0.0),
            drag: None,
            viewport: (viewport_width as f32, viewport_height as f32),
            edge_scroll_threshold: config::get().display.edge_scroll_threshold_px,
            queue: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width as f32, height as f32);
    }

    pub fn is_key_held(&self, code: KeyCode) -> bool {
        self.held_keys.contains(&code)
    }

    fn additive_held(&self) -> bool {
        self.held_keys.contains(&KeyCode::ADDITIVE_SELECT_MODIFIER)
    }

    pub fn handle_event(&mut self, event: RawInputEvent) -> EventHandled {
        match event {
            RawInputEvent::Key(key_event) => {
                match key_event {
                    KeyEvent::Down(code) => {
                        self.held_keys.insert(code);
                        self.queue.push(Command::Hotkey { code });
                    }
                    KeyEvent::Up(code) => {
                        self.held_keys.remove(&code);
                    }
                }
                EventHandled::Handled
            }

            RawInputEvent::MouseMove { x, y } => {
                self.pointer = (x, y);
                EventHandled::Handled
            }

            RawInputEvent::MouseButton { button, down, x, y } => {
                self.pointer = (x, y);
                if down {
                    self.held_buttons.insert(button);
                    if button == MouseButton::Left {
                        self.drag = Some(DragState {
                            start: (x, y),
                            additive: self.additive_held(),
                        });
                    } else if button == MouseButton::Right {
                        self.queue.push(Command::CommandAtScreen {
                            x,
                            y,
                            kind: CommandKind::Smart,
                        });
                    }
                } else {
                    self.held_buttons.remove(&button);
                    if button == MouseButton::Left {
                        if let Some(drag) = self.drag.take() {
                            self.queue.push(self.resolve_drag(drag, x, y));
                        }
                    }
                }
                EventHandled::Handled
            }

            RawInputEvent::Wheel { delta, x, y, ctrl_key, precise } => {
                let pinch = ctrl_key || precise;
                let scaled = if pinch { delta } else { delta * WHEEL_DELTA_SCALE };
                let clamped = scaled.clamp(-ZOOM_DELTA_MAX, ZOOM_DELTA_MAX);
                self.queue.push(Command::ZoomAtScreen {
                    delta: clamped,
                    screen_x: x,
                    screen_y: y,
                });
                EventHandled::Handled
            }

            RawInputEvent::TrackpadPan { dx, dy } => {
                self.queue.push(Command::Pan { dx, dy });
                EventHandled::Handled
            }

            RawInputEvent::PointerCaptureLost | RawInputEvent::WindowBlur => {
                self.held_keys.clear();
                self.held_buttons.clear();
                self.drag = None;
                EventHandled::Handled
            }
        }
    }

    fn resolve_drag(&self, drag: DragState, x: f32, y: f32) -> Command {
        let (sx, sy) = drag.start;
        if (x - sx).abs() >= DRAG_THRESHOLD_PX || (y - sy).abs() >= DRAG_THRESHOLD_PX {
            Command::BoxSelect {
                x0: sx,
                y0: sy,
                x1: x,
                y1: y,
                additive: drag.additive,
            }
        } else {
            Command::SelectAtScreen { x, y, additive: drag.additive }
        }
    }

    /// Emits a continuous `Pan` when the pointer sits within the edge-scroll band of the
    /// viewport. Callers poll this once per frame alongside `take_commands`.
    pub fn poll_edge_scroll(&self, dt_seconds: f32) -> Option<Command> {
        let (x, y) = self.pointer;
        let (w, h) = self.viewport;
        let t = self.edge_scroll_threshold;

        let mut dx = 0.0;
        let mut dy = 0.0;
        if x < t {
            dx -= 1.0;
        } else if x > w - t {
            dx += 1.0;
        }
        if y < t {
            dy -= 1.0;
        } else if y > h - t {
            dy += 1.0;
        }

        if dx == 0.0 && dy == 0.0 {
            return None;
        }

        let speed = EDGE_SCROLL_SPEED_PX_PER_SEC * dt_seconds;
        Some(Command::Pan { dx: dx * speed, dy: dy * speed })
    }

    /// Drains and returns every command queued since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_without_drag_emits_select() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: true,
            x: 10.0,
            y: 10.0,
        });
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: false,
            x: 11.0,
            y: 10.0,
        });

        let commands = input.take_commands();
        assert_eq!(
            commands,
            vec![Command::SelectAtScreen { x: 11.0, y: 10.0, additive: false }]
        );
    }

    #[test]
    fn drag_past_threshold_emits_box_select() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: true,
            x: 10.0,
            y: 10.0,
        });
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: false,
            x: 100.0,
            y: 120.0,
        });

        let commands = input.take_commands();
        assert_eq!(
            commands,
            vec![Command::BoxSelect { x0: 10.0, y0: 10.0, x1: 100.0, y1: 120.0, additive: false }]
        );
    }

    #[test]
    fn ctrl_wheel_is_treated_as_pinch_and_not_rescaled() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::Wheel {
            delta: 0.1,
            x: 5.0,
            y: 5.0,
            ctrl_key: true,
            precise: false,
        });

        let commands = input.take_commands();
        assert_eq!(
            commands,
            vec![Command::ZoomAtScreen { delta: 0.1, screen_x: 5.0, screen_y: 5.0 }]
        );
    }

    #[test]
    fn wheel_delta_is_clamped() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::Wheel {
            delta: 1000.0,
            x: 0.0,
            y: 0.0,
            ctrl_key: true,
            precise: false,
        });

        let commands = input.take_commands();
        assert_eq!(
            commands,
            vec![Command::ZoomAtScreen { delta: ZOOM_DELTA_MAX, screen_x: 0.0, screen_y: 0.0 }]
        );
    }

    #[test]
    fn window_blur_clears_drag_and_held_state() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::Key(KeyEvent::Down(KeyCode(1))));
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: true,
            x: 0.0,
            y: 0.0,
        });
        input.take_commands();

        input.handle_event(RawInputEvent::WindowBlur);

        assert!(!input.is_key_held(KeyCode(1)));
        input.handle_event(RawInputEvent::MouseButton {
            button: MouseButton::Left,
            down: false,
            x: 0.0,
            y: 0.0,
        });
        // drag was cleared by the blur, so mouse-up here starts fresh with no pending
        // drag to resolve into a select/box-select command.
        assert!(input.take_commands().is_empty());
    }

    #[test]
    fn edge_scroll_emits_pan_near_viewport_edge() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::MouseMove { x: 2.0, y: 300.0 });
        let pan = input.poll_edge_scroll(1.0 / 60.0);
        assert!(matches!(pan, Some(Command::Pan { dx, .. }) if dx < 0.0));
    }

    #[test]
    fn no_edge_scroll_away_from_edges() {
        let mut input = InputAggregator::new(800, 600);
        input.handle_event(RawInputEvent::MouseMove { x: 400.0, y: 300.0 });
        assert!(input.poll_edge_scroll(1.0 / 60.0).is_none());
    }
}
