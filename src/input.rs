use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Which way the wheel turned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Toward the scene.
    In,
    /// Away from the scene.
    Out,
}

/// Keyboard commands understood by the orbit camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Restore the initial view.
    Reset,
    ZoomIn,
    ZoomOut,
}

impl Key {
    /// Default key bindings: `R` resets, `+` / `-` zoom.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyR | KeyCode::Home => Some(Key::Reset),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(Key::ZoomIn),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(Key::ZoomOut),
            _ => None,
        }
    }
}

/// A user interaction in window coordinates (origin top-left, y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionEvent {
    ButtonDown { button: MouseButton, x: f32, y: f32 },
    ButtonUp { button: MouseButton, x: f32, y: f32 },
    Motion { x: f32, y: f32 },
    /// `depth` is the depth-buffer value under the cursor, in `[0, 1]`.
    Wheel {
        direction: ScrollDirection,
        x: f32,
        y: f32,
        depth: f32,
    },
    Key(Key),
}

/// Reads the depth buffer under the cursor.
///
/// Implemented for closures `Fn(x, y) -> depth`, with window coordinates.
pub trait DepthSampler {
    fn sample_depth(&self, x: f32, y: f32) -> f32;
}

impl<F: Fn(f32, f32) -> f32> DepthSampler for F {
    fn sample_depth(&self, x: f32, y: f32) -> f32 {
        self(x, y)
    }
}

/// Turns winit window events into [`InteractionEvent`]s.
///
/// winit reports the cursor only on `CursorMoved`, so the last position is
/// tracked here and attached to button and wheel events.
#[derive(Clone, Debug, Default)]
pub struct WindowEventTranslator {
    cursor: Vec2,
}

impl WindowEventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known cursor position in window coordinates.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Translates one window event, sampling depth for wheel events.
    pub fn translate(
        &mut self,
        event: &WindowEvent,
        depth: &dyn DepthSampler,
    ) -> Option<InteractionEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InteractionEvent::Motion {
                    x: self.cursor.x,
                    y: self.cursor.y,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let (x, y) = (self.cursor.x, self.cursor.y);
                Some(match state {
                    ElementState::Pressed => InteractionEvent::ButtonDown {
                        button: *button,
                        x,
                        y,
                    },
                    ElementState::Released => InteractionEvent::ButtonUp {
                        button: *button,
                        x,
                        y,
                    },
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                let direction = if dy > 0.0 {
                    ScrollDirection::In
                } else if dy < 0.0 {
                    ScrollDirection::Out
                } else {
                    return None;
                };
                let (x, y) = (self.cursor.x, self.cursor.y);
                Some(InteractionEvent::Wheel {
                    direction,
                    x,
                    y,
                    depth: depth.sample_depth(x, y),
                })
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(code) => Key::from_key_code(code).map(InteractionEvent::Key),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
