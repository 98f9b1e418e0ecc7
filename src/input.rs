use std::collections::BTreeMap;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::controller::{PointerButton, PointerEvent, PointerId, Region};

/// Pixel scroll distance treated as one wheel tick
const PIXELS_PER_TICK: f32 = 100.0;
/// Wheel ticks per unit of trackpad pinch
const PINCH_TICKS: f32 = 10.0;
const MOUSE_POINTER: PointerId = u64::MAX;

/// Handle for one input subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Host-side source of pointer input that consumers subscribe to
pub trait InputSource {
    /// Register interest in events inside `region`
    fn subscribe(&mut self, region: Region) -> ListenerId;

    /// Remove a subscription; returns false if it was not registered
    fn unsubscribe(&mut self, id: ListenerId) -> bool;

    /// Number of live subscriptions
    fn listener_count(&self) -> usize;
}

/// Bookkeeping for subscriptions, shared by the concrete input sources
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Region>,
}

impl ListenerRegistry {
    /// Whether any listener covers this point
    pub fn covers(&self, point: Vec2) -> bool {
        self.listeners.values().any(|region| region.contains(point))
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl InputSource for ListenerRegistry {
    fn subscribe(&mut self, region: Region) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, region);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Adapter that turns winit window events into pointer events
///
/// Nothing is produced while there are no subscribers, and presses that start
/// outside every subscribed region are dropped.
#[derive(Debug, Default)]
pub struct WinitInput {
    registry: ListenerRegistry,
    cursor: Option<Vec2>,
    mouse_down: bool,
}

impl WinitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor position (if available)
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Translate one window event
    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
        }
        if self.registry.is_empty() {
            self.mouse_down = false;
            return None;
        }

        match event {
            WindowEvent::CursorMoved { .. } => {
                let position = self.cursor?;
                self.mouse_down.then_some(PointerEvent::Move {
                    pointer: MOUSE_POINTER,
                    position,
                })
            }
            WindowEvent::CursorLeft { .. } => self.release_mouse(),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = Self::mouse_button(*button)?;
                match state {
                    ElementState::Pressed => {
                        let position = self.cursor?;
                        if !self.registry.covers(position) {
                            return None;
                        }
                        self.mouse_down = button == PointerButton::Primary;
                        Some(PointerEvent::Down {
                            pointer: MOUSE_POINTER,
                            button,
                            position,
                        })
                    }
                    ElementState::Released => self.release_mouse(),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let position = self.cursor?;
                self.registry.covers(position).then(|| PointerEvent::Wheel {
                    position,
                    delta: wheel_ticks(delta),
                })
            }
            WindowEvent::PinchGesture { delta, .. } => {
                let position = self.cursor?;
                self.registry.covers(position).then(|| PointerEvent::Wheel {
                    position,
                    delta: -(*delta as f32) * PINCH_TICKS,
                })
            }
            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => {
                        self.registry.covers(position).then_some(PointerEvent::Down {
                            pointer: touch.id,
                            button: PointerButton::Primary,
                            position,
                        })
                    }
                    TouchPhase::Moved => Some(PointerEvent::Move {
                        pointer: touch.id,
                        position,
                    }),
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        Some(PointerEvent::Up { pointer: touch.id })
                    }
                }
            }
            _ => None,
        }
    }

    fn release_mouse(&mut self) -> Option<PointerEvent> {
        std::mem::take(&mut self.mouse_down).then_some(PointerEvent::Up {
            pointer: MOUSE_POINTER,
        })
    }

    fn mouse_button(button: MouseButton) -> Option<PointerButton> {
        match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right => Some(PointerButton::Secondary),
            MouseButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }
}

impl InputSource for WinitInput {
    fn subscribe(&mut self, region: Region) -> ListenerId {
        self.registry.subscribe(region)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let removed = self.registry.unsubscribe(id);
        if self.registry.is_empty() {
            self.mouse_down = false;
        }
        removed
    }

    fn listener_count(&self) -> usize {
        self.registry.listener_count()
    }
}

/// Converts a winit scroll into wheel ticks (positive zooms out)
pub fn wheel_ticks(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -*y,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) / PIXELS_PER_TICK,
    }
}
