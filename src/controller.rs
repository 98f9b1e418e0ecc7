use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use log::debug;

use crate::camera::PerspectiveCamera;
use crate::config::ControlsConfig;
use crate::input::{InputSource, ListenerId};

/// Smallest polar angle actually used, keeps look-at well defined at the pole
const POLAR_EPSILON: f32 = 1e-6;
/// Wheel zoom per tick, as a radius multiplier
const ZOOM_STEP: f32 = 0.95;
const MAX_ANGULAR_VELOCITY: f32 = 4.0 * TAU;
const MAX_ZOOM_VELOCITY: f32 = 16.0;
/// Damping factors are tuned against this frame rate
const REFERENCE_FPS: f32 = 60.0;
const MAX_FRAME_DELTA: f32 = 0.25;

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer, touch and wheel input in window pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        pointer: PointerId,
        button: PointerButton,
        position: Vec2,
    },
    Move {
        pointer: PointerId,
        position: Vec2,
    },
    Up {
        pointer: PointerId,
    },
    /// Positive delta zooms out, in wheel ticks
    Wheel {
        position: Vec2,
        delta: f32,
    },
}

/// Screen rectangle the viewer occupies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let rel = point - self.origin;
        rel.x >= 0.0 && rel.y >= 0.0 && rel.x < self.size.x && rel.y < self.size.y
    }
}

/// Camera offset from the target in spherical coordinates
///
/// `polar` is measured from +Y, so `PI / 2` sits on the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }

        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Velocity {
    azimuth: f32,
    polar: f32,
    /// Natural log of the radius multiplier still to apply
    zoom: f32,
}

#[derive(Debug, Clone, Copy)]
struct ActivePointer {
    id: PointerId,
    position: Vec2,
}

/// Damped orbit controls around a fixed target at the origin
#[derive(Debug)]
pub struct CameraController {
    config: ControlsConfig,
    region: Region,
    target: Vec3,
    spherical: Spherical,
    velocity: Velocity,
    pointers: Vec<ActivePointer>,
    listener: Option<ListenerId>,
}

impl CameraController {
    /// Starts from the camera's current position, pulled into the allowed ranges
    pub fn new(config: &ControlsConfig, camera: &PerspectiveCamera, region: Region) -> Self {
        let target = camera.target();
        let mut controller = Self {
            config: *config,
            region,
            target,
            spherical: Spherical::from_offset(camera.position - target),
            velocity: Velocity::default(),
            pointers: Vec::new(),
            listener: None,
        };
        controller.clamp();
        controller
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// True while some accumulated motion has yet to be applied
    pub fn is_moving(&self) -> bool {
        const REST: f32 = 1e-5;
        self.velocity.azimuth.abs() > REST
            || self.velocity.polar.abs() > REST
            || self.velocity.zoom.abs() > REST
    }

    /// Subscribes to pointer input for the viewer region
    pub fn bind(&mut self, input: &mut dyn InputSource) {
        if self.listener.is_none() {
            self.listener = Some(input.subscribe(self.region));
        }
    }

    /// Releases the input subscription; safe to call repeatedly
    pub fn unbind(&mut self, input: &mut dyn InputSource) {
        if let Some(id) = self.listener.take() {
            input.unsubscribe(id);
        }
        self.pointers.clear();
        self.velocity = Velocity::default();
    }

    /// Accumulates input into the orbit velocity; returns whether it was used
    pub fn handle_event(&mut self, event: &PointerEvent) -> bool {
        if !self.is_bound() {
            return false;
        }

        match *event {
            PointerEvent::Down {
                pointer,
                button,
                position,
            } => {
                if !self.region.contains(position) {
                    return false;
                }
                if button != PointerButton::Primary {
                    // panning would move the target off the origin
                    debug!("Ignoring {:?} drag: panning is disabled", button);
                    return false;
                }
                self.pointers.retain(|p| p.id != pointer);
                self.pointers.push(ActivePointer {
                    id: pointer,
                    position,
                });
                true
            }
            PointerEvent::Move { pointer, position } => self.pointer_moved(pointer, position),
            PointerEvent::Up { pointer } => {
                let before = self.pointers.len();
                self.pointers.retain(|p| p.id != pointer);
                before != self.pointers.len()
            }
            PointerEvent::Wheel { position, delta } => {
                if !self.region.contains(position) || !delta.is_finite() {
                    return false;
                }
                self.add_zoom(delta * self.config.zoom_speed * (1.0 / ZOOM_STEP).ln());
                true
            }
        }
    }

    fn pointer_moved(&mut self, pointer: PointerId, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(index) = self.pointers.iter().position(|p| p.id == pointer) else {
            return false;
        };

        match self.pointers.len() {
            1 => {
                let delta = position - self.pointers[index].position;
                let scale = TAU * self.config.rotate_speed / self.region.size.y.max(1.0);
                self.add_rotation(-delta.x * scale, -delta.y * scale);
            }
            _ => {
                let other = self.pointers[if index == 0 { 1 } else { 0 }].position;
                let before = self.pointers[index].position.distance(other);
                let after = position.distance(other);
                if before > 0.0 && after > 0.0 {
                    self.add_zoom((before / after).ln() * self.config.zoom_speed);
                }
            }
        }

        self.pointers[index].position = position;
        true
    }

    fn add_rotation(&mut self, azimuth: f32, polar: f32) {
        let limit = |v: f32| v.clamp(-MAX_ANGULAR_VELOCITY, MAX_ANGULAR_VELOCITY);
        if azimuth.is_finite() && polar.is_finite() {
            self.velocity.azimuth = limit(self.velocity.azimuth + azimuth);
            self.velocity.polar = limit(self.velocity.polar + polar);
        }
    }

    fn add_zoom(&mut self, log_scale: f32) {
        if log_scale.is_finite() {
            self.velocity.zoom =
                (self.velocity.zoom + log_scale).clamp(-MAX_ZOOM_VELOCITY, MAX_ZOOM_VELOCITY);
        }
    }

    /// Applies a damped share of the pending motion and moves the camera
    pub fn update(&mut self, delta_time: f32, camera: &mut PerspectiveCamera) {
        let dt = if delta_time.is_finite() {
            delta_time.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        let keep = (1.0 - self.config.damping_factor).powf(dt * REFERENCE_FPS);
        let applied = 1.0 - keep;

        self.spherical.azimuth += self.velocity.azimuth * applied;
        self.spherical.polar += self.velocity.polar * applied;
        self.spherical.radius *= (self.velocity.zoom * applied).exp();

        self.velocity.azimuth *= keep;
        self.velocity.polar *= keep;
        self.velocity.zoom *= keep;

        self.clamp();
        camera.position = self.target + self.spherical.to_offset();
    }

    fn clamp(&mut self) {
        let c = &self.config;
        let s = &mut self.spherical;

        s.azimuth = wrap_angle(s.azimuth);
        s.polar = s.polar.clamp(c.min_polar.max(POLAR_EPSILON), c.max_polar);
        s.radius = if s.radius.is_finite() {
            s.radius.clamp(c.min_radius, c.max_radius)
        } else {
            c.max_radius
        };
    }
}

fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
