use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};
use product_viewer::camera::PerspectiveCamera;
use product_viewer::config::{CameraConfig, ControlsConfig};
use product_viewer::controller::{CameraController, PointerButton, PointerEvent, Region};
use product_viewer::input::{InputSource, ListenerRegistry};

/// Deterministic pseudo-random stream for input fuzzing
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 40) as f32 / (1u64 << 24) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

fn setup(config: &ControlsConfig) -> (CameraController, PerspectiveCamera, ListenerRegistry) {
    let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
    let region = Region::new(0.0, 0.0, 500.0, 500.0);
    let mut input = ListenerRegistry::default();
    let mut controller = CameraController::new(config, &camera, region);
    controller.bind(&mut input);
    (controller, camera, input)
}

#[cfg(test)]
mod orbit_controls_tests {
    use super::*;

    #[test]
    fn test_bounds_hold_under_extreme_input() {
        let config = ControlsConfig::default();
        let (mut controller, mut camera, _input) = setup(&config);
        let mut rng = Lcg(0x5eed);

        controller.handle_event(&PointerEvent::Down {
            pointer: 1,
            button: PointerButton::Primary,
            position: Vec2::new(250.0, 250.0),
        });

        for step in 0..2000 {
            match step % 4 {
                0 | 1 => {
                    controller.handle_event(&PointerEvent::Move {
                        pointer: 1,
                        position: Vec2::new(rng.range(-1e5, 1e5), rng.range(-1e5, 1e5)),
                    });
                }
                2 => {
                    controller.handle_event(&PointerEvent::Wheel {
                        position: Vec2::new(250.0, 250.0),
                        delta: rng.range(-500.0, 500.0),
                    });
                }
                _ => {}
            }
            controller.update(rng.range(0.0, 0.5), &mut camera);

            let s = controller.spherical();
            assert!(s.polar >= 0.0 && s.polar <= FRAC_PI_2 + 1e-5, "polar {}", s.polar);
            assert!(
                s.radius >= config.min_radius - 1e-4 && s.radius <= config.max_radius + 1e-3,
                "radius {}",
                s.radius
            );
            assert!(s.azimuth > -PI - 1e-5 && s.azimuth <= PI + 1e-5);
            assert!(camera.position.is_finite());
            assert!(camera.position.y >= -1e-3, "camera dipped below the horizon");
        }
    }

    #[test]
    fn test_motion_decays_to_rest() {
        let (mut controller, mut camera, _input) = setup(&ControlsConfig::default());

        controller.handle_event(&PointerEvent::Wheel {
            position: Vec2::new(100.0, 100.0),
            delta: 3.0,
        });
        assert!(controller.is_moving());

        for _ in 0..600 {
            controller.update(1.0 / 60.0, &mut camera);
        }

        assert!(!controller.is_moving());
        let settled = camera.position;
        controller.update(1.0 / 60.0, &mut camera);
        assert!((camera.position - settled).length() < 1e-4);
    }

    #[test]
    fn test_camera_always_faces_origin() {
        let (mut controller, mut camera, _input) = setup(&ControlsConfig::default());

        controller.handle_event(&PointerEvent::Down {
            pointer: 7,
            button: PointerButton::Primary,
            position: Vec2::new(200.0, 200.0),
        });
        controller.handle_event(&PointerEvent::Move {
            pointer: 7,
            position: Vec2::new(320.0, 150.0),
        });
        for _ in 0..30 {
            controller.update(1.0 / 60.0, &mut camera);
        }

        assert_eq!(controller.target(), Vec3::ZERO);
        assert!((camera.forward() - (-camera.position).normalize()).length() < 1e-4);
    }

    #[test]
    fn test_secondary_drag_does_not_pan() {
        let (mut controller, mut camera, _input) = setup(&ControlsConfig::default());
        let start = camera.position;

        let used = controller.handle_event(&PointerEvent::Down {
            pointer: 2,
            button: PointerButton::Secondary,
            position: Vec2::new(250.0, 250.0),
        });
        controller.handle_event(&PointerEvent::Move {
            pointer: 2,
            position: Vec2::new(400.0, 400.0),
        });
        controller.update(1.0 / 60.0, &mut camera);

        assert!(!used);
        assert!((camera.position - start).length() < 1e-5);
        assert_eq!(controller.target(), Vec3::ZERO);
    }

    #[test]
    fn test_pinch_out_zooms_in() {
        let (mut controller, mut camera, _input) = setup(&ControlsConfig::default());
        let start_radius = controller.spherical().radius;

        for (id, x) in [(1, 200.0), (2, 300.0)] {
            controller.handle_event(&PointerEvent::Down {
                pointer: id,
                button: PointerButton::Primary,
                position: Vec2::new(x, 250.0),
            });
        }
        controller.handle_event(&PointerEvent::Move {
            pointer: 2,
            position: Vec2::new(400.0, 250.0),
        });
        controller.update(1.0 / 60.0, &mut camera);

        assert!(controller.spherical().radius < start_radius);
    }

    #[test]
    fn test_unbind_stops_listening() {
        let (mut controller, mut camera, mut input) = setup(&ControlsConfig::default());
        assert_eq!(input.listener_count(), 1);

        controller.unbind(&mut input);
        controller.unbind(&mut input);

        assert_eq!(input.listener_count(), 0);
        assert!(!controller.handle_event(&PointerEvent::Wheel {
            position: Vec2::new(250.0, 250.0),
            delta: 1.0,
        }));
        let before = camera.position;
        controller.update(1.0 / 60.0, &mut camera);
        assert!((camera.position - before).length() < 1e-5);
    }
}
