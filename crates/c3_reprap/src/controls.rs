//! Mouse and keyboard handling
//!
//! Input arrives as [`InputEvent`]s, from a windowing backend or a key
//! script, and is applied to the scene camera or the application state.

use c3_scene::{Camera, Mat4, Vec3};

/// Zoom step per wheel notch
const WHEEL_STEP: f32 = 0.004;
/// Wheel zoom stops this close to the lookat
const WHEEL_MIN_DISTANCE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Positive deltas zoom out
    Wheel(f32),
    /// Motion in pixels with a button held
    Drag { button: MouseButton, dx: f32, dy: f32 },
    Key(char),
}

/// Drag distance of one scripted camera step, in pixels
const SCRIPT_DRAG: f32 = 16.0;

impl InputEvent {
    /// Event for one character of a replay script
    ///
    /// `+`/`-` zoom, `<`/`>` orbit, `[`/`]` pan; anything else is a key.
    pub fn from_script(c: char) -> Self {
        let drag = |button, dx| InputEvent::Drag { button, dx, dy: 0.0 };
        match c {
            '+' => InputEvent::Wheel(1.0),
            '-' => InputEvent::Wheel(-1.0),
            '<' => drag(MouseButton::Left, -SCRIPT_DRAG),
            '>' => drag(MouseButton::Left, SCRIPT_DRAG),
            '[' => drag(MouseButton::Right, -SCRIPT_DRAG),
            ']' => drag(MouseButton::Right, SCRIPT_DRAG),
            c => InputEvent::Key(c),
        }
    }
}

/// What a key asks the application to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleDecal,
    ToggleShadowTarget,
    DumpLightView,
    ToggleFxaa,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' => Some(Command::Quit),
            'm' => Some(Command::ToggleDecal),
            'd' => Some(Command::ToggleShadowTarget),
            'b' => Some(Command::DumpLightView),
            '1' => Some(Command::ToggleFxaa),
            _ => None,
        }
    }
}

/// Zoom the camera; returns whether it moved
pub fn wheel(camera: &mut Camera, delta: f32) -> bool {
    if camera.distance <= WHEEL_MIN_DISTANCE {
        return false;
    }
    let scale = if delta > 0.0 {
        1.0 + WHEEL_STEP
    } else {
        1.0 - WHEEL_STEP
    };
    camera.set_distance(camera.distance * scale);
    true
}

/// Orbit around the lookat: vertical motion tilts about the camera side,
/// horizontal motion turns about world Z
pub fn orbit(camera: &mut Camera, dx: f32, dy: f32) {
    let tilt = Mat4::rotation_axis(camera.side, (dy / 4.0).to_radians());
    let turn = Mat4::rotation_z((dx / 4.0).to_radians());
    camera.rot_about_lookat(&(tilt * turn));
}

/// Slide the camera over the bed plane
pub fn pan(camera: &mut Camera, dx: f32, dy: f32) {
    let across = Vec3::new(-camera.side.y, camera.side.x, 0.0);
    camera.translate(across * (-dy / 4.0));
    camera.movef(dx / 8.0, 0.0, 0.0);
}

/// Apply a camera event; returns whether the camera changed
pub fn apply_camera(camera: &mut Camera, event: InputEvent) -> bool {
    match event {
        InputEvent::Wheel(delta) => wheel(camera, delta),
        InputEvent::Drag {
            button: MouseButton::Left,
            dx,
            dy,
        } => {
            orbit(camera, dx, dy);
            true
        }
        InputEvent::Drag {
            button: MouseButton::Right,
            dx,
            dy,
        } => {
            pan(camera, dx, dy);
            true
        }
        InputEvent::Key(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::looking(
            Vec3::new(100.0, -100.0, 100.0),
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::Z,
        )
    }

    #[test]
    fn test_keys() {
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('d'), Some(Command::ToggleShadowTarget));
        assert_eq!(Command::from_key('1'), Some(Command::ToggleFxaa));
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn test_script_events() {
        assert_eq!(InputEvent::from_script('+'), InputEvent::Wheel(1.0));
        assert_eq!(
            InputEvent::from_script(']'),
            InputEvent::Drag {
                button: MouseButton::Right,
                dx: 16.0,
                dy: 0.0
            }
        );
        assert_eq!(InputEvent::from_script('m'), InputEvent::Key('m'));
    }

    #[test]
    fn test_wheel_zooms() {
        let mut cam = camera();
        let d = cam.distance;
        assert!(wheel(&mut cam, 1.0));
        assert!((cam.distance - d * 1.004).abs() < 1e-2);
        assert!(wheel(&mut cam, -1.0));
        assert!(cam.distance < d * 1.004);
    }

    #[test]
    fn test_wheel_stops_when_close() {
        let mut cam = Camera::looking(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!(!wheel(&mut cam, -1.0));
        assert_eq!(cam.distance, 5.0);
    }

    #[test]
    fn test_orbit_keeps_distance_and_lookat() {
        let mut cam = camera();
        let d = cam.distance;
        orbit(&mut cam, 40.0, 12.0);
        assert!((cam.distance - d).abs() < 1e-2);
        assert_eq!(cam.lookat, Vec3::new(100.0, 100.0, 0.0));
    }

    #[test]
    fn test_pan_moves_lookat() {
        let mut cam = camera();
        let offset = cam.eye - cam.lookat;
        pan(&mut cam, 0.0, -8.0);
        assert!(cam.lookat != Vec3::new(100.0, 100.0, 0.0));
        assert!(((cam.eye - cam.lookat) - offset).length() < 1e-3);
    }

    #[test]
    fn test_key_events_leave_camera() {
        let mut cam = camera();
        let before = cam.clone();
        assert!(!apply_camera(&mut cam, InputEvent::Key('m')));
        assert_eq!(cam, before);
    }
}
