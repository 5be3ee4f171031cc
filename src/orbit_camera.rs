//! Mouse-driven orbit camera.
//!
//! Dragging with the primary button orbits the model: horizontal motion spins
//! it about the vertical axis through a [`Trackball`], vertical motion slides
//! it up and down. The wheel zooms toward the scene point under the cursor.
//!
//! ```
//! use crystal::{InteractionEvent, MouseButton, OrbitCamera, ViewerConfig};
//!
//! let mut orbit = OrbitCamera::from_config(&ViewerConfig::default());
//! orbit.handle_event(InteractionEvent::ButtonDown { button: MouseButton::Left, x: 400.0, y: 300.0 });
//! orbit.handle_event(InteractionEvent::Motion { x: 500.0, y: 300.0 });
//! orbit.handle_event(InteractionEvent::ButtonUp { button: MouseButton::Left, x: 500.0, y: 300.0 });
//!
//! // Once per frame:
//! orbit.collapse();
//! let mvp = orbit.projection_matrix() * orbit.model_matrix();
//! # let _ = mvp;
//! ```

use glam::{Mat4, Vec2, Vec3, Vec4};
use winit::event::{MouseButton, WindowEvent};

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::input::{DepthSampler, InteractionEvent, Key, ScrollDirection, WindowEventTranslator};
use crate::quaternion::Quaternion;
use crate::trackball::Trackball;

/// A camera controller that orbits the model in front of a fixed look-at camera.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    camera: Camera,
    initial: Camera,
    rotation: Quaternion,
    translation: Mat4,
    look: Mat4,
    rotation_matrix: Mat4,
    model: Mat4,
    orbiting: bool,
    anchor: Vec2,
    destination: Vec2,
    width: f32,
    height: f32,
    zoom_anchor: Option<Vec3>,
    zoom_step: f32,
    trackball: Trackball,
    translator: WindowEventTranslator,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        let camera = config.camera();
        let mut orbit = Self {
            camera,
            initial: camera,
            rotation: Quaternion::identity(),
            translation: Mat4::IDENTITY,
            look: Mat4::IDENTITY,
            rotation_matrix: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            orbiting: false,
            anchor: Vec2::ZERO,
            destination: Vec2::ZERO,
            width: config.width as f32,
            height: config.height as f32,
            zoom_anchor: None,
            zoom_step: config.zoom_step,
            trackball: Trackball::new(config.sensitivity),
            translator: WindowEventTranslator::new(),
        };
        orbit.collapse();
        orbit
    }

    /// Replace the camera; it also becomes the view restored by [`Key::Reset`].
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self.initial = camera;
        self.collapse();
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.set_viewport(width, height);
        self
    }

    pub fn with_zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.trackball.sensitivity = sensitivity;
        self
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn rotation(&self) -> &Quaternion {
        &self.rotation
    }

    pub fn translation(&self) -> Mat4 {
        self.translation
    }

    pub fn is_orbiting(&self) -> bool {
        self.orbiting
    }

    pub fn zoom_anchor(&self) -> Option<Vec3> {
        self.zoom_anchor
    }

    pub fn set_zoom_anchor(&mut self, anchor: Vec3) {
        self.zoom_anchor = Some(anchor);
    }

    /// Model matrix as of the last [`collapse`](Self::collapse).
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn look_matrix(&self) -> Mat4 {
        self.look
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        };
        self.camera.projection_matrix(aspect)
    }

    /// Folds the camera, slide and rotation into the model matrix.
    ///
    /// Call once per frame before drawing: `model = look * translation * rotation`.
    pub fn collapse(&mut self) {
        self.look = self.camera.look_matrix();
        self.rotation_matrix = self.rotation.to_mat4();
        self.model = self.look * self.translation * self.rotation_matrix;
    }

    /// Applies one interaction.
    pub fn handle_event(&mut self, event: InteractionEvent) {
        match event {
            InteractionEvent::ButtonDown {
                button: MouseButton::Left,
                x,
                y,
            } => {
                self.anchor = self.flip(x, y);
                self.destination = self.anchor;
                self.orbiting = true;
            }
            InteractionEvent::ButtonUp {
                button: MouseButton::Left,
                ..
            } => {
                self.orbiting = false;
            }
            InteractionEvent::Motion { x, y } if self.orbiting => {
                self.anchor = self.destination;
                self.destination = self.flip(x, y);
                self.orbit_step();
            }
            InteractionEvent::Wheel {
                direction,
                x,
                y,
                depth,
            } => {
                match self.unproject(x, self.height - y, depth) {
                    Some(p) => self.zoom_anchor = Some(p),
                    None => log::debug!("zoom anchor at ({}, {}) could not be resolved", x, y),
                }
                self.zoom(direction);
            }
            InteractionEvent::Key(Key::Reset) => self.reset(),
            InteractionEvent::Key(Key::ZoomIn) => self.zoom(ScrollDirection::In),
            InteractionEvent::Key(Key::ZoomOut) => self.zoom(ScrollDirection::Out),
            _ => {}
        }
    }

    /// Applies a winit window event. Returns true if it changed the camera.
    ///
    /// `depth` is asked for the depth under the cursor on wheel events.
    pub fn handle_window_event(&mut self, event: &WindowEvent, depth: &dyn DepthSampler) -> bool {
        if let WindowEvent::Resized(size) = event {
            // Minimised windows report 0x0; keep the last usable viewport.
            if size.width == 0 || size.height == 0 {
                return false;
            }
            self.set_viewport(size.width as f32, size.height as f32);
            return true;
        }
        match self.translator.translate(event, depth) {
            Some(interaction) => {
                self.handle_event(interaction);
                true
            }
            None => false,
        }
    }

    /// Moves the view a step toward (or away from) the zoom anchor.
    ///
    /// The centre moves first, then the eye closes in on the new centre. Without
    /// a resolved anchor the current centre is used.
    pub fn zoom(&mut self, direction: ScrollDirection) {
        let step = match direction {
            ScrollDirection::In => self.zoom_step,
            ScrollDirection::Out => -self.zoom_step,
        };
        let target = self.zoom_anchor.unwrap_or(self.camera.center);

        self.camera.center += (target - self.camera.center) * step;
        self.camera.eye += (self.camera.center - self.camera.eye) * step;

        log::debug!(
            "zoom {:?}: eye {} center {}",
            direction,
            self.camera.eye,
            self.camera.center
        );
    }

    /// Restores the initial view.
    pub fn reset(&mut self) {
        self.camera = self.initial;
        self.rotation.zero();
        self.translation = Mat4::IDENTITY;
        self.zoom_anchor = None;
        self.orbiting = false;
        self.collapse();
    }

    /// Maps viewport coordinates (origin bottom-left) and a `[0, 1]` depth back
    /// to model space through `projection * model`.
    pub fn unproject(&self, x: f32, y: f32, depth: f32) -> Option<Vec3> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let ndc = Vec4::new(
            2.0 * x / self.width - 1.0,
            2.0 * y / self.height - 1.0,
            depth,
            1.0,
        );
        let inverse = (self.projection_matrix() * self.model).inverse();
        let p = inverse * ndc;
        if p.w.abs() < f32::EPSILON || !p.is_finite() {
            return None;
        }
        Some(p.truncate() / p.w)
    }

    fn flip(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, self.height - y)
    }

    fn orbit_step(&mut self) {
        let delta = self.destination - self.anchor;

        if delta.y != 0.0 && self.width > 0.0 {
            let slide = delta.y * (self.camera.distance() / self.width);
            self.translation = Mat4::from_translation(Vec3::Y * slide) * self.translation;
            log::debug!("slide {}", slide);
        }

        if delta.x != 0.0 {
            match self
                .trackball
                .rotation(self.anchor, self.destination, self.width)
            {
                Some(incremental) => {
                    self.rotation = incremental * self.rotation;
                    log::debug!("orbit by {}", incremental);
                }
                None => log::debug!("orbit step too small, skipped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(orbit: &mut OrbitCamera, x: f32, y: f32) {
        orbit.handle_event(InteractionEvent::ButtonDown {
            button: MouseButton::Left,
            x,
            y,
        });
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn horizontal_drag_only_rotates() {
        let mut orbit = OrbitCamera::new();
        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::Motion { x: 600.0, y: 300.0 });

        assert_ne!(*orbit.rotation(), Quaternion::identity());
        assert_eq!(orbit.translation(), Mat4::IDENTITY);
    }

    #[test]
    fn vertical_drag_only_slides() {
        let mut orbit = OrbitCamera::new();
        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::Motion { x: 400.0, y: 200.0 });

        assert_eq!(*orbit.rotation(), Quaternion::identity());
        // Up the screen is +100 in flipped coordinates.
        let expected = 100.0 * orbit.camera().distance() / 800.0;
        let t = orbit.translation().w_axis.truncate();
        assert!(approx(t, Vec3::new(0.0, expected, 0.0)));
    }

    #[test]
    fn motion_without_button_does_nothing() {
        let mut orbit = OrbitCamera::new();
        orbit.handle_event(InteractionEvent::Motion { x: 700.0, y: 100.0 });
        assert_eq!(*orbit.rotation(), Quaternion::identity());
        assert_eq!(orbit.translation(), Mat4::IDENTITY);

        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::ButtonUp {
            button: MouseButton::Left,
            x: 400.0,
            y: 300.0,
        });
        orbit.handle_event(InteractionEvent::Motion { x: 700.0, y: 100.0 });
        assert!(!orbit.is_orbiting());
        assert_eq!(*orbit.rotation(), Quaternion::identity());
    }

    #[test]
    fn drags_accumulate_about_vertical_axis() {
        let mut orbit = OrbitCamera::new();
        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::Motion { x: 600.0, y: 300.0 });
        orbit.handle_event(InteractionEvent::Motion { x: 800.0, y: 300.0 });

        // Two steps covering the right half of the trackball: a quarter turn.
        let v = orbit.rotation().rotate(Vec3::Z);
        assert!(approx(v, Vec3::X));
    }

    #[test]
    fn collapse_composes_look_translation_rotation() {
        let mut orbit = OrbitCamera::new();
        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::Motion { x: 600.0, y: 250.0 });
        orbit.collapse();

        let mut rotation = *orbit.rotation();
        let expected = orbit.camera().look_matrix() * orbit.translation() * rotation.to_mat4();
        assert!(orbit.model_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn zoom_in_moves_center_then_eye() {
        let mut orbit = OrbitCamera::new();
        orbit.set_zoom_anchor(Vec3::new(10.0, 0.0, 0.0));
        orbit.zoom(ScrollDirection::In);

        assert!(approx(orbit.camera().center, Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(orbit.camera().eye, Vec3::new(0.1, 4.5, 45.0)));
    }

    #[test]
    fn zoom_out_backs_away() {
        let mut orbit = OrbitCamera::new();
        orbit.set_zoom_anchor(Vec3::new(10.0, 0.0, 0.0));
        orbit.zoom(ScrollDirection::Out);

        assert!(approx(orbit.camera().center, Vec3::new(-1.0, 0.0, 0.0)));
        assert!(approx(orbit.camera().eye, Vec3::new(0.1, 5.5, 55.0)));
    }

    #[test]
    fn wheel_anchors_zoom_on_point_under_cursor() {
        let mut orbit = OrbitCamera::new();
        let target = Vec3::new(3.0, 2.0, -1.0);

        let clip = orbit.projection_matrix() * orbit.model_matrix() * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * 800.0;
        let y = 600.0 - (ndc.y + 1.0) * 0.5 * 600.0;

        orbit.handle_event(InteractionEvent::Wheel {
            direction: ScrollDirection::In,
            x,
            y,
            depth: ndc.z,
        });

        let anchor = orbit.zoom_anchor().unwrap();
        assert!((anchor - target).length() < 1e-2);
        assert!(orbit.camera().center.x > 0.0);
    }

    #[test]
    fn keys_zoom_and_reset() {
        let mut orbit = OrbitCamera::new();
        orbit.handle_event(InteractionEvent::Key(Key::ZoomIn));
        // No anchor: zoom toward the current centre.
        assert!(approx(orbit.camera().eye, Vec3::new(0.0, 4.5, 45.0)));

        press(&mut orbit, 400.0, 300.0);
        orbit.handle_event(InteractionEvent::Motion { x: 650.0, y: 100.0 });
        orbit.handle_event(InteractionEvent::Key(Key::Reset));

        assert_eq!(*orbit.camera(), Camera::default());
        assert_eq!(*orbit.rotation(), Quaternion::identity());
        assert_eq!(orbit.translation(), Mat4::IDENTITY);
        assert!(!orbit.is_orbiting());
    }

    #[test]
    fn zero_width_viewport_keeps_model_finite() {
        let mut orbit = OrbitCamera::new().with_viewport(0.0, 0.0);
        press(&mut orbit, 10.0, 10.0);
        orbit.handle_event(InteractionEvent::Motion { x: 10.0, y: 20.0 });
        orbit.handle_event(InteractionEvent::Motion { x: 30.0, y: 40.0 });
        orbit.collapse();

        assert_eq!(orbit.translation(), Mat4::IDENTITY);
        assert!(orbit.model_matrix().is_finite());
    }

    #[test]
    fn minimised_window_does_not_poison_slide() {
        let mut orbit = OrbitCamera::new();
        let minimised = WindowEvent::Resized(winit::dpi::PhysicalSize::new(0, 0));
        assert!(!orbit.handle_window_event(&minimised, &|_: f32, _: f32| 1.0));
        assert_eq!(orbit.viewport(), Vec2::new(800.0, 600.0));

        press(&mut orbit, 0.0, 0.0);
        orbit.handle_event(InteractionEvent::Motion { x: 0.0, y: 25.0 });
        orbit.collapse();
        assert!(orbit.model_matrix().is_finite());
    }

    #[test]
    fn resize_updates_viewport() {
        let mut orbit = OrbitCamera::new();
        let event = WindowEvent::Resized(winit::dpi::PhysicalSize::new(1024, 768));
        assert!(orbit.handle_window_event(&event, &|_: f32, _: f32| 1.0));
        assert_eq!(orbit.viewport(), Vec2::new(1024.0, 768.0));
    }
}
