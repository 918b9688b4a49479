//! Orbit camera with damped drag and wheel input.
//!
//! The camera sits on a sphere around `target`: `theta` is the azimuth about
//! +Y measured from +Z, `phi` the polar angle measured from +Y. Input is
//! queued as pending deltas and bled off a fraction per update, which gives
//! the eased stop after a drag.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec3};

/// One wheel notch scales the distance by this much
const ZOOM_STEP: f32 = 0.95;
/// Wheel delta reported for one notch
const WHEEL_NOTCH: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Fraction of pending input applied per update
    pub damping: f32,
    pub rotate_speed: f32,
    /// Revolutions per minute, scaled the usual orbit-control way
    pub auto_rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 25.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            min_distance: 10.0,
            max_distance: 40.0,
            min_polar: 0.05,
            max_polar: PI / 1.5,
            damping: 0.05,
            rotate_speed: 1.0,
            auto_rotate_speed: 0.5,
        }
    }
}

pub struct OrbitCamera {
    config: CameraConfig,
    theta: f32,
    phi: f32,
    distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    /// Pending change of ln(distance)
    pending_zoom: f32,
    viewport_height: f32,
    aspect: f32,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, width: f32, height: f32) -> Self {
        let offset = config.position - config.target;
        let distance = offset.length().clamp(config.min_distance, config.max_distance);
        let phi = if offset.length() > 0.0 {
            (offset.y / offset.length()).clamp(-1.0, 1.0).acos()
        } else {
            config.max_polar
        };
        let theta = offset.x.atan2(offset.z);

        let mut camera = Self {
            theta,
            phi: phi.clamp(config.min_polar, config.max_polar),
            distance,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_zoom: 0.0,
            viewport_height: 1.0,
            aspect: 1.0,
            config,
        };
        camera.resize(width, height);
        camera
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport_height = height.max(1.0);
        self.aspect = width.max(1.0) / self.viewport_height;
    }

    /// Queue a drag of `dx`, `dy` pixels. A full viewport height turns one
    /// revolution.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let per_pixel = TAU / self.viewport_height * self.config.rotate_speed;
        self.pending_theta -= dx * per_pixel;
        self.pending_phi -= dy * per_pixel;
    }

    /// Queue a wheel movement; positive moves away from the target
    pub fn zoom(&mut self, wheel_delta: f32) {
        let notches = wheel_delta / WHEEL_NOTCH;
        self.pending_zoom -= notches * ZOOM_STEP.ln();
    }

    /// Apply a damped share of pending input, plus auto-rotation
    pub fn update(&mut self, dt: f32, auto_rotate: bool) {
        if auto_rotate {
            self.theta += TAU / 60.0 * self.config.auto_rotate_speed * dt;
        }

        let d = self.config.damping.clamp(0.0, 1.0);
        self.theta += self.pending_theta * d;
        self.phi += self.pending_phi * d;
        self.distance *= (self.pending_zoom * d).exp();
        self.pending_theta *= 1.0 - d;
        self.pending_phi *= 1.0 - d;
        self.pending_zoom *= 1.0 - d;

        self.phi = self.phi.clamp(self.config.min_polar, self.config.max_polar);
        self.distance = self.distance.clamp(self.config.min_distance, self.config.max_distance);
    }

    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.config.target
            + Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.position(), self.config.target, Vec3::UP)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(
            self.config.fov_degrees.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(CameraConfig::default(), 800.0, 600.0)
    }

    #[test]
    fn test_starts_at_configured_position() {
        let p = camera().position();
        assert!(p.distance(&Vec3::new(0.0, 5.0, 25.0)) < 1e-4);
    }

    #[test]
    fn test_auto_rotate_rate() {
        let mut cam = camera();
        cam.update(1.0, true);
        let expected = TAU / 60.0 * 0.5;
        assert!((cam.azimuth() - expected).abs() < 1e-6);

        let mut idle = camera();
        idle.update(1.0, false);
        assert_eq!(idle.azimuth(), 0.0);
    }

    #[test]
    fn test_drag_is_damped_then_complete() {
        let mut cam = camera();
        cam.orbit(-60.0, 0.0);
        cam.update(0.016, false);
        let first = cam.azimuth();
        let full = 60.0 * TAU / 600.0;
        assert!(first > 0.0 && first < full * 0.1);

        for _ in 0..400 {
            cam.update(0.016, false);
        }
        assert!((cam.azimuth() - full).abs() < 1e-3);
    }

    #[test]
    fn test_polar_is_clamped() {
        let mut cam = camera();
        cam.orbit(0.0, -10_000.0);
        for _ in 0..400 {
            cam.update(0.016, false);
        }
        assert!((cam.polar() - PI / 1.5).abs() < 1e-5);
        assert!(cam.position().y < 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.zoom(500.0);
            cam.update(0.016, false);
        }
        assert!((cam.distance() - 40.0).abs() < 1e-4);

        for _ in 0..200 {
            cam.zoom(-500.0);
            cam.update(0.016, false);
        }
        assert!((cam.distance() - 10.0).abs() < 1e-4);
    }
}
