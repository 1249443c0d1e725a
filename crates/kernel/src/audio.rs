use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Gain model of a positional sound source.
///
/// Distance uses inverse attenuation clamped at `ref_distance`; the
/// directional cone is full gain inside `cone_inner_deg`, `cone_outer_gain`
/// outside `cone_outer_deg`, and linear in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionalEmitter {
    pub ref_distance: f32,
    pub rolloff: f32,
    pub cone_inner_deg: f32,
    pub cone_outer_deg: f32,
    pub cone_outer_gain: f32,
}

impl Default for PositionalEmitter {
    fn default() -> Self {
        Self {
            ref_distance: 1.0,
            rolloff: 1.0,
            cone_inner_deg: 180.0,
            cone_outer_deg: 230.0,
            cone_outer_gain: 0.1,
        }
    }
}

impl PositionalEmitter {
    pub fn distance_gain(&self, distance: f32) -> f32 {
        let r = self.ref_distance.max(f32::EPSILON);
        r / (r + self.rolloff * (distance.max(r) - r))
    }

    /// Cone gain for a listener at `angle_deg` off the emitter's facing.
    pub fn cone_gain(&self, angle_deg: f32) -> f32 {
        let half_inner = self.cone_inner_deg * 0.5;
        let half_outer = self.cone_outer_deg * 0.5;
        let angle = angle_deg.abs();
        if angle <= half_inner {
            1.0
        } else if angle >= half_outer {
            self.cone_outer_gain
        } else {
            let t = (angle - half_inner) / (half_outer - half_inner);
            1.0 + (self.cone_outer_gain - 1.0) * t
        }
    }

    /// Combined gain heard at `listener` from a source at `source` facing
    /// `facing`.
    pub fn gain_at(&self, source: Vec3, facing: Vec3, listener: Vec3) -> f32 {
        let to_listener = listener - source;
        let distance = to_listener.length();
        let cone = match (to_listener.try_normalize(), facing.try_normalize()) {
            (Some(dir), Some(face)) => {
                let angle = dir.dot(face).clamp(-1.0, 1.0).acos().to_degrees();
                self.cone_gain(angle)
            }
            _ => 1.0,
        };
        self.distance_gain(distance) * cone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_gain_inside_ref_distance() {
        let e = PositionalEmitter::default();
        assert_eq!(e.distance_gain(0.0), 1.0);
        assert_eq!(e.distance_gain(1.0), 1.0);
        assert!((e.distance_gain(4.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn distance_gain_falls_off_monotonically() {
        let e = PositionalEmitter::default();
        let mut prev = 1.0;
        for d in 1..50 {
            let g = e.distance_gain(d as f32);
            assert!(g <= prev);
            prev = g;
        }
    }

    #[test]
    fn cone_edges() {
        let e = PositionalEmitter::default();
        assert_eq!(e.cone_gain(0.0), 1.0);
        assert_eq!(e.cone_gain(90.0), 1.0);
        assert_eq!(e.cone_gain(115.0), 0.1);
        assert_eq!(e.cone_gain(180.0), 0.1);
        let mid = e.cone_gain(102.5);
        assert!((mid - 0.55).abs() < 1e-5);
    }

    #[test]
    fn listener_behind_source_is_attenuated() {
        let e = PositionalEmitter::default();
        let front = e.gain_at(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 2.0));
        let back = e.gain_at(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -2.0));
        assert!((front - 0.5).abs() < 1e-6);
        assert!((back - 0.05).abs() < 1e-6);
    }

    #[test]
    fn coincident_listener_is_full_gain() {
        let e = PositionalEmitter::default();
        assert_eq!(e.gain_at(Vec3::ONE, Vec3::Z, Vec3::ONE), 1.0);
    }
}
