use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform placed at `position`, turned `yaw` radians about +Y and
    /// uniformly scaled.
    pub fn from_placement(position: Vec3, yaw: f32, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
            scale: Vec3::splat(scale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("colour must start with '#': {0}")]
    MissingHash(String),
    #[error("colour must have 6 hex digits: {0}")]
    BadLength(String),
    #[error("invalid hex digit in colour: {0}")]
    BadDigit(String),
}

/// Linear RGB colour, serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if digits.len() != 6 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .map(|v| v as f32 / 255.0)
                .ok_or_else(|| ColorParseError::BadDigit(s.to_string()))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn placement_sets_uniform_scale() {
        let t = Transform::from_placement(Vec3::new(50.0, -0.1, 0.0), 0.0, 20.0);
        assert_eq!(t.scale, Vec3::splat(20.0));
        assert_eq!(t.position.x, 50.0);
    }

    #[test]
    fn smoke_colour_parses() {
        let c = Color::from_hex("#3b393b").unwrap();
        assert!((c.r - 59.0 / 255.0).abs() < 1e-6);
        assert!((c.g - 57.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.to_hex(), "#3b393b");
    }

    #[test]
    fn bad_colours_rejected() {
        assert!(matches!(
            Color::from_hex("3b393b"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            Color::from_hex("#fff"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Color::from_hex("#zz0000"),
            Err(ColorParseError::BadDigit(_))
        ));
    }
}
