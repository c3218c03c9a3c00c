use glam::{Vec2, Vec3};

use super::ValueKind;

/// Straight (non-premultiplied) linear RGB color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Dynamically-typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Color(Color),
    Source(String),
}

impl OptionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Scalar(_) => ValueKind::Scalar,
            OptionValue::Vec2(_) => ValueKind::Vec2,
            OptionValue::Vec3(_) => ValueKind::Vec3,
            OptionValue::Color(_) => ValueKind::Color,
            OptionValue::Source(_) => ValueKind::Source,
        }
    }
}

impl From<f32> for OptionValue {
    fn from(v: f32) -> Self {
        OptionValue::Scalar(v)
    }
}

impl From<Vec2> for OptionValue {
    fn from(v: Vec2) -> Self {
        OptionValue::Vec2(v)
    }
}

impl From<Vec3> for OptionValue {
    fn from(v: Vec3) -> Self {
        OptionValue::Vec3(v)
    }
}

impl From<Color> for OptionValue {
    fn from(v: Color) -> Self {
        OptionValue::Color(v)
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Source(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Source(v.to_owned())
    }
}

/// Rust types that can be read out of the option store.
pub trait OptionType: Sized {
    const KIND: ValueKind;

    /// Extracts `Self` if `value` has the matching kind.
    fn from_value(value: OptionValue) -> Option<Self>;
}

impl OptionType for f32 {
    const KIND: ValueKind = ValueKind::Scalar;
    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionType for Vec2 {
    const KIND: ValueKind = ValueKind::Vec2;
    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Vec2(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionType for Vec3 {
    const KIND: ValueKind = ValueKind::Vec3;
    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Vec3(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionType for Color {
    const KIND: ValueKind = ValueKind::Color;
    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Color(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionType for String {
    const KIND: ValueKind = ValueKind::Source;
    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Source(v) => Some(v),
            _ => None,
        }
    }
}
