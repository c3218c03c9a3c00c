use glam::{Vec2, Vec3};

use crate::colormap::{colormap_implementation, Colormap};

use super::{ChangedOptions, Color, Configuration, OptionType, OptionValue, ValueKind, ViewOption};

/// WGSL visibility predicate that keeps every sample.
pub const ALWAYS_VISIBLE_IMPLEMENTATION: &str =
    "fn is_visible(position: vec3<f32>, direction: vec3<f32>) -> bool {\n    return true;\n}\n";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("option `{key}` holds a {expected:?} value, got a {found:?} value")]
    TypeMismatch {
        key: ViewOption,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// Option store owned by a `View`.
///
/// Every key holds a value from construction on. Mutation goes through
/// [`apply_changes`](Self::apply_changes), which reports exactly the keys
/// whose value changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    bounding_box_min: Vec3,
    bounding_box_max: Vec3,
    system_center: Vec3,
    vertical_field_of_view: f32,
    background_color: Color,
    colormap_implementation: String,
    is_visible_implementation: String,
    camera_position: Vec3,
    center_position: Vec3,
    up_vector: Vec3,
    z_range: Vec2,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bounding_box_min: Vec3::splat(-1.0),
            bounding_box_max: Vec3::splat(1.0),
            system_center: Vec3::ZERO,
            vertical_field_of_view: 45.0,
            background_color: Color::BLACK,
            colormap_implementation: colormap_implementation(Colormap::Hsv).to_owned(),
            is_visible_implementation: ALWAYS_VISIBLE_IMPLEMENTATION.to_owned(),
            camera_position: Vec3::new(14.5, 14.5, 30.0),
            center_position: Vec3::new(14.5, 14.5, 0.0),
            up_vector: Vec3::Y,
            z_range: Vec2::new(-1.0, 1.0),
        }
    }
}

impl Options {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `key` as `T`.
    ///
    /// Fails if `T` is not the key's declared kind.
    pub fn get<T: OptionType>(&self, key: ViewOption) -> Result<T, OptionsError> {
        T::from_value(self.value(key)).ok_or(OptionsError::TypeMismatch {
            key,
            expected: key.kind(),
            found: T::KIND,
        })
    }

    /// Reads `key` as a dynamically-typed value.
    pub fn value(&self, key: ViewOption) -> OptionValue {
        match key {
            ViewOption::BoundingBoxMin => OptionValue::Vec3(self.bounding_box_min),
            ViewOption::BoundingBoxMax => OptionValue::Vec3(self.bounding_box_max),
            ViewOption::SystemCenter => OptionValue::Vec3(self.system_center),
            ViewOption::VerticalFieldOfView => OptionValue::Scalar(self.vertical_field_of_view),
            ViewOption::BackgroundColor => OptionValue::Color(self.background_color),
            ViewOption::ColormapImplementation => {
                OptionValue::Source(self.colormap_implementation.clone())
            }
            ViewOption::IsVisibleImplementation => {
                OptionValue::Source(self.is_visible_implementation.clone())
            }
            ViewOption::CameraPosition => OptionValue::Vec3(self.camera_position),
            ViewOption::CenterPosition => OptionValue::Vec3(self.center_position),
            ViewOption::UpVector => OptionValue::Vec3(self.up_vector),
            ViewOption::ZRange => OptionValue::Vec2(self.z_range),
        }
    }

    /// Applies `config` and returns the keys whose value changed, in
    /// configuration order.
    ///
    /// All entries are kind-checked before anything is stored: a mismatch
    /// rejects the whole configuration and leaves the store untouched.
    pub fn apply_changes(&mut self, config: &Configuration) -> Result<ChangedOptions, OptionsError> {
        for (key, value) in config.iter() {
            check_kind(key, value)?;
        }

        let mut changed = ChangedOptions::new();
        for (key, value) in config.iter() {
            if self.store(key, value.clone())? {
                changed.insert(key);
            }
        }
        Ok(changed)
    }

    /// Stores `value` under `key`; returns whether the stored value changed.
    fn store(&mut self, key: ViewOption, value: OptionValue) -> Result<bool, OptionsError> {
        let changed = match (key, value) {
            (ViewOption::BoundingBoxMin, OptionValue::Vec3(v)) => replace(&mut self.bounding_box_min, v),
            (ViewOption::BoundingBoxMax, OptionValue::Vec3(v)) => replace(&mut self.bounding_box_max, v),
            (ViewOption::SystemCenter, OptionValue::Vec3(v)) => replace(&mut self.system_center, v),
            (ViewOption::VerticalFieldOfView, OptionValue::Scalar(v)) => {
                replace(&mut self.vertical_field_of_view, v)
            }
            (ViewOption::BackgroundColor, OptionValue::Color(v)) => replace(&mut self.background_color, v),
            (ViewOption::ColormapImplementation, OptionValue::Source(v)) => {
                replace(&mut self.colormap_implementation, v)
            }
            (ViewOption::IsVisibleImplementation, OptionValue::Source(v)) => {
                replace(&mut self.is_visible_implementation, v)
            }
            (ViewOption::CameraPosition, OptionValue::Vec3(v)) => replace(&mut self.camera_position, v),
            (ViewOption::CenterPosition, OptionValue::Vec3(v)) => replace(&mut self.center_position, v),
            (ViewOption::UpVector, OptionValue::Vec3(v)) => replace(&mut self.up_vector, v),
            (ViewOption::ZRange, OptionValue::Vec2(v)) => replace(&mut self.z_range, v),
            (key, value) => return Err(mismatch(key, &value)),
        };
        Ok(changed)
    }

    // ── typed accessors ───────────────────────────────────────────────────

    #[inline]
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        (self.bounding_box_min, self.bounding_box_max)
    }

    #[inline]
    pub fn system_center(&self) -> Vec3 {
        self.system_center
    }

    /// Degrees.
    #[inline]
    pub fn vertical_field_of_view(&self) -> f32 {
        self.vertical_field_of_view
    }

    #[inline]
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    #[inline]
    pub fn colormap_implementation(&self) -> &str {
        &self.colormap_implementation
    }

    #[inline]
    pub fn is_visible_implementation(&self) -> &str {
        &self.is_visible_implementation
    }

    #[inline]
    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    #[inline]
    pub fn center_position(&self) -> Vec3 {
        self.center_position
    }

    #[inline]
    pub fn up_vector(&self) -> Vec3 {
        self.up_vector
    }

    #[inline]
    pub fn z_range(&self) -> Vec2 {
        self.z_range
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn check_kind(key: ViewOption, value: &OptionValue) -> Result<(), OptionsError> {
    if value.kind() == key.kind() {
        Ok(())
    } else {
        Err(mismatch(key, value))
    }
}

fn mismatch(key: ViewOption, value: &OptionValue) -> OptionsError {
    OptionsError::TypeMismatch {
        key,
        expected: key.kind(),
        found: value.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults / get ────────────────────────────────────────────────────

    #[test]
    fn every_key_has_a_value_of_its_kind() {
        let options = Options::new();
        for key in ViewOption::ALL {
            assert_eq!(options.value(key).kind(), key.kind(), "{key}");
        }
    }

    #[test]
    fn typed_get_returns_stored_value() {
        let options = Options::new();
        let fov: f32 = options.get(ViewOption::VerticalFieldOfView).unwrap();
        assert_eq!(fov, 45.0);
        let z: Vec2 = options.get(ViewOption::ZRange).unwrap();
        assert_eq!(z, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn typed_get_with_wrong_type_fails() {
        let err = Options::new().get::<f32>(ViewOption::CameraPosition).unwrap_err();
        assert_eq!(
            err,
            OptionsError::TypeMismatch {
                key: ViewOption::CameraPosition,
                expected: ValueKind::Vec3,
                found: ValueKind::Scalar,
            }
        );
    }

    #[test]
    fn color_is_not_a_vec3() {
        assert!(Options::new().get::<Vec3>(ViewOption::BackgroundColor).is_err());
        assert_eq!(Options::new().get::<Color>(ViewOption::BackgroundColor).unwrap(), Color::BLACK);
    }

    // ── apply_changes ─────────────────────────────────────────────────────

    #[test]
    fn apply_reports_changed_keys_in_configuration_order() {
        let mut options = Options::new();
        let mut config = Configuration::new();
        config
            .set_up_vector(Vec3::Z)
            .set_vertical_fov(30.0)
            .set_camera_position(Vec3::ONE);
        let changed = options.apply_changes(&config).unwrap();
        assert_eq!(
            changed.as_slice(),
            &[ViewOption::UpVector, ViewOption::VerticalFieldOfView, ViewOption::CameraPosition]
        );
        assert_eq!(options.up_vector(), Vec3::Z);
        assert_eq!(options.vertical_field_of_view(), 30.0);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut options = Options::new();
        let mut config = Configuration::new();
        config.set_background_color(Color::WHITE).set_z_range(Vec2::new(-0.5, 0.5));
        assert_eq!(options.apply_changes(&config).unwrap().len(), 2);
        assert!(options.apply_changes(&config).unwrap().is_empty());
    }

    #[test]
    fn unchanged_value_is_not_reported() {
        let mut options = Options::new();
        let mut config = Configuration::new();
        config
            .set_up_vector(Vec3::Y) // same as default
            .set_vertical_fov(50.0);
        let changed = options.apply_changes(&config).unwrap();
        assert_eq!(changed.as_slice(), &[ViewOption::VerticalFieldOfView]);
    }

    #[test]
    fn source_change_compares_by_value() {
        let mut options = Options::new();
        let same = options.colormap_implementation().to_owned();
        let mut config = Configuration::new();
        config.set_colormap_implementation(same);
        assert!(options.apply_changes(&config).unwrap().is_empty());
    }

    #[test]
    fn mismatched_entry_rejects_whole_configuration() {
        let mut options = Options::new();
        let before = options.clone();
        let config = Configuration::new()
            .with(ViewOption::VerticalFieldOfView, 10.0f32)
            .with(ViewOption::ZRange, Vec3::ONE);
        let err = options.apply_changes(&config).unwrap_err();
        assert!(matches!(err, OptionsError::TypeMismatch { key: ViewOption::ZRange, .. }));
        assert_eq!(options, before);
    }
}
