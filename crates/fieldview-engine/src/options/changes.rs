use glam::{Vec2, Vec3};

use super::{Color, OptionValue, ViewOption};

/// Sparse set of option overrides, applied with [`Options::apply_changes`].
///
/// Entries keep the order in which keys were first set. Setting a key again
/// replaces its value in place.
///
/// [`Options::apply_changes`]: super::Options::apply_changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    entries: Vec<(ViewOption, OptionValue)>,
}

impl Configuration {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. The kind is checked when the configuration is applied.
    pub fn set(&mut self, key: ViewOption, value: impl Into<OptionValue>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: ViewOption, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: ViewOption) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewOption, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── typed setters ─────────────────────────────────────────────────────

    pub fn set_system_center(&mut self, center: Vec3) -> &mut Self {
        self.set(ViewOption::SystemCenter, center)
    }

    /// Vertical field of view in degrees; `<= 0` means orthographic.
    pub fn set_vertical_fov(&mut self, degrees: f32) -> &mut Self {
        self.set(ViewOption::VerticalFieldOfView, degrees)
    }

    pub fn set_background_color(&mut self, color: Color) -> &mut Self {
        self.set(ViewOption::BackgroundColor, color)
    }

    pub fn set_colormap_implementation(&mut self, source: impl Into<String>) -> &mut Self {
        self.set(ViewOption::ColormapImplementation, source.into())
    }

    pub fn set_is_visible_implementation(&mut self, source: impl Into<String>) -> &mut Self {
        self.set(ViewOption::IsVisibleImplementation, source.into())
    }

    pub fn set_camera_position(&mut self, position: Vec3) -> &mut Self {
        self.set(ViewOption::CameraPosition, position)
    }

    pub fn set_center_position(&mut self, position: Vec3) -> &mut Self {
        self.set(ViewOption::CenterPosition, position)
    }

    pub fn set_up_vector(&mut self, up: Vec3) -> &mut Self {
        self.set(ViewOption::UpVector, up)
    }

    pub fn set_z_range(&mut self, range: Vec2) -> &mut Self {
        self.set(ViewOption::ZRange, range)
    }

    pub fn set_bounding_box(&mut self, min: Vec3, max: Vec3) -> &mut Self {
        self.set(ViewOption::BoundingBoxMin, min);
        self.set(ViewOption::BoundingBoxMax, max)
    }
}

/// Ordered set of option keys whose value changed in one apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedOptions {
    keys: Vec<ViewOption>,
}

impl ChangedOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` unless it is already present.
    pub fn insert(&mut self, key: ViewOption) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    #[inline]
    pub fn contains(&self, key: ViewOption) -> bool {
        self.keys.contains(&key)
    }

    #[inline]
    pub fn as_slice(&self) -> &[ViewOption] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = ViewOption> + '_ {
        self.keys.iter().copied()
    }

    /// Key indices in change order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.iter().map(|k| k.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<ViewOption> for ChangedOptions {
    fn from_iter<I: IntoIterator<Item = ViewOption>>(iter: I) -> Self {
        let mut changed = ChangedOptions::new();
        for key in iter {
            changed.insert(key);
        }
        changed
    }
}
