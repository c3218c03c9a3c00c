use std::fmt;

/// Value kind declared by each option key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
    Color,
    /// Shader source fragment (WGSL).
    Source,
}

/// Closed set of view option keys.
///
/// The discriminant is the key index reported in change sets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ViewOption {
    BoundingBoxMin,
    BoundingBoxMax,
    SystemCenter,
    /// Degrees. Values `<= 0` select an orthographic projection.
    VerticalFieldOfView,
    BackgroundColor,
    ColormapImplementation,
    IsVisibleImplementation,
    CameraPosition,
    CenterPosition,
    UpVector,
    /// Clip range on the z component of field directions.
    ZRange,
}

impl ViewOption {
    pub const ALL: [ViewOption; 11] = [
        ViewOption::BoundingBoxMin,
        ViewOption::BoundingBoxMax,
        ViewOption::SystemCenter,
        ViewOption::VerticalFieldOfView,
        ViewOption::BackgroundColor,
        ViewOption::ColormapImplementation,
        ViewOption::IsVisibleImplementation,
        ViewOption::CameraPosition,
        ViewOption::CenterPosition,
        ViewOption::UpVector,
        ViewOption::ZRange,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn kind(self) -> ValueKind {
        match self {
            ViewOption::BoundingBoxMin
            | ViewOption::BoundingBoxMax
            | ViewOption::SystemCenter
            | ViewOption::CameraPosition
            | ViewOption::CenterPosition
            | ViewOption::UpVector => ValueKind::Vec3,
            ViewOption::VerticalFieldOfView => ValueKind::Scalar,
            ViewOption::BackgroundColor => ValueKind::Color,
            ViewOption::ColormapImplementation | ViewOption::IsVisibleImplementation => {
                ValueKind::Source
            }
            ViewOption::ZRange => ValueKind::Vec2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ViewOption::BoundingBoxMin => "bounding_box_min",
            ViewOption::BoundingBoxMax => "bounding_box_max",
            ViewOption::SystemCenter => "system_center",
            ViewOption::VerticalFieldOfView => "vertical_field_of_view",
            ViewOption::BackgroundColor => "background_color",
            ViewOption::ColormapImplementation => "colormap_implementation",
            ViewOption::IsVisibleImplementation => "is_visible_implementation",
            ViewOption::CameraPosition => "camera_position",
            ViewOption::CenterPosition => "center_position",
            ViewOption::UpVector => "up_vector",
            ViewOption::ZRange => "z_range",
        }
    }
}

impl fmt::Display for ViewOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, key) in ViewOption::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn shader_sources_are_source_kind() {
        assert_eq!(ViewOption::ColormapImplementation.kind(), ValueKind::Source);
        assert_eq!(ViewOption::IsVisibleImplementation.kind(), ValueKind::Source);
        assert_eq!(ViewOption::ZRange.kind(), ValueKind::Vec2);
    }
}
