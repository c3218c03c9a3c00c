//! Colormap shader fragments.
//!
//! Each colormap is a WGSL snippet defining
//! `fn colormap(direction: vec3<f32>) -> vec3<f32>`. Renderers append the
//! snippet stored in the `ColormapImplementation` option to their shader
//! sources before compiling, so any function with that signature works.

/// Built-in colormaps.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Colormap {
    #[default]
    Hsv,
    BlueWhiteRed,
    BlueGreenRed,
    BlueRed,
    White,
    Black,
}

impl Colormap {
    pub const ALL: [Colormap; 6] = [
        Colormap::Hsv,
        Colormap::BlueWhiteRed,
        Colormap::BlueGreenRed,
        Colormap::BlueRed,
        Colormap::White,
        Colormap::Black,
    ];

    /// Next colormap in [`ALL`](Self::ALL), wrapping around.
    pub fn next(self) -> Colormap {
        let i = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Colormap::Hsv => "hsv",
            Colormap::BlueWhiteRed => "blue-white-red",
            Colormap::BlueGreenRed => "blue-green-red",
            Colormap::BlueRed => "blue-red",
            Colormap::White => "white",
            Colormap::Black => "black",
        }
    }

    /// Parses a colormap from its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Colormap> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// WGSL implementation of `colormap`.
pub fn colormap_implementation(colormap: Colormap) -> &'static str {
    match colormap {
        Colormap::Hsv => include_str!("shaders/hsv.wgsl"),
        Colormap::BlueWhiteRed => include_str!("shaders/blue_white_red.wgsl"),
        Colormap::BlueGreenRed => include_str!("shaders/blue_green_red.wgsl"),
        Colormap::BlueRed => include_str!("shaders/blue_red.wgsl"),
        Colormap::White => include_str!("shaders/white.wgsl"),
        Colormap::Black => include_str!("shaders/black.wgsl"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cycles_through_all() {
        let mut c = Colormap::Hsv;
        for _ in 0..Colormap::ALL.len() {
            c = c.next();
        }
        assert_eq!(c, Colormap::Hsv);
    }

    #[test]
    fn names_round_trip() {
        for c in Colormap::ALL {
            assert_eq!(Colormap::from_name(c.name()), Some(c));
        }
        assert_eq!(Colormap::from_name("viridis"), None);
    }

    #[test]
    fn implementations_define_colormap() {
        for c in Colormap::ALL {
            assert!(colormap_implementation(c).contains("fn colormap(direction: vec3<f32>) -> vec3<f32>"));
        }
    }
}
