use std::fmt;

/// Straight (non-premultiplied) 8-bit color with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Color from a `0xRRGGBB` literal.
    pub const fn from_hex(rgb: u32, a: f64) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a,
        }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Normalized `[r, g, b, a]` for shader uniforms.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32,
        ]
    }
}

/// CSS `rgba()` notation, accepted by canvas fill and stroke styles.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Immediate-mode 2D drawing target.
pub trait DrawSurface {
    /// Pixel dimensions of the backing store.
    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32);

    /// Erase the whole surface to transparent.
    fn clear(&mut self);

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgba);

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_notation() {
        assert_eq!(Rgba::new(100, 50, 255, 0.2).to_string(), "rgba(100, 50, 255, 0.2)");
        assert_eq!(Rgba::new(0, 0, 0, 0.0).to_string(), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn hex_literal() {
        let c = Rgba::from_hex(0x8A2BE2, 0.2);
        assert_eq!((c.r, c.g, c.b), (0x8A, 0x2B, 0xE2));
        assert_eq!(c.with_alpha(1.0).a, 1.0);
    }

    #[test]
    fn normalized_channels() {
        let [r, g, b, a] = Rgba::new(255, 0, 51, 0.5).to_f32();
        assert_eq!((r, g, b, a), (1.0, 0.0, 0.2, 0.5));
    }
}
