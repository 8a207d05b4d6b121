use std::fmt;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::from_argb_u8(0, 0, 0, 0);
    pub const BLACK: Color = Color::from_rgb_u8(0, 0, 0);
    pub const WHITE: Color = Color::from_rgb_u8(255, 255, 255);

    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    pub const fn from_argb_u8(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// `0xAARRGGBB`
    pub const fn from_argb_encoded(argb: u32) -> Self {
        let [alpha, red, green, blue] = argb.to_be_bytes();
        Self::from_argb_u8(alpha, red, green, blue)
    }

    pub const fn as_argb_encoded(self) -> u32 {
        u32::from_be_bytes([self.alpha, self.red, self.green, self.blue])
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(text: &str) -> Option<Self> {
        crate::syntax::parser::parse_hex_color(text).map(Self::from_argb_encoded)
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

/// `#rrggbbaa`
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub color: Color,
    /// 0.0 ..= 1.0 along the gradient line.
    pub position: f32,
}

/// How an area is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    SolidColor(Color),
    LinearGradient { angle: f32, stops: Vec<GradientStop> },
}

impl Default for Brush {
    fn default() -> Self {
        Brush::SolidColor(Color::TRANSPARENT)
    }
}

impl Brush {
    /// The solid color, or the first stop's color for a gradient.
    pub fn color(&self) -> Color {
        match self {
            Brush::SolidColor(color) => *color,
            Brush::LinearGradient { stops, .. } => {
                stops.first().map(|stop| stop.color).unwrap_or_default()
            }
        }
    }

    pub fn as_solid_color(&self) -> Option<Color> {
        match self {
            Brush::SolidColor(color) => Some(*color),
            Brush::LinearGradient { .. } => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Brush::SolidColor(color) => color.alpha == 0,
            Brush::LinearGradient { stops, .. } => stops.iter().all(|s| s.color.alpha == 0),
        }
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Brush::SolidColor(color)
    }
}

impl fmt::Display for Brush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Brush::SolidColor(color) => write!(f, "{}", color),
            Brush::LinearGradient { angle, stops } => {
                write!(f, "linear-gradient({}deg", angle)?;
                for stop in stops {
                    write!(f, ", {} {}%", stop.color, stop.position * 100.0)?;
                }
                write!(f, ")")
            }
        }
    }
}
