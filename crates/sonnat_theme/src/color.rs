use serde::{Deserialize, Serialize};

use crate::{ThemeError, format_decimal};

/// An sRGB color with a straight alpha channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(0xff, 0xff, 0xff);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and
    /// `transparent`.
    pub fn parse(input: &str) -> Result<Self, ThemeError> {
        let trimmed = input.trim();
        let invalid = || ThemeError::InvalidColor(input.to_string());

        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self { a: 0.0, ..Self::BLACK });
        }

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let lower = trimmed.to_ascii_lowercase();
        let body = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|body| body.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let channel = |part: &str| -> Option<u8> {
            let value = part.parse::<f64>().ok()?;
            (0.0..=255.0).contains(&value).then(|| value.round() as u8)
        };

        match parts.as_slice() {
            [r, g, b] => Ok(Self::opaque(
                channel(r).ok_or_else(invalid)?,
                channel(g).ok_or_else(invalid)?,
                channel(b).ok_or_else(invalid)?,
            )),
            [r, g, b, a] => {
                let a = a
                    .parse::<f64>()
                    .ok()
                    .filter(|a| (0.0..=1.0).contains(a))
                    .ok_or_else(invalid)?;

                Ok(Self {
                    r: channel(r).ok_or_else(invalid)?,
                    g: channel(g).ok_or_else(invalid)?,
                    b: channel(b).ok_or_else(invalid)?,
                    a,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Relative luminance as defined by WCAG 2.x. Alpha is ignored.
    pub fn relative_luminance(&self) -> f64 {
        let linear = |channel: u8| {
            let c = f64::from(channel) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };

        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    pub fn contrast_ratio(&self, other: &Rgba) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Moves every channel towards white by `coefficient` (0..=1).
    pub fn lighten(self, coefficient: f64) -> Self {
        let mix = |c: u8| (f64::from(c) + (255.0 - f64::from(c)) * coefficient).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
            a: self.a,
        }
    }

    /// Moves every channel towards black by `coefficient` (0..=1).
    pub fn darken(self, coefficient: f64) -> Self {
        let mix = |c: u8| (f64::from(c) * (1.0 - coefficient)).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
            a: self.a,
        }
    }

    /// Returns a new color with the specified alpha value.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.a = alpha.clamp(0.0, 1.0);
        self
    }

    /// Opaque colors serialize as `#rrggbb`, everything else as `rgba(..)`.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                format_decimal(self.a, 3)
            )
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |index: usize| u8::from_str_radix(&hex[index..=index], 16).ok().map(|n| n * 17);
    let byte = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();

    match hex.len() {
        3 | 4 => Some(Rgba {
            r: nibble(0)?,
            g: nibble(1)?,
            b: nibble(2)?,
            a: if hex.len() == 4 { f64::from(nibble(3)?) / 255.0 } else { 1.0 },
        }),
        6 | 8 => Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { f64::from(byte(6)?) / 255.0 } else { 1.0 },
        }),
        _ => None,
    }
}

/// A semantic color with its derived tones.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorRole {
    pub origin: String,
    pub light: String,
    pub dark: String,
    /// Pure white or pure black, whichever reads better on `origin`.
    pub contrast: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextColors {
    pub primary: String,
    pub secondary: String,
    pub hint: String,
    pub disabled: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackgroundColors {
    pub origin: String,
    pub accents: Vec<String>,
}

/// Color roles derived from the palette, the dark-mode flag and the tonal offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub primary: ColorRole,
    pub secondary: ColorRole,
    pub error: ColorRole,
    pub warning: ColorRole,
    pub info: ColorRole,
    pub success: ColorRole,
    pub text: TextColors,
    pub background: BackgroundColors,
    pub divider: String,
    pub white: String,
    pub black: String,
    pub transparent: String,
}

impl ThemeColors {
    /// Returns the palette's white or black, whichever has the higher contrast
    /// ratio against `background`. Ties go to black.
    pub fn get_contrast_color_of(&self, background: &str) -> Result<&str, ThemeError> {
        let background = Rgba::parse(background)?;
        let white = Rgba::parse(&self.white)?;
        let black = Rgba::parse(&self.black)?;

        if background.contrast_ratio(&white) > background.contrast_ratio(&black) {
            Ok(&self.white)
        } else {
            Ok(&self.black)
        }
    }

    /// Re-emits `color` with the given alpha, e.g. for hover overlays.
    pub fn create_color(&self, color: &str, alpha: f64) -> Result<String, ThemeError> {
        Ok(Rgba::parse(color)?.alpha(alpha).to_css())
    }
}

pub(crate) fn derive_role(
    origin: &str,
    light: Option<&str>,
    dark: Option<&str>,
    tonal_offset: f64,
    white: Rgba,
    black: Rgba,
) -> Result<ColorRole, ThemeError> {
    let base = Rgba::parse(origin)?;

    let light = match light {
        Some(light) => Rgba::parse(light)?,
        None => base.lighten(tonal_offset),
    };

    let dark = match dark {
        Some(dark) => Rgba::parse(dark)?,
        None => base.darken(tonal_offset * 1.5),
    };

    let contrast = if base.contrast_ratio(&white) > base.contrast_ratio(&black) {
        white
    } else {
        black
    };

    Ok(ColorRole {
        origin: base.to_css(),
        light: light.to_css(),
        dark: dark.to_css(),
        contrast: contrast.to_css(),
    })
}

pub(crate) fn derive_text_colors(dark_mode: bool, white: Rgba, black: Rgba) -> TextColors {
    if dark_mode {
        TextColors {
            primary: white.to_css(),
            secondary: white.alpha(0.7).to_css(),
            hint: white.alpha(0.5).to_css(),
            disabled: white.alpha(0.5).to_css(),
        }
    } else {
        TextColors {
            primary: black.alpha(0.87).to_css(),
            secondary: black.alpha(0.6).to_css(),
            hint: black.alpha(0.38).to_css(),
            disabled: black.alpha(0.38).to_css(),
        }
    }
}
