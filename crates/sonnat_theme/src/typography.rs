use serde::{Deserialize, Serialize};

use crate::{
    Direction, ThemeError,
    deserializers::{FontFamilyList, de_pixels, de_string_or_non_empty_list},
};

const MAX_PRECISION: u32 = 10;

/// Formats `value` with at most `precision` decimal places.
///
/// Extra digits are truncated towards zero (never rounded) and trailing zeros
/// are dropped, so the output only depends on the IEEE value and never on the
/// platform's float formatting or locale.
pub fn format_decimal(value: f64, precision: u32) -> String {
    let precision = precision.min(MAX_PRECISION);
    let scale = 10_i64.pow(precision);
    let scaled = value * scale as f64;
    // Absorbs representation error such as 8749.999999999 for 0.875 * 1e4.
    let truncated = (scaled + scaled.signum() * 1e-6).trunc() as i64;

    let sign = if truncated < 0 { "-" } else { "" };
    let magnitude = truncated.unsigned_abs();
    let whole = magnitude / scale as u64;
    let fraction = magnitude % scale as u64;

    if fraction == 0 {
        return format!("{sign}{whole}");
    }

    let digits = format!("{fraction:0width$}", width = precision as usize);
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}

/// Converts pixel values into `rem` strings against the document's root font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemConverter {
    root_font_size: f64,
    precision: u32,
}

impl RemConverter {
    pub fn new(root_font_size: f64, precision: u32) -> Result<Self, ThemeError> {
        if !root_font_size.is_finite() || root_font_size <= 0.0 {
            return Err(ThemeError::InvalidTypography(
                "html font size must be a positive number of pixels",
            ));
        }

        if precision > MAX_PRECISION {
            return Err(ThemeError::InvalidTypography(
                "precision can't exceed 10 decimal places",
            ));
        }

        Ok(Self {
            root_font_size,
            precision,
        })
    }

    pub fn to_rem(&self, px: f64) -> String {
        format!("{}rem", format_decimal(px / self.root_font_size, self.precision))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FontFamily {
    #[serde(deserialize_with = "de_string_or_non_empty_list")]
    pub ltr: FontFamilyList,
    #[serde(deserialize_with = "de_string_or_non_empty_list")]
    pub rtl: FontFamilyList,
}

impl FontFamily {
    /// The CSS `font-family` value for the given direction.
    pub fn for_direction(&self, direction: Direction) -> String {
        let families = match direction {
            Direction::Ltr => &self.ltr,
            Direction::Rtl => &self.rtl,
        };

        families
            .iter()
            .map(|family| {
                if family.contains(char::is_whitespace) {
                    format!("\"{family}\"")
                } else {
                    family.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FontWeights {
    pub light: u16,
    pub regular: u16,
    pub medium: u16,
    pub bold: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypographyVariant {
    #[serde(deserialize_with = "de_pixels")]
    pub font_size: f64,
    pub line_height: f64,
    pub font_weight: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypographyVariants {
    pub h1: TypographyVariant,
    pub h2: TypographyVariant,
    pub h3: TypographyVariant,
    pub h4: TypographyVariant,
    pub h5: TypographyVariant,
    pub h6: TypographyVariant,
    pub subtitle: TypographyVariant,
    pub body: TypographyVariant,
    pub body_small: TypographyVariant,
    pub caption: TypographyVariant,
    pub caption_small: TypographyVariant,
}

impl TypographyVariants {
    /// Looks a variant up by its camelCase name.
    pub fn get(&self, name: &str) -> Option<&TypographyVariant> {
        Some(match name {
            "h1" => &self.h1,
            "h2" => &self.h2,
            "h3" => &self.h3,
            "h4" => &self.h4,
            "h5" => &self.h5,
            "h6" => &self.h6,
            "subtitle" => &self.subtitle,
            "body" => &self.body,
            "bodySmall" => &self.body_small,
            "caption" => &self.caption,
            "captionSmall" => &self.caption_small,
            _ => return None,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypographyOptions {
    #[serde(deserialize_with = "de_pixels")]
    pub html_font_size: f64,
    pub precision: u32,
    pub font_family: FontFamily,
    pub font_weight: FontWeights,
    pub variants: TypographyVariants,
}

/// Typography tokens resolved for one text direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub html_font_size: f64,
    pub font_family: String,
    pub font_weight: FontWeights,
    pub variants: TypographyVariants,
    converter: RemConverter,
}

impl Typography {
    pub(crate) fn derive(
        options: &TypographyOptions,
        direction: Direction,
    ) -> Result<Self, ThemeError> {
        Ok(Self {
            html_font_size: options.html_font_size,
            font_family: options.font_family.for_direction(direction),
            font_weight: options.font_weight,
            variants: options.variants.clone(),
            converter: RemConverter::new(options.html_font_size, options.precision)?,
        })
    }

    /// `px / htmlFontSize` rendered as a `rem` string.
    pub fn px_to_rem(&self, px: f64) -> String {
        self.converter.to_rem(px)
    }

    pub fn converter(&self) -> RemConverter {
        self.converter
    }
}
