use serde::{Deserialize, Deserializer, de::Error};
use smallvec::SmallVec;

pub type FontFamilyList = SmallVec<[String; 4]>;

pub fn de_string_or_non_empty_list<'de, D>(deserializer: D) -> Result<FontFamilyList, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        One(String),
        Many(FontFamilyList),
    }

    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::One(string) => {
            let families: FontFamilyList = string
                .split(',')
                .map(|family| family.trim().trim_matches('"').to_string())
                .filter(|family| !family.is_empty())
                .collect();

            if families.is_empty() {
                return Err(D::Error::custom("font family can't be empty."));
            }

            Ok(families)
        }
        StringOrVec::Many(vec) => {
            if vec.is_empty() {
                return Err(D::Error::custom("list can't be empty."));
            }

            Ok(vec)
        }
    }
}

/// Accepts either a bare number of pixels or a string ending with `px`.
pub fn de_pixels<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let pixels = match StringOrFloat::deserialize(deserializer)? {
        StringOrFloat::String(string) => {
            let Some(string) = string.trim().strip_suffix("px") else {
                return Err(D::Error::custom("expected string to end with 'px'"));
            };

            string
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom("could not convert string into pixels"))?
        }

        StringOrFloat::Float(pixels) => pixels,
    };

    if !pixels.is_finite() {
        return Err(D::Error::custom("pixels must be a finite number"));
    }

    Ok(pixels)
}

pub fn de_tonal_offset<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let offset = f64::deserialize(deserializer)?;

    if !(0.0..=1.0).contains(&offset) {
        return Err(D::Error::custom("tonal offset must be between 0 and 1"));
    }

    Ok(offset)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrFloat {
    String(String),
    Float(f64),
}
