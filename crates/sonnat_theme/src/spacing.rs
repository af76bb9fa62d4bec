use serde::{Deserialize, Serialize};

use crate::{RemConverter, deserializers::de_pixels};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpacingOptions {
    #[serde(deserialize_with = "de_pixels")]
    pub base: f64,
}

/// A linear spacing scale, `factor * base` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    base: f64,
    converter: RemConverter,
}

impl Spacing {
    pub(crate) fn new(options: SpacingOptions, converter: RemConverter) -> Self {
        Self {
            base: options.base,
            converter,
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn px(&self, factor: f64) -> f64 {
        self.base * factor
    }

    pub fn rem(&self, factor: f64) -> String {
        self.converter.to_rem(self.px(factor))
    }
}
