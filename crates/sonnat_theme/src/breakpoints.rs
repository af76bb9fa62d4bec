use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ThemeError, format_decimal};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BreakpointOptions {
    pub values: IndexMap<String, f64>,
}

/// A width range produced by the breakpoint helpers.
///
/// Bounds are inclusive. `up(key)` and `down(key)` split the axis at the
/// breakpoint's pixel value, so every integral width matches exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaQuery {
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
}

impl MediaQuery {
    pub fn matches(&self, width: f64) -> bool {
        self.min_width.is_none_or(|min| width >= min) && self.max_width.is_none_or(|max| width <= max)
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@media ")?;

        match (self.min_width, self.max_width) {
            (Some(min), Some(max)) => write!(
                f,
                "(min-width:{}px) and (max-width:{}px)",
                format_decimal(min, 2),
                format_decimal(max, 2)
            ),
            (Some(min), None) => write!(f, "(min-width:{}px)", format_decimal(min, 2)),
            (None, Some(max)) => write!(f, "(max-width:{}px)", format_decimal(max, 2)),
            (None, None) => f.write_str("all"),
        }
    }
}

/// Named viewport widths, kept sorted ascending by pixel value.
///
/// Values are whole pixels. `down` ends one pixel below the boundary, which
/// would leave a gap for fractional boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoints {
    values: IndexMap<String, f64>,
}

impl Breakpoints {
    pub fn new(values: impl IntoIterator<Item = (String, f64)>) -> Result<Self, ThemeError> {
        let mut values: IndexMap<String, f64> = values.into_iter().collect();

        if values.is_empty() {
            return Err(ThemeError::NoBreakpoints);
        }

        if let Some((key, value)) = values
            .iter()
            .find(|(_, value)| !value.is_finite() || **value < 0.0 || value.fract() != 0.0)
        {
            return Err(ThemeError::InvalidBreakpoint {
                key: key.clone(),
                value: *value,
            });
        }

        values.sort_by(|key_a, value_a, key_b, value_b| {
            value_a.total_cmp(value_b).then_with(|| key_a.cmp(key_b))
        });

        Ok(Self { values })
    }

    /// Breakpoint names, ascending by pixel value.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> &IndexMap<String, f64> {
        &self.values
    }

    pub fn value(&self, key: &str) -> Result<f64, ThemeError> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| ThemeError::UnknownBreakpoint(key.to_string()))
    }

    pub fn up_query(&self, key: &str) -> Result<MediaQuery, ThemeError> {
        Ok(MediaQuery {
            min_width: Some(self.value(key)?),
            max_width: None,
        })
    }

    pub fn down_query(&self, key: &str) -> Result<MediaQuery, ThemeError> {
        Ok(MediaQuery {
            min_width: None,
            max_width: Some(self.value(key)? - 1.0),
        })
    }

    /// Widths from `start` up to, but excluding, `end`.
    pub fn between_query(&self, start: &str, end: &str) -> Result<MediaQuery, ThemeError> {
        let min = self.value(start)?;
        let max = self.value(end)?;

        if min >= max {
            return Err(ThemeError::InvertedBreakpoints {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(MediaQuery {
            min_width: Some(min),
            max_width: Some(max - 1.0),
        })
    }

    /// Widths from `key` up to the next breakpoint, or unbounded for the last one.
    pub fn only_query(&self, key: &str) -> Result<MediaQuery, ThemeError> {
        let index = self
            .values
            .get_index_of(key)
            .ok_or_else(|| ThemeError::UnknownBreakpoint(key.to_string()))?;

        match self.values.get_index(index + 1) {
            Some((next, _)) => self.between_query(key, next),
            None => self.up_query(key),
        }
    }

    /// `@media (min-width:{px}px)`
    pub fn up(&self, key: &str) -> Result<String, ThemeError> {
        Ok(self.up_query(key)?.to_string())
    }

    /// `@media (max-width:{px - 1}px)`
    pub fn down(&self, key: &str) -> Result<String, ThemeError> {
        Ok(self.down_query(key)?.to_string())
    }

    pub fn between(&self, start: &str, end: &str) -> Result<String, ThemeError> {
        Ok(self.between_query(start, end)?.to_string())
    }

    pub fn only(&self, key: &str) -> Result<String, ThemeError> {
        Ok(self.only_query(key)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn breakpoints(values: &[(&str, f64)]) -> Breakpoints {
        Breakpoints::new(values.iter().map(|(key, value)| (key.to_string(), *value))).unwrap()
    }

    #[test]
    fn test_keys_sorted_by_value() {
        let breakpoints = breakpoints(&[("md", 900.0), ("xs", 0.0), ("sm", 600.0)]);
        assert_eq!(breakpoints.keys().collect::<Vec<_>>(), ["xs", "sm", "md"]);
    }

    #[test]
    fn test_up_and_down_strings() {
        let breakpoints = breakpoints(&[("sm", 600.0), ("md", 900.0)]);
        assert_eq!(breakpoints.up("sm").unwrap(), "@media (min-width:600px)");
        assert_eq!(breakpoints.down("sm").unwrap(), "@media (max-width:599px)");
        assert_eq!(
            breakpoints.between("sm", "md").unwrap(),
            "@media (min-width:600px) and (max-width:899px)"
        );
        assert_eq!(
            breakpoints.only("sm").unwrap(),
            "@media (min-width:600px) and (max-width:899px)"
        );
        assert_eq!(breakpoints.only("md").unwrap(), "@media (min-width:900px)");
    }

    #[test]
    fn test_up_down_split_at_boundary() {
        let breakpoints = breakpoints(&[("sm", 600.0), ("md", 900.0)]);
        let up = breakpoints.up_query("sm").unwrap();
        let down = breakpoints.down_query("sm").unwrap();

        assert!(up.matches(600.0));
        assert!(!down.matches(600.0));
        assert!(down.matches(599.0));
        assert!(!up.matches(599.0));
    }

    #[test]
    fn test_up_down_exclusive_for_random_widths() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let breakpoints = breakpoints(&[("xs", 0.0), ("sm", 600.0), ("md", 900.0), ("lg", 1280.0)]);

        for _ in 0..2_000 {
            let width = f64::from(rng.random_range(0_u32..2_000));

            for key in breakpoints.keys() {
                let up = breakpoints.up_query(key).unwrap().matches(width);
                let down = breakpoints.down_query(key).unwrap().matches(width);
                assert!(up != down, "width {width} at `{key}` matched up={up} down={down}");
            }
        }
    }

    #[test]
    fn test_up_is_monotonic() {
        let breakpoints = breakpoints(&[("xs", 0.0), ("sm", 600.0), ("md", 900.0)]);
        let keys: Vec<_> = breakpoints.keys().collect();

        for pair in keys.windows(2) {
            let lower = breakpoints.up_query(pair[0]).unwrap();
            let higher = breakpoints.up_query(pair[1]).unwrap();

            for width in [0.0, 599.0, 600.0, 899.0, 900.0, 4000.0] {
                if higher.matches(width) {
                    assert!(lower.matches(width));
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            Breakpoints::new([("sm".to_string(), -1.0)]),
            Err(ThemeError::InvalidBreakpoint { .. })
        ));
        assert!(matches!(
            Breakpoints::new([("sm".to_string(), f64::INFINITY)]),
            Err(ThemeError::InvalidBreakpoint { .. })
        ));
        assert!(matches!(
            Breakpoints::new([("sm".to_string(), 600.5)]),
            Err(ThemeError::InvalidBreakpoint { key, .. }) if key == "sm"
        ));
        assert!(matches!(
            Breakpoints::new(Vec::new()),
            Err(ThemeError::NoBreakpoints)
        ));
    }

    #[test]
    fn test_unknown_and_inverted_keys() {
        let breakpoints = breakpoints(&[("sm", 600.0), ("md", 900.0)]);
        assert!(matches!(
            breakpoints.up("xl"),
            Err(ThemeError::UnknownBreakpoint(key)) if key == "xl"
        ));
        assert!(matches!(
            breakpoints.between("md", "sm"),
            Err(ThemeError::InvertedBreakpoints { .. })
        ));
    }
}
