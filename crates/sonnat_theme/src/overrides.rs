use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{Mixin, ThemeError};

/// A partial theme document deep-merged onto the built-in defaults.
///
/// Objects merge key by key. Arrays and scalars replace the default outright.
/// A `null` removes the key from the merged document.
#[derive(Debug, Clone)]
pub struct ThemeOverrides {
    document: Value,
    mixins: IndexMap<String, Mixin>,
}

impl Default for ThemeOverrides {
    fn default() -> Self {
        Self {
            document: Value::Object(Map::new()),
            mixins: IndexMap::new(),
        }
    }
}

impl ThemeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json<S: AsRef<str>>(str: S) -> Result<Self, ThemeError> {
        Self::from_value(serde_json::from_str(str.as_ref())?)
    }

    pub fn from_value(document: Value) -> Result<Self, ThemeError> {
        if !document.is_object() {
            return Err(ThemeError::OverridesNotObject);
        }

        Ok(Self {
            document,
            mixins: IndexMap::new(),
        })
    }

    /// Deep-merges another partial document on top of this one.
    pub fn merge(mut self, document: Value) -> Result<Self, ThemeError> {
        if !document.is_object() {
            return Err(ThemeError::OverridesNotObject);
        }

        deep_merge(&mut self.document, &document);
        Ok(self)
    }

    /// Sets a single leaf by dotted path, e.g. `"breakpoints.values.sm"`.
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        let nested = path.rsplit('.').fold(value.into(), |inner, segment| {
            let mut map = Map::new();
            map.insert(segment.to_string(), inner);
            Value::Object(map)
        });

        deep_merge(&mut self.document, &nested);
        self
    }

    /// Registers (or replaces) a named mixin.
    pub fn mixin(mut self, name: impl Into<String>, mixin: Mixin) -> Self {
        self.mixins.insert(name.into(), mixin);
        self
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn mixins(&self) -> &IndexMap<String, Mixin> {
        &self.mixins
    }
}

impl TryFrom<Value> for ThemeOverrides {
    type Error = ThemeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Merges `source` into `target`. Objects recurse, everything else replaces.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                if value.is_null() {
                    target.remove(key);
                    continue;
                }

                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
