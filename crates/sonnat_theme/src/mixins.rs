use std::fmt;

use indexmap::IndexMap;

use crate::Theme;

/// Flat, ordered camelCase property/value pairs contributed by a mixin.
pub type MixinDeclaration = IndexMap<String, String>;

/// A named, reusable declaration derived from the theme.
pub type Mixin = fn(&Theme) -> MixinDeclaration;

#[derive(Clone, Default)]
pub struct Mixins(IndexMap<String, Mixin>);

impl Mixins {
    pub(crate) fn builtin() -> Self {
        let mut mixins = Self::default();
        mixins.insert("disableUserSelect", disable_user_select);
        mixins.insert("truncateText", truncate_text);
        mixins.insert("visuallyHidden", visually_hidden);
        mixins.insert("backfaceVisibilityFix", backface_visibility_fix);
        mixins
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, mixin: Mixin) {
        self.0.insert(name.into(), mixin);
    }

    pub(crate) fn extend(&mut self, other: &IndexMap<String, Mixin>) {
        for (name, mixin) in other {
            self.0.insert(name.clone(), *mixin);
        }
    }

    pub fn get(&self, name: &str) -> Option<Mixin> {
        self.0.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> &IndexMap<String, Mixin> {
        &self.0
    }
}

// Function pointers have no meaningful equality, so mixins compare by name.
impl PartialEq for Mixins {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.names().zip(other.names()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Mixins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn declaration<const N: usize>(pairs: [(&str, &str); N]) -> MixinDeclaration {
    pairs
        .into_iter()
        .map(|(property, value)| (property.to_string(), value.to_string()))
        .collect()
}

fn disable_user_select(_theme: &Theme) -> MixinDeclaration {
    declaration([
        ("WebkitTouchCallout", "none"),
        ("WebkitUserSelect", "none"),
        ("MozUserSelect", "none"),
        ("msUserSelect", "none"),
        ("userSelect", "none"),
    ])
}

fn truncate_text(_theme: &Theme) -> MixinDeclaration {
    declaration([
        ("overflow", "hidden"),
        ("whiteSpace", "nowrap"),
        ("textOverflow", "ellipsis"),
    ])
}

fn visually_hidden(_theme: &Theme) -> MixinDeclaration {
    declaration([
        ("position", "absolute"),
        ("width", "1px"),
        ("height", "1px"),
        ("margin", "-1px"),
        ("padding", "0"),
        ("overflow", "hidden"),
        ("clip", "rect(0 0 0 0)"),
        ("border", "0"),
    ])
}

fn backface_visibility_fix(_theme: &Theme) -> MixinDeclaration {
    declaration([
        ("WebkitBackfaceVisibility", "hidden"),
        ("backfaceVisibility", "hidden"),
        ("transform", "translateZ(0)"),
    ])
}
