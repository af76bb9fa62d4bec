use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    ConfigurationError, ResolutionError, StyleError,
    context::RenderContext,
    sheet::{Sheet, SheetKey, StyleSpecification},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeStylesOptions {
    /// Component identity. Part of every class name and of the sheet cache key.
    pub name: String,
}

impl MakeStylesOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Binds a style specification to a component name.
///
/// ```ignore
/// static USE_STYLES: LazyLock<UseStyles> = LazyLock::new(|| {
///     make_styles(button_styles, MakeStylesOptions::new("Button")).expect("valid name")
/// });
///
/// fn render(cx: &mut RenderContext) -> Result<String, StyleError> {
///     let classes = USE_STYLES.classes(cx)?;
///     Ok(format!("<button class=\"{}\">", classes.get("root")?))
/// }
/// ```
pub fn make_styles(
    specification: impl StyleSpecification + 'static,
    options: MakeStylesOptions,
) -> Result<UseStyles, StyleError> {
    if options.name.trim().is_empty() {
        return Err(ConfigurationError::EmptyIdentifier("component identity").into());
    }

    Ok(UseStyles {
        name: options.name,
        specification: Arc::new(specification),
    })
}

#[derive(Clone)]
pub struct UseStyles {
    name: String,
    specification: Arc<dyn StyleSpecification>,
}

impl fmt::Debug for UseStyles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseStyles").field("name", &self.name).finish_non_exhaustive()
    }
}

impl UseStyles {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiles the sheet for the active theme, registers it with the render
    /// pass, and returns the rule-to-class map.
    pub fn classes(&self, cx: &mut RenderContext<'_>) -> Result<Classes, StyleError> {
        let sheet = cx.use_sheet(&self.name, self.specification.as_ref())?;
        Ok(Classes::from_sheet(&sheet))
    }
}

/// Rule names mapped to generated class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classes {
    key: SheetKey,
    names: IndexMap<String, String>,
}

impl Classes {
    pub(crate) fn from_sheet(sheet: &Sheet) -> Self {
        Self {
            key: sheet.key(),
            names: sheet
                .class_names()
                .map(|(rule, class_name)| (rule.to_string(), class_name.to_string()))
                .collect(),
        }
    }

    /// Fails with [`ResolutionError::UnknownRule`] for a rule the sheet doesn't define.
    pub fn get(&self, rule: &str) -> Result<&str, StyleError> {
        self.names
            .get(rule)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_rule(rule))
    }

    /// The sheet these classes came from, for releasing it on unmount.
    pub fn key(&self) -> &SheetKey {
        &self.key
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(|(rule, class_name)| (rule.as_str(), class_name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Appends consumer-supplied class names to the generated ones.
    pub fn with_overrides<K, V>(
        mut self,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, StyleError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (rule, extra) in overrides {
            let (rule, extra) = (rule.as_ref(), extra.as_ref().trim());
            if extra.is_empty() {
                continue;
            }

            let Some(class_name) = self.names.get_mut(rule) else {
                return Err(self.unknown_rule(rule));
            };

            class_name.push(' ');
            class_name.push_str(extra);
        }

        Ok(self)
    }

    fn unknown_rule(&self, rule: &str) -> StyleError {
        ResolutionError::UnknownRule {
            component: self.key.component.clone(),
            rule: rule.to_string(),
        }
        .into()
    }
}
