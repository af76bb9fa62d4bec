use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use sonnat_theme::{Theme, ThemeId};

use crate::{
    ClassNameGenerator, StyleError,
    css::{self, CssOptions},
    declaration::RuleMap,
    resolver::{self, ResolvedGlobalRule, ResolvedRule},
};

/// Produces a component's rule map for a given theme.
///
/// Implemented for plain closures, so most callers never name this trait:
///
/// ```ignore
/// make_styles(|theme: &Theme| Ok(RuleMap::new().rule("root", Declaration::new())), options)
/// ```
pub trait StyleSpecification: Send + Sync {
    fn rules(&self, theme: &Theme) -> Result<RuleMap, StyleError>;
}

impl<F> StyleSpecification for F
where
    F: Fn(&Theme) -> Result<RuleMap, StyleError> + Send + Sync,
{
    fn rules(&self, theme: &Theme) -> Result<RuleMap, StyleError> {
        self(theme)
    }
}

impl StyleSpecification for RuleMap {
    fn rules(&self, _theme: &Theme) -> Result<RuleMap, StyleError> {
        Ok(self.clone())
    }
}

/// The compiled CSS of one component under one theme.
///
/// Immutable once built, shared through [`SheetCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    component: String,
    theme_id: ThemeId,
    generation_epoch: u64,
    rules: Vec<ResolvedRule>,
    globals: Vec<ResolvedGlobalRule>,
}

impl Sheet {
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn theme_id(&self) -> ThemeId {
        self.theme_id
    }

    /// Position of this sheet in the compile order of the generator that built it.
    pub fn generation_epoch(&self) -> u64 {
        self.generation_epoch
    }

    pub fn key(&self) -> SheetKey {
        SheetKey::new(&self.component, self.theme_id)
    }

    pub fn rules(&self) -> &[ResolvedRule] {
        &self.rules
    }

    pub fn globals(&self) -> &[ResolvedGlobalRule] {
        &self.globals
    }

    pub fn class_name(&self, rule: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|resolved| resolved.name == rule)
            .map(|resolved| resolved.class_name.as_str())
    }

    pub fn class_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .iter()
            .map(|rule| (rule.name.as_str(), rule.class_name.as_str()))
    }

    pub fn to_css(&self, options: &CssOptions) -> String {
        css::serialize_sheet(self, options)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub component: String,
    pub theme_id: ThemeId,
}

impl SheetKey {
    pub fn new(component: impl Into<String>, theme_id: ThemeId) -> Self {
        Self {
            component: component.into(),
            theme_id,
        }
    }
}

/// Compiled sheets keyed by component and theme identity.
///
/// Entries are immutable and the first insert for a key wins, so concurrent
/// compilers racing on the same key all end up sharing one sheet.
#[derive(Debug, Default)]
pub struct SheetCache {
    sheets: RwLock<HashMap<SheetKey, Arc<Sheet>>>,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, component: &str, theme_id: ThemeId) -> Option<Arc<Sheet>> {
        self.sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&SheetKey::new(component, theme_id))
            .cloned()
    }

    /// Stores `sheet` unless its key is taken, returning whichever sheet ends up cached.
    pub fn insert(&self, sheet: Sheet) -> Arc<Sheet> {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(sheet.key())
            .or_insert_with(|| Arc::new(sheet))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sheets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sheet handed back by [`SheetCompiler::compile`].
#[derive(Debug, Clone)]
pub struct Compiled {
    pub sheet: Arc<Sheet>,
    /// `false` when the sheet came straight from the cache.
    pub fresh: bool,
}

/// Turns style specifications into sheets, consulting the cache first.
pub struct SheetCompiler<'a> {
    cache: &'a SheetCache,
    generator: &'a mut ClassNameGenerator,
}

impl<'a> SheetCompiler<'a> {
    pub fn new(cache: &'a SheetCache, generator: &'a mut ClassNameGenerator) -> Self {
        Self { cache, generator }
    }

    /// A cache hit returns the stored sheet without consuming class names.
    pub fn compile(
        &mut self,
        component: &str,
        specification: &dyn StyleSpecification,
        theme: &Theme,
    ) -> Result<Compiled, StyleError> {
        if let Some(sheet) = self.cache.get(component, theme.id()) {
            tracing::trace!(component, theme = theme.id().get(), "sheet cache hit");
            return Ok(Compiled { sheet, fresh: false });
        }

        let rule_map = specification.rules(theme)?;
        let (rules, globals) = resolver::resolve(component, &rule_map, self.generator)?.into_parts();
        let generation_epoch = self.generator.begin_sheet();

        tracing::debug!(
            component,
            theme = theme.id().get(),
            generation_epoch,
            rules = rules.len(),
            "compiled sheet"
        );

        let sheet = self.cache.insert(Sheet {
            component: component.to_string(),
            theme_id: theme.id(),
            generation_epoch,
            rules,
            globals,
        });

        Ok(Compiled { sheet, fresh: true })
    }
}
