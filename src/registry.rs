//! Server-side style collection.

use std::{cell::Cell, collections::HashSet, fmt, sync::Arc};

use serde::Deserialize;

use crate::{
    ClassNameGenerator, GeneratorOptions, StyleError,
    context::{RenderContext, SheetSink},
    css::{self, CssOptions},
    sheet::{Sheet, SheetCache, SheetKey},
};

/// Id of the `<style>` element carrying server-rendered CSS. The client
/// injector looks for the same id.
pub const DEFAULT_STYLE_ELEMENT_ID: &str = "sonnat-server-styles";

thread_local! {
    static COLLECTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks a collection as active on this thread until dropped.
struct CollectionGuard;

impl CollectionGuard {
    fn acquire() -> Result<Self, StyleError> {
        COLLECTING.with(|collecting| {
            if collecting.replace(true) {
                Err(StyleError::NestedCollection)
            } else {
                Ok(CollectionGuard)
            }
        })
    }
}

impl Drop for CollectionGuard {
    fn drop(&mut self) {
        COLLECTING.with(|collecting| collecting.set(false));
    }
}

/// Sheets used during server render passes, in first-use order.
///
/// Cascade order follows insertion order, so a sheet used first is written
/// first and later sheets can override it.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    sheets: Vec<Arc<Sheet>>,
    keys: HashSet<SheetKey>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Arc<Sheet>] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn to_css(&self, options: &CssOptions) -> String {
        let css = css::serialize_sheets(self.sheets.iter().map(Arc::as_ref), options);
        tracing::debug!(sheets = self.sheets.len(), bytes = css.len(), "serialized registry");
        css
    }
}

impl SheetSink for StyleRegistry {
    fn push_sheet(&mut self, sheet: Arc<Sheet>) {
        if self.keys.insert(sheet.key()) {
            self.sheets.push(sheet);
        }
    }

    fn is_server(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerSheetsOptions {
    pub generator: GeneratorOptions,
    pub css: CssOptions,
    pub element_id: String,
}

impl Default for ServerSheetsOptions {
    fn default() -> Self {
        Self {
            generator: GeneratorOptions::default(),
            css: CssOptions::default(),
            element_id: DEFAULT_STYLE_ELEMENT_ID.to_string(),
        }
    }
}

/// Collects the styles of one server request.
///
/// Create one per request. It owns the request's class-name generator and
/// sheet cache, so concurrent requests never share a sequence.
///
/// ```ignore
/// let mut sheets = ServerStyleSheets::new();
/// let html = sheets.collect(|cx| render_app(cx))?;
/// let head = sheets.get_style_element();
/// ```
#[derive(Debug)]
pub struct ServerStyleSheets {
    registry: StyleRegistry,
    generator: ClassNameGenerator,
    cache: SheetCache,
    options: ServerSheetsOptions,
}

impl Default for ServerStyleSheets {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStyleSheets {
    pub fn new() -> Self {
        Self::with_options(ServerSheetsOptions::default())
    }

    pub fn with_options(options: ServerSheetsOptions) -> Self {
        Self {
            registry: StyleRegistry::new(),
            generator: ClassNameGenerator::with_options(options.generator.clone()),
            cache: SheetCache::new(),
            options,
        }
    }

    /// Runs one render pass, registering every sheet it uses.
    ///
    /// Fails with [`StyleError::NestedCollection`] when another collection is
    /// already running on this thread.
    pub fn collect<R>(
        &mut self,
        render: impl FnOnce(&mut RenderContext<'_>) -> Result<R, StyleError>,
    ) -> Result<R, StyleError> {
        let _guard = CollectionGuard::acquire()?;

        let mut cx = RenderContext::new(&mut self.registry, &mut self.generator, &self.cache);
        render(&mut cx)
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn generator(&self) -> &ClassNameGenerator {
        &self.generator
    }

    pub fn get_style_element_id(&self) -> &str {
        &self.options.element_id
    }

    /// The collected CSS wrapped in its `<style>` tag, ready for the document head.
    pub fn get_style_element(&self) -> String {
        format!(
            "<style id=\"{}\">{}</style>",
            self.options.element_id,
            escape_style_text(&self.to_string())
        )
    }
}

impl fmt::Display for ServerStyleSheets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.registry.to_css(&self.options.css))
    }
}

/// Keeps `</style>` inside declarations from closing the tag early.
pub(crate) fn escape_style_text(css: &str) -> String {
    css.replace("</", "<\\/")
}
