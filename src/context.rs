//! Render-pass context: the active theme, the generator, and where compiled
//! sheets go.

use std::sync::Arc;

use serde::Deserialize;
use sonnat_theme::Theme;

use crate::{
    ClassNameGenerator, ConfigurationError, GeneratorOptions, StyleError,
    injector::{HydrationOutcome, InjectorOptions, StyleDocument, StyleInjector},
    sheet::{Sheet, SheetCache, SheetCompiler, StyleSpecification},
};

/// Receives every sheet a render pass uses, in use order.
pub trait SheetSink {
    fn push_sheet(&mut self, sheet: Arc<Sheet>);

    /// Whether sheets end up in a server response rather than a live document.
    fn is_server(&self) -> bool;
}

/// Threaded through one synchronous render pass.
///
/// Built by [`ServerStyleSheets::collect`](crate::ServerStyleSheets::collect)
/// on the server and [`ClientStyles::render`] on the client. Outside of any
/// provider the default theme applies.
pub struct RenderContext<'a> {
    sink: &'a mut dyn SheetSink,
    generator: &'a mut ClassNameGenerator,
    cache: &'a SheetCache,
    themes: Vec<Arc<Theme>>,
    initializer_depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        sink: &'a mut dyn SheetSink,
        generator: &'a mut ClassNameGenerator,
        cache: &'a SheetCache,
    ) -> Self {
        Self {
            sink,
            generator,
            cache,
            themes: Vec::new(),
            initializer_depth: 0,
        }
    }

    pub fn theme(&self) -> &Theme {
        match self.themes.last() {
            Some(theme) => theme,
            None => Theme::default_theme(),
        }
    }

    pub fn is_server(&self) -> bool {
        self.sink.is_server()
    }

    /// Compiles (or fetches) `component`'s sheet under the active theme and
    /// hands it to the sink.
    pub fn use_sheet(
        &mut self,
        component: &str,
        specification: &dyn StyleSpecification,
    ) -> Result<Arc<Sheet>, StyleError> {
        let theme: &Theme = match self.themes.last() {
            Some(theme) => theme,
            None => Theme::default_theme(),
        };

        let sheet = SheetCompiler::new(self.cache, &mut *self.generator)
            .compile(component, specification, theme)?
            .sheet;

        self.sink.push_sheet(sheet.clone());
        Ok(sheet)
    }

    fn with_theme<R>(
        &mut self,
        theme: Arc<Theme>,
        render: impl FnOnce(&mut Self) -> Result<R, StyleError>,
    ) -> Result<R, StyleError> {
        self.themes.push(theme);
        let result = render(self);
        self.themes.pop();
        result
    }
}

/// Supplies a theme to everything rendered inside it. Providers nest; the
/// innermost one wins.
#[derive(Debug, Clone)]
pub struct ThemeProvider {
    theme: Arc<Theme>,
}

impl ThemeProvider {
    pub fn new(theme: impl Into<Arc<Theme>>) -> Self {
        Self {
            theme: theme.into(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn render<R>(
        &self,
        cx: &mut RenderContext<'_>,
        render: impl FnOnce(&mut RenderContext<'_>) -> Result<R, StyleError>,
    ) -> Result<R, StyleError> {
        cx.with_theme(self.theme.clone(), |cx| render(cx))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct InitializerOptions {
    /// Require an active server collector.
    pub server_side: bool,
}

/// The root of a styled tree. Exactly one may be active per render pass.
#[derive(Debug, Clone)]
pub struct SonnatInitializer {
    theme: Arc<Theme>,
    options: InitializerOptions,
}

impl SonnatInitializer {
    pub fn new(theme: impl Into<Arc<Theme>>) -> Self {
        Self::with_options(theme, InitializerOptions::default())
    }

    pub fn with_options(theme: impl Into<Arc<Theme>>, options: InitializerOptions) -> Self {
        Self {
            theme: theme.into(),
            options,
        }
    }

    pub fn render<R>(
        &self,
        cx: &mut RenderContext<'_>,
        render: impl FnOnce(&mut RenderContext<'_>) -> Result<R, StyleError>,
    ) -> Result<R, StyleError> {
        if cx.initializer_depth > 0 {
            return Err(ConfigurationError::NestedInitializer.into());
        }

        if self.options.server_side && !cx.is_server() {
            return Err(ConfigurationError::MissingCollector.into());
        }

        cx.initializer_depth += 1;
        let result = cx.with_theme(self.theme.clone(), |cx| render(cx));
        cx.initializer_depth -= 1;
        result
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    pub generator: GeneratorOptions,
    pub injector: InjectorOptions,
}

/// The client's styling session: one generator and one injector for the
/// lifetime of the page.
///
/// Sheets are cached per session by default. [`ClientStyles::with_cache`]
/// shares a cache between sessions, at the price of class names that no
/// longer follow the server's sequence.
#[derive(Debug)]
pub struct ClientStyles<D> {
    generator: ClassNameGenerator,
    injector: StyleInjector<D>,
    cache: Arc<SheetCache>,
}

impl<D: StyleDocument> ClientStyles<D> {
    pub fn new(document: D) -> Self {
        Self::with_options(document, ClientOptions::default())
    }

    pub fn with_options(document: D, options: ClientOptions) -> Self {
        Self {
            generator: ClassNameGenerator::with_options(options.generator),
            injector: StyleInjector::with_options(document, options.injector),
            cache: Arc::new(SheetCache::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<SheetCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Runs one client render pass. The first pass mounts the injector.
    pub fn render<R>(
        &mut self,
        render: impl FnOnce(&mut RenderContext<'_>) -> Result<R, StyleError>,
    ) -> Result<R, StyleError> {
        self.injector.mount();

        let mut cx = RenderContext::new(&mut self.injector, &mut self.generator, &self.cache);
        render(&mut cx)
    }

    /// See [`StyleInjector::complete_hydration`].
    pub fn hydrate(&mut self) -> HydrationOutcome {
        self.injector.complete_hydration()
    }

    pub fn generator(&self) -> &ClassNameGenerator {
        &self.generator
    }

    pub fn injector(&self) -> &StyleInjector<D> {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut StyleInjector<D> {
        &mut self.injector
    }
}
