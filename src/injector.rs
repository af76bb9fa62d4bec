//! Client-side style injection.
//!
//! The injector owns one managed `<style>` node in the document head. Sheets
//! used before hydration completes are queued; once the client has replayed
//! the server's render pass, the server placeholder is dropped and the queue
//! is flushed. After that every newly used sheet is appended.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    context::SheetSink,
    css::{self, CssOptions},
    registry::{DEFAULT_STYLE_ELEMENT_ID, escape_style_text},
    sheet::{Sheet, SheetKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Append,
    Prepend,
    Before(NodeId),
}

/// The slice of a document head the injector needs.
pub trait StyleDocument {
    fn find_style_element(&self, element_id: &str) -> Option<NodeId>;

    fn find_comment(&self, text: &str) -> Option<NodeId>;

    fn text(&self, node: NodeId) -> Option<String>;

    fn create_style_element(&mut self, position: InsertPosition) -> NodeId;

    fn append_text(&mut self, node: NodeId, text: &str);

    fn set_text(&mut self, node: NodeId, text: &str);

    fn remove(&mut self, node: NodeId);
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct InjectorOptions {
    /// Put the managed node before application styles so they win the cascade.
    pub inject_first: bool,
    /// Text of a comment node to insert before when `inject_first` is set.
    /// Without one the managed node is prepended to the head.
    pub insertion_point: Option<String>,
    /// Must match the server's `get_style_element_id()`.
    pub server_element_id: String,
    pub css: CssOptions,
}

impl Default for InjectorOptions {
    fn default() -> Self {
        Self {
            inject_first: false,
            insertion_point: None,
            server_element_id: DEFAULT_STYLE_ELEMENT_ID.to_string(),
            css: CssOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorState {
    Uninitialized,
    AwaitingHydration,
    Hydrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// The document had no server-rendered styles.
    NoServerStyles,
    /// The client reproduced the server CSS and the placeholder was removed.
    Matched,
    /// The client CSS differs. The placeholder is kept so server markup keeps its styles.
    Mismatched,
    /// Hydration had already completed.
    AlreadyHydrated,
}

#[derive(Debug)]
pub struct StyleInjector<D> {
    document: D,
    options: InjectorOptions,
    state: InjectorState,
    placeholder: Option<NodeId>,
    managed: Option<NodeId>,
    queue: Vec<Arc<Sheet>>,
    injected: IndexMap<SheetKey, Arc<Sheet>>,
    references: HashMap<SheetKey, usize>,
}

impl<D: StyleDocument> StyleInjector<D> {
    pub fn new(document: D) -> Self {
        Self::with_options(document, InjectorOptions::default())
    }

    pub fn with_options(document: D, options: InjectorOptions) -> Self {
        Self {
            document,
            options,
            state: InjectorState::Uninitialized,
            placeholder: None,
            managed: None,
            queue: Vec::new(),
            injected: IndexMap::new(),
            references: HashMap::new(),
        }
    }

    pub fn state(&self) -> InjectorState {
        self.state
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Locates the server placeholder and starts waiting for hydration.
    pub fn mount(&mut self) {
        if self.state != InjectorState::Uninitialized {
            return;
        }

        self.placeholder = self
            .document
            .find_style_element(&self.options.server_element_id);
        self.state = InjectorState::AwaitingHydration;

        tracing::debug!(
            server_styles = self.placeholder.is_some(),
            "style injector mounted"
        );
    }

    /// Called once the client finished replaying the server render pass.
    ///
    /// The queued sheets are compared with the placeholder text; on a match
    /// the placeholder is removed. Either way the queue is flushed into the
    /// managed node and the injector switches to incremental injection.
    pub fn complete_hydration(&mut self) -> HydrationOutcome {
        match self.state {
            InjectorState::Hydrated => return HydrationOutcome::AlreadyHydrated,
            InjectorState::Uninitialized => self.mount(),
            InjectorState::AwaitingHydration => {}
        }

        let outcome = match self.placeholder {
            None => HydrationOutcome::NoServerStyles,
            Some(placeholder) => {
                let server_css = self.document.text(placeholder).unwrap_or_default();
                // The placeholder holds the escaped text the server wrote.
                let client_css = escape_style_text(&css::serialize_sheets(
                    self.queue.iter().map(Arc::as_ref),
                    &self.options.css,
                ));

                if server_css.trim() == client_css.trim() {
                    self.document.remove(placeholder);
                    self.placeholder = None;
                    HydrationOutcome::Matched
                } else {
                    tracing::warn!(
                        element_id = %self.options.server_element_id,
                        server_bytes = server_css.len(),
                        client_bytes = client_css.len(),
                        "client styles don't match the server styles, keeping the server placeholder"
                    );
                    HydrationOutcome::Mismatched
                }
            }
        };

        for sheet in std::mem::take(&mut self.queue) {
            self.inject(sheet);
        }

        self.state = InjectorState::Hydrated;
        outcome
    }

    /// Drops one reference taken by a render. Returns the references left.
    pub fn release(&mut self, key: &SheetKey) -> usize {
        match self.references.get_mut(key) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        }
    }

    pub fn references(&self, key: &SheetKey) -> usize {
        self.references.get(key).copied().unwrap_or(0)
    }

    /// Removes the rules of sheets nobody references any more and returns how
    /// many sheets were dropped. Referenced sheets are never touched.
    ///
    /// Does nothing until hydration completes: queued sheets are part of the
    /// CSS compared against the server placeholder.
    pub fn prune_unreferenced(&mut self) -> usize {
        if self.state != InjectorState::Hydrated {
            tracing::trace!(state = ?self.state, "skipped pruning before hydration");
            return 0;
        }

        let unreferenced = |key: &SheetKey| self.references.get(key).is_none_or(|count| *count == 0);

        let injected = std::mem::take(&mut self.injected);
        let (kept, pruned): (IndexMap<_, _>, IndexMap<_, _>) =
            injected.into_iter().partition(|(key, _)| !unreferenced(key));

        let removed = pruned.len();
        self.injected = kept;

        for key in pruned.keys() {
            self.references.remove(key);
        }

        if !pruned.is_empty()
            && let Some(managed) = self.managed
        {
            let css = css::serialize_sheets(
                self.injected.values().map(Arc::as_ref),
                &self.options.css,
            );
            self.document.set_text(managed, &css);
        }

        tracing::debug!(removed, "pruned unreferenced sheets");
        removed
    }

    pub fn injected_sheets(&self) -> impl Iterator<Item = &Arc<Sheet>> {
        self.injected.values()
    }

    pub fn queued_sheets(&self) -> &[Arc<Sheet>] {
        &self.queue
    }

    fn inject(&mut self, sheet: Arc<Sheet>) {
        let key = sheet.key();
        if self.injected.contains_key(&key) {
            return;
        }

        let css = sheet.to_css(&self.options.css);
        let managed = self.managed_node();

        if !css.is_empty() {
            let separator = match self.document.text(managed) {
                Some(text) if !text.is_empty() => self.options.css.separator(),
                _ => "",
            };
            self.document
                .append_text(managed, &format!("{separator}{css}"));
        }

        tracing::trace!(component = sheet.component(), "injected sheet");
        self.injected.insert(key, sheet);
    }

    fn managed_node(&mut self) -> NodeId {
        if let Some(managed) = self.managed {
            return managed;
        }

        let position = if self.options.inject_first {
            self.options
                .insertion_point
                .as_deref()
                .and_then(|text| self.document.find_comment(text))
                .map_or(InsertPosition::Prepend, InsertPosition::Before)
        } else {
            InsertPosition::Append
        };

        let managed = self.document.create_style_element(position);
        self.managed = Some(managed);
        managed
    }
}

impl<D: StyleDocument> SheetSink for StyleInjector<D> {
    fn push_sheet(&mut self, sheet: Arc<Sheet>) {
        let key = sheet.key();
        *self.references.entry(key.clone()).or_default() += 1;

        if self.injected.contains_key(&key) || self.queue.iter().any(|queued| queued.key() == key) {
            return;
        }

        if self.state == InjectorState::Hydrated {
            self.inject(sheet);
        } else {
            tracing::trace!(component = sheet.component(), "queued sheet until hydration");
            self.queue.push(sheet);
        }
    }

    fn is_server(&self) -> bool {
        false
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "test-support"))] {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum VirtualNode {
            Style { element_id: Option<String>, text: String },
            Comment(String),
        }

        /// An in-memory document head.
        #[derive(Debug, Clone, Default)]
        pub struct VirtualDocument {
            nodes: Vec<(NodeId, VirtualNode)>,
            next_id: usize,
        }

        impl VirtualDocument {
            pub fn new() -> Self {
                Self::default()
            }

            /// A head as the server renders it.
            pub fn with_server_styles(mut self, element_id: &str, css: &str) -> Self {
                self.push(VirtualNode::Style {
                    element_id: Some(element_id.to_string()),
                    text: css.to_string(),
                });
                self
            }

            pub fn with_style(mut self, css: &str) -> Self {
                self.push(VirtualNode::Style { element_id: None, text: css.to_string() });
                self
            }

            pub fn with_comment(mut self, text: &str) -> Self {
                self.push(VirtualNode::Comment(text.to_string()));
                self
            }

            pub fn nodes(&self) -> impl Iterator<Item = &VirtualNode> {
                self.nodes.iter().map(|(_, node)| node)
            }

            /// Text of every `<style>` node, in document order.
            pub fn style_texts(&self) -> Vec<&str> {
                self.nodes()
                    .filter_map(|node| match node {
                        VirtualNode::Style { text, .. } => Some(text.as_str()),
                        VirtualNode::Comment(_) => None,
                    })
                    .collect()
            }

            fn push(&mut self, node: VirtualNode) -> NodeId {
                let id = self.allocate();
                self.nodes.push((id, node));
                id
            }

            fn allocate(&mut self) -> NodeId {
                let id = NodeId(self.next_id);
                self.next_id += 1;
                id
            }

            fn node_mut(&mut self, node: NodeId) -> Option<&mut VirtualNode> {
                self.nodes.iter_mut().find(|(id, _)| *id == node).map(|(_, node)| node)
            }
        }

        impl StyleDocument for VirtualDocument {
            fn find_style_element(&self, element_id: &str) -> Option<NodeId> {
                self.nodes.iter().find_map(|(id, node)| match node {
                    VirtualNode::Style { element_id: Some(found), .. } if found == element_id => Some(*id),
                    _ => None,
                })
            }

            fn find_comment(&self, text: &str) -> Option<NodeId> {
                self.nodes.iter().find_map(|(id, node)| match node {
                    VirtualNode::Comment(found) if found.trim() == text.trim() => Some(*id),
                    _ => None,
                })
            }

            fn text(&self, node: NodeId) -> Option<String> {
                self.nodes.iter().find(|(id, _)| *id == node).map(|(_, node)| match node {
                    VirtualNode::Style { text, .. } | VirtualNode::Comment(text) => text.clone(),
                })
            }

            fn create_style_element(&mut self, position: InsertPosition) -> NodeId {
                let id = self.allocate();
                let node = VirtualNode::Style { element_id: None, text: String::new() };

                let index = match position {
                    InsertPosition::Append => self.nodes.len(),
                    InsertPosition::Prepend => 0,
                    InsertPosition::Before(anchor) => self
                        .nodes
                        .iter()
                        .position(|(id, _)| *id == anchor)
                        .unwrap_or(self.nodes.len()),
                };

                self.nodes.insert(index, (id, node));
                id
            }

            fn append_text(&mut self, node: NodeId, text: &str) {
                if let Some(VirtualNode::Style { text: existing, .. }) = self.node_mut(node) {
                    existing.push_str(text);
                }
            }

            fn set_text(&mut self, node: NodeId, text: &str) {
                if let Some(VirtualNode::Style { text: existing, .. }) = self.node_mut(node) {
                    *existing = text.to_string();
                }
            }

            fn remove(&mut self, node: NodeId) {
                self.nodes.retain(|(id, _)| *id != node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sonnat_theme::{Theme, ThemeOverrides, create_theme};

    use super::*;
    use crate::{
        ClassNameGenerator,
        declaration::{Declaration, RuleMap},
        sheet::{SheetCache, SheetCompiler},
    };

    fn sheet(component: &str, theme: &Theme, generator: &mut ClassNameGenerator) -> Arc<Sheet> {
        let rules = RuleMap::new().rule("root", Declaration::new().set("color", "red"));
        SheetCompiler::new(&SheetCache::new(), generator)
            .compile(component, &rules, theme)
            .unwrap()
            .sheet
    }

    fn minified() -> InjectorOptions {
        InjectorOptions {
            css: CssOptions::minified(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sheets_queue_until_hydration() {
        let mut generator = ClassNameGenerator::new();
        let mut injector = StyleInjector::with_options(VirtualDocument::new(), minified());

        injector.push_sheet(sheet("Button", Theme::default_theme(), &mut generator));
        assert_eq!(injector.state(), InjectorState::Uninitialized);
        assert_eq!(injector.queued_sheets().len(), 1);
        assert!(injector.document().style_texts().is_empty());

        assert_eq!(injector.complete_hydration(), HydrationOutcome::NoServerStyles);
        assert_eq!(injector.state(), InjectorState::Hydrated);
        assert_eq!(
            injector.document().style_texts(),
            [".SonnatButton-root-1{color:red}"]
        );

        injector.push_sheet(sheet("Text", Theme::default_theme(), &mut generator));
        assert_eq!(
            injector.document().style_texts(),
            [".SonnatButton-root-1{color:red}.SonnatText-root-2{color:red}"]
        );
        assert_eq!(injector.complete_hydration(), HydrationOutcome::AlreadyHydrated);
    }

    #[test]
    fn test_matching_placeholder_is_removed() {
        let document = VirtualDocument::new()
            .with_server_styles(DEFAULT_STYLE_ELEMENT_ID, ".SonnatButton-root-1{color:red}");
        let mut injector = StyleInjector::with_options(document, minified());
        injector.mount();
        assert_eq!(injector.state(), InjectorState::AwaitingHydration);

        injector.push_sheet(sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new()));

        assert_eq!(injector.complete_hydration(), HydrationOutcome::Matched);
        assert_eq!(
            injector.document().style_texts(),
            [".SonnatButton-root-1{color:red}"]
        );
        assert!(injector.document().find_style_element(DEFAULT_STYLE_ELEMENT_ID).is_none());
    }

    #[test]
    fn test_mismatched_placeholder_is_kept() {
        let document = VirtualDocument::new()
            .with_server_styles(DEFAULT_STYLE_ELEMENT_ID, ".SonnatButton-root-7{color:red}");
        let mut injector = StyleInjector::with_options(document, minified());
        injector.mount();
        injector.push_sheet(sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new()));

        assert_eq!(injector.complete_hydration(), HydrationOutcome::Mismatched);
        assert_eq!(injector.document().style_texts().len(), 2);
    }

    #[test]
    fn test_inject_first_uses_insertion_point() {
        let document = VirtualDocument::new()
            .with_style(".app{}")
            .with_comment("sonnat-insertion-point")
            .with_style(".late{}");
        let mut injector = StyleInjector::with_options(
            document,
            InjectorOptions {
                inject_first: true,
                insertion_point: Some("sonnat-insertion-point".to_string()),
                ..minified()
            },
        );
        injector.complete_hydration();
        injector.push_sheet(sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new()));

        let nodes: Vec<_> = injector.document().nodes().cloned().collect();
        assert_eq!(nodes[1], VirtualNode::Style {
            element_id: None,
            text: ".SonnatButton-root-1{color:red}".to_string()
        });
        assert_eq!(nodes[2], VirtualNode::Comment("sonnat-insertion-point".to_string()));
    }

    #[test]
    fn test_inject_first_without_insertion_point_prepends() {
        let document = VirtualDocument::new().with_style(".app{}");
        let mut injector = StyleInjector::with_options(
            document,
            InjectorOptions {
                inject_first: true,
                ..minified()
            },
        );
        injector.complete_hydration();
        injector.push_sheet(sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new()));

        assert_eq!(
            injector.document().style_texts(),
            [".SonnatButton-root-1{color:red}", ".app{}"]
        );
    }

    #[test]
    fn test_theme_switch_keeps_referenced_rules() -> anyhow::Result<()> {
        let mut generator = ClassNameGenerator::new();
        let light = create_theme(&ThemeOverrides::new())?;
        let dark = create_theme(&ThemeOverrides::new().set("darkMode", true))?;

        let mut injector = StyleInjector::with_options(VirtualDocument::new(), minified());
        injector.complete_hydration();

        let light_sheet = sheet("Button", &light, &mut generator);
        injector.push_sheet(light_sheet.clone());
        let dark_sheet = sheet("Button", &dark, &mut generator);
        injector.push_sheet(dark_sheet.clone());

        assert_eq!(injector.injected_sheets().count(), 2);
        assert_eq!(injector.prune_unreferenced(), 0);

        assert_eq!(injector.release(&light_sheet.key()), 0);
        assert_eq!(injector.prune_unreferenced(), 1);
        assert_eq!(
            injector.document().style_texts(),
            [".SonnatButton-root-2{color:red}"]
        );
        assert_eq!(injector.references(&dark_sheet.key()), 1);
        Ok(())
    }

    #[test]
    fn test_options_from_json() -> anyhow::Result<()> {
        let options: InjectorOptions = serde_json::from_str(
            r#"{ "injectFirst": true, "insertionPoint": "sonnat-insertion-point" }"#,
        )?;

        assert!(options.inject_first);
        assert_eq!(options.insertion_point.as_deref(), Some("sonnat-insertion-point"));
        assert_eq!(options.server_element_id, DEFAULT_STYLE_ELEMENT_ID);
        Ok(())
    }

    #[test]
    fn test_repeated_use_counts_references() {
        let button = sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new());
        let mut injector = StyleInjector::new(VirtualDocument::new());

        injector.push_sheet(button.clone());
        injector.push_sheet(button.clone());
        assert_eq!(injector.queued_sheets().len(), 1);
        assert_eq!(injector.references(&button.key()), 2);

        injector.release(&button.key());
        injector.complete_hydration();
        assert_eq!(injector.prune_unreferenced(), 0);
        injector.release(&button.key());
        assert_eq!(injector.prune_unreferenced(), 1);
        assert_eq!(injector.injected_sheets().count(), 0);
        assert_eq!(injector.document().style_texts(), [""]);
    }

    #[test]
    fn test_pruning_waits_for_hydration() {
        let css = ".SonnatButton-root-1{color:red}";
        let document = VirtualDocument::new().with_server_styles(DEFAULT_STYLE_ELEMENT_ID, css);
        let mut injector = StyleInjector::with_options(document, minified());
        injector.mount();

        let button = sheet("Button", Theme::default_theme(), &mut ClassNameGenerator::new());
        injector.push_sheet(button.clone());
        injector.release(&button.key());

        assert_eq!(injector.prune_unreferenced(), 0);
        assert_eq!(injector.queued_sheets().len(), 1);
        assert_eq!(injector.complete_hydration(), HydrationOutcome::Matched);
        assert_eq!(injector.prune_unreferenced(), 1);
    }

    #[test]
    fn test_escaped_placeholder_still_matches() -> anyhow::Result<()> {
        let rules = RuleMap::new().rule(
            "root",
            Declaration::new().nest("&::after", Declaration::new().set("content", "'</style>'")),
        );
        let compiled = |generator: &mut ClassNameGenerator| {
            SheetCompiler::new(&SheetCache::new(), generator).compile("Quote", &rules, Theme::default_theme())
        };

        let server_sheet = compiled(&mut ClassNameGenerator::new())?.sheet;
        let server_css = escape_style_text(&server_sheet.to_css(&CssOptions::minified()));
        assert!(server_css.contains("<\\/style>"));

        let document = VirtualDocument::new().with_server_styles(DEFAULT_STYLE_ELEMENT_ID, &server_css);
        let mut injector = StyleInjector::with_options(document, minified());
        injector.mount();
        injector.push_sheet(compiled(&mut ClassNameGenerator::new())?.sheet);

        assert_eq!(injector.complete_hydration(), HydrationOutcome::Matched);
        assert!(injector.document().find_style_element(DEFAULT_STYLE_ELEMENT_ID).is_none());
        Ok(())
    }
}
