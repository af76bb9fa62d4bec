//! Style declarations as authored by a style specification.
//!
//! References and inheritance are explicit variants here: a `$rule` token
//! becomes [`Segment::Reference`] and `extend` lives on [`Rule`] only, so the
//! resolver never has to guess intent from string prefixes.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as Json;
use smallvec::SmallVec;
use sonnat_theme::{MixinDeclaration, format_decimal};

use crate::StyleError;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    /// The generated class name of another rule in the same sheet.
    Reference(String),
}

/// A string that may embed `$rule` references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    segments: SmallVec<[Segment; 1]>,
}

impl Template {
    /// Splits `$identifier` tokens out of `input`. A `$` not followed by an
    /// identifier character is kept literally.
    pub fn parse(input: &str) -> Self {
        let mut template = Self::default();
        let mut chars = input.char_indices().peekable();

        while let Some((index, ch)) = chars.next() {
            if ch != '$' {
                template.push_literal(ch);
                continue;
            }

            let start = index + 1;
            let mut end = start;
            while let Some(&(next_index, next)) = chars.peek() {
                if !is_identifier_char(next) {
                    break;
                }
                end = next_index + next.len_utf8();
                chars.next();
            }

            if end == start {
                template.push_literal('$');
            } else {
                template
                    .segments
                    .push(Segment::Reference(input[start..end].to_string()));
            }
        }

        template
    }

    /// A template that never contains references, even if `text` has a `$`.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut template = Self::default();
        if !text.is_empty() {
            template.segments.push(Segment::Literal(text));
        }
        template
    }

    pub fn reference(rule: impl Into<String>) -> Self {
        Self {
            segments: SmallVec::from_buf([Segment::Reference(rule.into())]),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Reference(rule) => Some(rule.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Replaces every reference through `lookup`. Fails with the first
    /// reference `lookup` can't resolve.
    pub(crate) fn render(
        &self,
        mut lookup: impl FnMut(&str) -> Option<String>,
    ) -> Result<String, String> {
        let mut output = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Reference(rule) => {
                    output.push_str(&lookup(rule).ok_or_else(|| rule.clone())?);
                }
            }
        }

        Ok(output)
    }

    fn push_literal(&mut self, ch: char) {
        if let Some(Segment::Literal(text)) = self.segments.last_mut() {
            text.push(ch);
        } else {
            self.segments.push(Segment::Literal(ch.to_string()));
        }
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Reference(rule) => write!(f, "${rule}")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Template {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rendered with a `px` unit unless the property is unitless or the value is zero.
    Number(f64),
    Text(Template),
}

impl From<Template> for Value {
    fn from(value: Template) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(Template::parse(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(Template::parse(&value))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(Template::parse(value))
    }
}

macro_rules! impl_number_value {
    ( $( $ty:ty ),+ ) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )+
    };
}

impl_number_value!(f64, f32, i32, u32, i16, u16, u8);

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalRule {
    pub selector: Template,
    pub declaration: Declaration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `&:hover`, `& $icon`, `& > span`... `&` stands for the parent selector.
    Selector {
        selector: Template,
        declaration: Declaration,
    },
    Media {
        query: String,
        declaration: Declaration,
    },
    /// Bare selectors that bypass class-name scoping.
    Global(Vec<GlobalRule>),
}

/// An ordered set of properties followed by nested blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declaration {
    properties: IndexMap<String, Value>,
    blocks: Vec<Block>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    /// Sets `property` only when `value` is present.
    pub fn set_some(self, property: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.set(property, value),
            None => self,
        }
    }

    pub fn nest(mut self, selector: impl Into<Template>, declaration: Declaration) -> Self {
        self.blocks.push(Block::Selector {
            selector: selector.into(),
            declaration,
        });
        self
    }

    pub fn media(mut self, query: impl Into<String>, declaration: Declaration) -> Self {
        self.blocks.push(Block::Media {
            query: query.into(),
            declaration,
        });
        self
    }

    pub fn global(mut self, selector: impl Into<Template>, declaration: Declaration) -> Self {
        let rule = GlobalRule {
            selector: selector.into(),
            declaration,
        };

        match self.blocks.iter_mut().find_map(|block| match block {
            Block::Global(rules) => Some(rules),
            _ => None,
        }) {
            Some(rules) => rules.push(rule),
            None => self.blocks.push(Block::Global(vec![rule])),
        }

        self
    }

    /// Copies a theme mixin's properties in. Later `set` calls still win.
    pub fn mixin(mut self, mixin: MixinDeclaration) -> Self {
        for (property, value) in mixin {
            self.properties
                .insert(property, Value::Text(Template::literal(value)));
        }
        self
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.blocks.is_empty()
    }

    /// Layers `self` over `base`: `self`'s properties win, inherited ones keep
    /// their position, and blocks with the same selector or query merge.
    pub(crate) fn layered_over(&self, base: &Declaration) -> Declaration {
        let mut merged = base.clone();

        for (property, value) in &self.properties {
            merged.properties.insert(property.clone(), value.clone());
        }

        for block in &self.blocks {
            merged.merge_block(block);
        }

        merged
    }

    fn merge_block(&mut self, block: &Block) {
        let position = self.blocks.iter().position(|existing| match (existing, block) {
            (Block::Selector { selector: a, .. }, Block::Selector { selector: b, .. }) => a == b,
            (Block::Media { query: a, .. }, Block::Media { query: b, .. }) => a == b,
            (Block::Global(_), Block::Global(_)) => true,
            _ => false,
        });

        let Some(position) = position else {
            self.blocks.push(block.clone());
            return;
        };

        match (&mut self.blocks[position], block) {
            (
                Block::Selector { declaration, .. },
                Block::Selector {
                    declaration: own, ..
                },
            )
            | (
                Block::Media { declaration, .. },
                Block::Media {
                    declaration: own, ..
                },
            ) => *declaration = own.layered_over(declaration),
            (Block::Global(rules), Block::Global(own)) => rules.extend(own.iter().cloned()),
            _ => {}
        }
    }
}

/// One named rule. Only rules (never nested blocks) can extend other rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rule {
    extends: SmallVec<[String; 1]>,
    declaration: Declaration,
}

impl Rule {
    pub fn new(declaration: Declaration) -> Self {
        Self {
            extends: SmallVec::new(),
            declaration,
        }
    }

    /// Inherits `target`'s declarations. Several targets apply in order.
    pub fn extend(mut self, target: impl Into<String>) -> Self {
        self.extends.push(target.into());
        self
    }

    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }
}

impl From<Declaration> for Rule {
    fn from(declaration: Declaration) -> Self {
        Self::new(declaration)
    }
}

/// What a style specification returns: named rules plus sheet-level globals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleMap {
    rules: IndexMap<String, Rule>,
    globals: Vec<GlobalRule>,
}

impl RuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.rules.insert(name.into(), rule.into());
        self
    }

    pub fn global(mut self, selector: impl Into<Template>, declaration: Declaration) -> Self {
        self.globals.push(GlobalRule {
            selector: selector.into(),
            declaration,
        });
        self
    }

    pub fn rules(&self) -> &IndexMap<String, Rule> {
        &self.rules
    }

    pub fn globals(&self) -> &[GlobalRule] {
        &self.globals
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.globals.is_empty()
    }

    /// Converts a JSS-style object into typed rules.
    ///
    /// `extend` (a string or list of strings) is accepted at rule level only,
    /// `@global` maps bare selectors to declarations, `@media ...` and object
    /// valued keys become nested blocks, and arrays are joined with `", "`.
    pub fn from_json(document: &Json) -> Result<Self, StyleError> {
        let object = document
            .as_object()
            .ok_or_else(|| StyleError::invalid_declaration("", "expected an object of rules"))?;

        let mut rule_map = Self::new();

        for (name, body) in object {
            if name == "@global" {
                rule_map.globals.extend(parse_globals(name, body)?);
                continue;
            }

            if name.is_empty() || name.starts_with('@') {
                return Err(StyleError::invalid_declaration(
                    name,
                    "rule names must be non-empty identifiers",
                ));
            }

            let body = body
                .as_object()
                .ok_or_else(|| StyleError::invalid_declaration(name, "expected an object"))?;

            let mut rule = Rule::default();
            for (key, value) in body {
                if key == "extend" {
                    rule.extends = parse_extends(name, value)?;
                } else {
                    parse_entry(&mut rule.declaration, name, key, value)?;
                }
            }

            rule_map.rules.insert(name.clone(), rule);
        }

        Ok(rule_map)
    }
}

fn parse_extends(path: &str, value: &Json) -> Result<SmallVec<[String; 1]>, StyleError> {
    let invalid = || StyleError::invalid_declaration(path, "`extend` takes a rule name or a list of them");

    match value {
        Json::String(target) => Ok(SmallVec::from_buf([target.clone()])),
        Json::Array(targets) => targets
            .iter()
            .map(|target| target.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn parse_globals(path: &str, value: &Json) -> Result<Vec<GlobalRule>, StyleError> {
    let object = value
        .as_object()
        .ok_or_else(|| StyleError::invalid_declaration(path, "expected selectors mapped to objects"))?;

    object
        .iter()
        .map(|(selector, body)| {
            let path = format!("{path} > {selector}");
            Ok(GlobalRule {
                selector: Template::parse(selector),
                declaration: parse_declaration(&path, body)?,
            })
        })
        .collect()
}

fn parse_declaration(path: &str, value: &Json) -> Result<Declaration, StyleError> {
    let object = value
        .as_object()
        .ok_or_else(|| StyleError::invalid_declaration(path, "expected an object"))?;

    let mut declaration = Declaration::new();
    for (key, value) in object {
        if key == "extend" {
            return Err(StyleError::invalid_declaration(
                path,
                "`extend` is only allowed at rule level",
            ));
        }

        parse_entry(&mut declaration, path, key, value)?;
    }

    Ok(declaration)
}

fn parse_entry(
    declaration: &mut Declaration,
    path: &str,
    key: &str,
    value: &Json,
) -> Result<(), StyleError> {
    if key.is_empty() {
        return Err(StyleError::invalid_declaration(path, "empty key"));
    }

    let nested_path = || format!("{path} > {key}");

    match value {
        Json::Object(_) if key == "@global" => {
            for rule in parse_globals(&nested_path(), value)? {
                *declaration = std::mem::take(declaration).global(rule.selector, rule.declaration);
            }
        }
        Json::Object(_) if key.starts_with("@media") => {
            let nested = parse_declaration(&nested_path(), value)?;
            declaration.blocks.push(Block::Media {
                query: key.to_string(),
                declaration: nested,
            });
        }
        Json::Object(_) if key.starts_with('@') => {
            return Err(StyleError::invalid_declaration(
                nested_path(),
                "unsupported at-rule",
            ));
        }
        Json::Object(_) => {
            let nested = parse_declaration(&nested_path(), value)?;
            declaration.blocks.push(Block::Selector {
                selector: Template::parse(key),
                declaration: nested,
            });
        }
        Json::String(text) => {
            declaration
                .properties
                .insert(key.to_string(), Value::from(text.as_str()));
        }
        Json::Number(number) => {
            let number = number
                .as_f64()
                .ok_or_else(|| StyleError::invalid_declaration(nested_path(), "number out of range"))?;
            declaration
                .properties
                .insert(key.to_string(), Value::Number(number));
        }
        Json::Array(items) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    Json::String(text) => Ok(text.clone()),
                    Json::Number(number) => number
                        .as_f64()
                        .map(|number| format_decimal(number, 4))
                        .ok_or_else(|| {
                            StyleError::invalid_declaration(nested_path(), "number out of range")
                        }),
                    _ => Err(StyleError::invalid_declaration(
                        nested_path(),
                        "arrays may only hold strings and numbers",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;

            declaration
                .properties
                .insert(key.to_string(), Value::from(parts.join(", ")));
        }
        Json::Bool(_) | Json::Null => {
            return Err(StyleError::invalid_declaration(
                nested_path(),
                "expected a string, number, array or object",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use sonnat_theme::Theme;

    use super::*;
    use crate::{
        ClassNameGenerator, ConfigurationError,
        css::CssOptions,
        sheet::{SheetCache, SheetCompiler},
    };

    #[test]
    fn test_template_parses_references() {
        let template = Template::parse("& $label > $icon-wrapper");

        assert_eq!(
            template.segments(),
            [
                Segment::Literal("& ".into()),
                Segment::Reference("label".into()),
                Segment::Literal(" > ".into()),
                Segment::Reference("icon-wrapper".into()),
            ]
        );
        assert_eq!(template.to_string(), "& $label > $icon-wrapper");
    }

    #[test]
    fn test_template_keeps_lone_dollar() {
        let template = Template::parse("costs $ 5");
        assert_eq!(template.references().count(), 0);
        assert_eq!(template.segments(), [Segment::Literal("costs $ 5".into())]);
    }

    #[test]
    fn test_literal_template_ignores_dollar() {
        let template = Template::literal("$b");
        assert_eq!(template.references().count(), 0);
    }

    #[test]
    fn test_render_reports_missing_reference() {
        let template = Template::parse("$a $b");
        let rendered = template.render(|rule| (rule == "a").then(|| "A".to_string()));
        assert_eq!(rendered, Err("b".to_string()));
    }

    #[test]
    fn test_layered_over_precedence() {
        let base = Declaration::new()
            .set("color", "red")
            .set("fontSize", 10)
            .nest("&:hover", Declaration::new().set("color", "darkred").set("opacity", 1));
        let own = Declaration::new()
            .set("color", "blue")
            .nest("&:hover", Declaration::new().set("opacity", 0.5));

        let merged = own.layered_over(&base);

        assert_eq!(merged.properties()["color"], Value::from("blue"));
        assert_eq!(merged.properties()["fontSize"], Value::Number(10.0));
        assert_eq!(merged.blocks().len(), 1);

        let Block::Selector { declaration, .. } = &merged.blocks()[0] else {
            panic!("expected a selector block");
        };
        assert_eq!(declaration.properties()["color"], Value::from("darkred"));
        assert_eq!(declaration.properties()["opacity"], Value::Number(0.5));
    }

    #[test]
    fn test_global_builder_collects_into_one_block() {
        let declaration = Declaration::new()
            .global("body", Declaration::new().set("margin", 0))
            .global("a", Declaration::new().set("color", "inherit"));

        assert!(matches!(declaration.blocks(), [Block::Global(rules)] if rules.len() == 2));
    }

    #[test]
    fn test_from_json_builds_typed_rules() {
        let rule_map = RuleMap::from_json(&json!({
            "base": { "color": "red", "fontSize": 10 },
            "child": {
                "extend": "base",
                "color": "$base",
                "transition": ["color 200ms", "opacity 100ms"],
                "&:hover": { "opacity": 0.5 },
                "@media (min-width:600px)": { "fontSize": 12 }
            },
            "@global": { "body": { "margin": 0 } }
        }))
        .unwrap();

        let child = &rule_map.rules()["child"];
        assert_eq!(child.extends(), ["base"]);
        assert_eq!(
            child.declaration().properties()["color"],
            Value::Text(Template::reference("base"))
        );
        assert_eq!(
            child.declaration().properties()["transition"],
            Value::from("color 200ms, opacity 100ms")
        );
        assert_eq!(child.declaration().blocks().len(), 2);
        assert_eq!(rule_map.globals().len(), 1);
        assert_eq!(rule_map.globals()[0].selector, Template::parse("body"));
    }

    #[test]
    fn test_from_json_keeps_written_order() {
        let rule_map = RuleMap::from_json(&json!({
            "root": { "zIndex": 1, "color": "red", "background": "white" },
            "disabled": { "color": "gray" }
        }))
        .unwrap();

        assert_eq!(rule_map.rules().keys().collect::<Vec<_>>(), ["root", "disabled"]);

        let mut generator = ClassNameGenerator::new();
        let sheet = SheetCompiler::new(&SheetCache::new(), &mut generator)
            .compile("Btn", &rule_map, Theme::default_theme())
            .unwrap()
            .sheet;

        // Later rules must come later in the cascade.
        assert_eq!(
            sheet.to_css(&CssOptions::minified()),
            ".SonnatBtn-root-1{z-index:1;color:red;background:white}.SonnatBtn-disabled-2{color:gray}"
        );
    }

    #[test]
    fn test_from_json_accepts_extend_lists() {
        let rule_map = RuleMap::from_json(&json!({
            "a": {}, "b": {}, "c": { "extend": ["a", "b"] }
        }))
        .unwrap();

        assert_eq!(rule_map.rules()["c"].extends(), ["a", "b"]);
    }

    #[test]
    fn test_from_json_rejects_nested_extend() {
        let result = RuleMap::from_json(&json!({
            "a": { "&:hover": { "extend": "b" } },
            "b": {}
        }));

        assert!(matches!(
            result,
            Err(StyleError::Configuration(ConfigurationError::InvalidDeclaration { path, .. }))
                if path == "a > &:hover"
        ));
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(RuleMap::from_json(&json!({ "a": { "hidden": true } })).is_err());
        assert!(RuleMap::from_json(&json!({ "a": "red" })).is_err());
        assert!(RuleMap::from_json(&json!({ "a": { "@keyframes spin": {} } })).is_err());
        assert!(RuleMap::from_json(&json!(["a"])).is_err());
        assert!(RuleMap::from_json(&json!({ "a": { "extend": 5 } })).is_err());
    }
}
