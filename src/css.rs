//! Serializes compiled sheets to CSS text.

use std::collections::HashSet;

use serde::Deserialize;
use sonnat_theme::format_decimal;

use crate::{
    resolver::{ResolvedBlock, ResolvedDeclaration, ResolvedValue},
    sheet::Sheet,
};

/// Numeric properties that are emitted without a `px` unit.
const UNITLESS: &[&str] = &[
    "animation-iteration-count",
    "column-count",
    "columns",
    "counter-increment",
    "counter-reset",
    "fill-opacity",
    "flex",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "grid-column",
    "grid-row",
    "line-clamp",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "stroke-opacity",
    "tab-size",
    "widows",
    "z-index",
    "zoom",
];

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssOptions {
    pub minify: bool,
}

impl CssOptions {
    pub fn minified() -> Self {
        Self { minify: true }
    }

    pub(crate) fn separator(&self) -> &'static str {
        if self.minify { "" } else { "\n" }
    }
}

/// Global rules come first, then every class rule in declaration order.
pub fn serialize_sheet(sheet: &Sheet, options: &CssOptions) -> String {
    serialize_sheets([sheet], options)
}

/// Serializes `sheets` in order. A class rule shared by several sheets is
/// written once, at its first position.
pub fn serialize_sheets<'a>(
    sheets: impl IntoIterator<Item = &'a Sheet>,
    options: &CssOptions,
) -> String {
    let mut seen = HashSet::new();
    let mut chunks = Vec::new();

    for sheet in sheets {
        for global in sheet.globals() {
            collect(&global.selector, &global.declaration, options, &mut chunks);
        }

        for rule in sheet.rules() {
            if !seen.insert(rule.class_name.as_str()) {
                continue;
            }

            collect(
                &format!(".{}", rule.class_name),
                &rule.declaration,
                options,
                &mut chunks,
            );
        }
    }

    chunks.join(options.separator())
}

fn collect(
    selector: &str,
    declaration: &ResolvedDeclaration,
    options: &CssOptions,
    chunks: &mut Vec<String>,
) {
    if !declaration.properties.is_empty() {
        chunks.push(style_rule(selector, declaration, options));
    }

    for block in &declaration.blocks {
        match block {
            ResolvedBlock::Selector {
                selector: nested,
                declaration,
            } => collect(&combine_selectors(selector, nested), declaration, options, chunks),
            ResolvedBlock::Media { query, declaration } => {
                let mut inner = Vec::new();
                collect(selector, declaration, options, &mut inner);

                if !inner.is_empty() {
                    chunks.push(media_rule(query, &inner, options));
                }
            }
            ResolvedBlock::Global(rules) => {
                for rule in rules {
                    collect(&rule.selector, &rule.declaration, options, chunks);
                }
            }
        }
    }
}

fn style_rule(selector: &str, declaration: &ResolvedDeclaration, options: &CssOptions) -> String {
    let properties = declaration.properties.iter().map(|(property, value)| {
        let property = property_name(property);
        let value = property_value(&property, value);
        (property, value)
    });

    if options.minify {
        let body = properties
            .map(|(property, value)| format!("{property}:{value}"))
            .collect::<Vec<_>>()
            .join(";");
        format!("{selector}{{{body}}}")
    } else {
        let body: String = properties
            .map(|(property, value)| format!("{INDENT}{property}: {value};\n"))
            .collect();
        format!("{selector} {{\n{body}}}")
    }
}

fn media_rule(query: &str, inner: &[String], options: &CssOptions) -> String {
    if options.minify {
        return format!("{query}{{{}}}", inner.concat());
    }

    let body = inner
        .join("\n")
        .lines()
        .map(|line| format!("{INDENT}{line}\n"))
        .collect::<String>();
    format!("{query} {{\n{body}}}")
}

/// `&` stands for the parent selector; without one the nested selector
/// becomes a descendant. Comma lists on either side expand pairwise.
pub fn combine_selectors(parent: &str, nested: &str) -> String {
    let parents = split_selector_list(parent);

    split_selector_list(nested)
        .iter()
        .flat_map(|nested| {
            parents.iter().map(move |parent| {
                if nested.contains('&') {
                    nested.replace('&', parent)
                } else {
                    format!("{parent} {nested}")
                }
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits on commas outside parentheses and brackets.
fn split_selector_list(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in selector.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(selector[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }

    parts.push(selector[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// `backgroundColor` -> `background-color`, `WebkitAppearance` ->
/// `-webkit-appearance`, `msFlex` -> `-ms-flex`. Custom properties pass through.
pub fn property_name(property: &str) -> String {
    if property.starts_with("--") || property.contains('-') {
        return property.to_string();
    }

    let mut output = String::with_capacity(property.len() + 4);
    if property.starts_with("ms") && property[2..].starts_with(|ch: char| ch.is_ascii_uppercase()) {
        output.push('-');
    }

    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            output.push('-');
            output.push(ch.to_ascii_lowercase());
        } else {
            output.push(ch);
        }
    }

    output
}

fn property_value(property: &str, value: &ResolvedValue) -> String {
    match value {
        ResolvedValue::Text(text) => text.clone(),
        ResolvedValue::Number(number) => {
            let formatted = format_decimal(*number, 4);

            if formatted == "0" || property.starts_with("--") || UNITLESS.contains(&property) {
                formatted
            } else {
                format!("{formatted}px")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sonnat_theme::Theme;

    use super::*;
    use crate::{
        ClassNameGenerator,
        declaration::{Declaration, RuleMap},
        sheet::{SheetCache, SheetCompiler},
    };

    fn compile(rule_map: RuleMap) -> std::sync::Arc<Sheet> {
        let cache = SheetCache::new();
        let mut generator = ClassNameGenerator::new();
        SheetCompiler::new(&cache, &mut generator)
            .compile("Test", &rule_map, Theme::default_theme())
            .unwrap()
            .sheet
    }

    #[test]
    fn test_property_names() {
        assert_eq!(property_name("backgroundColor"), "background-color");
        assert_eq!(property_name("WebkitAppearance"), "-webkit-appearance");
        assert_eq!(property_name("MozOsxFontSmoothing"), "-moz-osx-font-smoothing");
        assert_eq!(property_name("msTransform"), "-ms-transform");
        assert_eq!(property_name("--sonnat-gap"), "--sonnat-gap");
        assert_eq!(property_name("margin-top"), "margin-top");
        assert_eq!(property_name("mask"), "mask");
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(property_value("width", &ResolvedValue::Number(12.0)), "12px");
        assert_eq!(property_value("width", &ResolvedValue::Number(0.0)), "0");
        assert_eq!(property_value("opacity", &ResolvedValue::Number(0.5)), "0.5");
        assert_eq!(property_value("z-index", &ResolvedValue::Number(1100.0)), "1100");
        assert_eq!(property_value("--ratio", &ResolvedValue::Number(1.5)), "1.5");
    }

    #[test]
    fn test_selector_combination() {
        assert_eq!(combine_selectors(".a", "&:hover"), ".a:hover");
        assert_eq!(combine_selectors(".a", "span"), ".a span");
        assert_eq!(combine_selectors(".a", "&:hover, &:focus"), ".a:hover, .a:focus");
        assert_eq!(combine_selectors(".a, .b", "& > i"), ".a > i, .b > i");
        assert_eq!(combine_selectors(".a", ":not(&, .x) &"), ":not(.a, .x) .a");
    }

    #[test]
    fn test_pretty_output() {
        let sheet = compile(
            RuleMap::new().rule(
                "root",
                Declaration::new()
                    .set("display", "flex")
                    .set("paddingLeft", 16)
                    .nest("&:hover", Declaration::new().set("opacity", 0.8)),
            ),
        );

        assert_eq!(
            sheet.to_css(&CssOptions::default()),
            ".SonnatTest-root-1 {\n  display: flex;\n  padding-left: 16px;\n}\n\
             .SonnatTest-root-1:hover {\n  opacity: 0.8;\n}"
        );
    }

    #[test]
    fn test_minified_media_and_globals() {
        let sheet = compile(
            RuleMap::new()
                .rule(
                    "root",
                    Declaration::new().set("margin", 0).media(
                        "@media (min-width:600px)",
                        Declaration::new()
                            .set("margin", 8)
                            .nest("& $label", Declaration::new().set("display", "none")),
                    ),
                )
                .rule("label", Declaration::new().set("fontWeight", 500))
                .global("body", Declaration::new().set("margin", 0)),
        );

        assert_eq!(
            sheet.to_css(&CssOptions::minified()),
            "body{margin:0}\
             .SonnatTest-root-1{margin:0}\
             @media (min-width:600px){.SonnatTest-root-1{margin:8px}.SonnatTest-root-1 .SonnatTest-label-2{display:none}}\
             .SonnatTest-label-2{font-weight:500}"
        );
    }

    #[test]
    fn test_shared_rules_are_written_once() {
        let sheet = compile(RuleMap::new().rule("root", Declaration::new().set("color", "red")));

        assert_eq!(
            serialize_sheets([sheet.as_ref(), sheet.as_ref()], &CssOptions::minified()),
            ".SonnatTest-root-1{color:red}"
        );
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        let sheet = compile(
            RuleMap::new().rule(
                "root",
                Declaration::new().media("@media print", Declaration::new()),
            ),
        );

        assert_eq!(sheet.to_css(&CssOptions::minified()), "");
    }
}
