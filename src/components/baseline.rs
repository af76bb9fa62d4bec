use sonnat_theme::Theme;

use crate::{
    StyleError,
    declaration::{Declaration, RuleMap},
    make_styles::{MakeStylesOptions, UseStyles, make_styles},
    theme::{ThemeExt, TypographyKind},
};

/// Document-wide resets. Only global rules, so it generates no class names.
pub fn baseline_styles(theme: &Theme) -> Result<RuleMap, StyleError> {
    let colors = theme.colors();
    let typography = theme.typography();
    let body = theme.text_variant(TypographyKind::Body);

    Ok(RuleMap::new()
        .global(
            "html",
            Declaration::new()
                .set("boxSizing", "border-box")
                .set("fontSize", format!("{}px", typography.html_font_size))
                .set("WebkitFontSmoothing", "antialiased")
                .set("MozOsxFontSmoothing", "grayscale")
                .set("WebkitTextSizeAdjust", "100%")
                .set("direction", if theme.direction().is_rtl() { "rtl" } else { "ltr" }),
        )
        .global(
            "*, *::before, *::after",
            Declaration::new().set("boxSizing", "inherit"),
        )
        .global(
            "body",
            Declaration::new()
                .set("margin", 0)
                .set("backgroundColor", colors.background.origin.as_str())
                .set("color", colors.text.primary.as_str())
                .set("fontFamily", typography.font_family.as_str())
                .set("fontSize", theme.font_size_rem(TypographyKind::Body))
                .set("fontWeight", typography.font_weight.regular)
                .set("lineHeight", body.line_height),
        )
        .global(
            "strong, b",
            Declaration::new().set("fontWeight", typography.font_weight.bold),
        )
        .global(
            "::selection",
            Declaration::new().set(
                "backgroundColor",
                colors.create_color(&colors.primary.origin, 0.24)?,
            ),
        ))
}

pub fn use_baseline_styles() -> Result<UseStyles, StyleError> {
    make_styles(baseline_styles, MakeStylesOptions::new("Baseline"))
}

#[cfg(test)]
mod tests {
    use sonnat_theme::{ThemeOverrides, create_theme};

    use super::*;
    use crate::{
        ServerStyleSheets, css::CssOptions, declaration::Value, registry::ServerSheetsOptions,
    };

    #[test]
    fn test_baseline_is_global_only() -> anyhow::Result<()> {
        let use_styles = use_baseline_styles()?;
        let mut sheets = ServerStyleSheets::with_options(ServerSheetsOptions {
            css: CssOptions::minified(),
            ..Default::default()
        });

        let classes = sheets.collect(|cx| use_styles.classes(cx))?;
        let css = sheets.to_string();

        assert!(classes.is_empty());
        assert_eq!(sheets.generator().sequence(), 0);
        assert!(css.starts_with("html{box-sizing:border-box;font-size:16px;-webkit-font-smoothing:antialiased"));
        assert!(css.contains("*, *::before, *::after{box-sizing:inherit}"));
        assert!(css.contains("body{margin:0;background-color:#ffffff"));
        assert!(!css.contains(".Sonnat"));
        Ok(())
    }

    #[test]
    fn test_baseline_follows_dark_mode() -> anyhow::Result<()> {
        let dark = create_theme(&ThemeOverrides::new().set("darkMode", true))?;
        let rules = baseline_styles(&dark)?;

        let body = rules
            .globals()
            .iter()
            .find(|rule| rule.selector.to_string() == "body")
            .map(|rule| rule.declaration.clone());

        assert_eq!(
            body.and_then(|declaration| declaration.properties().get("backgroundColor").cloned()),
            Some(Value::from("#121212"))
        );
        Ok(())
    }
}
