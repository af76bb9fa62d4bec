use enum_assoc::Assoc;
use sonnat_theme::Theme;

use crate::{
    StyleError,
    components::{escape_html, mixin},
    context::RenderContext,
    declaration::{Declaration, Rule, RuleMap},
    make_styles::{MakeStylesOptions, UseStyles, make_styles},
    theme::{ThemeExt, TypographyKind},
};

pub fn button_styles(theme: &Theme) -> Result<RuleMap, StyleError> {
    let colors = theme.colors();
    let typography = theme.typography();
    let spacing = theme.spacing();
    let direction = theme.direction();
    let dark_mode = theme.is_dark_mode();

    let primary = &colors.primary;
    let hover_background = if dark_mode { &primary.light } else { &primary.dark };
    let disabled_background = if dark_mode {
        colors.create_color(&colors.white, 0.12)?
    } else {
        colors.create_color(&colors.black, 0.12)?
    };

    Ok(RuleMap::new()
        .rule(
            "root",
            Declaration::new()
                .mixin(mixin(theme, "disableUserSelect")?)
                .set("display", "inline-flex")
                .set("alignItems", "center")
                .set("justifyContent", "center")
                .set("position", "relative")
                .set("boxSizing", "border-box")
                .set("verticalAlign", "middle")
                .set("margin", 0)
                .set("border", 0)
                .set("outline", "none")
                .set("cursor", "pointer")
                .set("textDecoration", "none")
                .set("minHeight", 40)
                .set("padding", format!("0 {}", spacing.rem(2.0)))
                .set("borderRadius", theme.radius().md)
                .set("fontFamily", typography.font_family.as_str())
                .set("fontSize", theme.font_size_rem(TypographyKind::BodySmall))
                .set("fontWeight", typography.font_weight.medium)
                .set("transition", "background-color 240ms ease, color 240ms ease")
                .nest(
                    "&:focus-visible",
                    Declaration::new().set("outline", format!("2px solid {}", primary.origin)),
                )
                .nest(
                    "& $icon",
                    Declaration::new().set(format!("margin-{}", direction.end()), spacing.rem(1.0)),
                )
                .media(
                    theme.breakpoints().down("sm")?,
                    Declaration::new().set("minHeight", 44),
                ),
        )
        .rule(
            "label",
            Declaration::new()
                .set("display", "inherit")
                .set("alignItems", "inherit")
                .set("justifyContent", "inherit"),
        )
        .rule(
            "icon",
            Declaration::new()
                .set("display", "inline-flex")
                .set("flexShrink", 0)
                .set("fontSize", theme.typography().px_to_rem(18.0)),
        )
        .rule(
            "filled",
            Declaration::new()
                .set("backgroundColor", primary.origin.as_str())
                .set("color", primary.contrast.as_str())
                .nest(
                    "&:hover",
                    Declaration::new().set("backgroundColor", hover_background.as_str()),
                ),
        )
        .rule(
            "inlined",
            Declaration::new()
                .set("backgroundColor", colors.transparent.as_str())
                .set("color", primary.origin.as_str())
                .nest(
                    "&:hover",
                    Declaration::new()
                        .set("backgroundColor", colors.create_color(&primary.origin, 0.08)?),
                ),
        )
        .rule(
            "outlined",
            Rule::new(
                Declaration::new()
                    .set("border", format!("1px solid {}", primary.origin))
                    .nest(
                        "&:hover",
                        Declaration::new()
                            .set("backgroundColor", colors.create_color(&primary.origin, 0.12)?),
                    ),
            )
            .extend("inlined"),
        )
        .rule(
            "disabled",
            Declaration::new()
                .set("pointerEvents", "none")
                .set("cursor", "default")
                .set("color", colors.text.disabled.as_str())
                .nest(
                    "&$filled",
                    Declaration::new().set("backgroundColor", disabled_background),
                )
                .nest(
                    "&$outlined",
                    Declaration::new().set("borderColor", colors.divider.as_str()),
                ),
        )
        .rule(
            "small",
            Declaration::new()
                .set("minHeight", 32)
                .set("padding", format!("0 {}", spacing.rem(1.5)))
                .set("fontSize", theme.font_size_rem(TypographyKind::Caption)),
        )
        .rule(
            "large",
            Declaration::new()
                .set("minHeight", 48)
                .set("padding", format!("0 {}", spacing.rem(3.0)))
                .set("fontSize", theme.font_size_rem(TypographyKind::Body)),
        )
        .rule("fluid", Declaration::new().set("width", "100%")))
}

pub fn use_button_styles() -> Result<UseStyles, StyleError> {
    make_styles(button_styles, MakeStylesOptions::new("Button"))
}

#[derive(Assoc, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[func(pub fn rule(&self) -> &'static str)]
pub enum ButtonVariant {
    #[default]
    #[assoc(rule = "filled")]
    Filled,
    #[assoc(rule = "outlined")]
    Outlined,
    #[assoc(rule = "inlined")]
    Inlined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ButtonSize {
    /// Medium is the root rule's own sizing and has no modifier.
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::Small => Some("small"),
            Self::Medium => None,
            Self::Large => Some("large"),
        }
    }
}

/// Renders a `<button>` using the built-in button styles.
#[derive(Debug, Clone, Default)]
pub struct Button {
    label: String,
    icon: Option<String>,
    variant: ButtonVariant,
    size: ButtonSize,
    disabled: bool,
    fluid: bool,
    class_name: Option<String>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Markup placed in the icon slot, inserted as is.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn fluid(mut self, fluid: bool) -> Self {
        self.fluid = fluid;
        self
    }

    /// Extra class names appended to the root.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn render(&self, cx: &mut RenderContext<'_>) -> Result<String, StyleError> {
        let classes = use_button_styles()?
            .classes(cx)?
            .with_overrides(self.class_name.as_deref().map(|extra| ("root", extra)))?;

        let mut root = vec![classes.get("root")?, classes.get(self.variant.rule())?];
        if let Some(size) = self.size.rule() {
            root.push(classes.get(size)?);
        }
        if self.fluid {
            root.push(classes.get("fluid")?);
        }
        if self.disabled {
            root.push(classes.get("disabled")?);
        }

        let icon = match &self.icon {
            Some(icon) => format!("<span class=\"{}\">{icon}</span>", classes.get("icon")?),
            None => String::new(),
        };

        Ok(format!(
            "<button class=\"{}\"{}><span class=\"{}\">{icon}{}</span></button>",
            root.join(" "),
            if self.disabled { " disabled" } else { "" },
            classes.get("label")?,
            escape_html(&self.label),
        ))
    }
}

#[cfg(test)]
mod tests {
    use sonnat_theme::{ThemeOverrides, create_theme};

    use super::*;
    use crate::{
        ServerStyleSheets, SonnatInitializer, css::CssOptions, registry::ServerSheetsOptions,
        resolver::ResolvedValue,
    };

    #[test]
    fn test_render_markup() -> anyhow::Result<()> {
        let html = ServerStyleSheets::new().collect(|cx| {
            Button::new("Save & close")
                .variant(ButtonVariant::Outlined)
                .size(ButtonSize::Small)
                .disabled(true)
                .class_name("toolbar-action")
                .render(cx)
        })?;

        assert_eq!(
            html,
            "<button class=\"SonnatButton-root-1 toolbar-action SonnatButton-outlined-6 \
             SonnatButton-small-8 SonnatButton-disabled-7\" disabled>\
             <span class=\"SonnatButton-label-2\">Save &amp; close</span></button>"
        );
        Ok(())
    }

    #[test]
    fn test_outlined_inherits_inlined() -> anyhow::Result<()> {
        let mut sheets = ServerStyleSheets::new();
        sheets.collect(|cx| Button::new("Ok").render(cx))?;

        let sheet = &sheets.registry().sheets()[0];
        let outlined = sheet
            .rules()
            .iter()
            .find(|rule| rule.name == "outlined")
            .map(|rule| &rule.declaration)
            .ok_or_else(|| anyhow::anyhow!("missing outlined rule"))?;

        assert_eq!(
            outlined.property("color"),
            Some(&ResolvedValue::from("#3f51b5"))
        );
        assert!(outlined.property("border").is_some());
        Ok(())
    }

    #[test]
    fn test_css_scopes_references_and_media() -> anyhow::Result<()> {
        let mut sheets = ServerStyleSheets::with_options(ServerSheetsOptions {
            css: CssOptions::minified(),
            ..Default::default()
        });
        sheets.collect(|cx| Button::new("Ok").render(cx))?;
        let css = sheets.to_string();

        assert!(css.contains(".SonnatButton-root-1 .SonnatButton-icon-3{margin-right:0.5rem}"));
        assert!(css.contains("@media (max-width:599px){.SonnatButton-root-1{min-height:44px}}"));
        assert!(css.contains(".SonnatButton-disabled-7.SonnatButton-filled-4{"));
        assert!(css.contains("-webkit-user-select:none"));
        Ok(())
    }

    #[test]
    fn test_rtl_flips_icon_spacing() -> anyhow::Result<()> {
        let rtl = create_theme(&ThemeOverrides::new().set("direction", "rtl"))?;
        let mut sheets = ServerStyleSheets::with_options(ServerSheetsOptions {
            css: CssOptions::minified(),
            ..Default::default()
        });
        sheets.collect(|cx| SonnatInitializer::new(rtl).render(cx, |cx| Button::new("Ok").render(cx)))?;

        assert!(sheets.to_string().contains(".SonnatButton-root-1 .SonnatButton-icon-3{margin-left:0.5rem}"));
        Ok(())
    }
}
