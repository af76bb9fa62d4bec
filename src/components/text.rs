use sonnat_theme::Theme;

use crate::{
    StyleError,
    components::{escape_html, mixin},
    context::RenderContext,
    declaration::{Declaration, RuleMap},
    make_styles::{MakeStylesOptions, UseStyles, make_styles},
    theme::{ThemeExt, TypographyKind},
};

/// One rule per typography variant plus color, alignment and wrapping modifiers.
pub fn text_styles(theme: &Theme) -> Result<RuleMap, StyleError> {
    let colors = theme.colors();
    let direction = theme.direction();

    let mut rules = RuleMap::new().rule(
        "root",
        Declaration::new()
            .set("margin", 0)
            .set("fontFamily", theme.typography().font_family.as_str())
            .set("color", colors.text.primary.as_str()),
    );

    for kind in TypographyKind::ALL {
        let variant = theme.text_variant(kind);
        let mut declaration = Declaration::new()
            .set("fontSize", theme.font_size_rem(kind))
            .set("lineHeight", variant.line_height)
            .set("fontWeight", variant.font_weight);

        // Display sizes shrink on narrow viewports.
        if matches!(kind, TypographyKind::H1 | TypographyKind::H2 | TypographyKind::H3) {
            declaration = declaration.media(
                theme.breakpoints().down("sm")?,
                Declaration::new().set(
                    "fontSize",
                    theme.typography().px_to_rem(variant.font_size * 0.625),
                ),
            );
        }

        rules = rules.rule(kind.name(), declaration);
    }

    Ok(rules
        .rule(
            "secondary",
            Declaration::new().set("color", colors.text.secondary.as_str()),
        )
        .rule("hint", Declaration::new().set("color", colors.text.hint.as_str()))
        .rule(
            "disabled",
            Declaration::new().set("color", colors.text.disabled.as_str()),
        )
        .rule("start", Declaration::new().set("textAlign", direction.start()))
        .rule("center", Declaration::new().set("textAlign", "center"))
        .rule("end", Declaration::new().set("textAlign", direction.end()))
        .rule("noWrap", Declaration::new().mixin(mixin(theme, "truncateText")?)))
}

pub fn use_text_styles() -> Result<UseStyles, StyleError> {
    make_styles(text_styles, MakeStylesOptions::new("Text"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextColor {
    #[default]
    Primary,
    Secondary,
    Hint,
    Disabled,
}

impl TextColor {
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::Primary => None,
            Self::Secondary => Some("secondary"),
            Self::Hint => Some("hint"),
            Self::Disabled => Some("disabled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Inherit,
    Start,
    Center,
    End,
}

impl TextAlign {
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::Inherit => None,
            Self::Start => Some("start"),
            Self::Center => Some("center"),
            Self::End => Some("end"),
        }
    }
}

/// Renders a text element using the built-in text styles.
#[derive(Debug, Clone)]
pub struct Text {
    content: String,
    variant: TypographyKind,
    color: TextColor,
    align: TextAlign,
    no_wrap: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            variant: TypographyKind::Body,
            color: TextColor::default(),
            align: TextAlign::default(),
            no_wrap: false,
        }
    }

    pub fn variant(mut self, variant: TypographyKind) -> Self {
        self.variant = variant;
        self
    }

    pub fn color(mut self, color: TextColor) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn no_wrap(mut self, no_wrap: bool) -> Self {
        self.no_wrap = no_wrap;
        self
    }

    fn tag(&self) -> &'static str {
        match self.variant {
            TypographyKind::H1 => "h1",
            TypographyKind::H2 => "h2",
            TypographyKind::H3 => "h3",
            TypographyKind::H4 => "h4",
            TypographyKind::H5 => "h5",
            TypographyKind::H6 => "h6",
            TypographyKind::Subtitle => "h6",
            TypographyKind::Body | TypographyKind::BodySmall => "p",
            TypographyKind::Caption | TypographyKind::CaptionSmall => "span",
        }
    }

    pub fn render(&self, cx: &mut RenderContext<'_>) -> Result<String, StyleError> {
        let classes = use_text_styles()?.classes(cx)?;

        let mut class_names = vec![classes.get("root")?, classes.get(self.variant.name())?];
        for rule in [self.color.rule(), self.align.rule()].into_iter().flatten() {
            class_names.push(classes.get(rule)?);
        }
        if self.no_wrap {
            class_names.push(classes.get("noWrap")?);
        }

        let tag = self.tag();
        Ok(format!(
            "<{tag} class=\"{}\">{}</{tag}>",
            class_names.join(" "),
            escape_html(&self.content)
        ))
    }
}
