#![allow(missing_docs)] // Derive macros generate undocumented methods.

use enum_assoc::Assoc;
use sonnat_macros::IntoThemeField;
use sonnat_theme::{ColorRole, Theme};

/// Color roles that resolve against a theme's derived palette.
#[derive(Assoc, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[func(pub fn resolve(&self, theme: &Theme) -> ColorRole)]
#[func(pub fn name(&self) -> &'static str)]
pub enum ColorRoleKind {
    #[assoc(resolve = theme.colors().primary.clone())]
    #[assoc(name = "primary")]
    Primary,
    #[assoc(resolve = theme.colors().secondary.clone())]
    #[assoc(name = "secondary")]
    Secondary,
    #[assoc(resolve = theme.colors().error.clone())]
    #[assoc(name = "error")]
    Error,
    #[assoc(resolve = theme.colors().warning.clone())]
    #[assoc(name = "warning")]
    Warning,
    #[assoc(resolve = theme.colors().info.clone())]
    #[assoc(name = "info")]
    Info,
    #[assoc(resolve = theme.colors().success.clone())]
    #[assoc(name = "success")]
    Success,
}

impl ColorRoleKind {
    pub const ALL: [ColorRoleKind; 6] = [
        Self::Primary,
        Self::Secondary,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Success,
    ];
}

/// Typography variants. `resolve()` borrows the variant from the theme.
#[derive(IntoThemeField, Assoc, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[field(sonnat_theme::TypographyVariant)]
#[func(pub fn name(&self) -> &'static str)]
pub enum TypographyKind {
    #[theme(typography().variants.h1)]
    #[assoc(name = "h1")]
    H1,
    #[theme(typography().variants.h2)]
    #[assoc(name = "h2")]
    H2,
    #[theme(typography().variants.h3)]
    #[assoc(name = "h3")]
    H3,
    #[theme(typography().variants.h4)]
    #[assoc(name = "h4")]
    H4,
    #[theme(typography().variants.h5)]
    #[assoc(name = "h5")]
    H5,
    #[theme(typography().variants.h6)]
    #[assoc(name = "h6")]
    H6,
    #[theme(typography().variants.subtitle)]
    #[assoc(name = "subtitle")]
    Subtitle,
    #[theme(typography().variants.body)]
    #[assoc(name = "body")]
    Body,
    #[theme(typography().variants.body_small)]
    #[assoc(name = "bodySmall")]
    BodySmall,
    #[theme(typography().variants.caption)]
    #[assoc(name = "caption")]
    Caption,
    #[theme(typography().variants.caption_small)]
    #[assoc(name = "captionSmall")]
    CaptionSmall,
}

impl TypographyKind {
    pub const ALL: [TypographyKind; 11] = [
        Self::H1,
        Self::H2,
        Self::H3,
        Self::H4,
        Self::H5,
        Self::H6,
        Self::Subtitle,
        Self::Body,
        Self::BodySmall,
        Self::Caption,
        Self::CaptionSmall,
    ];
}
