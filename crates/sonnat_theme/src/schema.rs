use std::sync::{
    LazyLock,
    atomic::{AtomicU64, Ordering},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    BackgroundColors, BreakpointOptions, Breakpoints, MixinDeclaration, Mixins, Rgba, Spacing,
    SpacingOptions, ThemeColors, ThemeError, ThemeOverrides, Typography, TypographyOptions,
    deep_merge, derive_role, derive_text_colors, deserializers::de_pixels,
    deserializers::de_tonal_offset,
};

const DEFAULT_THEME_DOCUMENT: &str = include_str!("../themes/default.json");

static NEXT_THEME_ID: AtomicU64 = AtomicU64::new(1);

static DEFAULT_THEME: LazyLock<Theme> = LazyLock::new(|| {
    create_theme(&ThemeOverrides::default()).expect("the built-in theme document is valid")
});

/// Identity of one constructed [`Theme`].
///
/// Every call to [`create_theme`] yields a fresh id, clones share it. Style caches
/// key on this instead of comparing token values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThemeId(u64);

impl ThemeId {
    fn next() -> Self {
        Self(NEXT_THEME_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// The physical side where inline content starts.
    pub fn start(self) -> &'static str {
        match self {
            Self::Ltr => "left",
            Self::Rtl => "right",
        }
    }

    /// The physical side where inline content ends.
    pub fn end(self) -> &'static str {
        match self {
            Self::Ltr => "right",
            Self::Rtl => "left",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonColors {
    pub white: String,
    pub black: String,
}

/// Raw color swatches, e.g. `palette.shade("blue", "500")`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Palette {
    pub common: CommonColors,
    pub swatches: IndexMap<String, IndexMap<String, String>>,
}

impl Palette {
    pub fn shade(&self, swatch: &str, shade: &str) -> Option<&str> {
        self.swatches.get(swatch)?.get(shade).map(String::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoleOptions {
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackgroundOptions {
    pub light: BackgroundColors,
    pub dark: BackgroundColors,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColorOptions {
    #[serde(deserialize_with = "de_tonal_offset")]
    pub tonal_offset: f64,
    pub primary: RoleOptions,
    pub secondary: RoleOptions,
    pub error: RoleOptions,
    pub warning: RoleOptions,
    pub info: RoleOptions,
    pub success: RoleOptions,
    pub background: BackgroundOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ZIndexes {
    pub header: i32,
    pub drawer: i32,
    pub popover: i32,
    pub modal: i32,
    pub tooltip: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Radius {
    #[serde(deserialize_with = "de_pixels")]
    pub sm: f64,
    #[serde(deserialize_with = "de_pixels")]
    pub md: f64,
    #[serde(deserialize_with = "de_pixels")]
    pub lg: f64,
    #[serde(deserialize_with = "de_pixels")]
    pub pill: f64,
}

/// The fully merged theme document, before any field is derived.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThemeOptions {
    pub direction: Direction,
    pub dark_mode: bool,
    pub palette: Palette,
    pub colors: ColorOptions,
    pub typography: TypographyOptions,
    pub breakpoints: BreakpointOptions,
    pub spacing: SpacingOptions,
    pub z_indexes: ZIndexes,
    pub radius: Radius,
}

/// Immutable design tokens. Built by [`create_theme`].
#[derive(Debug, Clone)]
pub struct Theme {
    id: ThemeId,
    options: ThemeOptions,
    colors: ThemeColors,
    typography: Typography,
    breakpoints: Breakpoints,
    spacing: Spacing,
    mixins: Mixins,
}

/// Deep-merges `overrides` onto the built-in defaults and derives every
/// computed field.
pub fn create_theme(overrides: &ThemeOverrides) -> Result<Theme, ThemeError> {
    let mut document: serde_json::Value = serde_json::from_str(DEFAULT_THEME_DOCUMENT)?;
    deep_merge(&mut document, overrides.document());

    let options: ThemeOptions = serde_json::from_value(document)?;
    let mut theme = Theme::from_options(options)?;
    theme.mixins.extend(overrides.mixins());

    tracing::debug!(
        theme = theme.id.0,
        direction = ?theme.options.direction,
        dark_mode = theme.options.dark_mode,
        "created theme"
    );

    Ok(theme)
}

impl Theme {
    /// The theme built from the defaults alone. Shared for the whole process.
    pub fn default_theme() -> &'static Theme {
        &DEFAULT_THEME
    }

    fn from_options(options: ThemeOptions) -> Result<Self, ThemeError> {
        let white = Rgba::parse(&options.palette.common.white)?;
        let black = Rgba::parse(&options.palette.common.black)?;
        let roles = &options.colors;
        let role = |role: &RoleOptions| {
            derive_role(
                &role.origin,
                role.light.as_deref(),
                role.dark.as_deref(),
                roles.tonal_offset,
                white,
                black,
            )
        };

        let background = if options.dark_mode {
            roles.background.dark.clone()
        } else {
            roles.background.light.clone()
        };

        for color in std::iter::once(&background.origin).chain(&background.accents) {
            Rgba::parse(color)?;
        }

        let divider = if options.dark_mode { white } else { black };

        let colors = ThemeColors {
            primary: role(&roles.primary)?,
            secondary: role(&roles.secondary)?,
            error: role(&roles.error)?,
            warning: role(&roles.warning)?,
            info: role(&roles.info)?,
            success: role(&roles.success)?,
            text: derive_text_colors(options.dark_mode, white, black),
            background,
            divider: divider.alpha(0.12).to_css(),
            white: white.to_css(),
            black: black.to_css(),
            transparent: "transparent".to_string(),
        };

        let typography = Typography::derive(&options.typography, options.direction)?;
        let breakpoints = Breakpoints::new(options.breakpoints.values.clone())?;
        let spacing = Spacing::new(options.spacing, typography.converter());

        Ok(Self {
            id: ThemeId::next(),
            options,
            colors,
            typography,
            breakpoints,
            spacing,
            mixins: Mixins::builtin(),
        })
    }

    /// The merged document this theme was derived from, as overrides.
    ///
    /// Feeding the result back into [`create_theme`] reproduces an equal theme.
    pub fn to_overrides(&self) -> Result<ThemeOverrides, ThemeError> {
        let mut overrides = ThemeOverrides::from_value(serde_json::to_value(&self.options)?)?;

        for (name, mixin) in self.mixins.entries() {
            overrides = overrides.mixin(name.clone(), *mixin);
        }

        Ok(overrides)
    }

    pub fn id(&self) -> ThemeId {
        self.id
    }

    pub fn options(&self) -> &ThemeOptions {
        &self.options
    }

    pub fn direction(&self) -> Direction {
        self.options.direction
    }

    pub fn is_dark_mode(&self) -> bool {
        self.options.dark_mode
    }

    pub fn palette(&self) -> &Palette {
        &self.options.palette
    }

    pub fn colors(&self) -> &ThemeColors {
        &self.colors
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn spacing(&self) -> &Spacing {
        &self.spacing
    }

    pub fn z_indexes(&self) -> &ZIndexes {
        &self.options.z_indexes
    }

    pub fn radius(&self) -> &Radius {
        &self.options.radius
    }

    pub fn mixins(&self) -> &Mixins {
        &self.mixins
    }

    /// Evaluates a named mixin against this theme.
    pub fn mixin(&self, name: &str) -> Option<MixinDeclaration> {
        self.mixins.get(name).map(|mixin| mixin(self))
    }
}

// Identity is deliberately left out: two themes are equal when every token is.
impl PartialEq for Theme {
    fn eq(&self, other: &Self) -> bool {
        self.options == other.options
            && self.colors == other.colors
            && self.typography == other.typography
            && self.breakpoints == other.breakpoints
            && self.spacing == other.spacing
            && self.mixins == other.mixins
    }
}

impl AsRef<Theme> for Theme {
    fn as_ref(&self) -> &Theme {
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn theme(overrides: serde_json::Value) -> Result<Theme, ThemeError> {
        create_theme(&ThemeOverrides::from_value(overrides)?)
    }

    #[test]
    fn test_default_theme_is_valid() {
        let theme = Theme::default_theme();

        assert_eq!(theme.direction(), Direction::Ltr);
        assert!(!theme.is_dark_mode());
        assert_eq!(theme.colors().primary.origin, "#3f51b5");
        assert_eq!(
            theme.breakpoints().keys().collect::<Vec<_>>(),
            ["xxs", "xs", "sm", "md", "lg", "xl"]
        );
        assert_eq!(theme.typography().px_to_rem(14.0), "0.875rem");
        assert_eq!(theme.spacing().rem(2.0), "1rem");
    }

    #[test]
    fn test_default_theme_is_shared() {
        assert_eq!(Theme::default_theme().id(), Theme::default_theme().id());
    }

    #[test]
    fn test_every_theme_gets_a_fresh_id() {
        let a = create_theme(&ThemeOverrides::default()).unwrap();
        let b = create_theme(&ThemeOverrides::default()).unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_overrides_merge_onto_defaults() {
        let theme = theme(json!({
            "colors": { "primary": { "origin": "#ff0000" } },
            "breakpoints": { "values": { "sm": 640 } }
        }))
        .unwrap();

        assert_eq!(theme.colors().primary.origin, "#ff0000");
        assert_eq!(theme.colors().secondary.origin, "#e91e63");
        assert_eq!(theme.breakpoints().value("sm").unwrap(), 640.0);
        assert_eq!(theme.breakpoints().value("md").unwrap(), 960.0);
    }

    #[test]
    fn test_array_overrides_replace() {
        let theme = theme(json!({
            "colors": { "background": { "light": { "accents": ["#eeeeee"] } } }
        }))
        .unwrap();

        assert_eq!(theme.colors().background.accents, ["#eeeeee"]);
        assert_eq!(theme.colors().background.origin, "#ffffff");
    }

    #[test]
    fn test_dark_mode_derivations() {
        let light = Theme::default_theme();
        let dark = theme(json!({ "darkMode": true })).unwrap();

        assert_eq!(light.colors().text.primary, "rgba(0, 0, 0, 0.87)");
        assert_eq!(dark.colors().text.primary, "#ffffff");
        assert_eq!(dark.colors().background.origin, "#121212");
        assert_eq!(dark.colors().divider, "rgba(255, 255, 255, 0.12)");
        assert_ne!(light, &dark);
    }

    #[test]
    fn test_rtl_switches_font_family() {
        let rtl = theme(json!({ "direction": "rtl" })).unwrap();

        assert!(rtl.direction().is_rtl());
        assert_eq!(rtl.typography().font_family, "Vazir, Tahoma, sans-serif");
        assert_eq!(
            Theme::default_theme().typography().font_family,
            "Roboto, Helvetica, Arial, sans-serif"
        );
    }

    #[test]
    fn test_contrast_color_of() {
        let colors = Theme::default_theme().colors();

        assert_eq!(colors.get_contrast_color_of("#ffffff").unwrap(), "#000000");
        assert_eq!(colors.get_contrast_color_of("#000000").unwrap(), "#ffffff");
        assert_eq!(colors.get_contrast_color_of("#ffeb3b").unwrap(), "#000000");
        assert!(colors.get_contrast_color_of("nope").is_err());
    }

    #[test]
    fn test_create_color_applies_alpha() {
        let colors = Theme::default_theme().colors();
        assert_eq!(
            colors.create_color("#3f51b5", 0.04).unwrap(),
            "rgba(63, 81, 181, 0.04)"
        );
    }

    #[test]
    fn test_rejects_invalid_breakpoints() {
        assert!(matches!(
            theme(json!({ "breakpoints": { "values": { "sm": -10 } } })),
            Err(ThemeError::InvalidBreakpoint { key, .. }) if key == "sm"
        ));

        assert!(matches!(
            theme(json!({ "breakpoints": { "values": { "sm": "wide" } } })),
            Err(ThemeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_removing_every_breakpoint() {
        let result = theme(json!({
            "breakpoints": { "values": {
                "xxs": null, "xs": null, "sm": null, "md": null, "lg": null, "xl": null
            } }
        }));

        assert!(matches!(result, Err(ThemeError::NoBreakpoints)));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            theme(json!({ "colours": {} })),
            Err(ThemeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_colors() {
        assert!(matches!(
            theme(json!({ "colors": { "primary": { "origin": "bluish" } } })),
            Err(ThemeError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_round_trip_through_overrides() {
        let original = theme(json!({
            "darkMode": true,
            "direction": "rtl",
            "typography": { "htmlFontSize": 14 },
            "breakpoints": { "values": { "sm": 600, "md": 900 } }
        }))
        .unwrap();

        let rebuilt = create_theme(&original.to_overrides().unwrap()).unwrap();

        assert_eq!(original, rebuilt);
        assert_ne!(original.id(), rebuilt.id());
        assert_eq!(rebuilt.typography().px_to_rem(14.0), "1rem");
    }

    #[test]
    fn test_custom_mixins() {
        fn elevated(theme: &Theme) -> MixinDeclaration {
            IndexMap::from([(
                "zIndex".to_string(),
                theme.z_indexes().popover.to_string(),
            )])
        }

        let theme = create_theme(&ThemeOverrides::new().mixin("elevated", elevated)).unwrap();

        assert_eq!(theme.mixin("elevated").unwrap()["zIndex"], "1300");
        assert_eq!(theme.mixin("truncateText").unwrap()["whiteSpace"], "nowrap");
        assert!(theme.mixin("missing").is_none());

        let rebuilt = create_theme(&theme.to_overrides().unwrap()).unwrap();
        assert!(rebuilt.mixin("elevated").is_some());
    }

    #[test]
    fn test_palette_shades() {
        let palette = Theme::default_theme().palette();
        assert_eq!(palette.shade("blue", "500"), Some("#2196f3"));
        assert_eq!(palette.shade("blue", "950"), None);
        assert_eq!(palette.shade("teal", "500"), None);
    }
}
