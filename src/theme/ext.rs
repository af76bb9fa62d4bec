use sonnat_theme::{ColorRole, Theme, TypographyVariant};

use crate::{
    context::RenderContext,
    theme::{ColorRoleKind, TypographyKind},
};

/// Extension trait for reading theme tokens.
pub trait ThemeExt {
    /// Gets an immutable reference to the theme.
    fn get_theme(&self) -> &Theme;

    fn color_role(&self, kind: ColorRoleKind) -> ColorRole {
        kind.resolve(self.get_theme())
    }

    fn text_variant(&self, kind: TypographyKind) -> &TypographyVariant {
        kind.resolve(self.get_theme())
    }

    /// A typography variant's font size in `rem`.
    fn font_size_rem(&self, kind: TypographyKind) -> String {
        let theme = self.get_theme();
        theme.typography().px_to_rem(kind.resolve(theme).font_size)
    }
}

impl ThemeExt for Theme {
    fn get_theme(&self) -> &Theme {
        self
    }
}

impl ThemeExt for RenderContext<'_> {
    fn get_theme(&self) -> &Theme {
        self.theme()
    }
}

#[cfg(test)]
mod tests {
    use sonnat_theme::{ThemeOverrides, create_theme};

    use super::*;
    use crate::{SonnatInitializer, ServerStyleSheets};

    #[test]
    fn test_theme_ext_on_theme() {
        let theme = Theme::default_theme();

        assert_eq!(theme.font_size_rem(TypographyKind::Body), "1rem");
        assert_eq!(theme.color_role(ColorRoleKind::Error).origin, "#f44336");
    }

    #[test]
    fn test_theme_ext_follows_the_active_provider() -> anyhow::Result<()> {
        let theme = create_theme(&ThemeOverrides::new().set("colors.primary.origin", "#000000"))?;

        let origin = ServerStyleSheets::new().collect(|cx| {
            SonnatInitializer::new(theme).render(cx, |cx| {
                Ok(cx.color_role(ColorRoleKind::Primary).origin)
            })
        })?;

        assert_eq!(origin, "#000000");
        Ok(())
    }
}
