//! Style specifications of the built-in components, with minimal markup
//! renderers so whole trees can be rendered on the server and replayed on the
//! client.

use sonnat_theme::{MixinDeclaration, Theme};

use crate::{ConfigurationError, StyleError};

mod baseline;
pub use baseline::*;

mod button;
pub use button::*;

mod text;
pub use text::*;

/// Evaluates a theme mixin, failing when the theme doesn't define it.
pub(crate) fn mixin(theme: &Theme, name: &str) -> Result<MixinDeclaration, StyleError> {
    theme
        .mixin(name)
        .ok_or_else(|| ConfigurationError::UnknownMixin(name.to_string()).into())
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
