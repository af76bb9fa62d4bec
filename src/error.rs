use sonnat_theme::ThemeError;
use thiserror::Error;

/// Every failure the style engine can report.
///
/// All of them are programming errors in a style specification or in provider
/// usage. They propagate to the render boundary and are never retried.
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("a style collection is already active for this render pass")]
    NestedCollection,
}

impl From<ThemeError> for StyleError {
    fn from(error: ThemeError) -> Self {
        Self::Configuration(ConfigurationError::Theme(error))
    }
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error("{0} can't be empty")]
    EmptyIdentifier(&'static str),
    #[error("`SonnatInitializer` can't be nested inside another `SonnatInitializer`")]
    NestedInitializer,
    #[error("server-side rendering requires an active `ServerStyleSheets` collector")]
    MissingCollector,
    #[error("the theme defines no mixin named `{0}`")]
    UnknownMixin(String),
    #[error("invalid declaration at `{path}`: {reason}")]
    InvalidDeclaration { path: String, reason: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("rule `{rule}` extends `{target}`, which isn't defined in the same sheet")]
    UnknownExtendTarget { rule: String, target: String },
    #[error("rule `{rule}` references `${reference}`, which isn't defined in the same sheet")]
    UnresolvedReference { rule: String, reference: String },
    #[error("circular extend chain: {}", chain.join(" -> "))]
    CircularExtend { chain: Vec<String> },
    #[error("`{component}` has no rule named `{rule}`")]
    UnknownRule { component: String, rule: String },
}

impl StyleError {
    pub(crate) fn invalid_declaration(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidDeclaration {
            path: path.into(),
            reason: reason.into(),
        }
        .into()
    }
}
