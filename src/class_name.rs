use serde::Deserialize;

use crate::{ConfigurationError, StyleError};

pub const DEFAULT_PREFIX: &str = "Sonnat";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Prepended to every class name. Use distinct prefixes when several
    /// independently rendered trees share one document.
    pub prefix: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Hands out `{prefix}{component}-{rule}-{sequence}` class names.
///
/// The sequence is owned by the instance: two generators fed the same calls in
/// the same order produce the same names, which is what lets a client pass
/// reproduce a server pass. Create one per server request and one per client
/// session.
#[derive(Debug, Clone)]
pub struct ClassNameGenerator {
    prefix: String,
    sequence: u64,
    sheets: u64,
}

impl Default for ClassNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassNameGenerator {
    pub fn new() -> Self {
        Self::with_options(GeneratorOptions::default())
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self {
            prefix: sanitize(&options.prefix),
            sequence: 0,
            sheets: 0,
        }
    }

    pub fn next_name(&mut self, component: &str, rule: &str) -> Result<String, StyleError> {
        if component.trim().is_empty() {
            return Err(ConfigurationError::EmptyIdentifier("component identity").into());
        }

        if rule.trim().is_empty() {
            return Err(ConfigurationError::EmptyIdentifier("rule name").into());
        }

        self.sequence += 1;

        Ok(format!(
            "{}{}-{}-{}",
            self.prefix,
            sanitize(component),
            sanitize(rule),
            self.sequence
        ))
    }

    /// Number of class names handed out so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of sheets compiled so far.
    pub fn sheets(&self) -> u64 {
        self.sheets
    }

    /// Marks the start of a new sheet and returns its generation epoch.
    pub(crate) fn begin_sheet(&mut self) -> u64 {
        let epoch = self.sheets;
        self.sheets += 1;
        epoch
    }
}

/// Keeps names valid CSS identifiers.
fn sanitize(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_format() {
        let mut generator = ClassNameGenerator::new();

        assert_eq!(
            generator.next_name("Button", "root").unwrap(),
            "SonnatButton-root-1"
        );
        assert_eq!(
            generator.next_name("Button", "label").unwrap(),
            "SonnatButton-label-2"
        );
        assert_eq!(generator.sequence(), 2);
    }

    #[test]
    fn test_independent_instances_agree() {
        let calls = [("Button", "root"), ("Chip", "root"), ("Button", "icon")];
        let mut server = ClassNameGenerator::new();
        let mut client = ClassNameGenerator::new();

        for (component, rule) in calls {
            assert_eq!(
                server.next_name(component, rule).unwrap(),
                client.next_name(component, rule).unwrap()
            );
        }
    }

    #[test]
    fn test_instances_do_not_share_a_counter() {
        let mut first = ClassNameGenerator::new();
        first.next_name("Button", "root").unwrap();
        first.next_name("Button", "root").unwrap();

        let mut second = ClassNameGenerator::new();
        assert_eq!(
            second.next_name("Button", "root").unwrap(),
            "SonnatButton-root-1"
        );
    }

    #[test]
    fn test_custom_prefix_and_sanitizing() {
        let mut generator = ClassNameGenerator::with_options(GeneratorOptions {
            prefix: "app.".to_string(),
        });

        assert_eq!(
            generator.next_name("Text Field", "input:focus").unwrap(),
            "app-Text-Field-input-focus-1"
        );
    }

    #[test]
    fn test_empty_identifiers_are_rejected() {
        let mut generator = ClassNameGenerator::new();

        assert!(matches!(
            generator.next_name("", "root"),
            Err(StyleError::Configuration(ConfigurationError::EmptyIdentifier(_)))
        ));
        assert!(matches!(
            generator.next_name("Button", "  "),
            Err(StyleError::Configuration(ConfigurationError::EmptyIdentifier(_)))
        ));
        assert_eq!(generator.sequence(), 0);
    }

    #[test]
    fn test_sheet_epochs() {
        let mut generator = ClassNameGenerator::new();
        assert_eq!(generator.begin_sheet(), 0);
        assert_eq!(generator.begin_sheet(), 1);
        assert_eq!(generator.sheets(), 2);
    }
}
