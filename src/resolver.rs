//! Flattens `extend` inheritance and `$rule` references into self-contained
//! declaration blocks.
//!
//! Resolution runs in three passes:
//! 1. every rule gets its class name up front, so forward references work;
//! 2. `extend` chains are flattened, the extending rule's own keys winning;
//! 3. every `$rule` token in selectors and values is replaced.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    ClassNameGenerator, ResolutionError, StyleError,
    declaration::{Block, Declaration, GlobalRule, RuleMap, Template, Value},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Number(f64),
    Text(String),
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGlobalRule {
    pub selector: String,
    pub declaration: ResolvedDeclaration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBlock {
    Selector {
        selector: String,
        declaration: ResolvedDeclaration,
    },
    Media {
        query: String,
        declaration: ResolvedDeclaration,
    },
    Global(Vec<ResolvedGlobalRule>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedDeclaration {
    pub properties: IndexMap<String, ResolvedValue>,
    pub blocks: Vec<ResolvedBlock>,
}

impl ResolvedDeclaration {
    pub fn property(&self, name: &str) -> Option<&ResolvedValue> {
        self.properties.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub name: String,
    pub class_name: String,
    pub declaration: ResolvedDeclaration,
}

/// The output of [`resolve`], in the rule map's original order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRuleMap {
    rules: IndexMap<String, ResolvedRule>,
    globals: Vec<ResolvedGlobalRule>,
}

impl ResolvedRuleMap {
    pub fn get(&self, rule: &str) -> Option<&ResolvedDeclaration> {
        self.rules.get(rule).map(|rule| &rule.declaration)
    }

    pub fn class_name(&self, rule: &str) -> Option<&str> {
        self.rules.get(rule).map(|rule| rule.class_name.as_str())
    }

    pub fn rules(&self) -> impl Iterator<Item = &ResolvedRule> {
        self.rules.values()
    }

    pub fn globals(&self) -> &[ResolvedGlobalRule] {
        &self.globals
    }

    pub(crate) fn into_parts(self) -> (Vec<ResolvedRule>, Vec<ResolvedGlobalRule>) {
        (self.rules.into_values().collect(), self.globals)
    }
}

/// Resolves `rule_map` for `component`, naming rules through `generator`.
pub fn resolve(
    component: &str,
    rule_map: &RuleMap,
    generator: &mut ClassNameGenerator,
) -> Result<ResolvedRuleMap, StyleError> {
    let mut names = IndexMap::with_capacity(rule_map.len());
    for name in rule_map.rules().keys() {
        names.insert(name.clone(), generator.next_name(component, name)?);
    }

    let mut flattened = HashMap::with_capacity(rule_map.len());
    for name in rule_map.rules().keys() {
        flatten(name, rule_map, &mut flattened, &mut Vec::new())?;
    }

    let substitution = Substitution { names: &names };

    let mut rules = IndexMap::with_capacity(rule_map.len());
    for (name, class_name) in &names {
        let declaration = flattened
            .get(name)
            .map(|declaration| substitution.declaration(name, declaration))
            .transpose()?
            .unwrap_or_default();

        rules.insert(
            name.clone(),
            ResolvedRule {
                name: name.clone(),
                class_name: class_name.clone(),
                declaration,
            },
        );
    }

    let globals = substitution.globals("@global", rule_map.globals())?;

    tracing::trace!(component, rules = rules.len(), "resolved rule map");

    Ok(ResolvedRuleMap { rules, globals })
}

fn flatten(
    name: &str,
    rule_map: &RuleMap,
    flattened: &mut HashMap<String, Declaration>,
    chain: &mut Vec<String>,
) -> Result<Declaration, ResolutionError> {
    if let Some(done) = flattened.get(name) {
        return Ok(done.clone());
    }

    if let Some(start) = chain.iter().position(|visited| visited == name) {
        let mut cycle = chain[start..].to_vec();
        cycle.push(name.to_string());
        return Err(ResolutionError::CircularExtend { chain: cycle });
    }

    let Some(rule) = rule_map.rules().get(name) else {
        return Ok(Declaration::new());
    };

    chain.push(name.to_string());

    let mut base = Declaration::new();
    for target in rule.extends() {
        if !rule_map.rules().contains_key(target) {
            return Err(ResolutionError::UnknownExtendTarget {
                rule: name.to_string(),
                target: target.clone(),
            });
        }

        let inherited = flatten(target, rule_map, flattened, chain)?;
        base = inherited.layered_over(&base);
    }

    chain.pop();

    let declaration = rule.declaration().layered_over(&base);
    flattened.insert(name.to_string(), declaration.clone());

    Ok(declaration)
}

struct Substitution<'a> {
    names: &'a IndexMap<String, String>,
}

impl Substitution<'_> {
    /// In selectors a reference stands for the rule's class selector.
    fn selector(&self, owner: &str, selector: &Template) -> Result<String, ResolutionError> {
        selector
            .render(|rule| self.names.get(rule).map(|class_name| format!(".{class_name}")))
            .map_err(|reference| unresolved(owner, reference))
    }

    /// In values a reference stands for the bare class name.
    fn value(&self, owner: &str, value: &Value) -> Result<ResolvedValue, ResolutionError> {
        match value {
            Value::Number(number) => Ok(ResolvedValue::Number(*number)),
            Value::Text(template) => template
                .render(|rule| self.names.get(rule).cloned())
                .map(ResolvedValue::Text)
                .map_err(|reference| unresolved(owner, reference)),
        }
    }

    fn declaration(
        &self,
        owner: &str,
        declaration: &Declaration,
    ) -> Result<ResolvedDeclaration, ResolutionError> {
        let properties = declaration
            .properties()
            .iter()
            .map(|(property, value)| Ok((property.clone(), self.value(owner, value)?)))
            .collect::<Result<_, ResolutionError>>()?;

        let blocks = declaration
            .blocks()
            .iter()
            .map(|block| {
                Ok(match block {
                    Block::Selector {
                        selector,
                        declaration,
                    } => ResolvedBlock::Selector {
                        selector: self.selector(owner, selector)?,
                        declaration: self.declaration(owner, declaration)?,
                    },
                    Block::Media { query, declaration } => ResolvedBlock::Media {
                        query: query.clone(),
                        declaration: self.declaration(owner, declaration)?,
                    },
                    Block::Global(rules) => ResolvedBlock::Global(self.globals(owner, rules)?),
                })
            })
            .collect::<Result<_, ResolutionError>>()?;

        Ok(ResolvedDeclaration { properties, blocks })
    }

    fn globals(
        &self,
        owner: &str,
        rules: &[GlobalRule],
    ) -> Result<Vec<ResolvedGlobalRule>, ResolutionError> {
        rules
            .iter()
            .map(|rule| {
                Ok(ResolvedGlobalRule {
                    selector: self.selector(owner, &rule.selector)?,
                    declaration: self.declaration(owner, &rule.declaration)?,
                })
            })
            .collect()
    }
}

fn unresolved(owner: &str, reference: String) -> ResolutionError {
    ResolutionError::UnresolvedReference {
        rule: owner.to_string(),
        reference,
    }
}
