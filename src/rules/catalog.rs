use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Reward, Rule, RuleDef};

/// Errors that can occur during catalog loading.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Rule catalog file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// Load the rule catalog from a YAML file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Rule>, CatalogError> {
    let content = fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse and validate a YAML catalog.
///
/// Rules of an unknown type are dropped; they never earn points.
pub fn parse_catalog(content: &str) -> Result<Vec<Rule>, CatalogError> {
    let catalog: Catalog = serde_yaml::from_str(content)?;

    validate_catalog(&catalog)?;

    let mut rules = Vec::with_capacity(catalog.rules.len());
    for def in catalog.rules {
        let id = def.id.clone();
        let rule_type = def.rule_type.clone();

        match def.into_rule() {
            Some(rule) => {
                warn_if_inert(&rule);
                rules.push(rule);
            }
            None => debug!(rule_id = %id, rule_type = %rule_type, "Skipping rule of unknown type"),
        }
    }

    Ok(rules)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut seen_ids = HashSet::new();
    for rule in &catalog.rules {
        if rule.id.trim().is_empty() {
            return Err(CatalogError::Validation(format!(
                "Rule id cannot be empty (name: {})",
                rule.name
            )));
        }

        if !seen_ids.insert(&rule.id) {
            return Err(CatalogError::Validation(format!(
                "Duplicate rule ID: {}",
                rule.id
            )));
        }
    }

    Ok(())
}

fn warn_if_inert(rule: &Rule) {
    if let Reward::Ratio { unit, .. } = &rule.reward {
        if !matches!(unit, Some(u) if *u > Decimal::ZERO) {
            warn!(rule_id = %rule.id, "Ratio rule has no positive ratio_unit and will never apply");
        }
    }
}
