use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Persisted name of the fixed-point rule type.
pub const FIXED_POINT: &str = "FIXED_POINT";
/// Persisted name of the percentage rule type.
pub const PERCENTAGE: &str = "PERCENTAGE";
/// Persisted name of the ratio rule type.
pub const RATIO: &str = "RATIO";

/// Activation status of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(RuleStatus::Active),
            "INACTIVE" => Some(RuleStatus::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Active => "ACTIVE",
            RuleStatus::Inactive => "INACTIVE",
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        *self == RuleStatus::Active
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Eligibility conditions of a rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Inclusive floor on the purchased amount
    #[serde(default)]
    pub min_amount: Decimal,

    /// Branch restriction; `None` or empty means any branch
    #[serde(default)]
    pub branch_id: Option<String>,

    /// Category restriction; empty means any category
    #[serde(default)]
    pub category_ids: SmallVec<[String; 4]>,
}

impl Conditions {
    /// Branch restriction, if one is set.
    pub fn branch(&self) -> Option<&str> {
        self.branch_id.as_deref().filter(|b| !b.is_empty())
    }
}

/// How a matched purchase turns into points.
#[derive(Debug, Clone, PartialEq)]
pub enum Reward {
    /// Flat number of points per matched purchase.
    FixedPoint { value: i64 },
    /// `rate` percent of the amount, truncated.
    Percentage { rate: i64 },
    /// `value` points per whole `unit` of amount.
    Ratio { value: i64, unit: Option<Decimal> },
}

impl Reward {
    pub fn type_name(&self) -> &'static str {
        match self {
            Reward::FixedPoint { .. } => FIXED_POINT,
            Reward::Percentage { .. } => PERCENTAGE,
            Reward::Ratio { .. } => RATIO,
        }
    }

    /// Build from the persisted (type, value, unit) triple.
    ///
    /// Returns `None` for rule types this engine does not know.
    pub fn from_parts(rule_type: &str, value: i64, ratio_unit: Option<Decimal>) -> Option<Self> {
        match rule_type {
            FIXED_POINT => Some(Reward::FixedPoint { value }),
            PERCENTAGE => Some(Reward::Percentage { rate: value }),
            RATIO => Some(Reward::Ratio {
                value,
                unit: ratio_unit,
            }),
            _ => None,
        }
    }
}

/// A reward policy, read-only within the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub status: RuleStatus,
    pub conditions: Conditions,
    pub reward: Reward,
}

/// Reward block of a stored rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardDef {
    pub value: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_unit: Option<Decimal>,
}

/// Stored form of a rule, with the type kept as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub id: String,
    pub name: String,
    pub rule_type: String,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub conditions: Conditions,
    pub reward: RewardDef,
}

impl RuleDef {
    /// Convert into an engine rule; unknown rule types yield `None`.
    pub fn into_rule(self) -> Option<Rule> {
        let reward = Reward::from_parts(
            &self.rule_type,
            self.reward.value,
            self.reward.ratio_unit,
        )?;

        Some(Rule {
            id: self.id,
            name: self.name,
            status: self.status,
            conditions: self.conditions,
            reward,
        })
    }
}
