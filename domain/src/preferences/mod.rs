//! User investment preferences
//!
//! Durable, user-scoped parameters (goals, sectors, risk tolerance) that
//! gate some tools and fill in arguments the current query left out.
//! The router only reads them; the conversation store owns them.

use crate::tool::entities::PreferenceRule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sectors the tool servers understand.
pub const AVAILABLE_SECTORS: &[&str] = &[
    "technology",
    "healthcare",
    "financial-services",
    "energy",
    "consumer",
    "consumer-discretionary",
    "consumer-staples",
    "utilities",
    "real-estate",
    "industrials",
    "materials",
    "communication-services",
];

/// Investment goals the tool servers understand.
pub const INVESTMENT_GOALS: &[&str] = &["growth", "income", "esg", "value", "defensive", "diversified"];

/// Risk tolerance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }
}

impl std::fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "conservative" => Ok(RiskTolerance::Low),
            "medium" | "moderate" => Ok(RiskTolerance::Medium),
            "high" | "aggressive" => Ok(RiskTolerance::High),
            other => Err(format!(
                "Invalid risk tolerance '{}'. Valid: low, medium, high",
                other
            )),
        }
    }
}

/// A single preference field, used to name what is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceField {
    Goals,
    Sectors,
    RiskTolerance,
}

impl PreferenceField {
    pub const ALL: [PreferenceField; 3] = [
        PreferenceField::Goals,
        PreferenceField::Sectors,
        PreferenceField::RiskTolerance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceField::Goals => "goals",
            PreferenceField::Sectors => "sectors",
            PreferenceField::RiskTolerance => "risk_tolerance",
        }
    }

    /// Follow-up question asking the user for this field.
    pub fn question(&self) -> &'static str {
        match self {
            PreferenceField::Goals => {
                "What are your investment goals? (growth, income, esg, value, defensive, diversified)"
            }
            PreferenceField::Sectors => {
                "Which sectors interest you? (technology, healthcare, financial-services, energy, etc.)"
            }
            PreferenceField::RiskTolerance => "What's your risk tolerance? (low/medium/high)",
        }
    }
}

impl std::fmt::Display for PreferenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PreferenceRule {
    /// Fields a tool with this rule needs.
    pub fn required_fields(&self) -> &'static [PreferenceField] {
        match self {
            PreferenceRule::GoalsAndSectors => &[PreferenceField::Goals, PreferenceField::Sectors],
            PreferenceRule::Complete => &PreferenceField::ALL,
        }
    }
}

/// User-scoped investment preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals = goals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sectors<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sectors = sectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_risk_tolerance(mut self, risk: RiskTolerance) -> Self {
        self.risk_tolerance = Some(risk);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty() && self.sectors.is_empty() && self.risk_tolerance.is_none()
    }

    /// All missing fields, in canonical order.
    pub fn missing_fields(&self) -> Vec<PreferenceField> {
        self.missing_among(&PreferenceField::ALL)
    }

    /// Missing fields restricted to `required`, in the order given.
    pub fn missing_among(&self, required: &[PreferenceField]) -> Vec<PreferenceField> {
        required
            .iter()
            .copied()
            .filter(|field| match field {
                PreferenceField::Goals => self.goals.is_empty(),
                PreferenceField::Sectors => self.sectors.is_empty(),
                PreferenceField::RiskTolerance => self.risk_tolerance.is_none(),
            })
            .collect()
    }

    /// Whether these preferences satisfy a tool's preference rule.
    pub fn satisfies(&self, rule: PreferenceRule) -> bool {
        match rule {
            PreferenceRule::GoalsAndSectors => !self.goals.is_empty() && !self.sectors.is_empty(),
            PreferenceRule::Complete => self.is_complete(),
        }
    }

    /// Validate against the allowed goal and sector vocabularies.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let invalid_goals: Vec<&str> = self
            .goals
            .iter()
            .map(|g| g.as_str())
            .filter(|g| !INVESTMENT_GOALS.contains(g))
            .collect();
        if !invalid_goals.is_empty() {
            errors.push(format!(
                "Invalid goals: {}. Valid: {}",
                invalid_goals.join(", "),
                INVESTMENT_GOALS.join(", ")
            ));
        }

        let invalid_sectors: Vec<&str> = self
            .sectors
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !AVAILABLE_SECTORS.contains(s))
            .collect();
        if !invalid_sectors.is_empty() {
            errors.push(format!(
                "Invalid sectors: {}. Valid: {}",
                invalid_sectors.join(", "),
                AVAILABLE_SECTORS.join(", ")
            ));
        }

        errors
    }

    /// Merge an update into these preferences.
    ///
    /// Goals and sectors are unioned (existing order first, duplicates
    /// dropped); a risk tolerance in the update replaces the current one.
    pub fn merge(&self, update: &Preferences) -> Preferences {
        fn union(current: &[String], extra: &[String]) -> Vec<String> {
            let mut out: Vec<String> = Vec::with_capacity(current.len() + extra.len());
            for item in current.iter().chain(extra) {
                if !out.contains(item) {
                    out.push(item.clone());
                }
            }
            out
        }

        Preferences {
            goals: union(&self.goals, &update.goals),
            sectors: union(&self.sectors, &update.sectors),
            risk_tolerance: update.risk_tolerance.or(self.risk_tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_preferences_miss_everything() {
        let prefs = Preferences::new();
        assert!(!prefs.is_complete());
        assert_eq!(
            prefs.missing_fields(),
            vec![
                PreferenceField::Goals,
                PreferenceField::Sectors,
                PreferenceField::RiskTolerance
            ]
        );
    }

    #[test]
    fn test_missing_among_respects_requested_fields() {
        let prefs = Preferences::new().with_goals(["growth"]);
        assert_eq!(
            prefs.missing_among(&[PreferenceField::Sectors, PreferenceField::RiskTolerance]),
            vec![PreferenceField::Sectors, PreferenceField::RiskTolerance]
        );
        assert!(prefs.missing_among(&[PreferenceField::Goals]).is_empty());
    }

    #[test]
    fn test_rules() {
        let partial = Preferences::new()
            .with_goals(["growth"])
            .with_sectors(["technology"]);
        assert!(partial.satisfies(PreferenceRule::GoalsAndSectors));
        assert!(!partial.satisfies(PreferenceRule::Complete));

        let complete = partial.with_risk_tolerance(RiskTolerance::High);
        assert!(complete.satisfies(PreferenceRule::Complete));
    }

    #[test]
    fn test_validate_reports_unknown_values() {
        let prefs = Preferences::new()
            .with_goals(["growth", "moonshots"])
            .with_sectors(["technology", "crypto"]);
        let errors = prefs.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("moonshots"));
        assert!(errors[1].contains("crypto"));
    }

    #[test]
    fn test_merge_unions_and_overrides_risk() {
        let current = Preferences::new()
            .with_goals(["growth"])
            .with_sectors(["energy"])
            .with_risk_tolerance(RiskTolerance::Low);
        let update = Preferences::new()
            .with_goals(["growth", "income"])
            .with_risk_tolerance(RiskTolerance::High);

        let merged = current.merge(&update);
        assert_eq!(merged.goals, vec!["growth", "income"]);
        assert_eq!(merged.sectors, vec!["energy"]);
        assert_eq!(merged.risk_tolerance, Some(RiskTolerance::High));
    }

    #[test]
    fn test_risk_tolerance_parse() {
        assert_eq!("Medium".parse::<RiskTolerance>(), Ok(RiskTolerance::Medium));
        assert_eq!("aggressive".parse::<RiskTolerance>(), Ok(RiskTolerance::High));
        assert!("yolo".parse::<RiskTolerance>().is_err());
    }
}
