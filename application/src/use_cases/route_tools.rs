//! Route Tools use case
//!
//! Turns an [`IntentClassification`] into an ordered list of validated
//! [`ToolCall`]s. Arguments come from, in priority order, entities in the
//! current query, stored preferences, then a per-tool default.

use finsense_domain::{
    Arguments, IntentClassification, Preferences, RouteError, ToolCall, ToolRegistry,
    ToolRegistryEntry,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Sectors whose default stock-recommendation goal is income
const INCOME_SECTORS: &[&str] = &["utilities", "consumer-staples", "real-estate"];

/// Sentinel sector asking the market server for every sector
const ALL_SECTORS: &str = "all";

const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

pub struct ToolRouter {
    registry: Arc<ToolRegistry>,
    default_timeframe: String,
}

impl ToolRouter {
    pub fn new(registry: Arc<ToolRegistry>, default_timeframe: impl Into<String>) -> Self {
        Self {
            registry,
            default_timeframe: default_timeframe.into(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Build validated tool calls for a classification.
    ///
    /// An intent with no mapped tools yields an empty list, not an error.
    /// The first failing tool aborts routing; no partial list is returned.
    pub fn route(
        &self,
        classification: &IntentClassification,
        preferences: Option<&Preferences>,
    ) -> Result<Vec<ToolCall>, RouteError> {
        let tool_names = classification.intent.tool_names();
        if tool_names.is_empty() {
            debug!("No tools mapped for intent {}", classification.intent);
            return Ok(Vec::new());
        }

        let mut calls = Vec::with_capacity(tool_names.len());
        for &tool_name in tool_names {
            let entry = self
                .registry
                .get(tool_name)
                .ok_or_else(|| RouteError::UnknownTool(tool_name.to_string()))?;

            if let Some(rule) = entry.preference_rule {
                let satisfied = preferences.is_some_and(|p| p.satisfies(rule));
                if !satisfied {
                    let missing = match preferences {
                        Some(p) => p.missing_among(rule.required_fields()),
                        None => rule.required_fields().to_vec(),
                    };
                    return Err(RouteError::MissingPreferences {
                        tool: tool_name.to_string(),
                        missing,
                    });
                }
            }

            let arguments = self.build_arguments(tool_name, classification, preferences);
            let call = ToolCall::new(tool_name, &entry.connection)
                .with_arguments(arguments)
                .with_requires_preferences(entry.requires_preferences());
            validate(entry, &call)?;
            calls.push(call);
        }

        debug!(
            "Routed {} to [{}]",
            classification.intent,
            tool_names.join(", ")
        );
        Ok(calls)
    }

    /// Check a call against its registry entry.
    pub fn validate(&self, call: &ToolCall) -> Result<(), RouteError> {
        let entry = self
            .registry
            .get(&call.tool_name)
            .ok_or_else(|| RouteError::UnknownTool(call.tool_name.clone()))?;
        validate(entry, call)
    }

    fn build_arguments(
        &self,
        tool_name: &str,
        classification: &IntentClassification,
        preferences: Option<&Preferences>,
    ) -> Arguments {
        let entities = &classification.entities;
        let timeframe = entities
            .timeframe
            .clone()
            .unwrap_or_else(|| self.default_timeframe.clone());

        let ticker = entities.tickers.first().cloned();
        let pref_sectors = preferences.map(|p| p.sectors.as_slice()).unwrap_or_default();
        let pref_goals = preferences.map(|p| p.goals.as_slice()).unwrap_or_default();
        let sector = entities
            .sectors
            .first()
            .or_else(|| pref_sectors.first())
            .cloned();

        let mut args = Arguments::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                args.insert(key.to_string(), value);
            }
        };

        match tool_name {
            "get_market_indices" => {}
            "get_sector_summary" => put("sector", sector.map(Value::from)),
            "get_stock_price" | "get_stock_details" => put("ticker", ticker.map(Value::from)),
            "get_stock_recommendations" => {
                let sector = sector.unwrap_or_else(|| ALL_SECTORS.to_string());
                let goal = entities
                    .goals
                    .first()
                    .or_else(|| pref_goals.first())
                    .cloned()
                    .unwrap_or_else(|| default_goal(&sector).to_string());
                put("sector", Some(Value::from(sector)));
                put("goal", Some(Value::from(goal)));
            }
            "fetch_headlines" | "extract_risk_themes" | "compute_sector_volatility" => {
                put("sector", sector.map(Value::from));
                put("timeframe", Some(Value::from(timeframe)));
            }
            "identify_sector_risks" => {
                put("sector_or_ticker", ticker.or(sector).map(Value::from));
            }
            "compare_sectors" => {
                let items: &[String] = if entities.comparison_items.is_empty() {
                    &entities.sectors
                } else {
                    &entities.comparison_items
                };
                put("sector1", items.first().cloned().map(Value::from));
                put("sector2", items.get(1).cloned().map(Value::from));
                put("timeframe", Some(Value::from(timeframe)));
            }
            "compute_sector_correlations" => {
                let sectors: &[String] = if entities.sectors.is_empty() {
                    pref_sectors
                } else {
                    &entities.sectors
                };
                put("sectors", Some(json!(sectors)));
                put("timeframe", Some(Value::from(timeframe)));
            }
            "calculate_var" => {
                put("portfolio", Some(json!({})));
                put("confidence_level", Some(json!(DEFAULT_CONFIDENCE_LEVEL)));
                put("timeframe", Some(Value::from(timeframe)));
            }
            "conduct_research" => {
                let sectors: &[String] = if entities.sectors.is_empty() {
                    pref_sectors
                } else {
                    &entities.sectors
                };
                let goals: &[String] = if entities.goals.is_empty() {
                    pref_goals
                } else {
                    &entities.goals
                };
                let risk = entities
                    .risk_tolerance
                    .or_else(|| preferences.and_then(|p| p.risk_tolerance));
                put("sectors", Some(json!(sectors)));
                put("risk_tolerance", risk.map(|r| Value::from(r.as_str())));
                put("investment_goals", Some(json!(goals)));
            }
            _ => {}
        }

        args
    }
}

fn default_goal(sector: &str) -> &'static str {
    if INCOME_SECTORS.contains(&sector) {
        "income"
    } else {
        "growth"
    }
}

/// Absent, null, empty string and empty array all count as missing.
/// An empty object is a value.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn validate(entry: &ToolRegistryEntry, call: &ToolCall) -> Result<(), RouteError> {
    for arg in &entry.required_args {
        if is_missing(call.arguments.get(arg)) {
            return Err(RouteError::InvalidArguments {
                tool: call.tool_name.clone(),
                argument: arg.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsense_domain::{ExtractedEntities, IntentKind, PreferenceField, RiskTolerance};

    fn router() -> ToolRouter {
        ToolRouter::new(Arc::new(ToolRegistry::finsense()), "1 month")
    }

    fn classify(intent: IntentKind, entities: ExtractedEntities) -> IntentClassification {
        IntentClassification::new(intent).with_entities(entities)
    }

    fn complete_prefs() -> Preferences {
        Preferences::new()
            .with_goals(["growth"])
            .with_sectors(["technology"])
            .with_risk_tolerance(RiskTolerance::Medium)
    }

    #[test]
    fn test_market_overview_yields_single_empty_call() {
        let calls = router()
            .route(&IntentClassification::new(IntentKind::MarketOverview), None)
            .unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "get_market_indices");
        assert_eq!(calls[0].connection, "market");
        assert!(calls[0].arguments.is_empty());
        assert!(!calls[0].requires_preferences);
    }

    #[test]
    fn test_unmapped_intent_is_empty_not_error() {
        for intent in [IntentKind::Greeting, IntentKind::GeneralInfo, IntentKind::OutOfScope] {
            let calls = router().route(&IntentClassification::new(intent), None).unwrap();
            assert!(calls.is_empty());
        }
    }

    #[test]
    fn test_full_research_without_preferences_fails() {
        let result = router().route(&IntentClassification::new(IntentKind::FullResearch), None);
        match result {
            Err(RouteError::MissingPreferences { tool, missing }) => {
                assert_eq!(tool, "conduct_research");
                assert_eq!(missing.len(), 3);
            }
            other => panic!("expected MissingPreferences, got {:?}", other),
        }
    }

    #[test]
    fn test_full_research_with_partial_preferences_names_missing() {
        let prefs = Preferences::new().with_goals(["growth"]);
        let err = router()
            .route(&IntentClassification::new(IntentKind::FullResearch), Some(&prefs))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::MissingPreferences {
                tool: "conduct_research".to_string(),
                missing: vec![PreferenceField::Sectors, PreferenceField::RiskTolerance],
            }
        );
    }

    #[test]
    fn test_full_research_with_complete_preferences() {
        let prefs = complete_prefs();
        let calls = router()
            .route(&IntentClassification::new(IntentKind::FullResearch), Some(&prefs))
            .unwrap();

        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert!(call.requires_preferences);
        assert_eq!(call.connection, "coordinator");
        assert_eq!(call.arguments["sectors"], json!(["technology"]));
        assert_eq!(call.arguments["risk_tolerance"], "medium");
        assert_eq!(call.arguments["investment_goals"], json!(["growth"]));
    }

    #[test]
    fn test_stock_details_without_ticker_names_argument() {
        let err = router()
            .route(&IntentClassification::new(IntentKind::StockDetails), None)
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::InvalidArguments {
                tool: "get_stock_details".to_string(),
                argument: "ticker".to_string(),
            }
        );
    }

    #[test]
    fn test_stock_details_uses_ticker() {
        let entities = ExtractedEntities {
            tickers: vec!["NVDA".to_string()],
            ..Default::default()
        };
        let calls = router()
            .route(&classify(IntentKind::StockDetails, entities), None)
            .unwrap();
        let names: Vec<&str> = calls.iter().map(|c| c.tool_name.as_str()).collect();
        assert_eq!(names, vec!["get_stock_details", "get_stock_price"]);
        assert!(calls.iter().all(|c| c.get_string("ticker") == Some("NVDA")));
    }

    #[test]
    fn test_stock_recommendations_defaults() {
        let calls = router()
            .route(&IntentClassification::new(IntentKind::StockRecommendations), None)
            .unwrap();
        assert_eq!(calls[0].get_string("sector"), Some("all"));
        assert_eq!(calls[0].get_string("goal"), Some("growth"));

        let entities = ExtractedEntities {
            sectors: vec!["utilities".to_string()],
            ..Default::default()
        };
        let calls = router()
            .route(&classify(IntentKind::StockRecommendations, entities), None)
            .unwrap();
        assert_eq!(calls[0].get_string("sector"), Some("utilities"));
        assert_eq!(calls[0].get_string("goal"), Some("income"));
    }

    #[test]
    fn test_query_entities_beat_preferences() {
        let prefs = complete_prefs();
        let entities = ExtractedEntities {
            sectors: vec!["energy".to_string()],
            ..Default::default()
        };
        let calls = router()
            .route(&classify(IntentKind::SectorInfo, entities), Some(&prefs))
            .unwrap();
        assert!(calls.iter().all(|c| c.get_string("sector") == Some("energy")));

        let calls = router()
            .route(&IntentClassification::new(IntentKind::SectorInfo), Some(&prefs))
            .unwrap();
        assert!(calls.iter().all(|c| c.get_string("sector") == Some("technology")));
    }

    #[test]
    fn test_timeframe_defaults_and_overrides() {
        let entities = ExtractedEntities {
            sectors: vec!["energy".to_string()],
            ..Default::default()
        };
        let calls = router()
            .route(&classify(IntentKind::NewsQuery, entities.clone()), None)
            .unwrap();
        assert!(calls.iter().all(|c| c.get_string("timeframe") == Some("1 month")));

        let entities = ExtractedEntities {
            timeframe: Some("1 week".to_string()),
            ..entities
        };
        let calls = router()
            .route(&classify(IntentKind::NewsQuery, entities), None)
            .unwrap();
        assert!(calls.iter().all(|c| c.get_string("timeframe") == Some("1 week")));
    }

    #[test]
    fn test_compare_falls_back_to_sectors() {
        let entities = ExtractedEntities {
            sectors: vec!["energy".to_string(), "utilities".to_string()],
            ..Default::default()
        };
        let calls = router()
            .route(&classify(IntentKind::Compare, entities), None)
            .unwrap();
        assert_eq!(calls[0].get_string("sector1"), Some("energy"));
        assert_eq!(calls[0].get_string("sector2"), Some("utilities"));

        let entities = ExtractedEntities {
            sectors: vec!["energy".to_string()],
            ..Default::default()
        };
        let err = router()
            .route(&classify(IntentKind::Compare, entities), None)
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidArguments { ref argument, .. } if argument == "sector2"));
    }

    #[test]
    fn test_calculate_var_accepts_empty_portfolio() {
        let calls = router()
            .route(&IntentClassification::new(IntentKind::PortfolioAnalysis), None)
            .unwrap();
        assert_eq!(calls[0].arguments["portfolio"], json!({}));
        assert_eq!(calls[0].arguments["confidence_level"], json!(0.95));
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let router = router();
        for empty in [json!(null), json!(""), json!([])] {
            let call = ToolCall::new("get_stock_price", "market").with_arg("ticker", empty);
            assert!(router.validate(&call).is_err());
        }
        let unknown = ToolCall::new("get_weather", "market");
        assert_eq!(
            router.validate(&unknown),
            Err(RouteError::UnknownTool("get_weather".to_string()))
        );
    }
}
