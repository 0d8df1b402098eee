//! Intent classification types
//!
//! The classifier itself is an external collaborator; this module only
//! defines the value it produces and the static facts attached to each
//! intent (which tools serve it, which preferences it needs).

use crate::preferences::{PreferenceField, RiskTolerance};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the user wants, as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    // Informational queries
    MarketOverview,
    SectorInfo,
    StockDetails,
    RiskAnalysis,
    NewsQuery,
    GeneralInfo,

    // Recommendation requests
    StockRecommendations,
    SectorRecommendations,
    PortfolioAnalysis,

    // Preference management
    SetPreferences,
    ViewPreferences,
    ClearPreferences,

    // Action requests
    FullResearch,
    Compare,
    CalculateRisk,
    NewsForSector,

    // Conversational
    Greeting,
    NeedsClarification,
    OutOfScope,
}

impl IntentKind {
    pub const ALL: [IntentKind; 19] = [
        IntentKind::MarketOverview,
        IntentKind::SectorInfo,
        IntentKind::StockDetails,
        IntentKind::RiskAnalysis,
        IntentKind::NewsQuery,
        IntentKind::GeneralInfo,
        IntentKind::StockRecommendations,
        IntentKind::SectorRecommendations,
        IntentKind::PortfolioAnalysis,
        IntentKind::SetPreferences,
        IntentKind::ViewPreferences,
        IntentKind::ClearPreferences,
        IntentKind::FullResearch,
        IntentKind::Compare,
        IntentKind::CalculateRisk,
        IntentKind::NewsForSector,
        IntentKind::Greeting,
        IntentKind::NeedsClarification,
        IntentKind::OutOfScope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::MarketOverview => "market_overview",
            IntentKind::SectorInfo => "sector_info",
            IntentKind::StockDetails => "stock_details",
            IntentKind::RiskAnalysis => "risk_analysis",
            IntentKind::NewsQuery => "news_query",
            IntentKind::GeneralInfo => "general_info",
            IntentKind::StockRecommendations => "stock_recommendations",
            IntentKind::SectorRecommendations => "sector_recommendations",
            IntentKind::PortfolioAnalysis => "portfolio_analysis",
            IntentKind::SetPreferences => "set_preferences",
            IntentKind::ViewPreferences => "view_preferences",
            IntentKind::ClearPreferences => "clear_preferences",
            IntentKind::FullResearch => "full_research",
            IntentKind::Compare => "compare",
            IntentKind::CalculateRisk => "calculate_risk",
            IntentKind::NewsForSector => "news_for_sector",
            IntentKind::Greeting => "greeting",
            IntentKind::NeedsClarification => "needs_clarification",
            IntentKind::OutOfScope => "out_of_scope",
        }
    }

    /// Tools that serve this intent, in preferred dispatch order.
    ///
    /// Empty for intents resolved without tools.
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            IntentKind::MarketOverview => &["get_market_indices"],
            IntentKind::SectorRecommendations => &["get_sector_summary"],
            IntentKind::SectorInfo => &["get_sector_summary", "compute_sector_volatility"],
            IntentKind::StockDetails => &["get_stock_details", "get_stock_price"],
            IntentKind::StockRecommendations => &["get_stock_recommendations"],
            IntentKind::RiskAnalysis => &["compute_sector_volatility", "identify_sector_risks"],
            IntentKind::NewsQuery | IntentKind::NewsForSector => {
                &["fetch_headlines", "extract_risk_themes"]
            }
            IntentKind::FullResearch => &["conduct_research"],
            IntentKind::Compare => &["compare_sectors"],
            IntentKind::CalculateRisk => &["compute_sector_volatility"],
            IntentKind::PortfolioAnalysis => &["calculate_var"],
            IntentKind::GeneralInfo
            | IntentKind::SetPreferences
            | IntentKind::ViewPreferences
            | IntentKind::ClearPreferences
            | IntentKind::Greeting
            | IntentKind::NeedsClarification
            | IntentKind::OutOfScope => &[],
        }
    }

    /// Whether classifiers should flag this intent as needing preferences.
    pub fn requires_preferences(&self) -> bool {
        matches!(
            self,
            IntentKind::SectorRecommendations | IntentKind::FullResearch
        )
    }

    /// Preference fields checked when a classification requires preferences.
    pub fn required_preference_fields(&self) -> &'static [PreferenceField] {
        &PreferenceField::ALL
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        IntentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| format!("Unknown intent: {}", s))
    }
}

/// Classifier confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Entities the classifier pulled out of the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedEntities {
    pub tickers: Vec<String>,
    pub sectors: Vec<String>,
    pub goals: Vec<String>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub timeframe: Option<String>,
    pub comparison_items: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
            && self.sectors.is_empty()
            && self.goals.is_empty()
            && self.risk_tolerance.is_none()
            && self.timeframe.is_none()
            && self.comparison_items.is_empty()
    }
}

/// Result of intent classification. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: IntentKind,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub entities: ExtractedEntities,
    #[serde(default)]
    pub requires_preferences: bool,
    #[serde(default)]
    pub clarification_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_message: Option<String>,
    #[serde(default)]
    pub raw_query: String,
}

impl IntentClassification {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            confidence: Confidence::default(),
            entities: ExtractedEntities::default(),
            requires_preferences: intent.requires_preferences(),
            clarification_needed: false,
            clarification_message: None,
            raw_query: String::new(),
        }
    }

    /// A classification asking the user to clarify.
    pub fn clarification(message: impl Into<String>) -> Self {
        Self {
            confidence: Confidence::Low,
            clarification_needed: true,
            clarification_message: Some(message.into()),
            ..Self::new(IntentKind::NeedsClarification)
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_entities(mut self, entities: ExtractedEntities) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_requires_preferences(mut self, requires: bool) -> Self {
        self.requires_preferences = requires;
        self
    }

    pub fn with_raw_query(mut self, query: impl Into<String>) -> Self {
        self.raw_query = query.into();
        self
    }
}
