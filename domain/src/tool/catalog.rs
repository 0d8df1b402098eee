//! Built-in tool catalog for the market, news and risk servers

use super::entities::{PreferenceRule, ToolRegistry, ToolRegistryEntry};

/// Connection names used by the built-in catalog.
pub mod connections {
    pub const MARKET: &str = "market";
    pub const NEWS: &str = "news";
    pub const RISK: &str = "risk";
    pub const COORDINATOR: &str = "coordinator";
}

/// Tools whose results go stale quickly and get the short cache TTL.
pub const VOLATILE_TOOLS: &[&str] = &["get_market_indices"];

impl ToolRegistry {
    /// Registry of every tool the Finsense servers expose.
    pub fn finsense() -> Self {
        use connections::*;

        ToolRegistry::new()
            .register(ToolRegistryEntry::new("get_market_indices", MARKET))
            .register(ToolRegistryEntry::new("get_sector_summary", MARKET).with_required(&["sector"]))
            .register(ToolRegistryEntry::new("get_stock_price", MARKET).with_required(&["ticker"]))
            .register(
                ToolRegistryEntry::new("get_stock_recommendations", MARKET)
                    .with_required(&["sector", "goal"]),
            )
            .register(ToolRegistryEntry::new("get_stock_details", MARKET).with_required(&["ticker"]))
            .register(
                ToolRegistryEntry::new("fetch_headlines", NEWS)
                    .with_required(&["sector", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("extract_risk_themes", NEWS)
                    .with_required(&["sector", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("identify_sector_risks", NEWS)
                    .with_required(&["sector_or_ticker"]),
            )
            .register(
                ToolRegistryEntry::new("compute_sector_volatility", RISK)
                    .with_required(&["sector", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("compare_sectors", RISK)
                    .with_required(&["sector1", "sector2", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("compute_sector_correlations", RISK)
                    .with_required(&["sectors", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("calculate_var", RISK)
                    .with_required(&["portfolio", "confidence_level", "timeframe"]),
            )
            .register(
                ToolRegistryEntry::new("conduct_research", COORDINATOR)
                    .with_required(&["sectors", "risk_tolerance"])
                    .with_preference_rule(PreferenceRule::Complete),
            )
    }
}
