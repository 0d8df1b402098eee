//! Console rendering of tool results and session statistics

use async_trait::async_trait;
use colored::Colorize;
use finsense_application::ports::response_formatter::ResponseFormatter;
use finsense_application::{AnalyticsSummary, CacheStats};
use finsense_domain::{IntentKind, Preferences, ToolResults};
use serde_json::Value;

const ERROR_TEMPLATE: &str = "I hit an issue while processing that request: ";
const CLARIFICATION_TEMPLATE: &str = "Could you clarify: ";
const EMPTY: &str = "I don't have enough data yet to answer that. Could you share a bit more detail?";

const INDEX_ORDER: [&str; 4] = ["SPX", "DJI", "IXIC", "RUT"];

type Renderer = fn(&ConsoleResponseFormatter, &ToolResults) -> Option<String>;

/// Intent → renderer. Intents not listed fall back to a generic dump.
const RENDERERS: &[(IntentKind, Renderer)] = &[
    (IntentKind::MarketOverview, ConsoleResponseFormatter::market_overview),
    (IntentKind::SectorInfo, ConsoleResponseFormatter::sector_analysis),
    (IntentKind::SectorRecommendations, ConsoleResponseFormatter::sector_analysis),
    (IntentKind::StockDetails, ConsoleResponseFormatter::stock_details),
    (IntentKind::StockRecommendations, ConsoleResponseFormatter::stock_recommendations),
    (IntentKind::RiskAnalysis, ConsoleResponseFormatter::risk_analysis),
    (IntentKind::CalculateRisk, ConsoleResponseFormatter::risk_analysis),
    (IntentKind::NewsQuery, ConsoleResponseFormatter::news_summary),
    (IntentKind::NewsForSector, ConsoleResponseFormatter::news_summary),
    (IntentKind::Compare, ConsoleResponseFormatter::sector_comparison),
    (IntentKind::PortfolioAnalysis, ConsoleResponseFormatter::value_at_risk),
];

/// Renders tool results as plain terminal text with optional color.
#[derive(Debug, Clone)]
pub struct ConsoleResponseFormatter {
    color: bool,
}

impl Default for ConsoleResponseFormatter {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Scalar field as display text, `N/A` when absent.
fn field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl ConsoleResponseFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn unavailable(&self, tool: &str, results: &ToolResults) -> Option<String> {
        results
            .error(tool)
            .map(|e| self.warn(&format!("{} unavailable: {}", tool, e.detail)))
    }

    // ==================== Per-intent renderers ====================

    fn market_overview(&self, results: &ToolResults) -> Option<String> {
        let data = results.value("get_market_indices")?;
        let data = data.get("indices").unwrap_or(data);

        let mut lines = vec![self.heading("Here's a quick market snapshot:")];
        for index in INDEX_ORDER {
            if let Some(entry) = data.get(index).filter(|v| v.is_object()) {
                lines.push(format!("- {}: {} ({})", index, field(entry, "value"), field(entry, "change")));
            }
        }
        (lines.len() > 1).then(|| lines.join("\n"))
    }

    fn sector_analysis(&self, results: &ToolResults) -> Option<String> {
        let summary = results.value("get_sector_summary")?;
        let sector = summary
            .get("sector")
            .and_then(|s| s.as_str())
            .unwrap_or("This sector");

        let mut lines = vec![
            self.heading(&format!("{} sector overview:", sector)),
            format!(
                "- Performance: 1M {}, 3M {}, 1Y {}",
                field(summary, "performance_1m"),
                field(summary, "performance_3m"),
                field(summary, "performance_1y")
            ),
        ];

        let tickers: Vec<&str> = items(summary, "top_performers")
            .iter()
            .filter_map(|p| p.get("ticker").and_then(|t| t.as_str()))
            .take(5)
            .collect();
        if !tickers.is_empty() {
            lines.push(format!("- Notable names: {}", tickers.join(", ")));
        }

        if let Some(vol) = results.value("compute_sector_volatility") {
            lines.push(format!(
                "- Risk profile: annualized volatility {}, max drawdown {}, relative to market {}",
                field(vol, "annualized_volatility"),
                field(vol, "max_drawdown"),
                field(vol, "relative_to_market")
            ));
        } else if let Some(line) = self.unavailable("compute_sector_volatility", results) {
            lines.push(format!("- {}", line));
        }

        Some(lines.join("\n"))
    }

    fn stock_details(&self, results: &ToolResults) -> Option<String> {
        let details = results.value("get_stock_details");
        let price = results.value("get_stock_price");
        if details.is_none() && price.is_none() {
            return None;
        }

        let source = details.or(price)?;
        let mut lines = vec![self.heading(&format!(
            "{} - {}",
            field(source, "ticker"),
            field(source, "name")
        ))];
        if let Some(price) = price {
            lines.push(format!("- Price: ${} ({})", field(price, "price"), field(price, "change")));
        }
        if let Some(details) = details {
            for (label, key) in [
                ("Sector", "sector"),
                ("Market cap", "market_cap"),
                ("P/E", "pe_ratio"),
                ("Dividend yield", "dividend_yield"),
            ] {
                if details.get(key).is_some() {
                    lines.push(format!("- {}: {}", label, field(details, key)));
                }
            }
        }
        Some(lines.join("\n"))
    }

    fn stock_recommendations(&self, results: &ToolResults) -> Option<String> {
        let data = results.value("get_stock_recommendations")?;
        let goal = field(data, "goal");
        let sector = field(data, "sector");
        let stocks = items(data, "stocks");
        if stocks.is_empty() {
            return Some(format!(
                "I don't have stock recommendations for {} ({}) right now.",
                sector, goal
            ));
        }

        let mut lines = vec![self.heading(&format!(
            "Stock recommendations for {} in {}",
            goal.to_uppercase(),
            sector.to_uppercase()
        ))];
        for (idx, stock) in stocks.iter().take(5).enumerate() {
            lines.push(format!("{}. {} - {}", idx + 1, field(stock, "ticker"), field(stock, "name")));
            lines.push(format!("   - Price: ${}", field(stock, "price")));
            lines.push(format!("   - 1M Performance: {}", field(stock, "performance_1m")));
            lines.push(format!("   - Volatility: {}", field(stock, "volatility")));
            let reasons: Vec<&str> = items(stock, "reasons")
                .iter()
                .filter_map(|r| r.as_str())
                .take(2)
                .collect();
            if !reasons.is_empty() {
                lines.push(format!("   - Why: {}", reasons.join(", ")));
            }
        }
        Some(lines.join("\n"))
    }

    fn risk_analysis(&self, results: &ToolResults) -> Option<String> {
        let vol = results.value("compute_sector_volatility");
        let risks = results.value("identify_sector_risks");
        if vol.is_none() && risks.is_none() {
            return None;
        }

        let mut lines = vec![self.heading("Risk Analysis")];
        match vol {
            Some(vol) => {
                lines.push(format!("{} risk profile:", field(vol, "sector").to_uppercase()));
                lines.push(format!("- Volatility: {}", field(vol, "annualized_volatility")));
                lines.push(format!("- Max Drawdown: {}", field(vol, "max_drawdown")));
                for (label, key) in [("Trend", "trend"), ("Relative to Market", "relative_to_market")] {
                    if vol.get(key).is_some() {
                        lines.push(format!("- {}: {}", label, field(vol, key)));
                    }
                }
            }
            None => lines.extend(self.unavailable("compute_sector_volatility", results)),
        }

        match risks {
            Some(risks) => {
                let themes: Vec<String> = items(risks, "risks")
                    .iter()
                    .take(5)
                    .map(|r| format!("- [{}] {}", field(r, "category").to_uppercase(), field(r, "risk")))
                    .collect();
                if !themes.is_empty() {
                    lines.push("Risk themes:".to_string());
                    lines.extend(themes);
                }
                if let Some(summary) = risks.get("summary").and_then(|s| s.as_str()) {
                    lines.push(summary.to_string());
                }
            }
            None => lines.extend(self.unavailable("identify_sector_risks", results)),
        }
        Some(lines.join("\n"))
    }

    fn news_summary(&self, results: &ToolResults) -> Option<String> {
        let headlines = results.value("fetch_headlines");
        let themes = results.value("extract_risk_themes");
        if headlines.is_none() && themes.is_none() {
            return None;
        }

        let mut lines = Vec::new();
        match headlines {
            Some(data) => {
                lines.push(self.heading(&format!(
                    "Recent news for {} ({}): {} headlines analyzed.",
                    field(data, "sector").to_uppercase(),
                    field(data, "timeframe"),
                    field(data, "headline_count")
                )));
                for item in items(data, "headlines").iter().take(5) {
                    let url = item.get("url").and_then(|u| u.as_str()).unwrap_or_default();
                    let title = field(item, "title");
                    let sentiment = item.get("sentiment").and_then(|s| s.as_str()).unwrap_or("neutral");
                    if url.starts_with("http") {
                        lines.push(format!("- {} <{}> [{}]", title, url, sentiment));
                    } else {
                        lines.push(format!("- {} [{}]", title, sentiment));
                    }
                }
            }
            None => lines.extend(self.unavailable("fetch_headlines", results)),
        }

        match themes {
            Some(data) => {
                if let Some(summary) = data.get("summary").and_then(|s| s.as_str()) {
                    lines.push(format!("Risk themes: {}", summary));
                }
                for risk in items(data, "identified_risks").iter().take(3) {
                    lines.push(format!(
                        "- {} ({}), referenced in {} article(s)",
                        field(risk, "risk"),
                        field(risk, "category"),
                        field(risk, "article_count")
                    ));
                }
            }
            None => lines.extend(self.unavailable("extract_risk_themes", results)),
        }
        Some(lines.join("\n"))
    }

    fn sector_comparison(&self, results: &ToolResults) -> Option<String> {
        let data = results.value("compare_sectors")?;
        let first = field(data, "sector1");
        let second = field(data, "sector2");

        let mut lines = vec![self.heading(&format!(
            "Sector comparison: {} vs {} ({})",
            first.to_uppercase(),
            second.to_uppercase(),
            field(data, "timeframe")
        ))];
        for (label, key) in [
            ("Volatility", "volatility_comparison"),
            ("Max Drawdown", "max_drawdown"),
            ("Total Return", "total_return"),
            ("Sharpe Ratio", "sharpe_ratio"),
            ("Beta", "beta"),
        ] {
            let Some(metric) = data.get(key).filter(|m| m.is_object()) else {
                continue;
            };
            lines.push(format!("{}:", label));
            lines.push(format!("- {}: {}", first, field(metric, &first.to_lowercase())));
            lines.push(format!("- {}: {}", second, field(metric, &second.to_lowercase())));
        }
        if let Some(summary) = data.get("recommendation").and_then(|r| r.as_str()) {
            lines.push(format!("Summary: {}", summary));
        }
        Some(lines.join("\n"))
    }

    fn value_at_risk(&self, results: &ToolResults) -> Option<String> {
        let data = results.value("calculate_var")?;
        Some(format!(
            "{}\n- Confidence level: {}\n- VaR: {}\n- Timeframe: {}",
            self.heading("Portfolio Value at Risk"),
            field(data, "confidence_level"),
            field(data, "var"),
            field(data, "timeframe")
        ))
    }

    /// Fallback: each successful result as pretty JSON.
    fn generic(&self, results: &ToolResults) -> Option<String> {
        let mut values: Vec<(&str, &Value)> = results
            .iter()
            .filter_map(|(tool, outcome)| Some((tool, outcome.as_ref().ok()?)))
            .collect();
        values.sort_by_key(|(tool, _)| *tool);

        let blocks: Vec<String> = values
            .into_iter()
            .map(|(tool, value)| {
                let body = match value {
                    Value::String(s) => s.clone(),
                    other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
                };
                format!("{}\n{}", self.heading(tool), body)
            })
            .collect();
        (!blocks.is_empty()).then(|| blocks.join("\n\n"))
    }

    /// Render results for an intent.
    pub fn render(&self, intent: IntentKind, results: &ToolResults) -> String {
        if results.is_empty() {
            return EMPTY.to_string();
        }
        if results.success_count() == 0 {
            let details: Vec<String> = results
                .failures()
                .map(|(tool, e)| format!("{} ({})", tool, e.detail))
                .collect();
            return self.error(&format!("no data sources responded: {}", details.join(", ")));
        }

        let renderer = RENDERERS
            .iter()
            .find(|(kind, _)| *kind == intent)
            .map(|(_, render)| *render);
        renderer
            .and_then(|render| render(self, results))
            .or_else(|| self.generic(results))
            .unwrap_or_else(|| EMPTY.to_string())
    }

    pub fn error(&self, message: &str) -> String {
        format!("{}{}", ERROR_TEMPLATE, message)
    }

    pub fn clarification(&self, message: &str) -> String {
        format!("{}{}", CLARIFICATION_TEMPLATE, message)
    }

    pub fn preferences(&self, preferences: &Preferences) -> String {
        let list = |values: &[String]| {
            if values.is_empty() {
                "not set".to_string()
            } else {
                values.join(", ")
            }
        };
        let risk = preferences
            .risk_tolerance
            .map(|r| r.to_string())
            .unwrap_or_else(|| "not set".to_string());

        format!(
            "{}\n- Goals: {}\n- Sectors: {}\n- Risk tolerance: {}",
            self.heading("Your investment preferences:"),
            list(&preferences.goals),
            list(&preferences.sectors),
            risk
        )
    }

    // ==================== Session statistics ====================

    pub fn analytics(&self, summary: &AnalyticsSummary) -> String {
        let mut output = self.heading("Session analytics");
        output.push_str(&format!("\nTotal queries: {}", summary.total_queries));
        output.push_str(&format!("\nTool calls: {}", summary.total_tool_calls));
        output.push_str(&format!(
            "\nAvg response time: {} ms",
            summary.average_response_time_ms
        ));
        output.push_str(&format!(
            "\nAvg conversation length: {}",
            summary.average_conversation_length
        ));
        if let Some(rate) = summary.preference_collection_success_rate {
            output.push_str(&format!(
                "\nPreference collection success: {:.0}%",
                rate * 100.0
            ));
        }

        output.push_str("\nIntent distribution:");
        if summary.intent_counts.is_empty() {
            output.push_str("\n- (none)");
        } else {
            let max = summary.intent_counts.values().copied().max().unwrap_or(1).max(1);
            for (intent, count) in &summary.intent_counts {
                let bar = "#".repeat(count * 20 / max);
                output.push_str(&format!("\n- {:<24} {} ({})", intent, bar, count));
            }
        }
        output
    }

    pub fn cache(&self, stats: &CacheStats) -> String {
        format!(
            "{}\nEntries: {}\nHits: {}\nMisses: {}\nHit rate: {:.1}%",
            self.heading("Tool cache"),
            stats.size,
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0
        )
    }
}

#[async_trait]
impl ResponseFormatter for ConsoleResponseFormatter {
    async fn format(&self, intent: IntentKind, results: &ToolResults) -> String {
        self.render(intent, results)
    }

    fn format_error(&self, message: &str) -> String {
        self.error(message)
    }

    fn format_clarification(&self, message: &str) -> String {
        self.clarification(message)
    }

    fn format_preferences(&self, preferences: &Preferences) -> String {
        self.preferences(preferences)
    }
}
