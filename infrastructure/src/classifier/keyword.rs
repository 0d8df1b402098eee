//! Rule-based intent classifier.
//!
//! Rules are tried in order; the first matching rule decides the intent.
//! Entities (tickers, sectors, goals, risk tolerance, timeframe) are
//! extracted independently of the rule that fired.

use async_trait::async_trait;
use finsense_application::ports::intent_classifier::{ClassifierError, IntentClassifier};
use finsense_domain::{
    Confidence, ExtractedEntities, INVESTMENT_GOALS, IntentClassification, IntentKind,
    RiskTolerance,
};
use regex::Regex;
use tracing::{debug, warn};

pub const CLARIFICATION_PROMPT: &str = "I'd be happy to help! Could you provide more details about what you're looking for? \
     For example, are you interested in market data, sector information, stock recommendations, or something else?";

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings", "sup", "howdy"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];

/// Uppercase words that look like tickers but are not.
const TICKER_STOPWORDS: &[&str] = &[
    "I", "A", "AI", "US", "USA", "ESG", "ETF", "ETFS", "VAR", "CEO", "IPO", "YTD", "OK", "GDP",
    "FED", "EPS", "PE",
];

/// (pattern, sector) aliases; more specific entries come first.
const SECTOR_ALIASES: &[(&str, &str)] = &[
    (r"consumer[\s-]+staples", "consumer-staples"),
    (r"consumer[\s-]+discretionary", "consumer-discretionary"),
    (r"communication(s)?([\s-]+services)?|telecom", "communication-services"),
    (r"financial(s)?([\s-]+services)?|finance|banks?|banking", "financial-services"),
    (r"real[\s-]+estate|reits?", "real-estate"),
    (r"tech(nology)?", "technology"),
    (r"health([\s-]?care)?|pharma|biotech", "healthcare"),
    (r"energy|oil", "energy"),
    (r"utilit(y|ies)", "utilities"),
    (r"industrials?", "industrials"),
    (r"materials", "materials"),
    (r"consumer", "consumer"),
];

/// One intent rule.
struct Rule {
    intent: IntentKind,
    confidence: Confidence,
    pattern: Regex,
}

fn compile_regex(pattern: &str, label: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(rule = label, error = %e, "Dropping invalid classifier pattern");
            None
        }
    }
}

/// Keyword and regex classifier used when no external classifier is configured.
pub struct KeywordIntentClassifier {
    rules: Vec<Rule>,
    sectors: Vec<(Regex, &'static str)>,
    goals: Vec<(Regex, &'static str)>,
    tickers: Option<Regex>,
    risk: Option<Regex>,
    timeframe: Option<Regex>,
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        use Confidence::{High, Medium};
        use IntentKind::*;

        let table: &[(IntentKind, Confidence, &str)] = &[
            (ViewPreferences, High, r"\b(show|view|see|what are)\b.*\bpreferences?\b"),
            (ClearPreferences, High, r"\b(clear|reset|forget|delete)\b.*\bpreferences?\b"),
            (
                SetPreferences,
                High,
                r"\b(i prefer|my goals? (is|are)|my risk|risk tolerance is|i am interested in|i'm interested in|set (my )?preferences?|update (my )?preferences?)\b",
            ),
            (FullResearch, High, r"\b(full research|deep dive|research report|in-depth research)\b"),
            (Compare, High, r"\b(compare|comparison|versus|vs)\b"),
            (PortfolioAnalysis, Medium, r"\b(portfolio|value at risk|var)\b"),
            (
                MarketOverview,
                High,
                r"(\bmarket overview\b|\bmarket status\b|\bmarket snapshot\b|\b(indices|index)\b|\b(dow|nasdaq|s&p|spx|dji|ixic|russell)\b|\boverall market\b|\bhow is the market\b)",
            ),
            (NewsQuery, Medium, r"\b(news|headlines?|breaking)\b"),
            (RiskAnalysis, Medium, r"\b(risks?|risky|volatility|volatile)\b"),
            (
                SectorRecommendations,
                Medium,
                r"(\brecommend\w*\b.*\bsectors?\b|\b(which|best|top) sectors?\b|\bsectors? (should|to) i\b)",
            ),
            (
                StockRecommendations,
                Medium,
                r"(\bstock ideas\b|\bstock picks\b|\brecommend\w*\b.*\bstocks?\b|\b(which|best|top) stocks?\b|\bstocks?\b)",
            ),
            (SectorInfo, Medium, r"\bsectors?\b"),
            (GeneralInfo, Medium, r"\b(what is|what are|explain|define)\b"),
        ];

        let rules = table
            .iter()
            .filter_map(|(intent, confidence, pattern)| {
                compile_regex(&format!("(?i){}", pattern), intent.as_str()).map(|pattern| Rule {
                    intent: *intent,
                    confidence: *confidence,
                    pattern,
                })
            })
            .collect();

        let sectors = SECTOR_ALIASES
            .iter()
            .filter_map(|(pattern, sector)| {
                compile_regex(&format!(r"(?i)\b({})\b", pattern), sector).map(|r| (r, *sector))
            })
            .collect();

        let goals = INVESTMENT_GOALS
            .iter()
            .map(|goal| (*goal, format!(r"(?i)\b{}\b", regex::escape(goal))))
            .chain([("income", r"(?i)\bdividends?\b".to_string())])
            .filter_map(|(goal, pattern)| compile_regex(&pattern, goal).map(|r| (r, goal)))
            .collect();

        Self {
            rules,
            sectors,
            goals,
            tickers: compile_regex(r"\$?\b([A-Za-z]{1,5})\b", "tickers"),
            risk: compile_regex(
                r"(?i)\b(low|medium|moderate|high|conservative|aggressive)\b(\s+risk)?|\brisk(\s+tolerance)?(\s+is)?\s+(low|medium|moderate|high)\b",
                "risk_tolerance",
            ),
            timeframe: compile_regex(
                r"(?i)\b(today|this week|this month|this quarter|this year|last week|last month|last quarter|last year|ytd|year to date|(past|last) \d+ (days?|weeks?|months?|years?)|\d+ (days?|weeks?|months?|years?))\b",
                "timeframe",
            ),
        }
    }

    /// Classify synchronously; the async port just delegates here.
    pub fn classify_query(&self, query: &str) -> IntentClassification {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return IntentClassification::clarification("Query is empty").with_raw_query(query);
        }

        let entities = self.extract_entities(trimmed);
        let lower = trimmed.to_lowercase();

        let (intent, confidence) = if is_greeting(&lower) {
            (IntentKind::Greeting, Confidence::High)
        } else if let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(trimmed)) {
            (rule.intent, rule.confidence)
        } else if !entities.tickers.is_empty() {
            (IntentKind::StockDetails, Confidence::Medium)
        } else if !entities.sectors.is_empty() {
            (IntentKind::SectorInfo, Confidence::Low)
        } else {
            return IntentClassification::clarification(CLARIFICATION_PROMPT)
                .with_entities(entities)
                .with_raw_query(trimmed);
        };

        let intent = refine(intent, &entities);
        let entities = finalize_entities(intent, entities);

        debug!(intent = %intent, ?confidence, "Keyword classification");
        IntentClassification::new(intent)
            .with_confidence(confidence)
            .with_entities(entities)
            .with_raw_query(trimmed)
    }

    pub fn extract_entities(&self, query: &str) -> ExtractedEntities {
        let mut entities = ExtractedEntities::default();

        // Sectors keep the order they appear in the query.
        let mut found: Vec<(usize, &str)> = Vec::new();
        for (pattern, sector) in &self.sectors {
            if let Some(m) = pattern.find(query)
                && !found.iter().any(|(_, s)| s == sector)
            {
                found.push((m.start(), *sector));
            }
        }
        found.sort_by_key(|(start, _)| *start);
        entities.sectors = found.into_iter().map(|(_, s)| s.to_string()).collect();
        if entities
            .sectors
            .iter()
            .any(|s| s == "consumer-staples" || s == "consumer-discretionary")
        {
            entities.sectors.retain(|s| s != "consumer");
        }

        for (pattern, goal) in &self.goals {
            if pattern.is_match(query) && !entities.goals.iter().any(|g| g == goal) {
                entities.goals.push(goal.to_string());
            }
        }

        if let Some(tickers) = &self.tickers {
            for caps in tickers.captures_iter(query) {
                let (Some(whole), Some(symbol)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let explicit = whole.as_str().starts_with('$');
                let symbol = symbol.as_str();
                let looks_like_ticker = symbol.len() >= 2
                    && symbol.chars().all(|c| c.is_ascii_uppercase())
                    && !TICKER_STOPWORDS.contains(&symbol);
                if explicit || looks_like_ticker {
                    let upper = symbol.to_uppercase();
                    if !entities.tickers.contains(&upper) {
                        entities.tickers.push(upper);
                    }
                }
            }
        }

        if let Some(risk) = &self.risk {
            entities.risk_tolerance = risk.captures_iter(query).find_map(|caps| {
                let word = caps.get(1).or_else(|| caps.get(5))?.as_str();
                // A bare "high"/"low" only counts when tied to risk.
                let tied = caps.get(2).is_some() || caps.get(5).is_some();
                let standalone = matches!(
                    word.to_lowercase().as_str(),
                    "conservative" | "aggressive" | "moderate"
                );
                (tied || standalone).then(|| word.parse::<RiskTolerance>().ok())?
            });
        }

        if let Some(timeframe) = &self.timeframe {
            entities.timeframe = timeframe
                .find(query)
                .map(|m| m.as_str().to_lowercase());
        }

        entities
    }
}

fn is_greeting(lower: &str) -> bool {
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let greeted = words.iter().any(|w| GREETING_WORDS.contains(w))
        || GREETING_PHRASES.iter().any(|p| lower.contains(p));
    greeted && words.len() <= 5
}

/// Narrow an intent using the extracted entities.
fn refine(intent: IntentKind, entities: &ExtractedEntities) -> IntentKind {
    match intent {
        IntentKind::NewsQuery if !entities.sectors.is_empty() => IntentKind::NewsForSector,
        IntentKind::StockRecommendations if !entities.tickers.is_empty() => IntentKind::StockDetails,
        other => other,
    }
}

fn finalize_entities(intent: IntentKind, mut entities: ExtractedEntities) -> ExtractedEntities {
    if intent == IntentKind::Compare && entities.comparison_items.is_empty() {
        entities.comparison_items = if entities.sectors.len() >= 2 {
            entities.sectors.clone()
        } else {
            entities.tickers.clone()
        };
    }
    entities
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(
        &self,
        query: &str,
        context: &[String],
    ) -> Result<IntentClassification, ClassifierError> {
        debug!(context_lines = context.len(), "Classifying with keyword rules");
        Ok(self.classify_query(query))
    }
}
