//! Process Turn use case
//!
//! Runs one user message through the turn state machine:
//! classification, clarification or preference gating, routing,
//! optimized execution, formatting and history-aware rewriting.
//!
//! Every call produces a response. Routing problems become clarification
//! prompts; anything else that goes wrong lands in `ErrorHandling`, which
//! ends the turn with a user-safe apology and leaves the session usable.

use crate::ports::analytics::{AnalyticsPort, NoAnalytics, QueryIndex};
use crate::ports::conversation::ConversationStore;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::intent_classifier::{ClassifierError, IntentClassifier};
use crate::ports::preference_store::PreferenceStore;
use crate::ports::response_formatter::{ContextBuilder, PassthroughContext, ResponseFormatter};
use crate::use_cases::execute_tools::ToolOptimizer;
use crate::use_cases::route_tools::ToolRouter;
use finsense_domain::{
    IntentClassification, IntentKind, Message, PreferenceField, Preferences, Role, RouteError,
    ToolCall, ToolResults, TurnState, TurnTrace,
};
use serde_json::{Map, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

const GREETING: &str =
    "Hi! I can help with market overviews, sector analysis, risks, news, or stock research.";

const OUT_OF_SCOPE: &str = "I can't provide personal buy/sell advice, but I can help you research market, \
sector, stock, and risk information to support your decision.";

const NO_ACTION: &str = "I understood your request, but there is no tool action mapped for it yet.";

const DEFAULT_CLARIFICATION: &str = "Could you provide a bit more detail?";

const GENERIC_FAILURE: &str = "Something went wrong on my side. Please try again.";

/// Errors that end a turn in `ErrorHandling`
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),

    #[error("Invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnState, to: TurnState },
}

/// Everything the caller may want to know about one processed message
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub response: String,
    pub intent: Option<IntentKind>,
    pub states: Vec<TurnState>,
    pub tool_calls: Vec<ToolCall>,
    pub results: Option<ToolResults>,
    pub elapsed: Duration,
}

impl TurnReport {
    pub fn failed(&self) -> bool {
        self.states.contains(&TurnState::ErrorHandling)
    }

    pub fn visited(&self, state: TurnState) -> bool {
        self.states.contains(&state)
    }
}

/// Per-turn scratch state
struct Turn {
    trace: TurnTrace,
    query: QueryIndex,
    intent: Option<IntentKind>,
    tool_calls: Vec<ToolCall>,
    results: Option<ToolResults>,
}

impl Turn {
    fn new(query: QueryIndex) -> Self {
        Self {
            trace: TurnTrace::new(),
            query,
            intent: None,
            tool_calls: Vec::new(),
            results: None,
        }
    }

    fn advance(&mut self, next: TurnState) -> Result<(), TurnError> {
        let from = self.trace.current();
        if self.trace.advance(next) {
            debug!("Turn state: {} -> {}", from, next);
            Ok(())
        } else {
            Err(TurnError::InvalidTransition { from, to: next })
        }
    }

    fn fail(&mut self) {
        self.trace.advance(TurnState::ErrorHandling);
        self.trace.advance(TurnState::Done);
    }
}

/// Handler for an intent resolved without routing or execution
type CannedHandler = fn(&TurnOrchestrator, &IntentClassification, QueryIndex) -> String;

const CANNED_HANDLERS: &[(IntentKind, CannedHandler)] = &[
    (IntentKind::Greeting, TurnOrchestrator::handle_greeting),
    (IntentKind::OutOfScope, TurnOrchestrator::handle_out_of_scope),
    (IntentKind::ViewPreferences, TurnOrchestrator::handle_view_preferences),
    (IntentKind::ClearPreferences, TurnOrchestrator::handle_clear_preferences),
    (IntentKind::SetPreferences, TurnOrchestrator::handle_set_preferences),
];

fn canned_handler(intent: IntentKind) -> Option<CannedHandler> {
    CANNED_HANDLERS
        .iter()
        .find(|(kind, _)| *kind == intent)
        .map(|(_, handler)| *handler)
}

pub struct TurnOrchestrator {
    classifier: Arc<dyn IntentClassifier>,
    preferences: Arc<dyn PreferenceStore>,
    conversation: Arc<dyn ConversationStore>,
    router: ToolRouter,
    optimizer: Arc<ToolOptimizer>,
    formatter: Arc<dyn ResponseFormatter>,
    context: Arc<dyn ContextBuilder>,
    analytics: Arc<dyn AnalyticsPort>,
    logger: Arc<dyn ConversationLogger>,
    context_window: usize,
}

impl TurnOrchestrator {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        preferences: Arc<dyn PreferenceStore>,
        conversation: Arc<dyn ConversationStore>,
        router: ToolRouter,
        optimizer: Arc<ToolOptimizer>,
        formatter: Arc<dyn ResponseFormatter>,
    ) -> Self {
        Self {
            classifier,
            preferences,
            conversation,
            router,
            optimizer,
            formatter,
            context: Arc::new(PassthroughContext),
            analytics: Arc::new(NoAnalytics),
            logger: Arc::new(NoConversationLogger),
            context_window: 6,
        }
    }

    pub fn with_context_builder(mut self, context: Arc<dyn ContextBuilder>) -> Self {
        self.context = context;
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsPort>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn optimizer(&self) -> &ToolOptimizer {
        &self.optimizer
    }

    pub fn analytics(&self) -> &dyn AnalyticsPort {
        self.analytics.as_ref()
    }

    /// Process one user message. Always yields a response.
    pub async fn process_message(&self, message: &str) -> TurnReport {
        let started = Instant::now();
        let mut turn = Turn::new(self.analytics.start_query());
        self.logger.log(ConversationEvent::new(
            "turn_started",
            json!({ "query": message }),
        ).for_turn(turn.query));

        let response = match self.run(message, &mut turn).await {
            Ok(response) => {
                self.logger.log(ConversationEvent::new(
                    "turn_completed",
                    json!({
                        "intent": turn.intent.map(|i| i.as_str()),
                        "states": turn.trace.states(),
                        "tool_calls": turn.tool_calls.len(),
                    }),
                ).for_turn(turn.query));
                response
            }
            Err(e) => {
                warn!("Turn failed in state {}: {}", turn.trace.current(), e);
                self.logger.log(ConversationEvent::new(
                    "turn_failed",
                    json!({
                        "state": turn.trace.current(),
                        "error": e.to_string(),
                    }),
                ).for_turn(turn.query));
                turn.fail();

                let response = self.formatter.format_error(GENERIC_FAILURE);
                let mut metadata = Map::new();
                metadata.insert("intent".to_string(), json!("error"));
                metadata.insert("error".to_string(), json!(e.to_string()));
                self.conversation
                    .append_message(Role::Assistant, &response, metadata);
                response
            }
        };

        let elapsed = started.elapsed();
        self.analytics
            .record_response_time(turn.query, elapsed.as_secs_f64() * 1000.0);
        self.analytics
            .record_conversation_length(self.conversation.turn_count());

        TurnReport {
            response,
            intent: turn.intent,
            states: turn.trace.states().to_vec(),
            tool_calls: turn.tool_calls,
            results: turn.results,
            elapsed,
        }
    }

    async fn run(&self, message: &str, turn: &mut Turn) -> Result<String, TurnError> {
        turn.advance(TurnState::Classifying)?;
        self.conversation
            .append_message(Role::User, message, Map::new());

        let context: Vec<String> = self
            .conversation
            .recent(self.context_window)
            .iter()
            .map(Message::as_context_line)
            .collect();
        let classification = self.classifier.classify(message, &context).await?;

        info!(
            "Classified as {} ({})",
            classification.intent,
            classification.confidence.as_str()
        );
        turn.intent = Some(classification.intent);
        self.analytics
            .record_intent(turn.query, classification.intent.as_str());
        self.logger.log(ConversationEvent::new(
            "intent_classified",
            json!({
                "intent": classification.intent,
                "confidence": classification.confidence,
                "requires_preferences": classification.requires_preferences,
                "clarification_needed": classification.clarification_needed,
                "entities": classification.entities,
            }),
        ).for_turn(turn.query));

        let base = self.resolve(&classification, turn).await?;

        let history = self.conversation.history();
        let response = self.context.contextualize(message, &base, &history).await;

        let mut metadata = Map::new();
        metadata.insert("intent".to_string(), json!(classification.intent));
        metadata.insert("confidence".to_string(), json!(classification.confidence));
        self.conversation
            .append_message(Role::Assistant, &response, metadata);

        turn.advance(TurnState::Done)?;
        Ok(response)
    }

    /// Produce the base response. Leaves the trace one step before `Done`.
    async fn resolve(
        &self,
        classification: &IntentClassification,
        turn: &mut Turn,
    ) -> Result<String, TurnError> {
        if classification.clarification_needed
            || classification.intent == IntentKind::NeedsClarification
        {
            turn.advance(TurnState::Clarifying)?;
            let prompt = classification
                .clarification_message
                .as_deref()
                .unwrap_or(DEFAULT_CLARIFICATION);
            return Ok(self.formatter.format_clarification(prompt));
        }

        if let Some(handler) = canned_handler(classification.intent) {
            return Ok(handler(self, classification, turn.query));
        }

        let preferences = self.preferences.get();
        if classification.requires_preferences {
            turn.advance(TurnState::PreferenceGating)?;
            self.analytics
                .record_preference_collection(turn.query, true, None);

            let missing =
                preferences.missing_among(classification.intent.required_preference_fields());
            if !missing.is_empty() {
                info!("Preferences incomplete, asking for: {:?}", missing);
                self.analytics
                    .record_preference_collection(turn.query, true, Some(false));
                turn.advance(TurnState::Clarifying)?;
                return Ok(self
                    .formatter
                    .format_clarification(&missing_preferences_prompt(&missing)));
            }
        }

        turn.advance(TurnState::Routing)?;
        let calls = match self.router.route(classification, Some(&preferences)) {
            Ok(calls) => calls,
            Err(e) => {
                info!("Routing needs clarification: {}", e);
                self.logger.log(ConversationEvent::new(
                    "tools_routed",
                    json!({ "error": e.to_string() }),
                ).for_turn(turn.query));
                turn.advance(TurnState::Clarifying)?;
                return Ok(self.formatter.format_clarification(&route_error_prompt(&e)));
            }
        };

        self.analytics.record_tool_calls(turn.query, calls.len());
        self.logger.log(ConversationEvent::new(
            "tools_routed",
            json!({ "calls": calls }),
        ).for_turn(turn.query));
        if calls.is_empty() {
            return Ok(NO_ACTION.to_string());
        }

        turn.advance(TurnState::Executing)?;
        let results = self.optimizer.execute_all(&calls).await;
        self.logger.log(ConversationEvent::new(
            "tool_results",
            json!({
                "succeeded": results.success_count(),
                "results": results.to_json(),
            }),
        ).for_turn(turn.query));

        turn.advance(TurnState::Formatting)?;
        let response = self.formatter.format(classification.intent, &results).await;
        turn.tool_calls = calls;
        turn.results = Some(results);
        Ok(response)
    }

    // ==================== Canned Handlers ====================

    fn handle_greeting(&self, _classification: &IntentClassification, _query: QueryIndex) -> String {
        GREETING.to_string()
    }

    fn handle_out_of_scope(&self, _classification: &IntentClassification, _query: QueryIndex) -> String {
        OUT_OF_SCOPE.to_string()
    }

    fn handle_view_preferences(&self, _classification: &IntentClassification, _query: QueryIndex) -> String {
        self.formatter.format_preferences(&self.preferences.get())
    }

    fn handle_clear_preferences(&self, _classification: &IntentClassification, _query: QueryIndex) -> String {
        self.preferences.clear();
        "Your preferences have been cleared.".to_string()
    }

    /// Merge the preferences named in the query into the store.
    ///
    /// Invalid values leave the store untouched.
    fn handle_set_preferences(&self, classification: &IntentClassification, query: QueryIndex) -> String {
        let entities = &classification.entities;
        let update = Preferences {
            goals: entities.goals.clone(),
            sectors: entities.sectors.clone(),
            risk_tolerance: entities.risk_tolerance,
        };
        let updated = self.preferences.get().merge(&update);

        let errors = updated.validate();
        if !errors.is_empty() {
            self.analytics
                .record_preference_collection(query, true, Some(false));
            return self.formatter.format_error(&errors.join("; "));
        }

        self.preferences.update(updated.clone());
        let missing = updated.missing_fields();
        match missing.first() {
            None => {
                self.analytics
                    .record_preference_collection(query, true, Some(true));
                format!(
                    "Preferences updated successfully. {}",
                    self.formatter.format_preferences(&updated)
                )
            }
            Some(field) => {
                self.analytics
                    .record_preference_collection(query, true, Some(false));
                self.formatter.format_clarification(field.question())
            }
        }
    }
}

/// Follow-up naming every missing field, then asking for the first.
fn missing_preferences_prompt(missing: &[PreferenceField]) -> String {
    let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
    let question = missing
        .first()
        .map(|f| f.question())
        .unwrap_or(DEFAULT_CLARIFICATION);
    format!(
        "I need a bit more about your preferences first (missing: {}). {}",
        names.join(", "),
        question
    )
}

fn route_error_prompt(error: &RouteError) -> String {
    match error {
        RouteError::MissingPreferences { missing, .. } => missing_preferences_prompt(missing),
        RouteError::InvalidArguments { argument, .. } => {
            format!("Which {} do you mean?", argument.replace('_', " "))
        }
        RouteError::UnknownTool(_) => DEFAULT_CLARIFICATION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionParams;
    use crate::ports::tool_connection::{ConnectionError, ConnectionRegistry, ToolConnection};
    use crate::use_cases::tool_cache::{ManualClock, ToolCache};
    use async_trait::async_trait;
    use finsense_domain::{
        Arguments, ExtractedEntities, RemoteTool, RiskTolerance, ToolErrorKind, ToolRegistry,
    };
    use serde_json::Value;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    /// Returns a fixed classification, or fails when it has none.
    struct ScriptedClassifier {
        classification: Option<IntentClassification>,
        seen_context: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        fn returning(classification: IntentClassification) -> Self {
            Self {
                classification: Some(classification),
                seen_context: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                classification: None,
                seen_context: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IntentClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            query: &str,
            context: &[String],
        ) -> Result<IntentClassification, ClassifierError> {
            *self.seen_context.lock().unwrap() = context.to_vec();
            self.classification
                .clone()
                .map(|c| c.with_raw_query(query))
                .ok_or_else(|| ClassifierError::Unavailable("offline".into()))
        }
    }

    #[derive(Default)]
    struct MemoryPreferences(Mutex<Preferences>);

    impl PreferenceStore for MemoryPreferences {
        fn get(&self) -> Preferences {
            self.0.lock().unwrap().clone()
        }

        fn update(&self, preferences: Preferences) {
            *self.0.lock().unwrap() = preferences;
        }

        fn clear(&self) {
            *self.0.lock().unwrap() = Preferences::default();
        }
    }

    #[derive(Default)]
    struct MemoryConversation(Mutex<Vec<Message>>);

    impl ConversationStore for MemoryConversation {
        fn append_message(&self, role: Role, content: &str, metadata: Map<String, Value>) {
            let mut message = match role {
                Role::User => Message::user(content),
                Role::Assistant => Message::assistant(content),
            };
            message.metadata = metadata;
            self.0.lock().unwrap().push(message);
        }

        fn history(&self) -> Vec<Message> {
            self.0.lock().unwrap().clone()
        }
    }

    struct PlainFormatter;

    #[async_trait]
    impl ResponseFormatter for PlainFormatter {
        async fn format(&self, intent: IntentKind, results: &ToolResults) -> String {
            format!("{}: {} ok, {} failed", intent, results.success_count(), results.failures().count())
        }

        fn format_error(&self, message: &str) -> String {
            format!("error: {}", message)
        }

        fn format_clarification(&self, message: &str) -> String {
            format!("clarify: {}", message)
        }

        fn format_preferences(&self, preferences: &Preferences) -> String {
            format!("goals={:?} sectors={:?}", preferences.goals, preferences.sectors)
        }
    }

    /// Connection that counts protocol calls and optionally fails one tool.
    struct CountingConnection {
        name: &'static str,
        calls: Mutex<Vec<String>>,
        timeout_on: Option<&'static str>,
    }

    impl CountingConnection {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: Mutex::new(Vec::new()),
                timeout_on: None,
            }
        }

        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ToolConnection for CountingConnection {
        fn name(&self) -> &str {
            self.name
        }

        async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConnectionError> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, _arguments: &Arguments) -> Result<Value, ConnectionError> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.timeout_on == Some(name) {
                return Err(ConnectionError::Timeout(30));
            }
            Ok(json!({ "tool": name }))
        }

        async fn close(&self) {}
    }

    struct Harness {
        orchestrator: TurnOrchestrator,
        conversation: Arc<MemoryConversation>,
        preferences: Arc<MemoryPreferences>,
        classifier: Arc<ScriptedClassifier>,
    }

    fn harness(classifier: ScriptedClassifier, connections: ConnectionRegistry) -> Harness {
        let classifier = Arc::new(classifier);
        let conversation = Arc::new(MemoryConversation::default());
        let preferences = Arc::new(MemoryPreferences::default());
        let cache = Arc::new(ToolCache::with_clock(Arc::new(ManualClock::new())));
        let optimizer = Arc::new(ToolOptimizer::new(connections, cache, ExecutionParams::default()));
        let router = ToolRouter::new(Arc::new(ToolRegistry::finsense()), "1 month");

        let orchestrator = TurnOrchestrator::new(
            classifier.clone(),
            preferences.clone(),
            conversation.clone(),
            router,
            optimizer,
            Arc::new(PlainFormatter),
        );
        Harness {
            orchestrator,
            conversation,
            preferences,
            classifier,
        }
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_market_overview_is_cached_between_turns() {
        let market = Arc::new(CountingConnection::new("market"));
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::MarketOverview)),
            ConnectionRegistry::new().with(market.clone()),
        );

        let first = h.orchestrator.process_message("how are markets?").await;
        assert_eq!(first.tool_calls.len(), 1);
        assert_eq!(first.tool_calls[0].tool_name, "get_market_indices");
        assert!(first.tool_calls[0].arguments.is_empty());
        assert_eq!(
            first.states,
            vec![
                TurnState::Idle,
                TurnState::Classifying,
                TurnState::Routing,
                TurnState::Executing,
                TurnState::Formatting,
                TurnState::Done,
            ]
        );
        assert_eq!(market.count(), 1);

        let second = h.orchestrator.process_message("how are markets?").await;
        assert_eq!(market.count(), 1);
        assert_eq!(second.response, "market_overview: 1 ok, 0 failed");
        assert_eq!(h.orchestrator.optimizer().cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_incomplete_preferences_short_circuit_to_clarification() {
        let market = Arc::new(CountingConnection::new("market"));
        let classification = IntentClassification::new(IntentKind::SectorRecommendations)
            .with_requires_preferences(true);
        let h = harness(
            ScriptedClassifier::returning(classification),
            ConnectionRegistry::new().with(market.clone()),
        );

        let report = h.orchestrator.process_message("recommend me a sector").await;

        assert!(report.response.contains("goals"));
        assert!(report.response.contains("sectors"));
        assert!(report.response.contains("risk_tolerance"));
        assert!(report.response.starts_with("clarify: "));
        assert!(report.tool_calls.is_empty());
        assert_eq!(market.count(), 0);
        assert!(report.visited(TurnState::PreferenceGating));
        assert!(report.visited(TurnState::Clarifying));
        assert!(!report.visited(TurnState::Routing));
        assert!(!report.visited(TurnState::Executing));
        assert!(!report.failed());
    }

    #[tokio::test]
    async fn test_partial_failure_still_formats_siblings() {
        let market = Arc::new(CountingConnection {
            timeout_on: Some("get_stock_price"),
            ..CountingConnection::new("market")
        });
        let entities = ExtractedEntities {
            tickers: vec!["AAPL".to_string()],
            ..Default::default()
        };
        let h = harness(
            ScriptedClassifier::returning(
                IntentClassification::new(IntentKind::StockDetails).with_entities(entities),
            ),
            ConnectionRegistry::new().with(market.clone()),
        );

        let report = h.orchestrator.process_message("tell me about AAPL").await;
        let results = report.results.as_ref().unwrap();

        assert_eq!(results.error("get_stock_price").unwrap().kind, ToolErrorKind::Timeout);
        assert!(results.value("get_stock_details").is_some());
        assert_eq!(report.response, "stock_details: 1 ok, 1 failed");
        assert!(!report.failed());
    }

    // ==================== Short-circuits ====================

    #[tokio::test]
    async fn test_greeting_skips_routing() {
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::Greeting)),
            ConnectionRegistry::new(),
        );
        let report = h.orchestrator.process_message("hello").await;

        assert_eq!(report.response, GREETING);
        assert_eq!(
            report.states,
            vec![TurnState::Idle, TurnState::Classifying, TurnState::Done]
        );
    }

    #[tokio::test]
    async fn test_clarification_flag_uses_classifier_message() {
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::clarification(
                "Which sector do you mean?",
            )),
            ConnectionRegistry::new(),
        );
        let report = h.orchestrator.process_message("that one").await;

        assert_eq!(report.response, "clarify: Which sector do you mean?");
        assert!(report.visited(TurnState::Clarifying));
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_clarification() {
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::StockDetails)),
            ConnectionRegistry::new(),
        );
        let report = h.orchestrator.process_message("tell me about that stock").await;

        assert_eq!(report.response, "clarify: Which ticker do you mean?");
        assert!(report.visited(TurnState::Routing));
        assert!(!report.visited(TurnState::Executing));
    }

    #[tokio::test]
    async fn test_set_preferences_merges_entities() {
        let entities = ExtractedEntities {
            goals: vec!["growth".to_string()],
            sectors: vec!["technology".to_string()],
            risk_tolerance: Some(RiskTolerance::High),
            ..Default::default()
        };
        let h = harness(
            ScriptedClassifier::returning(
                IntentClassification::new(IntentKind::SetPreferences).with_entities(entities),
            ),
            ConnectionRegistry::new(),
        );
        let report = h.orchestrator.process_message("I like tech growth, high risk").await;

        assert!(report.response.starts_with("Preferences updated successfully."));
        assert!(h.preferences.get().is_complete());
    }

    #[tokio::test]
    async fn test_set_preferences_rejects_invalid_values() {
        let entities = ExtractedEntities {
            sectors: vec!["crypto".to_string()],
            ..Default::default()
        };
        let h = harness(
            ScriptedClassifier::returning(
                IntentClassification::new(IntentKind::SetPreferences).with_entities(entities),
            ),
            ConnectionRegistry::new(),
        );
        let report = h.orchestrator.process_message("crypto please").await;

        assert!(report.response.starts_with("error: Invalid sectors: crypto"));
        assert!(h.preferences.get().is_empty());
    }

    #[tokio::test]
    async fn test_clear_preferences() {
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::ClearPreferences)),
            ConnectionRegistry::new(),
        );
        h.preferences
            .update(Preferences::new().with_goals(["income"]));

        let report = h.orchestrator.process_message("forget my preferences").await;
        assert_eq!(report.response, "Your preferences have been cleared.");
        assert!(h.preferences.get().is_empty());
    }

    // ==================== Error handling ====================

    #[tokio::test]
    async fn test_classifier_failure_ends_in_error_handling() {
        let h = harness(ScriptedClassifier::failing(), ConnectionRegistry::new());
        let report = h.orchestrator.process_message("anything").await;

        assert!(report.failed());
        assert_eq!(report.response, format!("error: {}", GENERIC_FAILURE));
        assert!(!report.response.contains("offline"));
        assert_eq!(report.states.last(), Some(&TurnState::Done));

        let history = h.conversation.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].metadata["intent"], "error");
    }

    #[tokio::test]
    async fn test_history_and_context_window() {
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::Greeting)),
            ConnectionRegistry::new(),
        );
        let orchestrator = h.orchestrator.with_context_window(3);

        orchestrator.process_message("one").await;
        orchestrator.process_message("two").await;

        let seen = h.classifier.seen_context.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last().map(String::as_str), Some("user: two"));
        assert_eq!(h.conversation.history().len(), 4);
        assert_eq!(h.conversation.turn_count(), 2);
    }

    #[derive(Default)]
    struct RecordingLogger(Mutex<Vec<ConversationEvent>>);

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_transcript_events_share_turn_index() {
        let market = Arc::new(CountingConnection::new("market"));
        let h = harness(
            ScriptedClassifier::returning(IntentClassification::new(IntentKind::MarketOverview)),
            ConnectionRegistry::new().with(market),
        );
        let logger = Arc::new(RecordingLogger::default());
        let orchestrator = h.orchestrator.with_conversation_logger(logger.clone());

        orchestrator.process_message("how are markets?").await;

        let events = logger.0.lock().unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                "turn_started",
                "intent_classified",
                "tools_routed",
                "tool_results",
                "turn_completed",
            ]
        );
        let first = events[0].turn;
        assert!(first.is_some());
        assert!(events.iter().all(|e| e.turn == first));
    }
}
