//! Built-in intent classification.

mod keyword;

pub use keyword::{CLARIFICATION_PROMPT, KeywordIntentClassifier};
