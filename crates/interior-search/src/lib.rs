//! interior-search
//!
//! Multi-vector query building, intent detection, relevance filtering and
//! result formatting, tied together by [`ImageSearchEngine`].
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod engine;
pub mod format;
pub mod intent;
pub mod query;
pub mod relevance;

pub use engine::ImageSearchEngine;
pub use format::{format_ranked, ImageHit, SearchResponse, Suggestions};
pub use intent::{detect_intent, IntentDetector, IntentRule};
pub use query::QueryPlan;
pub use relevance::RelevanceFilter;
