//! Heuristic inference of missing foreign-key values.

mod engine;
mod suggestion;

pub use engine::{
    Candidate, DirectSiblingRule, InferenceOutcome, InferenceRule, KeyInferenceEngine,
    MajorityVoteRule, RuleContext, SingleKeyFallbackRule,
};
pub use suggestion::KeySuggestion;
