pub mod correlation;
pub mod emergency;
pub mod engine;
pub mod normalize;
pub mod questions;
pub mod reference;
pub mod rules;
pub mod scoring;
pub mod types;
pub mod uncertainty;

pub use engine::DiagnosisEngine;
pub use reference::KnowledgeBase;
pub use types::{
    CandidateSource, ClarificationQuestion, DiagnosisResponse, DiagnosisResult, QuestionKind,
    ReasoningStep, TraceKind,
};
