//! Validation and filtering system
//!
//! Request bodies are decoded by the [`GridJson`] extractor, then checked
//! against per-operation [`RecordRules`] before anything reaches a store.

pub mod extractor;
pub mod filters;
pub mod rules;
pub mod validators;

pub use extractor::GridJson;
pub use rules::RecordRules;
