//! Questionnaire engine: the fixed-order intake form.
//!
//! Steps are data ([`StepDefinition`]); validation is a per-step table
//! entry ([`Validator`]), so new checks never need new engine code paths.

pub mod engine;
pub mod steps;

pub use engine::{AnswerOutcome, Progress, Questionnaire, StepPrompt, SubmissionRecord};
pub use steps::{Rejection, StepDefinition, Validator, default_steps};
