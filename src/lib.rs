//! Intake bot — a conversational form-filling engine for chat.

pub mod channels;
pub mod config;
pub mod content;
pub mod error;
pub mod menu;
pub mod questionnaire;
pub mod records;
pub mod router;
pub mod session;
