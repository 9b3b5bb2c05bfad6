//! Dialogue router: turns inbound chat events into session transitions
//! and outgoing prompts.

pub mod dialogue;
pub mod event;

pub use dialogue::{DialogueRouter, FlowConfig};
pub use event::{Button, InboundEvent, Keyboard, Prompt};
