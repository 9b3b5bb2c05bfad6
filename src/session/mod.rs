//! Session store — per-user conversational state.

pub mod model;
pub mod store;

pub use model::{DialogueState, Language, Profile, Session, UserId};
pub use store::{InMemorySessionBackend, SessionBackend, SessionStore};
