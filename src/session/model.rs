//! Per-user session data: language, profile, dialogue state and answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chat-platform identity of a user. Sessions are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interface language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Ru,
    Kz,
}

impl Language {
    /// Parse a language code (`ru`, `kz`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Self::Ru),
            "kz" | "kk" => Some(Self::Kz),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Kz => "kz",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The user's self-declared category. Determines which menu branches
/// are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Parent,
    Expectant,
    Specialist,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Self::Parent, Self::Expectant, Self::Specialist];

    /// Parse a profile code. Accepts both the internal names and the
    /// short codes used on buttons (`mama`, `pregnant`, `doctor`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "parent" | "mama" => Some(Self::Parent),
            "expectant" | "pregnant" => Some(Self::Expectant),
            "specialist" | "doctor" => Some(Self::Specialist),
            _ => None,
        }
    }

    /// Short code carried in button callback data.
    pub fn button_code(&self) -> &'static str {
        match self {
            Self::Parent => "mama",
            Self::Expectant => "pregnant",
            Self::Specialist => "doctor",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Parent => "parent",
            Self::Expectant => "expectant",
            Self::Specialist => "specialist",
        };
        f.write_str(s)
    }
}

/// Where the user is in the conversation.
///
/// `Unauthenticated → LanguageChosen → ProfileChosen ⇄ InQuestionnaire`.
/// There is no terminal state; a finished questionnaire returns to idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Unauthenticated,
    LanguageChosen,
    ProfileChosen,
    /// Zero-based index into the questionnaire's step list.
    InQuestionnaire { step: usize },
}

impl DialogueState {
    pub fn is_in_questionnaire(&self) -> bool {
        matches!(self, Self::InQuestionnaire { .. })
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::LanguageChosen => write!(f, "language_chosen"),
            Self::ProfileChosen => write!(f, "profile_chosen"),
            Self::InQuestionnaire { step } => write!(f, "in_questionnaire({step})"),
        }
    }
}

/// Conversational state of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub state: DialogueState,
    /// Collected answers keyed by step index, so iteration follows step order.
    #[serde(default)]
    pub answers: BTreeMap<usize, String>,
}

impl Session {
    /// Effective language; `ru` until one has been chosen.
    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    /// Current questionnaire step, if a questionnaire is active.
    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            DialogueState::InQuestionnaire { step } => Some(step),
            _ => None,
        }
    }

    /// The state the user idles in outside of a questionnaire, derived from
    /// what has been chosen so far.
    pub fn idle_state(&self) -> DialogueState {
        if self.profile.is_some() {
            DialogueState::ProfileChosen
        } else if self.language.is_some() {
            DialogueState::LanguageChosen
        } else {
            DialogueState::Unauthenticated
        }
    }

    /// Drop any in-progress questionnaire and return to the idle state.
    pub fn leave_questionnaire(mut self) -> Self {
        self.answers.clear();
        self.state = self.idle_state();
        self
    }
}
