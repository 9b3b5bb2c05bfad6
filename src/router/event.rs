//! Inbound events and outgoing prompts exchanged with the transport.

use serde::Serialize;

use crate::content;
use crate::menu::{ActionId, MenuOption};
use crate::session::{Language, Profile};

const LANGUAGE_PREFIX: &str = "lang_";
const PROFILE_PREFIX: &str = "profile_";

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start`.
    Start,
    LanguageSelect(Language),
    ProfileSelect(Profile),
    MenuAction(ActionId),
    /// Free text typed by the user.
    TextAnswer(String),
    /// A button or command the bot does not know.
    Unrecognized(String),
}

impl InboundEvent {
    /// Decode button callback data (`lang_ru`, `profile_mama`, `courses`, ...).
    pub fn from_callback_data(data: &str) -> Self {
        if let Some(code) = data.strip_prefix(LANGUAGE_PREFIX) {
            if let Some(language) = Language::from_code(code) {
                return Self::LanguageSelect(language);
            }
        } else if let Some(code) = data.strip_prefix(PROFILE_PREFIX) {
            if let Some(profile) = Profile::from_code(code) {
                return Self::ProfileSelect(profile);
            }
        } else if let Some(action) = ActionId::parse(data) {
            return Self::MenuAction(action);
        }
        Self::Unrecognized(data.to_string())
    }

    /// Decode a typed message. Slash commands never count as answers.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Self::TextAnswer(text.to_string());
        }
        // `/start@MyBot payload` → `/start`
        let command = trimmed
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match command.as_str() {
            "/start" => Self::Start,
            "/menu" => Self::MenuAction(ActionId::MainMenu),
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    /// Short name for logs. Never includes user-typed text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::LanguageSelect(_) => "language_select",
            Self::ProfileSelect(_) => "profile_select",
            Self::MenuAction(_) => "menu_action",
            Self::TextAnswer(_) => "text_answer",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// An inline button. `callback_data` comes back as an [`InboundEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl Button {
    pub fn action(action: ActionId, language: Language) -> Self {
        Self {
            label: action.label(language).to_string(),
            callback_data: action.as_str().to_string(),
        }
    }

    pub fn language(language: Language) -> Self {
        let label = match language {
            Language::Ru => content::LANGUAGE_RU_LABEL,
            Language::Kz => content::LANGUAGE_KZ_LABEL,
        };
        Self {
            label: label.to_string(),
            callback_data: format!("{LANGUAGE_PREFIX}{}", language.code()),
        }
    }

    pub fn profile(profile: Profile, language: Language) -> Self {
        let label = match profile {
            Profile::Parent => content::PROFILE_PARENT_LABEL,
            Profile::Expectant => content::PROFILE_EXPECTANT_LABEL,
            Profile::Specialist => content::PROFILE_SPECIALIST_LABEL,
        };
        Self {
            label: label.get(language).to_string(),
            callback_data: format!("{PROFILE_PREFIX}{}", profile.button_code()),
        }
    }
}

impl From<&MenuOption> for Button {
    fn from(option: &MenuOption) -> Self {
        Self {
            label: option.label.clone(),
            callback_data: option.action.as_str().to_string(),
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// All buttons on a single row.
    pub fn row(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: vec![buttons.into_iter().collect()],
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message to deliver to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub text: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl Prompt {
    pub fn text(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_decoding() {
        assert_eq!(
            InboundEvent::from_callback_data("lang_kz"),
            InboundEvent::LanguageSelect(Language::Kz)
        );
        assert_eq!(
            InboundEvent::from_callback_data("profile_pregnant"),
            InboundEvent::ProfileSelect(Profile::Expectant)
        );
        assert_eq!(
            InboundEvent::from_callback_data("about_doctor"),
            InboundEvent::MenuAction(ActionId::AboutDoctor)
        );
        assert_eq!(
            InboundEvent::from_callback_data("menu"),
            InboundEvent::MenuAction(ActionId::MainMenu)
        );
    }

    #[test]
    fn unknown_callback_data_is_unrecognized() {
        for data in ["lang_en", "profile_nurse", "📚 Курсы", ""] {
            assert_eq!(
                InboundEvent::from_callback_data(data),
                InboundEvent::Unrecognized(data.to_string())
            );
        }
    }

    #[test]
    fn buttons_roundtrip_through_callback_data() {
        for language in [Language::Ru, Language::Kz] {
            let b = Button::language(language);
            assert_eq!(
                InboundEvent::from_callback_data(&b.callback_data),
                InboundEvent::LanguageSelect(language)
            );
            for profile in Profile::ALL {
                let b = Button::profile(profile, language);
                assert_eq!(
                    InboundEvent::from_callback_data(&b.callback_data),
                    InboundEvent::ProfileSelect(profile)
                );
            }
            for action in ActionId::ALL {
                let b = Button::action(action, language);
                assert_eq!(
                    InboundEvent::from_callback_data(&b.callback_data),
                    InboundEvent::MenuAction(action)
                );
            }
        }
    }

    #[test]
    fn text_decoding() {
        assert_eq!(InboundEvent::from_text("/start"), InboundEvent::Start);
        assert_eq!(InboundEvent::from_text("/start@MyHelperBot ref42"), InboundEvent::Start);
        assert_eq!(
            InboundEvent::from_text("/menu"),
            InboundEvent::MenuAction(ActionId::MainMenu)
        );
        assert_eq!(
            InboundEvent::from_text("/help"),
            InboundEvent::Unrecognized("/help".into())
        );
        assert_eq!(
            InboundEvent::from_text(" Алматы "),
            InboundEvent::TextAnswer(" Алматы ".into())
        );
    }

    #[test]
    fn keyboard_layouts() {
        let column = Keyboard::column([
            Button::action(ActionId::Form, Language::Ru),
            Button::action(ActionId::MainMenu, Language::Ru),
        ]);
        assert_eq!(column.rows.len(), 2);
        assert_eq!(column.buttons().count(), 2);

        let row = Keyboard::row([Button::language(Language::Ru), Button::language(Language::Kz)]);
        assert_eq!(row.rows.len(), 1);
        assert_eq!(row.rows[0][1].callback_data, "lang_kz");
    }
}
