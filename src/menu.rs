//! Menu resolver — which navigation options a profile sees.
//!
//! Options carry a stable [`ActionId`]; labels are looked up per language
//! and never used for routing.

use serde::{Deserialize, Serialize};

use crate::content::Localized;
use crate::session::{Language, Profile};

/// Stable identifier of a menu action, carried in button callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Courses,
    Services,
    AboutDoctor,
    Doula,
    Mentorship,
    Form,
    Contacts,
    #[serde(rename = "menu")]
    MainMenu,
}

impl ActionId {
    pub const ALL: [ActionId; 8] = [
        Self::Courses,
        Self::Services,
        Self::AboutDoctor,
        Self::Doula,
        Self::Mentorship,
        Self::Form,
        Self::Contacts,
        Self::MainMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Services => "services",
            Self::AboutDoctor => "about_doctor",
            Self::Doula => "doula",
            Self::Mentorship => "mentorship",
            Self::Form => "form",
            Self::Contacts => "contacts",
            Self::MainMenu => "menu",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == id)
    }

    /// Button label in the given language.
    pub fn label(&self, language: Language) -> &'static str {
        let text = match self {
            Self::Courses => Localized::new("📚 Курсы", "📚 Курстар"),
            Self::Services => Localized::new("🩺 Услуги", "🩺 Қызметтер"),
            Self::AboutDoctor => Localized::new("👩‍⚕ О враче", "👩‍⚕ Дәрігер туралы"),
            Self::Doula => Localized::new("🤱 Подготовка к родам", "🤱 Босануға дайындық"),
            Self::Mentorship => Localized::new("🌟 Наставничество", "🌟 Тәлімгерлік"),
            Self::Form => Localized::new("📥 Анкета", "📥 Сауалнама"),
            Self::Contacts => Localized::new("📍 Контакты", "📍 Байланыс"),
            Self::MainMenu => Localized::new("📋 Главное меню", "📋 Басты мәзір"),
        };
        text.get(language)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub label: String,
    pub action: ActionId,
}

impl MenuOption {
    pub fn new(action: ActionId, language: Language) -> Self {
        Self {
            label: action.label(language).to_string(),
            action,
        }
    }
}

/// Per-profile menu contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTable {
    pub parent: Vec<ActionId>,
    pub expectant: Vec<ActionId>,
    pub specialist: Vec<ActionId>,
    /// Shown when no profile has been chosen.
    pub fallback: Vec<ActionId>,
}

impl Default for MenuTable {
    fn default() -> Self {
        use ActionId::*;
        Self {
            parent: vec![Courses, Services, AboutDoctor, Form, Contacts],
            expectant: vec![Courses, Doula, AboutDoctor, Form, Contacts],
            specialist: vec![Mentorship, Contacts],
            fallback: vec![Form],
        }
    }
}

impl MenuTable {
    fn actions_for(&self, profile: Option<Profile>) -> &[ActionId] {
        match profile {
            Some(Profile::Parent) => &self.parent,
            Some(Profile::Expectant) => &self.expectant,
            Some(Profile::Specialist) => &self.specialist,
            None => &self.fallback,
        }
    }
}

/// Resolves the top-level menu for a profile. Pure and infallible.
#[derive(Debug, Clone, Default)]
pub struct MenuResolver {
    table: MenuTable,
}

impl MenuResolver {
    pub fn new(table: MenuTable) -> Self {
        Self { table }
    }

    /// Ordered menu options for `profile` in `language`.
    pub fn resolve(&self, profile: Option<Profile>, language: Language) -> Vec<MenuOption> {
        let actions = self.table.actions_for(profile);
        if actions.is_empty() {
            return vec![MenuOption::new(ActionId::Form, language)];
        }
        actions
            .iter()
            .map(|&action| MenuOption::new(action, language))
            .collect()
    }
}
