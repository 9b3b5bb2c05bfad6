//! Step definitions and the validator table.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::content::{self, Localized};
use crate::session::Language;

/// `dd.mm.yyyy`, digits only. Calendar validity is checked separately.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("valid date regex"));

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Why an answer was not accepted. The step must be asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace-only input.
    Empty,
    /// Not a real calendar date in `dd.mm.yyyy` form.
    InvalidDate,
    /// Longer than the step allows.
    TooLong { max: usize },
}

impl Rejection {
    /// Corrective message shown to the user.
    pub fn message(&self, language: Language) -> String {
        match self {
            Self::Empty => content::REJECT_EMPTY.get(language).to_string(),
            Self::InvalidDate => content::REJECT_DATE.get(language).to_string(),
            Self::TooLong { max } => {
                format!("{} {max}", content::REJECT_TOO_LONG.get(language))
            }
        }
    }
}

/// Structural check applied to a trimmed, non-empty answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Calendar date written as `dd.mm.yyyy`.
    Date,
    /// At most this many characters.
    MaxChars(usize),
}

impl Validator {
    pub fn check(&self, answer: &str) -> Result<(), Rejection> {
        match self {
            Self::Date => {
                if !DATE_SHAPE.is_match(answer) {
                    return Err(Rejection::InvalidDate);
                }
                NaiveDate::parse_from_str(answer, DATE_FORMAT)
                    .map(|_| ())
                    .map_err(|_| Rejection::InvalidDate)
            }
            Self::MaxChars(max) => {
                if answer.chars().count() > *max {
                    Err(Rejection::TooLong { max: *max })
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// One question of the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    /// Stable identifier, e.g. `date_of_event`.
    pub key: &'static str,
    /// Column header in the record store.
    pub column: &'static str,
    pub prompt: Localized,
    pub validator: Option<Validator>,
}

impl StepDefinition {
    pub const fn new(key: &'static str, column: &'static str, prompt: Localized) -> Self {
        Self {
            key,
            column,
            prompt,
            validator: None,
        }
    }

    pub const fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// The seven intake steps, in order. `date_validation` toggles the
/// `dd.mm.yyyy` check on the date step.
pub fn default_steps(date_validation: bool) -> Vec<StepDefinition> {
    let date_step = StepDefinition::new(
        "date_of_event",
        "DateOfEvent",
        Localized::new(
            "📅 Дата родов? (ДД.ММ.ГГГГ)",
            "📅 Босану күні? (КК.АА.ЖЖЖЖ)",
        ),
    );
    let date_step = if date_validation {
        date_step.with_validator(Validator::Date)
    } else {
        date_step
    };

    vec![
        StepDefinition::new(
            "name",
            "Name",
            Localized::new("📝 Ваше имя?", "📝 Атыңыз?"),
        ),
        StepDefinition::new(
            "location",
            "Location",
            Localized::new("🌍 Город / страна?", "🌍 Қала / ел?"),
        ),
        date_step,
        StepDefinition::new(
            "concern",
            "Concern",
            Localized::new("🤔 Что вас беспокоит?", "🤔 Сізді не мазалайды?"),
        ),
        StepDefinition::new(
            "preferred_format",
            "PreferredFormat",
            Localized::new("📌 Онлайн / оффлайн / выезд?", "📌 Онлайн / офлайн / үйге бару?"),
        ),
        StepDefinition::new(
            "prior_attempts",
            "PriorAttempts",
            Localized::new("🔄 Что уже пробовали?", "🔄 Не істеп көрдіңіз?"),
        ),
        StepDefinition::new(
            "readiness",
            "ReadinessToProceed",
            Localized::new(
                "💬 Готовы к работе и оплате?",
                "💬 Жұмысқа және төлемге дайынсыз ба?",
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_accepts_dd_mm_yyyy() {
        assert_eq!(Validator::Date.check("05.03.2024"), Ok(()));
        assert_eq!(Validator::Date.check("29.02.2024"), Ok(()));
    }

    #[test]
    fn date_rejects_other_formats() {
        for input in ["2024-01-01", "31/12/2024", "5.3.2024", "05.03.24", "05.03.2024 ", "завтра"] {
            assert_eq!(
                Validator::Date.check(input),
                Err(Rejection::InvalidDate),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn date_rejects_impossible_calendar_days() {
        assert_eq!(Validator::Date.check("31.02.2024"), Err(Rejection::InvalidDate));
        assert_eq!(Validator::Date.check("29.02.2023"), Err(Rejection::InvalidDate));
        assert_eq!(Validator::Date.check("01.13.2024"), Err(Rejection::InvalidDate));
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let v = Validator::MaxChars(5);
        assert_eq!(v.check("Алмат"), Ok(()));
        assert_eq!(v.check("Алматы"), Err(Rejection::TooLong { max: 5 }));
    }

    #[test]
    fn default_steps_layout() {
        let steps = default_steps(true);
        let columns: Vec<&str> = steps.iter().map(|s| s.column).collect();
        assert_eq!(
            columns,
            vec![
                "Name",
                "Location",
                "DateOfEvent",
                "Concern",
                "PreferredFormat",
                "PriorAttempts",
                "ReadinessToProceed"
            ]
        );
        let validated: Vec<&str> = steps
            .iter()
            .filter(|s| s.validator.is_some())
            .map(|s| s.key)
            .collect();
        assert_eq!(validated, vec!["date_of_event"]);
    }

    #[test]
    fn date_validation_can_be_disabled() {
        assert!(default_steps(false).iter().all(|s| s.validator.is_none()));
    }

    #[test]
    fn rejection_messages_are_localized() {
        assert!(Rejection::InvalidDate.message(Language::Ru).contains("ДД.ММ.ГГГГ"));
        assert!(Rejection::InvalidDate.message(Language::Kz).contains("КК.АА.ЖЖЖЖ"));
        assert!(Rejection::TooLong { max: 10 }.message(Language::Ru).ends_with("10"));
    }
}
