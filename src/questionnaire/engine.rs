//! Questionnaire engine: ordered steps, answer validation, progress.
//!
//! All operations are pure functions over [`Session`]; the router decides
//! when to persist the returned session.

use serde::Serialize;

use crate::content;
use crate::error::{ConfigError, DialogueError};
use crate::session::{DialogueState, Language, Session};

use super::steps::{Rejection, StepDefinition, default_steps};

/// `current / total`, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        self.current as f64 / self.total as f64
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// The question to show for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPrompt {
    pub key: &'static str,
    pub text: String,
    pub progress: Progress,
    pub language: Language,
}

impl StepPrompt {
    /// Prompt text followed by the progress line.
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}",
            self.text,
            content::progress_line(self.language, self.progress.current, self.progress.total)
        )
    }
}

/// Ordered answers ready for the record store. Always one value per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub values: Vec<String>,
}

impl SubmissionRecord {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Input refused; the session is unchanged and the same step is re-asked.
    Rejected(Rejection),
    /// Answer stored, next step is due.
    Advanced { session: Session, prompt: StepPrompt },
    /// Last answer stored; the questionnaire is finished and cleared.
    Completed {
        session: Session,
        record: SubmissionRecord,
    },
}

/// A fixed, ordered list of steps.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    steps: Vec<StepDefinition>,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self {
            steps: default_steps(true),
        }
    }
}

impl Questionnaire {
    /// Build from a step list. Fails on an empty list or duplicate keys.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "questionnaire.steps".into(),
                message: "at least one step is required".into(),
            });
        }
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|s| s.key == step.key) {
                return Err(ConfigError::InvalidValue {
                    key: "questionnaire.steps".into(),
                    message: format!("duplicate step key {}", step.key),
                });
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Column headers, in step order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.column).collect()
    }

    /// Enter the first step with no answers. Any earlier progress is lost.
    pub fn start(&self, mut session: Session) -> Session {
        session.answers.clear();
        session.state = DialogueState::InQuestionnaire { step: 0 };
        session
    }

    /// Prompt for the session's current step.
    pub fn current_prompt(&self, session: &Session) -> Result<StepPrompt, DialogueError> {
        let step = self.active_step(session)?;
        Ok(self.prompt_at(step, session.language()))
    }

    /// Validate and store an answer for the current step.
    pub fn submit_answer(
        &self,
        session: &Session,
        raw: &str,
    ) -> Result<AnswerOutcome, DialogueError> {
        let step = self.active_step(session)?;
        let answer = raw.trim();
        if answer.is_empty() {
            return Ok(AnswerOutcome::Rejected(Rejection::Empty));
        }
        if let Some(validator) = &self.steps[step].validator {
            if let Err(rejection) = validator.check(answer) {
                return Ok(AnswerOutcome::Rejected(rejection));
            }
        }

        let mut next = session.clone();
        next.answers.insert(step, answer.to_string());

        let following = step + 1;
        if following < self.steps.len() {
            next.state = DialogueState::InQuestionnaire { step: following };
            let prompt = self.prompt_at(following, next.language());
            return Ok(AnswerOutcome::Advanced {
                session: next,
                prompt,
            });
        }

        let record = self.build_record(&next);
        Ok(AnswerOutcome::Completed {
            session: next.leave_questionnaire(),
            record,
        })
    }

    fn active_step(&self, session: &Session) -> Result<usize, DialogueError> {
        let step = session.current_step().ok_or_else(|| {
            DialogueError::InvalidState(format!(
                "no active questionnaire (state {})",
                session.state
            ))
        })?;
        if step >= self.steps.len() {
            return Err(DialogueError::InvalidState(format!(
                "step {step} out of range 0..{}",
                self.steps.len()
            )));
        }
        Ok(step)
    }

    fn prompt_at(&self, step: usize, language: Language) -> StepPrompt {
        let definition = &self.steps[step];
        StepPrompt {
            key: definition.key,
            text: definition.prompt.get(language).to_string(),
            progress: Progress {
                current: step + 1,
                total: self.steps.len(),
            },
            language,
        }
    }

    fn build_record(&self, session: &Session) -> SubmissionRecord {
        let values = (0..self.steps.len())
            .map(|i| session.answers.get(&i).cloned().unwrap_or_default())
            .collect();
        SubmissionRecord { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Localized;
    use crate::questionnaire::steps::Validator;
    use crate::session::Profile;

    fn fresh() -> (Questionnaire, Session) {
        let q = Questionnaire::default();
        let session = Session {
            language: Some(Language::Ru),
            profile: Some(Profile::Parent),
            state: DialogueState::ProfileChosen,
            ..Default::default()
        };
        (q, session)
    }

    fn answer_for(step: usize) -> String {
        if step == 2 {
            "05.03.2024".to_string()
        } else {
            format!("answer {step}")
        }
    }

    fn advance(q: &Questionnaire, session: &Session, text: &str) -> Session {
        match q.submit_answer(session, text).unwrap() {
            AnswerOutcome::Advanced { session, .. } => session,
            other => panic!("expected Advanced, got {other:?}"),
        }
    }

    #[test]
    fn start_enters_first_step_and_clears_answers() {
        let (q, mut session) = fresh();
        session.answers.insert(4, "stale".into());
        let session = q.start(session);
        assert_eq!(session.current_step(), Some(0));
        assert!(session.answers.is_empty());
    }

    #[test]
    fn current_prompt_outside_questionnaire_is_invalid_state() {
        let (q, session) = fresh();
        assert!(matches!(
            q.current_prompt(&session),
            Err(DialogueError::InvalidState(_))
        ));
    }

    #[test]
    fn current_prompt_reports_progress() {
        let (q, session) = fresh();
        let session = q.start(session);
        let prompt = q.current_prompt(&session).unwrap();
        assert_eq!(prompt.key, "name");
        assert_eq!(prompt.progress, Progress { current: 1, total: 7 });
        assert_eq!(prompt.render(), "📝 Ваше имя?\n\n📊 Шаг 1 из 7");
    }

    #[test]
    fn whitespace_answer_is_rejected_without_mutation() {
        let (q, session) = fresh();
        let session = q.start(session);
        for input in ["", "   ", "\n\t"] {
            assert_eq!(
                q.submit_answer(&session, input).unwrap(),
                AnswerOutcome::Rejected(Rejection::Empty)
            );
        }
        assert_eq!(session.current_step(), Some(0));
        assert!(session.answers.is_empty());
    }

    #[test]
    fn advanced_stores_trimmed_answer() {
        let (q, session) = fresh();
        let session = q.start(session);
        match q.submit_answer(&session, "  Aigerim \n").unwrap() {
            AnswerOutcome::Advanced { session, prompt } => {
                assert_eq!(session.answers.get(&0).map(String::as_str), Some("Aigerim"));
                assert_eq!(session.current_step(), Some(1));
                assert_eq!(prompt.key, "location");
                assert_eq!(prompt.progress.current, 2);
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
    }

    #[test]
    fn date_step_validates_format() {
        let (q, session) = fresh();
        let mut session = q.start(session);
        session = advance(&q, &session, "Aigerim");
        session = advance(&q, &session, "Almaty");
        assert_eq!(session.current_step(), Some(2));

        for bad in ["2024-01-01", "31/12/2024"] {
            assert_eq!(
                q.submit_answer(&session, bad).unwrap(),
                AnswerOutcome::Rejected(Rejection::InvalidDate)
            );
        }
        let session = advance(&q, &session, "05.03.2024");
        assert_eq!(session.current_step(), Some(3));
    }

    #[test]
    fn completing_all_steps_yields_ordered_record_and_clears_session() {
        let (q, session) = fresh();
        let mut session = q.start(session);
        let total = q.total_steps();
        let mut completed = 0;
        let mut record = None;

        for step in 0..total {
            match q.submit_answer(&session, &answer_for(step)).unwrap() {
                AnswerOutcome::Advanced { session: next, .. } => session = next,
                AnswerOutcome::Completed { session: next, record: r } => {
                    completed += 1;
                    session = next;
                    record = Some(r);
                }
                AnswerOutcome::Rejected(r) => panic!("step {step} rejected: {r:?}"),
            }
        }

        assert_eq!(completed, 1);
        let record = record.unwrap();
        assert_eq!(record.len(), total);
        assert_eq!(record.values[0], "answer 0");
        assert_eq!(record.values[2], "05.03.2024");
        assert_eq!(session.current_step(), None);
        assert!(session.answers.is_empty());
        assert_eq!(session.state, DialogueState::ProfileChosen);
    }

    #[test]
    fn missing_answers_serialize_as_empty_strings() {
        let (q, session) = fresh();
        let mut session = q.start(session);
        // Jump straight to the last step, as if earlier answers were lost.
        session.state = DialogueState::InQuestionnaire { step: 6 };
        session.answers.insert(0, "Dana".into());

        match q.submit_answer(&session, "yes").unwrap() {
            AnswerOutcome::Completed { record, .. } => {
                assert_eq!(record.len(), 7);
                assert_eq!(record.values[0], "Dana");
                assert_eq!(record.values[1], "");
                assert_eq!(record.values[6], "yes");
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_step_is_invalid_state() {
        let (q, mut session) = fresh();
        session.state = DialogueState::InQuestionnaire { step: 7 };
        assert!(q.submit_answer(&session, "text").is_err());
        assert!(q.current_prompt(&session).is_err());
    }

    #[test]
    fn columns_follow_step_order() {
        let (q, _) = fresh();
        let columns = q.columns();
        assert_eq!(columns.len(), q.total_steps());
        assert_eq!(columns[0], "Name");
        assert_eq!(columns[2], "DateOfEvent");
        assert_eq!(columns[6], "ReadinessToProceed");
    }

    #[test]
    fn new_rejects_empty_and_duplicate_steps() {
        assert!(Questionnaire::new(vec![]).is_err());

        let step = StepDefinition::new("name", "Name", Localized::new("?", "?"));
        assert!(Questionnaire::new(vec![step.clone(), step.clone()]).is_err());
        assert!(Questionnaire::new(vec![step]).is_ok());
    }

    #[test]
    fn validators_come_from_the_step_table() {
        let steps = vec![
            StepDefinition::new("city", "City", Localized::new("Город?", "Қала?"))
                .with_validator(Validator::MaxChars(6)),
        ];
        let q = Questionnaire::new(steps).unwrap();
        let session = q.start(Session::default());
        assert_eq!(
            q.submit_answer(&session, "Усть-Каменогорск").unwrap(),
            AnswerOutcome::Rejected(Rejection::TooLong { max: 6 })
        );
        assert!(matches!(
            q.submit_answer(&session, "Атырау").unwrap(),
            AnswerOutcome::Completed { .. }
        ));
    }

    #[test]
    fn progress_is_relative_to_first_step() {
        let (q, session) = fresh();
        let mut session = q.start(session);
        for step in 0..q.total_steps() - 1 {
            let prompt = q.current_prompt(&session).unwrap();
            assert_eq!(prompt.progress.current, step + 1);
            assert_eq!(prompt.progress.total, 7);
            session = advance(&q, &session, &answer_for(step));
        }
        let last = q.current_prompt(&session).unwrap();
        assert!((last.progress.fraction() - 1.0).abs() < f64::EPSILON);
    }
}
