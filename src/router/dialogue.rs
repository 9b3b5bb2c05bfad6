//! Dialogue router: applies one inbound event to a user's session.
//!
//! The transition itself runs inside [`SessionStore::update`], so events for
//! one user are strictly serialized. The record store is called after the
//! session is written back; a slow spreadsheet never holds the user's lock.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channels::Messenger;
use crate::content;
use crate::error::{ConfigError, DialogueError};
use crate::menu::{ActionId, MenuResolver};
use crate::questionnaire::{AnswerOutcome, Questionnaire, SubmissionRecord, default_steps};
use crate::records::RecordStore;
use crate::session::{DialogueState, Language, Profile, Session, SessionStore, UserId};

use super::event::{Button, InboundEvent, Keyboard, Prompt};

/// Conversation knobs that are not part of the questionnaire itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Profiles that get the doctor's introduction after selection.
    pub intro_profiles: Vec<Profile>,
    /// Check the date step for `DD.MM.YYYY`.
    pub date_validation: bool,
}

impl FlowConfig {
    /// The built-in seven-step form, with date validation as configured.
    pub fn questionnaire(&self) -> Result<Questionnaire, ConfigError> {
        Questionnaire::new(default_steps(self.date_validation))
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            intro_profiles: vec![Profile::Parent, Profile::Expectant],
            date_validation: true,
        }
    }
}

/// A finished questionnaire waiting to be persisted.
struct PendingSubmission {
    record: SubmissionRecord,
    language: Language,
    profile: Option<Profile>,
}

/// Output of a pure transition.
#[derive(Default)]
struct Transition {
    prompts: Vec<Prompt>,
    submission: Option<PendingSubmission>,
}

impl Transition {
    fn reply(prompt: Prompt) -> Self {
        Self {
            prompts: vec![prompt],
            submission: None,
        }
    }

    fn push(&mut self, prompt: Prompt) {
        self.prompts.push(prompt);
    }
}

pub struct DialogueRouter {
    sessions: Arc<SessionStore>,
    menus: MenuResolver,
    questionnaire: Questionnaire,
    records: Arc<dyn RecordStore>,
    intro_profiles: Vec<Profile>,
}

impl DialogueRouter {
    pub fn new(
        sessions: Arc<SessionStore>,
        menus: MenuResolver,
        questionnaire: Questionnaire,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            sessions,
            menus,
            questionnaire,
            records,
            intro_profiles: FlowConfig::default().intro_profiles,
        }
    }

    /// Router with the default menus and the built-in seven-step form.
    pub fn from_config(
        config: &FlowConfig,
        sessions: Arc<SessionStore>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(sessions, MenuResolver::default(), config.questionnaire()?, records)
            .with_intro_profiles(config.intro_profiles.clone()))
    }

    pub fn with_intro_profiles(mut self, profiles: Vec<Profile>) -> Self {
        self.intro_profiles = profiles;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Apply `event` for `user_id` and return the prompts to send, in order.
    pub async fn handle(&self, user_id: &UserId, event: InboundEvent) -> Vec<Prompt> {
        debug!(user_id = %user_id, event = event.kind(), "Routing event");

        let transition = self
            .sessions
            .update(user_id, |session| self.transition(user_id, session, event))
            .await;

        let mut prompts = transition.prompts;
        if let Some(pending) = transition.submission {
            prompts.extend(self.persist(user_id, pending).await);
        }
        prompts
    }

    /// [`handle`](Self::handle), then deliver the prompts through `messenger`.
    ///
    /// Delivery stops at the first failed send so the user never sees a
    /// later prompt without the earlier one.
    pub async fn handle_and_send(
        &self,
        messenger: &dyn Messenger,
        user_id: &UserId,
        event: InboundEvent,
    ) {
        for prompt in self.handle(user_id, event).await {
            if let Err(e) = messenger.send_prompt(user_id, &prompt).await {
                warn!(user_id = %user_id, error = %e, "Failed to deliver prompt");
                break;
            }
        }
    }

    fn transition(
        &self,
        user_id: &UserId,
        session: Session,
        event: InboundEvent,
    ) -> (Session, Transition) {
        match event {
            InboundEvent::Start => {
                let session = session.leave_questionnaire();
                let keyboard =
                    Keyboard::row([Button::language(Language::Ru), Button::language(Language::Kz)]);
                let prompt =
                    Prompt::text(content::WELCOME, session.language()).with_keyboard(keyboard);
                (session, Transition::reply(prompt))
            }

            InboundEvent::LanguageSelect(language) => {
                let mut session = session;
                session.answers.clear();
                session.language = Some(language);
                session.profile = None;
                session.state = DialogueState::LanguageChosen;
                info!(user_id = %user_id, language = %language, "Language selected");
                (session, Transition::reply(self.profile_prompt(language)))
            }

            InboundEvent::ProfileSelect(profile) => {
                let mut session = session;
                session.answers.clear();
                session.profile = Some(profile);
                session.state = DialogueState::ProfileChosen;
                let language = session.language();
                info!(user_id = %user_id, profile = %profile, "Profile selected");

                let mut out = Transition::reply(self.menu_prompt(
                    content::PROFILE_SAVED.get(language),
                    Some(profile),
                    language,
                ));
                if self.intro_profiles.contains(&profile) {
                    out.push(
                        Prompt::text(content::INTRO.get(language), language).with_keyboard(
                            Keyboard::column(
                                content::INTRO_BUTTONS
                                    .iter()
                                    .map(|a| Button::action(*a, language)),
                            ),
                        ),
                    );
                }
                (session, out)
            }

            InboundEvent::MenuAction(ActionId::Form) => {
                let session = self.questionnaire.start(session);
                let language = session.language();
                info!(user_id = %user_id, "Questionnaire started");
                let mut out =
                    Transition::reply(Prompt::text(content::FORM_START.get(language), language));
                match self.questionnaire.current_prompt(&session) {
                    Ok(step) => out.push(Prompt::text(step.render(), language)),
                    Err(e) => return self.recover(user_id, session, e),
                }
                (session, out)
            }

            InboundEvent::MenuAction(ActionId::MainMenu) => {
                if session.state.is_in_questionnaire() {
                    info!(user_id = %user_id, state = %session.state, "Questionnaire abandoned");
                }
                let session = session.leave_questionnaire();
                let language = session.language();
                let prompt =
                    self.menu_prompt(content::MAIN_MENU.get(language), session.profile, language);
                (session, Transition::reply(prompt))
            }

            InboundEvent::MenuAction(action) => {
                let language = session.language();
                let prompt = match content::page(action) {
                    Some(page) => Prompt::text(page.text.get(language), language).with_keyboard(
                        Keyboard::column(page.buttons.iter().map(|a| Button::action(*a, language))),
                    ),
                    None => self.fallback(&session),
                };
                (session, Transition::reply(prompt))
            }

            InboundEvent::TextAnswer(raw) if session.state.is_in_questionnaire() => {
                self.answer(user_id, session, &raw)
            }

            InboundEvent::Unrecognized(_) if session.state.is_in_questionnaire() => {
                let mut out = Transition::reply(self.fallback(&session));
                match self.questionnaire.current_prompt(&session) {
                    Ok(step) => out.push(Prompt::text(step.render(), session.language())),
                    Err(e) => return self.recover(user_id, session, e),
                }
                (session, out)
            }

            InboundEvent::TextAnswer(_) | InboundEvent::Unrecognized(_) => {
                let prompt = self.fallback(&session);
                (session, Transition::reply(prompt))
            }
        }
    }

    fn answer(&self, user_id: &UserId, session: Session, raw: &str) -> (Session, Transition) {
        let language = session.language();
        match self.questionnaire.submit_answer(&session, raw) {
            Ok(AnswerOutcome::Rejected(rejection)) => {
                debug!(user_id = %user_id, state = %session.state, ?rejection, "Answer rejected");
                let mut text = rejection.message(language);
                if let Ok(step) = self.questionnaire.current_prompt(&session) {
                    text = format!("{text}\n\n{}", step.render());
                }
                (session, Transition::reply(Prompt::text(text, language)))
            }
            Ok(AnswerOutcome::Advanced { session, prompt }) => {
                (session, Transition::reply(Prompt::text(prompt.render(), language)))
            }
            Ok(AnswerOutcome::Completed { session, record }) => {
                info!(user_id = %user_id, answers = record.len(), "Questionnaire completed");
                let submission = PendingSubmission {
                    record,
                    language,
                    profile: session.profile,
                };
                let out = Transition {
                    prompts: Vec::new(),
                    submission: Some(submission),
                };
                (session, out)
            }
            Err(e) => self.recover(user_id, session, e),
        }
    }

    /// A session that contradicts the questionnaire (e.g. a step index from
    /// a longer form) is put back to idle instead of being left stuck.
    fn recover(
        &self,
        user_id: &UserId,
        session: Session,
        err: DialogueError,
    ) -> (Session, Transition) {
        error!(user_id = %user_id, error = %err, "Inconsistent dialogue state, resetting questionnaire");
        let session = session.leave_questionnaire();
        let prompt = self.fallback(&session);
        (session, Transition::reply(prompt))
    }

    async fn persist(&self, user_id: &UserId, pending: PendingSubmission) -> Vec<Prompt> {
        let language = pending.language;
        let notice = match self.records.append_record(&pending.record.values).await {
            Ok(()) => {
                info!(user_id = %user_id, store = self.records.name(), "Submission saved");
                content::FORM_DONE.get(language)
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    store = self.records.name(),
                    error = %e,
                    "Failed to save submission"
                );
                content::FORM_NOT_SAVED.get(language)
            }
        };
        // A form started before onboarding finished ends at the profile choice.
        let next = match pending.profile {
            Some(profile) => {
                self.menu_prompt(content::MAIN_MENU.get(language), Some(profile), language)
            }
            None => self.profile_prompt(language),
        };
        vec![Prompt::text(notice, language), next]
    }

    fn profile_prompt(&self, language: Language) -> Prompt {
        Prompt::text(content::PROFILE_PROMPT.get(language), language).with_keyboard(
            Keyboard::column(Profile::ALL.iter().map(|p| Button::profile(*p, language))),
        )
    }

    fn menu_prompt(&self, text: &str, profile: Option<Profile>, language: Language) -> Prompt {
        let options = self.menus.resolve(profile, language);
        Prompt::text(text, language).with_keyboard(Keyboard::column(options.iter().map(Button::from)))
    }

    fn fallback(&self, session: &Session) -> Prompt {
        let language = session.language();
        self.menu_prompt(content::FALLBACK.get(language), session.profile, language)
    }
}
