//! Kiosk dialogue state machine
//!
//! [`DialogueEngine::handle_turn`] maps a session's [`DialogueContext`] and
//! one utterance to a reply, the next context and an optional side effect.
//! It never mutates its input: a failed turn leaves the caller holding the
//! untouched pre-call context, which is how generation failures keep the
//! dialogue where it was.
//!
//! Routing:
//!
//! ```text
//! IDLE ──접수──▶ ASK_NAME ⇄ CONFIRM_NAME ─▶ ASK_PHONE ⇄ CONFIRM_PHONE
//!   │                                   ─▶ ASK_ADDRESS ⇄ CONFIRM_ADDRESS
//!   │                                   ─▶ ASK_SYMPTOM ─▶ WAIT_TRIAGE_CONFIRM ─▶ IDLE
//!   ├──접수내역──▶ CHECK_RECEIPT (ASK_NAME ─▶ ASK_PHONE) ─▶ IDLE
//!   └──길찾기──▶ FIND_DIRECTION ─▶ IDLE
//! ```
//!
//! A termination phrase returns to IDLE from anywhere.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use kiosk_config::{ClassifierKind, DialogueConfig, PromptsConfig, Settings};
use kiosk_core::{
    ConversationState, Judgment, LookupQuery, ReceptionRecord, SubState, VisitorProfile,
};
use kiosk_llm::{ChatHistory, LlmBackend};
use kiosk_text_processing::{MenuIntent, MenuIntentDetector};

use crate::classifier::{IntentClassifier, KeywordClassifier, LlmIntentClassifier};
use crate::department::extract_department_or;
use crate::generator::ResponseGenerator;
use crate::reception::ReceptionStore;
use crate::{replies, AgentError};

/// The value collected by one ask/confirm loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmField {
    Name,
    Phone,
    Address,
}

impl ConfirmField {
    pub fn ask_state(&self) -> ConversationState {
        match self {
            ConfirmField::Name => ConversationState::AskName,
            ConfirmField::Phone => ConversationState::AskPhone,
            ConfirmField::Address => ConversationState::AskAddress,
        }
    }

    pub fn confirm_state(&self) -> ConversationState {
        match self {
            ConfirmField::Name => ConversationState::ConfirmName,
            ConfirmField::Phone => ConversationState::ConfirmPhone,
            ConfirmField::Address => ConversationState::ConfirmAddress,
        }
    }

    /// Where a positive confirmation leads, with the prompt for it
    fn advance(&self) -> (ConversationState, &'static str) {
        match self {
            ConfirmField::Name => (ConversationState::AskPhone, replies::ASK_PHONE),
            ConfirmField::Phone => (ConversationState::AskAddress, replies::ASK_ADDRESS),
            ConfirmField::Address => (ConversationState::AskSymptom, replies::ASK_SYMPTOM),
        }
    }

    fn retry_prompt(&self) -> &'static str {
        match self {
            ConfirmField::Name => replies::RETRY_NAME,
            ConfirmField::Phone => replies::RETRY_PHONE,
            ConfirmField::Address => replies::RETRY_ADDRESS,
        }
    }

    fn confirm_prompt(&self, value: &str) -> String {
        match self {
            ConfirmField::Name => replies::confirm_name(value),
            ConfirmField::Phone => replies::confirm_phone(value),
            ConfirmField::Address => replies::confirm_address(value),
        }
    }

    fn store(&self, profile: &mut VisitorProfile, value: &str) {
        let slot = match self {
            ConfirmField::Name => &mut profile.name,
            ConfirmField::Phone => &mut profile.phone,
            ConfirmField::Address => &mut profile.address,
        };
        *slot = value.to_string();
    }
}

/// Everything one session carries between turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueContext {
    pub state: ConversationState,
    /// Only meaningful in CHECK_RECEIPT
    pub sub_state: Option<SubState>,
    /// Consecutive negatives in the current confirmation loop
    pub retry_count: u32,
    pub profile: VisitorProfile,
    pub lookup: LookupQuery,
    /// Symptom and recommendation exchanges
    pub triage_history: ChatHistory,
    /// Registration requests, completions and follow-ups
    pub registration_history: ChatHistory,
}

impl DialogueContext {
    pub fn new(prompts: &PromptsConfig, history_cap: usize) -> Self {
        Self {
            state: ConversationState::Idle,
            sub_state: None,
            retry_count: 0,
            profile: VisitorProfile::default(),
            lookup: LookupQuery::default(),
            triage_history: ChatHistory::new(prompts.triage_recommend.clone(), history_cap),
            registration_history: ChatHistory::new(prompts.triage_register.clone(), history_cap),
        }
    }

    /// Forget the session entirely
    pub fn reset(&mut self) {
        self.return_to_idle();
        self.profile = VisitorProfile::default();
        self.triage_history.clear();
        self.registration_history.clear();
    }

    /// Leave the current flow; the profile and histories are kept
    fn return_to_idle(&mut self) {
        self.state = ConversationState::Idle;
        self.sub_state = None;
        self.retry_count = 0;
        self.lookup = LookupQuery::default();
    }
}

/// Notable outcomes of a turn that are not failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Terminated,
    NothingHeard,
    MenuNotRecognized,
    /// The answer was neither yes nor no; the question is asked again
    ClassificationAmbiguous { state: ConversationState },
    /// Escalated to staff after too many rejections
    RetryBudgetExhausted { field: ConfirmField, retries: u32 },
    TriageDeclined,
    LookupHit,
    LookupMiss,
}

/// Writes a turn asks the caller to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffect {
    CommitReception {
        name: String,
        phone: String,
        record: ReceptionRecord,
    },
}

/// Result of one successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub context: DialogueContext,
    pub events: Vec<TurnEvent>,
    pub side_effect: Option<SideEffect>,
}

/// Static dialogue parameters
#[derive(Debug, Clone)]
pub struct DialoguePolicy {
    menu: MenuIntentDetector,
    max_retries: u32,
    history_cap: usize,
    reception_date: String,
    reception_time: String,
    fallback_department: String,
    prompts: PromptsConfig,
}

impl DialoguePolicy {
    pub fn new(config: &DialogueConfig, prompts: &PromptsConfig) -> Self {
        Self {
            menu: MenuIntentDetector::new(
                config.lookup_keywords.clone(),
                config.register_keywords.clone(),
                config.direction_keywords.clone(),
                config.termination_phrases.clone(),
            ),
            max_retries: config.max_confirmation_retries.max(1),
            history_cap: config.history_cap,
            reception_date: config.reception_date.clone(),
            reception_time: config.reception_time.clone(),
            fallback_department: config.fallback_department.clone(),
            prompts: prompts.clone(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.dialogue, &settings.prompts)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Working copy of a context while a turn is computed
struct Turn {
    ctx: DialogueContext,
    events: Vec<TurnEvent>,
    side_effect: Option<SideEffect>,
}

impl Turn {
    fn new(ctx: &DialogueContext) -> Self {
        Self {
            ctx: ctx.clone(),
            events: Vec::new(),
            side_effect: None,
        }
    }

    fn finish(self, reply: String) -> TurnOutcome {
        TurnOutcome {
            reply,
            context: self.ctx,
            events: self.events,
            side_effect: self.side_effect,
        }
    }
}

/// Stateless turn handler shared by every session
pub struct DialogueEngine {
    classifier: Arc<dyn IntentClassifier>,
    generator: ResponseGenerator,
    store: Arc<ReceptionStore>,
    policy: DialoguePolicy,
}

impl DialogueEngine {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        generator: ResponseGenerator,
        store: Arc<ReceptionStore>,
        policy: DialoguePolicy,
    ) -> Self {
        Self {
            classifier,
            generator,
            store,
            policy,
        }
    }

    /// Wire an engine from settings around one generation backend
    pub fn from_settings(
        settings: &Settings,
        backend: Arc<dyn LlmBackend>,
        store: Arc<ReceptionStore>,
    ) -> Self {
        let classifier: Arc<dyn IntentClassifier> = match settings.dialogue.classifier {
            ClassifierKind::Llm => Arc::new(LlmIntentClassifier::new(
                Arc::clone(&backend),
                settings.prompts.clone(),
                settings.llm.classification,
                settings.dialogue.classification_timeout(),
            )),
            ClassifierKind::Keyword => Arc::new(KeywordClassifier::new()),
        };

        let generator = ResponseGenerator::new(
            backend,
            settings.llm.generation,
            settings.dialogue.generation_timeout(),
            &settings.prompts,
        );

        Self::new(
            classifier,
            generator,
            store,
            DialoguePolicy::from_settings(settings),
        )
    }

    /// Context for a fresh session
    pub fn new_context(&self) -> DialogueContext {
        DialogueContext::new(&self.policy.prompts, self.policy.history_cap)
    }

    pub fn store(&self) -> &Arc<ReceptionStore> {
        &self.store
    }

    /// Apply a side effect produced by [`Self::handle_turn`]
    pub fn apply(&self, effect: &SideEffect) {
        match effect {
            SideEffect::CommitReception {
                name,
                phone,
                record,
            } => {
                self.store.put(name, phone, record.clone());
            }
        }
    }

    /// Compute one turn
    ///
    /// Errors only when generation fails or times out; `ctx` is then still
    /// the state to continue from.
    pub async fn handle_turn(
        &self,
        ctx: &DialogueContext,
        utterance: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let text = utterance.trim();
        let mut turn = Turn::new(ctx);

        let reply = if self.policy.menu.is_termination(text) {
            turn.ctx.reset();
            turn.events.push(TurnEvent::Terminated);
            replies::FAREWELL.to_string()
        } else if text.is_empty() {
            turn.events.push(TurnEvent::NothingHeard);
            replies::NOT_HEARD.to_string()
        } else {
            self.dispatch(&mut turn, text).await?
        };

        tracing::debug!(
            from = %ctx.state,
            to = %turn.ctx.state,
            sub_state = ?turn.ctx.sub_state,
            retry_count = turn.ctx.retry_count,
            "Dialogue transition"
        );

        Ok(turn.finish(reply))
    }

    async fn dispatch(&self, turn: &mut Turn, text: &str) -> Result<String, AgentError> {
        use ConversationState::*;

        let reply = match turn.ctx.state {
            Idle => self.on_menu(turn, text),
            AskName => on_ask(turn, ConfirmField::Name, text),
            AskPhone => on_ask(turn, ConfirmField::Phone, text),
            AskAddress => on_ask(turn, ConfirmField::Address, text),
            ConfirmName => self.on_confirm(turn, ConfirmField::Name, text).await,
            ConfirmPhone => self.on_confirm(turn, ConfirmField::Phone, text).await,
            ConfirmAddress => self.on_confirm(turn, ConfirmField::Address, text).await,
            AskSymptom => self.on_symptom(turn, text).await?,
            WaitTriageConfirm => self.on_triage_answer(turn, text).await?,
            CheckReceipt => self.on_receipt_lookup(turn, text),
            FindDirection => self.on_direction(turn, text).await?,
            Finish => self.on_follow_up(turn, text).await?,
        };

        Ok(reply)
    }

    fn on_menu(&self, turn: &mut Turn, text: &str) -> String {
        let ctx = &mut turn.ctx;

        match self.policy.menu.detect(text) {
            MenuIntent::Lookup => {
                ctx.state = ConversationState::CheckReceipt;
                ctx.sub_state = Some(SubState::AskName);
                ctx.lookup = LookupQuery::default();
                replies::LOOKUP_START.to_string()
            }
            MenuIntent::Register => {
                ctx.state = ConversationState::AskName;
                ctx.retry_count = 0;
                ctx.profile = VisitorProfile::default();
                replies::REGISTER_START.to_string()
            }
            MenuIntent::Direction => {
                ctx.state = ConversationState::FindDirection;
                replies::DIRECTION_START.to_string()
            }
            MenuIntent::Unknown => {
                turn.events.push(TurnEvent::MenuNotRecognized);
                replies::MENU_REPROMPT.to_string()
            }
        }
    }

    async fn on_confirm(&self, turn: &mut Turn, field: ConfirmField, text: &str) -> String {
        match self.classifier.classify(text).await {
            Judgment::Positive => {
                let (next, prompt) = field.advance();
                turn.ctx.retry_count = 0;
                turn.ctx.state = next;
                prompt.to_string()
            }
            Judgment::Negative => {
                turn.ctx.retry_count += 1;
                let retries = turn.ctx.retry_count;

                if retries < self.policy.max_retries {
                    turn.ctx.state = field.ask_state();
                    field.retry_prompt().to_string()
                } else {
                    tracing::warn!(?field, retries, "Confirmation retries exhausted, calling staff");
                    turn.events
                        .push(TurnEvent::RetryBudgetExhausted { field, retries });
                    turn.ctx.return_to_idle();
                    replies::ESCALATION.to_string()
                }
            }
            Judgment::Unsure => {
                turn.events.push(TurnEvent::ClassificationAmbiguous {
                    state: field.confirm_state(),
                });
                replies::CONFIRM_UNSURE.to_string()
            }
        }
    }

    async fn on_symptom(&self, turn: &mut Turn, text: &str) -> Result<String, AgentError> {
        let recommendation = self
            .generator
            .recommend(&turn.ctx.triage_history, text)
            .await?;
        let department = extract_department_or(&recommendation, &self.policy.fallback_department);

        tracing::info!(%department, "Department recommended");

        let ctx = &mut turn.ctx;
        ctx.triage_history
            .record_exchange(text, recommendation.clone());
        ctx.profile.symptom = text.to_string();
        ctx.profile.department = department;
        ctx.state = ConversationState::WaitTriageConfirm;

        Ok(replies::triage_offer(&recommendation))
    }

    async fn on_triage_answer(&self, turn: &mut Turn, text: &str) -> Result<String, AgentError> {
        match self.classifier.classify(text).await {
            Judgment::Positive => {
                let profile = &turn.ctx.profile;
                let request = replies::registration_request(&profile.name, &profile.department);
                let completion = self
                    .generator
                    .complete_registration(&turn.ctx.registration_history, &request)
                    .await?;

                let record = ReceptionRecord::new(
                    &profile.department,
                    &self.policy.reception_date,
                    &self.policy.reception_time,
                );
                turn.side_effect = Some(SideEffect::CommitReception {
                    name: profile.name.clone(),
                    phone: profile.phone.clone(),
                    record,
                });

                turn.ctx
                    .registration_history
                    .record_exchange(request, completion.clone());
                turn.ctx.return_to_idle();
                Ok(completion)
            }
            Judgment::Negative => {
                turn.events.push(TurnEvent::TriageDeclined);
                turn.ctx.return_to_idle();
                Ok(replies::TRIAGE_DECLINED.to_string())
            }
            Judgment::Unsure => {
                turn.events.push(TurnEvent::ClassificationAmbiguous {
                    state: ConversationState::WaitTriageConfirm,
                });
                Ok(replies::TRIAGE_UNSURE.to_string())
            }
        }
    }

    fn on_receipt_lookup(&self, turn: &mut Turn, text: &str) -> String {
        match turn.ctx.sub_state {
            Some(SubState::AskPhone) => {
                turn.ctx.lookup.phone = text.to_string();
                let LookupQuery { name, phone } = &turn.ctx.lookup;

                let reply = match self.store.get(name, phone) {
                    Some(record) => {
                        turn.events.push(TurnEvent::LookupHit);
                        replies::lookup_hit(name, &record.date, &record.time, &record.department)
                    }
                    None => {
                        turn.events.push(TurnEvent::LookupMiss);
                        replies::LOOKUP_MISS.to_string()
                    }
                };

                turn.ctx.return_to_idle();
                reply
            }
            Some(SubState::AskName) | None => {
                turn.ctx.lookup.name = text.to_string();
                turn.ctx.sub_state = Some(SubState::AskPhone);
                replies::lookup_ask_phone(text)
            }
        }
    }

    async fn on_direction(&self, turn: &mut Turn, text: &str) -> Result<String, AgentError> {
        let guidance = self.generator.guide_to(text).await?;
        turn.ctx.return_to_idle();
        Ok(guidance)
    }

    async fn on_follow_up(&self, turn: &mut Turn, text: &str) -> Result<String, AgentError> {
        let answer = self
            .generator
            .answer_follow_up(&turn.ctx.registration_history, text)
            .await?;
        turn.ctx
            .registration_history
            .record_exchange(text, answer.clone());
        turn.ctx.return_to_idle();
        Ok(answer)
    }
}

fn on_ask(turn: &mut Turn, field: ConfirmField, text: &str) -> String {
    field.store(&mut turn.ctx.profile, text);
    turn.ctx.state = field.confirm_state();
    field.confirm_prompt(text)
}
