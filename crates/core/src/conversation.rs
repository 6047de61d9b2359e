//! Dialogue states and confirmation judgments

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a kiosk session currently is in its dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    /// Waiting for the visitor to pick a service
    #[default]
    Idle,
    AskName,
    ConfirmName,
    AskPhone,
    ConfirmPhone,
    AskAddress,
    ConfirmAddress,
    /// Collecting the symptom description for triage
    AskSymptom,
    /// A department was recommended; waiting for the visitor to accept it
    WaitTriageConfirm,
    /// Two-step receipt lookup, see [`SubState`]
    CheckReceipt,
    /// Waiting for a wayfinding destination
    FindDirection,
    /// Follow-up questions after a completed registration
    Finish,
}

impl ConversationState {
    /// All states, in declaration order
    pub const ALL: [ConversationState; 12] = [
        ConversationState::Idle,
        ConversationState::AskName,
        ConversationState::ConfirmName,
        ConversationState::AskPhone,
        ConversationState::ConfirmPhone,
        ConversationState::AskAddress,
        ConversationState::ConfirmAddress,
        ConversationState::AskSymptom,
        ConversationState::WaitTriageConfirm,
        ConversationState::CheckReceipt,
        ConversationState::FindDirection,
        ConversationState::Finish,
    ];

    /// Stable identifier used in logs, metrics and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "IDLE",
            ConversationState::AskName => "ASK_NAME",
            ConversationState::ConfirmName => "CONFIRM_NAME",
            ConversationState::AskPhone => "ASK_PHONE",
            ConversationState::ConfirmPhone => "CONFIRM_PHONE",
            ConversationState::AskAddress => "ASK_ADDRESS",
            ConversationState::ConfirmAddress => "CONFIRM_ADDRESS",
            ConversationState::AskSymptom => "ASK_SYMPTOM",
            ConversationState::WaitTriageConfirm => "WAIT_TRIAGE_CONFIRM",
            ConversationState::CheckReceipt => "CHECK_RECEIPT",
            ConversationState::FindDirection => "FIND_DIRECTION",
            ConversationState::Finish => "FINISH",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step inside [`ConversationState::CheckReceipt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubState {
    AskName,
    AskPhone,
}

impl SubState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubState::AskName => "ASK_NAME",
            SubState::AskPhone => "ASK_PHONE",
        }
    }
}

impl fmt::Display for SubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a confirmation answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Positive,
    Negative,
    Unsure,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Judgment::Positive => "positive",
            Judgment::Negative => "negative",
            Judgment::Unsure => "unsure",
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
