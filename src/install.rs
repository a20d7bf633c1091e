//! Deferred install prompt.
//!
//! The browser may offer installation at most once per page lifetime by
//! firing `beforeinstallprompt`. The page suppresses the default mini-infobar,
//! keeps the event, and replays it when the user presses the install button.

use std::mem;

use log::debug;
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::utils::describe_js;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = web_sys::Event)]
    #[derive(Debug, Clone)]
    pub type BeforeInstallPromptEvent;

    #[wasm_bindgen(method, catch)]
    fn prompt(this: &BeforeInstallPromptEvent) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter = userChoice)]
    fn user_choice(this: &BeforeInstallPromptEvent) -> js_sys::Promise;
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("install prompt failed: {0}")]
    Prompt(String),
    #[error("unreadable install choice: {0}")]
    Choice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

#[derive(Debug, Deserialize)]
struct UserChoice {
    outcome: InstallOutcome,
    #[serde(default)]
    platform: String,
}

/// Install-prompt lifecycle, generic over the retained event.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallPrompt<E> {
    Unavailable,
    Deferred(E),
    Prompting,
    Resolved(InstallOutcome),
}

impl<E> Default for InstallPrompt<E> {
    fn default() -> Self {
        InstallPrompt::Unavailable
    }
}

impl<E> InstallPrompt<E> {
    /// Retain an offered event. Offers after the user already answered, or
    /// while a prompt is showing, are ignored.
    pub fn offer(&mut self, event: E) -> bool {
        match self {
            InstallPrompt::Unavailable | InstallPrompt::Deferred(_) => {
                *self = InstallPrompt::Deferred(event);
                true
            }
            InstallPrompt::Prompting | InstallPrompt::Resolved(_) => false,
        }
    }

    /// Whether the install affordance should be shown.
    pub fn is_available(&self) -> bool {
        matches!(self, InstallPrompt::Deferred(_))
    }

    pub fn take_for_prompt(&mut self) -> Option<E> {
        match mem::replace(self, InstallPrompt::Prompting) {
            InstallPrompt::Deferred(event) => Some(event),
            other => {
                *self = other;
                None
            }
        }
    }

    pub fn resolve(&mut self, outcome: InstallOutcome) {
        *self = InstallPrompt::Resolved(outcome);
    }

    pub fn outcome(&self) -> Option<InstallOutcome> {
        match self {
            InstallPrompt::Resolved(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

/// Show the retained browser prompt and wait for the user's answer.
pub async fn show_prompt(event: &BeforeInstallPromptEvent) -> Result<InstallOutcome, InstallError> {
    event
        .prompt()
        .map_err(|e| InstallError::Prompt(describe_js(&e)))?;
    let choice = JsFuture::from(event.user_choice())
        .await
        .map_err(|e| InstallError::Prompt(describe_js(&e)))?;
    let choice: UserChoice = serde_wasm_bindgen::from_value(choice)
        .map_err(|e| InstallError::Choice(e.to_string()))?;
    debug!("install prompt answered {:?} on '{}'", choice.outcome, choice.platform);
    Ok(choice.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offered_event_is_replayed_once() {
        let mut prompt = InstallPrompt::default();
        assert!(!prompt.is_available());
        assert!(prompt.offer(7u32));
        assert!(prompt.is_available());

        assert_eq!(prompt.take_for_prompt(), Some(7));
        assert_eq!(prompt, InstallPrompt::Prompting);
        assert!(!prompt.is_available());
        assert_eq!(prompt.take_for_prompt(), None);
        assert_eq!(prompt, InstallPrompt::Prompting);
    }

    #[test]
    fn resolution_hides_affordance_and_blocks_new_offers() {
        let mut prompt = InstallPrompt::default();
        prompt.offer(1u32);
        prompt.take_for_prompt();
        prompt.resolve(InstallOutcome::Dismissed);

        assert_eq!(prompt.outcome(), Some(InstallOutcome::Dismissed));
        assert!(!prompt.offer(2));
        assert!(!prompt.is_available());
    }

    #[test]
    fn later_offer_replaces_pending_event() {
        let mut prompt = InstallPrompt::default();
        prompt.offer("first");
        prompt.offer("second");
        assert_eq!(prompt.take_for_prompt(), Some("second"));
    }

    #[test]
    fn take_without_offer_is_none() {
        let mut prompt: InstallPrompt<u8> = InstallPrompt::default();
        assert_eq!(prompt.take_for_prompt(), None);
        assert_eq!(prompt, InstallPrompt::Unavailable);
    }

    #[test]
    fn user_choice_outcome_parses() {
        let choice: UserChoice =
            serde_json::from_str(r#"{"outcome":"accepted","platform":"web"}"#).expect("parse");
        assert_eq!(choice.outcome, InstallOutcome::Accepted);
        let choice: UserChoice = serde_json::from_str(r#"{"outcome":"dismissed"}"#).expect("parse");
        assert_eq!(choice.outcome, InstallOutcome::Dismissed);
    }
}
