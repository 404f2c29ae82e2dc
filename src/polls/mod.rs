//! Poll publishing
//!
//! Turns the prompt shown on the active TalesUp tab into a timed Twitch poll.
//! Every failure is terminal for the action that triggered it; nothing is
//! retried or queued.

pub mod draft;
pub mod extract;

pub use draft::{truncate_choice, PollChoice, PollDraft, MAX_CHOICES};
pub use extract::{PageExtractor, Prompt, ScriptExtractor, EXTRACT_PROMPT_SCRIPT};

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::host::{HostError, TabHost};
use crate::session::Session;
use crate::store::StoreError;
use crate::twitch::{HelixClient, HelixError};

/// Poll publishing errors
#[derive(Debug, Error)]
pub enum PollError {
    #[error("No active tab")]
    NoActiveTab,

    #[error("Not on the proper {expected} page (active tab is {url})")]
    UnsupportedPage { expected: String, url: String },

    #[error("Could not get page content: no question on the page")]
    MissingQuestion,

    #[error("Not logged in to Twitch")]
    NotAuthenticated,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Helix(#[from] HelixError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Status label of the "start poll" action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    /// Nothing submitted yet
    #[default]
    Idle,
    Done,
    Error,
}

impl PollStatus {
    pub fn label(self) -> &'static str {
        match self {
            PollStatus::Idle => "Start poll",
            PollStatus::Done => "Done",
            PollStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Judge a poll creation response by its body alone.
///
/// A missing body, a falsy body or one carrying a truthy `error` field is a
/// failure; anything else is a success.
pub fn classify_response(body: Option<&Value>) -> PollStatus {
    match body {
        None => PollStatus::Error,
        Some(value) if !is_truthy(value) => PollStatus::Error,
        Some(value) if value.get("error").is_some_and(is_truthy) => PollStatus::Error,
        Some(_) => PollStatus::Done,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Settings the publisher needs from [`Config`]
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    /// Substring the active tab URL must contain
    pub host_match: String,
    /// Fixed poll title
    pub title: String,
    /// Characters per choice
    pub choice_budget: usize,
    /// Poll duration in seconds
    pub duration_secs: u32,
}

impl From<&Config> for PublisherSettings {
    fn from(config: &Config) -> Self {
        Self {
            host_match: config.page.host_match.clone(),
            title: config.poll.title.clone(),
            choice_budget: config.flow.choice_budget(),
            duration_secs: config.flow.poll_duration_secs(),
        }
    }
}

/// Scrapes prompts and submits them as polls
pub struct PollPublisher {
    settings: PublisherSettings,
    session: Session,
    helix: HelixClient,
    tabs: Arc<dyn TabHost>,
    extractor: Arc<dyn PageExtractor>,
    status: RwLock<PollStatus>,
}

impl PollPublisher {
    /// Publisher that extracts prompts by script injection into `tabs`
    pub fn new(
        settings: PublisherSettings,
        session: Session,
        helix: HelixClient,
        tabs: Arc<dyn TabHost>,
    ) -> Self {
        let extractor = Arc::new(ScriptExtractor::new(tabs.clone()));
        Self::with_extractor(settings, session, helix, tabs, extractor)
    }

    pub fn with_extractor(
        settings: PublisherSettings,
        session: Session,
        helix: HelixClient,
        tabs: Arc<dyn TabHost>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            settings,
            session,
            helix,
            tabs,
            extractor,
            status: RwLock::new(PollStatus::Idle),
        }
    }

    /// Current status label
    pub fn status(&self) -> PollStatus {
        *self.status.read()
    }

    /// Read the prompt from the active tab.
    ///
    /// Nothing is injected unless the tab URL contains the configured host.
    pub async fn extract_prompt(&self) -> Result<Prompt, PollError> {
        let Some(tab) = self.tabs.active_tab().await? else {
            tracing::error!("no active tab");
            return Err(PollError::NoActiveTab);
        };

        if !tab.url.contains(&self.settings.host_match) {
            tracing::error!(
                url = %tab.url,
                expected = %self.settings.host_match,
                "not on the proper page"
            );
            return Err(PollError::UnsupportedPage {
                expected: self.settings.host_match.clone(),
                url: tab.url,
            });
        }

        match self.extractor.extract(&tab).await? {
            Some(prompt) => Ok(prompt),
            None => {
                tracing::error!(tab = %tab.id, "could not get page content");
                Err(PollError::MissingQuestion)
            }
        }
    }

    /// Submit `answers` as a poll and update the status label.
    ///
    /// The poll title is the configured constant, not `question`. Transport
    /// and decoding failures leave the label unchanged.
    pub async fn submit_poll(
        &self,
        question: &str,
        answers: &[String],
    ) -> Result<PollStatus, PollError> {
        let (Some(token), Some(broadcaster_id)) =
            (self.session.access_token()?, self.session.broadcaster_id()?)
        else {
            tracing::error!("cannot create a poll without a token and broadcaster id");
            return Err(PollError::NotAuthenticated);
        };

        let draft = PollDraft::build(
            &broadcaster_id,
            &self.settings.title,
            answers,
            self.settings.choice_budget,
            self.settings.duration_secs,
        );
        tracing::debug!(
            question,
            choices = draft.choices.len(),
            duration = draft.duration,
            "submitting poll"
        );

        let body = match self.helix.create_poll(&token, &draft).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "error creating Twitch poll");
                return Err(e.into());
            }
        };

        let status = classify_response(body.as_ref());
        *self.status.write() = status;

        let body_text = body.as_ref().map(Value::to_string).unwrap_or_default();
        match status {
            PollStatus::Done => tracing::info!(response = %body_text, "Twitch poll created"),
            _ => tracing::error!(response = %body_text, "Twitch poll error"),
        }
        Ok(status)
    }

    /// Extract the prompt from the active tab and submit it.
    pub async fn publish(&self) -> Result<PollStatus, PollError> {
        let prompt = self.extract_prompt().await?;
        self.submit_poll(&prompt.question, &prompt.answers).await
    }
}
