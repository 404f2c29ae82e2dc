//! Prompt extraction
//!
//! The question and its answer choices are read out of the TalesUp page by
//! a routine injected into the page context. Everything that depends on the
//! page markup lives here, behind [`PageExtractor`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::host::{HostError, Tab, TabHost};

/// Runs inside the page. Returns `[question, ...choices]` with trimmed text
/// in DOM order, or `null` when the question element is missing.
pub const EXTRACT_PROMPT_SCRIPT: &str = r##"function () {
    const question = document.querySelector("#root p.MuiTypography-root.MuiTypography-body1[style*='opacity: 1']");
    if (!question) {
        return null;
    }
    const choices = document.querySelectorAll("#root .MuiBox-root[style*='display: flex'] button p.MuiTypography-root.MuiTypography-body1");
    const texts = [question.textContent.trim()];
    choices.forEach((choice) => texts.push(choice.textContent.trim()));
    return texts;
}"##;

/// Question and ordered answer choices scraped from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub question: String,
    pub answers: Vec<String>,
}

impl Prompt {
    /// Split `[question, answer, ...]`. An empty list is no prompt.
    pub fn from_texts(mut texts: Vec<String>) -> Option<Self> {
        if texts.is_empty() {
            return None;
        }
        let question = texts.remove(0);
        Some(Self {
            question,
            answers: texts,
        })
    }

    /// Decode the value returned by [`EXTRACT_PROMPT_SCRIPT`].
    ///
    /// `null` means the question was not found. Anything that is not an
    /// array of strings is a script error.
    pub fn from_script_value(value: &Value) -> Result<Option<Self>, HostError> {
        let items = match value {
            Value::Null => return Ok(None),
            Value::Array(items) => items,
            other => {
                return Err(HostError::Script(format!(
                    "expected an array of strings, got {other}"
                )))
            }
        };

        let texts = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    HostError::Script(format!("expected a string entry, got {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_texts(texts))
    }
}

/// Reads a [`Prompt`] out of a page
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// `Ok(None)` when the page does not currently show a question.
    async fn extract(&self, tab: &Tab) -> Result<Option<Prompt>, HostError>;
}

/// Extractor that injects [`EXTRACT_PROMPT_SCRIPT`] through a [`TabHost`]
pub struct ScriptExtractor {
    tabs: Arc<dyn TabHost>,
}

impl ScriptExtractor {
    pub fn new(tabs: Arc<dyn TabHost>) -> Self {
        Self { tabs }
    }
}

#[async_trait]
impl PageExtractor for ScriptExtractor {
    async fn extract(&self, tab: &Tab) -> Result<Option<Prompt>, HostError> {
        let frames = self.tabs.execute_script(tab, EXTRACT_PROMPT_SCRIPT).await?;

        // First frame that produced something wins
        for frame in &frames {
            if let Some(prompt) = Prompt::from_script_value(&frame.result)? {
                tracing::debug!(
                    frame = %frame.frame_id,
                    answers = prompt.answers.len(),
                    "extracted prompt"
                );
                return Ok(Some(prompt));
            }
        }
        Ok(None)
    }
}
