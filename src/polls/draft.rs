//! Poll drafts
//!
//! Request body for `POST /helix/polls`, built from scraped answers.

use serde::{Deserialize, Serialize};

/// Twitch accepts at most five choices per poll.
pub const MAX_CHOICES: usize = 5;

const ELLIPSIS: &str = "...";

/// A single poll choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollChoice {
    pub title: String,
}

/// Poll creation request that has not been sent yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDraft {
    pub broadcaster_id: String,
    pub title: String,
    pub choices: Vec<PollChoice>,
    /// Poll length in seconds
    pub duration: u32,
}

impl PollDraft {
    /// Build a draft from the first [`MAX_CHOICES`] answers, each truncated
    /// to `budget` characters.
    pub fn build(
        broadcaster_id: &str,
        title: &str,
        answers: &[String],
        budget: usize,
        duration: u32,
    ) -> Self {
        Self {
            broadcaster_id: broadcaster_id.to_string(),
            title: title.to_string(),
            choices: answers
                .iter()
                .take(MAX_CHOICES)
                .map(|answer| PollChoice {
                    title: truncate_choice(answer, budget),
                })
                .collect(),
            duration,
        }
    }
}

/// Shorten `text` to exactly `budget` characters, ending in `...`, when it
/// is longer than `budget`. Shorter or equal strings are returned unchanged.
///
/// Counts characters, not bytes.
pub fn truncate_choice(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let keep = budget.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
