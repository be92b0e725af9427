use crate::config::MIN_RETRY_BUDGET;
use crate::error::ClaudeWebError;

/// What the orchestrator does after message post attempt `n` failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Post again with the same model.
    Retry,
    /// The model was rejected as invalid: post again with `model` and memoize it.
    ///
    /// `model` equals the current one when the fallback was already taken.
    SwitchModel { model: String },
    /// Budget spent: forget the memoized model and surface the error.
    Exhausted,
}

/// Attempt budget plus the single primary -> secondary model fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPlan {
    budget: u32,
    primary: String,
    secondary: String,
}

impl RetryPlan {
    pub fn new(budget: u32, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            budget: budget.max(MIN_RETRY_BUDGET),
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    /// Decide the transition out of failed attempt `attempt` (1-based).
    pub fn decide(&self, attempt: u32, error: &ClaudeWebError, current_model: &str) -> RetryDecision {
        if attempt >= self.budget {
            return RetryDecision::Exhausted;
        }

        if !error.is_invalid_model() {
            return RetryDecision::Retry;
        }

        let model = if current_model == self.primary {
            self.secondary.clone()
        } else {
            current_model.to_owned()
        };
        RetryDecision::SwitchModel { model }
    }
}
