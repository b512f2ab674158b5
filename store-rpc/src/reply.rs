use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::Outcome;

/// Message used when a failing outcome carries no error text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// A single store's failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{label}: {message}")]
pub struct TenantError {
    pub label: String,
    pub message: String,
}

/// Every store failure of one reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}", join_errors(.0))]
pub struct ReplyError(pub Vec<TenantError>);

fn join_errors(errors: &[TenantError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Response envelope for one batched call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub results: Vec<Outcome>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.request_id.clear();
        self.results = Vec::new();
        self
    }

    pub fn has_error(&self) -> bool {
        self.results.iter().any(|outcome| !outcome.ok)
    }

    /// One error per failing outcome, in outcome order.
    pub fn errors(&self) -> Vec<TenantError> {
        self.failures()
            .map(|outcome| TenantError {
                label: outcome.display_name().to_string(),
                message: match outcome.error.as_deref() {
                    Some(message) if !message.is_empty() => message.to_string(),
                    _ => UNKNOWN_ERROR.to_string(),
                },
            })
            .collect()
    }

    pub fn error_summary(&self) -> Vec<String> {
        self.errors().iter().map(ToString::to_string).collect()
    }

    /// All failures folded into one error, or `None` when every store succeeded.
    pub fn error(&self) -> Option<ReplyError> {
        let errors = self.errors();
        (!errors.is_empty()).then_some(ReplyError(errors))
    }

    pub fn successes(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().filter(|outcome| outcome.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().filter(|outcome| !outcome.ok)
    }
}
