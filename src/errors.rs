//! Structured error events carried on the state's error channel.
//!
//! Failures during a run degrade rather than crash: stages, the scheduler,
//! and the runner all fold problems into [`ErrorEvent`] records that travel
//! through the barrier merge like any other channel update and surface in
//! the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An error event with scope, cause chain, tags, and free-form context.
///
/// # Examples
///
/// ```
/// use tribunal::errors::{ErrorEvent, Fault};
/// use serde_json::json;
///
/// let event = ErrorEvent::stage("repo_collector", 2, Fault::msg("clone failed"))
///     .with_tag("collector")
///     .with_context(json!({"url": "https://example.com/repo.git"}));
/// assert_eq!(event.tags, vec!["collector"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: Fault,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl Default for ErrorEvent {
    fn default() -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::default(),
            error: Fault::default(),
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }
}

impl ErrorEvent {
    /// Create a stage-scoped error event.
    pub fn stage<S: Into<String>>(kind: S, step: u64, error: Fault) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Stage {
                kind: kind.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a scheduler-scoped error event.
    pub fn scheduler(step: u64, error: Fault) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Scheduler { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a runner-scoped error event.
    pub fn runner(step: u64, error: Fault) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create an app-scoped error event.
    pub fn app(error: Fault) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::App,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Where in the execution pipeline an error originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Stage {
        kind: String,
        step: u64,
    },
    Scheduler {
        step: u64,
    },
    Runner {
        step: u64,
    },
    #[default]
    App,
}

impl ErrorScope {
    /// Short label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            ErrorScope::Stage { kind, step } => format!("stage {kind} (step {step})"),
            ErrorScope::Scheduler { step } => format!("scheduler (step {step})"),
            ErrorScope::Runner { step } => format!("runner (step {step})"),
            ErrorScope::App => "app".to_string(),
        }
    }
}

/// A message with an optional chained cause and structured details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<Fault>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for Fault {
    fn default() -> Self {
        Fault {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl Fault {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        Fault {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}
