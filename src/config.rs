//! Environment-based runtime configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, resolved from the environment with sensible
/// defaults so a bare invocation still runs.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Model identifier advertised to reviewer backends that use one.
    pub model: String,
    pub api_key: Option<String>,
    pub rubric_path: PathBuf,
    pub output_dir: PathBuf,
    pub clone_timeout: Duration,
    pub concurrency_limit: usize,
}

impl AuditConfig {
    /// Resolve configuration from the environment.
    ///
    /// Loads a `.env` file if one exists; real environment variables win.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let timeout_secs = std::env::var("TRIBUNAL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        let concurrency_limit = std::env::var("TRIBUNAL_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(std::num::NonZeroUsize::get)
                    .unwrap_or(4)
            });

        Self {
            model: std::env::var("TRIBUNAL_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3.5-sonnet".to_string()),
            api_key: std::env::var("TRIBUNAL_API_KEY").ok().filter(|k| !k.is_empty()),
            rubric_path: std::env::var("TRIBUNAL_RUBRIC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("rubric/audit_rubric.json")),
            output_dir: std::env::var("TRIBUNAL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("audit")),
            clone_timeout: Duration::from_secs(timeout_secs),
            concurrency_limit,
        }
    }

    /// Non-fatal configuration issues worth surfacing before a run.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.api_key.is_none() {
            issues.push(
                "TRIBUNAL_API_KEY is not set; remote reviewer backends will be unavailable"
                    .to_string(),
            );
        }
        if !self.rubric_path.exists() {
            issues.push(format!(
                "rubric file {} does not exist; the built-in default rubric will be used",
                self.rubric_path.display()
            ));
        }
        issues
    }
}

// Display omits the API key.
impl fmt::Display for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model:             {}", self.model)?;
        writeln!(
            f,
            "api key:           {}",
            if self.api_key.is_some() { "set" } else { "not set" }
        )?;
        writeln!(f, "rubric path:       {}", self.rubric_path.display())?;
        writeln!(f, "output directory:  {}", self.output_dir.display())?;
        writeln!(f, "clone timeout:     {}s", self.clone_timeout.as_secs())?;
        write!(f, "concurrency limit: {}", self.concurrency_limit)
    }
}
