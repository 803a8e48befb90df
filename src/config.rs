//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Read the first set, non-empty variable among `keys`.
fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Connection settings for the remote task backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Endpoint root, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Bearer credential sent as `Authorization`.
    pub auth_token: SecretString,
    /// Service identity sent as `x-agent-key`.
    pub agent_key: SecretString,
}

impl BackendConfig {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        agent_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: SecretString::from(auth_token.into()),
            agent_key: SecretString::from(agent_key.into()),
        }
    }

    /// Build config from environment variables.
    ///
    /// `TASK_ROUTER_*` names win over the legacy Supabase names.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_any(&["TASK_ROUTER_BASE_URL", "SUPABASE_URL"])
            .ok_or_else(|| ConfigError::MissingEnvVar("TASK_ROUTER_BASE_URL".into()))?;
        let auth_token = env_any(&["TASK_ROUTER_AUTH_TOKEN", "SUPABASE_ANON_KEY"])
            .ok_or_else(|| ConfigError::MissingEnvVar("TASK_ROUTER_AUTH_TOKEN".into()))?;
        let agent_key = env_any(&["TASK_ROUTER_AGENT_KEY", "AI_AGENT_SECRET_KEY"])
            .ok_or_else(|| ConfigError::MissingEnvVar("TASK_ROUTER_AGENT_KEY".into()))?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "TASK_ROUTER_BASE_URL".into(),
                message: format!("expected an http(s) URL, got {base_url}"),
            });
        }

        Ok(Self::new(base_url, auth_token, agent_key))
    }
}

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Name used in log lines and comments.
    pub name: String,
    /// Organization new projects are created under.
    pub organization_id: String,
    /// Maximum tasks fetched per analysis pass.
    pub task_fetch_limit: usize,
    /// Maximum handoffs executing at once.
    pub max_parallel_handoffs: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            name: "task-router".to_string(),
            organization_id: "default-org-id".to_string(),
            task_fetch_limit: 100,
            max_parallel_handoffs: 10,
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by `ORGANIZATION_ID`, `TASK_ROUTER_FETCH_LIMIT`
    /// and `TASK_ROUTER_MAX_HANDOFFS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            organization_id: env_any(&["ORGANIZATION_ID"]).unwrap_or(defaults.organization_id),
            task_fetch_limit: parse_env("TASK_ROUTER_FETCH_LIMIT", defaults.task_fetch_limit)?,
            max_parallel_handoffs: parse_env(
                "TASK_ROUTER_MAX_HANDOFFS",
                defaults.max_parallel_handoffs,
            )?,
            ..defaults
        };

        if config.max_parallel_handoffs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TASK_ROUTER_MAX_HANDOFFS".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(config)
    }
}

/// Tunables for the rule-based extractor.
///
/// Word lists are matched case-insensitively on word boundaries.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub critical_words: Vec<String>,
    pub high_words: Vec<String>,
    pub low_words: Vec<String>,
    /// Headings that label a list without naming a project.
    pub generic_headings: Vec<String>,
    /// Maximum title length in characters.
    pub max_title_chars: usize,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            critical_words: owned(&[
                "critical",
                "urgent",
                "urgently",
                "asap",
                "as soon as possible",
                "immediately",
                "emergency",
                "blocker",
                "blocking",
            ]),
            high_words: owned(&["high priority", "important", "time-sensitive", "soon", "priority"]),
            low_words: owned(&[
                "low priority",
                "no rush",
                "whenever",
                "when you have time",
                "nice to have",
                "eventually",
            ]),
            generic_headings: owned(&[
                "action items",
                "action item",
                "next steps",
                "tasks",
                "todo",
                "to do",
                "to-do",
                "todos",
                "follow-ups",
                "follow ups",
                "followups",
                "notes",
                "agenda",
                "summary",
            ]),
            max_title_chars: 80,
        }
    }
}
