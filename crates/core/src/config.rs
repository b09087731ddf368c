//! Configuration management for ragdesk.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.ragdesk/config.yaml` in the workspace, or `RAGDESK_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the corpus, audit log and prompt
//! overrides live under `.ragdesk/` unless configured elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Languages with built-in prompts and canned responses.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["ja", "en"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragdesk/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Stderr log format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Answer generation settings (models, routing threshold, timeout)
    pub generation: GenerationConfig,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Query audit log settings
    pub audit: AuditConfig,

    /// Response language and canned messages
    pub responses: ResponseConfig,

    /// Role table overrides for mask policies
    pub masking: MaskingConfig,

    /// HTTP API settings
    pub server: ServerConfig,
}

/// Hosted or local model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "organizationEnv")]
        organization_env: Option<String>,
    },
    Claude {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "apiVersion")]
        api_version: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Canonical provider name.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "openai",
            Self::Claude { .. } => "claude",
            Self::Ollama { .. } => "ollama",
        }
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Claude { model, .. } | Self::Ollama { model, .. } => {
                model
            }
        }
    }

    /// Environment variable holding the API key, for hosted providers.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::OpenAI { api_key_env, .. } | Self::Claude { api_key_env, .. } => {
                Some(api_key_env)
            }
            Self::Ollama { .. } => None,
        }
    }
}

/// One generation model slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub provider: ProviderConfig,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Answer generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Model used when the estimated context fits under the threshold
    pub default_model: ModelConfig,

    /// Higher-context-window model used above the threshold
    pub extended_model: ModelConfig,

    /// Token estimate above which the extended model is used
    pub routing_threshold_tokens: usize,

    /// Timeout for a single model call
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: ModelConfig {
                provider: ProviderConfig::OpenAI {
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    model: "gpt-4".to_string(),
                    endpoint: None,
                    organization_env: None,
                },
                temperature: 0.1,
                max_tokens: 1000,
            },
            extended_model: ModelConfig {
                provider: ProviderConfig::Claude {
                    api_key_env: "ANTHROPIC_API_KEY".to_string(),
                    model: "claude-3-haiku-20240307".to_string(),
                    endpoint: None,
                    api_version: None,
                },
                temperature: 0.1,
                max_tokens: 2000,
            },
            routing_threshold_tokens: 3000,
            timeout_secs: 60,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Chunks returned per query unless the request asks for fewer/more
    pub top_k: usize,

    /// Upper bound for a per-request `max_results`
    pub max_top_k: usize,

    /// Timeout for a single similarity search
    pub timeout_secs: u64,

    /// JSONL corpus of indexed chunks (default: .ragdesk/corpus.jsonl)
    pub corpus_path: Option<PathBuf>,

    /// Embedding vector dimensions for the built-in index
    pub embedding_dimensions: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_top_k: 20,
            timeout_secs: 10,
            corpus_path: None,
            embedding_dimensions: 384,
        }
    }
}

/// Query audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    /// Disable to discard audit entries
    pub enabled: bool,

    /// JSONL audit log (default: .ragdesk/audit/query_log.jsonl)
    pub path: Option<PathBuf>,

    /// Upper bound on time spent writing one entry
    pub timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            timeout_ms: 500,
        }
    }
}

/// Response language and canned message configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseConfig {
    /// Target language for answers ("ja" or "en")
    pub language: String,

    /// Replaces the built-in "no results" message
    pub no_results_message: Option<String>,

    /// Replaces the built-in apology used when generation fails
    pub apology_message: Option<String>,

    /// YAML prompt definition replacing the built-in grounding prompt
    pub prompt_file: Option<PathBuf>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            no_results_message: None,
            apology_message: None,
            prompt_file: None,
        }
    }
}

/// Role rule override for mask policy resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRuleConfig {
    #[serde(default)]
    pub mask_cost_data: bool,
    #[serde(default)]
    pub mask_profit_data: bool,
    #[serde(default)]
    pub mask_contractor_rates: bool,
    /// Document type names (e.g. "estimate_pdf"), or "*" for all
    #[serde(default)]
    pub allowed_doc_types: Vec<String>,
}

/// Mask policy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaskingConfig {
    /// Role name (lowercase) to rule; entries replace built-in rules
    pub roles: HashMap<String, RoleRuleConfig>,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    generation: Option<GenerationConfig>,
    retrieval: Option<RetrievalConfig>,
    audit: Option<AuditConfig>,
    responses: Option<ResponseConfig>,
    masking: Option<MaskingConfig>,
    server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_format: LogFormat::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            audit: AuditConfig::default(),
            responses: ResponseConfig::default(),
            masking: MaskingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment.
    ///
    /// Environment variables:
    /// - `RAGDESK_WORKSPACE`: Override workspace path
    /// - `RAGDESK_CONFIG`: Path to config file
    /// - `RAGDESK_LANGUAGE`: Response language
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    /// - `RAGDESK_LOG_FORMAT`: `text` or `json`
    ///
    /// # Example
    /// ```no_run
    /// use ragdesk_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RAGDESK_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("RAGDESK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.ragdesk_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(language) = std::env::var("RAGDESK_LANGUAGE") {
            config.responses.language = language;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        if let Ok(format) = std::env::var("RAGDESK_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Sections present in the file replace the corresponding section;
    /// fields missing inside a section take their defaults.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(audit) = config_file.audit {
            result.audit = audit;
        }
        if let Some(responses) = config_file.responses {
            result.responses = responses;
        }
        if let Some(masking) = config_file.masking {
            result.masking = masking;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        language: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> AppResult<Self> {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        // An explicit config file on the command line is merged on top
        if let Some(config_file) = config_file {
            self = self.merge_yaml(&config_file)?;
            self.config_file = Some(config_file);
        }

        if let Some(language) = language {
            self.responses.language = language;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Get the path to the .ragdesk directory.
    pub fn ragdesk_dir(&self) -> PathBuf {
        self.workspace.join(".ragdesk")
    }

    /// Ensure the .ragdesk directory exists.
    pub fn ensure_ragdesk_dir(&self) -> AppResult<()> {
        let dir = self.ragdesk_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .ragdesk directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path of the JSONL corpus loaded into the built-in index.
    pub fn corpus_path(&self) -> PathBuf {
        self.retrieval
            .corpus_path
            .clone()
            .unwrap_or_else(|| self.ragdesk_dir().join("corpus.jsonl"))
    }

    /// Path of the JSONL query audit log.
    pub fn audit_path(&self) -> PathBuf {
        self.audit
            .path
            .clone()
            .unwrap_or_else(|| self.ragdesk_dir().join("audit").join("query_log.jsonl"))
    }

    /// Resolve the API key for a provider from its environment variable.
    pub fn resolve_api_key(provider: &ProviderConfig) -> Option<String> {
        provider
            .api_key_env()
            .and_then(|env_var| std::env::var(env_var).ok())
    }

    /// Validate configuration values and provider secrets.
    pub fn validate(&self) -> AppResult<()> {
        if !SUPPORTED_LANGUAGES.contains(&self.responses.language.as_str()) {
            return Err(AppError::Config(format!(
                "Unsupported language: {}. Supported: {}",
                self.responses.language,
                SUPPORTED_LANGUAGES.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        if self.retrieval.top_k > self.retrieval.max_top_k {
            return Err(AppError::Config(format!(
                "retrieval.topK ({}) exceeds retrieval.maxTopK ({})",
                self.retrieval.top_k, self.retrieval.max_top_k
            )));
        }

        if self.retrieval.timeout_secs == 0 {
            return Err(AppError::Config(
                "retrieval.timeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.generation.timeout_secs == 0 {
            return Err(AppError::Config(
                "generation.timeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.audit.enabled && self.audit.timeout_ms == 0 {
            return Err(AppError::Config(
                "audit.timeoutMs must be at least 1".to_string(),
            ));
        }

        if self.retrieval.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "retrieval.embeddingDimensions must be positive".to_string(),
            ));
        }

        if self.generation.routing_threshold_tokens == 0 {
            return Err(AppError::Config(
                "generation.routingThresholdTokens must be positive".to_string(),
            ));
        }

        for slot in [&self.generation.default_model, &self.generation.extended_model] {
            if !(0.0..=2.0).contains(&slot.temperature) {
                return Err(AppError::Config(format!(
                    "Temperature for model '{}' must be within 0.0-2.0",
                    slot.provider.model()
                )));
            }

            if let Some(env_var) = slot.provider.api_key_env() {
                if std::env::var(env_var).is_err() {
                    return Err(AppError::Config(format!(
                        "API key not found in environment variable: {}",
                        env_var
                    )));
                }
            }
        }

        Ok(())
    }
}
