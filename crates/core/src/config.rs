//! Configuration management for ragdesk.
//!
//! Settings are resolved in layers, later layers winning:
//! - Built-in defaults (local Ollama server, small generation model)
//! - The settings file (`.ragdesk/config.yaml` or `--config`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: indices and the settings file live
//! under `<workspace>/.ragdesk/` unless configured otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default Ollama-compatible model server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "qwen2.5:0.5b";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large:latest";

/// Default web search endpoint (DuckDuckGo's HTML results page).
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Default timeout applied to every outbound request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragdesk/)
    pub workspace: PathBuf,

    /// Optional settings file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the model server
    pub endpoint: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider ("ollama" or "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Index storage directory; relative paths resolve against the workspace
    pub index_dir: Option<PathBuf>,

    /// Web search results page queried by `search`
    pub search_endpoint: String,

    /// Timeout for embedding, listing and non-streaming generation calls
    pub request_timeout_secs: u64,

    /// Sampling options forwarded to the generation call
    pub generation: GenerationSettings,

    /// Handlebars template for the grounded prompt
    pub prompt_template: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Sampling options for generation; unset fields use the server default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(
        default,
        rename = "maxTokens",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_tokens: Option<u32>,

    #[serde(default, rename = "topP", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// On-disk settings file. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(
        default,
        rename = "embeddingProvider",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding_provider: Option<String>,

    #[serde(
        default,
        rename = "embeddingModel",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding_model: Option<String>,

    #[serde(
        default,
        rename = "indexDir",
        skip_serializing_if = "Option::is_none"
    )]
    pub index_dir: Option<PathBuf>,

    #[serde(
        default,
        rename = "searchEndpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_endpoint: Option<String>,

    #[serde(
        default,
        rename = "requestTimeoutSecs",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSettings>,

    #[serde(
        default,
        rename = "promptTemplate",
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            index_dir: None,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            generation: GenerationSettings::default(),
            prompt_template: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the settings file and the environment.
    ///
    /// `workspace` and `config_file` come from the command line (which itself
    /// falls back to `RAGDESK_WORKSPACE` / `RAGDESK_CONFIG`).
    ///
    /// Environment variables:
    /// - `RAGDESK_ENDPOINT`: Model server base URL
    /// - `RAGDESK_MODEL`: Generation model
    /// - `RAGDESK_EMBEDDING_MODEL`: Embedding model
    /// - `RAGDESK_SEARCH_ENDPOINT`: Web search results page
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragdesk_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Indices: {:?}", config.index_dir());
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let settings_path = config.settings_path();
        if settings_path.exists() {
            let settings = read_settings(&settings_path)?;
            config.merge_settings(settings);
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Settings file does not exist: {:?}",
                settings_path
            )));
        }

        // Environment variables override the settings file
        if let Ok(endpoint) = std::env::var("RAGDESK_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("RAGDESK_MODEL") {
            config.model = model;
        }

        if let Ok(model) = std::env::var("RAGDESK_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        if let Ok(endpoint) = std::env::var("RAGDESK_SEARCH_ENDPOINT") {
            config.search_endpoint = endpoint;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a parsed settings file into this config.
    pub fn merge_settings(&mut self, settings: SettingsFile) {
        if let Some(endpoint) = settings.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(model) = settings.model {
            self.model = model;
        }
        if let Some(provider) = settings.embedding_provider {
            self.embedding_provider = provider;
        }
        if let Some(model) = settings.embedding_model {
            self.embedding_model = model;
        }
        if let Some(dir) = settings.index_dir {
            self.index_dir = Some(dir);
        }
        if let Some(endpoint) = settings.search_endpoint {
            self.search_endpoint = endpoint;
        }
        if let Some(timeout) = settings.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(generation) = settings.generation {
            self.generation = generation;
        }
        if let Some(template) = settings.prompt_template {
            self.prompt_template = Some(template);
        }
        if let Some(logging) = settings.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the
    /// settings file.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        model: Option<String>,
        embedding_model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(embedding_model) = embedding_model {
            self.embedding_model = embedding_model;
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

        self
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

    /// Path of the settings file in effect (explicit or workspace default).
    pub fn settings_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref path) => path.clone(),
            None => self.ragdesk_dir().join("config.yaml"),
        }
    }

    /// Directory holding persisted indices.
    pub fn index_dir(&self) -> PathBuf {
        match self.index_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.ragdesk_dir().join("indices"),
        }
    }

    /// Snapshot of the resolved settings in settings-file form.
    pub fn to_settings(&self) -> SettingsFile {
        SettingsFile {
            endpoint: Some(self.endpoint.clone()),
            model: Some(self.model.clone()),
            embedding_provider: Some(self.embedding_provider.clone()),
            embedding_model: Some(self.embedding_model.clone()),
            index_dir: Some(self.index_dir()),
            search_endpoint: Some(self.search_endpoint.clone()),
            request_timeout_secs: Some(self.request_timeout_secs),
            generation: Some(self.generation.clone()),
            prompt_template: self.prompt_template.clone(),
            logging: Some(LoggingSettings {
                level: self.log_level.clone(),
                color: Some(!self.no_color),
            }),
        }
    }

    /// Write the resolved settings to the settings file.
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn write_settings(&self, force: bool) -> AppResult<PathBuf> {
        let path = self.settings_path();
        if path.exists() && !force {
            return Err(AppError::Config(format!(
                "Settings file already exists: {:?} (use --force to overwrite)",
                path
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&self.to_settings())?;
        std::fs::write(&path, yaml).map_err(|e| {
            AppError::Config(format!("Failed to write settings file {:?}: {}", path, e))
        })?;

        tracing::debug!("Wrote settings to {:?}", path);
        Ok(path)
    }

    /// Validate the resolved configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if !(self.search_endpoint.starts_with("http://")
            || self.search_endpoint.starts_with("https://"))
        {
            return Err(AppError::Config(format!(
                "Search endpoint must be an http(s) URL: {}",
                self.search_endpoint
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() || self.embedding_model.trim().is_empty() {
            return Err(AppError::Config("Model names must not be empty".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }

        if let Some(t) = self.generation.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AppError::Config(format!(
                    "temperature must be within 0.0-2.0, got {}",
                    t
                )));
            }
        }

        if let Some(p) = self.generation.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(AppError::Config(format!(
                    "topP must be within 0.0-1.0, got {}",
                    p
                )));
            }
        }

        Ok(())
    }
}

/// Read and parse a settings file.
fn read_settings(path: &Path) -> AppResult<SettingsFile> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read settings file {:?}: {}", path, e))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Config(format!("Failed to parse settings file {:?}: {}", path, e))
    })
}
