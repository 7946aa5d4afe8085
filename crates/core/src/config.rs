use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub firm: FirmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// Backends probed in order at session start. The first reachable one
    /// serves the whole session.
    pub priority: Vec<LlmBackend>,
    pub openai: OpenAiConfig,
    pub anthropic: AnthropicConfig,
    pub ollama: OllamaConfig,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: Option<SecretString>,
    /// Override for OpenAI-compatible proxies; defaults to the public API.
    pub base_url: Option<String>,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct FirmConfig {
    /// Tenant identifier. When unset, the bundled default firm is used.
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmBackend {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_priority: Option<Vec<LlmBackend>>,
    pub firm_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://docket.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                priority: vec![LlmBackend::Ollama],
                openai: OpenAiConfig {
                    api_key: None,
                    base_url: None,
                    model: "gpt-4o-mini".to_string(),
                },
                anthropic: AnthropicConfig {
                    api_key: None,
                    model: "claude-3-5-sonnet-latest".to_string(),
                },
                ollama: OllamaConfig {
                    base_url: "http://localhost:11434".to_string(),
                    model: "llama3.1".to_string(),
                },
                timeout_secs: 30,
            },
            firm: FirmConfig { id: None, name: "Solo Practice".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm backend `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Parses a comma-separated backend list, e.g. `openai,ollama`.
pub fn parse_priority(raw: &str) -> Result<Vec<LlmBackend>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("docket.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(priority) = llm.priority {
                self.llm.priority = priority;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(openai) = llm.openai {
                if let Some(api_key_value) = openai.api_key {
                    self.llm.openai.api_key = Some(secret_value(api_key_value));
                }
                if let Some(base_url) = openai.base_url {
                    self.llm.openai.base_url = Some(base_url);
                }
                if let Some(model) = openai.model {
                    self.llm.openai.model = model;
                }
            }
            if let Some(anthropic) = llm.anthropic {
                if let Some(api_key_value) = anthropic.api_key {
                    self.llm.anthropic.api_key = Some(secret_value(api_key_value));
                }
                if let Some(model) = anthropic.model {
                    self.llm.anthropic.model = model;
                }
            }
            if let Some(ollama) = llm.ollama {
                if let Some(base_url) = ollama.base_url {
                    self.llm.ollama.base_url = base_url;
                }
                if let Some(model) = ollama.model {
                    self.llm.ollama.model = model;
                }
            }
        }

        if let Some(firm) = patch.firm {
            if let Some(id) = firm.id {
                self.firm.id = Some(id);
            }
            if let Some(name) = firm.name {
                self.firm.name = name;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DOCKET_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DOCKET_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("DOCKET_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DOCKET_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DOCKET_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DOCKET_LLM_PRIORITY") {
            self.llm.priority = parse_priority(&value)?;
        }
        if let Some(value) = read_env("DOCKET_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("DOCKET_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DOCKET_OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DOCKET_OPENAI_BASE_URL") {
            self.llm.openai.base_url = Some(value);
        }
        if let Some(value) = read_env("DOCKET_OPENAI_MODEL") {
            self.llm.openai.model = value;
        }
        if let Some(value) = read_env("DOCKET_ANTHROPIC_API_KEY") {
            self.llm.anthropic.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DOCKET_ANTHROPIC_MODEL") {
            self.llm.anthropic.model = value;
        }
        if let Some(value) = read_env("DOCKET_OLLAMA_BASE_URL") {
            self.llm.ollama.base_url = value;
        }
        if let Some(value) = read_env("DOCKET_OLLAMA_MODEL") {
            self.llm.ollama.model = value;
        }

        if let Some(value) = read_env("DOCKET_FIRM_ID") {
            self.firm.id = Some(value);
        }
        if let Some(value) = read_env("DOCKET_FIRM_NAME") {
            self.firm.name = value;
        }

        let log_level = read_env("DOCKET_LOGGING_LEVEL").or_else(|| read_env("DOCKET_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DOCKET_LOGGING_FORMAT").or_else(|| read_env("DOCKET_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_priority) = overrides.llm_priority {
            self.llm.priority = llm_priority;
        }
        if let Some(firm_id) = overrides.firm_id {
            self.firm.id = Some(firm_id);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_firm(&self.firm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// The tenant id as a parsed UUID, when one is configured.
    pub fn firm_uuid(&self) -> Result<Option<Uuid>, ConfigError> {
        match &self.firm.id {
            None => Ok(None),
            Some(raw) => Uuid::parse_str(raw.trim()).map(Some).map_err(|_| {
                ConfigError::Validation(format!("firm.id is not a valid UUID: `{raw}`"))
            }),
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("docket.toml"), PathBuf::from("config/docket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.priority.is_empty() {
        return Err(ConfigError::Validation(
            "llm.priority must name at least one backend".to_string(),
        ));
    }

    for (index, backend) in llm.priority.iter().enumerate() {
        if llm.priority[..index].contains(backend) {
            return Err(ConfigError::Validation(format!(
                "llm.priority lists `{}` more than once",
                backend.as_str()
            )));
        }
    }

    for backend in &llm.priority {
        match backend {
            LlmBackend::OpenAi => {
                let has_key = llm
                    .openai
                    .api_key
                    .as_ref()
                    .map(|value| !value.expose_secret().trim().is_empty())
                    .unwrap_or(false);
                let has_base_url = llm
                    .openai
                    .base_url
                    .as_ref()
                    .map(|value| !value.trim().is_empty())
                    .unwrap_or(false);
                if !has_key && !has_base_url {
                    return Err(ConfigError::Validation(
                        "llm.openai.api_key (or base_url for a compatible proxy) is required when openai is in llm.priority"
                            .to_string(),
                    ));
                }
                if llm.openai.model.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "llm.openai.model must not be empty".to_string(),
                    ));
                }
            }
            LlmBackend::Anthropic => {
                let has_key = llm
                    .anthropic
                    .api_key
                    .as_ref()
                    .map(|value| !value.expose_secret().trim().is_empty())
                    .unwrap_or(false);
                if !has_key {
                    return Err(ConfigError::Validation(
                        "llm.anthropic.api_key is required when anthropic is in llm.priority"
                            .to_string(),
                    ));
                }
                if llm.anthropic.model.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "llm.anthropic.model must not be empty".to_string(),
                    ));
                }
            }
            LlmBackend::Ollama => {
                let base_url = llm.ollama.base_url.trim();
                if base_url.is_empty() {
                    return Err(ConfigError::Validation(
                        "llm.ollama.base_url is required when ollama is in llm.priority"
                            .to_string(),
                    ));
                }
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(ConfigError::Validation(
                        "llm.ollama.base_url must start with http:// or https://".to_string(),
                    ));
                }
                if llm.ollama.model.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "llm.ollama.model must not be empty".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn validate_firm(firm: &FirmConfig) -> Result<(), ConfigError> {
    if firm.name.trim().is_empty() {
        return Err(ConfigError::Validation("firm.name must not be empty".to_string()));
    }

    if let Some(id) = &firm.id {
        if Uuid::parse_str(id.trim()).is_err() {
            return Err(ConfigError::Validation(format!("firm.id is not a valid UUID: `{id}`")));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    firm: Option<FirmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    priority: Option<Vec<LlmBackend>>,
    timeout_secs: Option<u64>,
    openai: Option<OpenAiPatch>,
    anthropic: Option<AnthropicPatch>,
    ollama: Option<OllamaPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicPatch {
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaPatch {
    base_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FirmPatch {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmBackend, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_without_any_input() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.database.url == "sqlite://docket.db", "default db url")?;
        ensure(config.llm.priority == vec![LlmBackend::Ollama], "default backend is ollama")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_OPENAI_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("docket.toml");
            fs::write(
                &path,
                r#"
[llm]
priority = ["openai"]

[llm.openai]
api_key = "${TEST_OPENAI_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config
                .llm
                .openai
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string())
                .unwrap_or_default();
            ensure(api_key == "sk-from-env", "api key should be loaded from environment")
        })();

        clear_vars(&["TEST_OPENAI_KEY"]);
        result
    }

    #[test]
    fn priority_env_override_parses_comma_list() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_LLM_PRIORITY", "openai, ollama");
        env::set_var("DOCKET_OPENAI_API_KEY", "sk-test");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.priority == vec![LlmBackend::OpenAi, LlmBackend::Ollama],
                "priority should parse to openai then ollama",
            )
        })();

        clear_vars(&["DOCKET_LLM_PRIORITY", "DOCKET_OPENAI_API_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("docket.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["DOCKET_DATABASE_URL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_LLM_PRIORITY", "anthropic");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.anthropic.api_key")
            );
            ensure(has_message, "validation failure should mention llm.anthropic.api_key")
        })();

        clear_vars(&["DOCKET_LLM_PRIORITY"]);
        result
    }

    #[test]
    fn duplicate_priority_entries_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_LLM_PRIORITY", "ollama,ollama");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected duplicate priority to fail".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("more than once")
            );
            ensure(has_message, "validation failure should mention duplicate backend")
        })();

        clear_vars(&["DOCKET_LLM_PRIORITY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_OPENAI_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["DOCKET_OPENAI_API_KEY"]);
        result
    }

    #[test]
    fn bad_firm_id_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DOCKET_FIRM_ID", "not-a-uuid");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected firm id validation to fail".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("firm.id")
            );
            ensure(has_message, "validation failure should mention firm.id")
        })();

        clear_vars(&["DOCKET_FIRM_ID"]);
        result
    }
}
