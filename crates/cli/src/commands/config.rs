use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use docket_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source(
            "database.url",
            Some("DOCKET_DATABASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source(
            "database.max_connections",
            Some("DOCKET_DATABASE_MAX_CONNECTIONS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source(
            "database.timeout_secs",
            Some("DOCKET_DATABASE_TIMEOUT_SECS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    let priority =
        config.llm.priority.iter().map(|backend| backend.as_str()).collect::<Vec<_>>().join(",");
    lines.push(render_line(
        "llm.priority",
        &priority,
        field_source(
            "llm.priority",
            Some("DOCKET_LLM_PRIORITY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        field_source(
            "llm.timeout_secs",
            Some("DOCKET_LLM_TIMEOUT_SECS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "llm.openai.model",
        &config.llm.openai.model,
        field_source(
            "llm.openai.model",
            Some("DOCKET_OPENAI_MODEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.openai.base_url",
        config.llm.openai.base_url.as_deref().unwrap_or("<unset>"),
        field_source(
            "llm.openai.base_url",
            Some("DOCKET_OPENAI_BASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let openai_api_key = if config.llm.openai.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.openai.api_key",
        openai_api_key,
        field_source(
            "llm.openai.api_key",
            Some("DOCKET_OPENAI_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "llm.anthropic.model",
        &config.llm.anthropic.model,
        field_source(
            "llm.anthropic.model",
            Some("DOCKET_ANTHROPIC_MODEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let anthropic_api_key =
        if config.llm.anthropic.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.anthropic.api_key",
        anthropic_api_key,
        field_source(
            "llm.anthropic.api_key",
            Some("DOCKET_ANTHROPIC_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "llm.ollama.base_url",
        &config.llm.ollama.base_url,
        field_source(
            "llm.ollama.base_url",
            Some("DOCKET_OLLAMA_BASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.ollama.model",
        &config.llm.ollama.model,
        field_source(
            "llm.ollama.model",
            Some("DOCKET_OLLAMA_MODEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "firm.id",
        config.firm.id.as_deref().unwrap_or("<unset>"),
        field_source(
            "firm.id",
            Some("DOCKET_FIRM_ID"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "firm.name",
        &config.firm.name,
        field_source(
            "firm.name",
            Some("DOCKET_FIRM_NAME"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    // Both logging vars have a short-form fallback; attribute whichever is set.
    let level_env = if env::var_os("DOCKET_LOGGING_LEVEL").is_some() {
        "DOCKET_LOGGING_LEVEL"
    } else {
        "DOCKET_LOG_LEVEL"
    };
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some(level_env),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let format_env = if env::var_os("DOCKET_LOGGING_FORMAT").is_some() {
        "DOCKET_LOGGING_FORMAT"
    } else {
        "DOCKET_LOG_FORMAT"
    };
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some(format_env),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("docket.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/docket.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
