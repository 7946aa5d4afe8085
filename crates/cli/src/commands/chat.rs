use std::io::{self, Write};
use std::sync::Arc;

use docket_agent::actions::{default_registry, ActionContext};
use docket_agent::llm::build_candidates;
use docket_agent::{MemoryLog, ProviderGateway, SessionRuntime, TurnOutcome};
use docket_core::config::{AppConfig, LoadOptions};
use docket_core::domain::FirmId;
use docket_db::repositories::{
    SqlCaseRepository, SqlClientRepository, SqlDocumentRepository, SqlEventRepository,
    SqlHearingRepository, SqlTranscriptRepository,
};
use docket_db::{connect_with_settings, migrations, DEFAULT_FIRM_ID};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(session(config)) {
        Ok(()) => CommandResult::success("chat", "session closed"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

fn init_logging(config: &AppConfig) {
    use docket_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

async fn session(config: AppConfig) -> Result<(), (&'static str, String, u8)> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;

    let firm = FirmId(
        config
            .firm_uuid()
            .map_err(|error| ("config_validation", error.to_string(), 2u8))?
            .unwrap_or(DEFAULT_FIRM_ID),
    );

    let candidates =
        build_candidates(&config.llm).map_err(|error| ("llm_setup", error.to_string(), 6u8))?;
    let gateway = ProviderGateway::select(candidates)
        .await
        .map_err(|error| ("llm_unreachable", error.to_string(), 6u8))?;

    let transcript = MemoryLog::open(firm, Arc::new(SqlTranscriptRepository::new(pool.clone())))
        .await
        .map_err(|error| ("persistence", error.to_string(), 4u8))?;

    let context = ActionContext {
        firm,
        clients: Arc::new(SqlClientRepository::new(pool.clone())),
        cases: Arc::new(SqlCaseRepository::new(pool.clone())),
        hearings: Arc::new(SqlHearingRepository::new(pool.clone())),
        documents: Arc::new(SqlDocumentRepository::new(pool.clone())),
        events: Arc::new(SqlEventRepository::new(pool.clone())),
        llm: gateway.client(),
    };

    println!(
        "docket ready ({} backend). Type /quit to leave, /clear to reset the transcript.",
        gateway.provider_tag()
    );

    let mut session =
        SessionRuntime::new(&config.firm.name, gateway, transcript, default_registry(), context);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(error) => return Err(("io", error.to_string(), 3u8)),
        }

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" || text == "/exit" {
            return Ok(());
        }
        if text == "/clear" {
            match session.clear_transcript().await {
                Ok(()) => println!("transcript cleared"),
                Err(error) => {
                    tracing::error!(%error, "chat.clear_failed");
                    println!("{}", error.user_message());
                }
            }
            continue;
        }

        match session.handle_message(text).await {
            Ok(TurnOutcome::Reply { text }) => println!("{text}"),
            Ok(TurnOutcome::ConfirmationRequested { prompt }) => {
                println!("{prompt}");
                println!("(yes to run it, no to cancel)");
            }
            Ok(TurnOutcome::ActionsCompleted { lines, follow_up }) => {
                for line in &lines {
                    println!("{line}");
                }
                if let Some(prompt) = follow_up {
                    println!("{prompt}");
                    println!("(yes to run it, no to cancel)");
                }
            }
            Err(error) => {
                tracing::error!(%error, "chat.turn_failed");
                println!("{}", error.user_message());
            }
        }
    }
}
