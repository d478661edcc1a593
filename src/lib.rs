pub mod app;
pub mod calendar;
pub mod cli;
pub mod composer;
pub mod config;
pub mod contacts;
pub mod context;
pub mod env_manager;
pub mod meeting;
pub mod parser;
pub mod scheduler;

use anyhow::Result;
use log::*;

/// Resolve settings, build the scheduler and run one request or the interactive loop
pub async fn run(cli: cli::Cli) -> Result<()> {
    env_manager::load_env_file();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(timezone) = &cli.timezone {
        config.timezone = timezone.clone();
    }

    let context = AppContext::new(config, env_manager::openai_api_key())?.offline(cli.offline);
    info!("Initializing MeetSched in {}", context.timezone);

    let app = app::Application::new(Scheduler::from_context(&context)?);
    match cli.request_text() {
        Some(request) => {
            app.run_once(&request).await;
            Ok(())
        }
        None => app.run().await,
    }
}

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use composer::{EventComposer, OutboundEvent, ScheduleOutcome};
pub use config::Config;
pub use context::AppContext;
pub use meeting::MeetingRequest;
pub use parser::{CascadeOutcome, ParseCascade};
pub use scheduler::Scheduler;
