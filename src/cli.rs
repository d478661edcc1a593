use clap::Parser;
use std::path::PathBuf;

/// MeetSched - schedule meetings from plain-English requests
#[derive(Debug, Parser)]
#[command(name = "meetsched")]
#[command(about = "Schedule meetings from plain-English requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the config file (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// IANA timezone to interpret requests in, e.g. "Europe/London"
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,

    /// Parse with the pattern grammar only; never call the language model
    #[arg(long)]
    pub offline: bool,

    /// Request to schedule once (if not specified, enters interactive mode)
    #[arg(value_name = "REQUEST")]
    pub request: Vec<String>,
}

impl Cli {
    /// The one-shot request, if any words were given
    pub fn request_text(&self) -> Option<String> {
        let text = self.request.join(" ");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}
