//! Single entry point from request text to a scheduling outcome.

use crate::composer::{EventComposer, ScheduleOutcome};
use crate::context::AppContext;
use crate::parser::utils::sanitize_user_input;
use crate::parser::{CascadeOutcome, ParseCascade};
use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;

pub struct Scheduler {
    cascade: ParseCascade,
    composer: EventComposer,
    zone: Tz,
}

impl Scheduler {
    pub fn new(cascade: ParseCascade, composer: EventComposer, zone: Tz) -> Self {
        Self { cascade, composer, zone }
    }

    pub fn from_context(context: &AppContext) -> Result<Self> {
        Ok(Self::new(
            context.cascade()?,
            EventComposer::new(context.calendar()?),
            context.timezone,
        ))
    }

    pub fn is_simulating(&self) -> bool {
        self.composer.is_simulating()
    }

    /// Schedule `text` relative to the current instant in the configured zone
    pub async fn schedule(&self, text: &str) -> ScheduleOutcome {
        self.schedule_at(text, Utc::now().with_timezone(&self.zone)).await
    }

    pub async fn schedule_at(&self, text: &str, reference_now: DateTime<Tz>) -> ScheduleOutcome {
        let text = sanitize_user_input(text);
        info!("Scheduling request: {}", text);
        match self.cascade.run(&text, reference_now).await {
            CascadeOutcome::Succeeded(request) => self.composer.dispatch(&request).await,
            CascadeOutcome::Exhausted => ScheduleOutcome::Unparsed,
        }
    }
}
