//! Turns a resolved meeting into an outbound calendar event and reports the result.

use crate::calendar::CalendarCollaborator;
use crate::meeting::MeetingRequest;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use log::{error, info};
use serde::Serialize;
use std::fmt;

/// Event payload handed to the calendar collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub duration_minutes: u32,
    pub time_zone: String,
}

/// User-facing result of one scheduling request
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    Scheduled { title: String, link: String },
    Simulated { title: String, start: DateTime<Tz> },
    Failed { title: String, error: String },
    Unparsed,
}

impl fmt::Display for ScheduleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleOutcome::Scheduled { title, link } => {
                write!(f, "✅ Scheduled: {}\n👉 {}", title, link)
            }
            ScheduleOutcome::Simulated { title, start } => {
                write!(f, "📝 Simulated: '{}' at {}", title, start.format("%Y-%m-%d %I:%M %p %Z"))
            }
            ScheduleOutcome::Failed { error, .. } => {
                write!(f, "❌ Failed to schedule with Google Calendar: {}", error)
            }
            ScheduleOutcome::Unparsed => {
                write!(f, "❌ Unable to parse meeting request. Please try a different phrasing.")
            }
        }
    }
}

pub struct EventComposer {
    calendar: Option<Box<dyn CalendarCollaborator>>,
}

impl EventComposer {
    /// Without a calendar every dispatch is simulated
    pub fn new(calendar: Option<Box<dyn CalendarCollaborator>>) -> Self {
        Self { calendar }
    }

    pub fn is_simulating(&self) -> bool {
        self.calendar.is_none()
    }

    /// Build the event for `request`; the person is appended to the title exactly once
    pub fn compose(request: &MeetingRequest) -> OutboundEvent {
        let start = request.start_time();
        OutboundEvent {
            title: format!("{} with {}", request.title(), request.person()),
            start,
            end: start + Duration::minutes(i64::from(request.duration_minutes())),
            duration_minutes: request.duration_minutes(),
            time_zone: start.timezone().name().to_string(),
        }
    }

    pub async fn dispatch(&self, request: &MeetingRequest) -> ScheduleOutcome {
        let event = Self::compose(request);

        let Some(calendar) = &self.calendar else {
            info!("Simulating event: {:?}", event);
            return ScheduleOutcome::Simulated { title: event.title, start: event.start };
        };

        match calendar.create_event(&event).await {
            Ok(link) => {
                info!("Created event '{}': {}", event.title, link);
                ScheduleOutcome::Scheduled { title: event.title, link }
            }
            Err(e) => {
                error!("Failed to create event '{}': {}", event.title, e);
                ScheduleOutcome::Failed { title: event.title, error: e.to_string() }
            }
        }
    }
}
