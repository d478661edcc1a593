//! The resolved meeting handed from the parse cascade to the event composer.

use chrono::DateTime;
use chrono_tz::Tz;

/// Duration used when a request does not state one
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMeeting {
    #[error("meeting title is empty")]
    EmptyTitle,
    #[error("meeting person is empty")]
    EmptyPerson,
    #[error("meeting duration must be positive")]
    ZeroDuration,
}

/// A fully resolved meeting, alive for the duration of one scheduling call
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRequest {
    title: String,
    person: String,
    start_time: DateTime<Tz>,
    duration_minutes: u32,
}

impl MeetingRequest {
    pub fn new(
        title: impl Into<String>,
        person: impl Into<String>,
        start_time: DateTime<Tz>,
        duration_minutes: u32,
    ) -> Result<Self, InvalidMeeting> {
        let title = title.into();
        let person = person.into();
        if title.trim().is_empty() {
            return Err(InvalidMeeting::EmptyTitle);
        }
        if person.trim().is_empty() {
            return Err(InvalidMeeting::EmptyPerson);
        }
        if duration_minutes == 0 {
            return Err(InvalidMeeting::ZeroDuration);
        }
        Ok(Self { title, person, start_time, duration_minutes })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn person(&self) -> &str {
        &self.person
    }

    pub fn start_time(&self) -> DateTime<Tz> {
        self.start_time
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}
