use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use chrono_tz::US::Pacific;
use meetsched::calendar::{CalendarCollaborator, CalendarError};
use meetsched::contacts::{ContactDirectory, ContactResolver};
use meetsched::parser::semantic::LanguageModel;
use meetsched::parser::{PatternParser, SemanticParser, TemporalNormalizer, UpstreamError};
use meetsched::{EventComposer, OutboundEvent, ParseCascade, ScheduleOutcome, Scheduler};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn reference() -> DateTime<Tz> {
    Pacific.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

fn directory() -> ContactDirectory {
    ContactDirectory::new([
        ("john", "Johnathan Smith"),
        ("sarah", "Sarah Kapoor"),
        ("raj", "Raj Mehta"),
        ("viv", "Vivek Singh"),
        ("amy", "Amelia Zhang"),
    ])
}

fn cascade(model: Option<Box<dyn LanguageModel>>) -> ParseCascade {
    let normalizer = TemporalNormalizer::new(Pacific);
    ParseCascade::new(
        SemanticParser::new(model, normalizer),
        PatternParser::new(normalizer),
        ContactResolver::new(directory()),
    )
}

/// Records the serialized bytes of every event it receives
#[derive(Clone, Default)]
struct RecordingCalendar {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl CalendarCollaborator for RecordingCalendar {
    async fn create_event(&self, event: &OutboundEvent) -> Result<String, CalendarError> {
        let bytes = serde_json::to_vec(event).map_err(|e| CalendarError::InvalidResponse(e.to_string()))?;
        let mut payloads = self.payloads.lock().unwrap();
        payloads.push(bytes);
        Ok(format!("https://calendar.example/event/{}", payloads.len()))
    }
}

struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, UpstreamError> {
        Err(UpstreamError::Timeout)
    }
}

#[tokio::test]
async fn test_simulated_sync_call_with_sarah() {
    let scheduler = Scheduler::new(cascade(None), EventComposer::new(None), Pacific);
    let outcome = scheduler
        .schedule_at("Set a sync call with Sarah tomorrow at 5pm", reference())
        .await;

    assert_eq!(
        outcome,
        ScheduleOutcome::Simulated {
            title: "Sync call with Sarah Kapoor".to_string(),
            start: Pacific.with_ymd_and_hms(2026, 10, 20, 17, 0, 0).unwrap(),
        }
    );
    assert_eq!(
        outcome.to_string(),
        "📝 Simulated: 'Sync call with Sarah Kapoor' at 2026-10-20 05:00 PM PDT"
    );
}

#[tokio::test]
async fn test_scheduled_demo_with_amy_after_upstream_failure() {
    let calendar = RecordingCalendar::default();
    let scheduler = Scheduler::new(
        cascade(Some(Box::new(UnavailableModel))),
        EventComposer::new(Some(Box::new(calendar.clone()))),
        Pacific,
    );

    let outcome = scheduler
        .schedule_at("Set a demo with Amy at 2pm for 45 minutes", reference())
        .await;
    assert_eq!(
        outcome.to_string(),
        "✅ Scheduled: Demo with Amelia Zhang\n👉 https://calendar.example/event/1"
    );

    let payloads = calendar.payloads.lock().unwrap();
    let event: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(event["title"], "Demo with Amelia Zhang");
    assert_eq!(event["start"], "2026-10-19T14:00:00-07:00");
    assert_eq!(event["end"], "2026-10-19T14:45:00-07:00");
    assert_eq!(event["time_zone"], "US/Pacific");
}

#[tokio::test]
async fn test_unparseable_request() {
    let calendar = RecordingCalendar::default();
    let scheduler = Scheduler::new(
        cascade(None),
        EventComposer::new(Some(Box::new(calendar.clone()))),
        Pacific,
    );

    let outcome = scheduler.schedule_at("hello there", reference()).await;
    assert_eq!(outcome, ScheduleOutcome::Unparsed);
    assert!(calendar.payloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dispatch_is_repeatable() {
    let calendar = RecordingCalendar::default();
    let scheduler = Scheduler::new(
        cascade(None),
        EventComposer::new(Some(Box::new(calendar.clone()))),
        Pacific,
    );

    for _ in 0..2 {
        scheduler
            .schedule_at("Set a 1:1 with Viv next Tuesday at 9:30am", reference())
            .await;
    }

    let payloads = calendar.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0], payloads[1]);
    let event: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(event["title"], "1:1 with Vivek Singh");
    assert_eq!(event["start"], "2026-10-20T09:30:00-07:00");
}

#[tokio::test]
async fn test_unknown_contact_is_title_cased() {
    let scheduler = Scheduler::new(cascade(None), EventComposer::new(None), Pacific);
    let outcome = scheduler
        .schedule_at("Set a meeting with priya on Monday at 3pm", reference())
        .await;

    assert_eq!(
        outcome,
        ScheduleOutcome::Simulated {
            title: "Meeting with Priya".to_string(),
            start: Pacific.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap(),
        }
    );
}
