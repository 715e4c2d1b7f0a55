use actix_web::rt::time::sleep;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};
use todo_reminder_domain::HolidayDay;
use todo_reminder_infra::{
    ControlledSys, INotifier, StaticHolidayProvider, TodoReminderContext,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text { user_id: String, text: String },
    Image { user_id: String, blob_ref: String },
}

/// Notifier that records every message and can be told to fail,
/// or to never answer, for some users
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing_users: Mutex<HashSet<String>>,
    pub stalled_users: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, user_id: &str) {
        self.failing_users.lock().unwrap().insert(user_id.to_string());
    }

    pub fn stall_for(&self, user_id: &str) {
        self.stalled_users.lock().unwrap().insert(user_id.to_string());
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn check(&self, user_id: &str) -> anyhow::Result<()> {
        let stalled = self.stalled_users.lock().unwrap().contains(user_id);
        if stalled {
            sleep(Duration::from_secs(60)).await;
        }
        if self.failing_users.lock().unwrap().contains(user_id) {
            return Err(anyhow::Error::msg("Chat bot is unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl INotifier for RecordingNotifier {
    async fn send_text(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        self.check(user_id).await?;
        self.sent.lock().unwrap().push(SentMessage::Text {
            user_id: user_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_image(&self, user_id: &str, blob_ref: &str, _url: &str) -> anyhow::Result<()> {
        self.check(user_id).await?;
        self.sent.lock().unwrap().push(SentMessage::Image {
            user_id: user_id.to_string(),
            blob_ref: blob_ref.to_string(),
        });
        Ok(())
    }
}

pub struct TestContext {
    pub ctx: TodoReminderContext,
    pub sys: Arc<ControlledSys>,
    pub notifier: Arc<RecordingNotifier>,
}

/// In memory context in UTC with a controlled clock starting at `now`
pub fn setup(now: i64) -> TestContext {
    setup_with_holidays(now, Vec::new())
}

pub fn setup_with_holidays(now: i64, holidays: Vec<HolidayDay>) -> TestContext {
    let mut ctx = TodoReminderContext::create_inmemory();
    ctx.config.timezone = chrono_tz::UTC;
    let sys = Arc::new(ControlledSys::new(now));
    let notifier = Arc::new(RecordingNotifier::default());
    ctx.sys = sys.clone();
    ctx.services.notifier = notifier.clone();
    ctx.services.holiday_provider = Arc::new(StaticHolidayProvider::new(holidays));

    TestContext { ctx, sys, notifier }
}
