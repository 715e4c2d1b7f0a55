use todo_reminder_api::Application;
use todo_reminder_infra::{Config, TodoReminderContext};
use todo_reminder_sdk::TodoReminderSDK;

pub struct TestApp {
    pub config: Config,
    pub address: String,
}

impl TestApp {
    /// SDK acting on behalf of the given user
    pub fn sdk(&self, user_id: &str) -> TodoReminderSDK {
        TodoReminderSDK::new(self.address.clone(), user_id)
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut ctx = TodoReminderContext::create_inmemory();
    ctx.config.port = 0; // Random port

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp { config, address }
}
