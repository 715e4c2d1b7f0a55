use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Delivers reminder notifications to a user
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    async fn send_text(&self, user_id: &str, text: &str) -> anyhow::Result<()>;
    async fn send_image(&self, user_id: &str, blob_ref: &str, url: &str) -> anyhow::Result<()>;
}

/// Used when no chat bot is configured, notifications are only logged
pub struct LogNotifier {}

#[async_trait::async_trait]
impl INotifier for LogNotifier {
    async fn send_text(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        warn!(
            "No notifier configured. Text message to user: {} was: {}",
            user_id, text
        );
        Ok(())
    }

    async fn send_image(&self, user_id: &str, blob_ref: &str, url: &str) -> anyhow::Result<()> {
        warn!(
            "No notifier configured. Image message to user: {} was: {} ({})",
            user_id, blob_ref, url
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendPrivateMessageRequest<'a> {
    user_id: i64,
    message: &'a str,
    auto_escape: bool,
}

#[derive(Debug, Deserialize)]
struct GoCqResponse {
    retcode: i64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    wording: Option<String>,
}

/// Notifier talking to a go-cqhttp compatible chat bot
pub struct GoCqNotifier {
    client: Client,
    base_url: String,
}

const SEND_PRIVATE_MESSAGE_ENDPOINT: &str = "send_private_msg";

impl GoCqNotifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn send_private_message(
        &self,
        user_id: &str,
        message: &str,
        auto_escape: bool,
    ) -> anyhow::Result<()> {
        let user_id = user_id.parse::<i64>().map_err(|_| {
            anyhow::Error::msg(format!("User id: {} is not a valid chat bot user", user_id))
        })?;
        let body = SendPrivateMessageRequest {
            user_id,
            message,
            auto_escape,
        };
        let res = match self
            .client
            .post(&format!("{}/{}", self.base_url, SEND_PRIVATE_MESSAGE_ENDPOINT))
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res.json::<GoCqResponse>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] Chat bot send message error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            })?,
            Err(e) => {
                error!(
                    "[Network Error] Chat bot send message error. Error message: {:?}",
                    e
                );
                return Err(anyhow::Error::new(e));
            }
        };

        if res.retcode != 0 {
            return Err(anyhow::Error::msg(format!(
                "Chat bot rejected message with retcode: {}, status: {}, wording: {}",
                res.retcode,
                res.status,
                res.wording.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

pub fn image_message(url: &str) -> String {
    format!("[CQ:image,file={}]", url)
}

#[async_trait::async_trait]
impl INotifier for GoCqNotifier {
    async fn send_text(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        self.send_private_message(user_id, text, true).await
    }

    async fn send_image(&self, user_id: &str, _blob_ref: &str, url: &str) -> anyhow::Result<()> {
        self.send_private_message(user_id, &image_message(url), false)
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_image_messages() {
        assert_eq!(
            image_message("http://localhost:9000/b/cat.png?expires=1"),
            "[CQ:image,file=http://localhost:9000/b/cat.png?expires=1]"
        );
    }

    #[test]
    fn parses_bot_responses() {
        let res: GoCqResponse =
            serde_json::from_str(r#"{"status":"failed","retcode":100,"data":null}"#).unwrap();
        assert_eq!(res.retcode, 100);
        assert_eq!(res.status, "failed");
        let res: GoCqResponse =
            serde_json::from_str(r#"{"status":"ok","retcode":0,"data":{"message_id":1}}"#)
                .unwrap();
        assert_eq!(res.retcode, 0);
    }

    #[tokio::test]
    async fn rejects_non_numeric_user_ids() {
        let notifier = GoCqNotifier::new("http://localhost:1".into());
        assert!(notifier.send_text("not-a-number", "hello").await.is_err());
    }
}
