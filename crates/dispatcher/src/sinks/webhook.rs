//! WebhookSink - one chat-style embed per event

use std::sync::Arc;

use contracts::{Channel, ContractError, Embed, EventKind, EventRecord, HttpRequest, HttpTransport, WebhookPayload};
use tracing::{debug, instrument};

use super::deliver;

const COLOR_CONNECT: u32 = 0x4CAF50;
const COLOR_DISCONNECT: u32 = 0xF44336;
const COLOR_CLAN: u32 = 0xFF9800;
const COLOR_WHISPER: u32 = 0x9C27B0;
const COLOR_LOCAL: u32 = 0x9E9E9E;
const COLOR_GLOBAL: u32 = 0x2196F3;

/// Colour and label for an event
pub fn embed_style(record: &EventRecord) -> (u32, &'static str) {
    match (record.kind(), record.channel()) {
        (EventKind::Connect, _) => (COLOR_CONNECT, "connected"),
        (EventKind::Disconnect, _) => (COLOR_DISCONNECT, "disconnected"),
        (EventKind::Chat, Some(Channel::Clan)) => (COLOR_CLAN, "Clan"),
        (EventKind::Chat, Some(Channel::Whisper)) => (COLOR_WHISPER, "Private"),
        (EventKind::Chat, Some(Channel::Local)) => (COLOR_LOCAL, "Local"),
        (EventKind::Chat, Some(Channel::Global) | None) => (COLOR_GLOBAL, "Global"),
    }
}

/// Sink that posts each event to a chat webhook
pub struct WebhookSink<T> {
    name: String,
    url: String,
    transport: Arc<T>,
}

impl<T: HttpTransport + Sync> WebhookSink<T> {
    pub fn new(url: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            name: "webhook".to_string(),
            url: url.into(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the embed for one record
    pub fn build_embed(record: &EventRecord) -> Embed {
        let (color, label) = embed_style(record);
        let description = match record.kind() {
            EventKind::Connect => format!("✅ **{}** {label}", record.player()),
            EventKind::Disconnect => format!("❌ **{}** {label}", record.player()),
            EventKind::Chat => format!(
                "**{}** [{label}]: {}",
                record.player(),
                record.message().unwrap_or_default()
            ),
        };
        Embed { color, description }
    }

    /// Post one record
    #[instrument(
        name = "webhook_sink_send",
        skip(self, record),
        fields(sink = %self.name, kind = %record.kind(), player = %record.player())
    )]
    pub async fn send(&self, record: &EventRecord) -> Result<(), ContractError> {
        let payload = WebhookPayload::single(Self::build_embed(record));
        let request = HttpRequest::json(&self.url, &payload)?;
        let response = deliver(self.transport.as_ref(), &self.name, &request).await?;
        debug!(status = response.status, "webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, MockTransportConfig};

    fn chat(channel: Channel) -> EventRecord {
        EventRecord::chat("Alice", channel, "hi", 1000).unwrap()
    }

    #[test]
    fn test_embed_table() {
        let cases = [
            (EventRecord::connect("Bob", 1).unwrap(), 0x4CAF50, "✅ **Bob** connected"),
            (EventRecord::disconnect("Bob", 1).unwrap(), 0xF44336, "❌ **Bob** disconnected"),
            (chat(Channel::Clan), 0xFF9800, "**Alice** [Clan]: hi"),
            (chat(Channel::Whisper), 0x9C27B0, "**Alice** [Private]: hi"),
            (chat(Channel::Local), 0x9E9E9E, "**Alice** [Local]: hi"),
            (chat(Channel::Global), 0x2196F3, "**Alice** [Global]: hi"),
        ];

        for (record, color, description) in cases {
            let embed = WebhookSink::<MockTransport>::build_embed(&record);
            assert_eq!(embed.color, color, "{record:?}");
            assert_eq!(embed.description, description);
        }
    }

    #[tokio::test]
    async fn test_send_posts_single_embed() {
        let transport = Arc::new(MockTransport::new());
        let sink = WebhookSink::new("https://hooks.example/abc", transport.clone());
        sink.send(&chat(Channel::Global)).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://hooks.example/abc");
        assert!(requests[0].header("X-API-Key").is_none());

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "embeds": [{ "color": 0x2196F3, "description": "**Alice** [Global]: hi" }]
            })
        );
    }

    #[tokio::test]
    async fn test_non_2xx_is_error() {
        let transport = Arc::new(MockTransport::with_config(MockTransportConfig {
            fail_urls: vec!["hooks.example".into()],
            ..Default::default()
        }));
        let sink = WebhookSink::new("https://hooks.example/abc", transport);
        let err = sink.send(&chat(Channel::Clan)).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::HttpStatus { ref sink_name, status: 500 } if sink_name == "webhook"
        ));
    }
}
