//! Mock 事件源
//!
//! 用于没有游戏服务器时的演示与测试：按固定频率循环产生聊天、上下线事件。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::classify::{ChatClassification, ConnectionChange};
use crate::producer::{EventProducer, RawChatMessage, RawConnectionEvent, RawGameEvent};

/// Mock 事件源配置
#[derive(Debug, Clone)]
pub struct MockEventConfig {
    /// 参与的玩家
    pub players: Vec<String>,

    /// 事件间隔
    pub interval: Duration,
}

impl Default for MockEventConfig {
    fn default() -> Self {
        Self {
            players: vec!["Alice".to_string(), "Bob".to_string()],
            interval: Duration::from_secs(2),
        }
    }
}

/// Mock 事件源
///
/// 每个玩家依次经历：上线 -> 全局聊天 -> 公会聊天 -> 系统消息(被丢弃) -> 下线。
pub struct MockEventSource {
    config: MockEventConfig,
    running: Arc<AtomicBool>,
}

impl MockEventSource {
    pub fn new(config: MockEventConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 第 `step` 个脚本事件
    pub fn scripted_event(players: &[String], step: u64) -> Option<RawGameEvent> {
        if players.is_empty() {
            return None;
        }
        let round = step / 5;
        let player = players[(round % players.len() as u64) as usize].clone();
        let now_ms = chrono::Utc::now().timestamp_millis();

        let chat = |classification, text: String| {
            RawGameEvent::Chat(RawChatMessage {
                sender: Some(player.clone()),
                classification,
                text,
                time_utc_ms: now_ms,
            })
        };
        let connection = |change| {
            RawGameEvent::Connection(RawConnectionEvent {
                user: Some(player.clone()),
                change,
                from_persistence: false,
            })
        };

        Some(match step % 5 {
            0 => connection(ConnectionChange::Connected),
            1 => chat(ChatClassification::Global, format!("hello from round {round}")),
            2 => chat(ChatClassification::Team, "castle needs blood essence".to_string()),
            3 => chat(ChatClassification::System, "server restart in 10 minutes".to_string()),
            _ => connection(ConnectionChange::Disconnected),
        })
    }

    /// 启动 Mock 源，将事件写入 producer
    pub fn start(&self, producer: EventProducer) -> JoinHandle<()> {
        let config = self.config.clone();
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut step: u64 = 0;

            debug!(
                players = config.players.len(),
                interval_ms = config.interval.as_millis() as u64,
                "mock event source started"
            );

            while running.load(Ordering::Relaxed) {
                let Some(event) = Self::scripted_event(&config.players, step) else {
                    break;
                };
                // 被丢弃的事件 (例如 System) 已由 producer 记录
                let accepted = producer.submit(event).is_ok();
                trace!(step, accepted, "mock event submitted");

                step += 1;
                tokio::time::sleep(config.interval).await;
            }

            debug!("mock event source stopped");
        })
    }

    /// 停止 Mock 源
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
