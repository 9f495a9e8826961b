//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置到 relay 的启用/禁用路径
//! - 模拟 e2e 测试（无需游戏服务器，HTTP 由 MockTransport 记录）
//! - 队列并发语义

#[cfg(test)]
mod common {
    use contracts::{
        CastleHeartEntity, CharacterEntity, ConfigVersion, Health, MonitorConfig, OwnerRef,
        Position, RelayConfig, TerritoryEntity, UserEntity, WebhookConfig,
    };

    pub const BASE_URL: &str = "https://monitor.example.com";
    pub const WEBHOOK_URL: &str = "https://hooks.example.com/api/webhooks/1/token";

    pub fn relay_config(webhook: bool, push_interval_secs: u64) -> RelayConfig {
        RelayConfig {
            version: ConfigVersion::V1,
            monitor: MonitorConfig {
                base_url: BASE_URL.to_string(),
                api_key: "test-key".to_string(),
                server_id: 42,
                game: "vrising".to_string(),
                push_interval_secs,
            },
            webhook: webhook.then(|| WebhookConfig {
                url: WEBHOOK_URL.to_string(),
            }),
        }
    }

    pub fn online_user(name: &str, clan: Option<&str>, x: f32, z: f32) -> UserEntity {
        UserEntity {
            name: name.to_string(),
            clan: clan.map(str::to_string),
            connected: true,
            is_admin: false,
            character: Some(CharacterEntity {
                position: Some(Position { x, z }),
                health: Some(Health {
                    value: 40.0,
                    max_health: 80.0,
                }),
            }),
        }
    }

    pub fn castle(owner: &str, level: u32) -> CastleHeartEntity {
        CastleHeartEntity {
            position: Position { x: 10.0, z: 20.0 },
            level,
            owner: Some(OwnerRef {
                name: owner.to_string(),
                clan: None,
            }),
        }
    }

    /// Territory occupied by a castle heart
    pub fn heart_territory() -> TerritoryEntity {
        TerritoryEntity {
            position: Position { x: 10.0, z: 20.0 },
            has_castle_heart: true,
            claimed: true,
        }
    }

    pub fn body_json(request: &contracts::HttpRequest) -> serde_json::Value {
        serde_json::from_slice(&request.body).unwrap()
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_complete_config_enables_relay() {
        let content = r#"
[monitor]
base_url = "https://monitor.example.com/"
api_key = "secret"
server_id = 3
push_interval_secs = 4

[webhook]
url = "https://hooks.example.com/x"
"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(
            config.monitor.events_url(),
            "https://monitor.example.com/api/v1/vrising/events"
        );
        assert_eq!(config.monitor.push_interval().as_secs(), 10);
        assert!(config.webhook_url().is_some());
    }

    #[test]
    fn test_incomplete_config_disables_relay() {
        for content in [
            "[monitor]\napi_key = \"k\"\nserver_id = 1\n",
            "[monitor]\nbase_url = \"https://m.example\"\nserver_id = 1\n",
            "[monitor]\nbase_url = \"https://m.example\"\napi_key = \"k\"\nserver_id = 0\n",
            "",
        ] {
            assert!(
                ConfigLoader::load_from_str(content, ConfigFormat::Toml).is_err(),
                "expected rejection for {content:?}"
            );
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{Channel, EventRecord};
    use dispatcher::{
        spawn_relay, EventCycle, MockTransport, MockTransportConfig, MonitorSink, SnapshotCycle,
        SnapshotOutcome, WebhookSink,
    };
    use ingestion::{
        ChatClassification, ConnectionChange, EventProducer, IntakeQueue, RawChatMessage,
        RawConnectionEvent,
    };
    use snapshot_assembler::{FileWorld, MockWorld, SnapshotAssembler};

    use crate::common::*;

    fn event_cycle(
        queue: IntakeQueue,
        transport: Arc<MockTransport>,
        webhook: bool,
    ) -> EventCycle<MockTransport> {
        let config = relay_config(webhook, 60);
        let monitor = MonitorSink::from_config(&config.monitor, transport.clone()).unwrap();
        let webhook = config
            .webhook_url()
            .map(|url| WebhookSink::new(url, transport.clone()));
        EventCycle::new(queue, monitor, webhook)
    }

    fn snapshot_cycle(
        world: MockWorld,
        transport: Arc<MockTransport>,
    ) -> SnapshotCycle<SnapshotAssembler<MockWorld>, MockTransport> {
        let config = relay_config(false, 60);
        let monitor = MonitorSink::from_config(&config.monitor, transport).unwrap();
        SnapshotCycle::new(
            SnapshotAssembler::new(world),
            monitor,
            config.monitor.push_interval(),
        )
    }

    /// Producer -> IntakeQueue -> EventCycle -> webhook + monitoring API
    #[tokio::test]
    async fn test_e2e_chat_and_connect() {
        let queue = IntakeQueue::new();
        let producer = EventProducer::new(queue.clone());
        producer
            .submit_chat(RawChatMessage {
                sender: Some("Alice".to_string()),
                classification: ChatClassification::Global,
                text: "hi".to_string(),
                time_utc_ms: 1_000_000,
            })
            .unwrap();
        producer
            .submit_connection_at(
                RawConnectionEvent {
                    user: Some("Bob".to_string()),
                    change: ConnectionChange::Connected,
                    from_persistence: false,
                },
                1001,
            )
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        let report = event_cycle(queue.clone(), transport.clone(), true)
            .run_once()
            .await;

        assert_eq!(report.drained, 2);
        assert_eq!(report.webhook_sent, 2);
        assert_eq!(report.batch_delivered, Some(true));
        assert!(queue.is_empty());

        let hooks = transport.requests_to("hooks.example.com");
        assert_eq!(hooks.len(), 2);
        assert_eq!(body_json(&hooks[0])["embeds"][0]["color"], 0x2196F3);
        assert_eq!(body_json(&hooks[1])["embeds"][0]["color"], 0x4CAF50);

        let events = transport.requests_to("/api/v1/vrising/events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].header("X-API-Key"), Some("test-key"));

        let body = body_json(&events[0]);
        assert_eq!(body["server_id"], 42);
        let wire = body["events"].as_array().unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["type"], "chat");
        assert_eq!(wire[0]["player"], "Alice");
        assert_eq!(wire[0]["channel"], "global");
        assert_eq!(wire[0]["message"], "hi");
        assert_eq!(wire[0]["timestamp"], 1000);
        assert_eq!(wire[1]["type"], "connect");
        assert_eq!(wire[1]["timestamp"], 1001);
        let bob = wire[1].as_object().unwrap();
        assert!(!bob.contains_key("channel"));
        assert!(!bob.contains_key("message"));

        // webhook posts precede the aggregate call
        let order: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert!(order[2].ends_with("/events"));
    }

    #[tokio::test]
    async fn test_dropped_classifications_never_reach_sinks() {
        let queue = IntakeQueue::new();
        let producer = EventProducer::new(queue.clone());
        for classification in [ChatClassification::System, ChatClassification::Lore] {
            assert!(producer
                .submit_chat(RawChatMessage {
                    sender: Some("Alice".to_string()),
                    classification,
                    text: "ignored".to_string(),
                    time_utc_ms: 0,
                })
                .is_err());
        }
        assert!(producer
            .submit_connection_at(
                RawConnectionEvent {
                    user: Some("Bob".to_string()),
                    change: ConnectionChange::Connected,
                    from_persistence: true,
                },
                5,
            )
            .is_err());

        let transport = Arc::new(MockTransport::new());
        let report = event_cycle(queue.clone(), transport.clone(), true)
            .run_once()
            .await;

        assert_eq!(report.drained, 0);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(queue.metrics().snapshot().events_discarded, 3);
    }

    #[tokio::test]
    async fn test_empty_drain_makes_no_calls() {
        let transport = Arc::new(MockTransport::new());
        let report = event_cycle(IntakeQueue::new(), transport.clone(), true)
            .run_once()
            .await;

        assert_eq!(report.drained, 0);
        assert_eq!(report.batch_delivered, None);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_webhook_failure_does_not_stop_batch() {
        let queue = IntakeQueue::new();
        queue.enqueue(EventRecord::chat("Alice", Channel::Global, "one", 1).unwrap());
        queue.enqueue(EventRecord::chat("Bob", Channel::Clan, "two", 2).unwrap());
        queue.enqueue(EventRecord::disconnect("Carol", 3).unwrap());

        let transport = Arc::new(MockTransport::with_config(MockTransportConfig {
            fail_requests: HashSet::from([0]),
            ..Default::default()
        }));
        let report = event_cycle(queue, transport.clone(), true).run_once().await;

        assert_eq!(report.webhook_failed, 1);
        assert_eq!(report.webhook_sent, 2);
        assert_eq!(report.batch_delivered, Some(true));
        assert_eq!(transport.requests_to("hooks.example.com").len(), 3);

        let events = transport.requests_to("/events");
        assert_eq!(events.len(), 1);
        assert_eq!(body_json(&events[0])["events"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_webhook_transport_error_on_second_record() {
        let queue = IntakeQueue::new();
        queue.enqueue(EventRecord::connect("Alice", 1).unwrap());
        queue.enqueue(EventRecord::chat("Bob", Channel::Global, "gg", 2).unwrap());
        queue.enqueue(EventRecord::disconnect("Alice", 3).unwrap());

        let transport = Arc::new(MockTransport::with_config(MockTransportConfig {
            unreachable_requests: HashSet::from([1]),
            ..Default::default()
        }));
        let report = event_cycle(queue, transport.clone(), true).run_once().await;

        assert_eq!(report.webhook_sent, 2);
        assert_eq!(report.webhook_failed, 1);
        assert_eq!(report.batch_delivered, Some(true));
        assert_eq!(transport.request_count(), 4);

        let events = transport.requests_to("/events");
        assert_eq!(body_json(&events[0])["events"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_monitor_drops_batch() {
        let queue = IntakeQueue::new();
        queue.enqueue(EventRecord::connect("Alice", 1).unwrap());

        let transport = Arc::new(MockTransport::with_config(MockTransportConfig {
            unreachable_urls: vec!["monitor.example.com".to_string()],
            ..Default::default()
        }));
        let cycle = event_cycle(queue.clone(), transport.clone(), false);

        assert_eq!(cycle.run_once().await.batch_delivered, Some(false));
        // at-most-once: the next cycle has nothing to resend
        assert_eq!(cycle.run_once().await.drained, 0);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_push() {
        let world = MockWorld::new()
            .with_user(online_user("Alice", Some("Nightfall"), 1.0, 2.0))
            .with_user(online_user("Bob", None, 3.0, 4.0))
            .with_castle_heart(castle("Alice", 0))
            .with_territory(heart_territory());

        let transport = Arc::new(MockTransport::new());
        let outcome = snapshot_cycle(world, transport.clone()).run_once().await;
        assert_eq!(
            outcome,
            SnapshotOutcome::Sent {
                players: 2,
                structures: 1,
                free_plots: 0
            }
        );

        let pushes = transport.requests_to("/api/v1/vrising/push");
        assert_eq!(pushes.len(), 1);
        let body = body_json(&pushes[0]);
        assert_eq!(body["server_id"], 42);
        assert_eq!(body["players"].as_array().unwrap().len(), 2);
        assert_eq!(body["players"][0]["health"], 0.5);
        assert_eq!(body["players"][1]["clan"], "");
        assert_eq!(body["castles"].as_array().unwrap().len(), 1);
        assert_eq!(body["castles"][0]["tier"], 1);
        assert_eq!(body["free_plots"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_snapshot_skips_unresolved_entities() {
        let world = MockWorld::new()
            .with_user(online_user("Alice", None, 1.0, 2.0))
            .with_failing_user("missing character")
            .with_failing_castle_heart("owner lookup failed")
            .without_territories();

        let transport = Arc::new(MockTransport::new());
        let outcome = snapshot_cycle(world, transport.clone()).run_once().await;
        assert_eq!(
            outcome,
            SnapshotOutcome::Sent {
                players: 1,
                structures: 0,
                free_plots: 0
            }
        );
        let body = body_json(&transport.requests_to("/push")[0]);
        assert_eq!(body["free_plots"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_world_not_ready_skips_push() {
        let transport = Arc::new(MockTransport::new());
        let cycle = snapshot_cycle(MockWorld::new().with_ready(false), transport.clone());

        assert_eq!(cycle.run_once().await, SnapshotOutcome::NotReady);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_from_world_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{
  "users": [
    { "name": "Alice", "connected": true, "character": { "position": { "x": 1, "z": 2 } } },
    { "name": "Zed", "connected": false }
  ],
  "castle_hearts": [{ "position": { "x": 5, "z": 6 }, "level": 3 }],
  "territories": [{ "position": { "x": 9, "z": 9 } }]
}"#,
        )
        .unwrap();

        let transport = Arc::new(MockTransport::new());
        let monitor =
            MonitorSink::from_config(&relay_config(false, 60).monitor, transport.clone()).unwrap();
        let cycle = SnapshotCycle::new(
            SnapshotAssembler::new(FileWorld::new(file.path())),
            monitor,
            Duration::from_secs(60),
        );

        assert_eq!(
            cycle.run_once().await,
            SnapshotOutcome::Sent {
                players: 1,
                structures: 1,
                free_plots: 1
            }
        );
        let body = body_json(&transport.requests_to("/push")[0]);
        assert_eq!(body["castles"][0]["tier"], 4);
        assert_eq!(body["castles"][0]["owner"], "");
        assert_eq!(body["players"][0]["health"], 0.0);
    }

    /// Full relay: both cycles on their own schedules, push interval clamped
    #[tokio::test(start_paused = true)]
    async fn test_relay_schedules_and_clamps() {
        let queue = IntakeQueue::new();
        let transport = Arc::new(MockTransport::new());
        let world = MockWorld::new().with_user(online_user("Alice", None, 0.0, 0.0));

        let handle = spawn_relay(
            relay_config(true, 3),
            queue.clone(),
            SnapshotAssembler::new(world),
            transport.clone(),
        )
        .unwrap();

        queue.enqueue(EventRecord::connect("Alice", 1).unwrap());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(transport.requests_to("/events").len(), 1);
        assert_eq!(transport.requests_to("/push").len(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.requests_to("/push").len(), 1);

        let metrics = handle.shutdown().await;
        let summary = metrics.summary();
        assert_eq!(summary.events_dispatched, 1);
        assert_eq!(summary.webhook_sent, 1);
        assert_eq!(summary.snapshots_sent, 1);
    }
}

#[cfg(test)]
mod queue_tests {
    use std::collections::HashSet;
    use std::thread;

    use ingestion::{
        ChatClassification, EventProducer, IntakeQueue, RawChatMessage, RawGameEvent,
    };

    #[test]
    fn test_concurrent_producers_drain_exactly_once() {
        let queue = IntakeQueue::new();
        let producers = 8;
        let per_producer = 250;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let producer = EventProducer::new(queue.clone());
                thread::spawn(move || {
                    for i in 0..per_producer {
                        producer
                            .submit(RawGameEvent::Chat(RawChatMessage {
                                sender: Some(format!("p{p}")),
                                classification: ChatClassification::Local,
                                text: format!("{p}-{i}"),
                                time_utc_ms: i as i64 * 1000,
                            }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let batch = queue.drain_all();
        assert_eq!(batch.len(), producers * per_producer);
        assert!(queue.is_empty());

        let unique: HashSet<_> = batch.iter().filter_map(|r| r.message()).collect();
        assert_eq!(unique.len(), producers * per_producer);

        // per-producer FIFO
        for p in 0..producers {
            let sender = format!("p{p}");
            let own: Vec<i64> = batch
                .iter()
                .filter(|r| r.player() == sender)
                .map(|r| r.timestamp())
                .collect();
            assert!(own.windows(2).all(|w| w[0] < w[1]));
        }

        let metrics = queue.metrics().snapshot();
        assert_eq!(metrics.events_enqueued, (producers * per_producer) as u64);
        assert_eq!(metrics.events_drained, (producers * per_producer) as u64);
    }

    #[test]
    fn test_unknown_sender_kept() {
        let queue = IntakeQueue::new();
        let producer = EventProducer::new(queue.clone());
        let line = r#"{"event":"chat","classification":"WhisperTo","text":"psst","time_utc_ms":2500}"#;
        let event: RawGameEvent = serde_json::from_str(line).unwrap();
        producer.submit(event).unwrap();

        let batch = queue.drain_all();
        assert_eq!(batch[0].player(), ingestion::UNKNOWN_SENDER);
        assert_eq!(batch[0].channel(), Some(contracts::Channel::Whisper));
        assert_eq!(batch[0].timestamp(), 2);
    }
}
