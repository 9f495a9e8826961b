//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 周期性地清空 intake 队列，推送到 webhook 与监控 API
//! - 周期性地组装世界快照并推送
//! - 所有失败仅记录日志，不中断周期

pub mod error;
pub mod event_cycle;
pub mod metrics;
pub mod relay;
pub mod sinks;
pub mod snapshot_cycle;
pub mod transport;

pub use contracts::{HttpTransport, Snapshot, SnapshotSource};
pub use error::DispatcherError;
pub use event_cycle::{DispatchReport, EventCycle, EVENT_INTERVAL};
pub use metrics::CycleMetrics;
pub use relay::{spawn_relay, RelayBuilder, RelayHandle};
pub use sinks::{embed_style, MonitorSink, WebhookSink};
pub use snapshot_cycle::{clamp_push_interval, SnapshotCycle, SnapshotOutcome, MIN_PUSH_INTERVAL};
pub use transport::{MockTransport, MockTransportConfig, ReqwestTransport, HTTP_TIMEOUT};
