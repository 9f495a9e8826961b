//! Relay 指标收集模块
//!
//! Prometheus 指标记录 + 内存聚合 (用于运行结束时输出摘要)。

use contracts::Snapshot;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// 注册指标描述 (Prometheus HELP 文本)
pub fn describe_relay_metrics() {
    describe_counter!(
        "relay_events_enqueued_total",
        "Events accepted into the intake queue"
    );
    describe_counter!(
        "relay_events_discarded_total",
        "Raw events discarded before queuing, by reason"
    );
    describe_counter!("relay_event_cycles_total", "Event dispatch cycles run");
    describe_counter!(
        "relay_events_dispatched_total",
        "Events drained and handed to the sinks"
    );
    describe_histogram!(
        "relay_event_batch_size",
        Unit::Count,
        "Records per non-empty event batch"
    );
    describe_counter!(
        "relay_http_requests_total",
        "Outbound HTTP calls by sink, status and outcome"
    );
    describe_counter!("relay_snapshots_total", "Snapshots assembled");
    describe_gauge!("relay_snapshot_players", Unit::Count, "Players in the last snapshot");
    describe_gauge!(
        "relay_snapshot_structures",
        Unit::Count,
        "Castles in the last snapshot"
    );
    describe_gauge!(
        "relay_snapshot_free_plots",
        Unit::Count,
        "Free plots in the last snapshot"
    );
    describe_counter!(
        "relay_cycles_skipped_total",
        "Cycles skipped without sending, by cycle and reason"
    );
    describe_gauge!(
        "relay_intake_queue_depth",
        Unit::Count,
        "Records left in the intake queue after a drain"
    );
}

/// 记录一次事件周期
///
/// 空批次同样计数，便于观察周期是否在运行。
pub fn record_event_cycle(batch_len: usize) {
    counter!("relay_event_cycles_total").increment(1);
    if batch_len > 0 {
        counter!("relay_events_dispatched_total").increment(batch_len as u64);
        histogram!("relay_event_batch_size").record(batch_len as f64);
    }
}

/// 记录一次 HTTP 调用
///
/// `status` 为 HTTP 状态码；None 表示请求未完成 (超时 / 连接失败)。
pub fn record_http_call(sink_name: &str, status: Option<u16>, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    let status = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "transport_error".to_string());
    counter!(
        "relay_http_requests_total",
        "sink" => sink_name.to_string(),
        "status" => status,
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录快照内容规模
pub fn record_snapshot(snapshot: &Snapshot) {
    counter!("relay_snapshots_total").increment(1);
    gauge!("relay_snapshot_players").set(snapshot.players.len() as f64);
    gauge!("relay_snapshot_structures").set(snapshot.structures.len() as f64);
    gauge!("relay_snapshot_free_plots").set(snapshot.free_plots.len() as f64);
}

/// 记录被跳过的周期 (例如世界尚未就绪)
pub fn record_cycle_skipped(cycle: &'static str, reason: &'static str) {
    counter!("relay_cycles_skipped_total", "cycle" => cycle, "reason" => reason).increment(1);
}

/// 记录 intake 队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("relay_intake_queue_depth").set(depth as f64);
}

/// Relay 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// 事件周期数
    pub event_cycles: u64,

    /// 已转发事件总数
    pub events_dispatched: u64,

    /// 成功的 webhook 推送
    pub webhook_sent: u64,

    /// 失败的 webhook 推送
    pub webhook_failed: u64,

    /// 成功的事件批次上报
    pub event_batches_sent: u64,

    /// 失败的事件批次上报
    pub event_batches_failed: u64,

    /// 成功的快照上报
    pub snapshots_sent: u64,

    /// 失败的快照上报
    pub snapshots_failed: u64,

    /// 跳过的快照周期
    pub snapshots_skipped: u64,

    /// 批次大小统计 (仅非空批次)
    pub batch_stats: RunningStats,

    /// 快照玩家数统计
    pub player_stats: RunningStats,
}

impl RelayMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新事件周期统计
    ///
    /// `monitor_ok` 为 None 表示批次为空、未上报。
    pub fn update_event_cycle(
        &mut self,
        batch_len: usize,
        webhook_sent: usize,
        webhook_failed: usize,
        monitor_ok: Option<bool>,
    ) {
        self.event_cycles += 1;
        self.events_dispatched += batch_len as u64;
        self.webhook_sent += webhook_sent as u64;
        self.webhook_failed += webhook_failed as u64;

        match monitor_ok {
            Some(true) => self.event_batches_sent += 1,
            Some(false) => self.event_batches_failed += 1,
            None => {}
        }

        if batch_len > 0 {
            self.batch_stats.push(batch_len as f64);
        }
    }

    /// 更新快照周期统计
    pub fn update_snapshot(&mut self, players: Option<usize>, sent: bool) {
        match players {
            Some(count) => {
                self.player_stats.push(count as f64);
                if sent {
                    self.snapshots_sent += 1;
                } else {
                    self.snapshots_failed += 1;
                }
            }
            None => self.snapshots_skipped += 1,
        }
    }

    /// 快照组装失败 (非 world-not-ready)，不计入玩家统计
    pub fn record_snapshot_failed(&mut self) {
        self.snapshots_failed += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            event_cycles: self.event_cycles,
            events_dispatched: self.events_dispatched,
            webhook_sent: self.webhook_sent,
            webhook_failed: self.webhook_failed,
            event_batches_sent: self.event_batches_sent,
            event_batches_failed: self.event_batches_failed,
            snapshots_sent: self.snapshots_sent,
            snapshots_failed: self.snapshots_failed,
            snapshots_skipped: self.snapshots_skipped,
            webhook_failure_rate: rate(self.webhook_failed, self.webhook_sent + self.webhook_failed),
            batch_size: StatsSummary::from(&self.batch_stats),
            players: StatsSummary::from(&self.player_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub event_cycles: u64,
    pub events_dispatched: u64,
    pub webhook_sent: u64,
    pub webhook_failed: u64,
    pub event_batches_sent: u64,
    pub event_batches_failed: u64,
    pub snapshots_sent: u64,
    pub snapshots_failed: u64,
    pub snapshots_skipped: u64,
    pub webhook_failure_rate: f64,
    pub batch_size: StatsSummary,
    pub players: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Metrics Summary ===")?;
        writeln!(f, "Event cycles: {}", self.event_cycles)?;
        writeln!(f, "Events dispatched: {}", self.events_dispatched)?;
        writeln!(
            f,
            "Webhook posts: {} ok, {} failed ({:.2}%)",
            self.webhook_sent, self.webhook_failed, self.webhook_failure_rate
        )?;
        writeln!(
            f,
            "Event batches: {} ok, {} failed",
            self.event_batches_sent, self.event_batches_failed
        )?;
        writeln!(
            f,
            "Snapshots: {} ok, {} failed, {} skipped",
            self.snapshots_sent, self.snapshots_failed, self.snapshots_skipped
        )?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Players per snapshot: {}", self.players)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.2} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// 在线统计 (min / max / 均值)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.mean += (value - self.mean) / self.count as f64;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_event_cycles() {
        let mut aggregator = RelayMetricsAggregator::new();
        aggregator.update_event_cycle(3, 2, 1, Some(true));
        aggregator.update_event_cycle(0, 0, 0, None);
        aggregator.update_event_cycle(1, 1, 0, Some(false));

        assert_eq!(aggregator.event_cycles, 3);
        assert_eq!(aggregator.events_dispatched, 4);
        assert_eq!(aggregator.webhook_sent, 3);
        assert_eq!(aggregator.webhook_failed, 1);
        assert_eq!(aggregator.event_batches_sent, 1);
        assert_eq!(aggregator.event_batches_failed, 1);
        // 空批次不计入批次大小
        assert_eq!(aggregator.batch_stats.count(), 2);
    }

    #[test]
    fn test_aggregator_snapshots() {
        let mut aggregator = RelayMetricsAggregator::new();
        aggregator.update_snapshot(Some(2), true);
        aggregator.update_snapshot(None, false);
        aggregator.update_snapshot(Some(4), false);
        aggregator.record_snapshot_failed();

        let summary = aggregator.summary();
        assert_eq!(summary.snapshots_sent, 1);
        assert_eq!(summary.snapshots_failed, 2);
        assert_eq!(summary.snapshots_skipped, 1);
        assert!((summary.players.mean - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RelayMetricsAggregator::new();
        aggregator.update_event_cycle(4, 3, 1, Some(true));
        let output = format!("{}", aggregator.summary());

        assert!(output.contains("Events dispatched: 4"));
        assert!(output.contains("25.00%"));
        assert!(output.contains("Players per snapshot: N/A"));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // 未安装 recorder 时为 no-op
        record_event_cycle(2);
        record_http_call("webhook", Some(204), true);
        record_http_call("monitor", None, false);
        record_snapshot(&Snapshot::default());
        record_cycle_skipped("snapshot", "world_not_ready");
        record_queue_depth(0);
        describe_relay_metrics();
    }
}
