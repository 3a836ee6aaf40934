use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Counters accumulated by the page manager while it runs.
#[derive(Debug, Default, Clone)]
pub struct NavigationMetrics {
    pushes: u64,
    pops: u64,
    back_home: u64,
    rejected: u64,
    loads: u64,
    unloads: u64,
    switches_completed: u64,
}

impl NavigationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push(&mut self) {
        self.pushes = self.pushes.saturating_add(1);
    }

    pub fn record_pop(&mut self) {
        self.pops = self.pops.saturating_add(1);
    }

    pub fn record_back_home(&mut self) {
        self.back_home = self.back_home.saturating_add(1);
    }

    pub fn record_rejected(&mut self) {
        self.rejected = self.rejected.saturating_add(1);
    }

    pub fn record_load(&mut self) {
        self.loads = self.loads.saturating_add(1);
    }

    pub fn record_unload(&mut self) {
        self.unloads = self.unloads.saturating_add(1);
    }

    pub fn record_switch_completed(&mut self) {
        self.switches_completed = self.switches_completed.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            pushes: self.pushes,
            pops: self.pops,
            back_home: self.back_home,
            rejected: self.rejected,
            loads: self.loads,
            unloads: self.unloads,
            switches_completed: self.switches_completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub pushes: u64,
    pub pops: u64,
    pub back_home: u64,
    pub rejected: u64,
    pub loads: u64,
    pub unloads: u64,
    pub switches_completed: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "navigation_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("pushes".to_string(), json!(self.pushes));
        map.insert("pops".to_string(), json!(self.pops));
        map.insert("back_home".to_string(), json!(self.back_home));
        map.insert("rejected".to_string(), json!(self.rejected));
        map.insert("loads".to_string(), json!(self.loads));
        map.insert("unloads".to_string(), json!(self.unloads));
        map.insert(
            "switches_completed".to_string(),
            json!(self.switches_completed),
        );
        map
    }
}
