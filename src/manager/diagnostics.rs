use serde_json::json;

use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::TARGET_LIFECYCLE;
use super::audit::{NavigationAudit, NavigationAuditEvent, NavigationAuditStage};

/// Audit sink that turns the navigation trail into structured log lines.
pub struct LifecycleLogger {
    logger: Logger,
    level: LogLevel,
    log_hooks: bool,
    log_states: bool,
    log_transitions: bool,
}

impl LifecycleLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_hooks: true,
            log_states: true,
            log_transitions: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_hooks(mut self, enabled: bool) -> Self {
        self.log_hooks = enabled;
        self
    }

    pub fn log_states(mut self, enabled: bool) -> Self {
        self.log_states = enabled;
        self
    }

    pub fn log_transitions(mut self, enabled: bool) -> Self {
        self.log_transitions = enabled;
        self
    }

    fn wants(&self, stage: NavigationAuditStage) -> bool {
        match stage {
            NavigationAuditStage::HookInvoked => self.log_hooks,
            NavigationAuditStage::StateChanged => self.log_states,
            NavigationAuditStage::TransitionStarted | NavigationAuditStage::TransitionFinished => {
                self.log_transitions
            }
            _ => true,
        }
    }
}

impl NavigationAudit for LifecycleLogger {
    fn record(&self, event: NavigationAuditEvent) {
        if !self.wants(event.stage) {
            return;
        }
        let page = event.page.map(|name| json_kv("page", json!(name)));
        let fields = page.into_iter().chain(event.details);
        let _ = self.logger.log_event(event_with_fields(
            self.level,
            TARGET_LIFECYCLE,
            event.stage.name(),
            fields,
        ));
    }
}
