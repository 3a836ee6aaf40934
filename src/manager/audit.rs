//! Navigation audit trail.
//!
//! The manager reports each checkpoint of its work (installs, switches, state
//! changes, hooks, drags) as a [`NavigationAuditEvent`]. Sinks can log, buffer
//! or visualize the stream without touching the navigation core.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAuditStage {
    ManagerCreated,
    PageInstalled,
    PageUninstalled,
    /// A push, pop, back-home or uninstall was refused.
    RequestRejected,
    SwitchStarted,
    /// A page's lifecycle state moved (`from`/`to` details).
    StateChanged,
    HookInvoked,
    TransitionStarted,
    TransitionFinished,
    /// Both pages of a switch settled.
    SwitchFinished,
    DragCommitted,
    DragSettled,
    ForcedUnload,
    ManagerShutdown,
}

impl NavigationAuditStage {
    pub fn name(self) -> &'static str {
        match self {
            NavigationAuditStage::ManagerCreated => "manager_created",
            NavigationAuditStage::PageInstalled => "page_installed",
            NavigationAuditStage::PageUninstalled => "page_uninstalled",
            NavigationAuditStage::RequestRejected => "request_rejected",
            NavigationAuditStage::SwitchStarted => "switch_started",
            NavigationAuditStage::StateChanged => "state_changed",
            NavigationAuditStage::HookInvoked => "hook_invoked",
            NavigationAuditStage::TransitionStarted => "transition_started",
            NavigationAuditStage::TransitionFinished => "transition_finished",
            NavigationAuditStage::SwitchFinished => "switch_finished",
            NavigationAuditStage::DragCommitted => "drag_committed",
            NavigationAuditStage::DragSettled => "drag_settled",
            NavigationAuditStage::ForcedUnload => "forced_unload",
            NavigationAuditStage::ManagerShutdown => "manager_shutdown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationAuditEvent {
    pub timestamp: SystemTime,
    pub stage: NavigationAuditStage,
    pub page: Option<String>,
    pub details: Vec<(String, Value)>,
}

impl NavigationAuditEvent {
    fn new(stage: NavigationAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            page: None,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct NavigationAuditEventBuilder {
    event: NavigationAuditEvent,
}

impl NavigationAuditEventBuilder {
    pub fn new(stage: NavigationAuditStage) -> Self {
        Self {
            event: NavigationAuditEvent::new(stage),
        }
    }

    pub fn page(&mut self, name: impl Into<String>) -> &mut Self {
        self.event.page = Some(name.into());
        self
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> NavigationAuditEvent {
        self.event
    }
}

pub trait NavigationAudit: Send + Sync {
    fn record(&self, event: NavigationAuditEvent);
}

/// Used when no audit sink is configured.
#[derive(Debug, Default)]
pub struct NullNavigationAudit;

impl NavigationAudit for NullNavigationAudit {
    fn record(&self, _event: NavigationAuditEvent) {}
}

/// Keeps every event in memory for later inspection.
#[derive(Debug, Default)]
pub struct BufferedNavigationAudit {
    events: Mutex<Vec<NavigationAuditEvent>>,
}

impl BufferedNavigationAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<NavigationAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    /// Ordered `to` states a page went through.
    pub fn states_of(&self, page: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| {
                event.stage == NavigationAuditStage::StateChanged
                    && event.page.as_deref() == Some(page)
            })
            .filter_map(|event| event.detail("to").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl NavigationAudit for BufferedNavigationAudit {
    fn record(&self, event: NavigationAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
