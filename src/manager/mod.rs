//! Page manager: navigation stack, lifecycle driving and page transitions.
//!
//! `PageManager` owns every installed page and the toolkit it draws with.
//! Navigation calls (`push`, `pop`, `back_home`) are accepted one at a time;
//! while a switch is running further calls are rejected with
//! [`NavError::TransitionBusy`]. The toolkit feeds completions back through
//! [`PageManager::animation_finished`], [`PageManager::run_deferred`] and
//! [`PageManager::handle_root_event`].

pub mod audit;
pub mod diagnostics;
mod drag;
mod lifecycle;
mod transition;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};

use crate::anim::{AnimAttr, Easing, LoadAnim};
use crate::error::{NavError, Result};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv, json_str};
use crate::metrics::NavigationMetrics;
use crate::page::{NavRequest, Page, PageLifecycle, PageName, PageState};
use crate::registry::PageRegistry;
use crate::stack::PageStack;
use crate::toolkit::Toolkit;

use audit::{
    NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage, NullNavigationAudit,
};

pub use drag::predict_throw;

pub const TARGET_MANAGER: &str = "room_pages::manager";
pub const TARGET_LIFECYCLE: &str = "room_pages::lifecycle";
pub const TARGET_TRANSITION: &str = "room_pages::transition";
pub const TARGET_DRAG: &str = "room_pages::drag";

/// Construction-time settings for [`PageManager`].
#[derive(Clone)]
pub struct ManagerConfig {
    pub logger: Option<Logger>,
    pub metrics: Option<Arc<Mutex<NavigationMetrics>>>,
    pub metrics_target: String,
    pub audit: Option<Arc<dyn NavigationAudit>>,
    pub global_anim: AnimAttr,
    /// Share of the pointer velocity lost per step when predicting a throw.
    pub drag_throw_decay_percent: u8,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_target: "room_pages::metrics".to_string(),
            audit: None,
            global_anim: AnimAttr::new(LoadAnim::OverLeft, 500, Easing::EaseOut),
            drag_throw_decay_percent: 20,
        }
    }
}

impl ManagerConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn NavigationAudit>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_global_anim(mut self, attr: AnimAttr) -> Self {
        self.global_anim = attr;
        self
    }

    pub fn enable_metrics(&mut self) -> Arc<Mutex<NavigationMetrics>> {
        self.metrics
            .get_or_insert_with(|| Arc::new(Mutex::new(NavigationMetrics::new())))
            .clone()
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<NavigationMetrics>>> {
        self.metrics.clone()
    }
}

/// Switch-wide animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnimState {
    pub switch_requested: bool,
    /// A drag snap-back is running.
    pub busy: bool,
    pub pushing: bool,
    pub current: AnimAttr,
    pub global: AnimAttr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub name: String,
    pub state: PageState,
    pub cached: bool,
    pub has_root: bool,
    pub busy: bool,
    pub stash_len: usize,
}

/// Point-in-time view of the manager, serializable for logs and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSnapshot {
    /// Top first.
    pub stack: Vec<String>,
    pub current: Option<String>,
    pub previous: Option<String>,
    pub switching: bool,
    pub anim: AnimState,
    pub pages: Vec<PageSnapshot>,
}

/// Logger, metrics and audit handles. Kept apart from the navigation state
/// so it can be used while a page is borrowed.
pub(crate) struct Telemetry {
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<NavigationMetrics>>>,
    metrics_target: String,
    audit: Arc<dyn NavigationAudit>,
    started_at: Instant,
}

impl Telemetry {
    fn new(config: &ManagerConfig) -> Self {
        Self {
            logger: config.logger.clone(),
            metrics: config.metrics.clone(),
            metrics_target: config.metrics_target.clone(),
            audit: config
                .audit
                .clone()
                .unwrap_or_else(|| Arc::new(NullNavigationAudit)),
            started_at: Instant::now(),
        }
    }

    pub(crate) fn log(
        &self,
        level: LogLevel,
        target: &str,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        if let Some(logger) = &self.logger {
            if logger.enabled(level) {
                let _ = logger.log_event(event_with_fields(level, target, message, fields));
            }
        }
    }

    pub(crate) fn metric(&self, update: impl FnOnce(&mut NavigationMetrics)) {
        if let Some(metrics) = &self.metrics {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }

    pub(crate) fn audit(
        &self,
        stage: NavigationAuditStage,
        page: Option<&str>,
        details: impl IntoIterator<Item = (String, Value)>,
    ) {
        let mut builder = NavigationAuditEventBuilder::new(stage);
        if let Some(page) = page {
            builder.page(page);
        }
        for (key, value) in details {
            builder.detail(key, value);
        }
        self.audit.record(builder.finish());
    }

    fn emit_metrics(&self) {
        let (Some(logger), Some(metrics)) = (&self.logger, &self.metrics) else {
            return;
        };
        if let Ok(guard) = metrics.lock() {
            let event = guard
                .snapshot(self.started_at.elapsed())
                .to_log_event(&self.metrics_target);
            let _ = logger.log_event(event);
        }
    }
}

pub struct PageManager<T: Toolkit> {
    toolkit: T,
    registry: PageRegistry,
    stack: PageStack,
    prev: Option<PageName>,
    current: Option<PageName>,
    anim_state: AnimState,
    drag_decay_percent: i32,
    telemetry: Telemetry,
    // Pages whose animation finished synchronously, waiting for the join check.
    completions: VecDeque<PageName>,
    requests: VecDeque<NavRequest>,
}

impl<T: Toolkit> PageManager<T> {
    pub fn new(toolkit: T) -> Self {
        Self::with_config(toolkit, ManagerConfig::default())
    }

    pub fn with_config(toolkit: T, config: ManagerConfig) -> Self {
        let global = sanitize_global(config.global_anim);
        let telemetry = Telemetry::new(&config);
        let viewport = toolkit.viewport();
        telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "manager_created",
            [
                json_kv("viewport_width", viewport.width),
                json_kv("viewport_height", viewport.height),
                json_str("global_anim", format!("{:?}", global.anim)),
                json_kv("global_duration_ms", global.duration_ms),
            ],
        );
        telemetry.audit(NavigationAuditStage::ManagerCreated, None, []);

        Self {
            toolkit,
            registry: PageRegistry::new(),
            stack: PageStack::new(),
            prev: None,
            current: None,
            anim_state: AnimState {
                current: global,
                global,
                ..AnimState::default()
            },
            drag_decay_percent: i32::from(config.drag_throw_decay_percent),
            telemetry,
            completions: VecDeque::new(),
            requests: VecDeque::new(),
        }
    }

    pub fn install<P>(&mut self, name: impl Into<PageName>, hooks: P) -> Result<()>
    where
        P: PageLifecycle + 'static,
    {
        self.install_boxed(name, Box::new(hooks))
    }

    pub fn install_boxed(
        &mut self,
        name: impl Into<PageName>,
        hooks: Box<dyn PageLifecycle>,
    ) -> Result<()> {
        let name = name.into();
        if self.registry.contains(&name) {
            return self.reject("install", NavError::DuplicateName(name));
        }

        let mut page = Page::new(name.clone(), hooks);
        for err in page.configure() {
            self.telemetry.log(
                LogLevel::Error,
                TARGET_MANAGER,
                "custom_anim_rejected",
                [
                    json_str("page", name.as_str()),
                    json_str("error", err.to_string()),
                    json_str("fallback", "global"),
                ],
            );
        }
        let attr = page.anim_attr();
        let cache = page.cache;
        self.registry.insert(page)?;

        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "page_installed",
            [
                json_str("page", name.as_str()),
                json_str("anim", format!("{:?}", attr.anim)),
                json_kv("auto_cache", !cache.request_disable_auto_cache),
                json_kv("cache_requested", cache.request_enable_cache),
            ],
        );
        self.telemetry
            .audit(NavigationAuditStage::PageInstalled, Some(&name), []);
        Ok(())
    }

    pub fn uninstall(&mut self, name: &str) -> Result<()> {
        let result = self.uninstall_inner(name);
        self.flush_requests();
        result
    }

    fn uninstall_inner(&mut self, name: &str) -> Result<()> {
        let Some(page) = self.registry.get(name) else {
            return self.reject("uninstall", NavError::NotFound(name.to_string()));
        };
        let has_root = page.root.is_some();

        if self.stack.contains(name) {
            return self.reject("uninstall", NavError::StillOnStack(name.to_string()));
        }
        let participates =
            self.current.as_deref() == Some(name) || self.prev.as_deref() == Some(name);
        if self.anim_state.switch_requested && participates {
            return self.reject("uninstall", NavError::TransitionBusy);
        }

        if has_root {
            self.force_unload(name);
        }
        if self.prev.as_deref() == Some(name) {
            self.prev = None;
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.registry.remove(name)?;

        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "page_uninstalled",
            [json_str("page", name), json_kv("was_loaded", has_root)],
        );
        self.telemetry
            .audit(NavigationAuditStage::PageUninstalled, Some(name), []);
        Ok(())
    }

    /// Push `name` on top of the stack, optionally handing it a stash payload.
    pub fn push(&mut self, name: &str, stash: Option<&[u8]>) -> Result<()> {
        let result = self.push_inner(name, stash);
        self.flush_requests();
        result
    }

    fn push_inner(&mut self, name: &str, stash: Option<&[u8]>) -> Result<()> {
        self.ensure_idle("push")?;
        if self.stack.contains(name) {
            return self.reject("push", NavError::AlreadyOnStack(name.to_string()));
        }
        let Some(page) = self.registry.get_mut(name) else {
            return self.reject("push", NavError::NotInstalled(name.to_string()));
        };
        page.cache.auto_cache_disabled = page.cache.request_disable_auto_cache;

        if let Err(err) = self.stack.push(name) {
            return self.reject("push", err);
        }
        self.telemetry.metric(NavigationMetrics::record_push);
        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "page_pushed",
            [
                json_str("page", name),
                json_kv("depth", self.stack.len()),
                json_kv("stash_len", stash.map_or(0, <[u8]>::len)),
            ],
        );
        self.switch_to(name, true, stash)
    }

    /// Pop the top page and reveal the one beneath it.
    pub fn pop(&mut self) -> Result<()> {
        let result = self.pop_inner();
        self.flush_requests();
        result
    }

    fn pop_inner(&mut self) -> Result<()> {
        self.ensure_idle("pop")?;
        let Some(top) = self.stack.top().cloned() else {
            return self.reject("pop", NavError::StackEmpty);
        };

        if let Some(page) = self.registry.get_mut(&top) {
            if !page.cache.auto_cache_disabled {
                page.cache.cached = false;
            }
        }
        self.stack.pop();
        self.telemetry.metric(NavigationMetrics::record_pop);
        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "page_popped",
            [json_str("page", top.as_str()), json_kv("depth", self.stack.len())],
        );

        match self.stack.top().cloned() {
            Some(next) => self.switch_to(&next, false, None),
            None => {
                self.telemetry.log(
                    LogLevel::Warn,
                    TARGET_MANAGER,
                    "stack_empty_after_pop",
                    [json_str("page", top.as_str())],
                );
                Ok(())
            }
        }
    }

    /// Unwind to the bottom page, unloading everything above it.
    pub fn back_home(&mut self) -> Result<()> {
        let result = self.back_home_inner();
        self.flush_requests();
        result
    }

    fn back_home_inner(&mut self) -> Result<()> {
        self.ensure_idle("back_home")?;
        let Some(home) = self.stack.bottom().cloned() else {
            return self.reject("back_home", NavError::StackEmpty);
        };

        self.telemetry.metric(NavigationMetrics::record_back_home);
        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "back_home",
            [
                json_str("page", home.as_str()),
                json_kv("evicted", self.stack.len() - 1),
            ],
        );
        self.clear_stack(true);
        self.prev = None;
        self.switch_to(&home, false, None)
    }

    /// Evict stack entries from the top, force-unloading each one. With
    /// `keep_bottom` the bottom-most entry stays and becomes `prev`.
    fn clear_stack(&mut self, keep_bottom: bool) {
        while let Some(top) = self.stack.top().cloned() {
            if keep_bottom && self.stack.len() == 1 {
                self.prev = Some(top);
                break;
            }
            self.force_unload(&top);
            self.stack.pop();
        }
        if !keep_bottom {
            self.prev = None;
        }
    }

    /// Manager-wide transition used by pages left on `Global`. Passing
    /// `Global` itself stores `None`.
    pub fn set_global_load_anim(&mut self, anim: LoadAnim, duration_ms: u16, easing: Easing) {
        let attr = sanitize_global(AnimAttr::new(anim, duration_ms, easing));
        self.anim_state.global = attr;
        self.telemetry.log(
            LogLevel::Info,
            TARGET_TRANSITION,
            "global_anim_set",
            [
                json_str("anim", format!("{:?}", attr.anim)),
                json_kv("duration_ms", attr.duration_ms),
                json_str("easing", format!("{:?}", attr.easing)),
            ],
        );
    }

    /// Raw-code form; an out-of-range code stores `None`.
    pub fn set_global_load_anim_code(&mut self, code: u8, duration_ms: u16, easing: Easing) {
        let anim = match LoadAnim::try_from(code) {
            Ok(anim) => anim,
            Err(err) => {
                self.telemetry.log(
                    LogLevel::Error,
                    TARGET_TRANSITION,
                    "global_anim_rejected",
                    [json_str("error", err.to_string())],
                );
                LoadAnim::None
            }
        };
        self.set_global_load_anim(anim, duration_ms, easing);
    }

    pub fn page_stash(&self, name: &str) -> Option<&[u8]> {
        self.registry.get(name).and_then(|page| page.stash.as_bytes())
    }

    pub fn page_state(&self, name: &str) -> Option<PageState> {
        self.registry.get(name).map(Page::state)
    }

    pub fn is_cached(&self, name: &str) -> Option<bool> {
        self.registry.get(name).map(Page::is_cached)
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.registry.get(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.prev.as_deref()
    }

    /// Stack entries from the top down.
    pub fn stack_names(&self) -> Vec<PageName> {
        self.stack.names()
    }

    pub fn is_switching(&self) -> bool {
        self.anim_state.switch_requested
    }

    pub fn current_anim(&self) -> AnimAttr {
        self.anim_state.current
    }

    pub fn global_anim(&self) -> AnimAttr {
        self.anim_state.global
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        let mut pages: Vec<_> = self
            .registry
            .pages()
            .map(|page| PageSnapshot {
                name: page.name.clone(),
                state: page.state,
                cached: page.cache.cached,
                has_root: page.root.is_some(),
                busy: page.anim.busy,
                stash_len: page.stash.len(),
            })
            .collect();
        pages.sort_by(|a, b| a.name.cmp(&b.name));

        NavigationSnapshot {
            stack: self.stack.names(),
            current: self.current.clone(),
            previous: self.prev.clone(),
            switching: self.anim_state.switch_requested,
            anim: self.anim_state,
            pages,
        }
    }

    /// Log the current metrics snapshot, when both a logger and metrics are
    /// configured.
    pub fn emit_metrics(&self) {
        self.telemetry.emit_metrics();
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    /// Tear every page down and hand the toolkit back.
    pub fn shutdown(mut self) -> T {
        self.clear_stack(false);
        for name in self.registry.names() {
            let loaded = self
                .registry
                .get(&name)
                .is_some_and(|page| page.root.is_some());
            if loaded {
                self.force_unload(&name);
            }
        }
        self.current = None;
        self.anim_state.switch_requested = false;
        self.requests.clear();
        self.completions.clear();

        self.telemetry.log(
            LogLevel::Info,
            TARGET_MANAGER,
            "manager_shutdown",
            [json_kv("pages", self.registry.len())],
        );
        self.telemetry
            .audit(NavigationAuditStage::ManagerShutdown, None, []);
        self.telemetry.emit_metrics();
        self.toolkit
    }

    fn ensure_idle(&self, op: &str) -> Result<()> {
        if self.anim_state.switch_requested || self.anim_state.busy {
            return self.reject(op, NavError::TransitionBusy);
        }
        Ok(())
    }

    fn reject<V>(&self, op: &str, err: NavError) -> Result<V> {
        let level = match err {
            NavError::TransitionBusy | NavError::StackEmpty => LogLevel::Warn,
            _ => LogLevel::Error,
        };
        let details = [
            json_str("op", op),
            json_str("kind", err.kind()),
            json_str("error", err.to_string()),
        ];
        self.telemetry
            .log(level, TARGET_MANAGER, "request_rejected", details.clone());
        self.telemetry.metric(NavigationMetrics::record_rejected);
        self.telemetry
            .audit(NavigationAuditStage::RequestRejected, None, details);
        Err(err)
    }

    /// Run navigation that hooks asked for while the manager was busy.
    fn flush_requests(&mut self) {
        while let Some(request) = self.requests.pop_front() {
            self.telemetry.log(
                LogLevel::Debug,
                TARGET_MANAGER,
                "hook_request",
                [json_kv("request", json!(format!("{request:?}")))],
            );
            let _ = match request {
                NavRequest::Push { name, stash } => self.push_inner(&name, stash.as_deref()),
                NavRequest::Pop => self.pop_inner(),
                NavRequest::BackHome => self.back_home_inner(),
            };
            self.drain_completions();
        }
    }
}

fn sanitize_global(attr: AnimAttr) -> AnimAttr {
    if attr.anim == LoadAnim::Global {
        AnimAttr {
            anim: LoadAnim::None,
            ..attr
        }
    } else {
        attr
    }
}

#[cfg(test)]
mod tests;
