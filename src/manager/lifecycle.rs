use serde_json::json;

use crate::anim::{DragDir, LoadAnim, LoadAnimAttr};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::metrics::NavigationMetrics;
use crate::page::{Flow, LifecycleHook, PageState};
use crate::toolkit::Toolkit;

use super::audit::NavigationAuditStage;
use super::{PageManager, TARGET_LIFECYCLE};

impl<T: Toolkit> PageManager<T> {
    /// Step the page's state machine until it parks on an animation or idles.
    pub(crate) fn drive(&mut self, name: &str) {
        loop {
            let Some(state) = self.registry.get(name).map(|page| page.state) else {
                self.telemetry.log(
                    LogLevel::Warn,
                    TARGET_LIFECYCLE,
                    "drive_unknown_page",
                    [json_str("page", name)],
                );
                return;
            };

            self.enter_state(name, state);

            let Some(page) = self.registry.get_mut(name) else {
                return;
            };
            let (next, flow) = state.successor(page.cache.cached);
            debug_assert!(
                flow == Flow::Park || !next.is_animation_gated(),
                "{state:?} stepped into {next:?} without an animation"
            );
            page.state = next;

            if next != state {
                self.telemetry.audit(
                    NavigationAuditStage::StateChanged,
                    Some(name),
                    [
                        json_kv("from", state.name()),
                        json_kv("to", next.name()),
                    ],
                );
            }
            if flow == Flow::Park {
                return;
            }
        }
    }

    fn enter_state(&mut self, name: &str, state: PageState) {
        self.telemetry.log(
            LogLevel::Trace,
            TARGET_LIFECYCLE,
            "enter_state",
            [json_str("page", name), json_str("state", state.name())],
        );

        match state {
            PageState::Idle => {}
            PageState::Load => self.load_execute(name),
            PageState::WillAppear => {
                self.invoke(name, LifecycleHook::ViewWillAppear);
                self.start_transition(name);
            }
            PageState::DidAppear => {
                self.invoke(name, LifecycleHook::ViewDidAppear);
                self.telemetry.log(
                    LogLevel::Info,
                    TARGET_LIFECYCLE,
                    "page_active",
                    [json_str("page", name)],
                );
            }
            PageState::Activity => {
                self.telemetry.log(
                    LogLevel::Debug,
                    TARGET_LIFECYCLE,
                    "page_superseded",
                    [json_str("page", name)],
                );
            }
            PageState::WillDisappear => {
                self.invoke(name, LifecycleHook::ViewWillDisappear);
                self.start_transition(name);
            }
            PageState::DidDisappear => {
                if self.anim_state.current.anim == LoadAnim::FadeOn {
                    self.telemetry.log(
                        LogLevel::Debug,
                        TARGET_LIFECYCLE,
                        "page_faded_out",
                        [json_str("page", name)],
                    );
                }
                self.invoke(name, LifecycleHook::ViewDidDisappear);
            }
            PageState::Unload => self.unload_execute(name),
        }
    }

    pub(crate) fn invoke(&mut self, name: &str, hook: LifecycleHook) {
        let Some(page) = self.registry.get_mut(name) else {
            return;
        };
        page.invoke(hook, &mut self.requests);
        self.telemetry
            .audit(NavigationAuditStage::HookInvoked, Some(name), [json_kv("hook", hook.name())]);
    }

    fn load_execute(&mut self, name: &str) {
        let viewport = self.toolkit.viewport();
        let Some(page) = self.registry.get_mut(name) else {
            return;
        };

        match page.root {
            Some(node) => self.telemetry.log(
                LogLevel::Error,
                TARGET_LIFECYCLE,
                "root_already_loaded",
                [json_str("page", name), json_kv("node", node.0)],
            ),
            None => {
                let node = self.toolkit.create_node(viewport);
                self.toolkit.bind_input(node, name);
                page.root = Some(node);
            }
        }
        self.telemetry.metric(NavigationMetrics::record_load);

        self.invoke(name, LifecycleHook::ViewLoad);
        self.enable_drag_if_covering(name);
        self.invoke(name, LifecycleHook::ViewDidLoad);

        if let Some(page) = self.registry.get_mut(name) {
            let cached = page.cache.resolve_on_load();
            self.telemetry.log(
                LogLevel::Info,
                TARGET_LIFECYCLE,
                "page_loaded",
                [
                    json_str("page", name),
                    json_kv("cached", cached),
                    json_kv("auto_cache", !page.cache.auto_cache_disabled),
                ],
            );
        }
    }

    /// A slide-over page can be dragged away only when the page it covers
    /// is still alive underneath.
    fn enable_drag_if_covering(&mut self, name: &str) {
        let anim = self.anim_state.current.anim;
        if !anim.is_over() {
            return;
        }
        let beneath_cached = self
            .stack
            .below_top()
            .and_then(|beneath| self.registry.get(beneath))
            .is_some_and(|page| page.cache.cached);
        if !beneath_cached {
            return;
        }
        let Some(attr) = LoadAnimAttr::for_anim(anim, self.toolkit.viewport()) else {
            return;
        };
        if attr.drag_dir == DragDir::None {
            return;
        }

        let Some(page) = self.registry.get_mut(name) else {
            return;
        };
        if let Some(node) = page.root {
            self.toolkit.enable_drag(node);
            page.drag_enabled = true;
            self.telemetry.log(
                LogLevel::Debug,
                TARGET_LIFECYCLE,
                "drag_enabled",
                [
                    json_str("page", name),
                    json_str("axis", format!("{:?}", attr.drag_dir)),
                ],
            );
        }
    }

    fn unload_execute(&mut self, name: &str) {
        let Some(page) = self.registry.get_mut(name) else {
            return;
        };
        let Some(node) = page.root.take() else {
            self.telemetry.log(
                LogLevel::Warn,
                TARGET_LIFECYCLE,
                "page_already_unloaded",
                [json_str("page", name)],
            );
            return;
        };

        if let Some(freed) = page.stash.clear() {
            self.telemetry.log(
                LogLevel::Debug,
                TARGET_LIFECYCLE,
                "stash_freed",
                [json_str("page", name), json_kv("size", freed)],
            );
        }
        page.cache.cached = false;
        page.drag_enabled = false;
        self.toolkit.destroy_node(node);
        self.telemetry.metric(NavigationMetrics::record_unload);
        self.telemetry.log(
            LogLevel::Info,
            TARGET_LIFECYCLE,
            "page_unloaded",
            [json_str("page", name)],
        );

        self.invoke(name, LifecycleHook::ViewDidUnload);
    }

    /// Tear a page down at once: skip its animations, run the disappear
    /// hooks if it is on screen, then unload.
    pub(crate) fn force_unload(&mut self, name: &str) -> bool {
        let viewport = self.toolkit.viewport();
        let property = LoadAnimAttr::for_anim(self.anim_state.current.anim, viewport)
            .and_then(|attr| attr.property);
        let Some(page) = self.registry.get_mut(name) else {
            self.telemetry.log(
                LogLevel::Error,
                TARGET_LIFECYCLE,
                "force_unload_unknown_page",
                [json_str("page", name)],
            );
            return false;
        };

        let state = page.state;
        if page.anim.busy {
            if let (Some(node), Some(property)) = (page.root, property) {
                self.toolkit.cancel_animation(node, property);
            }
            page.anim.busy = false;
        }
        self.completions.retain(|pending| pending != name);

        self.telemetry.log(
            LogLevel::Info,
            TARGET_LIFECYCLE,
            "force_unload",
            [json_str("page", name), json_str("state", state.name())],
        );
        self.telemetry.audit(
            NavigationAuditStage::ForcedUnload,
            Some(name),
            [json_kv("state", json!(state.name()))],
        );

        if state == PageState::Activity {
            self.invoke(name, LifecycleHook::ViewWillDisappear);
            self.invoke(name, LifecycleHook::ViewDidDisappear);
        }
        self.unload_execute(name);

        if let Some(page) = self.registry.get_mut(name) {
            page.state = PageState::Idle;
            page.anim.entering = false;
        }
        true
    }
}
