use crate::anim::{LoadAnim, LoadAnimAttr};
use crate::error::{NavError, Result};
use crate::logging::{LogLevel, json_kv, json_str};
use crate::metrics::NavigationMetrics;
use crate::page::PageState;
use crate::toolkit::{AnimTag, AnimationRequest, AnimationRun, Toolkit};

use super::audit::NavigationAuditStage;
use super::{PageManager, TARGET_TRANSITION};

impl<T: Toolkit> PageManager<T> {
    /// Make `name` the current page, animating away from `prev`.
    pub(crate) fn switch_to(
        &mut self,
        name: &str,
        pushing: bool,
        stash: Option<&[u8]>,
    ) -> Result<()> {
        if self.anim_state.switch_requested {
            return self.reject("switch", NavError::TransitionBusy);
        }
        if !self.registry.contains(name) {
            return self.reject("switch", NavError::NotInstalled(name.to_string()));
        }
        self.anim_state.switch_requested = true;

        if let Some(payload) = stash {
            self.copy_stash(name, payload);
        }

        // A page popped off an emptied stack is still on screen as `prev`;
        // pushing it again makes it the only participant.
        if self.prev.as_deref() == Some(name) {
            self.prev = None;
        }
        if let Some(prev) = self.prev.as_deref().and_then(|p| self.registry.get_mut(p)) {
            prev.anim.entering = false;
        }
        if let Some(page) = self.registry.get_mut(name) {
            let from = page.state;
            let on_screen = page.root.is_some() && from == PageState::Activity;
            if on_screen {
                let cached = page.cache.resolve_on_load();
                self.telemetry.log(
                    LogLevel::Debug,
                    TARGET_TRANSITION,
                    "page_reentered",
                    [json_str("page", name), json_kv("cached", cached)],
                );
            }
            page.state = if page.cache.cached || on_screen {
                PageState::WillAppear
            } else {
                PageState::Load
            };
            page.anim.entering = true;
            if from != page.state {
                self.telemetry.audit(
                    NavigationAuditStage::StateChanged,
                    Some(name),
                    [
                        json_kv("from", from.name()),
                        json_kv("to", page.state.name()),
                    ],
                );
            }
        }
        self.current = Some(name.to_string());
        self.anim_state.pushing = pushing;
        if pushing {
            self.update_anim_type(name);
        }

        let prev = self.prev.clone();
        self.telemetry.log(
            LogLevel::Info,
            TARGET_TRANSITION,
            "switch_started",
            [
                json_str("from", prev.as_deref().unwrap_or("")),
                json_str("to", name),
                json_str("direction", if pushing { "push" } else { "pop" }),
                json_str("anim", format!("{:?}", self.anim_state.current.anim)),
            ],
        );
        self.telemetry.audit(
            NavigationAuditStage::SwitchStarted,
            Some(name),
            [
                json_str("from", prev.as_deref().unwrap_or("")),
                json_kv("pushing", pushing),
            ],
        );

        if let Some(prev) = prev.as_deref() {
            self.drive(prev);
        }
        self.drive(name);
        self.restack(prev.as_deref(), name, pushing);

        self.drain_completions();
        Ok(())
    }

    fn copy_stash(&mut self, name: &str, payload: &[u8]) {
        let from = self.prev.clone().unwrap_or_default();
        let Some(page) = self.registry.get_mut(name) else {
            return;
        };
        match page.stash.store(payload) {
            Ok(write) => self.telemetry.log(
                LogLevel::Info,
                TARGET_TRANSITION,
                "stash_copied",
                [
                    json_str("from", from),
                    json_str("to", name),
                    json_kv("size", payload.len()),
                    json_str("write", format!("{write:?}").to_lowercase()),
                    json_str("digest", page.stash.digest().unwrap_or_default()),
                ],
            ),
            Err(err) => self.telemetry.log(
                LogLevel::Error,
                TARGET_TRANSITION,
                "stash_copy_failed",
                [json_str("to", name), json_str("error", err.to_string())],
            ),
        }
    }

    /// Push puts the new page on top; pop keeps the leaving page above the
    /// revealed one until it has animated out.
    fn restack(&mut self, prev: Option<&str>, current: &str, pushing: bool) {
        let root_of = |name: Option<&str>| {
            name.and_then(|name| self.registry.get(name))
                .and_then(|page| page.root)
        };
        let prev_root = root_of(prev);
        let current_root = root_of(Some(current));
        let order = if pushing {
            [prev_root, current_root]
        } else {
            [current_root, prev_root]
        };
        for node in order.into_iter().flatten() {
            self.toolkit.raise_to_front(node);
        }
    }

    /// Resolve the transition type from `name`'s own setting or the global one.
    pub(crate) fn update_anim_type(&mut self, name: &str) {
        let Some(page) = self.registry.get(name) else {
            return;
        };
        let own = page.anim.attr;
        let (attr, source) = if own.anim == LoadAnim::Global {
            (self.anim_state.global, "global")
        } else {
            (own, "page")
        };
        self.anim_state.current = attr;
        self.telemetry.log(
            LogLevel::Debug,
            TARGET_TRANSITION,
            "anim_type_resolved",
            [
                json_str("page", name),
                json_str("source", source),
                json_str("anim", format!("{:?}", attr.anim)),
                json_kv("duration_ms", attr.duration_ms),
            ],
        );
    }

    /// Animate `name` in or out according to its role in the running switch.
    pub(crate) fn start_transition(&mut self, name: &str) {
        let viewport = self.toolkit.viewport();
        let current = self.anim_state.current;
        let pushing = self.anim_state.pushing;
        let attr = LoadAnimAttr::for_anim(current.anim, viewport).unwrap_or_else(|| {
            self.telemetry.log(
                LogLevel::Error,
                TARGET_TRANSITION,
                "anim_type_unresolved",
                [json_str("page", name)],
            );
            LoadAnimAttr::default()
        });

        let Some(page) = self.registry.get_mut(name) else {
            return;
        };
        let entering = page.anim.entering;
        let role = attr.role(pushing);
        let duration_ms = current.effective_duration_ms();
        page.anim.busy = true;

        let run = match (page.root, attr.property) {
            (Some(node), Some(property)) => {
                let (from, to) = if entering {
                    (role.enter.start, role.enter.end)
                } else {
                    (self.toolkit.property(node, property), role.exit.end)
                };
                self.telemetry.log(
                    LogLevel::Debug,
                    TARGET_TRANSITION,
                    "anim_started",
                    [
                        json_str("page", name),
                        json_kv("entering", entering),
                        json_kv("from", from),
                        json_kv("to", to),
                        json_kv("duration_ms", duration_ms),
                    ],
                );
                if duration_ms == 0 {
                    self.toolkit.set_property(node, property, to);
                    AnimationRun::Finished
                } else {
                    self.toolkit.run_animation(AnimationRequest {
                        node,
                        property,
                        from,
                        to,
                        duration_ms,
                        easing: current.easing,
                        tag: AnimTag::Transition(name.to_string()),
                    })
                }
            }
            (None, _) => {
                self.telemetry.log(
                    LogLevel::Warn,
                    TARGET_TRANSITION,
                    "anim_without_root",
                    [json_str("page", name)],
                );
                AnimationRun::Finished
            }
            (Some(_), None) => AnimationRun::Finished,
        };

        self.telemetry.audit(
            NavigationAuditStage::TransitionStarted,
            Some(name),
            [
                json_kv("entering", entering),
                json_kv("sync", run == AnimationRun::Finished),
            ],
        );
        if run == AnimationRun::Finished {
            self.completions.push_back(name.to_string());
        }
    }

    /// Toolkit callback: an animation handed out earlier has completed.
    pub fn animation_finished(&mut self, tag: AnimTag) {
        match tag {
            AnimTag::Transition(name) => self.finish_transition(&name),
            AnimTag::DragSettle(name) => self.finish_drag_settle(&name),
        }
        self.drain_completions();
        self.flush_requests();
    }

    pub(crate) fn drain_completions(&mut self) {
        while let Some(name) = self.completions.pop_front() {
            self.finish_transition(&name);
        }
    }

    fn finish_transition(&mut self, name: &str) {
        let Some(page) = self.registry.get(name) else {
            self.telemetry.log(
                LogLevel::Warn,
                TARGET_TRANSITION,
                "completion_for_unknown_page",
                [json_str("page", name)],
            );
            return;
        };
        if !page.anim.busy {
            self.telemetry.log(
                LogLevel::Debug,
                TARGET_TRANSITION,
                "stale_completion",
                [json_str("page", name)],
            );
            return;
        }

        self.telemetry
            .audit(NavigationAuditStage::TransitionFinished, Some(name), []);
        self.drive(name);
        if let Some(page) = self.registry.get_mut(name) {
            page.anim.busy = false;
        }

        if self.join_switch() && !self.anim_state.pushing {
            if let Some(current) = self.current.clone() {
                self.update_anim_type(&current);
            }
        }
    }

    /// Close the switch once neither participant is still animating.
    fn join_switch(&mut self) -> bool {
        let busy = |name: Option<&str>| {
            name.and_then(|name| self.registry.get(name))
                .is_some_and(|page| page.anim.busy)
        };
        let current_busy = busy(self.current.as_deref());
        let prev_busy = busy(self.prev.as_deref());

        if current_busy || prev_busy {
            self.telemetry.log(
                LogLevel::Trace,
                TARGET_TRANSITION,
                "switch_waiting",
                [
                    json_kv("current_busy", current_busy),
                    json_kv("prev_busy", prev_busy),
                ],
            );
            return false;
        }

        if self.anim_state.switch_requested {
            self.telemetry.metric(NavigationMetrics::record_switch_completed);
            self.telemetry.log(
                LogLevel::Info,
                TARGET_TRANSITION,
                "switch_finished",
                [json_str("current", self.current.as_deref().unwrap_or(""))],
            );
            self.telemetry.audit(
                NavigationAuditStage::SwitchFinished,
                self.current.as_deref(),
                [],
            );
        }
        self.anim_state.switch_requested = false;
        self.prev = self.current.clone();
        true
    }
}
