use crate::anim::{AnimProperty, LoadAnimAttr};
use crate::geometry::Point;
use crate::logging::{LogLevel, json_kv, json_str};
use crate::page::RootEvent;
use crate::toolkit::{AnimTag, AnimationRequest, AnimationRun, DeferredCall, NodeHandle, Toolkit};

use super::audit::NavigationAuditStage;
use super::{PageManager, TARGET_DRAG};

/// Distance a throw keeps travelling once released: the vector is summed
/// while it decays by `decay_percent` per step (integer math) until zero.
pub fn predict_throw(vector: Point, decay_percent: i32) -> Point {
    let keep = 100 - decay_percent.clamp(1, 100);
    let travel = |mut v: i32| {
        let mut sum = 0;
        while v != 0 {
            sum += v;
            v = v * keep / 100;
        }
        sum
    };
    Point::new(travel(vector.x), travel(vector.y))
}

impl<T: Toolkit> PageManager<T> {
    /// Toolkit callback: pointer input on the root of page `name`.
    pub fn handle_root_event(&mut self, name: &str, event: RootEvent) {
        self.dispatch_root_event(name, event);
        self.drain_completions();
        self.flush_requests();
    }

    /// Toolkit callback: run work deferred out of an earlier event.
    pub fn run_deferred(&mut self, call: DeferredCall) {
        match call {
            DeferredCall::Leave(name) => {
                self.telemetry.log(
                    LogLevel::Info,
                    TARGET_DRAG,
                    "page_leave",
                    [json_str("page", name.as_str())],
                );
                self.dispatch_root_event(&name, RootEvent::Leave);
            }
        }
        self.drain_completions();
        self.flush_requests();
    }

    fn dispatch_root_event(&mut self, name: &str, event: RootEvent) {
        let Some(page) = self.registry.get_mut(name) else {
            self.telemetry.log(
                LogLevel::Error,
                TARGET_DRAG,
                "root_event_for_unknown_page",
                [json_str("page", name)],
            );
            return;
        };
        page.deliver_root_event(&event, &mut self.requests);
        if !page.drag_enabled {
            return;
        }
        let Some(node) = page.root else {
            return;
        };

        let viewport = self.toolkit.viewport();
        let Some(attr) = LoadAnimAttr::for_anim(self.anim_state.current.anim, viewport) else {
            self.telemetry.log(
                LogLevel::Error,
                TARGET_DRAG,
                "drag_without_anim_attr",
                [json_str("page", name)],
            );
            return;
        };
        let Some(property) = attr.property else {
            return;
        };

        match event {
            RootEvent::Pressed => self.drag_pressed(name, node, property),
            RootEvent::Pressing { vector } => self.drag_moved(node, property, &attr, vector),
            RootEvent::Released { vector } => {
                self.drag_released(name, node, property, &attr, vector)
            }
            RootEvent::Leave => {}
        }
    }

    fn drag_pressed(&mut self, name: &str, node: NodeHandle, property: AnimProperty) {
        if self.anim_state.switch_requested || !self.anim_state.busy {
            return;
        }
        self.toolkit.cancel_animation(node, property);
        self.anim_state.busy = false;
        self.telemetry.log(
            LogLevel::Debug,
            TARGET_DRAG,
            "settle_interrupted",
            [json_str("page", name)],
        );
    }

    fn drag_moved(
        &mut self,
        node: NodeHandle,
        property: AnimProperty,
        attr: &LoadAnimAttr,
        vector: Point,
    ) {
        let moved = self.toolkit.property(node, property) + attr.project(vector.x, vector.y);
        let clamped = attr.pop.exit.clamp(moved);
        self.toolkit.set_property(node, property, clamped);
    }

    fn drag_released(
        &mut self,
        name: &str,
        node: NodeHandle,
        property: AnimProperty,
        attr: &LoadAnimAttr,
        vector: Point,
    ) {
        if self.anim_state.switch_requested {
            return;
        }

        let travel = attr.push.enter.end - attr.push.enter.start;
        let predicted = predict_throw(vector, self.drag_decay_percent);
        let start = self.toolkit.property(node, property);
        let end = start + attr.project(predicted.x, predicted.y);
        self.telemetry.log(
            LogLevel::Debug,
            TARGET_DRAG,
            "drag_released",
            [
                json_str("page", name),
                json_kv("start", start),
                json_kv("end", end),
                json_kv("travel", travel),
            ],
        );

        if end.abs() > travel.abs() / 2 {
            self.toolkit
                .dispatch_deferred(DeferredCall::Leave(name.to_string()));
            self.telemetry.audit(
                NavigationAuditStage::DragCommitted,
                Some(name),
                [json_kv("end", end)],
            );
            return;
        }
        if end == attr.push.enter.end {
            return;
        }

        let settle = self.anim_state.current;
        self.anim_state.busy = true;
        let run = match settle.effective_duration_ms() {
            0 => {
                self.toolkit
                    .set_property(node, property, attr.push.enter.end);
                AnimationRun::Finished
            }
            duration_ms => self.toolkit.run_animation(AnimationRequest {
                node,
                property,
                from: start,
                to: attr.push.enter.end,
                duration_ms,
                easing: settle.easing,
                tag: AnimTag::DragSettle(name.to_string()),
            }),
        };
        if run == AnimationRun::Finished {
            self.finish_drag_settle(name);
        }
    }

    pub(crate) fn finish_drag_settle(&mut self, name: &str) {
        self.anim_state.busy = false;
        self.telemetry.log(
            LogLevel::Debug,
            TARGET_DRAG,
            "settle_finished",
            [json_str("page", name)],
        );
        self.telemetry
            .audit(NavigationAuditStage::DragSettled, Some(name), []);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throw_prediction_sums_decaying_series() {
        // 10 + 8 + 6 + 4 + 3 + 2 + 1
        assert_eq!(predict_throw(Point::new(10, 0), 20), Point::new(34, 0));
        assert_eq!(predict_throw(Point::new(0, -10), 20), Point::new(0, -34));
        assert_eq!(predict_throw(Point::ZERO, 20), Point::ZERO);
    }

    #[test]
    fn full_decay_keeps_only_the_first_step() {
        assert_eq!(predict_throw(Point::new(7, 3), 100), Point::new(7, 3));
    }

    #[test]
    fn zero_decay_is_clamped_so_the_series_ends() {
        let predicted = predict_throw(Point::new(5, 0), 0);
        assert!(predicted.x >= 5);
    }
}
