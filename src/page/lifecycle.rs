use std::collections::VecDeque;

use crate::anim::{AnimAttr, Easing, LoadAnim};
use crate::error::NavError;
use crate::geometry::Point;
use crate::toolkit::NodeHandle;

use super::{CacheFlags, Stash};

/// Input routed to a page's root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEvent {
    Pressed,
    Pressing { vector: Point },
    Released { vector: Point },
    /// The page was dragged far enough to be dismissed.
    Leave,
}

/// Navigation asked for from inside a hook. Applied once the manager is
/// back at a quiet point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRequest {
    Push { name: String, stash: Option<Vec<u8>> },
    Pop,
    BackHome,
}

/// View hooks a page implements. Every hook is optional.
pub trait PageLifecycle {
    /// Runs once at install time, before anything is drawn.
    fn on_custom_attr_config(&mut self, _attrs: &mut PageAttributes<'_>) {}

    /// Build the view under `ctx.root()`.
    fn on_view_load(&mut self, _ctx: &mut PageContext<'_>) {}
    fn on_view_did_load(&mut self, _ctx: &mut PageContext<'_>) {}
    fn on_view_will_appear(&mut self, _ctx: &mut PageContext<'_>) {}
    fn on_view_did_appear(&mut self, _ctx: &mut PageContext<'_>) {}
    fn on_view_will_disappear(&mut self, _ctx: &mut PageContext<'_>) {}
    fn on_view_did_disappear(&mut self, _ctx: &mut PageContext<'_>) {}
    /// The root node is already gone when this runs.
    fn on_view_did_unload(&mut self, _ctx: &mut PageContext<'_>) {}

    /// Default answers a completed drag-away with a pop.
    fn on_root_event(&mut self, ctx: &mut PageContext<'_>, event: &RootEvent) {
        if matches!(event, RootEvent::Leave) {
            ctx.request_pop();
        }
    }
}

/// Hook selector used by the lifecycle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    ViewLoad,
    ViewDidLoad,
    ViewWillAppear,
    ViewDidAppear,
    ViewWillDisappear,
    ViewDidDisappear,
    ViewDidUnload,
}

impl LifecycleHook {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::ViewLoad => "on_view_load",
            LifecycleHook::ViewDidLoad => "on_view_did_load",
            LifecycleHook::ViewWillAppear => "on_view_will_appear",
            LifecycleHook::ViewDidAppear => "on_view_did_appear",
            LifecycleHook::ViewWillDisappear => "on_view_will_disappear",
            LifecycleHook::ViewDidDisappear => "on_view_did_disappear",
            LifecycleHook::ViewDidUnload => "on_view_did_unload",
        }
    }

    pub(crate) fn call(self, hooks: &mut dyn PageLifecycle, ctx: &mut PageContext<'_>) {
        match self {
            LifecycleHook::ViewLoad => hooks.on_view_load(ctx),
            LifecycleHook::ViewDidLoad => hooks.on_view_did_load(ctx),
            LifecycleHook::ViewWillAppear => hooks.on_view_will_appear(ctx),
            LifecycleHook::ViewDidAppear => hooks.on_view_did_appear(ctx),
            LifecycleHook::ViewWillDisappear => hooks.on_view_will_disappear(ctx),
            LifecycleHook::ViewDidDisappear => hooks.on_view_did_disappear(ctx),
            LifecycleHook::ViewDidUnload => hooks.on_view_did_unload(ctx),
        }
    }
}

/// What a hook can see and ask for while it runs.
pub struct PageContext<'a> {
    name: &'a str,
    root: Option<NodeHandle>,
    stash: &'a Stash,
    requests: &'a mut VecDeque<NavRequest>,
}

impl<'a> PageContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        root: Option<NodeHandle>,
        stash: &'a Stash,
        requests: &'a mut VecDeque<NavRequest>,
    ) -> Self {
        Self {
            name,
            root,
            stash,
            requests,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    /// Copy the stash into `out`; only succeeds on an exact size match.
    pub fn stash(&self, out: &mut [u8]) -> bool {
        self.stash.read_into(out)
    }

    pub fn stash_bytes(&self) -> Option<&[u8]> {
        self.stash.as_bytes()
    }

    pub fn request_push(&mut self, name: impl Into<String>, stash: Option<Vec<u8>>) {
        self.requests.push_back(NavRequest::Push {
            name: name.into(),
            stash,
        });
    }

    pub fn request_pop(&mut self) {
        self.requests.push_back(NavRequest::Pop);
    }

    pub fn request_back_home(&mut self) {
        self.requests.push_back(NavRequest::BackHome);
    }
}

/// Install-time configuration handed to `on_custom_attr_config`.
pub struct PageAttributes<'a> {
    name: &'a str,
    cache: &'a mut CacheFlags,
    anim: &'a mut AnimAttr,
    errors: Vec<NavError>,
}

impl<'a> PageAttributes<'a> {
    pub(crate) fn new(name: &'a str, cache: &'a mut CacheFlags, anim: &'a mut AnimAttr) -> Self {
        Self {
            name,
            cache,
            anim,
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Turning automatic caching off makes [`Self::set_cache_enable`] decide.
    pub fn set_auto_cache_enable(&mut self, enable: bool) {
        self.cache.request_disable_auto_cache = !enable;
    }

    /// Force caching on or off. Implies manual cache control.
    pub fn set_cache_enable(&mut self, enable: bool) {
        self.set_auto_cache_enable(false);
        self.cache.request_enable_cache = enable;
    }

    pub fn set_load_anim(&mut self, anim: LoadAnim, duration_ms: u16, easing: Easing) {
        *self.anim = AnimAttr::new(anim, duration_ms, easing);
    }

    /// Numeric form for configuration coming from outside. An unknown code
    /// leaves the page on the manager-wide animation.
    pub fn set_load_anim_code(&mut self, code: u8, duration_ms: u16, easing: Easing) {
        match LoadAnim::try_from(code) {
            Ok(anim) => self.set_load_anim(anim, duration_ms, easing),
            Err(err) => {
                self.set_load_anim(LoadAnim::Global, duration_ms, easing);
                self.errors.push(err);
            }
        }
    }

    pub(crate) fn into_errors(self) -> Vec<NavError> {
        self.errors
    }
}
