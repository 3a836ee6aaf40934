//! Page model: lifecycle hooks, per-page state and the stash buffer.
//!
//! A [`Page`] pairs the user's [`PageLifecycle`] implementation with the
//! bookkeeping the manager keeps for it (state, root node, cache flags,
//! animation flags). Only the manager mutates that bookkeeping.

mod lifecycle;
mod stash;
mod state;

use std::collections::VecDeque;

use crate::anim::AnimAttr;
use crate::error::NavError;
use crate::toolkit::NodeHandle;

pub use lifecycle::{
    LifecycleHook, NavRequest, PageAttributes, PageContext, PageLifecycle, RootEvent,
};
pub use stash::{Stash, StashWrite};
pub use state::{Flow, PageState};

pub type PageName = String;

/// Cache requests made at install time and the flags derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheFlags {
    pub request_enable_cache: bool,
    pub request_disable_auto_cache: bool,
    /// Latched from the request each time the page is pushed.
    pub auto_cache_disabled: bool,
    /// Whether the root survives the next disappear.
    pub cached: bool,
}

impl CacheFlags {
    /// Decide the cache flag once a view has loaded.
    pub fn resolve_on_load(&mut self) -> bool {
        self.cached = if self.auto_cache_disabled {
            self.request_enable_cache
        } else {
            true
        };
        self.cached
    }
}

/// Animation flags of one page inside a switch.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PageAnim {
    pub entering: bool,
    pub busy: bool,
    pub attr: AnimAttr,
}

pub struct Page {
    pub(crate) name: PageName,
    pub(crate) hooks: Box<dyn PageLifecycle>,
    pub(crate) state: PageState,
    pub(crate) root: Option<NodeHandle>,
    pub(crate) cache: CacheFlags,
    pub(crate) stash: Stash,
    pub(crate) anim: PageAnim,
    pub(crate) drag_enabled: bool,
}

impl Page {
    pub(crate) fn new(name: impl Into<PageName>, hooks: Box<dyn PageLifecycle>) -> Self {
        Self {
            name: name.into(),
            hooks,
            state: PageState::Idle,
            root: None,
            cache: CacheFlags::default(),
            stash: Stash::new(),
            anim: PageAnim::default(),
            drag_enabled: false,
        }
    }

    /// Run the install-time configuration hook. Returns the rejected settings.
    pub(crate) fn configure(&mut self) -> Vec<NavError> {
        let mut attrs = PageAttributes::new(&self.name, &mut self.cache, &mut self.anim.attr);
        self.hooks.on_custom_attr_config(&mut attrs);
        attrs.into_errors()
    }

    pub(crate) fn invoke(&mut self, hook: LifecycleHook, requests: &mut VecDeque<NavRequest>) {
        let mut ctx = PageContext::new(&self.name, self.root, &self.stash, requests);
        hook.call(self.hooks.as_mut(), &mut ctx);
    }

    pub(crate) fn deliver_root_event(
        &mut self,
        event: &RootEvent,
        requests: &mut VecDeque<NavRequest>,
    ) {
        let mut ctx = PageContext::new(&self.name, self.root, &self.stash, requests);
        self.hooks.on_root_event(&mut ctx, event);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    pub fn is_cached(&self) -> bool {
        self.cache.cached
    }

    pub fn is_busy(&self) -> bool {
        self.anim.busy
    }

    pub fn anim_attr(&self) -> AnimAttr {
        self.anim.attr
    }

    pub fn stash(&self) -> &Stash {
        &self.stash
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("root", &self.root)
            .field("cache", &self.cache)
            .field("busy", &self.anim.busy)
            .finish()
    }
}
