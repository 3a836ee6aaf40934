//! Seam between the page manager and the GUI toolkit that owns nodes,
//! animations and the input loop.
//!
//! The manager never interpolates anything itself. It asks the toolkit to
//! run an animation and gets told when it finished, either immediately
//! through [`AnimationRun::Finished`] or later via
//! `PageManager::animation_finished` with the request's [`AnimTag`].

mod headless;

use serde::Serialize;

use crate::anim::{AnimProperty, Easing};
use crate::geometry::Extent;
use crate::page::PageName;

pub use headless::{HeadlessNode, HeadlessToolkit};

/// Opaque handle to a toolkit node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeHandle(pub u64);

/// Identifies which completion a finished animation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimTag {
    /// Enter or exit animation of a page switch.
    Transition(PageName),
    /// Snap-back after a drag that did not dismiss the page.
    DragSettle(PageName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub node: NodeHandle,
    pub property: AnimProperty,
    pub from: i32,
    pub to: i32,
    pub duration_ms: u32,
    pub easing: Easing,
    pub tag: AnimTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationRun {
    /// Completion will be reported later.
    Running,
    /// The end value was applied synchronously; no callback will follow.
    Finished,
}

/// Work the toolkit runs on a later tick, outside the current event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredCall {
    Leave(PageName),
}

pub trait Toolkit {
    fn viewport(&self) -> Extent;

    /// Full-screen child of the active screen.
    fn create_node(&mut self, size: Extent) -> NodeHandle;
    fn destroy_node(&mut self, node: NodeHandle);

    fn set_property(&mut self, node: NodeHandle, property: AnimProperty, value: i32);
    fn property(&self, node: NodeHandle, property: AnimProperty) -> i32;

    fn run_animation(&mut self, request: AnimationRequest) -> AnimationRun;
    /// Drop any running animation of `property` on `node` without completing it.
    fn cancel_animation(&mut self, node: NodeHandle, property: AnimProperty);

    fn raise_to_front(&mut self, node: NodeHandle);
    fn dispatch_deferred(&mut self, call: DeferredCall);

    /// Route pointer events on `node` to the named page.
    fn bind_input(&mut self, node: NodeHandle, page: &str);
    fn enable_drag(&mut self, node: NodeHandle);
}
