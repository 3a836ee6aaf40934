use std::collections::{HashMap, VecDeque};

use crate::anim::{AnimProperty, OPA_COVER};
use crate::geometry::Extent;
use crate::manager::PageManager;

use super::{AnimTag, AnimationRequest, AnimationRun, DeferredCall, NodeHandle, Toolkit};

/// Node record kept by [`HeadlessToolkit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessNode {
    pub size: Extent,
    pub x: i32,
    pub y: i32,
    pub opacity: i32,
    pub draggable: bool,
    pub input_page: Option<String>,
}

impl HeadlessNode {
    fn new(size: Extent) -> Self {
        Self {
            size,
            x: 0,
            y: 0,
            opacity: OPA_COVER,
            draggable: false,
            input_page: None,
        }
    }

    fn value(&self, property: AnimProperty) -> i32 {
        match property {
            AnimProperty::X => self.x,
            AnimProperty::Y => self.y,
            AnimProperty::Opacity => self.opacity,
        }
    }

    fn set_value(&mut self, property: AnimProperty, value: i32) {
        match property {
            AnimProperty::X => self.x = value,
            AnimProperty::Y => self.y = value,
            AnimProperty::Opacity => self.opacity = value,
        }
    }
}

/// In-memory toolkit without a display.
///
/// Animations queue up until [`HeadlessToolkit::finish_next`] (or
/// [`PageManager::pump`]) completes them, so a test can stop a switch at any
/// point. In instant mode every animation finishes inside `run_animation`.
#[derive(Debug)]
pub struct HeadlessToolkit {
    viewport: Extent,
    instant: bool,
    next_id: u64,
    nodes: HashMap<NodeHandle, HeadlessNode>,
    z_order: Vec<NodeHandle>,
    running: VecDeque<AnimationRequest>,
    deferred: VecDeque<DeferredCall>,
    destroyed: Vec<NodeHandle>,
    cancelled: usize,
}

impl HeadlessToolkit {
    pub fn new(viewport: Extent) -> Self {
        Self {
            viewport,
            instant: false,
            next_id: 1,
            nodes: HashMap::new(),
            z_order: Vec::new(),
            running: VecDeque::new(),
            deferred: VecDeque::new(),
            destroyed: Vec::new(),
            cancelled: 0,
        }
    }

    pub fn instant(viewport: Extent) -> Self {
        Self {
            instant: true,
            ..Self::new(viewport)
        }
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&HeadlessNode> {
        self.nodes.get(&handle)
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Back to front.
    pub fn z_order(&self) -> &[NodeHandle] {
        &self.z_order
    }

    pub fn running(&self) -> impl Iterator<Item = &AnimationRequest> {
        self.running.iter()
    }

    pub fn destroyed(&self) -> &[NodeHandle] {
        &self.destroyed
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Complete the oldest running animation, applying its end value.
    pub fn finish_next(&mut self) -> Option<AnimTag> {
        let request = self.running.pop_front()?;
        if let Some(node) = self.nodes.get_mut(&request.node) {
            node.set_value(request.property, request.to);
        }
        Some(request.tag)
    }

    pub fn take_deferred(&mut self) -> Option<DeferredCall> {
        self.deferred.pop_front()
    }
}

impl Toolkit for HeadlessToolkit {
    fn viewport(&self) -> Extent {
        self.viewport
    }

    fn create_node(&mut self, size: Extent) -> NodeHandle {
        let handle = NodeHandle(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, HeadlessNode::new(size));
        self.z_order.push(handle);
        handle
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        if self.nodes.remove(&node).is_some() {
            self.z_order.retain(|entry| *entry != node);
            self.running.retain(|request| request.node != node);
            self.destroyed.push(node);
        }
    }

    fn set_property(&mut self, node: NodeHandle, property: AnimProperty, value: i32) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.set_value(property, value);
        }
    }

    fn property(&self, node: NodeHandle, property: AnimProperty) -> i32 {
        self.nodes
            .get(&node)
            .map(|entry| entry.value(property))
            .unwrap_or_default()
    }

    fn run_animation(&mut self, request: AnimationRequest) -> AnimationRun {
        if self.instant {
            self.set_property(request.node, request.property, request.to);
            return AnimationRun::Finished;
        }
        self.set_property(request.node, request.property, request.from);
        self.running.push_back(request);
        AnimationRun::Running
    }

    fn cancel_animation(&mut self, node: NodeHandle, property: AnimProperty) {
        let before = self.running.len();
        self.running
            .retain(|request| !(request.node == node && request.property == property));
        self.cancelled += before - self.running.len();
    }

    fn raise_to_front(&mut self, node: NodeHandle) {
        if let Some(idx) = self.z_order.iter().position(|entry| *entry == node) {
            let entry = self.z_order.remove(idx);
            self.z_order.push(entry);
        }
    }

    fn dispatch_deferred(&mut self, call: DeferredCall) {
        self.deferred.push_back(call);
    }

    fn bind_input(&mut self, node: NodeHandle, page: &str) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.input_page = Some(page.to_string());
        }
    }

    fn enable_drag(&mut self, node: NodeHandle) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.draggable = true;
        }
    }
}

impl PageManager<HeadlessToolkit> {
    /// Deliver queued animation completions and deferred calls until the
    /// toolkit has nothing left. Returns how many were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            if let Some(tag) = self.toolkit_mut().finish_next() {
                self.animation_finished(tag);
            } else if let Some(call) = self.toolkit_mut().take_deferred() {
                self.run_deferred(call);
            } else {
                return delivered;
            }
            delivered += 1;
        }
    }
}
