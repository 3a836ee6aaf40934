//! Page navigation controller for embedded GUIs.
//!
//! Pages are installed by name, pushed onto a navigation stack and driven
//! through a view lifecycle while the toolkit animates them in and out. The
//! modules keep the same shape throughout: each orchestrator re-exports the
//! types callers need and keeps the implementation private.

pub mod anim;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod page;
pub mod registry;
pub mod stack;
pub mod toolkit;

pub use anim::{AnimAttr, AnimProperty, AnimRange, DragDir, Easing, LoadAnim, LoadAnimAttr};
pub use error::{NavError, Result};
pub use geometry::{Extent, Point};
pub use input::PointerTracker;
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use manager::audit::{
    BufferedNavigationAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditEventBuilder,
    NavigationAuditStage, NullNavigationAudit,
};
pub use manager::diagnostics::LifecycleLogger;
pub use manager::{
    AnimState, ManagerConfig, NavigationSnapshot, PageManager, PageSnapshot, predict_throw,
};
pub use metrics::{MetricSnapshot, NavigationMetrics};
pub use page::{
    CacheFlags, LifecycleHook, NavRequest, Page, PageAttributes, PageContext, PageLifecycle,
    PageName, PageState, RootEvent, Stash, StashWrite,
};
pub use registry::PageRegistry;
pub use stack::PageStack;
pub use toolkit::{
    AnimTag, AnimationRequest, AnimationRun, DeferredCall, HeadlessNode, HeadlessToolkit,
    NodeHandle, Toolkit,
};
