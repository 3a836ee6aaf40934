//! Transition types and the geometry each one resolves to.
//!
//! Callers pick a [`LoadAnim`]; the manager resolves it against the viewport
//! into a [`LoadAnimAttr`] whenever a page starts animating.

mod attr;
mod values;

pub use attr::{AnimAttr, Easing, LoadAnim};
pub use values::{
    AnimProperty, AnimRange, DragDir, LoadAnimAttr, OPA_COVER, OPA_TRANSP, RoleValues,
};
