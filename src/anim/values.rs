use serde::Serialize;

use crate::geometry::Extent;

use super::LoadAnim;

pub const OPA_TRANSP: i32 = 0;
pub const OPA_COVER: i32 = 255;

/// Axis a page root can be dragged along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragDir {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Node property driven by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimProperty {
    X,
    Y,
    Opacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnimRange {
    pub start: i32,
    pub end: i32,
}

impl AnimRange {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn min(&self) -> i32 {
        self.start.min(self.end)
    }

    pub fn max(&self) -> i32 {
        self.start.max(self.end)
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min(), self.max())
    }
}

/// Values used by a page when it is the entering or the exiting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoleValues {
    pub enter: AnimRange,
    pub exit: AnimRange,
}

impl RoleValues {
    const fn new(enter: AnimRange, exit: AnimRange) -> Self {
        Self { enter, exit }
    }
}

/// Resolved geometry of one transition type for a given viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadAnimAttr {
    pub drag_dir: DragDir,
    /// `None` only for [`LoadAnim::None`], where nothing is animated.
    pub property: Option<AnimProperty>,
    pub push: RoleValues,
    pub pop: RoleValues,
}

impl LoadAnimAttr {
    /// Compute the attribute set for `anim`. `Global` must be resolved by the
    /// caller first and yields `None`.
    pub fn for_anim(anim: LoadAnim, viewport: Extent) -> Option<Self> {
        let hor = viewport.width;
        let ver = viewport.height;
        let r = AnimRange::new;

        let (drag_dir, push, pop) = match anim {
            LoadAnim::Global => return None,
            LoadAnim::None => return Some(Self::default()),

            LoadAnim::OverLeft => (
                DragDir::Horizontal,
                RoleValues::new(r(hor, 0), r(0, 0)),
                RoleValues::new(r(0, 0), r(0, hor)),
            ),
            LoadAnim::OverRight => (
                DragDir::Horizontal,
                RoleValues::new(r(-hor, 0), r(0, 0)),
                RoleValues::new(r(0, 0), r(0, -hor)),
            ),
            LoadAnim::OverTop => (
                DragDir::Vertical,
                RoleValues::new(r(ver, 0), r(0, 0)),
                RoleValues::new(r(0, 0), r(0, ver)),
            ),
            LoadAnim::OverBottom => (
                DragDir::Vertical,
                RoleValues::new(r(-ver, 0), r(0, 0)),
                RoleValues::new(r(0, 0), r(0, -ver)),
            ),

            LoadAnim::MoveLeft => (
                DragDir::Horizontal,
                RoleValues::new(r(hor, 0), r(0, -hor)),
                RoleValues::new(r(-hor, 0), r(0, hor)),
            ),
            LoadAnim::MoveRight => (
                DragDir::Horizontal,
                RoleValues::new(r(-hor, 0), r(0, hor)),
                RoleValues::new(r(hor, 0), r(0, -hor)),
            ),
            LoadAnim::MoveTop => (
                DragDir::Vertical,
                RoleValues::new(r(ver, 0), r(0, -ver)),
                RoleValues::new(r(-ver, 0), r(0, ver)),
            ),
            LoadAnim::MoveBottom => (
                DragDir::Vertical,
                RoleValues::new(r(-ver, 0), r(0, ver)),
                RoleValues::new(r(ver, 0), r(0, -ver)),
            ),

            // The outgoing page stays opaque until the incoming one covers it.
            LoadAnim::FadeOn => (
                DragDir::None,
                RoleValues::new(r(OPA_TRANSP, OPA_COVER), r(OPA_COVER, OPA_COVER)),
                RoleValues::new(r(OPA_COVER, OPA_COVER), r(OPA_COVER, OPA_TRANSP)),
            ),
        };

        let property = match drag_dir {
            DragDir::Horizontal => AnimProperty::X,
            DragDir::Vertical => AnimProperty::Y,
            DragDir::None => AnimProperty::Opacity,
        };

        Some(Self {
            drag_dir,
            property: Some(property),
            push,
            pop,
        })
    }

    pub fn role(&self, pushing: bool) -> &RoleValues {
        if pushing { &self.push } else { &self.pop }
    }

    /// Pick the coordinate of `vector` that lies on the drag axis.
    pub fn project(&self, x: i32, y: i32) -> i32 {
        match self.drag_dir {
            DragDir::Horizontal => x,
            DragDir::Vertical => y,
            DragDir::None => 0,
        }
    }
}
