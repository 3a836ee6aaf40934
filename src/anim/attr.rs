use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// Page switching animation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LoadAnim {
    /// Use the manager-wide animation.
    #[default]
    Global = 0,

    /// New page slides over the old one, which stays put.
    OverLeft,
    OverRight,
    OverTop,
    OverBottom,

    /// New page pushes the old one out of the way.
    MoveLeft,
    MoveRight,
    MoveTop,
    MoveBottom,

    /// New page fades in over the old one.
    FadeOn,

    /// No animation.
    None,
}

impl LoadAnim {
    pub const LAST: LoadAnim = LoadAnim::None;

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Slide-over kinds: only the incoming page moves, so the page beneath
    /// stays visible and the new root can be dragged away.
    pub fn is_over(self) -> bool {
        matches!(
            self,
            LoadAnim::OverLeft | LoadAnim::OverRight | LoadAnim::OverTop | LoadAnim::OverBottom
        )
    }
}

impl TryFrom<u8> for LoadAnim {
    type Error = NavError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let anim = match code {
            0 => LoadAnim::Global,
            1 => LoadAnim::OverLeft,
            2 => LoadAnim::OverRight,
            3 => LoadAnim::OverTop,
            4 => LoadAnim::OverBottom,
            5 => LoadAnim::MoveLeft,
            6 => LoadAnim::MoveRight,
            7 => LoadAnim::MoveTop,
            8 => LoadAnim::MoveBottom,
            9 => LoadAnim::FadeOn,
            10 => LoadAnim::None,
            other => return Err(NavError::InvalidTransitionType(other)),
        };
        Ok(anim)
    }
}

/// Easing curve forwarded to the toolkit; interpolation happens there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Overshoot,
    Bounce,
    Step,
}

/// Animation type, duration and easing, either per page or manager-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnimAttr {
    pub anim: LoadAnim,
    pub duration_ms: u16,
    pub easing: Easing,
}

impl AnimAttr {
    pub const fn new(anim: LoadAnim, duration_ms: u16, easing: Easing) -> Self {
        Self {
            anim,
            duration_ms,
            easing,
        }
    }

    /// Effective run time: `None` always completes at once.
    pub fn effective_duration_ms(&self) -> u32 {
        if self.anim == LoadAnim::None {
            0
        } else {
            u32::from(self.duration_ms)
        }
    }
}
