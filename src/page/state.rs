use serde::Serialize;

/// Per-page lifecycle state.
///
/// The value stored on a page is the state whose entry action runs the next
/// time the page is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    #[default]
    Idle,
    Load,
    WillAppear,
    DidAppear,
    Activity,
    WillDisappear,
    DidDisappear,
    Unload,
}

/// Whether the trampoline keeps stepping after an entry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Step again in the same call.
    Continue,
    /// Wait for an external event (animation completion or a new switch).
    Park,
}

impl PageState {
    pub fn name(self) -> &'static str {
        match self {
            PageState::Idle => "idle",
            PageState::Load => "load",
            PageState::WillAppear => "will_appear",
            PageState::DidAppear => "did_appear",
            PageState::Activity => "activity",
            PageState::WillDisappear => "will_disappear",
            PageState::DidDisappear => "did_disappear",
            PageState::Unload => "unload",
        }
    }

    /// State that follows once this state's entry action has run.
    ///
    /// `cached` only matters for `DidDisappear`: a cached page parks in
    /// `WillAppear` with its root alive, anything else is torn down at once.
    pub fn successor(self, cached: bool) -> (PageState, Flow) {
        use Flow::*;
        use PageState::*;

        match self {
            Idle => (Idle, Park),
            Load => (WillAppear, Continue),
            WillAppear => (DidAppear, Park),
            DidAppear => (Activity, Park),
            Activity => (WillDisappear, Continue),
            WillDisappear => (DidDisappear, Park),
            DidDisappear if cached => (WillAppear, Park),
            DidDisappear => (Unload, Continue),
            Unload => (Idle, Park),
        }
    }

    /// States entered only when an animation completes.
    pub(crate) fn is_animation_gated(self) -> bool {
        matches!(self, PageState::DidAppear | PageState::DidDisappear)
    }
}
