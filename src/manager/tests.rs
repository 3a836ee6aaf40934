use std::sync::{Arc, Mutex};

use serde_json::json;

use super::audit::{BufferedNavigationAudit, NavigationAuditStage};
use super::*;
use crate::anim::AnimProperty;
use crate::geometry::{Extent, Point};
use crate::logging::MemorySink;
use crate::page::{PageAttributes, PageContext, RootEvent};
use crate::toolkit::{AnimTag, HeadlessToolkit, NodeHandle};

const VIEW: Extent = Extent::new(240, 320);

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

#[derive(Default)]
struct Recording {
    journal: Journal,
    auto_cache: Option<bool>,
    cache: Option<bool>,
    anim: Option<LoadAnim>,
    stash_probe: Option<usize>,
}

impl Recording {
    fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }

    fn record(&self, ctx: &PageContext<'_>, hook: &str) {
        self.journal.push(format!("{}:{hook}", ctx.name()));
    }
}

impl PageLifecycle for Recording {
    fn on_custom_attr_config(&mut self, attrs: &mut PageAttributes<'_>) {
        if let Some(enable) = self.auto_cache {
            attrs.set_auto_cache_enable(enable);
        }
        if let Some(enable) = self.cache {
            attrs.set_cache_enable(enable);
        }
        if let Some(anim) = self.anim {
            attrs.set_load_anim(anim, 300, Easing::EaseOut);
        }
    }

    fn on_view_load(&mut self, ctx: &mut PageContext<'_>) {
        assert!(ctx.root().is_some());
        self.record(ctx, "load");
    }

    fn on_view_did_load(&mut self, ctx: &mut PageContext<'_>) {
        self.record(ctx, "did_load");
    }

    fn on_view_will_appear(&mut self, ctx: &mut PageContext<'_>) {
        self.record(ctx, "will_appear");
        if let Some(len) = self.stash_probe {
            let mut buf = vec![0u8; len];
            let entry = if ctx.stash(&mut buf) {
                format!("{}:stash={buf:?}", ctx.name())
            } else {
                format!("{}:stash_miss", ctx.name())
            };
            self.journal.push(entry);
        }
    }

    fn on_view_did_appear(&mut self, ctx: &mut PageContext<'_>) {
        self.record(ctx, "did_appear");
    }

    fn on_view_will_disappear(&mut self, ctx: &mut PageContext<'_>) {
        self.record(ctx, "will_disappear");
    }

    fn on_view_did_disappear(&mut self, ctx: &mut PageContext<'_>) {
        self.record(ctx, "did_disappear");
    }

    fn on_view_did_unload(&mut self, ctx: &mut PageContext<'_>) {
        assert!(ctx.root().is_none());
        self.record(ctx, "did_unload");
    }
}

/// Pushes `target` the first time it appears.
struct Redirect {
    target: &'static str,
    fired: bool,
}

impl PageLifecycle for Redirect {
    fn on_view_did_appear(&mut self, ctx: &mut PageContext<'_>) {
        if !self.fired {
            self.fired = true;
            ctx.request_push(self.target, Some(vec![9, 9]));
        }
    }
}

fn manager_with(journal: &Journal, names: &[&str]) -> PageManager<HeadlessToolkit> {
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    for name in names {
        nav.install(*name, Recording::new(journal)).unwrap();
    }
    nav
}

fn settle_push(nav: &mut PageManager<HeadlessToolkit>, name: &str) {
    nav.push(name, None).unwrap();
    nav.pump();
    assert!(!nav.is_switching());
}

fn root_of(nav: &PageManager<HeadlessToolkit>, name: &str) -> NodeHandle {
    nav.page(name).and_then(Page::root).unwrap()
}

fn x_of(nav: &PageManager<HeadlessToolkit>, name: &str) -> i32 {
    nav.toolkit().node(root_of(nav, name)).unwrap().x
}

#[test]
fn push_push_pop_runs_hooks_in_order() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);

    nav.push("A", None).unwrap();
    assert_eq!(journal.take(), ["A:load", "A:did_load", "A:will_appear"]);
    assert_eq!(nav.pump(), 1);
    assert_eq!(journal.take(), ["A:did_appear"]);
    assert_eq!(nav.page_state("A"), Some(PageState::Activity));

    nav.push("B", None).unwrap();
    assert_eq!(
        journal.take(),
        ["A:will_disappear", "B:load", "B:did_load", "B:will_appear"]
    );
    nav.pump();
    assert_eq!(journal.take(), ["A:did_disappear", "B:did_appear"]);
    assert_eq!(nav.page_state("A"), Some(PageState::WillAppear));
    assert_eq!(nav.is_cached("A"), Some(true));

    nav.pop().unwrap();
    assert_eq!(journal.take(), ["B:will_disappear", "A:will_appear"]);
    nav.pump();
    assert_eq!(
        journal.take(),
        ["B:did_disappear", "B:did_unload", "A:did_appear"]
    );

    assert_eq!(nav.current(), Some("A"));
    assert_eq!(nav.previous(), Some("A"));
    assert_eq!(nav.stack_names(), ["A"]);
    assert_eq!(nav.page_state("B"), Some(PageState::Idle));
    assert!(nav.page("B").and_then(Page::root).is_none());
    assert_eq!(journal.count("A:load"), 0);
    assert_eq!(nav.toolkit().live_nodes(), 1);
}

#[test]
fn pop_leaves_the_exiting_page_on_top_until_it_is_gone() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    let a = root_of(&nav, "A");
    let b = root_of(&nav, "B");
    assert_eq!(nav.toolkit().z_order(), &[a, b]);

    nav.pop().unwrap();
    assert_eq!(nav.toolkit().z_order(), &[a, b]);
    let exit = nav
        .toolkit()
        .running()
        .find(|req| req.node == b)
        .cloned()
        .unwrap();
    assert_eq!((exit.property, exit.from, exit.to), (AnimProperty::X, 0, 240));
}

#[test]
fn requests_during_a_switch_are_rejected_without_side_effects() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);

    nav.push("A", None).unwrap();
    assert!(nav.is_switching());
    let before = nav.snapshot();

    assert_eq!(nav.push("B", None), Err(NavError::TransitionBusy));
    assert_eq!(nav.pop(), Err(NavError::TransitionBusy));
    assert_eq!(nav.back_home(), Err(NavError::TransitionBusy));
    assert_eq!(nav.snapshot(), before);
    assert_eq!(nav.page_state("B"), Some(PageState::Idle));

    nav.pump();
    settle_push(&mut nav, "B");
    assert_eq!(nav.stack_names(), ["B", "A"]);
}

#[test]
fn invalid_requests_report_their_cause() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A"]);

    assert_eq!(
        nav.install("A", Recording::new(&journal)),
        Err(NavError::DuplicateName("A".into()))
    );
    assert_eq!(nav.pop(), Err(NavError::StackEmpty));
    assert_eq!(nav.back_home(), Err(NavError::StackEmpty));
    assert_eq!(
        nav.push("ghost", None),
        Err(NavError::NotInstalled("ghost".into()))
    );

    settle_push(&mut nav, "A");
    assert_eq!(
        nav.push("A", None),
        Err(NavError::AlreadyOnStack("A".into()))
    );
    assert_eq!(nav.stack_names(), ["A"]);
}

#[test]
fn page_without_auto_cache_reloads_on_every_appearance() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install(
        "A",
        Recording {
            auto_cache: Some(false),
            ..Recording::new(&journal)
        },
    )
    .unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();

    settle_push(&mut nav, "A");
    assert_eq!(nav.is_cached("A"), Some(false));

    settle_push(&mut nav, "B");
    assert_eq!(nav.page_state("A"), Some(PageState::Idle));
    assert_eq!(journal.count("A:did_unload"), 1);

    nav.pop().unwrap();
    nav.pump();
    assert_eq!(journal.count("A:load"), 2);
    assert_eq!(nav.page_state("A"), Some(PageState::Activity));
}

#[test]
fn manually_cached_page_survives_being_popped() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install(
        "B",
        Recording {
            cache: Some(true),
            ..Recording::new(&journal)
        },
    )
    .unwrap();

    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    nav.pop().unwrap();
    nav.pump();
    assert_eq!(nav.page_state("B"), Some(PageState::WillAppear));
    assert!(nav.page("B").and_then(Page::root).is_some());
    assert_eq!(journal.count("B:did_unload"), 0);

    settle_push(&mut nav, "B");
    assert_eq!(journal.count("B:load"), 1);
    assert_eq!(journal.count("B:will_appear"), 2);
}

#[test]
fn stash_is_copied_to_the_pushed_page() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install(
        "B",
        Recording {
            stash_probe: Some(4),
            ..Recording::new(&journal)
        },
    )
    .unwrap();
    nav.install(
        "C",
        Recording {
            stash_probe: Some(3),
            ..Recording::new(&journal)
        },
    )
    .unwrap();

    settle_push(&mut nav, "A");
    nav.push("B", Some(&[1, 2, 3, 4])).unwrap();
    nav.pump();
    assert_eq!(journal.count("B:stash=[1, 2, 3, 4]"), 1);
    assert_eq!(nav.page_stash("B"), Some(&[1, 2, 3, 4][..]));

    nav.push("C", Some(&[5, 6, 7, 8])).unwrap();
    nav.pump();
    assert_eq!(journal.count("C:stash_miss"), 1);
    assert_eq!(nav.page_stash("C"), Some(&[5, 6, 7, 8][..]));

    // Stash is released with the page.
    nav.pop().unwrap();
    nav.pump();
    assert_eq!(nav.page_stash("C"), None);
}

#[test]
fn back_home_force_unloads_everything_above_the_bottom() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B", "C"]);
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    settle_push(&mut nav, "C");
    journal.take();

    nav.back_home().unwrap();
    assert_eq!(
        journal.take(),
        [
            "C:will_disappear",
            "C:did_disappear",
            "C:did_unload",
            "B:did_unload",
            "A:will_appear"
        ]
    );
    nav.pump();
    assert_eq!(journal.take(), ["A:did_appear"]);

    assert_eq!(nav.stack_names(), ["A"]);
    assert_eq!(nav.current(), Some("A"));
    assert_eq!(nav.page_state("B"), Some(PageState::Idle));
    assert_eq!(nav.page_state("C"), Some(PageState::Idle));
    assert_eq!(nav.toolkit().live_nodes(), 1);

    // Already home: the bottom page replays its appear sequence.
    nav.back_home().unwrap();
    assert!(nav.is_switching());
    assert_eq!(journal.take(), ["A:will_appear"]);
    nav.pump();
    assert_eq!(journal.take(), ["A:did_appear"]);
    assert_eq!(nav.page_state("A"), Some(PageState::Activity));
    assert_eq!(nav.toolkit().live_nodes(), 1);
}

#[test]
fn page_popped_off_an_empty_stack_can_be_pushed_again() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    settle_push(&mut nav, "A");
    nav.pop().unwrap();
    nav.pump();
    assert!(nav.stack_names().is_empty());
    journal.take();

    nav.push("A", None).unwrap();
    assert_eq!(nav.previous(), None);
    assert_eq!(journal.take(), ["A:will_appear"]);
    nav.pump();
    assert_eq!(journal.take(), ["A:did_appear"]);
    assert!(!nav.is_switching());
    assert_eq!(nav.page_state("A"), Some(PageState::Activity));
    assert_eq!(nav.is_cached("A"), Some(true));
    assert_eq!(journal.count("A:load"), 0);
    assert_eq!(nav.toolkit().live_nodes(), 1);

    // Covered again, the re-entered page stays cached underneath.
    settle_push(&mut nav, "B");
    assert_eq!(nav.page_state("A"), Some(PageState::WillAppear));
    assert!(nav.page("A").and_then(Page::root).is_some());
}

/// Small deterministic generator so sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

fn assert_settled(nav: &PageManager<HeadlessToolkit>, names: &[&str], step: &str) {
    let stack = nav.stack_names();
    let mut unique = stack.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), stack.len(), "{step}: duplicate in {stack:?}");
    assert!(!nav.is_switching(), "{step}: switch left open");

    for name in [nav.current(), nav.previous()].into_iter().flatten() {
        assert!(nav.page(name).is_some(), "{step}: {name} not installed");
    }
    if let Some(top) = stack.first() {
        assert_eq!(nav.current(), Some(top.as_str()), "{step}");
    }

    let mut active = 0;
    let mut rooted = 0;
    for name in names {
        let page = nav.page(name).unwrap();
        let state = page.state();
        match state {
            PageState::Activity => {
                active += 1;
                assert_eq!(nav.current(), Some(*name), "{step}: {name} active");
                assert!(page.root().is_some(), "{step}: {name} active without root");
            }
            PageState::WillAppear => {
                assert!(page.is_cached() && page.root().is_some(), "{step}: {name}");
            }
            PageState::Idle => assert!(page.root().is_none(), "{step}: {name}"),
            other => panic!("{step}: {name} resting in {other:?}"),
        }
        if page.root().is_none() {
            assert!(!page.is_cached(), "{step}: {name} cached without root");
        } else {
            rooted += 1;
        }
        assert!(!page.is_busy(), "{step}: {name} still animating");
    }
    assert!(active <= 1, "{step}: {active} active pages");
    if !stack.is_empty() {
        assert_eq!(active, 1, "{step}: no active page");
    }
    assert_eq!(nav.toolkit().live_nodes(), rooted, "{step}: leaked nodes");
}

#[test]
fn random_navigation_sequences_keep_the_stack_and_lifecycle_consistent() {
    const NAMES: [&str; 4] = ["A", "B", "C", "D"];

    for seed in 1..=24u64 {
        let journal = Journal::default();
        let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
        nav.install("A", Recording::new(&journal)).unwrap();
        nav.install(
            "B",
            Recording {
                auto_cache: Some(false),
                ..Recording::new(&journal)
            },
        )
        .unwrap();
        nav.install(
            "C",
            Recording {
                auto_cache: Some(false),
                cache: Some(true),
                anim: Some(LoadAnim::MoveBottom),
                ..Recording::new(&journal)
            },
        )
        .unwrap();
        nav.install(
            "D",
            Recording {
                anim: Some(LoadAnim::None),
                ..Recording::new(&journal)
            },
        )
        .unwrap();
        assert_eq!(
            nav.install("A", Recording::new(&journal)),
            Err(NavError::DuplicateName("A".into()))
        );

        let mut rng = Lcg(seed);
        for i in 0..200 {
            let before = nav.stack_names();
            let (step, result) = match rng.below(6) {
                0..=2 => {
                    let name = NAMES[rng.below(NAMES.len())];
                    (format!("seed {seed} #{i} push {name}"), nav.push(name, None))
                }
                3 | 4 => (format!("seed {seed} #{i} pop"), nav.pop()),
                _ => (format!("seed {seed} #{i} back_home"), nav.back_home()),
            };

            if nav.is_switching() {
                let during = nav.stack_names();
                assert_eq!(nav.push("A", None), Err(NavError::TransitionBusy), "{step}");
                assert_eq!(nav.pop(), Err(NavError::TransitionBusy), "{step}");
                assert_eq!(nav.stack_names(), during, "{step}");
            }
            nav.pump();

            match result {
                Ok(()) => {}
                Err(NavError::AlreadyOnStack(_) | NavError::StackEmpty) => {
                    assert_eq!(nav.stack_names(), before, "{step}: rejected call changed stack");
                }
                Err(other) => panic!("{step}: unexpected {other:?}"),
            }
            assert_settled(&nav, &NAMES, &step);
            journal.take();
        }

        let toolkit = nav.shutdown();
        assert_eq!(toolkit.live_nodes(), 0, "seed {seed}");
    }
}

#[test]
fn push_then_pop_restores_the_previous_stack() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B", "C"]);
    let scripts: [&[&str]; 3] = [&["A"], &["A", "B"], &[]];
    for scripted in scripts {
        for name in scripted {
            settle_push(&mut nav, name);
        }
        for extra in ["A", "B", "C"] {
            let before = nav.stack_names();
            if before.iter().any(|name| name == extra) {
                continue;
            }
            settle_push(&mut nav, extra);
            nav.pop().unwrap();
            nav.pump();
            assert_eq!(nav.stack_names(), before);
            if let Some(top) = before.first() {
                assert_eq!(nav.current(), Some(top.as_str()));
                assert_eq!(nav.page_state(top), Some(PageState::Activity));
            }
        }
        while nav.pop().is_ok() {
            nav.pump();
        }
    }
}

#[test]
fn instant_toolkit_settles_inside_the_call_in_the_same_order() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::instant(VIEW));
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();

    nav.push("A", None).unwrap();
    assert!(!nav.is_switching());
    journal.take();

    nav.push("B", None).unwrap();
    assert!(!nav.is_switching());
    assert_eq!(
        journal.take(),
        [
            "A:will_disappear",
            "B:load",
            "B:did_load",
            "B:will_appear",
            "A:did_disappear",
            "B:did_appear"
        ]
    );
    assert_eq!(nav.previous(), Some("B"));
}

#[test]
fn no_animation_completes_synchronously() {
    let journal = Journal::default();
    let config =
        ManagerConfig::default().with_global_anim(AnimAttr::new(LoadAnim::None, 400, Easing::Linear));
    let mut nav = PageManager::with_config(HeadlessToolkit::new(VIEW), config);
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();

    nav.push("A", None).unwrap();
    nav.push("B", None).unwrap();
    assert_eq!(nav.toolkit().running().count(), 0);
    assert!(!nav.is_switching());
    assert_eq!(nav.page_state("B"), Some(PageState::Activity));
}

#[test]
fn push_takes_the_transition_of_the_pushed_page() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install(
        "B",
        Recording {
            anim: Some(LoadAnim::FadeOn),
            ..Recording::new(&journal)
        },
    )
    .unwrap();

    settle_push(&mut nav, "A");
    assert_eq!(nav.current_anim().anim, LoadAnim::OverLeft);

    nav.push("B", None).unwrap();
    assert_eq!(nav.current_anim().anim, LoadAnim::FadeOn);
    let b = root_of(&nav, "B");
    let enter = nav
        .toolkit()
        .running()
        .find(|req| req.node == b)
        .cloned()
        .unwrap();
    assert_eq!(
        (enter.property, enter.from, enter.to, enter.duration_ms),
        (AnimProperty::Opacity, 0, 255, 300)
    );
}

#[test]
fn pop_recomputes_the_transition_from_the_revealed_page() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install(
        "A",
        Recording {
            anim: Some(LoadAnim::MoveTop),
            ..Recording::new(&journal)
        },
    )
    .unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();

    nav.push("A", None).unwrap();
    let enter = nav.toolkit().running().next().cloned().unwrap();
    assert_eq!((enter.property, enter.from, enter.to), (AnimProperty::Y, 320, 0));
    nav.pump();

    settle_push(&mut nav, "B");
    assert_eq!(nav.current_anim().anim, LoadAnim::OverLeft);

    nav.pop().unwrap();
    // The pop itself still runs with the type of the page being left.
    assert_eq!(nav.current_anim().anim, LoadAnim::OverLeft);
    nav.pump();
    assert_eq!(nav.current_anim().anim, LoadAnim::MoveTop);
}

#[test]
fn global_setter_maps_unusable_types_to_none() {
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.set_global_load_anim(LoadAnim::Global, 200, Easing::Linear);
    assert_eq!(nav.global_anim().anim, LoadAnim::None);

    nav.set_global_load_anim_code(5, 250, Easing::EaseIn);
    assert_eq!(
        nav.global_anim(),
        AnimAttr::new(LoadAnim::MoveLeft, 250, Easing::EaseIn)
    );

    nav.set_global_load_anim_code(99, 250, Easing::EaseIn);
    assert_eq!(nav.global_anim().anim, LoadAnim::None);
}

#[test]
fn invalid_page_code_falls_back_to_global() {
    struct BadCode;
    impl PageLifecycle for BadCode {
        fn on_custom_attr_config(&mut self, attrs: &mut PageAttributes<'_>) {
            attrs.set_load_anim_code(200, 100, Easing::Linear);
        }
    }

    let sink = Arc::new(MemorySink::new());
    let config = ManagerConfig::default().with_logger(Logger::from_arc(sink.clone()));
    let mut nav = PageManager::with_config(HeadlessToolkit::new(VIEW), config);
    nav.install("odd", BadCode).unwrap();
    assert_eq!(nav.page("odd").unwrap().anim_attr().anim, LoadAnim::Global);
    assert!(sink.messages().contains(&"custom_anim_rejected".to_string()));

    nav.push("odd", None).unwrap();
    assert_eq!(nav.current_anim().anim, LoadAnim::OverLeft);
}

#[test]
fn drag_past_half_the_travel_dismisses_the_page() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    let b = root_of(&nav, "B");
    assert!(nav.toolkit().node(b).unwrap().draggable);
    assert!(!nav.toolkit().node(root_of(&nav, "A")).unwrap().draggable);

    nav.handle_root_event("B", RootEvent::Pressed);
    nav.handle_root_event("B", RootEvent::Pressing { vector: Point::new(100, 7) });
    assert_eq!(x_of(&nav, "B"), 100);
    nav.handle_root_event("B", RootEvent::Pressing { vector: Point::new(500, 0) });
    assert_eq!(x_of(&nav, "B"), 240);
    nav.handle_root_event("B", RootEvent::Pressing { vector: Point::new(-140, 0) });
    assert_eq!(x_of(&nav, "B"), 100);

    nav.handle_root_event("B", RootEvent::Released { vector: Point::new(30, 0) });
    assert_eq!(nav.toolkit().pending_deferred(), 1);
    assert_eq!(nav.stack_names(), ["B", "A"]);

    nav.pump();
    assert_eq!(nav.stack_names(), ["A"]);
    assert_eq!(nav.current(), Some("A"));
    assert_eq!(nav.page_state("B"), Some(PageState::Idle));
    assert_eq!(journal.count("B:did_unload"), 1);
}

#[test]
fn short_drag_snaps_back_and_blocks_navigation_meanwhile() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B", "C"]);
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");

    nav.handle_root_event("B", RootEvent::Pressing { vector: Point::new(50, 0) });
    nav.handle_root_event("B", RootEvent::Released { vector: Point::ZERO });
    assert_eq!(nav.toolkit().pending_deferred(), 0);
    assert_eq!(nav.push("C", None), Err(NavError::TransitionBusy));

    // Grabbing the page again stops the snap-back where it is.
    nav.handle_root_event("B", RootEvent::Pressed);
    assert_eq!(nav.toolkit().cancelled(), 1);
    assert_eq!(x_of(&nav, "B"), 50);

    nav.handle_root_event("B", RootEvent::Released { vector: Point::ZERO });
    nav.pump();
    assert_eq!(x_of(&nav, "B"), 0);
    assert_eq!(nav.stack_names(), ["B", "A"]);
    settle_push(&mut nav, "C");
}

#[test]
fn drag_needs_a_live_page_underneath() {
    let journal = Journal::default();
    let mut nav = PageManager::new(HeadlessToolkit::new(VIEW));
    nav.install(
        "A",
        Recording {
            cache: Some(false),
            ..Recording::new(&journal)
        },
    )
    .unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");

    assert!(!nav.toolkit().node(root_of(&nav, "B")).unwrap().draggable);
    nav.handle_root_event("B", RootEvent::Pressing { vector: Point::new(80, 0) });
    assert_eq!(x_of(&nav, "B"), 0);
}

#[test]
fn hooks_can_request_navigation() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A"]);
    nav.install(
        "splash",
        Redirect {
            target: "A",
            fired: false,
        },
    )
    .unwrap();

    nav.push("splash", None).unwrap();
    nav.pump();
    assert_eq!(nav.stack_names(), ["A", "splash"]);
    assert_eq!(nav.current(), Some("A"));
    assert_eq!(nav.page_stash("A"), Some(&[9, 9][..]));
    assert!(!nav.is_switching());
}

#[test]
fn uninstall_rules() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    assert_eq!(
        nav.uninstall("ghost"),
        Err(NavError::NotFound("ghost".into()))
    );

    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    assert_eq!(
        nav.uninstall("A"),
        Err(NavError::StillOnStack("A".into()))
    );

    nav.pop().unwrap();
    assert_eq!(nav.uninstall("B"), Err(NavError::TransitionBusy));
    nav.pump();
    nav.uninstall("B").unwrap();
    assert!(nav.page("B").is_none());

    // Last page popped: still on screen, torn down by uninstall.
    nav.pop().unwrap();
    assert!(nav.stack_names().is_empty());
    assert_eq!(nav.page_state("A"), Some(PageState::Activity));
    journal.take();
    nav.uninstall("A").unwrap();
    assert_eq!(
        journal.take(),
        ["A:will_disappear", "A:did_disappear", "A:did_unload"]
    );
    assert_eq!(nav.current(), None);
    assert_eq!(nav.previous(), None);
    assert_eq!(nav.toolkit().live_nodes(), 0);
}

#[test]
fn completions_for_unknown_or_idle_pages_are_ignored() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A"]);
    nav.animation_finished(AnimTag::Transition("ghost".into()));
    nav.animation_finished(AnimTag::Transition("A".into()));
    nav.handle_root_event("ghost", RootEvent::Pressed);
    assert_eq!(nav.page_state("A"), Some(PageState::Idle));
    assert!(journal.take().is_empty());
}

#[test]
fn shutdown_unloads_every_page() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    journal.take();

    let toolkit = nav.shutdown();
    assert_eq!(toolkit.live_nodes(), 0);
    assert_eq!(
        journal.take(),
        [
            "B:will_disappear",
            "B:did_disappear",
            "B:did_unload",
            "A:did_unload"
        ]
    );
}

#[test]
fn snapshot_serializes_navigation_state() {
    let journal = Journal::default();
    let mut nav = manager_with(&journal, &["A", "B"]);
    settle_push(&mut nav, "A");
    nav.push("B", Some(b"hi")).unwrap();

    let snapshot = nav.snapshot();
    assert!(snapshot.switching);
    assert_eq!(snapshot.stack, ["B", "A"]);
    assert_eq!(snapshot.previous.as_deref(), Some("A"));

    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["stack"], json!(["B", "A"]));
    assert_eq!(value["anim"]["current"]["anim"], json!("over_left"));
    assert_eq!(value["pages"][1]["name"], json!("B"));
    assert_eq!(value["pages"][1]["state"], json!("did_appear"));
    assert_eq!(value["pages"][1]["stash_len"], json!(2));
}

#[test]
fn telemetry_records_metrics_logs_and_audit_trail() {
    let journal = Journal::default();
    let sink = Arc::new(MemorySink::new());
    let audit = Arc::new(BufferedNavigationAudit::new());
    let mut config = ManagerConfig::default()
        .with_logger(Logger::from_arc(sink.clone()))
        .with_audit(audit.clone());
    let metrics = config.enable_metrics();

    let mut nav = PageManager::with_config(HeadlessToolkit::new(VIEW), config);
    nav.install("A", Recording::new(&journal)).unwrap();
    nav.install("B", Recording::new(&journal)).unwrap();
    settle_push(&mut nav, "A");
    settle_push(&mut nav, "B");
    nav.pop().unwrap();
    nav.pump();
    assert!(nav.push("A", None).is_err());

    let snapshot = metrics.lock().unwrap().snapshot(std::time::Duration::ZERO);
    assert_eq!(snapshot.pushes, 2);
    assert_eq!(snapshot.pops, 1);
    assert_eq!(snapshot.loads, 2);
    assert_eq!(snapshot.unloads, 1);
    assert_eq!(snapshot.switches_completed, 3);
    assert_eq!(snapshot.rejected, 1);

    let events = sink.events();
    let pushed: Vec<_> = events
        .iter()
        .filter(|event| event.message == "page_pushed")
        .collect();
    assert_eq!(pushed.len(), 2);
    assert_eq!(pushed[0].target, TARGET_MANAGER);
    assert_eq!(pushed[1].field_str("page"), Some("B"));
    let rejected = events
        .iter()
        .find(|event| event.message == "request_rejected")
        .unwrap();
    assert_eq!(rejected.field_str("kind"), Some("already_on_stack"));

    assert_eq!(
        audit.states_of("B"),
        [
            "load",
            "will_appear",
            "did_appear",
            "activity",
            "will_disappear",
            "did_disappear",
            "unload",
            "idle"
        ]
    );
    let stages = audit.stages();
    assert_eq!(stages.first(), Some(&NavigationAuditStage::ManagerCreated));
    assert_eq!(
        stages
            .iter()
            .filter(|stage| **stage == NavigationAuditStage::SwitchFinished)
            .count(),
        3
    );

    sink.clear();
    nav.emit_metrics();
    assert_eq!(sink.messages(), ["navigation_metrics"]);
}
