//! Batched rebuilds and component reconciliation.
//!
//! Covers:
//! - several state changes in one batch → one repaint, parents first
//! - keyed reuse across a rebuild: kept items keep their widget, dropped
//!   items are unmounted, new items are built
//! - a detached and re-attached component subscribing again
//! - focus following its tab index when the focused widget is rebuilt
//!
//! Run with: cargo test --test rebuild

mod common;

use common::{Spy, count, entries, log};
use spark_widgets::{
    App, Component, Linear, Props, RecordingPainter, Stack, State, WidgetId,
};

fn frame(app: &mut App) {
    app.frame(&mut RecordingPainter::new(), false);
}

fn rebuilds(app: &App, id: WidgetId) -> u64 {
    app.tree()
        .widget_ref::<Component>(id)
        .map_or(0, Component::rebuild_count)
}

fn component_child(app: &App, id: WidgetId) -> Option<WidgetId> {
    app.tree().widget_ref::<Component>(id).and_then(Component::child)
}

// =============================================================================
// BATCHING
// =============================================================================

#[test]
fn test_batch_coalesces_into_one_repaint_in_depth_order() {
    let log = log();
    let states: Vec<State<u32>> = (0..5).map(|_| State::new(0)).collect();
    let mut app = App::headless();

    // deepest component watches s0, s1, s3; middle s3; shallowest s2, s4
    let watched = [vec![2, 4], vec![3], vec![0, 1, 3]];
    let mut components = Vec::new();
    for (name, indices) in ["shallow", "middle", "deep"].into_iter().zip(watched) {
        let watched: Vec<State<u32>> = indices.iter().map(|&i| states[i].clone()).collect();
        let log = log.clone();
        let id = app.tree_mut().insert(
            Component::new(move |cx| {
                for state in &watched {
                    cx.watch(state);
                }
                cx.insert(Spy::new(name, &log), Props::fixed(5.0, 5.0))
            }),
            Props::fixed(5.0, 5.0),
        );
        components.push(id);
    }
    let (shallow, middle, deep) = (components[0], components[1], components[2]);

    let tree = app.tree_mut();
    let inner = tree.insert_layout(Stack::new(), Props::fixed(20.0, 20.0), &[deep]);
    let outer = tree.insert_layout(Stack::new(), Props::fixed(40.0, 40.0), &[middle, inner]);
    let root = tree.insert_layout(Stack::new(), Props::fixed(80.0, 80.0), &[shallow, outer]);
    app.set_root(root);
    frame(&mut app);
    assert_eq!(rebuilds(&app, shallow), 1);
    assert_eq!(rebuilds(&app, deep), 1);

    let owner = app.owner().clone();
    let before = owner.repaint_requests();
    owner.begin_batch();
    // scheduled deep-first on purpose
    states[0].set(1);
    states[1].set(1);
    states[2].set(1);
    states[3].add(2);
    states[4].set(7);
    assert_eq!(owner.repaint_requests(), before);
    let order = owner.end_batch();

    assert_eq!(order, vec![shallow, middle, deep]);
    assert_eq!(owner.repaint_requests(), before + 1);

    frame(&mut app);
    for id in [shallow, middle, deep] {
        assert_eq!(rebuilds(&app, id), 2);
        assert!(!app.owner().is_pending(id));
    }
}

#[test]
fn test_nested_batches_flush_once_at_outermost_exit() {
    let state = State::new(0u32);
    let mut app = App::headless();
    let watched = state.clone();
    let log = log();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            cx.insert(Spy::new("view", &log), Props::fixed(5.0, 5.0))
        }),
        Props::fixed(5.0, 5.0),
    );
    app.set_root(component);
    frame(&mut app);

    let before = app.owner().repaint_requests();
    app.batch(|| {
        state.add(1);
        app.batch(|| state.add(1));
        state.sub(1);
    });
    assert_eq!(app.owner().repaint_requests(), before + 1);
    assert_eq!(state.get(), 1);

    frame(&mut app);
    assert_eq!(rebuilds(&app, component), 2);
}

// =============================================================================
// RECONCILIATION
// =============================================================================

#[test]
fn test_keyed_reuse_keeps_survivors_and_drops_the_rest() {
    let log = log();
    let items = State::new(vec!["A", "B", "C"]);
    let mut app = App::headless();
    let watched = items.clone();
    let view_log = log.clone();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            let rows = cx.cached(&watched.get(), |tree, name| {
                tree.insert(Spy::new(name, &view_log), Props::fixed(10.0, 10.0))
            });
            cx.insert_layout(Linear::column(), Props::expanding(), &rows)
        }),
        Props::fixed(50.0, 100.0),
    );
    app.set_root(component);
    frame(&mut app);

    let first_list = component_child(&app, component);
    let first: Vec<WidgetId> = first_list.map_or(Vec::new(), |l| app.tree().children(l).to_vec());
    assert_eq!(first.len(), 3);

    items.set(vec!["A", "C", "D"]);
    frame(&mut app);

    let second_list = component_child(&app, component);
    let second: Vec<WidgetId> =
        second_list.map_or(Vec::new(), |l| app.tree().children(l).to_vec());
    assert_eq!(second.len(), 3);
    assert_eq!(second[0], first[0]);
    assert_eq!(second[1], first[2]);
    assert!(!first.contains(&second[2]));

    // B and the old list are gone, A and C were never unmounted
    assert!(!app.tree().contains(first[1]));
    assert!(first_list.is_some_and(|l| !app.tree().contains(l)));
    assert_eq!(count(&log, "B:unmount"), 1);
    assert_eq!(count(&log, "A:unmount"), 0);
    assert_eq!(count(&log, "C:unmount"), 0);
    assert_eq!(count(&log, "A:mount"), 1);
    assert_eq!(count(&log, "D:mount"), 1);

    // survivors sit in the new list at their new slots
    assert_eq!(app.tree().parent(second[1]), second_list);
    assert_eq!(app.tree().base(second[1]).map(|b| b.pos().y), Some(14.0));
}

#[test]
fn test_duplicate_items_reuse_each_widget_once() {
    let log = log();
    let items = State::new(vec![1u8, 1, 2]);
    let mut app = App::headless();
    let watched = items.clone();
    let view_log = log.clone();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            let rows = cx.cached(&watched.get(), |tree, n| {
                tree.insert(Spy::new(&format!("n{n}"), &view_log), Props::fixed(4.0, 4.0))
            });
            cx.insert_layout(Linear::row(), Props::expanding(), &rows)
        }),
        Props::fixed(50.0, 10.0),
    );
    app.set_root(component);
    frame(&mut app);
    let list = component_child(&app, component);
    let first: Vec<WidgetId> = list.map_or(Vec::new(), |l| app.tree().children(l).to_vec());

    items.set(vec![1, 1, 1]);
    frame(&mut app);
    let list = component_child(&app, component);
    let second: Vec<WidgetId> = list.map_or(Vec::new(), |l| app.tree().children(l).to_vec());

    assert_eq!(&second[..2], &first[..2]);
    assert!(!first.contains(&second[2]));
    assert_eq!(count(&log, "n2:unmount"), 1);
    assert_eq!(entries(&log, "n1:mount").len(), 3);
}

#[test]
fn test_remounted_component_watches_its_state_again() {
    let log = log();
    let state = State::new(0u32);
    let mut app = App::headless();
    let watched = state.clone();
    let view_log = log.clone();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            cx.insert(Spy::new("view", &view_log), Props::fixed(5.0, 5.0))
        }),
        Props::fixed(5.0, 5.0),
    );
    let root = app
        .tree_mut()
        .insert_layout(Stack::new(), Props::fixed(20.0, 20.0), &[component]);
    app.set_root(root);
    frame(&mut app);
    assert_eq!(state.observer_count(), 1);

    app.tree_mut().detach(component);
    assert_eq!(state.observer_count(), 0);
    app.tree_mut().add_child(root, component);
    frame(&mut app);
    assert_eq!(rebuilds(&app, component), 2);
    assert_eq!(state.observer_count(), 1);

    state.set(5);
    frame(&mut app);
    assert_eq!(rebuilds(&app, component), 3);
}

// =============================================================================
// FOCUS RESTORE
// =============================================================================

#[test]
fn test_focus_follows_tab_index_across_rebuild() {
    let log = log();
    let generation = State::new(0u32);
    let mut app = App::headless();
    let watched = generation.clone();
    let view_log = log.clone();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            let generation = watched.get();
            let fields: Vec<WidgetId> = (1..=3)
                .map(|tab| {
                    cx.insert(
                        Spy::new(&format!("g{generation}-t{tab}"), &view_log),
                        Props::fixed(10.0, 10.0).focusable().tab(tab),
                    )
                })
                .collect();
            cx.insert_layout(Linear::column(), Props::expanding(), &fields)
        }),
        Props::fixed(50.0, 100.0),
    );
    app.set_root(component);
    frame(&mut app);

    let order = app.focus_order();
    assert_eq!(order.len(), 3);
    assert!(app.focus(order[1]));
    assert_eq!(count(&log, "g0-t2:focus"), 1);

    generation.set(1);
    frame(&mut app);

    let focused = app.focused();
    assert!(focused.is_some_and(|f| f != order[1]));
    assert_eq!(
        focused.and_then(|f| app.tree().base(f).and_then(|b| b.tab_index())),
        Some(2)
    );
    assert!(!app.tree().contains(order[1]));
    assert_eq!(count(&log, "g0-t2:unmount"), 1);
    // moved silently: no focus hook on the replacement
    assert_eq!(entries(&log, "g1-t2:focus").len(), 0);
}

#[test]
fn test_focus_on_reused_widget_is_kept() {
    let log = log();
    let items = State::new(vec![1u32, 2, 3]);
    let mut app = App::headless();
    let watched = items.clone();
    let view_log = log.clone();
    let component = app.tree_mut().insert(
        Component::new(move |cx| {
            cx.watch(&watched);
            let rows = cx.cached(&watched.get(), |tree, &n| {
                tree.insert(
                    Spy::new(&format!("r{n}"), &view_log),
                    Props::fixed(10.0, 10.0).focusable().tab(n),
                )
            });
            cx.insert_layout(Linear::column(), Props::expanding(), &rows)
        }),
        Props::fixed(50.0, 100.0),
    );
    app.set_root(component);
    frame(&mut app);

    let order = app.focus_order();
    app.focus(order[2]);
    items.set(vec![3, 4]);
    frame(&mut app);

    assert_eq!(app.focused(), Some(order[2]));
    assert_eq!(count(&log, "r3:focus"), 1);
    assert_eq!(count(&log, "r3:unmount"), 0);
}
