//! End-to-end scenarios driven through the public pointer API.

use chrono::NaiveDateTime;
use gantt_timeline::calendar;
use gantt_timeline::layout::{ArrowMarker, MIN_BAR_WIDTH};
use gantt_timeline::{Gantt, GanttEvent, GanttOptions, InteractionState, TaskInput, ViewMode};

fn dt(s: &str) -> NaiveDateTime {
    calendar::parse(s).unwrap()
}

fn mount(tasks: Vec<TaskInput>) -> Gantt {
    Gantt::with_today(tasks, GanttOptions::default(), dt("2024-01-02")).unwrap()
}

fn two_tasks(b_depends_on_a: bool) -> Gantt {
    let a = TaskInput::new("A", "Task A").dates("2024-01-01", "2024-01-03").progress(50.0);
    let mut b = TaskInput::new("B", "Task B").dates("2024-01-02", "2024-01-05");
    if b_depends_on_a {
        b = b.depends_on(["A"]);
    }
    mount(vec![a, b])
}

/// A point on the bar body, above the progress handle.
fn body(gantt: &Gantt, id: &str) -> (f64, f64) {
    let r = gantt.bar(id).unwrap().rect;
    (r.x + r.width / 2.0, r.y + 5.0)
}

fn drag(gantt: &mut Gantt, from: (f64, f64), dx: f64, dy: f64) -> Vec<GanttEvent> {
    gantt.pointer_down(from.0, from.1);
    gantt.pointer_move(from.0 + dx / 2.0, from.1 + dy / 2.0);
    gantt.pointer_move(from.0 + dx, from.1 + dy);
    gantt.pointer_up(from.0 + dx, from.1 + dy)
}

#[test]
fn dependency_arrow_runs_from_source_bottom_to_target_left_edge() {
    let gantt = two_tasks(true);
    let options = gantt.options().clone();
    let a = gantt.bar("A").unwrap().rect;
    let b = gantt.bar("B").unwrap().rect;

    assert_eq!(gantt.arrows().len(), 1);
    let arrow = &gantt.arrows()[0];
    assert_eq!(arrow.id(), "A,B");
    assert_eq!(arrow.path.end.x, b.x - options.padding / 2.0);
    assert_eq!(arrow.path.end.y, b.y + b.height / 2.0);
    assert_eq!(arrow.path.start.y, a.bottom());

    // The start walks left from the centre in 10px steps until it clears the target.
    let walked = a.x + a.width / 2.0 - arrow.path.start.x;
    assert_eq!(walked % 10.0, 0.0);
    assert!(
        arrow.path.start.x + options.padding <= arrow.path.end.x
            || arrow.path.start.x <= a.x + options.padding
    );
    assert!(!arrow.path.rerouted);
    assert_eq!(arrow.marker(options.bar_height), ArrowMarker::Chevron);
}

#[test]
fn dragging_two_columns_shifts_dates_by_two_steps() {
    let mut gantt = two_tasks(false);
    let column = gantt.timeline().column_width;
    let step = gantt.timeline().step;
    let from = body(&gantt, "A");
    let events = drag(&mut gantt, from, 2.0 * column, 0.0);

    let shifted = |s: &str| calendar::add(dt(s), 2.0 * step, calendar::TimeUnit::Hour);
    assert_eq!(
        events,
        vec![GanttEvent::DateChange {
            task_id: "A".into(),
            start: shifted("2024-01-01"),
            end: shifted("2024-01-04"),
        }]
    );
    let a = gantt.task("A").unwrap();
    assert_eq!(a.start, dt("2024-01-03"));
    assert_eq!(a.end, dt("2024-01-06"));
    assert_eq!(gantt.task("B").unwrap().start, dt("2024-01-02"));
    assert_eq!(gantt.state(), InteractionState::Idle);
}

#[test]
fn dependents_follow_the_dragged_bar() {
    let mut gantt = two_tasks(true);
    let column = gantt.timeline().column_width;
    let from = body(&gantt, "A");
    let events = drag(&mut gantt, from, -column, 0.0);
    assert_eq!(events.len(), 2);
    assert_eq!(gantt.task("A").unwrap().start, dt("2023-12-31"));
    assert_eq!(gantt.task("B").unwrap().start, dt("2024-01-01"));
}

#[test]
fn progress_handle_extremes_commit_zero_and_hundred() {
    let mut gantt = two_tasks(false);
    let r = gantt.bar("A").unwrap().rect;
    let handle = (r.x + r.width / 2.0, r.bottom() - 2.0);

    assert_eq!(gantt.pointer_down(handle.0, handle.1), InteractionState::ResizingProgress);
    gantt.pointer_move(handle.0 - 500.0, handle.1);
    assert_eq!(gantt.bar("A").unwrap().progress_width, 0.0);
    let events = gantt.pointer_up(handle.0 - 500.0, handle.1);
    assert_eq!(events, vec![GanttEvent::ProgressChange { task_id: "A".into(), progress: 0 }]);

    // The handle now sits at the bar's left edge.
    let handle = (r.x, r.bottom() - 2.0);
    assert_eq!(gantt.pointer_down(handle.0, handle.1), InteractionState::ResizingProgress);
    gantt.pointer_move(handle.0 + r.width, handle.1);
    let events = gantt.pointer_up(handle.0 + r.width, handle.1);
    assert_eq!(events, vec![GanttEvent::ProgressChange { task_id: "A".into(), progress: 100 }]);
    assert_eq!(gantt.task("A").unwrap().progress, 100);
}

#[test]
fn switching_to_month_view_rebuilds_scale_and_ticks() {
    let mut gantt = two_tasks(true);
    gantt.change_view_mode(ViewMode::Month);

    let timeline = gantt.timeline();
    assert_eq!(gantt.options().column_width, 150.0);
    assert_eq!(gantt.options().step, 720.0);
    assert_eq!(timeline.start, dt("2024-01-01"));
    assert_eq!(timeline.end, dt("2025-01-06"));
    assert!(timeline.ticks.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(timeline.ticks[1], dt("2024-02-01"));
    assert!(*timeline.ticks.last().unwrap() >= timeline.end);
    assert_eq!(timeline.ticks.len(), 14);

    // Bars are re-laid out on the month scale: one day is 5px.
    assert_eq!(gantt.bar("B").unwrap().rect.x, 5.0);
    assert_eq!(gantt.grid().labels[0].upper_text, "2024");
}

#[test]
fn left_resize_stops_at_minimum_width() {
    let mut gantt = two_tasks(false);
    let r = gantt.bar("B").unwrap().rect;
    let handle = (r.x + 4.0, r.y + 5.0);
    assert_eq!(gantt.pointer_down(handle.0, handle.1), InteractionState::ResizingLeft);
    gantt.pointer_move(handle.0 + 1000.0, handle.1);
    assert_eq!(gantt.bar("B").unwrap().rect.width, MIN_BAR_WIDTH);
    gantt.pointer_up(handle.0 + 1000.0, handle.1);

    let b = gantt.task("B").unwrap();
    assert_eq!(b.start, dt("2024-01-05"));
    assert_eq!(b.end, dt("2024-01-06"));
    assert!(gantt.bar("B").unwrap().rect.width >= MIN_BAR_WIDTH);
}

#[test]
fn cyclic_dependencies_still_drag_once_each() {
    let mut gantt = mount(vec![
        TaskInput::new("a", "a").dates("2024-01-01", "2024-01-02").depends_on(["c"]),
        TaskInput::new("b", "b").dates("2024-01-03", "2024-01-04").depends_on(["a"]),
        TaskInput::new("c", "c").dates("2024-01-05", "2024-01-06").depends_on(["b"]),
    ]);
    let column = gantt.timeline().column_width;
    let from = body(&gantt, "a");
    let events = drag(&mut gantt, from, column, 0.0);
    assert_eq!(events.len(), 3);
    assert_eq!(gantt.task("a").unwrap().start, dt("2024-01-02"));
    assert_eq!(gantt.task("b").unwrap().start, dt("2024-01-04"));
    assert_eq!(gantt.task("c").unwrap().start, dt("2024-01-06"));
}

#[test]
fn crowding_the_range_start_re_renders_and_keeps_scroll() {
    let mut gantt = mount(vec![TaskInput::new("a", "a").dates("2024-01-01", "2024-01-03")]);
    assert_eq!(gantt.timeline().start, dt("2023-12-01"));
    assert_eq!(gantt.scroll_x(), 1500.0);

    let column = gantt.timeline().column_width;
    let from = body(&gantt, "a");
    drag(&mut gantt, from, -30.0 * column, 0.0);

    assert_eq!(gantt.task("a").unwrap().start, dt("2023-12-02"));
    assert_eq!(gantt.timeline().start, dt("2023-11-02"));
    // Shifted by the 29 days the range grew on the left.
    assert_eq!(gantt.scroll_x(), 1500.0 + 29.0 * column);
    assert_eq!(gantt.bar("a").unwrap().rect.x, 30.0 * column);
}

#[test]
fn crowding_the_range_end_re_renders_and_keeps_scroll() {
    let mut gantt = mount(vec![TaskInput::new("a", "a").dates("2024-01-01", "2024-01-03")]);
    assert_eq!(gantt.timeline().end, dt("2024-02-04"));

    // Ending 2024-02-03 leaves one day to the padded end.
    let column = gantt.timeline().column_width;
    let from = body(&gantt, "a");
    drag(&mut gantt, from, 30.0 * column, 0.0);

    assert_eq!(gantt.task("a").unwrap().end, dt("2024-02-03"));
    assert_eq!(gantt.timeline().start, dt("2023-12-31"));
    assert_eq!(gantt.timeline().end, dt("2024-03-03"));
    assert_eq!(gantt.scroll_x(), 0.0);
    assert_eq!(gantt.bar("a").unwrap().rect.x, 31.0 * column);
}

#[test]
fn locked_bars_still_resize_and_track_progress() {
    let options = GanttOptions {
        drag_enabled: false,
        ..GanttOptions::default()
    };
    let tasks = vec![TaskInput::new("A", "Task A").dates("2024-01-01", "2024-01-03").progress(50.0)];
    let mut gantt = Gantt::with_today(tasks, options, dt("2024-01-02")).unwrap();
    let column = gantt.timeline().column_width;

    let from = body(&gantt, "A");
    assert_eq!(gantt.pointer_down(from.0, from.1), InteractionState::Idle);
    gantt.pointer_move(from.0 + column, from.1);
    assert!(gantt.pointer_up(from.0 + column, from.1).is_empty());
    assert_eq!(gantt.task("A").unwrap().start, dt("2024-01-01"));

    let r = gantt.bar("A").unwrap().rect;
    let handle = (r.end_x() - 4.0, r.y + 5.0);
    assert_eq!(gantt.pointer_down(handle.0, handle.1), InteractionState::ResizingRight);
    gantt.pointer_move(handle.0 + column, handle.1);
    let events = gantt.pointer_up(handle.0 + column, handle.1);
    assert_eq!(
        events,
        vec![GanttEvent::DateChange {
            task_id: "A".into(),
            start: dt("2024-01-01"),
            end: dt("2024-01-05"),
        }]
    );

    let bar = gantt.bar("A").unwrap();
    let handle = (bar.rect.x + bar.progress_width, bar.rect.bottom() - 2.0);
    assert_eq!(gantt.pointer_down(handle.0, handle.1), InteractionState::ResizingProgress);
    gantt.pointer_move(handle.0 - 500.0, handle.1);
    let events = gantt.pointer_up(handle.0 - 500.0, handle.1);
    assert_eq!(events, vec![GanttEvent::ProgressChange { task_id: "A".into(), progress: 0 }]);
}

#[test]
fn connect_never_links_a_bar_to_itself_or_to_an_invalid_bar() {
    let mut broken = TaskInput::new("X", "Broken");
    broken.start = Some("2024-01-04".to_string());
    let mut gantt = mount(vec![
        TaskInput::new("A", "Task A").dates("2024-01-01", "2024-01-03"),
        broken,
    ]);
    assert!(gantt.task("X").unwrap().invalid);
    let connector = gantt.bar("A").unwrap().connector().unwrap();

    for target in [body(&gantt, "A"), body(&gantt, "X")] {
        assert_eq!(gantt.pointer_down(connector.cx, connector.cy), InteractionState::Connecting);
        gantt.pointer_move(target.0, target.1);
        assert_eq!(gantt.transient_arrow().and_then(|a| a.to()), None);
        assert!(gantt.pointer_up(target.0, target.1).is_empty());
        assert!(gantt.transient_arrow().is_none());
    }
    assert!(gantt.arrows().is_empty());
    assert!(gantt.task("A").unwrap().dependencies.is_empty());
    assert!(gantt.task("X").unwrap().dependencies.is_empty());
    assert!(gantt.selection().is_empty());
}

#[test]
fn connect_gesture_adds_dependency_once() {
    let mut gantt = two_tasks(false);
    let connector = gantt.bar("A").unwrap().connector().unwrap();
    let target = body(&gantt, "B");

    for _ in 0..2 {
        assert_eq!(gantt.pointer_down(connector.cx, connector.cy), InteractionState::Connecting);
        gantt.pointer_move(target.0, target.1);
        assert_eq!(gantt.transient_arrow().and_then(|a| a.to()), Some("B"));
        gantt.pointer_up(target.0, target.1);
        assert!(gantt.transient_arrow().is_none());
    }
    assert_eq!(gantt.task("B").unwrap().dependencies, ["A"]);
    assert_eq!(gantt.arrows().len(), 1);
}

#[test]
fn created_and_removed_tasks_keep_rows_dense() {
    let mut gantt = two_tasks(true);
    let options = gantt.options().clone();
    let y = options.header_height + options.padding + 5.0;
    let id = gantt.create_task_at(100.0, y);
    let rows: Vec<&str> = gantt.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(rows, [id.as_str(), "A", "B"]);

    gantt.remove_task("A").unwrap();
    assert!(gantt.task("B").unwrap().dependencies.is_empty());
    assert!(gantt.arrows().is_empty());
    assert!(gantt.tasks().iter().enumerate().all(|(i, t)| t.index == i));
    assert!(gantt.remove_task("A").is_err());
}
