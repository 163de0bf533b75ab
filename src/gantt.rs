use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::calendar;
use crate::chart::{Chart, Hit, Popup, Selection};
use crate::error::Result;
use crate::events::{GanttEvent, GanttHandler};
use crate::interaction::{Controller, InteractionState};
use crate::layout::{Arrow, BarLayout, GridLayout, Point};
use crate::model::{DependencyIndex, GanttOptions, Task, TaskInput, Timeline, ViewMode};

/// A mounted chart: task data, derived geometry, the gesture controller and
/// the caller's event handler.
///
/// Every mutation, interactive or programmatic, goes through this type so
/// geometry is always re-derived from task data.
pub struct Gantt {
    chart: Chart,
    controller: Controller,
    handler: Box<dyn GanttHandler>,
    popup: Option<Popup>,
}

impl Gantt {
    pub fn new(tasks: Vec<TaskInput>, options: GanttOptions) -> Result<Self> {
        Self::with_today(tasks, options, calendar::today())
    }

    /// Like [`Gantt::new`] with a fixed notion of "today".
    pub fn with_today(tasks: Vec<TaskInput>, options: GanttOptions, today: NaiveDateTime) -> Result<Self> {
        let chart = Chart::new(tasks, options, today)?;
        debug!(
            tasks = chart.tasks().len(),
            mode = %chart.timeline().mode,
            "gantt mounted"
        );
        Ok(Self {
            chart,
            controller: Controller::default(),
            handler: Box::new(()),
            popup: None,
        })
    }

    pub fn with_handler(mut self, handler: impl GanttHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn set_handler(&mut self, handler: impl GanttHandler + 'static) {
        self.handler = Box::new(handler);
    }

    /// Replace all tasks and re-render in the current view mode.
    pub fn refresh(&mut self, tasks: Vec<TaskInput>) {
        self.popup = None;
        self.chart.setup_tasks(tasks);
        let mode = self.chart.timeline().mode;
        self.change_view_mode(mode);
    }

    pub fn change_view_mode(&mut self, mode: ViewMode) {
        self.chart.change_view_mode(mode);
        self.dispatch(vec![GanttEvent::ViewChange(mode)]);
    }

    /// Switch view by display name, e.g. `"Quarter Day"`.
    pub fn change_view_mode_named(&mut self, name: &str) -> Result<()> {
        let mode = name.parse()?;
        self.change_view_mode(mode);
        Ok(())
    }

    pub fn create_task_at(&mut self, x: f64, y: f64) -> String {
        self.chart.create_task_at(x, y)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<()> {
        self.hide_popup_for(id);
        self.chart.remove_task(id)
    }

    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<bool> {
        self.chart.add_dependency(from, to)
    }

    pub fn remove_dependency(&mut self, from: &str, to: &str) -> Result<bool> {
        self.chart.remove_dependency(from, to)
    }

    pub fn rename_task(&mut self, id: &str, name: &str) -> Result<()> {
        self.chart.rename_task(id, name)?;
        if let Some(popup) = self.popup.as_mut().filter(|p| p.task_id == id) {
            popup.title = name.to_string();
        }
        Ok(())
    }

    /// Report the rendered width of a bar's label.
    pub fn set_label_width(&mut self, id: &str, width: f64) {
        self.chart.set_label_width(id, width);
    }

    pub fn unselect_all(&mut self) {
        self.chart.unselect_all();
        self.popup = None;
    }

    pub fn select_bar(&mut self, id: &str) -> Result<()> {
        self.chart.select_bar(id)
    }

    pub fn select_arrow(&mut self, from: &str, to: &str) -> Result<()> {
        self.chart.select_arrow(from, to)
    }

    /// Delete the active arrows and bars.
    pub fn remove_selected(&mut self) -> Result<()> {
        self.popup = None;
        self.chart.remove_selected()
    }

    /// A click (or hover, per `popup_trigger`) on a bar. Selects it and opens
    /// the popup unless the bar was just manipulated.
    pub fn bar_clicked(&mut self, id: &str) -> Option<Popup> {
        self.bar_clicked_at(id, Instant::now())
    }

    pub fn bar_clicked_at(&mut self, id: &str, now: Instant) -> Option<Popup> {
        if self.controller.popup_suppressed(id, now) {
            return None;
        }
        self.chart.select_bar(id).ok()?;
        self.popup = self.chart.popup(id);
        self.popup.clone()
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn hide_popup(&mut self) {
        self.popup = None;
    }

    fn hide_popup_for(&mut self, id: &str) {
        if self.popup.as_ref().is_some_and(|p| p.task_id == id) {
            self.popup = None;
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> InteractionState {
        let state = self.controller.pointer_down(&mut self.chart, Point::new(x, y));
        if matches!(self.chart.hit_test(Point::new(x, y)), Some(Hit::Grid) | None) {
            self.popup = None;
        }
        state
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.controller.bar_in_motion() {
            self.popup = None;
        }
        self.controller.pointer_move(&mut self.chart, Point::new(x, y));
    }

    /// Release, wherever the pointer is. Fires and returns the commit events.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Vec<GanttEvent> {
        let events = self
            .controller
            .pointer_up(&mut self.chart, Point::new(x, y), Instant::now());
        self.dispatch(events.clone());
        events
    }

    fn dispatch(&mut self, events: Vec<GanttEvent>) {
        for event in events {
            match event {
                GanttEvent::DateChange { task_id, start, end } => {
                    if let Some(task) = self.chart.task(&task_id) {
                        self.handler.date_change(task, start, end);
                    }
                }
                GanttEvent::ProgressChange { task_id, progress } => {
                    if let Some(task) = self.chart.task(&task_id) {
                        self.handler.progress_change(task, progress);
                    }
                }
                GanttEvent::ViewChange(mode) => self.handler.view_change(mode),
            }
        }
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<Hit> {
        self.chart.hit_test(Point::new(x, y))
    }

    pub fn state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn tasks(&self) -> &[Task] {
        self.chart.tasks()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.chart.task(id)
    }

    pub fn bars(&self) -> &[BarLayout] {
        self.chart.bars()
    }

    pub fn bar(&self, id: &str) -> Option<&BarLayout> {
        self.chart.bar(id)
    }

    pub fn arrows(&self) -> &[Arrow] {
        self.chart.arrows()
    }

    /// The arrow following the pointer during a connect gesture.
    pub fn transient_arrow(&self) -> Option<&Arrow> {
        self.controller.transient_arrow()
    }

    pub fn dependency_index(&self) -> &DependencyIndex {
        self.chart.index()
    }

    pub fn timeline(&self) -> &Timeline {
        self.chart.timeline()
    }

    pub fn options(&self) -> &GanttOptions {
        self.chart.options()
    }

    pub fn selection(&self) -> &Selection {
        self.chart.selection()
    }

    pub fn grid(&self) -> GridLayout {
        self.chart.grid()
    }

    pub fn scroll_x(&self) -> f64 {
        self.chart.scroll_x()
    }

    /// Record a scroll made by the front end so range drift can preserve it.
    pub fn set_scroll_x(&mut self, scroll_x: f64) {
        if scroll_x.is_finite() {
            self.chart.scroll_x = scroll_x;
        }
    }

    pub fn special_day_tip(&self, date: NaiveDate) -> Option<String> {
        self.chart.special_day_tip(date)
    }

    /// Format with the configured `date_format` and language.
    pub fn format_date(&self, instant: NaiveDateTime) -> String {
        let options = self.chart.options();
        calendar::format(instant, &options.date_format, &options.language)
    }
}
