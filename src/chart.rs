//! Chart state: normalized tasks, the dependency index, the timeline, and the
//! bar and arrow geometry derived from them.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{self, TimeUnit};
use crate::error::{GanttError, Result};
use crate::events::GanttEvent;
use crate::layout::{Arrow, BarLayout, BarPart, GridLayout, Point};
use crate::model::{DependencyIndex, GanttOptions, Task, TaskInput, Timeline, ViewMode};

/// How close, in pixels, a point must be to an arrow to hit it.
const ARROW_HIT_TOLERANCE: f64 = 4.0;
/// Length of a task created from the context menu, in columns.
const NEW_TASK_COLUMNS: f64 = 3.0;

/// What lies under a chart point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Hit {
    Bar { id: String, part: BarPart },
    Arrow { from: String, to: String },
    Grid,
}

/// Bars and arrows currently marked active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub bars: HashSet<String>,
    pub arrows: HashSet<(String, String)>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty() && self.arrows.is_empty()
    }
}

/// Content for the task detail popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popup {
    pub task_id: String,
    pub title: String,
    pub subtitle: String,
}

pub struct Chart {
    pub(crate) options: GanttOptions,
    pub(crate) timeline: Timeline,
    /// Always sorted by row: `tasks[i].index == i`.
    pub(crate) tasks: Vec<Task>,
    pub(crate) index: DependencyIndex,
    /// Parallel to `tasks`.
    pub(crate) bars: Vec<BarLayout>,
    pub(crate) arrows: Vec<Arrow>,
    pub(crate) selection: Selection,
    pub(crate) scroll_x: f64,
    pub(crate) today: NaiveDateTime,
}

impl Chart {
    pub fn new(inputs: Vec<TaskInput>, options: GanttOptions, today: NaiveDateTime) -> Result<Self> {
        options.validate()?;
        let mut chart = Self {
            timeline: Timeline::new(options.view_mode, today),
            options,
            tasks: Vec::new(),
            index: DependencyIndex::default(),
            bars: Vec::new(),
            arrows: Vec::new(),
            selection: Selection::default(),
            scroll_x: 0.0,
            today,
        };
        chart.setup_tasks(inputs);
        let mode = chart.options.view_mode;
        chart.change_view_mode(mode);
        Ok(chart)
    }

    pub(crate) fn setup_tasks(&mut self, inputs: Vec<TaskInput>) {
        self.tasks = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| Task::from_input(input, i, self.today))
            .collect();
        self.index = DependencyIndex::build(&self.tasks);
        self.selection = Selection::default();
        debug!(tasks = self.tasks.len(), edges = self.index.edge_count(), "tasks loaded");
    }

    /// Apply the view-mode scale, rebuild everything and scroll to the
    /// earliest task.
    pub(crate) fn change_view_mode(&mut self, mode: ViewMode) {
        self.timeline.set_view_mode(mode);
        self.options.view_mode = mode;
        self.options.step = self.timeline.step;
        self.options.column_width = self.timeline.column_width;
        self.render();
        self.set_scroll_position();
        debug!(mode = %mode, ticks = self.timeline.ticks.len(), "view mode changed");
    }

    /// Recompute the range and lay out every bar and arrow from task data.
    pub(crate) fn render(&mut self) {
        self.timeline.recompute_range(&self.tasks, self.today);
        self.layout_bars();
        self.make_arrows();
    }

    /// Render again, keeping the same dates under the viewport.
    pub(crate) fn re_render(&mut self) {
        let old_start = self.timeline.start;
        self.render();
        let hours = calendar::diff(old_start, self.timeline.start, TimeUnit::Hour);
        self.scroll_x += hours / self.timeline.step * self.timeline.column_width;
        debug!(scroll_x = self.scroll_x, "chart re-rendered");
    }

    /// Bar geometry as a pure function of task dates and rows. Measured
    /// label widths survive.
    pub(crate) fn layout_bars(&mut self) {
        let measured: HashMap<&str, f64> = self
            .bars
            .iter()
            .filter_map(|b| b.label_width.map(|w| (b.task_id.as_str(), w)))
            .collect();
        let bars = self
            .tasks
            .iter()
            .map(|task| {
                let mut bar = BarLayout::compute(task, &self.timeline, &self.options);
                bar.label_width = measured.get(task.id.as_str()).copied();
                bar
            })
            .collect();
        self.bars = bars;
    }

    fn make_arrows(&mut self) {
        let mut arrows = Vec::new();
        for (to_pos, task) in self.tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let Some(from_pos) = self.position(dep) else {
                    continue;
                };
                arrows.push(Arrow::bound(
                    dep.clone(),
                    self.bars[from_pos].rect,
                    task.id.clone(),
                    self.bars[to_pos].rect,
                    &self.options,
                ));
            }
        }
        self.arrows = arrows;
        let live: HashSet<(String, String)> = self
            .arrows
            .iter()
            .filter_map(|a| a.to().map(|to| (a.from.clone(), to.to_string())))
            .collect();
        self.selection.arrows.retain(|edge| live.contains(edge));
    }

    /// Rebuild the dependency index and every arrow after an edge change.
    pub(crate) fn refresh_arrows(&mut self) {
        self.index = DependencyIndex::build(&self.tasks);
        self.make_arrows();
    }

    /// Re-route all arrows against the current bar rectangles.
    pub(crate) fn reroute_arrows(&mut self) {
        let rects: HashMap<&str, _> = self
            .bars
            .iter()
            .map(|b| (b.task_id.as_str(), b.rect))
            .collect();
        for arrow in &mut self.arrows {
            let Some(from) = rects.get(arrow.from.as_str()) else {
                continue;
            };
            let to = arrow.to().and_then(|id| rects.get(id)).copied();
            arrow.reroute(*from, to, &self.options);
        }
    }

    /// Scroll so the earliest task starts one column from the left edge.
    pub(crate) fn set_scroll_position(&mut self) {
        let Some(oldest) = self.tasks.iter().map(|t| t.start).min() else {
            return;
        };
        let hours = calendar::diff(oldest, self.timeline.start, TimeUnit::Hour);
        self.scroll_x = hours / self.timeline.step * self.timeline.column_width
            - self.timeline.column_width;
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn require(&self, id: &str) -> Result<usize> {
        self.position(id)
            .ok_or_else(|| GanttError::UnknownTask(id.to_string()))
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.position(id).map(|i| &self.tasks[i])
    }

    pub fn bars(&self) -> &[BarLayout] {
        &self.bars
    }

    pub fn bar(&self, id: &str) -> Option<&BarLayout> {
        self.position(id).map(|i| &self.bars[i])
    }

    pub(crate) fn bar_mut(&mut self, id: &str) -> Option<&mut BarLayout> {
        let pos = self.position(id)?;
        Some(&mut self.bars[pos])
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn options(&self) -> &GanttOptions {
        &self.options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn scroll_x(&self) -> f64 {
        self.scroll_x
    }

    pub fn today(&self) -> NaiveDateTime {
        self.today
    }

    /// Re-sort rows by current on-screen y and reassign row indices.
    /// Returns the ids whose row changed.
    pub(crate) fn sort_rows_by_y(&mut self) -> Vec<String> {
        let mut order: Vec<usize> = (0..self.bars.len()).collect();
        order.sort_by(|a, b| self.bars[*a].rect.y.total_cmp(&self.bars[*b].rect.y));

        let mut tasks = Vec::with_capacity(self.tasks.len());
        let mut bars = Vec::with_capacity(self.bars.len());
        let mut changed = Vec::new();
        for (row, old) in order.into_iter().enumerate() {
            let mut task = self.tasks[old].clone();
            if task.index != row {
                changed.push(task.id.clone());
            }
            task.index = row;
            tasks.push(task);
            bars.push(self.bars[old].clone());
        }
        self.tasks = tasks;
        self.bars = bars;
        if !changed.is_empty() {
            debug!(moved = changed.len(), "rows reordered");
        }
        changed
    }

    /// Write a bar's final x/width back to its task's dates.
    pub(crate) fn commit_bar_dates(&mut self, id: &str, x: f64, width: f64) -> Option<GanttEvent> {
        let pos = self.position(id)?;
        let start = self.timeline.x_to_date_from(x, self.tasks[pos].start);
        let end = calendar::add(start, self.timeline.width_to_hours(width) * 3600.0, TimeUnit::Second);
        let task = &mut self.tasks[pos];
        if task.start == start && task.end == end {
            return None;
        }
        task.start = start;
        task.end = end;
        debug!(task = %id, %start, %end, "dates committed");
        Some(GanttEvent::DateChange {
            task_id: id.to_string(),
            start,
            end,
        })
    }

    /// Write a progress fill width back to the task as a whole percentage.
    pub(crate) fn commit_progress(&mut self, id: &str, fill_width: f64) -> Option<GanttEvent> {
        let pos = self.position(id)?;
        let width = self.bars[pos].rect.width;
        let progress = if width > 0.0 {
            (fill_width / width * 100.0).clamp(0.0, 100.0).trunc() as u8
        } else {
            0
        };
        self.tasks[pos].progress = progress;
        self.bars[pos].set_position(None, None, None, progress);
        debug!(task = %id, progress, "progress committed");
        Some(GanttEvent::ProgressChange {
            task_id: id.to_string(),
            progress,
        })
    }

    /// After a commit: rebuild the whole chart when tasks crowd the padded
    /// range edges, otherwise just lay bars out again.
    pub(crate) fn update_gantt_dates(&mut self) {
        let min_start = self.tasks.iter().map(|t| t.start).min();
        let max_end = self.tasks.iter().map(|t| t.end).max();
        let (Some(min_start), Some(max_end)) = (min_start, max_end) else {
            return;
        };
        let step = self.timeline.step;
        let near_start = calendar::diff(min_start, self.timeline.start, TimeUnit::Hour) <= step;
        let near_end = calendar::diff(self.timeline.end, max_end, TimeUnit::Hour) <= step;
        if near_start || near_end {
            self.re_render();
        } else {
            self.layout_bars();
            self.reroute_arrows();
        }
    }

    pub(crate) fn add_dependency(&mut self, from: &str, to: &str) -> Result<bool> {
        self.require(from)?;
        let pos = self.require(to)?;
        if from == to || self.tasks[pos].depends_on(from) {
            return Ok(false);
        }
        self.tasks[pos].dependencies.push(from.to_string());
        self.refresh_arrows();
        debug!(%from, %to, "dependency added");
        Ok(true)
    }

    pub(crate) fn remove_dependency(&mut self, from: &str, to: &str) -> Result<bool> {
        let pos = self.require(to)?;
        let deps = &mut self.tasks[pos].dependencies;
        let before = deps.len();
        deps.retain(|d| d != from);
        if deps.len() == before {
            return Ok(false);
        }
        self.refresh_arrows();
        debug!(%from, %to, "dependency removed");
        Ok(true)
    }

    pub(crate) fn remove_task(&mut self, id: &str) -> Result<()> {
        let pos = self.require(id)?;
        self.tasks.remove(pos);
        self.bars.remove(pos);
        for (row, task) in self.tasks.iter_mut().enumerate() {
            task.index = row;
            task.dependencies.retain(|d| d != id);
        }
        self.selection.bars.remove(id);
        self.index = DependencyIndex::build(&self.tasks);
        self.re_render();
        debug!(task = %id, "task removed");
        Ok(())
    }

    /// Insert a three-column "New Task" at the snapped date and row under
    /// `(x, y)`. Returns the new id.
    pub(crate) fn create_task_at(&mut self, x: f64, y: f64) -> String {
        let start = self.timeline.x_to_date(self.timeline.snap_x(x));
        let seconds = self.timeline.step * NEW_TASK_COLUMNS * 3600.0 - 1.0;
        let end = calendar::add(start, seconds, TimeUnit::Second);

        let row = ((y - self.options.header_height - self.options.padding) / self.options.row_height())
            .floor()
            .max(0.0) as usize;
        let row = row.min(self.tasks.len());

        let id = self.unique_task_id();
        let task = Task {
            id: id.clone(),
            name: "New Task".to_string(),
            start,
            end,
            progress: 0,
            dependencies: Vec::new(),
            index: row,
            invalid: false,
            custom_class: None,
            show_label: true,
        };
        self.tasks.insert(row, task);
        for (i, task) in self.tasks.iter_mut().enumerate() {
            task.index = i;
        }
        self.index = DependencyIndex::build(&self.tasks);
        self.re_render();
        debug!(task = %id, row, %start, "task created");
        id
    }

    fn unique_task_id(&self) -> String {
        let base = format!("tid-{}", Utc::now().timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.position(&id).is_some() {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }

    pub(crate) fn rename_task(&mut self, id: &str, name: &str) -> Result<()> {
        let pos = self.require(id)?;
        self.tasks[pos].name = name.to_string();
        let bar = &mut self.bars[pos];
        if bar.label.is_some() {
            bar.label = Some(name.to_string());
            // Stale until the front end measures the new text.
            bar.label_width = None;
        }
        Ok(())
    }

    pub(crate) fn set_label_width(&mut self, id: &str, width: f64) {
        if let Some(bar) = self.bar_mut(id) {
            bar.label_width = width.is_finite().then_some(width);
        }
    }

    pub fn grid(&self) -> GridLayout {
        GridLayout::compute(&self.timeline, &self.options, self.tasks.len(), self.today)
    }

    /// Tooltip text for a special day in the header.
    pub fn special_day_tip(&self, date: NaiveDate) -> Option<String> {
        self.options.special_day(date).map(|day| {
            day.memo.clone().unwrap_or_else(|| {
                if day.is_holiday { "holiday" } else { "workday" }.to_string()
            })
        })
    }

    pub fn popup(&self, id: &str) -> Option<Popup> {
        let task = self.task(id)?;
        let lang = self.options.language.as_str();
        let start = calendar::format(task.start, "%b %-d", lang);
        let end = calendar::format(
            calendar::add(task.end, -1.0, TimeUnit::Second),
            "%b %-d",
            lang,
        );
        Some(Popup {
            task_id: task.id.clone(),
            title: task.name.clone(),
            subtitle: format!("{start} - {end}"),
        })
    }

    /// Resolve a chart point, topmost bar first, then arrows, then the grid.
    pub fn hit_test(&self, p: Point) -> Option<Hit> {
        for bar in self.bars.iter().rev() {
            if let Some(part) = bar.hit(p) {
                return Some(Hit::Bar {
                    id: bar.task_id.clone(),
                    part,
                });
            }
        }
        for arrow in self.arrows.iter().rev() {
            if let Some(to) = arrow.to() {
                if arrow.path.distance_to(p) <= ARROW_HIT_TOLERANCE {
                    return Some(Hit::Arrow {
                        from: arrow.from.clone(),
                        to: to.to_string(),
                    });
                }
            }
        }
        let grid = self.grid();
        let inside = p.x >= 0.0 && p.x <= grid.width && p.y >= 0.0 && p.y <= grid.height;
        inside.then_some(Hit::Grid)
    }

    pub(crate) fn unselect_all(&mut self) {
        self.selection = Selection::default();
    }

    pub(crate) fn select_bar(&mut self, id: &str) -> Result<()> {
        self.require(id)?;
        self.unselect_all();
        self.selection.bars.insert(id.to_string());
        Ok(())
    }

    pub(crate) fn select_arrow(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.arrows.iter().any(|a| a.links(from, to)) {
            return Err(GanttError::UnknownTask(format!("{from},{to}")));
        }
        self.unselect_all();
        self.selection.arrows.insert((from.to_string(), to.to_string()));
        Ok(())
    }

    /// Delete every active arrow's dependency, then every active bar.
    pub(crate) fn remove_selected(&mut self) -> Result<()> {
        let selection = std::mem::take(&mut self.selection);
        for (from, to) in &selection.arrows {
            if self.position(to).is_some() {
                self.remove_dependency(from, to)?;
            }
        }
        for id in &selection.bars {
            if self.position(id).is_some() {
                self.remove_task(id)?;
            }
        }
        Ok(())
    }
}
