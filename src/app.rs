use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use gantt_timeline::model::SpecialDay;
use gantt_timeline::{Gantt, GanttHandler, GanttOptions, Task, TaskInput, ViewMode};

use crate::io::ChartFile;
use crate::ui;

/// Forwards engine callbacks to the status bar.
struct StatusFeed(Sender<String>);

impl GanttHandler for StatusFeed {
    fn date_change(&mut self, task: &Task, start: NaiveDateTime, end: NaiveDateTime) {
        let _ = self.0.send(format!(
            "Updated '{}' ({} → {})",
            task.name,
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M"),
        ));
    }

    fn progress_change(&mut self, task: &Task, progress: u8) {
        let _ = self.0.send(format!("'{}' is {}% complete", task.name, progress));
    }

    fn view_change(&mut self, mode: ViewMode) {
        let _ = self.0.send(format!("{mode} view"));
    }
}

/// Main application state.
pub struct GanttApp {
    pub gantt: Gantt,
    pub status_message: String,
    status_feed: Receiver<String>,
    /// Task id and the name being typed for it.
    renaming: Option<(String, String)>,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>, chart: ChartFile) -> gantt_timeline::Result<Self> {
        ui::theme::install_fonts(&cc.egui_ctx);
        let (tx, rx) = mpsc::channel();
        let gantt = Gantt::new(chart.tasks, chart.options)?.with_handler(StatusFeed(tx));
        Ok(Self {
            gantt,
            status_message: "Ready".to_string(),
            status_feed: rx,
            renaming: None,
        })
    }

    // --- Chart operations ---

    pub fn change_view_mode(&mut self, mode: ViewMode) {
        self.gantt.change_view_mode(mode);
    }

    /// Append a task one column into the visible range.
    pub fn add_task(&mut self) {
        let x = self.gantt.scroll_x().max(0.0) + self.gantt.timeline().column_width;
        let id = self.gantt.create_task_at(x, f64::MAX);
        self.status_message = format!("Created task {id}");
    }

    pub fn delete_selected(&mut self) {
        if self.gantt.selection().is_empty() {
            self.status_message = "Nothing selected".to_string();
            return;
        }
        self.status_message = match self.gantt.remove_selected() {
            Ok(()) => "Selection removed".to_string(),
            Err(e) => format!("Delete failed: {e}"),
        };
    }

    fn begin_rename(&mut self, id: String) {
        if let Some(task) = self.gantt.task(&id) {
            let name = task.name.clone();
            self.renaming = Some((id, name));
        }
    }

    fn show_rename_window(&mut self, ctx: &egui::Context) {
        let Some((id, mut name)) = self.renaming.take() else {
            return;
        };
        let mut open = true;
        let mut commit = false;
        egui::Window::new("Rename task")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(&mut name);
                edit.request_focus();
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    commit = true;
                }
                if ui.button("Rename").clicked() {
                    commit = true;
                }
            });

        if commit {
            self.status_message = match self.gantt.rename_task(&id, name.trim()) {
                Ok(()) => format!("Renamed to '{}'", name.trim()),
                Err(e) => format!("Rename failed: {e}"),
            };
        } else if open {
            self.renaming = Some((id, name));
        }
    }
}

/// Generate a sample chart around `today` for demonstration.
pub fn sample_chart(today: NaiveDate) -> ChartFile {
    let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();

    let kickoff = TaskInput::new("kickoff", "Project Kickoff")
        .dates(day(-5), day(-3))
        .progress(100.0);
    let requirements = TaskInput::new("requirements", "Requirements Gathering")
        .dates(day(-2), day(4))
        .progress(60.0)
        .depends_on(["kickoff"]);
    let design = TaskInput::new("design", "UI Design")
        .dates(day(5), day(16))
        .progress(20.0)
        .depends_on(["requirements"]);
    let backend = TaskInput::new("backend", "Backend Development")
        .dates(day(6), day(27))
        .depends_on(["requirements"]);
    let qa = TaskInput::new("qa", "Testing & QA")
        .dates(day(22), day(29))
        .depends_on(["design", "backend"]);
    let mut launch = TaskInput::new("launch", "Launch")
        .dates(day(31), day(31))
        .depends_on(["qa"]);
    launch.custom_class = Some("bar-milestone".to_string());

    // The first Saturday after next week is worked.
    let to_saturday = (5 - today.weekday().num_days_from_monday() as i64).rem_euclid(7);
    let options = GanttOptions {
        special_days: vec![
            SpecialDay {
                date: today + Duration::days(9),
                is_holiday: true,
                memo: Some("Company offsite".to_string()),
            },
            SpecialDay {
                date: today + Duration::days(to_saturday + 7),
                is_holiday: false,
                memo: None,
            },
        ],
        ..GanttOptions::default()
    };

    ChartFile {
        options,
        tasks: vec![kickoff, requirements, design, backend, qa, launch],
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        // Keyboard shortcuts, unless a text field has focus
        if !ctx.wants_keyboard_input() {
            let delete = ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
            let escape = ctx.input(|i| i.key_pressed(egui::Key::Escape));
            if delete {
                self.delete_selected();
            }
            if escape {
                self.gantt.unselect_all();
            }
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {} · {}",
                                self.gantt.tasks().len(),
                                self.gantt.timeline().mode
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: Gantt chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let interaction = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| ui::gantt_chart::show_gantt_chart(&mut self.gantt, ui))
            .inner;

        for event in &interaction.events {
            tracing::debug!(?event, "chart event");
        }
        if let Some(status) = interaction.status {
            self.status_message = status;
        }
        if let Some(id) = interaction.rename {
            self.begin_rename(id);
        }
        while let Ok(message) = self.status_feed.try_recv() {
            self.status_message = message;
        }

        self.show_rename_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    #[test]
    fn sample_chart_mounts_with_linked_tasks() {
        let chart = sample_chart(today());
        let gantt = Gantt::with_today(chart.tasks, chart.options, today().and_hms_opt(0, 0, 0).unwrap()).unwrap();
        assert_eq!(gantt.tasks().len(), 6);
        assert_eq!(gantt.arrows().len(), 6);
        assert!(gantt.tasks().iter().all(|t| !t.invalid));
        assert_eq!(gantt.task("kickoff").unwrap().progress, 100);
    }

    #[test]
    fn sample_worked_saturday_is_a_weekend_day() {
        // 2024-05-15 is a Wednesday; the Saturday after next is 2024-05-25.
        let chart = sample_chart(today());
        let worked = &chart.options.special_days[1];
        assert_eq!(worked.date, NaiveDate::from_ymd_opt(2024, 5, 25).unwrap());
        assert!(!worked.is_holiday);
    }

    #[test]
    fn status_feed_describes_commits() {
        let (tx, rx) = mpsc::channel();
        let mut feed = StatusFeed(tx);
        feed.view_change(ViewMode::Week);
        assert_eq!(rx.try_recv().unwrap(), "Week view");
    }
}
