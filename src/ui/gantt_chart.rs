use egui::{
    Align2, Color32, CursorIcon, Id, Painter, PointerButton, Pos2, Rect, Response, Rounding, Sense,
    Shape, Stroke, Ui, Vec2,
};
use egui_phosphor::regular;
use gantt_timeline::layout::{Arrow, ArrowMarker, BarLayout, BarPart, GridLayout};
use gantt_timeline::model::PopupTrigger;
use gantt_timeline::{Gantt, GanttEvent, Hit, InteractionState};

use crate::ui::theme;

/// What the chart did this frame that the app should know about.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    pub events: Vec<GanttEvent>,
    pub status: Option<String>,
    /// Task the user asked to rename from the popup.
    pub rename: Option<String>,
}

/// Render the Gantt chart area and feed pointer input into the engine.
pub fn show_gantt_chart(gantt: &mut Gantt, ui: &mut Ui) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let scroll_id = ui.make_persistent_id("gantt-scroll");
    let synced: Option<f32> = ui.ctx().data(|data| data.get_temp(scroll_id));
    let engine_x = gantt.scroll_x() as f32;

    let mut area = egui::ScrollArea::both().auto_shrink([false, false]);
    if synced != Some(engine_x) {
        area = area.horizontal_scroll_offset(engine_x.max(0.0));
    }
    let output = area.show(ui, |ui| draw_chart(gantt, ui, &mut interaction));

    // A re-render this frame moved the engine's scroll; apply it next frame.
    if gantt.scroll_x() as f32 == engine_x {
        let offset = output.state.offset.x;
        gantt.set_scroll_x(f64::from(offset));
        ui.ctx().data_mut(|data| data.insert_temp(scroll_id, offset));
    }
    interaction
}

fn draw_chart(gantt: &mut Gantt, ui: &mut Ui, interaction: &mut ChartInteraction) {
    measure_labels(gantt, ui);

    let grid = gantt.grid();
    let available = ui.available_size();
    let size = Vec2::new(
        (grid.width as f32).max(available.x),
        (grid.height as f32).max(available.y),
    );
    let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
    let origin = response.rect.min;

    handle_pointer(gantt, ui, &response, origin, interaction);
    context_menu(gantt, ui, &response, origin, interaction);

    let hovered = response
        .hover_pos()
        .and_then(|p| {
            let (x, y) = chart_point(origin, p);
            gantt.hit_test(x, y)
        });
    set_cursor(ui, gantt, hovered.as_ref());

    painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
    draw_grid(&painter, origin, &grid);
    draw_header(&painter, origin, &grid);
    special_day_tooltip(gantt, ui, &response, origin, &grid);

    let bar_height = gantt.options().bar_height;
    for arrow in gantt.arrows() {
        let active = arrow
            .to()
            .is_some_and(|to| gantt.selection().arrows.contains(&(arrow.from.clone(), to.to_string())));
        draw_arrow(&painter, origin, arrow, active, bar_height);
    }

    let hovered_bar = match &hovered {
        Some(Hit::Bar { id, .. }) => Some(id.as_str()),
        _ => None,
    };
    for bar in gantt.bars() {
        let selected = gantt.selection().bars.contains(&bar.task_id);
        draw_task_bar(&painter, origin, bar, selected, hovered_bar == Some(bar.task_id.as_str()));
    }

    if let Some(arrow) = gantt.transient_arrow() {
        draw_arrow(&painter, origin, arrow, true, bar_height);
    }

    show_popup(gantt, ui, origin, interaction);
}

fn chart_point(origin: Pos2, p: Pos2) -> (f64, f64) {
    let v = p - origin;
    (f64::from(v.x), f64::from(v.y))
}

fn screen(origin: Pos2, x: f64, y: f64) -> Pos2 {
    origin + Vec2::new(x as f32, y as f32)
}

fn screen_rect(origin: Pos2, r: &gantt_timeline::Rect) -> Rect {
    Rect::from_min_size(
        screen(origin, r.x, r.y),
        Vec2::new(r.width as f32, r.height as f32),
    )
}

/// Report label widths the engine has not seen yet.
fn measure_labels(gantt: &mut Gantt, ui: &Ui) {
    let unmeasured: Vec<(String, String)> = gantt
        .bars()
        .iter()
        .filter(|bar| bar.label_width.is_none())
        .filter_map(|bar| bar.label.clone().map(|label| (bar.task_id.clone(), label)))
        .collect();
    for (id, label) in unmeasured {
        let width = ui.fonts(|fonts| {
            fonts
                .layout_no_wrap(label, theme::font_bar(), theme::TEXT_ON_BAR)
                .size()
                .x
        });
        gantt.set_label_width(&id, f64::from(width));
    }
}

fn handle_pointer(
    gantt: &mut Gantt,
    ui: &Ui,
    response: &Response,
    origin: Pos2,
    interaction: &mut ChartInteraction,
) {
    if response.drag_started_by(PointerButton::Primary) {
        if let Some(press) = ui.input(|i| i.pointer.press_origin()) {
            let (x, y) = chart_point(origin, press);
            gantt.pointer_down(x, y);
        }
    }
    if response.dragged_by(PointerButton::Primary) {
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = chart_point(origin, pos);
            gantt.pointer_move(x, y);
        }
    }
    if response.drag_stopped_by(PointerButton::Primary) {
        let released = ui
            .input(|i| i.pointer.latest_pos())
            .or_else(|| response.interact_pointer_pos());
        if let Some(pos) = released {
            let (x, y) = chart_point(origin, pos);
            interaction.events.extend(gantt.pointer_up(x, y));
        }
    }

    let trigger = gantt.options().popup_trigger;
    if response.clicked() || response.double_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = chart_point(origin, pos);
            match gantt.hit_test(x, y) {
                Some(Hit::Bar { id, .. }) => {
                    let opens = match trigger {
                        PopupTrigger::Click => response.clicked(),
                        PopupTrigger::Dblclick => response.double_clicked(),
                        PopupTrigger::Mouseover => false,
                    };
                    if opens {
                        gantt.bar_clicked(&id);
                    } else {
                        let _ = gantt.select_bar(&id);
                    }
                }
                Some(Hit::Arrow { from, to }) => {
                    let _ = gantt.select_arrow(&from, &to);
                }
                Some(Hit::Grid) | None => gantt.unselect_all(),
            }
        }
    }

    if trigger == PopupTrigger::Mouseover && gantt.state() == InteractionState::Idle {
        if let Some(pos) = response.hover_pos() {
            let (x, y) = chart_point(origin, pos);
            if let Some(Hit::Bar { id, .. }) = gantt.hit_test(x, y) {
                if gantt.popup().map_or(true, |p| p.task_id != id) {
                    gantt.bar_clicked(&id);
                }
            }
        }
    }
}

/// The right-click entry for whatever was under the pointer.
#[derive(Debug, Clone, PartialEq)]
enum ContextAction {
    CreateTask { x: f64, y: f64 },
    RemoveTask(String),
    RemoveDependency { from: String, to: String },
}

impl ContextAction {
    fn at(hit: Option<Hit>, x: f64, y: f64) -> Option<Self> {
        match hit? {
            Hit::Grid => Some(Self::CreateTask { x, y }),
            Hit::Bar { id, .. } => Some(Self::RemoveTask(id)),
            Hit::Arrow { from, to } => Some(Self::RemoveDependency { from, to }),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::CreateTask { .. } => format!("{}  New task here", regular::PLUS),
            Self::RemoveTask(_) => format!("{}  Remove task", regular::TRASH),
            Self::RemoveDependency { .. } => format!("{}  Remove dependency", regular::LINK_BREAK),
        }
    }

    /// Apply to the chart and describe the outcome for the status bar.
    fn apply(self, gantt: &mut Gantt) -> String {
        match self {
            Self::CreateTask { x, y } => format!("Created task {}", gantt.create_task_at(x, y)),
            Self::RemoveTask(id) => match gantt.remove_task(&id) {
                Ok(()) => format!("Removed task {id}"),
                Err(e) => format!("Remove failed: {e}"),
            },
            Self::RemoveDependency { from, to } => match gantt.remove_dependency(&from, &to) {
                Ok(_) => format!("Removed dependency {from} → {to}"),
                Err(e) => format!("Remove failed: {e}"),
            },
        }
    }
}

fn context_menu(
    gantt: &mut Gantt,
    ui: &Ui,
    response: &Response,
    origin: Pos2,
    interaction: &mut ChartInteraction,
) {
    let menu_id = Id::new("gantt-context-action");
    if response.secondary_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = chart_point(origin, pos);
            let hit = gantt.hit_test(x, y);
            match &hit {
                Some(Hit::Bar { id, .. }) => {
                    let _ = gantt.select_bar(id);
                }
                Some(Hit::Arrow { from, to }) => {
                    let _ = gantt.select_arrow(from, to);
                }
                _ => gantt.unselect_all(),
            }
            let action = ContextAction::at(hit, x, y);
            ui.ctx().data_mut(|data| data.insert_temp(menu_id, action));
        }
    }

    response.context_menu(|ui| {
        let action: Option<ContextAction> = ui.ctx().data(|data| data.get_temp(menu_id)).flatten();
        match action {
            Some(action) => {
                if ui.button(action.label()).clicked() {
                    interaction.status = Some(action.apply(gantt));
                    ui.ctx().data_mut(|data| data.remove::<Option<ContextAction>>(menu_id));
                    ui.close_menu();
                }
            }
            None => {
                ui.label(egui::RichText::new("Nothing here").weak());
            }
        }
    });
}

fn set_cursor(ui: &Ui, gantt: &Gantt, hovered: Option<&Hit>) {
    let icon = match gantt.state() {
        InteractionState::Dragging => Some(CursorIcon::Grabbing),
        InteractionState::ResizingLeft
        | InteractionState::ResizingRight
        | InteractionState::ResizingProgress => Some(CursorIcon::ResizeHorizontal),
        InteractionState::Connecting => Some(CursorIcon::Crosshair),
        InteractionState::Idle => match hovered {
            Some(Hit::Bar { part, .. }) => Some(match part {
                BarPart::Connector => CursorIcon::Crosshair,
                BarPart::ProgressHandle | BarPart::LeftHandle | BarPart::RightHandle => {
                    CursorIcon::ResizeHorizontal
                }
                BarPart::Body if gantt.options().drag_enabled => CursorIcon::Grab,
                BarPart::Body => CursorIcon::PointingHand,
            }),
            Some(Hit::Arrow { .. }) => Some(CursorIcon::PointingHand),
            _ => None,
        },
    };
    if let Some(icon) = icon {
        ui.ctx().set_cursor_icon(icon);
    }
}

fn draw_grid(painter: &Painter, origin: Pos2, grid: &GridLayout) {
    let x_range = origin.x..=origin.x + grid.width as f32;
    for (i, row) in grid.rows.iter().enumerate() {
        if i % 2 == 1 {
            painter.rect_filled(screen_rect(origin, row), 0.0, theme::BG_ROW_ODD);
        }
    }
    for y in &grid.row_lines {
        painter.hline(
            x_range.clone(),
            origin.y + *y as f32,
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
    for highlight in &grid.highlights {
        painter.rect_filled(
            screen_rect(origin, &highlight.rect),
            0.0,
            theme::highlight_fill(highlight.kind),
        );
    }
    for tick in &grid.ticks {
        let stroke = if tick.thick {
            Stroke::new(1.0, theme::GRID_LINE_THICK)
        } else {
            Stroke::new(0.5, theme::GRID_LINE)
        };
        let top = origin.y + tick.y as f32;
        painter.vline(origin.x + tick.x as f32, top..=top + tick.height as f32, stroke);
    }
}

fn draw_header(painter: &Painter, origin: Pos2, grid: &GridLayout) {
    let header = screen_rect(origin, &grid.header);
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.hline(
        header.x_range(),
        header.bottom(),
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    for tick in &grid.header_ticks {
        let top = origin.y + tick.y as f32;
        painter.vline(
            origin.x + tick.x as f32,
            top..=top + tick.height as f32,
            Stroke::new(1.0, theme::GRID_LINE_THICK),
        );
    }

    for label in &grid.labels {
        if !label.lower_text.is_empty() {
            let color = if label.special_day {
                theme::ACCENT
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                screen(origin, label.lower_x, label.lower_y),
                Align2::CENTER_BOTTOM,
                &label.lower_text,
                theme::font_sub(),
                color,
            );
        }
        if !label.upper_text.is_empty() {
            let galley = painter.layout_no_wrap(
                label.upper_text.clone(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
            let size = galley.size();
            if label.upper_fits(f64::from(size.x), grid.width) {
                let anchor = screen(origin, label.upper_x, label.upper_y);
                painter.galley(anchor - Vec2::new(size.x / 2.0, size.y), galley, theme::TEXT_PRIMARY);
            }
        }
    }
}

fn special_day_tooltip(gantt: &Gantt, ui: &Ui, response: &Response, origin: Pos2, grid: &GridLayout) {
    let Some(pos) = response.hover_pos() else {
        return;
    };
    let (x, y) = chart_point(origin, pos);
    if y > grid.header.bottom() {
        return;
    }
    let label = grid
        .labels
        .iter()
        .find(|l| l.special_day && x >= l.base_x && x < l.base_x + l.column_width);
    if let Some(tip) = label.and_then(|l| gantt.special_day_tip(l.date.date())) {
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            Id::new("special-day-tip"),
            |ui| {
                ui.label(tip);
            },
        );
    }
}

fn draw_arrow(painter: &Painter, origin: Pos2, arrow: &Arrow, active: bool, bar_height: f64) {
    let stroke = theme::arrow_stroke(active);
    for line in arrow.path.flatten() {
        let points: Vec<Pos2> = line.iter().map(|p| screen(origin, p.x, p.y)).collect();
        if points.len() > 1 {
            painter.add(Shape::line(points, stroke));
        }
    }
    if let ArrowMarker::Circle {
        center,
        outer_radius,
        inner_radius,
    } = arrow.marker(bar_height)
    {
        let center = screen(origin, center.x, center.y);
        painter.circle_stroke(center, outer_radius as f32, stroke);
        painter.circle_filled(center, inner_radius as f32, stroke.color);
    }
}

fn draw_task_bar(painter: &Painter, origin: Pos2, bar: &BarLayout, selected: bool, hovered: bool) {
    let rect = screen_rect(origin, &bar.rect);
    let radius = bar.corner_radius as f32;
    let rounding = Rounding::same(radius);

    // Soft shadow
    painter.rect_filled(
        rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );

    let fill = if bar.invalid {
        theme::BAR_INVALID
    } else {
        theme::bar_fill(bar.custom_class.as_deref())
    };
    painter.rect_filled(rect, rounding, fill);

    if let Some(progress) = bar.progress_rect().filter(|r| r.width > 0.0) {
        painter.rect_filled(screen_rect(origin, &progress), rounding, theme::PROGRESS_FILL);
    }

    if selected {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(radius + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if selected || hovered {
        for handle in [bar.left_handle(), bar.right_handle()].into_iter().flatten() {
            let handle = screen_rect(origin, &handle);
            let pill = Rect::from_center_size(
                handle.center(),
                Vec2::new(theme::HANDLE_PILL_WIDTH, handle.height() * 0.55),
            );
            painter.rect_filled(pill, Rounding::same(2.0), theme::HANDLE_COLOR);
        }
        if let Some(triangle) = bar.progress_handle() {
            let points = triangle.iter().map(|p| screen(origin, p.x, p.y)).collect();
            painter.add(Shape::convex_polygon(points, theme::HANDLE_COLOR, Stroke::NONE));
        }
        if let Some(connector) = bar.connector() {
            painter.circle_stroke(
                screen(origin, connector.cx, connector.cy),
                connector.r as f32,
                Stroke::new(1.0, theme::HANDLE_COLOR),
            );
        }
    }

    if let (Some(label), Some(place)) = (&bar.label, bar.label_placement()) {
        let (align, color) = if place.overflow {
            (Align2::LEFT_CENTER, theme::TEXT_SECONDARY)
        } else {
            (Align2::CENTER_CENTER, theme::TEXT_ON_BAR)
        };
        painter.text(
            screen(origin, place.x, place.y),
            align,
            label,
            theme::font_bar(),
            color,
        );
    }
}

fn show_popup(gantt: &Gantt, ui: &Ui, origin: Pos2, interaction: &mut ChartInteraction) {
    let Some(popup) = gantt.popup() else {
        return;
    };
    let (Some(bar), Some(task)) = (gantt.bar(&popup.task_id), gantt.task(&popup.task_id)) else {
        return;
    };
    let anchor = screen(origin, bar.rect.x, bar.rect.bottom() + 10.0);
    egui::Area::new(Id::new("gantt-popup"))
        .order(egui::Order::Foreground)
        .fixed_pos(anchor)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(theme::POPUP_WIDTH);
                ui.strong(&popup.title);
                ui.label(&popup.subtitle);
                ui.label(
                    egui::RichText::new(format!("{}% complete", task.progress))
                        .size(10.5)
                        .color(theme::TEXT_DIM),
                );
                if ui
                    .button(format!("{}  Rename", regular::PENCIL_SIMPLE))
                    .clicked()
                {
                    interaction.rename = Some(popup.task_id.clone());
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantt_timeline::{calendar, GanttOptions, TaskInput};

    fn gantt() -> Gantt {
        let tasks = vec![
            TaskInput::new("a", "A").dates("2024-01-01", "2024-01-03"),
            TaskInput::new("b", "B").dates("2024-01-05", "2024-01-08").depends_on(["a"]),
        ];
        let today = calendar::parse("2024-01-02").unwrap();
        Gantt::with_today(tasks, GanttOptions::default(), today).unwrap()
    }

    fn action_at(gantt: &Gantt, x: f64, y: f64) -> Option<ContextAction> {
        ContextAction::at(gantt.hit_test(x, y), x, y)
    }

    #[test]
    fn right_click_on_arrow_offers_dependency_removal() {
        let mut gantt = gantt();
        let start = gantt.arrows()[0].path.start;
        let action = action_at(&gantt, start.x, start.y + 2.0).unwrap();
        assert_eq!(action, ContextAction::RemoveDependency { from: "a".into(), to: "b".into() });

        action.apply(&mut gantt);
        assert!(gantt.arrows().is_empty());
        assert!(gantt.task("b").unwrap().dependencies.is_empty());
    }

    #[test]
    fn right_click_on_bar_offers_task_removal() {
        let mut gantt = gantt();
        let r = gantt.bar("b").unwrap().rect;
        let action = action_at(&gantt, r.x + r.width / 2.0, r.y + 5.0).unwrap();
        assert_eq!(action, ContextAction::RemoveTask("b".into()));

        action.apply(&mut gantt);
        assert!(gantt.task("b").is_none());
        assert_eq!(gantt.tasks().len(), 1);
    }

    #[test]
    fn only_empty_grid_offers_task_creation() {
        let mut gantt = gantt();
        let options = gantt.options().clone();
        // Row 0, far left of the first bar.
        let y = options.header_height + options.padding + 5.0;
        let action = action_at(&gantt, 10.0, y).unwrap();
        assert!(matches!(action, ContextAction::CreateTask { .. }));

        action.apply(&mut gantt);
        assert_eq!(gantt.tasks().len(), 3);
        assert_eq!(gantt.tasks()[0].name, "New Task");
        assert!(action_at(&gantt, -10.0, -10.0).is_none());
    }
}
