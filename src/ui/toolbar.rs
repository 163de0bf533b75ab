use crate::app::GanttApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  Chart  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  New Task", regular::PLUS)).clicked() {
                app.add_task();
                ui.close_menu();
            }
            let has_selection = !app.gantt.selection().is_empty();
            let delete = egui::Button::new(format!("{}  Delete Selected      Del", regular::TRASH));
            if ui.add_enabled(has_selection, delete).clicked() {
                app.delete_selected();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Clear Selection      Esc", regular::X)).clicked() {
                app.gantt.unselect_all();
                ui.close_menu();
            }
        });

        let current = app.gantt.timeline().mode;
        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Timeline Scale").small().weak());
            for mode in app.gantt.options().view_modes.clone() {
                if ui.radio(mode == current, mode.name()).clicked() {
                    app.change_view_mode(mode);
                    ui.close_menu();
                }
            }
        });

        // Right-aligned active scale
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{}  {}", regular::CALENDAR_BLANK, current))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
