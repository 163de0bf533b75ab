use egui::{Color32, FontId, Rounding, Stroke, Visuals};
use gantt_timeline::layout::HighlightKind;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_ODD: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 6);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const GRID_LINE_THICK: Color32 = Color32::from_rgb(64, 67, 82);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

pub const BAR_FILL: Color32 = Color32::from_rgb(66, 133, 244);
pub const BAR_INVALID: Color32 = Color32::from_rgb(90, 92, 104);
pub const PROGRESS_FILL: Color32 = Color32::from_rgb(38, 92, 190);
pub const ARROW: Color32 = Color32::from_rgb(155, 160, 178);
pub const ARROW_ACTIVE: Color32 = Color32::from_rgb(251, 140, 0);

pub const TODAY_FILL: Color32 = Color32::from_rgba_premultiplied(120, 100, 20, 60);
pub const HOLIDAY_FILL: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 60);
pub const WORKDAY_FILL: Color32 = Color32::from_rgba_premultiplied(20, 70, 40, 50);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HANDLE_PILL_WIDTH: f32 = 4.0;
pub const POPUP_WIDTH: f32 = 220.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub fn highlight_fill(kind: HighlightKind) -> Color32 {
    match kind {
        HighlightKind::Today => TODAY_FILL,
        HighlightKind::Holiday => HOLIDAY_FILL,
        HighlightKind::Workday => WORKDAY_FILL,
    }
}

/// Bar fill for a task's `custom_class`; unknown classes use the default.
pub fn bar_fill(custom_class: Option<&str>) -> Color32 {
    match custom_class {
        Some("bar-milestone") => Color32::from_rgb(171, 71, 188),
        Some("bar-critical") => Color32::from_rgb(229, 57, 53),
        Some("bar-done") => Color32::from_rgb(52, 168, 83),
        _ => BAR_FILL,
    }
}

pub fn arrow_stroke(active: bool) -> Stroke {
    if active {
        Stroke::new(2.0, ARROW_ACTIVE)
    } else {
        Stroke::new(1.4, ARROW)
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn install_fonts(ctx: &egui::Context) {
    // Phosphor as a fallback font so icons render inline with text.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    visuals.widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
