use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timeline::ViewMode;
use crate::error::{GanttError, Result};

/// Which pointer gesture opens the task detail popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupTrigger {
    #[default]
    Click,
    Mouseover,
    Dblclick,
}

/// A calendar day with a non-default working status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Chart configuration. Every field has a default, so a partial JSON object
/// is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttOptions {
    pub header_height: f64,
    /// Pixels per column. Overwritten by the view-mode table on every view change.
    pub column_width: f64,
    /// Hours per column. Overwritten by the view-mode table on every view change.
    pub step: f64,
    pub bar_height: f64,
    pub bar_corner_radius: f64,
    pub arrow_curve: f64,
    pub padding: f64,
    pub view_mode: ViewMode,
    pub view_modes: Vec<ViewMode>,
    /// strftime pattern used when echoing task dates back to callers.
    pub date_format: String,
    pub popup_trigger: PopupTrigger,
    pub language: String,
    pub sortable: bool,
    pub drag_enabled: bool,
    pub special_days: Vec<SpecialDay>,
}

impl Default for GanttOptions {
    fn default() -> Self {
        Self {
            header_height: 50.0,
            column_width: 30.0,
            step: 24.0,
            bar_height: 20.0,
            bar_corner_radius: 3.0,
            arrow_curve: 5.0,
            padding: 18.0,
            view_mode: ViewMode::Day,
            view_modes: ViewMode::ALL.to_vec(),
            date_format: "%Y-%m-%d".to_string(),
            popup_trigger: PopupTrigger::Click,
            language: "en".to_string(),
            sortable: false,
            drag_enabled: true,
            special_days: Vec::new(),
        }
    }
}

impl GanttOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: GanttOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values that would make the pixel mapping degenerate.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("column_width", self.column_width),
            ("step", self.step),
            ("bar_height", self.bar_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GanttError::InvalidOption {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        let non_negative = [
            ("header_height", self.header_height),
            ("padding", self.padding),
            ("arrow_curve", self.arrow_curve),
            ("bar_corner_radius", self.bar_corner_radius),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GanttError::InvalidOption {
                    name,
                    reason: format!("must be zero or positive, got {value}"),
                });
            }
        }
        Ok(())
    }

    pub fn special_day(&self, date: NaiveDate) -> Option<&SpecialDay> {
        self.special_days.iter().find(|d| d.date == date)
    }

    /// Height of one task row: a bar plus its padding.
    pub fn row_height(&self) -> f64 {
        self.bar_height + self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options = GanttOptions::from_json_str(
            r#"{ "view_mode": "Quarter Day", "sortable": true, "popup_trigger": "mouseover",
                 "special_days": [{ "date": "2024-01-06", "is_holiday": true, "memo": "Epiphany" }] }"#,
        )
        .unwrap();
        assert_eq!(options.view_mode, ViewMode::QuarterDay);
        assert!(options.sortable);
        assert_eq!(options.popup_trigger, PopupTrigger::Mouseover);
        assert_eq!(options.bar_height, 20.0);
        assert_eq!(options.padding, 18.0);
        let epiphany = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(
            options.special_day(epiphany).and_then(|d| d.memo.as_deref()),
            Some("Epiphany")
        );
    }

    #[test]
    fn rejects_non_positive_bar_height() {
        let err = GanttOptions::from_json_str(r#"{ "bar_height": 0 }"#).unwrap_err();
        assert!(matches!(err, GanttError::InvalidOption { name: "bar_height", .. }));
    }

    #[test]
    fn rejects_unknown_view_mode_name() {
        assert!(GanttOptions::from_json_str(r#"{ "view_mode": "Fortnight" }"#).is_err());
    }
}
