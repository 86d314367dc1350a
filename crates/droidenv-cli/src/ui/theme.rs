//! UI Theme - colors, icons and formatting helpers shared by every renderer.

use crossterm::style::Color;
use droidenv_schema::{StepOutcome, StepStatus};

/// Default theme for droidenv output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
}

impl Theme {
    /// Icon and color for a step outcome.
    pub fn outcome(&self, outcome: StepOutcome) -> (&'static str, Color) {
        match outcome {
            StepOutcome::Success => (self.icons.success, self.colors.success),
            StepOutcome::Warning => (self.icons.warning, self.colors.warning),
            StepOutcome::Error => (self.icons.error, self.colors.error),
        }
    }

    /// Icon and color for a summarized step.
    pub fn status(&self, status: StepStatus) -> (&'static str, Color) {
        match status {
            StepStatus::Success => self.outcome(StepOutcome::Success),
            StepStatus::Warning => self.outcome(StepOutcome::Warning),
            StepStatus::Error => self.outcome(StepOutcome::Error),
            StepStatus::Skipped => (self.icons.pending, self.colors.secondary),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Step and app names
    pub name: Color,
    /// Sizes, durations and secondary info
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// In-progress items
    pub active: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Blue,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Icons {
    /// Pending / skipped (○)
    pub pending: &'static str,
    /// In progress (●)
    pub active: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// `42s`, `3m 05s`, `1h 02m`
pub fn format_duration(secs: f64) -> String {
    if secs < 10.0 {
        return format!("{secs:.1}s");
    }
    let total = secs.round() as u64;
    match (total / 3600, (total % 3600) / 60, total % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, _) => format!("{h}h {m:02}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(12_288), "12.0 KB");
        assert_eq!(format_size(1024 * 1024 * 5), "5.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1.34), "1.3s");
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(185.0), "3m 05s");
        assert_eq!(format_duration(3720.0), "1h 02m");
    }

    #[test]
    fn test_skipped_uses_pending_icon() {
        let theme = Theme::default();
        assert_eq!(theme.status(StepStatus::Skipped).0, "○");
        assert_eq!(theme.outcome(StepOutcome::Error).0, "✗");
    }
}
