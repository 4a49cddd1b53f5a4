use thiserror::Error;

use super::UserReport;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("failed to serialize reports: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column headers of the tabular export, in order.
pub const CSV_HEADERS: [&str; 8] = [
    "Name",
    "Department",
    "Lessons completed",
    "Lessons total",
    "Average score",
    "Courses completed",
    "Courses total",
    "Last activity",
];

/// Day-first date used for the last-activity column.
pub const CSV_DATE_FORMAT: &str = "%d.%m.%Y";

/// Comma-separated export: a header line then one line per row.
///
/// Text columns are always quoted, with embedded quotes doubled.
#[must_use]
pub fn to_csv(reports: &[UserReport]) -> String {
    let mut lines = Vec::with_capacity(reports.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for report in reports {
        lines.push(
            [
                quote(report.user.name()),
                quote(report.user.department()),
                report.completed_lessons.to_string(),
                report.total_lessons.to_string(),
                report.average_score.to_string(),
                report.completed_courses.to_string(),
                report.total_courses.to_string(),
                quote(&report.last_activity.format(CSV_DATE_FORMAT).to_string()),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Pretty-printed JSON array of the rows, user record nested.
///
/// # Errors
///
/// Returns `ExportError::Json` if serialization fails.
pub fn to_json(reports: &[UserReport]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(reports)?)
}
