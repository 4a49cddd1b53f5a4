use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportSort {
    #[default]
    Name,
    Department,
    AverageScore,
    LessonsCompleted,
    LastActivity,
}

impl FromStr for ReportSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "department" => Ok(Self::Department),
            "average-score" | "score" => Ok(Self::AverageScore),
            "lessons-completed" | "lessons" => Ok(Self::LessonsCompleted),
            "last-activity" | "activity" => Ok(Self::LastActivity),
            other => Err(format!("unknown report sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Search and ordering applied to a list of report rows.
///
/// An empty search keeps every row. Without a sort key rows stay in the
/// order they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub search: String,
    pub sort: Option<(ReportSort, SortDirection)>,
}

impl ReportQuery {
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            sort: None,
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, key: ReportSort, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }

    /// Case-insensitive substring match on name or department.
    #[must_use]
    pub fn matches(&self, report: &UserReport) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        report.user.name().to_lowercase().contains(&needle)
            || report.user.department().to_lowercase().contains(&needle)
    }

    /// Filter then stably sort `reports`.
    #[must_use]
    pub fn apply(&self, reports: &[UserReport]) -> Vec<UserReport> {
        let mut rows: Vec<UserReport> = reports
            .iter()
            .filter(|report| self.matches(report))
            .cloned()
            .collect();

        if let Some((key, direction)) = self.sort {
            rows.sort_by(|a, b| {
                let ordering = compare(key, a, b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }
}

fn compare(key: ReportSort, a: &UserReport, b: &UserReport) -> Ordering {
    match key {
        ReportSort::Name => a.user.name().to_lowercase().cmp(&b.user.name().to_lowercase()),
        ReportSort::Department => a
            .user
            .department()
            .to_lowercase()
            .cmp(&b.user.department().to_lowercase()),
        ReportSort::AverageScore => a.average_score.cmp(&b.average_score),
        ReportSort::LessonsCompleted => a.completed_lessons.cmp(&b.completed_lessons),
        ReportSort::LastActivity => a.last_activity.cmp(&b.last_activity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::build_reports;
    use crate::report::tests::{course, progress_with, student};

    fn reports() -> Vec<UserReport> {
        let users = vec![
            student("u1", "Мария Иванова", "Sales", 3),
            student("u2", "anton", "IT Support", 1),
            student("u3", "Boris", "Sales", 2),
        ];
        let c1 = course("c1", 4);
        let progress = vec![
            progress_with(&users[0], &c1, 1, &[90]),
            progress_with(&users[1], &c1, 3, &[40]),
            progress_with(&users[2], &c1, 1, &[90]),
        ];
        build_reports(&users, &[c1], &progress)
    }

    fn names(rows: &[UserReport]) -> Vec<&str> {
        rows.iter().map(|r| r.user.name()).collect()
    }

    #[test]
    fn search_is_case_insensitive_on_name_and_department() {
        let rows = reports();
        assert_eq!(names(&ReportQuery::search("SALES").apply(&rows)).len(), 2);
        assert_eq!(
            names(&ReportQuery::search("мария").apply(&rows)),
            vec!["Мария Иванова"]
        );
        assert_eq!(names(&ReportQuery::search("  ").apply(&rows)).len(), 3);
        assert!(ReportQuery::search("nobody").apply(&rows).is_empty());
    }

    #[test]
    fn sort_is_stable_and_reversible() {
        let rows = reports();
        let by_score = ReportQuery::default()
            .sorted_by(ReportSort::AverageScore, SortDirection::Descending)
            .apply(&rows);
        // equal scores keep build order
        assert_eq!(names(&by_score), vec!["Мария Иванова", "Boris", "anton"]);

        let by_name = ReportQuery::default()
            .sorted_by(ReportSort::Name, SortDirection::Ascending)
            .apply(&rows);
        assert_eq!(names(&by_name), vec!["anton", "Boris", "Мария Иванова"]);

        let by_activity = ReportQuery::default()
            .sorted_by(ReportSort::LastActivity, SortDirection::Descending)
            .apply(&rows);
        assert_eq!(names(&by_activity)[0], "anton");
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("score".parse::<ReportSort>().unwrap(), ReportSort::AverageScore);
        assert_eq!(
            "last-activity".parse::<ReportSort>().unwrap(),
            ReportSort::LastActivity
        );
        assert!("age".parse::<ReportSort>().is_err());
    }
}
