//! Administrator-facing aggregation of student progress.
//!
//! [`build_reports`] folds the catalog and every progress record into one
//! [`UserReport`] per student. Filtering, sorting and export live in
//! [`view`] and [`export`].

mod export;
mod view;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Course, CourseId, User, UserId, UserProgress};
use crate::progress::rounded_percent;

pub use export::{CSV_DATE_FORMAT, CSV_HEADERS, ExportError, to_csv, to_json};
pub use view::{ReportQuery, ReportSort, SortDirection};

//
// ─── USER REPORT ───────────────────────────────────────────────────────────────
//

/// Summary row for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
    pub user: User,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub average_score: u8,
    pub completed_courses: usize,
    pub total_courses: usize,
    pub last_activity: DateTime<Utc>,
}

impl UserReport {
    /// Share of catalog lessons completed, rounded to a whole percent.
    #[must_use]
    pub fn lesson_percentage(&self) -> u8 {
        rounded_percent(self.completed_lessons as u64, self.total_lessons as u64)
    }

    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        ProgressStatus::from_counts(self.completed_lessons, self.total_lessons)
    }
}

/// Badge shown next to a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressStatus {
    Completed,
    InProgress,
    Started,
    NotStarted,
}

impl ProgressStatus {
    /// Completed at 100%, in progress from 50%, started above 0%.
    #[must_use]
    pub fn from_counts(completed: usize, total: usize) -> Self {
        if total == 0 || completed == 0 {
            return ProgressStatus::NotStarted;
        }
        // Compare `completed / total` against the thresholds without rounding.
        if completed >= total {
            ProgressStatus::Completed
        } else if completed * 2 >= total {
            ProgressStatus::InProgress
        } else {
            ProgressStatus::Started
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ProgressStatus::Completed => "Completed",
            ProgressStatus::InProgress => "In progress",
            ProgressStatus::Started => "Started",
            ProgressStatus::NotStarted => "Not started",
        }
    }
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// One row per student, in the order the users are given.
///
/// Admins are skipped. Progress records for courses that are no longer in
/// the catalog are ignored. The result does not depend on the order of
/// `courses` or `progress`.
#[must_use]
pub fn build_reports(
    users: &[User],
    courses: &[Course],
    progress: &[UserProgress],
) -> Vec<UserReport> {
    let total_lessons: usize = courses.iter().map(Course::lesson_count).sum();

    users
        .iter()
        .filter(|user| user.is_student())
        .map(|user| {
            let mut completed_lessons = 0;
            let mut completed_courses = 0;
            let mut score_sum: u64 = 0;
            let mut score_count: u64 = 0;

            for course in courses {
                let Some(record) = find_progress(progress, user.id(), course.id()) else {
                    continue;
                };
                completed_lessons += record.completed_count();
                if record.is_course_completed() {
                    completed_courses += 1;
                }
                for result in record.quiz_results() {
                    score_sum += u64::from(result.score());
                    score_count += 1;
                }
            }

            UserReport {
                user: user.clone(),
                completed_lessons,
                total_lessons,
                average_score: rounded_mean(score_sum, score_count),
                completed_courses,
                total_courses: courses.len(),
                last_activity: user.last_activity(),
            }
        })
        .collect()
}

/// `round(sum / count)` with halves rounded up; 0 when `count` is 0.
fn rounded_mean(sum: u64, count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let mean = (2 * u128::from(sum) + u128::from(count)) / (2 * u128::from(count));
    u8::try_from(mean.min(100)).unwrap_or(100)
}

/// The progress record of `user` in `course`. The last duplicate wins.
fn find_progress<'p>(
    progress: &'p [UserProgress],
    user: &UserId,
    course: &CourseId,
) -> Option<&'p UserProgress> {
    progress.iter().rev().find(|record| record.is_for(user, course))
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

/// Headline numbers for the administrator dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_courses: usize,
    pub total_quizzes: usize,
    /// Mean completion percentage over every (student, course) pair that has
    /// a progress record.
    pub average_progress: u8,
    /// Up to five students, most recently active first.
    pub recent_activity: Vec<User>,
}

pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[must_use]
pub fn dashboard_stats(
    users: &[User],
    courses: &[Course],
    quiz_count: usize,
    progress: &[UserProgress],
) -> DashboardStats {
    let students: Vec<&User> = users.iter().filter(|u| u.is_student()).collect();

    let mut percent_sum = 0.0_f64;
    let mut pairs = 0_u32;
    for student in &students {
        for course in courses {
            let Some(record) = find_progress(progress, student.id(), course.id()) else {
                continue;
            };
            let total = course.lesson_count();
            if total > 0 {
                percent_sum += record.completed_count() as f64 / total as f64 * 100.0;
            }
            pairs += 1;
        }
    }
    let average_progress = if pairs == 0 {
        0
    } else {
        (percent_sum / f64::from(pairs)).round().clamp(0.0, 100.0) as u8
    };

    let mut recent: Vec<&User> = students.clone();
    recent.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

    DashboardStats {
        total_students: students.len(),
        total_courses: courses.len(),
        total_quizzes: quiz_count,
        average_progress,
        recent_activity: recent
            .into_iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .cloned()
            .collect(),
    }
}
