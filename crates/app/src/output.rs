//! Terminal tables.

use comfy_table::{Cell, Table};
use lms_core::gate::LessonState;
use lms_core::model::Course;
use lms_core::progress::{CompletionOutcome, CourseStatus};
use lms_core::report::{CSV_DATE_FORMAT, DashboardStats, UserReport};
use services::CourseSummary;

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn course_status(status: CourseStatus) -> &'static str {
    match status {
        CourseStatus::NotStarted => "Not started",
        CourseStatus::InProgress => "In progress",
        CourseStatus::Completed => "Completed",
    }
}

pub fn courses_table(courses: &[Course]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Lessons", "Sequential"]);
    for course in courses {
        table.add_row(vec![
            Cell::new(course.id()),
            Cell::new(course.title()),
            Cell::new(course.lesson_count()),
            Cell::new(yes_no(course.is_sequential())),
        ]);
    }
    table
}

pub fn summaries_table(summaries: &[CourseSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Course", "Completed", "Progress", "Status"]);
    for summary in summaries {
        let completion = &summary.completion;
        table.add_row(vec![
            Cell::new(summary.course.title()),
            Cell::new(format!("{}/{}", completion.completed, completion.total)),
            Cell::new(format!("{}%", completion.percentage)),
            Cell::new(course_status(completion.status)),
        ]);
    }
    table
}

pub fn lessons_table(lessons: &[LessonState<'_>]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Id", "Title", "Completed", "Available"]);
    for state in lessons {
        table.add_row(vec![
            Cell::new(state.index + 1),
            Cell::new(state.lesson.id()),
            Cell::new(state.lesson.title()),
            Cell::new(yes_no(state.completed)),
            Cell::new(yes_no(state.available)),
        ]);
    }
    table
}

pub fn completion_line(outcome: CompletionOutcome) -> &'static str {
    match outcome {
        CompletionOutcome::Completed {
            course_completed: true,
        } => "lesson completed; course completed",
        CompletionOutcome::Completed {
            course_completed: false,
        } => "lesson completed",
        CompletionOutcome::AlreadyCompleted => "lesson was already completed",
        CompletionOutcome::NotInCourse => "lesson does not belong to this course",
    }
}

pub fn reports_table(rows: &[UserReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Department",
        "Lessons",
        "Average score",
        "Courses",
        "Status",
        "Last activity",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.user.name()),
            Cell::new(row.user.department()),
            Cell::new(format!(
                "{}/{} ({}%)",
                row.completed_lessons,
                row.total_lessons,
                row.lesson_percentage()
            )),
            Cell::new(format!("{}%", row.average_score)),
            Cell::new(format!("{}/{}", row.completed_courses, row.total_courses)),
            Cell::new(row.status().label()),
            Cell::new(row.last_activity.format(CSV_DATE_FORMAT)),
        ]);
    }
    table
}

pub fn stats_table(stats: &DashboardStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Students"), Cell::new(stats.total_students)]);
    table.add_row(vec![Cell::new("Courses"), Cell::new(stats.total_courses)]);
    table.add_row(vec![Cell::new("Quizzes"), Cell::new(stats.total_quizzes)]);
    table.add_row(vec![
        Cell::new("Average progress"),
        Cell::new(format!("{}%", stats.average_progress)),
    ]);
    for user in &stats.recent_activity {
        table.add_row(vec![
            Cell::new("Recently active"),
            Cell::new(format!(
                "{} ({}) {}",
                user.name(),
                user.department(),
                user.last_activity().format("%d.%m.%Y %H:%M")
            )),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{CourseId, LessonId};

    #[test]
    fn courses_table_lists_each_course() {
        let mut course = Course::new(CourseId::new("c1"), "Safety", "", true).unwrap();
        course.append_lesson(LessonId::new("l1"), "One", "").unwrap();
        let rendered = courses_table(&[course]).to_string();
        assert!(rendered.contains("Safety"));
        assert!(rendered.contains("c1"));
        assert!(rendered.contains("yes"));
    }

    #[test]
    fn completion_lines_cover_every_outcome() {
        assert_eq!(
            completion_line(CompletionOutcome::Completed {
                course_completed: true
            }),
            "lesson completed; course completed"
        );
        assert_eq!(
            completion_line(CompletionOutcome::AlreadyCompleted),
            "lesson was already completed"
        );
    }
}
