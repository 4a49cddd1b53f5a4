use std::sync::Arc;

use lms_core::report::{
    DashboardStats, ReportQuery, UserReport, build_reports, dashboard_stats, to_csv, to_json,
};
use storage::repository::{CourseRepository, ProgressRepository, QuizRepository, UserRepository};
use tracing::debug;

use crate::error::ReportServiceError;

/// Administrator reports over a fresh snapshot of every collection.
#[derive(Clone)]
pub struct ReportService {
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        quizzes: Arc<dyn QuizRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            users,
            courses,
            quizzes,
            progress,
        }
    }

    /// Student rows filtered and sorted by `query`.
    ///
    /// # Errors
    ///
    /// Returns `ReportServiceError::Storage` if repository access fails.
    pub async fn reports(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<UserReport>, ReportServiceError> {
        let users = self.users.list_users().await?;
        let courses = self.courses.list_courses().await?;
        let progress = self.progress.list_progress().await?;

        let rows = build_reports(&users, &courses, &progress);
        let visible = query.apply(&rows);
        debug!(total = rows.len(), visible = visible.len(), "reports built");
        Ok(visible)
    }

    /// # Errors
    ///
    /// Returns `ReportServiceError::Storage` if repository access fails.
    pub async fn export_csv(&self, query: &ReportQuery) -> Result<String, ReportServiceError> {
        Ok(to_csv(&self.reports(query).await?))
    }

    /// # Errors
    ///
    /// Returns `ReportServiceError::Storage` or `ReportServiceError::Export`.
    pub async fn export_json(&self, query: &ReportQuery) -> Result<String, ReportServiceError> {
        Ok(to_json(&self.reports(query).await?)?)
    }

    /// # Errors
    ///
    /// Returns `ReportServiceError::Storage` if repository access fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, ReportServiceError> {
        let users = self.users.list_users().await?;
        let courses = self.courses.list_courses().await?;
        let quiz_count = self.quizzes.list_quizzes().await?.len();
        let progress = self.progress.list_progress().await?;
        Ok(dashboard_stats(&users, &courses, quiz_count, &progress))
    }
}
