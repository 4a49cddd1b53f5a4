#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment_service;
pub mod course_service;
pub mod error;
pub mod progress_service;
pub mod quiz_service;
pub mod report_service;
pub mod user_service;

pub use lms_core::Clock;

pub use app_services::{AppServices, ensure_default_data};
pub use assessment_service::AssessmentService;
pub use course_service::CourseService;
pub use error::{
    AppServicesError, CourseServiceError, ProgressServiceError, QuizServiceError,
    ReportServiceError, UserServiceError,
};
pub use progress_service::{CourseSummary, CourseView, LessonView, ProgressService};
pub use quiz_service::QuizService;
pub use report_service::ReportService;
pub use user_service::UserService;
