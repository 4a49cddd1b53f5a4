use async_trait::async_trait;
use lms_core::model::{Course, CourseId, Quiz, QuizId, User, UserId, UserProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::collections::JsonCollections;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE STORE ───────────────────────────────────────────────────────────
//

/// Keys under which each collection is stored as a JSON array.
pub mod keys {
    pub const USERS: &str = "lms_users";
    pub const COURSES: &str = "lms_courses";
    pub const QUIZZES: &str = "lms_quizzes";
    pub const PROGRESS: &str = "lms_progress";
    pub const CURRENT_USER: &str = "lms_current_user";
}

/// Persistence substrate: string values addressed by string keys.
///
/// A missing key reads as `None`. `set` replaces the whole value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory key-value store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw values, e.g. to simulate legacy data.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Arc::new(Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            )),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

//
// ─── REPOSITORIES ──────────────────────────────────────────────────────────────
//

/// Users and the current-user selection.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Insert or replace a user by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be read.
    async fn current_user_id(&self) -> Result<Option<UserId>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be written.
    async fn set_current_user(&self, id: &UserId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be removed.
    async fn clear_current_user(&self) -> Result<(), StorageError>;
}

/// Courses with their embedded lessons.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// Insert or replace a course by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Delete a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no course has that id.
    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError>;
}

/// Quizzes with their embedded questions.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_quiz(&self, id: &QuizId) -> Result<Option<Quiz>, StorageError>;

    /// Insert or replace a quiz by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Delete a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no quiz has that id.
    async fn delete_quiz(&self, id: &QuizId) -> Result<(), StorageError>;
}

/// Progress records keyed by `(user, course)`. Records are never deleted.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_progress(&self) -> Result<Vec<UserProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_progress_for_user(&self, user_id: &UserId)
    -> Result<Vec<UserProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<UserProgress>, StorageError>;

    /// Insert or replace the record for its `(user, course)` pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    /// Serve every collection from the given key-value store.
    #[must_use]
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        let collections = JsonCollections::new(store);
        let users: Arc<dyn UserRepository> = Arc::new(collections.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(collections.clone());
        let quizzes: Arc<dyn QuizRepository> = Arc::new(collections.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(collections);
        Self {
            users,
            courses,
            quizzes,
            progress,
        }
    }
}
