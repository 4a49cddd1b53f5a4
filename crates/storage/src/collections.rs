//! Repositories that keep each collection as one JSON array in a
//! [`KeyValueStore`].
//!
//! Every write reads the whole collection, replaces or appends the entity
//! and writes the array back. A missing key is an empty collection, and so
//! is a value that is not a JSON array; the latter is logged and will be
//! overwritten by the next write. Array items that do not decode are logged,
//! hidden from reads and written back unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use lms_core::model::{Course, CourseId, Quiz, QuizId, User, UserId, UserProgress};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::repository::{
    CourseRepository, KeyValueStore, ProgressRepository, QuizRepository, StorageError,
    UserRepository, keys,
};

/// One item of a stored collection.
enum Entry<T> {
    Decoded(T),
    Undecodable(Value),
}

impl<T> Entry<T> {
    fn decoded(self) -> Option<T> {
        match self {
            Entry::Decoded(item) => Some(item),
            Entry::Undecodable(_) => None,
        }
    }

    fn is_decoded_and(&self, predicate: impl Fn(&T) -> bool) -> bool {
        matches!(self, Entry::Decoded(item) if predicate(item))
    }
}

#[derive(Clone)]
pub struct JsonCollections {
    store: Arc<dyn KeyValueStore>,
}

impl JsonCollections {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        Ok(self
            .load_entries(key)
            .await?
            .into_iter()
            .filter_map(Entry::decoded)
            .collect())
    }

    async fn load_entries<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<Entry<T>>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };
        let values = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(key, error = %err, "stored collection is malformed; treating it as empty");
                return Ok(Vec::new());
            }
        };
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match <T as Deserialize>::deserialize(&value) {
                Ok(item) => Entry::Decoded(item),
                Err(err) => {
                    warn!(key, index, error = %err, "skipping stored item that does not decode");
                    Entry::Undecodable(value)
                }
            })
            .collect())
    }

    async fn save<T: Serialize>(
        &self,
        key: &str,
        entries: Vec<Entry<T>>,
    ) -> Result<(), StorageError> {
        let count = entries.len();
        let values = entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Decoded(item) => serde_json::to_value(item),
                Entry::Undecodable(value) => Ok(value),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let raw = serde_json::to_string(&values)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(key, &raw).await?;
        debug!(key, count, "collection written");
        Ok(())
    }

    /// Replace the first decoded item matching `same` or append `item`.
    async fn upsert<T, F>(&self, key: &str, item: &T, same: F) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
        F: Fn(&T) -> bool + Send,
    {
        let mut entries: Vec<Entry<T>> = self.load_entries(key).await?;
        match entries.iter_mut().find(|entry| entry.is_decoded_and(&same)) {
            Some(existing) => *existing = Entry::Decoded(item.clone()),
            None => entries.push(Entry::Decoded(item.clone())),
        }
        self.save(key, entries).await
    }

    async fn delete<T, F>(&self, key: &str, target: F) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: Fn(&T) -> bool + Send,
    {
        let mut entries: Vec<Entry<T>> = self.load_entries(key).await?;
        let before = entries.len();
        entries.retain(|entry| !entry.is_decoded_and(&target));
        if entries.len() == before {
            return Err(StorageError::NotFound);
        }
        self.save(key, entries).await
    }
}

#[async_trait]
impl UserRepository for JsonCollections {
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.load(keys::USERS).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let users: Vec<User> = self.load(keys::USERS).await?;
        Ok(users.into_iter().find(|user| user.id() == id))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        self.upsert(keys::USERS, user, |existing: &User| existing.id() == user.id())
            .await
    }

    async fn current_user_id(&self) -> Result<Option<UserId>, StorageError> {
        let Some(raw) = self.store.get(keys::CURRENT_USER).await? else {
            return Ok(None);
        };
        // A plain id, a JSON string, or a whole user object with an `id` field.
        let id = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::String(id)) => id,
            Ok(serde_json::Value::Object(map)) => {
                let Some(id) = map.get("id").and_then(serde_json::Value::as_str) else {
                    warn!("stored current user has no id; ignoring it");
                    return Ok(None);
                };
                id.to_owned()
            }
            Ok(_) | Err(_) => raw,
        };
        Ok(id.trim().parse::<UserId>().ok())
    }

    async fn set_current_user(&self, id: &UserId) -> Result<(), StorageError> {
        self.store.set(keys::CURRENT_USER, id.as_str()).await
    }

    async fn clear_current_user(&self) -> Result<(), StorageError> {
        self.store.remove(keys::CURRENT_USER).await
    }
}

#[async_trait]
impl CourseRepository for JsonCollections {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        self.load(keys::COURSES).await
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let courses: Vec<Course> = self.load(keys::COURSES).await?;
        Ok(courses.into_iter().find(|course| course.id() == id))
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        self.upsert(keys::COURSES, course, |existing: &Course| {
            existing.id() == course.id()
        })
        .await
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError> {
        self.delete(keys::COURSES, |course: &Course| course.id() == id)
            .await
    }
}

#[async_trait]
impl QuizRepository for JsonCollections {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        self.load(keys::QUIZZES).await
    }

    async fn get_quiz(&self, id: &QuizId) -> Result<Option<Quiz>, StorageError> {
        let quizzes: Vec<Quiz> = self.load(keys::QUIZZES).await?;
        Ok(quizzes.into_iter().find(|quiz| quiz.id() == id))
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        self.upsert(keys::QUIZZES, quiz, |existing: &Quiz| existing.id() == quiz.id())
            .await
    }

    async fn delete_quiz(&self, id: &QuizId) -> Result<(), StorageError> {
        self.delete(keys::QUIZZES, |quiz: &Quiz| quiz.id() == id)
            .await
    }
}

#[async_trait]
impl ProgressRepository for JsonCollections {
    async fn list_progress(&self) -> Result<Vec<UserProgress>, StorageError> {
        self.load(keys::PROGRESS).await
    }

    async fn list_progress_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserProgress>, StorageError> {
        let all: Vec<UserProgress> = self.load(keys::PROGRESS).await?;
        Ok(all
            .into_iter()
            .filter(|progress| progress.user_id() == user_id)
            .collect())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let all: Vec<UserProgress> = self.load(keys::PROGRESS).await?;
        Ok(all
            .into_iter()
            .find(|progress| progress.is_for(user_id, course_id)))
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        self.upsert(keys::PROGRESS, progress, |existing: &UserProgress| {
            existing.is_for(progress.user_id(), progress.course_id())
        })
        .await
    }
}
