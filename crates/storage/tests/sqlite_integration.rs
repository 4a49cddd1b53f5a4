use lms_core::model::{
    Course, CourseId, LessonId, QuestionDraft, QuestionId, QuestionKind, Quiz, QuizDraft, QuizId,
    RawAnswer, Role, User, UserId, UserProgress,
};
use lms_core::progress::complete_lesson;
use lms_core::scoring::QuizScorer;
use lms_core::time::fixed_now;
use storage::repository::{KeyValueStore, Storage, keys};
use storage::sqlite::SqliteStore;

#[tokio::test]
async fn sqlite_store_get_set_remove() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    store.migrate().await.expect("migrations are idempotent");

    assert_eq!(store.get("missing").await.unwrap(), None);
    store.set("k", "[1]").await.unwrap();
    store.set("k", "[1,2]").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[1,2]"));
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_storage_round_trips_collections() {
    let storage = Storage::sqlite("sqlite:file:memdb_collections?mode=memory&cache=shared")
        .await
        .expect("storage");

    let student = User::new(
        UserId::new("user-1"),
        "Anna",
        "Sales",
        Role::Student,
        fixed_now(),
    )
    .unwrap();
    storage.users.upsert_user(&student).await.unwrap();
    storage.users.set_current_user(student.id()).await.unwrap();

    let mut course = Course::new(CourseId::new("course-1"), "Safety", "", true).unwrap();
    let lesson = course
        .append_lesson(LessonId::new("lesson-1"), "Intro", "# Hello")
        .unwrap()
        .clone();
    storage.courses.upsert_course(&course).await.unwrap();

    let mut quiz = Quiz::new(
        QuizId::new("quiz-1"),
        QuizDraft {
            title: "Check".into(),
            time_limit_secs: Some(600),
            ..QuizDraft::default()
        },
    )
    .unwrap();
    quiz.add_question(
        QuestionDraft {
            kind: QuestionKind::Sequence,
            text: "Order the steps".into(),
            options: Some(vec!["a".into(), "b".into()]),
            correct_answer: RawAnswer::list(["b", "a"]),
            points: None,
        }
        .validate(QuestionId::new("q1"))
        .unwrap(),
    )
    .unwrap();
    storage.quizzes.upsert_quiz(&quiz).await.unwrap();

    let mut progress = UserProgress::new(student.id().clone(), course.id().clone(), fixed_now());
    complete_lesson(&mut progress, &lesson, &course, fixed_now());
    let answers = [(QuestionId::new("q1"), RawAnswer::list(["b", "a"]))]
        .into_iter()
        .collect();
    let result = QuizScorer::default().score_quiz(&quiz, student.id(), answers, fixed_now());
    progress.record_quiz_result(result, fixed_now());
    storage.progress.upsert_progress(&progress).await.unwrap();

    assert_eq!(
        storage.users.current_user_id().await.unwrap(),
        Some(UserId::new("user-1"))
    );
    assert_eq!(
        storage.courses.get_course(course.id()).await.unwrap(),
        Some(course.clone())
    );
    assert_eq!(
        storage.quizzes.get_quiz(quiz.id()).await.unwrap(),
        Some(quiz)
    );
    let stored = storage
        .progress
        .get_progress(student.id(), course.id())
        .await
        .unwrap()
        .expect("progress");
    assert!(stored.is_course_completed());
    assert_eq!(stored.quiz_results()[0].score(), 100);
}

#[tokio::test]
async fn sqlite_malformed_collection_reads_as_empty() {
    let store = SqliteStore::connect("sqlite:file:memdb_malformed?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    store.set(keys::COURSES, "not json").await.unwrap();

    let storage = Storage::from_store(std::sync::Arc::new(store));
    assert!(storage.courses.list_courses().await.unwrap().is_empty());
}
