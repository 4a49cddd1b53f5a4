use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use lms_core::model::{
    Course, CourseId, LessonId, QuestionDraft, QuestionId, QuestionKind, Quiz, QuizDraft, QuizId,
    RawAnswer, Role, Submission, User, UserId, UserProgress,
};
use lms_core::progress::complete_lesson;
use lms_core::scoring::QuizScorer;
use storage::repository::Storage;

/// Seed a database with a demo course, a quiz and students with progress.
#[derive(Debug, Clone, Parser)]
#[command(name = "seed")]
struct Args {
    /// SQLite URL.
    #[arg(
        long = "db",
        env = "LMS_DB_URL",
        default_value = "sqlite:dev.sqlite3",
        value_parser = parse_db_url
    )]
    db_url: String,

    /// Number of demo students.
    #[arg(long, env = "LMS_SEED_STUDENTS", default_value_t = 5)]
    students: u32,

    /// Lessons in the demo course.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    lessons: u32,

    /// Fixed current time (RFC3339) for deterministic seeding.
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

fn parse_db_url(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("expected a non-empty SQLite URL".into());
    }
    Ok(raw.to_owned())
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| format!("expected RFC3339: {err}"))
}

const DEPARTMENTS: [&str; 3] = ["Sales", "IT", "Logistics"];
const NAMES: [&str; 5] = [
    "Anna Petrova",
    "Boris Sokolov",
    "Clara Weiss",
    "Dmitri Orlov",
    "Eva Lindqvist",
];

fn demo_course(lessons: u32) -> Result<Course, Box<dyn std::error::Error>> {
    let mut course = Course::new(
        CourseId::new("course-demo"),
        "Workplace safety",
        "Demo course created by the seed tool",
        true,
    )?;
    for i in 1..=lessons {
        course.append_lesson(
            LessonId::new(format!("lesson-demo-{i}")),
            format!("Part {i}"),
            format!("## Part {i}\n\nRead carefully."),
        )?;
    }
    Ok(course)
}

fn demo_quiz() -> Result<Quiz, Box<dyn std::error::Error>> {
    let mut quiz = Quiz::new(
        QuizId::new("quiz-demo"),
        QuizDraft {
            title: "Safety check".into(),
            description: "Two quick questions".into(),
            time_limit_secs: Some(300),
            passing_score: Some(70),
        },
    )?;
    quiz.add_question(
        QuestionDraft {
            kind: QuestionKind::TrueFalse,
            text: "Fire exits must stay unlocked.".into(),
            options: None,
            correct_answer: "true".into(),
            points: Some(10),
        }
        .validate(QuestionId::new("q-demo-1"))?,
    )?;
    quiz.add_question(
        QuestionDraft {
            kind: QuestionKind::Single,
            text: "Which extinguisher is used for electrical fires?".into(),
            options: Some(vec!["Water".into(), "Foam".into(), "CO2".into()]),
            correct_answer: RawAnswer::Number(2),
            points: Some(20),
        }
        .validate(QuestionId::new("q-demo-2"))?,
    )?;
    Ok(quiz)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let course = demo_course(args.lessons)?;
    let quiz = demo_quiz()?;
    storage.courses.upsert_course(&course).await?;
    storage.quizzes.upsert_quiz(&quiz).await?;

    let scorer = QuizScorer::default();
    let ordered: Vec<_> = course.lessons_in_order().into_iter().cloned().collect();
    for i in 0..args.students {
        let idx = i as usize;
        let active_at = now - Duration::days(i64::from(i));
        let student = User::new(
            UserId::new(format!("user-demo-{}", i + 1)),
            NAMES[idx % NAMES.len()],
            DEPARTMENTS[idx % DEPARTMENTS.len()],
            Role::Student,
            active_at,
        )?;
        storage.users.upsert_user(&student).await?;

        let mut progress = UserProgress::new(student.id().clone(), course.id().clone(), active_at);
        for lesson in ordered.iter().take(idx % (ordered.len() + 1)) {
            complete_lesson(&mut progress, lesson, &course, active_at);
        }
        if idx % 2 == 0 {
            let mut answers = Submission::new();
            answers.insert(QuestionId::new("q-demo-1"), "true".into());
            answers.insert(QuestionId::new("q-demo-2"), RawAnswer::Number((idx % 3) as i64));
            let result = scorer.score_quiz(&quiz, student.id(), answers, active_at);
            progress.record_quiz_result(result, active_at);
        }
        storage.progress.upsert_progress(&progress).await?;
    }

    println!(
        "Seeded course {} ({} lessons), quiz {} and {} students into {}",
        course.id(),
        course.lesson_count(),
        quiz.id(),
        args.students,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
