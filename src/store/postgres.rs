// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, types::Json};
use webauthn_rs::prelude::Passkey;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamStatus, ExamSummary, NewExam},
        question::{Question, QuestionType},
        submission::{Answers, Evaluations, NewSubmission, Submission},
        user::{NewUser, Role, User},
    },
    store::{Repository, default_roll},
};

const USER_COLUMNS: &str =
    "id, username, email, password, role, name, roll, face_descriptor, created_at";

const SUBMISSION_COLUMNS: &str = "id, exam_id, student_id, student_name, roll_number, answers, \
     auto_score, auto_total, score, total, percentage, tab_switches, manual_evaluations, submitted_at";

const EXAM_SUMMARY_SELECT: &str = r#"
    SELECT e.id, e.title, e.category, e.duration_minutes, e.created_by, e.status, e.created_at,
           COUNT(q.question_id) AS total_questions
    FROM exams e
    LEFT JOIN questions q ON q.exam_id = e.id
"#;

/// Represents a row of the 'users' table.
#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    password: String,
    role: String,
    name: String,
    roll: Option<String>,
    face_descriptor: Option<Json<Vec<f64>>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AppError::InternalServerError(format!("Unknown role '{}'", row.role)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            role,
            name: row.name,
            roll: row.roll,
            face_descriptor: row.face_descriptor.map(|Json(d)| d),
            created_at: row.created_at,
        })
    }
}

/// An 'exams' row joined with its question count.
#[derive(FromRow)]
struct ExamRow {
    id: i64,
    title: String,
    category: String,
    duration_minutes: i32,
    created_by: i64,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    total_questions: i64,
}

impl TryFrom<ExamRow> for ExamSummary {
    type Error = AppError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let status = ExamStatus::parse(&row.status).ok_or_else(|| {
            AppError::InternalServerError(format!("Unknown exam status '{}'", row.status))
        })?;

        Ok(ExamSummary {
            exam: Exam {
                id: row.id,
                title: row.title,
                category: row.category,
                duration_minutes: non_negative(row.duration_minutes),
                created_by: row.created_by,
                status,
                created_at: row.created_at,
            },
            total_questions: usize::try_from(row.total_questions).unwrap_or(0),
        })
    }
}

/// Represents a row of the 'questions' table.
#[derive(FromRow)]
struct QuestionRow {
    question_id: i64,
    #[sqlx(rename = "type")]
    question_type: String,
    text: String,
    options: Json<Vec<String>>,
    correct_answer: Option<i32>,
    placeholder: Option<String>,
    marks: i32,
    description: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type = QuestionType::parse(&row.question_type).ok_or_else(|| {
            AppError::InternalServerError(format!("Unknown question type '{}'", row.question_type))
        })?;

        Ok(Question {
            id: row.question_id,
            question_type,
            text: row.text,
            options: row.options.0,
            correct_answer_index: row.correct_answer.and_then(|i| usize::try_from(i).ok()),
            placeholder: row.placeholder,
            marks: non_negative(row.marks),
            description: row.description,
        })
    }
}

/// Represents a row of the 'submissions' table.
#[derive(FromRow)]
struct SubmissionRow {
    id: i64,
    exam_id: i64,
    student_id: i64,
    student_name: String,
    roll_number: Option<String>,
    answers: Json<Answers>,
    auto_score: i32,
    auto_total: i32,
    score: i32,
    total: i32,
    percentage: i32,
    tab_switches: i32,
    manual_evaluations: Json<Evaluations>,
    submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Submission {
            id: row.id,
            exam_id: row.exam_id,
            student_id: row.student_id,
            student_name: row.student_name,
            roll_number: row.roll_number,
            answers: row.answers.0,
            auto_score: non_negative(row.auto_score),
            auto_total: non_negative(row.auto_total),
            score: non_negative(row.score),
            total: non_negative(row.total),
            percentage: non_negative(row.percentage),
            tab_switches: non_negative(row.tab_switches),
            manual_evaluations: row.manual_evaluations.0,
            submitted_at: row.submitted_at,
        }
    }
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_db_int(value: u32) -> Result<i32, AppError> {
    i32::try_from(value)
        .map_err(|_| AppError::BadRequest(format!("Value {} is too large to store", value)))
}

/// Postgres error code for unique violation is 23505.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23505")
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_questions(
        conn: &mut PgConnection,
        exam_id: i64,
        questions: &[Question],
    ) -> Result<(), AppError> {
        if questions.is_empty() {
            return Ok(());
        }
        let marks = questions
            .iter()
            .map(|q| to_db_int(q.marks))
            .collect::<Result<Vec<_>, _>>()?;

        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO questions (exam_id, position, question_id, type, text, options, \
             correct_answer, placeholder, marks, description) ",
        );

        query_builder.push_values(questions.iter().zip(marks).enumerate(), |mut row, (position, (q, marks))| {
            row.push_bind(exam_id)
                .push_bind(position as i32)
                .push_bind(q.id)
                .push_bind(q.question_type.as_str())
                .push_bind(q.text.clone())
                .push_bind(Json(q.options.clone()))
                .push_bind(q.correct_answer_index.map(|i| i as i32))
                .push_bind(q.placeholder.clone())
                .push_bind(marks)
                .push_bind(q.description.clone());
        });

        query_builder.build().execute(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PgRepository {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password, role, name, roll, face_descriptor) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(user.roll.as_deref().map(str::trim).filter(|r| !r.is_empty()))
        .bind(user.face_descriptor.clone().map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username or email already exists".to_string())
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })?;

        let row = match (row.roll.is_none(), default_roll(&user, row.id)) {
            (true, Some(roll)) => {
                sqlx::query_as(&format!(
                    "UPDATE users SET roll = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
                ))
                .bind(roll)
                .bind(row.id)
                .fetch_one(&mut *tx)
                .await?
            }
            _ => row,
        };

        tx.commit().await?;
        User::try_from(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_exam(&self, exam: NewExam, questions: Vec<Question>) -> Result<Exam, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO exams (title, category, duration_minutes, created_by, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&exam.title)
        .bind(&exam.category)
        .bind(to_db_int(exam.duration_minutes)?)
        .bind(exam.created_by)
        .bind(exam.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_questions(&mut tx, id, &questions).await?;

        let row: ExamRow = sqlx::query_as(&format!("{EXAM_SUMMARY_SELECT} WHERE e.id = $1 GROUP BY e.id"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ExamSummary::try_from(row)?.exam)
    }

    async fn list_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        let rows: Vec<ExamRow> =
            sqlx::query_as(&format!("{EXAM_SUMMARY_SELECT} GROUP BY e.id ORDER BY e.id"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(ExamSummary::try_from).collect()
    }

    async fn get_exam(&self, id: i64) -> Result<Option<ExamSummary>, AppError> {
        let row: Option<ExamRow> =
            sqlx::query_as(&format!("{EXAM_SUMMARY_SELECT} WHERE e.id = $1 GROUP BY e.id"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ExamSummary::try_from).transpose()
    }

    async fn questions_for_exam(&self, exam_id: i64) -> Result<Vec<Question>, AppError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT question_id, type, text, options, correct_answer, placeholder, marks, description
            FROM questions
            WHERE exam_id = $1
            ORDER BY position
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn replace_questions(&self, exam_id: i64, questions: Vec<Question>) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM exams WHERE id = $1 FOR UPDATE")
            .bind(exam_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

        sqlx::query("DELETE FROM questions WHERE exam_id = $1")
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_questions(&mut tx, exam_id, &questions).await?;

        tx.commit().await?;
        Ok(questions.len())
    }

    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, AppError> {
        let row: SubmissionRow = sqlx::query_as(&format!(
            "INSERT INTO submissions (exam_id, student_id, student_name, roll_number, answers, \
             auto_score, auto_total, score, total, percentage, tab_switches) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $6, $7, $8, $9) RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(submission.exam_id)
        .bind(submission.student_id)
        .bind(&submission.student_name)
        .bind(&submission.roll_number)
        .bind(Json(&submission.answers))
        .bind(to_db_int(submission.score)?)
        .bind(to_db_int(submission.total)?)
        .bind(to_db_int(submission.percentage)?)
        .bind(to_db_int(submission.tab_switches)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert submission: {:?}", e);
            AppError::from(e)
        })?;

        Ok(row.into())
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        let row: Option<SubmissionRow> =
            sqlx::query_as(&format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Submission::from))
    }

    async fn submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, AppError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE exam_id = $1 ORDER BY id"
        ))
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn submissions_for_student(&self, student_id: i64) -> Result<Vec<Submission>, AppError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE student_id = $1 ORDER BY id"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn update_evaluation(&self, submission: &Submission) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET manual_evaluations = $1, score = $2, total = $3, percentage = $4
            WHERE id = $5
            "#,
        )
        .bind(Json(&submission.manual_evaluations))
        .bind(to_db_int(submission.score)?)
        .bind(to_db_int(submission.total)?)
        .bind(to_db_int(submission.percentage)?)
        .bind(submission.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Submission not found".to_string()));
        }
        Ok(())
    }

    async fn passkeys_for_user(&self, user_id: i64) -> Result<Vec<Passkey>, AppError> {
        let credentials: Option<Json<Vec<Passkey>>> =
            sqlx::query_scalar("SELECT credentials FROM user_passkeys WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credentials.map(|c| c.0).unwrap_or_default())
    }

    async fn save_passkeys(&self, user_id: i64, passkeys: &[Passkey]) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_passkeys (user_id, credentials, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET credentials = EXCLUDED.credentials, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(Json(passkeys))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().and_then(|d| d.code()).is_some_and(|c| c == "23503") {
                AppError::NotFound("User not found".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_db_int_rejects_values_above_i32() {
        assert_eq!(to_db_int(100).unwrap(), 100);
        assert!(matches!(to_db_int(1 << 31), Err(AppError::BadRequest(_))));
    }
}
