// src/store/mod.rs

//! Persistence behind one interface.
//!
//! `MemoryRepository` keeps everything in process memory; `PgRepository` stores it in
//! PostgreSQL. `main` picks one from the configuration and hands it to the router as a
//! `DynRepository`.

pub mod memory;
pub mod postgres;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use webauthn_rs::prelude::Passkey;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamSummary, NewExam},
        question::Question,
        submission::{NewSubmission, Submission},
        user::{NewUser, User},
    },
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub type DynRepository = Arc<dyn Repository>;

#[async_trait]
pub trait Repository: Send + Sync {
    /// True when data survives a restart.
    fn is_persistent(&self) -> bool;

    // Users

    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    // Exams

    /// Creates the exam and stores its initial question list in one step.
    async fn create_exam(&self, exam: NewExam, questions: Vec<Question>) -> Result<Exam, AppError>;
    async fn list_exams(&self) -> Result<Vec<ExamSummary>, AppError>;
    async fn get_exam(&self, id: i64) -> Result<Option<ExamSummary>, AppError>;

    // Questions

    /// Current question list of the exam, empty when it has none.
    async fn questions_for_exam(&self, exam_id: i64) -> Result<Vec<Question>, AppError>;

    /// Replaces the exam's whole question list. `NotFound` for an unknown exam.
    async fn replace_questions(&self, exam_id: i64, questions: Vec<Question>) -> Result<usize, AppError>;

    // Submissions

    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, AppError>;
    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError>;
    async fn submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, AppError>;
    async fn submissions_for_student(&self, student_id: i64) -> Result<Vec<Submission>, AppError>;

    /// Persists the manual evaluations and recomputed totals of a submission.
    async fn update_evaluation(&self, submission: &Submission) -> Result<(), AppError>;

    // Passkeys

    async fn passkeys_for_user(&self, user_id: i64) -> Result<Vec<Passkey>, AppError>;

    /// Replaces the user's stored passkeys.
    async fn save_passkeys(&self, user_id: i64, passkeys: &[Passkey]) -> Result<(), AppError>;
}

/// Students without a roll number get one derived from their id.
pub(crate) fn default_roll(user: &NewUser, id: i64) -> Option<String> {
    match (&user.roll, user.role) {
        (Some(roll), _) if !roll.trim().is_empty() => Some(roll.trim().to_string()),
        (_, crate::models::user::Role::Student) => Some(format!("STU{:03}", id)),
        _ => None,
    }
}
