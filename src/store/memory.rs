// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use webauthn_rs::prelude::Passkey;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamSummary, NewExam},
        question::Question,
        submission::{Evaluations, NewSubmission, Submission},
        user::{NewUser, User},
    },
    store::{Repository, default_roll},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    exams: Vec<Exam>,
    questions: HashMap<i64, Vec<Question>>,
    submissions: Vec<Submission>,
    passkeys: HashMap<i64, Vec<Passkey>>,
}

impl MemoryState {
    fn summary(&self, exam: &Exam) -> ExamSummary {
        ExamSummary {
            exam: exam.clone(),
            total_questions: self.questions.get(&exam.id).map_or(0, Vec::len),
        }
    }
}

/// Process-local store. Every mutation happens under one write lock acquisition, so a
/// failed operation leaves nothing behind.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;

        let taken = state.users.iter().any(|u| {
            u.username == user.username
                || (user.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(AppError::Conflict("Username or email already exists".to_string()));
        }

        let id = state.users.len() as i64 + 1;
        let created = User {
            id,
            roll: default_roll(&user, id),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            name: user.name,
            face_descriptor: user.face_descriptor,
            created_at: chrono::Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_exam(&self, exam: NewExam, questions: Vec<Question>) -> Result<Exam, AppError> {
        let mut state = self.state.write().await;

        let created = Exam {
            id: state.exams.len() as i64 + 1,
            title: exam.title,
            category: exam.category,
            duration_minutes: exam.duration_minutes,
            created_by: exam.created_by,
            status: exam.status,
            created_at: chrono::Utc::now(),
        };
        if !questions.is_empty() {
            state.questions.insert(created.id, questions);
        }
        state.exams.push(created.clone());
        Ok(created)
    }

    async fn list_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        let state = self.state.read().await;
        Ok(state.exams.iter().map(|e| state.summary(e)).collect())
    }

    async fn get_exam(&self, id: i64) -> Result<Option<ExamSummary>, AppError> {
        let state = self.state.read().await;
        Ok(state.exams.iter().find(|e| e.id == id).map(|e| state.summary(e)))
    }

    async fn questions_for_exam(&self, exam_id: i64) -> Result<Vec<Question>, AppError> {
        let state = self.state.read().await;
        Ok(state.questions.get(&exam_id).cloned().unwrap_or_default())
    }

    async fn replace_questions(&self, exam_id: i64, questions: Vec<Question>) -> Result<usize, AppError> {
        let mut state = self.state.write().await;

        if !state.exams.iter().any(|e| e.id == exam_id) {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }

        let count = questions.len();
        state.questions.insert(exam_id, questions);
        Ok(count)
    }

    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, AppError> {
        let mut state = self.state.write().await;

        let created = Submission {
            id: state.submissions.len() as i64 + 1,
            exam_id: submission.exam_id,
            student_id: submission.student_id,
            student_name: submission.student_name,
            roll_number: submission.roll_number,
            answers: submission.answers,
            auto_score: submission.score,
            auto_total: submission.total,
            score: submission.score,
            total: submission.total,
            percentage: submission.percentage,
            tab_switches: submission.tab_switches,
            manual_evaluations: Evaluations::new(),
            submitted_at: chrono::Utc::now(),
        };
        state.submissions.push(created.clone());
        Ok(created)
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        let state = self.state.read().await;
        Ok(state.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn submissions_for_exam(&self, exam_id: i64) -> Result<Vec<Submission>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn submissions_for_student(&self, student_id: i64) -> Result<Vec<Submission>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn update_evaluation(&self, submission: &Submission) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        let stored = state
            .submissions
            .iter_mut()
            .find(|s| s.id == submission.id)
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        stored.manual_evaluations = submission.manual_evaluations.clone();
        stored.score = submission.score;
        stored.total = submission.total;
        stored.percentage = submission.percentage;
        Ok(())
    }

    async fn passkeys_for_user(&self, user_id: i64) -> Result<Vec<Passkey>, AppError> {
        let state = self.state.read().await;
        Ok(state.passkeys.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save_passkeys(&self, user_id: i64, passkeys: &[Passkey]) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        state.passkeys.insert(user_id, passkeys.to_vec());
        Ok(())
    }
}
