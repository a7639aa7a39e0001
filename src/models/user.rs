// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "faculty" => Some(Role::Faculty),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Faculty and admins author exams and grade submissions.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Faculty | Role::Admin)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: Option<String>,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,

    pub name: String,

    pub roll: Option<String>,

    /// Normalized face descriptor used by face login.
    #[serde(skip)]
    pub face_descriptor: Option<Vec<f64>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Account fields the store needs to create one. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub roll: Option<String>,
    pub face_descriptor: Option<Vec<f64>>,
}

/// Public view of a user returned by auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub name: String,
    pub roll: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            roll: user.roll.clone(),
        }
    }
}

/// DTO for signing up (students and faculty only).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be at least 3 characters"
    ))]
    pub username: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be at least 6 characters"
    ))]
    pub password: String,
    #[validate(custom(function = validate_signup_role))]
    pub role: Role,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub roll: Option<String>,
    #[serde(alias = "faceDesc")]
    pub face_descriptor: Option<Vec<f64>>,
}

fn validate_signup_role(role: &Role) -> Result<(), ValidationError> {
    match role {
        Role::Student | Role::Faculty => Ok(()),
        Role::Admin => Err(ValidationError::new("role_must_be_student_or_faculty")
            .with_message("Role must be student or faculty".into())),
    }
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

/// DTO for face descriptor login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLoginRequest {
    pub username: String,
    #[serde(alias = "faceDesc", default)]
    pub face_descriptor: Vec<f64>,
}
