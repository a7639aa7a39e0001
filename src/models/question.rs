// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::html::clean_html;

/// Kind of question. Only `Mcq` is graded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Mcq,
    Coding,
    Short,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Coding => "coding",
            QuestionType::Short => "short",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mcq" => Some(QuestionType::Mcq),
            "coding" => Some(QuestionType::Coding),
            "short" => Some(QuestionType::Short),
            _ => None,
        }
    }
}

/// A question as held by the question store.
///
/// Field names on the wire follow the frontend's conventions
/// (`question`, `correctAnswer`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(rename = "question")]
    pub text: String,

    #[serde(default)]
    pub options: Vec<String>,

    /// Zero-based index into `options`. `None` means the question needs manual grading.
    #[serde(rename = "correctAnswer", skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<usize>,

    /// Code template shown for coding questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    pub marks: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Question {
    /// Whether the automatic grader can score this question.
    pub fn is_auto_gradable(&self) -> bool {
        self.question_type == QuestionType::Mcq && self.correct_answer_index.is_some()
    }
}

/// Question as shown to students: no answer key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            text: q.text,
            options: q.options,
            placeholder: q.placeholder,
            marks: q.marks,
            description: q.description,
        }
    }
}

/// DTO for one question in a manual upload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub id: Option<i64>,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(rename = "question", alias = "text")]
    #[validate(length(min = 1, max = 5000, message = "Question text must not be empty."))]
    pub text: String,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correctAnswerIndex")]
    pub correct_answer_index: Option<usize>,
    pub placeholder: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub marks: Option<u32>,
    pub description: Option<String>,
}

/// DTO for replacing an exam's question list.
#[derive(Debug, Deserialize, Validate)]
pub struct UploadQuestionsRequest {
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// DTO for importing questions from already extracted text.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportTextRequest {
    #[validate(length(max = 500_000))]
    pub text: String,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    for opt in options {
        if opt.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Turns uploaded question inputs into stored questions.
///
/// Ids default to the 1-based position. Rejects duplicate ids and mcq answer keys
/// that do not point at an option, so nothing is stored on bad input.
pub fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, String> {
    let mut questions: Vec<Question> = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let id = input.id.unwrap_or(index as i64 + 1);
        if questions.iter().any(|q| q.id == id) {
            return Err(format!("Duplicate question id {}", id));
        }

        let text = input.text.trim();
        if text.is_empty() {
            return Err(format!("Question {}: text must not be blank", id));
        }

        let correct_answer_index = match input.question_type {
            QuestionType::Mcq => match input.correct_answer_index {
                Some(i) if i >= input.options.len() => {
                    return Err(format!(
                        "Question {}: correct answer {} is not a valid option index",
                        id, i
                    ));
                }
                other => other,
            },
            _ => None,
        };

        questions.push(Question {
            id,
            question_type: input.question_type,
            text: text.to_string(),
            options: input.options,
            correct_answer_index,
            placeholder: input.placeholder,
            marks: input.marks.unwrap_or(1),
            description: input.description.as_deref().map(clean_html),
        });
    }

    Ok(questions)
}
