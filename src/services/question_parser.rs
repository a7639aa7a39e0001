// src/services/question_parser.rs

//! Line-oriented extraction of questions from plain text (usually text pulled out of a PDF).
//!
//! Recognized lines:
//!
//! ```text
//! Q1: What is 2+2?        opens a question (also: any line ending in '?')
//! A) 3                    option, letters A-D followed by ')', '.' or ':'
//! Correct: B              answer key as a letter
//! Type: coding            turns the current question into a coding question
//! Placeholder: fn f() {}  code template for coding questions
//! ```
//!
//! Anything else continues the text of the open question.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::AppError,
    models::question::{Question, QuestionType},
};

static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\s*\d+[:.)\-]?\s*").expect("valid regex"));
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D][).:]\s*(.*)$").expect("valid regex"));
static CORRECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^correct\s*[:=]\s*").expect("valid regex"));
static CODING_TYPE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^type\s*[:=]\s*coding").expect("valid regex"));
static PLACEHOLDER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^placeholder\s*[:=]\s*").expect("valid regex"));

const NO_QUESTIONS_HINT: &str = "No questions detected. Ensure the text uses Q1:, options A)/B)/C)/D), and Correct: X";

/// A question still being assembled from lines.
#[derive(Debug, Default)]
struct Draft {
    question_type: QuestionType,
    text: String,
    options: Vec<String>,
    answer_key: Option<String>,
    placeholder: Option<String>,
}

impl Draft {
    fn opened_with(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn append_text(&mut self, line: &str) {
        if self.text.is_empty() {
            self.text = line.to_string();
        } else {
            self.text.push(' ');
            self.text.push_str(line);
        }
    }

    /// Cleans up options and resolves the answer key. An unusable key is dropped so the
    /// question ends up ungraded instead of wrongly graded.
    fn finish(mut self) -> Self {
        self.options.retain(|o| !o.is_empty());

        if self.question_type != QuestionType::Mcq {
            self.answer_key = None;
        } else if self.options.is_empty() {
            self.question_type = QuestionType::Short;
            self.answer_key = None;
        }
        self
    }

    fn correct_index(&self) -> Option<usize> {
        let key = self.answer_key.as_deref()?.trim().to_ascii_uppercase();
        let index = match key.as_str() {
            "A" => 0,
            "B" => 1,
            "C" => 2,
            "D" => 3,
            _ => return None,
        };
        (index < self.options.len()).then_some(index)
    }
}

/// Parses extracted text into an ordered list of questions.
///
/// Fails when the text is blank or no question survives parsing; an empty question
/// list is never returned.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Extraction(
            "Unable to extract text. Ensure the PDF contains selectable text (not scanned images).".to_string(),
        ));
    }

    let mut drafts: Vec<Draft> = Vec::new();
    let mut current: Option<Draft> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if QUESTION_MARKER.is_match(line) || line.ends_with('?') {
            if let Some(done) = current.take() {
                drafts.push(done.finish());
            }
            let body = QUESTION_MARKER.replace(line, "");
            current = Some(Draft::opened_with(body.trim()));
            continue;
        }

        if let (Some(caps), Some(draft)) = (OPTION_LINE.captures(line), current.as_mut()) {
            draft.options.push(caps[1].trim().to_string());
            continue;
        }

        if let Some(draft) = current.as_mut().filter(|_| CORRECT_LINE.is_match(line)) {
            draft.answer_key = Some(CORRECT_LINE.replace(line, "").trim().to_string());
            continue;
        }

        if CODING_TYPE_LINE.is_match(line) {
            current.get_or_insert_with(Draft::default).question_type = QuestionType::Coding;
            continue;
        }

        if PLACEHOLDER_LINE.is_match(line) {
            current.get_or_insert_with(Draft::default).placeholder =
                Some(PLACEHOLDER_LINE.replace(line, "").to_string());
            continue;
        }

        if let Some(draft) = current.as_mut() {
            draft.append_text(line);
        }
    }

    if let Some(done) = current.take() {
        drafts.push(done.finish());
    }

    let questions: Vec<Question> = drafts
        .into_iter()
        .filter(|d| !d.text.trim().is_empty())
        .enumerate()
        .map(|(index, draft)| Question {
            id: index as i64 + 1,
            question_type: draft.question_type,
            correct_answer_index: draft.correct_index(),
            text: draft.text.trim().to_string(),
            options: draft.options,
            placeholder: draft.placeholder,
            marks: 1,
            description: None,
        })
        .collect();

    if questions.is_empty() {
        return Err(AppError::Extraction(NO_QUESTIONS_HINT.to_string()));
    }

    tracing::debug!(count = questions.len(), "parsed questions from text");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_mcq() {
        let questions = parse_questions("Q1: What is 2+2?\nA) 3\nB) 4\nCorrect: B").unwrap();

        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.id, 1);
        assert_eq!(q.question_type, QuestionType::Mcq);
        assert_eq!(q.text, "What is 2+2?");
        assert_eq!(q.options, vec!["3", "4"]);
        assert_eq!(q.correct_answer_index, Some(1));
        assert_eq!(q.marks, 1);
    }

    #[test]
    fn test_multiple_questions_and_crlf() {
        let text = "Q1. Capital of France?\r\nA) London\r\nB) Paris\r\nCorrect: b\r\n\r\nQ2) Red planet?\r\nA. Venus\r\nB. Mars\r\nC. Jupiter\r\ncorrect = B\r\n";
        let questions = parse_questions(text).unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Capital of France?");
        assert_eq!(questions[0].correct_answer_index, Some(1));
        assert_eq!(questions[1].id, 2);
        assert_eq!(questions[1].options, vec!["Venus", "Mars", "Jupiter"]);
        assert_eq!(questions[1].correct_answer_index, Some(1));
    }

    #[test]
    fn test_line_ending_in_question_mark_opens_question() {
        let questions = parse_questions("Which is a stack operation?\nA: push\nB: enqueue").unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["push", "enqueue"]);
        assert_eq!(questions[0].correct_answer_index, None);
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let questions = parse_questions("Q1: Consider the following\ncode snippet and pick\nthe output\nA) 1\nB) 2\nCorrect: A").unwrap();
        assert_eq!(questions[0].text, "Consider the following code snippet and pick the output");
        assert_eq!(questions[0].correct_answer_index, Some(0));
    }

    #[test]
    fn test_out_of_range_answer_is_dropped() {
        let questions = parse_questions("Q1: Pick one\nA) x\nB) y\nCorrect: D").unwrap();
        assert_eq!(questions[0].correct_answer_index, None);
    }

    #[test]
    fn test_non_letter_answer_is_dropped() {
        let questions = parse_questions("Q1: Pick one\nA) x\nB) y\nCorrect: 1").unwrap();
        assert_eq!(questions[0].correct_answer_index, None);
    }

    #[test]
    fn test_empty_options_are_filtered() {
        let questions = parse_questions("Q1: Pick one\nA)\nB) y\nC) z\nCorrect: B").unwrap();
        assert_eq!(questions[0].options, vec!["y", "z"]);
        assert_eq!(questions[0].correct_answer_index, Some(1));
    }

    #[test]
    fn test_coding_question_with_placeholder() {
        let text = "Q1: Write a function that reverses a string\nType: coding\nPlaceholder: function reverse(s) {}\nCorrect: A";
        let questions = parse_questions(text).unwrap();

        let q = &questions[0];
        assert_eq!(q.question_type, QuestionType::Coding);
        assert_eq!(q.placeholder.as_deref(), Some("function reverse(s) {}"));
        assert_eq!(q.correct_answer_index, None);
    }

    #[test]
    fn test_mcq_without_options_becomes_short_answer() {
        let questions = parse_questions("Q1: Explain ownership in one sentence").unwrap();
        assert_eq!(questions[0].question_type, QuestionType::Short);
    }

    #[test]
    fn test_lowercase_marker_is_plain_text() {
        assert!(parse_questions("q1 not a marker\nsome text").is_err());
    }

    #[test]
    fn test_trailing_question_is_flushed() {
        let questions = parse_questions("Q1: First?\nA) a\nQ2: Second?\nA) b\nB) c").unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].options, vec!["b", "c"]);
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(parse_questions(""), Err(AppError::Extraction(_))));
        assert!(matches!(parse_questions("   \n\n"), Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_text_without_markers_is_an_error() {
        let err = parse_questions("Just some lecture notes.\nNothing to ask here.").unwrap_err();
        assert!(matches!(err, AppError::Extraction(msg) if msg.contains("No questions detected")));
    }

    #[test]
    fn test_orphan_options_before_any_question_are_ignored() {
        let questions = parse_questions("A) stray\nQ1: Real question?\nA) yes").unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["yes"]);
    }
}
