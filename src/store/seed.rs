// src/store/seed.rs

//! Startup data: the configured admin account and a demo exam catalogue.

use crate::{
    config::Config,
    error::AppError,
    models::{
        exam::{ExamStatus, NewExam},
        question::{Question, QuestionType},
        user::{NewUser, Role},
    },
    store::Repository,
    utils::hash::hash_password,
};

/// Creates the admin account from `ADMIN_USERNAME` / `ADMIN_PASSWORD` unless it exists.
/// Returns the admin's id when one is configured.
pub async fn seed_admin(repo: &dyn Repository, config: &Config) -> Result<Option<i64>, AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(None);
    };

    if let Some(existing) = repo.find_user_by_username(username).await? {
        return Ok(Some(existing.id));
    }

    tracing::info!("Seeding admin user: {}", username);
    let admin = repo
        .create_user(NewUser {
            username: username.clone(),
            email: None,
            password_hash: hash_password(password)?,
            role: Role::Admin,
            name: "Admin User".to_string(),
            roll: Some("ADM001".to_string()),
            face_descriptor: None,
        })
        .await?;
    tracing::info!("Admin user created successfully.");

    Ok(Some(admin.id))
}

fn mcq(id: i64, text: &str, options: &[&str], correct: usize) -> Question {
    Question {
        id,
        question_type: QuestionType::Mcq,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer_index: Some(correct),
        placeholder: None,
        marks: 1,
        description: None,
    }
}

fn demo_catalogue() -> Vec<(&'static str, &'static str, u32, Vec<Question>)> {
    vec![
        (
            "Web Development Fundamentals",
            "Technical",
            30,
            vec![
                mcq(
                    1,
                    "What does HTML stand for?",
                    &[
                        "Hyper Text Markup Language",
                        "Home Tool Markup Language",
                        "Hyperlinks and Text Markup Language",
                        "Hyperlinking Text Marking Language",
                    ],
                    0,
                ),
                Question {
                    id: 2,
                    question_type: QuestionType::Coding,
                    text: "Write a function to reverse a string in JavaScript.".to_string(),
                    options: vec![],
                    correct_answer_index: None,
                    placeholder: Some(
                        "// Your code here\nfunction reverseString(str) {\n  // Write your code\n}".to_string(),
                    ),
                    marks: 1,
                    description: None,
                },
                mcq(
                    3,
                    "Which of the following is NOT a JavaScript framework?",
                    &["React", "Angular", "Vue", "Django"],
                    3,
                ),
            ],
        ),
        (
            "General Knowledge Test",
            "General",
            20,
            vec![
                mcq(1, "What is the capital of France?", &["London", "Berlin", "Paris", "Madrid"], 2),
                mcq(2, "Which planet is known as the Red Planet?", &["Venus", "Mars", "Jupiter", "Saturn"], 1),
            ],
        ),
        (
            "Data Structures & Algorithms",
            "Technical",
            40,
            vec![
                mcq(1, "Which data structure uses FIFO?", &["Stack", "Queue", "Tree", "Graph"], 1),
                mcq(2, "Inorder traversal of BST gives:", &["Random", "Sorted", "Reverse", "Level order"], 1),
                mcq(3, "Time complexity of binary search:", &["O(n)", "O(log n)", "O(n log n)", "O(1)"], 1),
            ],
        ),
        (
            "JavaScript Fundamentals",
            "Technical",
            25,
            vec![
                mcq(1, "typeof null equals:", &["null", "object", "undefined", "boolean"], 1),
                mcq(2, "Array method to transform elements:", &["forEach", "map", "filter", "reduce"], 1),
                mcq(3, "Template literals use:", &["\"", "'", "`", "~"], 2),
            ],
        ),
        (
            "Computer Networks Basics",
            "Technical",
            20,
            vec![
                mcq(1, "HTTP default port:", &["21", "25", "80", "443"], 2),
                mcq(2, "Secure HTTP protocol:", &["HTTP", "HTTPS", "FTP", "SMTP"], 1),
                mcq(3, "Router works at OSI layer:", &["2", "3", "4", "7"], 1),
            ],
        ),
        (
            "Aptitude & Reasoning",
            "General",
            30,
            vec![
                mcq(1, "Find the next number: 2, 6, 12, 20, ?", &["24", "28", "30", "40"], 1),
                mcq(2, "If A=1, B=2 then Z=?", &["24", "25", "26", "27"], 2),
                mcq(3, "A train 120m long passes a pole in 6s. Speed?", &["20 m/s", "15 m/s", "10 m/s", "5 m/s"], 0),
            ],
        ),
        (
            "English Grammar & Vocabulary",
            "General",
            20,
            vec![
                mcq(
                    1,
                    "Choose the correct sentence:",
                    &["He don't like tea.", "He doesn't like tea.", "He not like tea.", "He no like tea."],
                    1,
                ),
                mcq(2, "Antonym of difficult:", &["hard", "easy", "tough", "rough"], 1),
                mcq(3, "Fill in the blank: She ____ to school.", &["go", "goes", "going", "gone"], 1),
            ],
        ),
        (
            "Logical Reasoning",
            "General",
            25,
            vec![
                mcq(
                    1,
                    "All squares are rectangles. All rectangles are polygons. Therefore, all squares are polygons. This is:",
                    &["Invalid", "Valid", "Insufficient data", "Paradox"],
                    1,
                ),
                mcq(2, "Which does not belong: 3, 5, 7, 9, 11", &["3", "5", "7", "9"], 3),
                mcq(3, "If SOME = 58, then FEW = ?", &["28", "23", "32", "35"], 2),
            ],
        ),
    ]
}

/// Fills an empty store with the demo exams. Does nothing when any exam exists.
pub async fn seed_demo_exams(repo: &dyn Repository, created_by: i64) -> Result<usize, AppError> {
    if !repo.list_exams().await?.is_empty() {
        return Ok(0);
    }

    let catalogue = demo_catalogue();
    let count = catalogue.len();
    for (title, category, duration_minutes, questions) in catalogue {
        repo.create_exam(
            NewExam {
                title: title.to_string(),
                category: category.to_string(),
                duration_minutes,
                created_by,
                status: ExamStatus::Active,
            },
            questions,
        )
        .await?;
    }

    tracing::info!("Seeded {} demo exams", count);
    Ok(count)
}
