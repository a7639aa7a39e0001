// tests/api_tests.rs

use std::sync::Arc;

use exam_portal::{
    config::Config,
    routes,
    state::AppState,
    store::MemoryRepository,
};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Test configuration, in-memory storage only
    let config = Config {
        database_url: None,
        use_in_memory: true,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        frontend_origin: "http://localhost:3000".to_string(),
        log_dir: "logs".to_string(),
        admin_username: None,
        admin_password: None,
        seed_demo_exams: false,
        webauthn_rp_id: "localhost".to_string(),
        webauthn_origin: "http://localhost:3000".to_string(),
    };

    let state = AppState::new(Arc::new(MemoryRepository::new()), config)
        .expect("Failed to build app state");

    // 2. Create the router with the app state
    let app = routes::create_router(state);

    // 3. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 4. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Signs up a fresh user with the given role and returns its token.
async fn signup(client: &reqwest::Client, address: &str, role: &str) -> String {
    signup_with_face(client, address, role, None).await.1
}

/// Signs up a fresh user, optionally with a face descriptor.
/// Returns the username and the token.
async fn signup_with_face(
    client: &reqwest::Client,
    address: &str,
    role: &str,
    face_descriptor: Option<Vec<f64>>,
) -> (String, String) {
    let unique = uuid::Uuid::new_v4().to_string()[..8].to_string();
    let username = format!("{}_{}", role, unique);
    let response = client
        .post(format!("{}/api/signup", address))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", unique),
            "password": "password123",
            "role": role,
            "name": format!("Test {}", role),
            "faceDescriptor": face_descriptor,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().expect("token in signup response").to_string();
    (username, token)
}

fn descriptor() -> Vec<f64> {
    (1..=64).map(|i| f64::from(i) / 100.0).collect()
}

/// Creates an exam as staff and returns its id.
async fn create_exam(client: &reqwest::Client, address: &str, token: &str) -> i64 {
    let response = client
        .post(format!("{}/api/exams", address))
        .bearer_auth(token)
        .json(&json!({
            "title": "Rust Basics",
            "category": "Programming",
            "duration": 30,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalQuestions"], 0);
    body["id"].as_i64().expect("exam id")
}

const QUESTION_TEXT: &str = "\
Q1: What is 2+2?
A) 3
B) 4
C) 5
Correct: B
Q2: Which keyword declares a constant?
A) let
B) const
Correct: B
Q3: Write a function that reverses a string.
Type: coding
Placeholder: fn reverse(s: &str) -> String {}
";

#[tokio::test]
async fn unknown_path_returns_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_reports_storage_mode() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["db"], false);
}

#[tokio::test]
async fn signup_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a username that is too short
    let response = client
        .post(format!("{}/api/signup", address))
        .json(&json!({
            "username": "yo",
            "email": "yo@example.com",
            "password": "password123",
            "role": "student",
            "name": "Yo",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn signup_rejects_admin_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/signup", address))
        .json(&json!({
            "username": "sneaky",
            "email": "sneaky@example.com",
            "password": "password123",
            "role": "admin",
            "name": "Sneaky",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let payload = json!({
        "username": "twice",
        "email": "twice@example.com",
        "password": "password123",
        "role": "student",
        "name": "Twice",
    });

    let first = client
        .post(format!("{}/api/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_and_me() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/signup", address))
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "password123",
            "role": "student",
            "name": "Alice",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Wrong password
    let response = client
        .post(format!("{}/api/login", address))
        .json(&json!({ "username": "alice", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Correct password
    let response = client
        .post(format!("{}/api/login", address))
        .json(&json!({ "username": "alice", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert_eq!(body["user"]["roll"], "STU001");

    let response = client
        .get(format!("{}/api/me", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "student");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/exams", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/exams", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn students_cannot_use_staff_routes() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let student = signup(&client, &address, "student").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    let response = client
        .post(format!("{}/api/exams", address))
        .bearer_auth(&student)
        .json(&json!({ "title": "Nope", "category": "None", "duration": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    for path in ["submissions", "analytics", "export/excel"] {
        let response = client
            .get(format!("{}/api/exams/{}/{}", address, exam_id, path))
            .bearer_auth(&student)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403, "GET {}", path);
    }

    let response = client
        .post(format!("{}/api/exams/{}/questions/import-text", address, exam_id))
        .bearer_auth(&student)
        .json(&json!({ "text": QUESTION_TEXT }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn exam_flow_from_import_to_evaluation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let student = signup(&client, &address, "student").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    // 1. Import questions from text
    let response = client
        .post(format!("{}/api/exams/{}/questions/import-text", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({ "text": QUESTION_TEXT }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);

    let response = client
        .get(format!("{}/api/exams/{}", address, exam_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    let exam: Value = response.json().await.unwrap();
    assert_eq!(exam["totalQuestions"], 3);

    // 2. Students see the questions without answer keys
    let response = client
        .get(format!("{}/api/exams/{}/questions", address, exam_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.get("correctAnswer").is_none()));
    assert_eq!(questions[2]["type"], "coding");

    // Staff still see the keys
    let response = client
        .get(format!("{}/api/exams/{}/questions", address, exam_id))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions[0]["correctAnswer"], 1);

    // 3. Submit: one of two MCQs right
    let response = client
        .post(format!("{}/api/exams/{}/submit", address, exam_id))
        .bearer_auth(&student)
        .json(&json!({
            "answers": { "1": 1, "2": 0, "3": "fn reverse(s: &str) -> String { s.chars().rev().collect() }" },
            "tabSwitches": 2,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["total"], 2);
    assert_eq!(result["percentage"], 50);
    assert_eq!(result["tabSwitches"], 2);
    let submission_id = result["submissionId"].as_i64().unwrap();

    // 4. Manual evaluation of the coding answer
    let response = client
        .post(format!("{}/api/exams/{}/evaluate", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({
            "submissionId": submission_id,
            "evaluations": { "3": { "marks": 2, "maxMarks": 2 } },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let evaluated: Value = response.json().await.unwrap();
    assert_eq!(evaluated["score"], 3);
    assert_eq!(evaluated["total"], 4);
    assert_eq!(evaluated["percentage"], 75);

    // A second pass replaces the first one instead of stacking on top of it
    let response = client
        .post(format!("{}/api/exams/{}/evaluate", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({
            "submissionId": submission_id,
            "evaluations": { "3": { "marks": 1, "maxMarks": 2 } },
        }))
        .send()
        .await
        .unwrap();
    let evaluated: Value = response.json().await.unwrap();
    assert_eq!(evaluated["score"], 2);
    assert_eq!(evaluated["total"], 4);
    assert_eq!(evaluated["percentage"], 50);

    // Marks above maxMarks are rejected
    let response = client
        .post(format!("{}/api/exams/{}/evaluate", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({
            "submissionId": submission_id,
            "evaluations": { "3": { "marks": 5, "maxMarks": 2 } },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Marks that would overflow the totals are rejected, not wrapped
    let response = client
        .post(format!("{}/api/exams/{}/evaluate", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({
            "submissionId": submission_id,
            "evaluations": {
                "2": { "marks": 2147483648u64, "maxMarks": 2147483648u64 },
                "3": { "marks": 2147483648u64, "maxMarks": 2147483648u64 },
            },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // A body that does not deserialize gets the JSON error shape
    let response = client
        .post(format!("{}/api/exams/{}/evaluate", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({ "evaluations": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("submissionId"));

    let response = client
        .get(format!("{}/api/exams/{}/submissions", address, exam_id))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    let submissions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(submissions[0]["score"], 2);
    assert_eq!(submissions[0]["total"], 4);

    // 5. Analytics and the student's own view
    let response = client
        .get(format!("{}/api/exams/{}/analytics", address, exam_id))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let analytics: Value = response.json().await.unwrap();
    assert_eq!(analytics["totalSubmissions"], 1);
    assert_eq!(analytics["averageScore"], 50);
    assert_eq!(analytics["passCount"], 0);
    assert_eq!(analytics["failCount"], 1);

    let response = client
        .get(format!("{}/api/my/submissions", address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    let mine: Value = response.json().await.unwrap();
    assert_eq!(mine["completed"], 1);
    assert_eq!(mine["performance"], 50);

    let response = client
        .get(format!("{}/api/exams/{}/export/excel", address, exam_id))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    let export: Value = response.json().await.unwrap();
    assert_eq!(export["examTitle"], "Rust Basics");
    assert_eq!(export["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn submitting_to_unknown_exam_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let student = signup(&client, &address, "student").await;

    let response = client
        .post(format!("{}/api/exams/999/submit", address))
        .bearer_auth(&student)
        .json(&json!({ "answers": { "1": 0 } }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn staff_result_routes_404_for_unknown_exam() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;

    for path in ["submissions", "analytics", "export/excel"] {
        let response = client
            .get(format!("{}/api/exams/999/{}", address, path))
            .bearer_auth(&faculty)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404, "GET {}", path);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Exam not found");
    }
}

#[tokio::test]
async fn blank_question_text_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    let response = client
        .post(format!("{}/api/exams/{}/questions", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({ "questions": [{ "type": "short", "question": "   " }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn face_login_matches_registered_descriptor() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, _) = signup_with_face(&client, &address, "faculty", Some(descriptor())).await;

    // Same direction, different scale
    let candidate: Vec<f64> = descriptor().iter().map(|x| x * 2.0).collect();
    let response = client
        .post(format!("{}/api/face-login", address))
        .json(&json!({ "username": username, "faceDescriptor": candidate }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["similarity"], 1.0);
    assert_eq!(body["user"]["username"], username.as_str());
}

#[tokio::test]
async fn face_login_rejections() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty, _) = signup_with_face(&client, &address, "faculty", Some(descriptor())).await;
    let (no_face, _) = signup_with_face(&client, &address, "faculty", None).await;
    let (student, _) = signup_with_face(&client, &address, "student", Some(descriptor())).await;

    let face_login = |username: String, candidate: Vec<f64>| {
        let client = client.clone();
        let address = address.clone();
        async move {
            client
                .post(format!("{}/api/face-login", address))
                .json(&json!({ "username": username, "faceDescriptor": candidate }))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }
    };

    // Students cannot use face login
    assert_eq!(face_login(student, descriptor()).await, 404);
    // Too short
    assert_eq!(face_login(faculty.clone(), vec![0.5; 10]).await, 400);
    // Nothing registered
    assert_eq!(face_login(no_face, descriptor()).await, 400);
    // A different face
    let reversed: Vec<f64> = descriptor().into_iter().rev().collect();
    assert_eq!(face_login(faculty.clone(), reversed).await, 401);
    // Values that overflow the similarity computation
    assert_eq!(face_login(faculty, vec![1e308; 64]).await, 401);
}

#[tokio::test]
async fn passkey_registration_requires_own_faculty_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty, token) = signup_with_face(&client, &address, "faculty", None).await;
    let (other, other_token) = signup_with_face(&client, &address, "faculty", None).await;
    let (_, student_token) = signup_with_face(&client, &address, "student", None).await;
    let url = format!("{}/api/webauthn/generate-registration-options", address);

    let response = client
        .post(&url)
        .json(&json!({ "username": faculty }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(&url)
        .bearer_auth(&other_token)
        .json(&json!({ "username": faculty }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .post(&url)
        .bearer_auth(&student_token)
        .json(&json!({ "username": other }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "username": faculty }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let options: Value = response.json().await.unwrap();
    assert!(options["challenge"].as_str().is_some());
    assert_eq!(options["rp"]["id"], "localhost");
    assert_eq!(options["user"]["name"], faculty.as_str());
}

#[tokio::test]
async fn passkey_login_needs_registered_faculty_passkey() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (faculty, _) = signup_with_face(&client, &address, "faculty", None).await;
    let (student, _) = signup_with_face(&client, &address, "student", None).await;
    let url = format!("{}/api/webauthn/generate-authentication-options", address);

    let response = client
        .post(&url)
        .json(&json!({ "username": student }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Faculty user not found");

    let response = client
        .post(&url)
        .json(&json!({ "username": faculty }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No passkeys registered for this user");

    let response = client
        .post(format!("{}/api/webauthn/verify-authentication", address))
        .json(&json!({ "username": faculty, "authResp": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn import_text_without_questions_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    let response = client
        .post(format!("{}/api/exams/{}/questions/import-text", address, exam_id))
        .bearer_auth(&faculty)
        .json(&json!({ "text": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn manual_upload_replaces_question_list() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    for count in [3, 1] {
        let questions: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "type": "mcq",
                    "question": format!("Question {}", i + 1),
                    "options": ["a", "b", "c", "d"],
                    "correctAnswer": 0,
                })
            })
            .collect();

        let response = client
            .post(format!("{}/api/exams/{}/questions", address, exam_id))
            .bearer_auth(&faculty)
            .json(&json!({ "questions": questions }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = client
        .get(format!("{}/api/exams/{}/questions", address, exam_id))
        .bearer_auth(&faculty)
        .send()
        .await
        .unwrap();
    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["id"], 1);
}

#[tokio::test]
async fn garbage_pdf_upload_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let faculty = signup(&client, &address, "faculty").await;
    let exam_id = create_exam(&client, &address, &faculty).await;

    let part = reqwest::multipart::Part::bytes(b"definitely not a pdf".to_vec())
        .file_name("questions.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(format!("{}/api/exams/{}/questions/upload-pdf", address, exam_id))
        .bearer_auth(&faculty)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);

    // Missing file field
    let form = reqwest::multipart::Form::new().text("other", "value");
    let response = client
        .post(format!("{}/api/exams/{}/questions/upload-pdf", address, exam_id))
        .bearer_auth(&faculty)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
