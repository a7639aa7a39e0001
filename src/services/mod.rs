// src/services/mod.rs

pub mod analytics;
pub mod grading;
pub mod passkey;
pub mod pdf;
pub mod question_parser;
