// src/models/mod.rs

pub mod analytics;
pub mod exam;
pub mod passkey;
pub mod question;
pub mod submission;
pub mod user;
