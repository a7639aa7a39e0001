// src/handlers/mod.rs

pub mod auth;
pub mod exam;
pub mod health;
pub mod question;
pub mod submission;
pub mod webauthn;
