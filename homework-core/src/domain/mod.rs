//! Core domain types
//!
//! Homework records as reported by the grading API, the fixed verdict table,
//! and the validation and rendering steps applied to every poll response.

pub mod homework;
pub mod message;
pub mod response;
