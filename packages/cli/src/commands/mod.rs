//! Deployment commands

pub mod create;
pub mod delete;
pub mod quicktest;
