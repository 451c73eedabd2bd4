//! HTTP request handlers

pub mod content;
pub mod playlist;
pub mod submission;
pub mod videos;
