//! Application services orchestrating domain logic over repository seams.

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod completion;
pub mod error;
pub mod generation;
pub mod media;
pub mod newsletter;
pub mod posts;
pub mod repos;
