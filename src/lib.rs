//! Lekha: a small blog backend with moderated comments, newsletter signups and
//! completion-assisted drafting.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
