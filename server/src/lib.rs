//! Classwiki Server
//!
//! Backend for a class wiki: published articles, registration review,
//! and a tiered access engine enforcing daily view quotas for guests
//! and regular users.

pub mod access;
pub mod api;
pub mod articles;
pub mod auth;
pub mod config;
pub mod db;
pub mod moderation;
