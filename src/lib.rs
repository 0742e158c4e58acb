//! DataLab DB - persistence and orchestration API for a sensor data labeling platform
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod notify;
pub mod repository;
pub mod routes;
pub mod services;
pub mod validate;
