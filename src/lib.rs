//! Library crate for matchday-back, the games data-access layer of a group
//! sports application. Exposes modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod media;
pub mod services;
