//! Multilingual health-text pipeline: cached, retrying translation with
//! medical-term preservation, plus per-language readability scoring.

pub mod api;
pub mod cache;
pub mod config;
pub mod i18n;
pub mod provider;
pub mod readability;
pub mod retry;
pub mod translation;
