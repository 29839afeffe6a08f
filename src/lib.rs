//! Meal Plan Core Library
//!
//! Meal structure and food exchange allocation engines driven by JSON rule tables.

pub mod build_info;
pub mod config;
pub mod error;
pub mod exchange;
pub mod mcp;
pub mod models;
pub mod rules;
pub mod structure;
pub mod timing;
pub mod tools;
