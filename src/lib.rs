//! Librarium - book catalogue, libraries and blog over one JSON API
//!
//! This library provides the core functionality for the Librarium server.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
