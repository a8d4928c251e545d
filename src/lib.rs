//! taskdeck - Personal Task Board Library
//!
//! This library provides the core functionality for the taskdeck CLI and
//! its static web server.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled units of work with status, category, priority and an
//!   optional due date
//! - **Storage medium**: key/value store holding the collection as one blob
//! - **Board**: in-memory collection kept in step with storage, raising
//!   notifications for every mutation
//! - **View**: filter, search and sort over the collection
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskdeck.toml`
//! - `error`: Error types and result aliases
//! - `storage`: Key/value media (directory-backed and in-memory)
//! - `store`: Task collection serialization over a medium
//! - `repository`: Create, update and delete against the store
//! - `board`: Mutation orchestration and notifications
//! - `view`: Filtering, sorting and counts
//! - `server`: Static site server for the web client

pub mod activity;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod repository;
pub mod server;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

pub use error::{Error, Result};
