//! ccsync: installer and diff-based synchronizer for AI coding-assistant
//! configuration bundles.
//!
//! The target tree (`~/.claude` or a project-local `.claude/`) holds four
//! tracked categories (commands, agents, skills, scripts), sound assets, and
//! a `settings.json` hooks document. Content comes from a GitHub repository
//! through the contents API; local and remote sides are compared by Git blob
//! SHA, so analysis never downloads file bodies.
//!
//! Pipeline: `github` + `walk` feed `classify`; the approved subset goes to
//! `apply`, which runs downloads through `transform` and merges hooks into
//! `settings`; `backup` snapshots the tracked subset before anything
//! destructive.

pub mod apply;
pub mod backup;
pub mod classify;
pub mod commands;
pub mod config;
pub mod deps;
pub mod error;
pub mod github;
pub mod hash;
pub mod platform;
pub mod settings;
pub mod transform;
pub mod walk;

pub use error::{Result, SyncError};
