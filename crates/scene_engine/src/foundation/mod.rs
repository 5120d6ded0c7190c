//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Stable identities for persistable objects
//! - Arena keys and collections
//! - Time management
//! - Logging utilities

pub mod math;
pub mod identity;
pub mod collections;
pub mod time;
pub mod logging;
