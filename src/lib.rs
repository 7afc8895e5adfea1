//! blockevent - Decodes ledger block events into indexable transaction views
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Block Views
//! - [`block`] - `BlockView`, `TransactionView` and `TransactionCursor`
//! - [`event`] - Event payloads and source handles
//!
//! ## Wire Protocol
//! - [`protocol`] - Block and envelope types, decoder traits, bincode codec, builders
//!
//! ## Integration
//! - [`dispatch`] - Listener registry fed by the subscription layer
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Block Views
// ============================================================================
pub mod block;
pub mod event;

// ============================================================================
// Wire Protocol
// ============================================================================
pub mod protocol;

// ============================================================================
// Integration
// ============================================================================
pub mod dispatch;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use block::{BlockView, CursorState, TransactionCursor, TransactionView};
pub use error::DecodeError;
pub use event::{Event, SourceHandle};
