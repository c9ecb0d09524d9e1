// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # relmap
//!
//! One crate, the whole mapping layer. Re-exports:
//! - [`Entity`] and [`DbEnum`] derive macros from `relmap-derive`
//! - All engine types from `relmap-core` ([`Session`], [`SchemaExport`],
//!   [`Value`], the statement builder and parameter rewriter)

// Re-export derive macros
// Re-export all engine types
pub use relmap_core::*;
pub use relmap_derive::{DbEnum, Entity};
