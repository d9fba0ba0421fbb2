//! # Dialplan Code Generation
//!
//! Dialplan text generation for script graphs.

mod blocks;
mod dialplan_codegen;

pub use dialplan_codegen::*;
