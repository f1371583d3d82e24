//! Weave IR - identifiers shared by the composition runtime.
//!
//! - [`Name`]: compact interned identifier (`u32`)
//! - [`StringInterner`] / [`SharedInterner`]: the tables that own the strings
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: method, module, and class names are `Name(u32)`
//! - **Flatten Everything**: graph nodes are addressed by index, never by pointer

mod interner;
mod name;

pub use interner::{InternError, SharedInterner, StringInterner, KERNEL_NAMES};
pub use name::Name;
