//! Pure transformations applied around a dispatch.
//!
//! Nothing in here performs I/O: URI fixups rewrite strings against a
//! context captured by the caller, and normalization only reshapes values.

mod fixup;
mod normalize;

pub use fixup::{Fixer, FixupContext, UriFixups, WorkingDir, resolve_relative_file};
pub use normalize::normalize;
