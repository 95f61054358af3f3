//! Output for the kernel build: a C header or a list of compiler defines.

mod defines;
mod header;

pub use defines::{defines, Define};
pub use header::{heap_source, render, HEADER_GUARD};
