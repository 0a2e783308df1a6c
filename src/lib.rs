#![allow(clippy::collapsible_if, clippy::len_without_is_empty)]

/// Use mimalloc as the global allocator.
/// The merge and native sort paths do many small line allocations.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod error;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod sorter;

#[cfg(test)]
mod testutil;
