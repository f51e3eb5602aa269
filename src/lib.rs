//! Purpose: Library crate for building, saving, fetching and normalizing chart drawings.
//! Exports: `api` (builder, parser, client, transport, model) and `core` (errors).
//! Role: Backs the `chart-drawings` CLI; usable directly as a library.
//! Invariants: No global state; credentials and transport are passed explicitly.
//! Invariants: Library code never installs a tracing subscriber or reads the environment.
pub mod api;
pub mod core;
pub(crate) mod json;
