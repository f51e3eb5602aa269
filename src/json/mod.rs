//! Purpose: JSON decoding boundary for response bodies and files read by the CLI.
//! Exports: `parse` module with decode helpers.
//! Role: Single seam so callsites avoid ad hoc decode and error mapping.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
