//! Implementation of multiple devices using serial transfer (Link Cable).
//!
//! These are purely virtual devices used either for testing (eg: [`buffer`])
//! or for redirecting serial output to the host's standard output (eg: [`stdout`]).

pub mod buffer;
pub mod stdout;
