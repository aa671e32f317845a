//! Specialization guards for a profiling JIT.
//!
//! A specialized compiled path is recorded for the shapes, layouts and
//! values seen while profiling. Before reusing it, the runtime checks the
//! current call against those recordings; any failed check routes the call
//! to the uncached fallback.

pub mod cli;
pub mod config;
pub mod runtime;
pub mod version;

pub use specguard_tensor as tensor;
