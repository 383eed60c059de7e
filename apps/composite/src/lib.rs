//! # composite
//!
//! Library side of the `composite` binary: assembly files and the reports
//! printed by the CLI. Exposed as a library so the integration tests can drive
//! it without spawning the binary.

pub mod assembly;

pub use assembly::{Assembly, AssemblyError, Built, NodeReport, NodeSpec};
