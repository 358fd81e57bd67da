/// Segment assembly and tag replay.
mod assemble;
/// LaTeX escaping around translation.
pub mod escape;
/// Translation providers.
pub mod providers;
/// Document-level driver.
pub mod session;
/// Inline tag allocation.
pub mod tags;
