//! Tour extraction.
//!
//! Converts the engine's 0/1 edge assignment into an ordered cycle and
//! guards against answers that do not form a single Hamiltonian cycle.

mod extractor;

pub use extractor::TourExtractor;
