//! Phenotype — the executable view of a genome.
//!
//! A phenotype is derived from a genome on demand and thrown away after
//! evaluation. It is never authoritative state: mutating a phenotype's
//! transient buffers has no effect on the genome it was built from.

use crate::error::Result;

/// An executable network handed to evaluation callbacks.
///
/// This is a trait rather than a concrete type so that fitness functions
/// can be written (and tested) against any network backend.
pub trait Phenotype {
    /// Run the network on one input vector.
    ///
    /// Fails with `NetworkError::InvalidInputArity` when
    /// `inputs.len() != self.num_inputs()`. Outputs are returned in
    /// output-node id order.
    fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>>;

    /// Number of values `activate` expects.
    fn num_inputs(&self) -> usize;

    /// Number of values `activate` returns.
    fn num_outputs(&self) -> usize;
}
