//! Built-in evaluation tasks.

use phylo::prelude::*;

/// XOR truth table: `(inputs, expected output)`.
pub const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Highest score [`xor_fitness`] can return.
pub const XOR_MAX_FITNESS: f64 = 4.0;

/// `4 - sum of squared errors` over the XOR truth table.
///
/// A network of the wrong shape scores zero instead of failing the run.
pub fn xor_fitness(network: &mut FeedForwardNetwork) -> f64 {
    let mut error = 0.0;
    for (inputs, expected) in XOR_CASES {
        match network.activate(&inputs) {
            Ok(outputs) => error += (outputs[0] - expected).powi(2),
            Err(_) => return 0.0,
        }
    }
    XOR_MAX_FITNESS - error
}

/// Output of `network` for every XOR case.
pub fn xor_outputs(network: &mut FeedForwardNetwork) -> Result<Vec<f64>> {
    XOR_CASES
        .iter()
        .map(|(inputs, _)| network.activate(inputs).map(|outputs| outputs[0]))
        .collect()
}
