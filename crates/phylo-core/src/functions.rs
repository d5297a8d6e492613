//! Aggregation and activation function library.
//!
//! Node genes carry one aggregation function (reduces the values a node
//! received) and one activation function (maps the aggregate to the node's
//! output). Both are small closed enums resolved from their symbolic names
//! once, when a genome or configuration is built, so evaluation never does
//! string lookups.

use crate::error::{GenomeError, PhyloError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reduces a node's received values to a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Aggregation {
    Sum,
    Min,
    Max,
    Average,
    Product,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Sum,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Average,
        Aggregation::Product,
    ];

    /// Apply the aggregation.
    ///
    /// Every variant is defined on an empty slice: `product` yields 1,
    /// the others yield 0.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return match self {
                Aggregation::Product => 1.0,
                _ => 0.0,
            };
        }
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Product => values.iter().product(),
        }
    }

    /// Canonical registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Average => "average",
            Aggregation::Product => "product",
        }
    }
}

/// Maps an aggregate to a node's output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Activation {
    Arctan,
    BinaryStep,
    Identity,
    Lelu,
    Relu,
    Sigmoid,
    Softplus,
    Sign,
    Step,
    Tanh,
}

impl Activation {
    pub const ALL: [Activation; 10] = [
        Activation::Arctan,
        Activation::BinaryStep,
        Activation::Identity,
        Activation::Lelu,
        Activation::Relu,
        Activation::Sigmoid,
        Activation::Softplus,
        Activation::Sign,
        Activation::Step,
        Activation::Tanh,
    ];

    /// Apply the activation.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Arctan => x.atan(),
            Activation::BinaryStep => {
                if x >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Identity => x,
            Activation::Lelu => {
                if x > 0.0 {
                    x
                } else {
                    0.005 * x
                }
            }
            Activation::Relu => {
                if x >= 0.0 {
                    x
                } else {
                    0.0
                }
            }
            // exp overflows below -709
            Activation::Sigmoid => 1.0 / (1.0 + (-x.max(-708.0)).exp()),
            Activation::Softplus => (1.0 + x.min(708.0).exp()).ln(),
            Activation::Sign => {
                if x >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Activation::Step => {
                if x < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            Activation::Tanh => {
                let x = x.max(-353.0);
                2.0 / (1.0 + (-2.0 * x).exp()) - 1.0
            }
        }
    }

    /// Canonical registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Arctan => "arctan",
            Activation::BinaryStep => "binary_step",
            Activation::Identity => "identity",
            Activation::Lelu => "lelu",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Softplus => "softplus",
            Activation::Sign => "sign",
            Activation::Step => "step",
            Activation::Tanh => "tanh",
        }
    }
}

/// Name-to-function lookup for the built-in library.
///
/// Accepts the canonical names plus the short aliases used in compact
/// genome listings (`atan`, `ave`, `id`, `sig`, `splus`).
pub struct FunctionRegistry;

impl FunctionRegistry {
    /// Resolve an aggregation function by name.
    pub fn resolve_aggregation(name: &str) -> Result<Aggregation> {
        let resolved = match name.trim().to_ascii_lowercase().as_str() {
            "sum" => Aggregation::Sum,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "average" | "ave" | "mean" => Aggregation::Average,
            "product" | "prod" => Aggregation::Product,
            _ => {
                return Err(PhyloError::Genome(GenomeError::UnknownAggregation(
                    name.to_string(),
                )))
            }
        };
        Ok(resolved)
    }

    /// Resolve an activation function by name.
    pub fn resolve_activation(name: &str) -> Result<Activation> {
        let resolved = match name.trim().to_ascii_lowercase().as_str() {
            "arctan" | "atan" => Activation::Arctan,
            "binary_step" => Activation::BinaryStep,
            "identity" | "id" => Activation::Identity,
            "lelu" => Activation::Lelu,
            "relu" => Activation::Relu,
            "sigmoid" | "sig" => Activation::Sigmoid,
            "softplus" | "splus" => Activation::Softplus,
            "sign" => Activation::Sign,
            "step" => Activation::Step,
            "tanh" => Activation::Tanh,
            _ => {
                return Err(PhyloError::Genome(GenomeError::UnknownActivation(
                    name.to_string(),
                )))
            }
        };
        Ok(resolved)
    }

    /// All built-in aggregation functions.
    pub fn aggregations() -> &'static [Aggregation] {
        &Aggregation::ALL
    }

    /// All built-in activation functions.
    pub fn activations() -> &'static [Activation] {
        &Activation::ALL
    }
}

impl FromStr for Aggregation {
    type Err = PhyloError;

    fn from_str(s: &str) -> Result<Self> {
        FunctionRegistry::resolve_aggregation(s)
    }
}

impl FromStr for Activation {
    type Err = PhyloError;

    fn from_str(s: &str) -> Result<Self> {
        FunctionRegistry::resolve_activation(s)
    }
}

impl TryFrom<String> for Aggregation {
    type Error = PhyloError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Activation {
    type Error = PhyloError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Aggregation> for String {
    fn from(value: Aggregation) -> Self {
        value.name().to_string()
    }
}

impl From<Activation> for String {
    fn from(value: Activation) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregations_are_defined_on_empty_input() {
        for agg in Aggregation::ALL {
            let value = agg.apply(&[]);
            assert!(value.is_finite(), "{} over nothing should be finite", agg);
        }
        assert_eq!(Aggregation::Product.apply(&[]), 1.0);
        assert_eq!(Aggregation::Max.apply(&[]), 0.0);
    }

    #[test]
    fn aggregations_reduce_values() {
        let values = [1.0, -2.0, 4.0];
        assert_eq!(Aggregation::Sum.apply(&values), 3.0);
        assert_eq!(Aggregation::Min.apply(&values), -2.0);
        assert_eq!(Aggregation::Max.apply(&values), 4.0);
        assert_eq!(Aggregation::Average.apply(&values), 1.0);
        assert_eq!(Aggregation::Product.apply(&values), -8.0);
    }

    #[test]
    fn sigmoid_is_clipped_for_large_negative_input() {
        let y = Activation::Sigmoid.apply(-1.0e6);
        assert!(y.is_finite());
        assert!(y >= 0.0 && y < 1e-300);
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn softplus_and_tanh_stay_finite() {
        assert!(Activation::Softplus.apply(1.0e6).is_finite());
        assert!((Activation::Tanh.apply(-1.0e6) + 1.0).abs() < 1e-12);
        assert!((Activation::Tanh.apply(0.5) - 0.5f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn step_functions_use_their_thresholds() {
        assert_eq!(Activation::Step.apply(0.49), 0.0);
        assert_eq!(Activation::Step.apply(0.5), 1.0);
        assert_eq!(Activation::BinaryStep.apply(0.0), 1.0);
        assert_eq!(Activation::BinaryStep.apply(-0.1), 0.0);
        assert_eq!(Activation::Lelu.apply(-2.0), -0.01);
    }

    #[test]
    fn registry_resolves_names_and_aliases() {
        assert_eq!(FunctionRegistry::resolve_activation("sig").unwrap(), Activation::Sigmoid);
        assert_eq!(FunctionRegistry::resolve_activation("Tanh").unwrap(), Activation::Tanh);
        assert_eq!(FunctionRegistry::resolve_aggregation("ave").unwrap(), Aggregation::Average);
        for act in Activation::ALL {
            assert_eq!(FunctionRegistry::resolve_activation(act.name()).unwrap(), act);
        }
        for agg in Aggregation::ALL {
            assert_eq!(FunctionRegistry::resolve_aggregation(agg.name()).unwrap(), agg);
        }
    }

    #[test]
    fn registry_rejects_unknown_names() {
        let err = FunctionRegistry::resolve_activation("swish").unwrap_err();
        assert!(matches!(
            err,
            PhyloError::Genome(GenomeError::UnknownActivation(ref name)) if name == "swish"
        ));
        assert!(FunctionRegistry::resolve_aggregation("median").is_err());
    }

    #[test]
    fn functions_serialize_by_name() {
        let json = serde_json::to_string(&Activation::BinaryStep).unwrap();
        assert_eq!(json, "\"binary_step\"");
        let parsed: Aggregation = serde_json::from_str("\"ave\"").unwrap();
        assert_eq!(parsed, Aggregation::Average);
        assert!(serde_json::from_str::<Activation>("\"nope\"").is_err());
    }
}
