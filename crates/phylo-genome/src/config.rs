//! Genome configuration — shape, value ranges, function defaults and the
//! mutation probability table.
//!
//! Every field has a default, so a partial TOML or JSON document is enough
//! to override a single knob.

use phylo_core::error::{ConfigError, PhyloError, Result};
use phylo_core::functions::{Activation, Aggregation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Uniform sample. A degenerate range always yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    fn check(&self, field: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PhyloError::invalid_config(
                field,
                format!("[{}, {}]", self.min, self.max),
                "bounds must be finite",
            ));
        }
        if self.min > self.max {
            return Err(PhyloError::inverted_range(field, self.min, self.max));
        }
        Ok(())
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// How genomes of the first generation are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialTopology {
    /// No edges at all; structure has to be discovered by `add edge`.
    Unconnected,
    /// Every input wired to every output, or through the initial hidden
    /// layer when `initial_hidden_nodes > 0`.
    FullyConnected,
}

/// One kind of mutation in the probability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    AddNode,
    RemoveNode,
    AddEdge,
    RemoveEdge,
    ResetWeight,
    ScaleWeight,
    PerturbWeight,
    SetBias,
    PerturbBias,
    ChangeAggregation,
    ChangeActivation,
}

impl MutationKind {
    /// Table order. Random selection walks the table in this order.
    pub const ALL: [MutationKind; 11] = [
        MutationKind::AddNode,
        MutationKind::RemoveNode,
        MutationKind::AddEdge,
        MutationKind::RemoveEdge,
        MutationKind::ResetWeight,
        MutationKind::ScaleWeight,
        MutationKind::PerturbWeight,
        MutationKind::SetBias,
        MutationKind::PerturbBias,
        MutationKind::ChangeAggregation,
        MutationKind::ChangeActivation,
    ];
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::AddNode => "add_node",
            MutationKind::RemoveNode => "remove_node",
            MutationKind::AddEdge => "add_edge",
            MutationKind::RemoveEdge => "remove_edge",
            MutationKind::ResetWeight => "reset_weight",
            MutationKind::ScaleWeight => "scale_weight",
            MutationKind::PerturbWeight => "perturb_weight",
            MutationKind::SetBias => "set_bias",
            MutationKind::PerturbBias => "perturb_bias",
            MutationKind::ChangeAggregation => "change_aggregation",
            MutationKind::ChangeActivation => "change_activation",
        };
        f.write_str(name)
    }
}

/// Per-kind selection weights.
///
/// The values need not sum to 1. A roll draws a point in
/// `[0, max(1, total))` and walks the table; the part of the interval
/// beyond `total` selects nothing, so low totals leave room for
/// "no mutation this roll".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRates {
    pub add_node: f64,
    pub remove_node: f64,
    pub add_edge: f64,
    pub remove_edge: f64,
    pub reset_weight: f64,
    pub scale_weight: f64,
    pub perturb_weight: f64,
    pub set_bias: f64,
    pub perturb_bias: f64,
    pub change_aggregation: f64,
    pub change_activation: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            add_node: 0.03,
            remove_node: 0.002,
            add_edge: 0.05,
            remove_edge: 0.002,
            reset_weight: 0.05,
            scale_weight: 0.05,
            perturb_weight: 0.45,
            set_bias: 0.05,
            perturb_bias: 0.2,
            change_aggregation: 0.0,
            change_activation: 0.01,
        }
    }
}

impl MutationRates {
    pub fn rate(&self, kind: MutationKind) -> f64 {
        match kind {
            MutationKind::AddNode => self.add_node,
            MutationKind::RemoveNode => self.remove_node,
            MutationKind::AddEdge => self.add_edge,
            MutationKind::RemoveEdge => self.remove_edge,
            MutationKind::ResetWeight => self.reset_weight,
            MutationKind::ScaleWeight => self.scale_weight,
            MutationKind::PerturbWeight => self.perturb_weight,
            MutationKind::SetBias => self.set_bias,
            MutationKind::PerturbBias => self.perturb_bias,
            MutationKind::ChangeAggregation => self.change_aggregation,
            MutationKind::ChangeActivation => self.change_activation,
        }
    }

    pub fn total(&self) -> f64 {
        MutationKind::ALL.iter().map(|k| self.rate(*k)).sum()
    }

    /// Map a point in `[0, max(1, total))` to the kind it selects.
    pub fn select(&self, point: f64) -> Option<MutationKind> {
        let mut acc = 0.0;
        for kind in MutationKind::ALL {
            acc += self.rate(kind);
            if point < acc {
                return Some(kind);
            }
        }
        None
    }

    /// Rates with every kind disabled except `kind`, which is set to 1.
    pub fn only(kind: MutationKind) -> Self {
        let mut rates = Self::none();
        match kind {
            MutationKind::AddNode => rates.add_node = 1.0,
            MutationKind::RemoveNode => rates.remove_node = 1.0,
            MutationKind::AddEdge => rates.add_edge = 1.0,
            MutationKind::RemoveEdge => rates.remove_edge = 1.0,
            MutationKind::ResetWeight => rates.reset_weight = 1.0,
            MutationKind::ScaleWeight => rates.scale_weight = 1.0,
            MutationKind::PerturbWeight => rates.perturb_weight = 1.0,
            MutationKind::SetBias => rates.set_bias = 1.0,
            MutationKind::PerturbBias => rates.perturb_bias = 1.0,
            MutationKind::ChangeAggregation => rates.change_aggregation = 1.0,
            MutationKind::ChangeActivation => rates.change_activation = 1.0,
        }
        rates
    }

    /// All rates zero.
    pub fn none() -> Self {
        Self {
            add_node: 0.0,
            remove_node: 0.0,
            add_edge: 0.0,
            remove_edge: 0.0,
            reset_weight: 0.0,
            scale_weight: 0.0,
            perturb_weight: 0.0,
            set_bias: 0.0,
            perturb_bias: 0.0,
            change_aggregation: 0.0,
            change_activation: 0.0,
        }
    }

    fn validate(&self) -> Result<()> {
        for kind in MutationKind::ALL {
            let rate = self.rate(kind);
            if !rate.is_finite() || rate < 0.0 {
                return Err(PhyloError::invalid_config(
                    format!("mutation_rates.{}", kind),
                    rate,
                    "must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Configuration shared by every genome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    /// Input node count, fixed for the whole run.
    pub num_inputs: usize,
    /// Output node count, fixed for the whole run.
    pub num_outputs: usize,
    /// Cap on enabled hidden nodes; `add node` is a no-op at the cap.
    pub max_hidden_nodes: usize,
    /// Hidden nodes created with every first-generation genome.
    pub initial_hidden_nodes: usize,
    pub initial_topology: InitialTopology,

    /// Global bounds every weight is clamped to.
    pub weight_range: ValueRange,
    /// Range fresh weights are drawn from.
    pub initial_weight_range: ValueRange,
    /// Factor range for `scale weight`.
    pub weight_scale_range: ValueRange,
    /// Half-width of the uniform noise added by `perturb weight`.
    pub weight_perturb_power: f64,
    pub bias_range: ValueRange,
    /// Half-width of the uniform noise added by `perturb bias`.
    pub bias_perturb_power: f64,

    pub input_aggregation: Aggregation,
    pub input_activation: Activation,
    pub hidden_aggregation: Aggregation,
    pub hidden_activation: Activation,
    pub output_aggregation: Aggregation,
    pub output_activation: Activation,
    /// Candidates for `change aggregation`.
    pub aggregation_pool: Vec<Aggregation>,
    /// Candidates for `change activation`.
    pub activation_pool: Vec<Activation>,

    pub mutation_rates: MutationRates,
    /// Mutation rolls per offspring per generation.
    pub mutation_rolls: usize,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            max_hidden_nodes: 10,
            initial_hidden_nodes: 0,
            initial_topology: InitialTopology::FullyConnected,
            weight_range: ValueRange::new(-30.0, 30.0),
            initial_weight_range: ValueRange::new(-2.0, 2.0),
            weight_scale_range: ValueRange::new(0.5, 1.5),
            weight_perturb_power: 0.5,
            bias_range: ValueRange::new(-3.0, 3.0),
            bias_perturb_power: 0.5,
            input_aggregation: Aggregation::Sum,
            input_activation: Activation::Identity,
            hidden_aggregation: Aggregation::Sum,
            hidden_activation: Activation::Sigmoid,
            output_aggregation: Aggregation::Sum,
            output_activation: Activation::Sigmoid,
            aggregation_pool: Aggregation::ALL.to_vec(),
            activation_pool: vec![
                Activation::Sigmoid,
                Activation::Tanh,
                Activation::Relu,
                Activation::Identity,
            ],
            mutation_rates: MutationRates::default(),
            mutation_rolls: 1,
        }
    }
}

impl GenomeConfig {
    /// Default configuration for a network of the given shape.
    pub fn with_shape(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Self::default()
        }
    }

    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> Result<()> {
        if self.num_inputs == 0 {
            return Err(PhyloError::invalid_config("num_inputs", 0, "must be at least 1"));
        }
        if self.num_outputs == 0 {
            return Err(PhyloError::invalid_config("num_outputs", 0, "must be at least 1"));
        }
        if self.initial_hidden_nodes > self.max_hidden_nodes {
            return Err(PhyloError::invalid_config(
                "initial_hidden_nodes",
                self.initial_hidden_nodes,
                format!("exceeds max_hidden_nodes ({})", self.max_hidden_nodes),
            ));
        }

        self.weight_range.check("weight_range")?;
        self.initial_weight_range.check("initial_weight_range")?;
        self.weight_scale_range.check("weight_scale_range")?;
        self.bias_range.check("bias_range")?;
        if !self.weight_range.contains(self.initial_weight_range.min)
            || !self.weight_range.contains(self.initial_weight_range.max)
        {
            return Err(PhyloError::invalid_config(
                "initial_weight_range",
                self.initial_weight_range,
                format!("must lie within weight_range {}", self.weight_range),
            ));
        }
        if !self.bias_range.contains(0.0) {
            return Err(PhyloError::invalid_config(
                "bias_range",
                self.bias_range,
                "must contain 0, the bias of freshly created nodes",
            ));
        }
        for (field, power) in [
            ("weight_perturb_power", self.weight_perturb_power),
            ("bias_perturb_power", self.bias_perturb_power),
        ] {
            if !power.is_finite() || power < 0.0 {
                return Err(PhyloError::invalid_config(
                    field,
                    power,
                    "must be finite and non-negative",
                ));
            }
        }

        if self.aggregation_pool.is_empty() {
            return Err(ConfigError::EmptyFunctionPool("aggregation_pool".into()).into());
        }
        if self.activation_pool.is_empty() {
            return Err(ConfigError::EmptyFunctionPool("activation_pool".into()).into());
        }

        self.mutation_rates.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GenomeConfig::default().validate().unwrap();
        GenomeConfig::with_shape(3, 2).validate().unwrap();
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let config = GenomeConfig {
            bias_range: ValueRange::new(1.0, -1.0),
            ..GenomeConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PhyloError::Config(ConfigError::InvertedRange { .. })));
    }

    #[test]
    fn initial_weights_must_fit_global_range() {
        let config = GenomeConfig {
            weight_range: ValueRange::new(-1.0, 1.0),
            ..GenomeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_pools_and_negative_rates_are_rejected() {
        let config = GenomeConfig {
            activation_pool: Vec::new(),
            ..GenomeConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            PhyloError::Config(ConfigError::EmptyFunctionPool(_))
        ));

        let mut config = GenomeConfig::default();
        config.mutation_rates.add_edge = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rates_select_in_table_order() {
        let rates = MutationRates::default();
        assert_eq!(rates.select(0.0), Some(MutationKind::AddNode));
        assert_eq!(rates.select(0.031), Some(MutationKind::RemoveNode));
        assert_eq!(rates.select(rates.total() + 0.01), None);

        let only = MutationRates::only(MutationKind::ScaleWeight);
        assert_eq!(only.total(), 1.0);
        assert_eq!(only.select(0.99), Some(MutationKind::ScaleWeight));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: GenomeConfig = serde_json::from_str(
            r#"{ "num_inputs": 4, "hidden_activation": "tanh", "mutation_rates": { "add_node": 0.2 } }"#,
        )
        .unwrap();
        assert_eq!(config.num_inputs, 4);
        assert_eq!(config.num_outputs, 1);
        assert_eq!(config.hidden_activation, Activation::Tanh);
        assert_eq!(config.mutation_rates.add_node, 0.2);
        assert_eq!(config.mutation_rates.perturb_weight, 0.45);
    }

    #[test]
    fn unknown_function_names_fail_at_load_time() {
        let result: std::result::Result<GenomeConfig, _> =
            serde_json::from_str(r#"{ "output_activation": "swish" }"#);
        assert!(result.is_err());
    }
}
