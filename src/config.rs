// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Evaluator configuration options

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, EvaluationResult};
use crate::random::{Lcg16, RandomSource};

/// How the scalar path applies trigonometric, hyperbolic and rounding operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarUnaryMode {
    /// Always apply the operator, as the array path does
    #[default]
    Corrected,
    /// Apply only to negative operands and leave others unchanged, matching
    /// historical output of the legacy engine
    Legacy,
}

/// Random sequence selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomMode {
    /// Draw from the process-wide sequence
    #[default]
    Shared,
    /// Private generator starting at the given seed
    Seeded(u16),
}

impl RandomMode {
    /// Build the source an evaluator owns
    pub fn source(self) -> RandomSource {
        match self {
            RandomMode::Shared => RandomSource::Shared,
            RandomMode::Seeded(seed) => RandomSource::Local(Lcg16::new(seed)),
        }
    }
}

/// Configuration for evaluator buffers and operator behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Largest `array_size` an evaluation may request
    pub max_array_size: usize,

    /// Number of operand stack elements
    pub stack_capacity: usize,

    /// Scalar unary operator behaviour
    pub scalar_unary_mode: ScalarUnaryMode,

    /// Random sequence used by `RNDM` / `ARNDM`
    pub random: RandomMode,
}

impl EvaluatorConfig {
    /// Create a new configuration with custom capacities
    pub fn new(max_array_size: usize, stack_capacity: usize) -> Self {
        Self {
            max_array_size,
            stack_capacity,
            ..Self::default()
        }
    }

    /// Legacy scalar-unary behaviour and limits
    pub fn legacy() -> Self {
        Self {
            max_array_size: 100,
            stack_capacity: 30,
            scalar_unary_mode: ScalarUnaryMode::Legacy,
            random: RandomMode::Shared,
        }
    }

    /// Create a configuration for testing
    pub fn testing() -> Self {
        Self {
            max_array_size: 64,
            stack_capacity: 16,
            scalar_unary_mode: ScalarUnaryMode::Corrected,
            random: RandomMode::Seeded(crate::random::INITIAL_SEED),
        }
    }

    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> EvaluationResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EvaluationError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot evaluate anything
    pub fn validate(&self) -> EvaluationResult<()> {
        if self.stack_capacity == 0 {
            return Err(EvaluationError::InvalidConfig {
                message: "stack_capacity must be at least 1".to_string(),
            });
        }
        if self.max_array_size == 0 {
            return Err(EvaluationError::InvalidConfig {
                message: "max_array_size must be at least 1".to_string(),
            });
        }
        if self.max_array_size.checked_mul(self.stack_capacity).is_none() {
            return Err(EvaluationError::InvalidConfig {
                message: "stack arena size overflows".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_array_size: 100,
            stack_capacity: 64,
            scalar_unary_mode: ScalarUnaryMode::Corrected,
            random: RandomMode::Shared,
        }
    }
}
