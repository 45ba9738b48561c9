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

//! Shared fixtures for the integration tests
//!
//! Scalar inputs `A..L` hold `1..12`. Array inputs `AA..LL` hold three values
//! each and are zero-extended to the evaluation's array size.

#![allow(dead_code)]

use acalc::{
    Arguments, Evaluation, EvaluationResult, Evaluator, EvaluatorConfig, Postfix,
};

pub const A: u8 = 0;
pub const B: u8 = 1;
pub const C: u8 = 2;
pub const D: u8 = 3;
pub const E: u8 = 4;
pub const F: u8 = 5;
pub const G: u8 = 6;
pub const H: u8 = 7;
pub const I: u8 = 8;
pub const J: u8 = 9;
pub const K: u8 = 10;
pub const L: u8 = 11;

pub const AA: u8 = 0;
pub const BB: u8 = 1;
pub const CC: u8 = 2;
pub const DD: u8 = 3;
pub const EE: u8 = 4;
pub const FF: u8 = 5;
pub const GG: u8 = 6;
pub const HH: u8 = 7;

pub const SCALARS: [f64; 12] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];

pub const ARRAY_AA: [f64; 3] = [1.0, 2.0, 3.0];
pub const ARRAY_BB: [f64; 3] = [4.0, 5.0, 6.0];
pub const ARRAY_CC: [f64; 3] = [7.0, 8.0, 9.0];
pub const ARRAY_DD: [f64; 3] = [-1.0, 0.0, 1.0];
pub const ARRAY_EE: [f64; 3] = [0.0, 1.0, 2.0];
pub const ARRAY_FF: [f64; 3] = [16.0, 17.0, 18.0];
pub const ARRAY_GG: [f64; 3] = [19.0, 20.0, 21.0];
pub const ARRAY_HH: [f64; 3] = [1.0, 2.0, 3.0];

pub static ARRAYS: [&[f64]; 12] = [
    &ARRAY_AA, &ARRAY_BB, &ARRAY_CC, &ARRAY_DD, &ARRAY_EE, &ARRAY_FF, &ARRAY_GG, &ARRAY_HH,
    &ARRAY_HH, &ARRAY_HH, &ARRAY_HH, &ARRAY_HH,
];

/// Arguments holding the standard fixture inputs
pub fn fixture_args() -> Arguments<'static> {
    Arguments::new(&SCALARS, &ARRAYS)
}

/// Fresh evaluator with a private random sequence
pub fn test_evaluator() -> Evaluator {
    match Evaluator::with_config(EvaluatorConfig::testing()) {
        Ok(evaluator) => evaluator,
        Err(e) => panic!("testing config rejected: {e}"),
    }
}

/// Evaluate against the fixture inputs
pub fn run(postfix: &Postfix, array_size: usize) -> EvaluationResult<Evaluation> {
    test_evaluator().evaluate(postfix.as_bytes(), &fixture_args(), array_size)
}

/// Scalar result of a successful evaluation with array size 1
pub fn value_of(postfix: &Postfix) -> f64 {
    match run(postfix, 1) {
        Ok(result) => result.value,
        Err(e) => panic!("evaluation failed: {e}\n{}", postfix.disassemble()),
    }
}

/// Array result of a successful evaluation
pub fn array_of(postfix: &Postfix, array_size: usize) -> Vec<f64> {
    match run(postfix, array_size) {
        Ok(result) => result.array,
        Err(e) => panic!("evaluation failed: {e}\n{}", postfix.disassemble()),
    }
}

/// Compare with the tolerance used by the legacy test-suite
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-8,
        "expected {expected}, got {actual}"
    );
}
