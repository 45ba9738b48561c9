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

//! Pseudo-random source for the `RNDM` and `ARNDM` operators
//!
//! Knuth's linear-congruential recurrence in 16-bit arithmetic:
//! `seed = seed * 1533 + 0x3141`, normalised as `seed / 65535`. Not suitable
//! for anything but test signals.

use parking_lot::Mutex;

/// Seed every sequence starts from
pub const INITIAL_SEED: u16 = 0xa3bf;

const MULTIPLIER: u16 = 191 * 8 + 5;
const INCREMENT: u16 = 0x3141;
const NORMALIZER: f64 = 65535.0;

/// Process-wide generator shared by every evaluator using [`RandomSource::Shared`]
static SHARED_GENERATOR: Mutex<Lcg16> = parking_lot::const_mutex(Lcg16::new(INITIAL_SEED));

/// 16-bit linear-congruential generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg16 {
    seed: u16,
}

impl Default for Lcg16 {
    fn default() -> Self {
        Self::new(INITIAL_SEED)
    }
}

impl Lcg16 {
    /// Create a generator with the given seed
    pub const fn new(seed: u16) -> Self {
        Self { seed }
    }

    /// Current seed
    pub fn seed(&self) -> u16 {
        self.seed
    }

    /// Advance and return a value in `[0, 1]`
    pub fn next_unit(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        f64::from(self.seed) / NORMALIZER
    }
}

/// Where an evaluator draws its random values from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RandomSource {
    /// The single process-wide sequence
    #[default]
    Shared,
    /// A generator owned by one evaluator
    Local(Lcg16),
}

impl RandomSource {
    /// Next value of this source's sequence
    pub fn next_unit(&mut self) -> f64 {
        match self {
            RandomSource::Shared => SHARED_GENERATOR.lock().next_unit(),
            RandomSource::Local(generator) => generator.next_unit(),
        }
    }

    /// Fill `out` with successive values, holding the shared lock once
    pub fn fill(&mut self, out: &mut [f64]) {
        match self {
            RandomSource::Shared => {
                let mut generator = SHARED_GENERATOR.lock();
                out.iter_mut().for_each(|v| *v = generator.next_unit());
            }
            RandomSource::Local(generator) => {
                out.iter_mut().for_each(|v| *v = generator.next_unit());
            }
        }
    }
}

/// Reset the process-wide sequence to `seed`
pub fn reseed_shared(seed: u16) {
    *SHARED_GENERATOR.lock() = Lcg16::new(seed);
}
