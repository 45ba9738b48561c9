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

//! Process-wide evaluator with the legacy busy semantics
//!
//! A call that finds the evaluator in use fails with
//! [`EvaluationError::EvaluatorBusy`] instead of waiting. The lock guard is
//! released on every return path, so an error never leaves it marked busy.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::{Arguments, Evaluation, Evaluator, Outputs};
use crate::error::{EvaluationError, EvaluationResult};

static GLOBAL: Lazy<SharedEvaluator> = Lazy::new(|| SharedEvaluator::new(Evaluator::new()));

/// Evaluator guarded by a non-blocking lock
#[derive(Debug)]
pub struct SharedEvaluator {
    inner: Mutex<Evaluator>,
}

impl Default for SharedEvaluator {
    fn default() -> Self {
        Self::new(Evaluator::new())
    }
}

impl SharedEvaluator {
    /// Wrap an evaluator
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            inner: Mutex::new(evaluator),
        }
    }

    /// The process-wide instance, created with the default configuration
    pub fn global() -> &'static SharedEvaluator {
        &GLOBAL
    }

    /// Whether an evaluation is in progress
    pub fn is_busy(&self) -> bool {
        self.inner.is_locked()
    }

    /// Like [`Evaluator::perform`], failing fast when already in use
    pub fn perform(
        &self,
        postfix: &[u8],
        args: &Arguments<'_>,
        array_size: usize,
        outputs: &mut Outputs<'_>,
    ) -> EvaluationResult<()> {
        let mut evaluator = self.acquire()?;
        evaluator.perform(postfix, args, array_size, outputs)
    }

    /// Like [`Evaluator::evaluate`], failing fast when already in use
    pub fn evaluate(
        &self,
        postfix: &[u8],
        args: &Arguments<'_>,
        array_size: usize,
    ) -> EvaluationResult<Evaluation> {
        let mut evaluator = self.acquire()?;
        evaluator.evaluate(postfix, args, array_size)
    }

    fn acquire(&self) -> EvaluationResult<parking_lot::MutexGuard<'_, Evaluator>> {
        self.inner.try_lock().ok_or_else(|| {
            log::debug!("shared evaluator busy, rejecting call");
            EvaluationError::EvaluatorBusy
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postfix::{Opcode, PostfixBuilder};

    #[test]
    fn test_busy_rejects_without_blocking() {
        let shared = SharedEvaluator::default();
        let postfix = PostfixBuilder::new().literal(1.0).build();

        let guard = shared.inner.lock();
        assert!(shared.is_busy());
        assert_eq!(
            shared
                .evaluate(postfix.as_bytes(), &Arguments::default(), 1)
                .unwrap_err(),
            EvaluationError::EvaluatorBusy
        );
        drop(guard);

        assert_eq!(
            shared
                .evaluate(postfix.as_bytes(), &Arguments::default(), 1)
                .unwrap()
                .value,
            1.0
        );
    }

    #[test]
    fn test_error_releases_lock() {
        let shared = SharedEvaluator::default();
        let failing = PostfixBuilder::new().literal(1.0).op(Opcode::Add).build();
        let args = Arguments::default();

        assert!(shared.evaluate(failing.as_bytes(), &args, 1).is_err());
        assert!(!shared.is_busy());
        assert_eq!(
            shared.evaluate(&[0xFF, 0x00], &args, 1).unwrap_err(),
            EvaluationError::BadExpression
        );
        assert!(!shared.is_busy());
    }

    #[test]
    fn test_global_is_single_instance() {
        assert!(std::ptr::eq(SharedEvaluator::global(), SharedEvaluator::global()));
    }
}
