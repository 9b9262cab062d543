//! Bounded-parallel line generation.
//!
//! # spawn_blocking pattern
//! Every line is an independent CPU-bound `Generator::run`. Each job waits for a
//! semaphore permit, then runs on tokio's blocking pool so the async scheduler
//! stays free. Jobs take owned data (required for `'static` closure bounds) and
//! the results are awaited in input order, whatever order they finish in.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::errors::HandwritingError;
use crate::model::StrokeModel;
use crate::synthesis::alphabet::CharacterSequence;
use crate::synthesis::generator::{Generation, GenerationRequest, Generator, GeneratorConfig};
use crate::synthesis::primer::StylePrimer;

/// Owned input for one line's generation.
#[derive(Debug, Clone)]
pub struct LineJob {
    pub line_index: usize,
    pub characters: CharacterSequence,
    pub primer: Option<Arc<StylePrimer>>,
    pub bias: f32,
    /// Document seed. The line's generator is seeded with `seed + line_index`.
    pub seed: Option<u64>,
}

impl LineJob {
    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(self.line_index as u64)),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl GenerationPool {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs every job and returns one result per job, in job order.
    /// A failing line never affects its siblings.
    pub async fn run_all(
        &self,
        model: Arc<dyn StrokeModel>,
        config: GeneratorConfig,
        timeout: Option<Duration>,
        jobs: Vec<LineJob>,
    ) -> Vec<Result<Generation, HandwritingError>> {
        let handles: Vec<JoinHandle<Result<Generation, HandwritingError>>> = jobs
            .into_iter()
            .map(|job| {
                let permits = Arc::clone(&self.permits);
                let model = Arc::clone(&model);
                tokio::spawn(async move {
                    let permit = permits.acquire_owned().await.map_err(|e| {
                        HandwritingError::WorkerPool(format!(
                            "semaphore closed before line {}: {e}",
                            job.line_index
                        ))
                    })?;
                    let line_index = job.line_index;
                    tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        let mut rng = job.rng();
                        let request = GenerationRequest {
                            line_index: job.line_index,
                            characters: &job.characters,
                            primer: job.primer.as_deref(),
                            bias: job.bias,
                            timeout,
                        };
                        Generator::new(model.as_ref(), config).run(&request, &mut rng)
                    })
                    .await
                    .map_err(|e| {
                        HandwritingError::WorkerPool(format!(
                            "spawn_blocking failed for line {line_index}: {e}"
                        ))
                    })?
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(HandwritingError::WorkerPool(format!("line task failed: {e}"))));
            results.push(result);
        }
        results
    }
}
