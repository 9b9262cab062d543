//! Attention-gated generation loop.
//!
//! # State machine
//! ```text
//! INIT ──primer──► PRIMED ──► SAMPLING ──► TERMINATED(reason)
//!   └──no primer──────────────►   ▲   │
//!                                 └───┘
//! ```
//! - Priming feeds the primer strokes through the model while
//!   attending over `primer text + " " + line text`. Nothing is emitted.
//! - Sampling draws one point per step from the biased mixture and feeds it back.
//! - The run stops when attention moves onto a phantom slot past the last
//!   character, or sits on the last character while the pen lifts. Hitting the
//!   step bound first is a `GenerationOverrun`, never a silent truncation.
//!
//! `run` is synchronous and CPU-bound. Callers on the async side go through
//! `GenerationPool`, which moves it onto the blocking thread pool.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::HandwritingError;
use crate::geometry::{StrokeSample, StrokeSequence};
use crate::model::{RecurrentState, StrokeModel};
use crate::synthesis::alphabet::{decode, CharacterSequence};
use crate::synthesis::primer::StylePrimer;
use crate::synthesis::sampler::BiasedMixture;

pub const DEFAULT_MAX_STEPS: usize = 3300;
pub const DEFAULT_STEPS_PER_CHARACTER: usize = 60;
pub const DEFAULT_END_MARGIN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Hard ceiling on sampled steps for any line.
    pub max_steps: usize,
    /// Per-character allowance; a line may take at most this many steps per character.
    pub max_steps_per_character: usize,
    /// Phantom attention slots past the last character.
    pub end_margin: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_steps_per_character: DEFAULT_STEPS_PER_CHARACTER,
            end_margin: DEFAULT_END_MARGIN,
        }
    }
}

impl GeneratorConfig {
    pub fn step_bound(&self, characters: usize) -> usize {
        self.max_steps
            .min(self.max_steps_per_character.saturating_mul(characters))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Attention moved onto a slot past the last character.
    PastFinalCharacter,
    /// Attention was on the last character when the pen lifted.
    FinalCharacterLifted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Init,
    Primed,
    Sampling,
    Terminated(StopReason),
}

/// One line's worth of work.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub line_index: usize,
    pub characters: &'a CharacterSequence,
    pub primer: Option<&'a StylePrimer>,
    pub bias: f32,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub strokes: StrokeSequence,
    /// Sampled steps, priming excluded.
    pub steps: usize,
    pub stop: StopReason,
}

/// Mutable state owned by one run. Never shared between lines.
#[derive(Debug, Clone)]
pub struct GenerationState {
    pub recurrent: RecurrentState,
    pub input: StrokeSample,
    pub steps: usize,
    pub phase: GenerationPhase,
}

impl GenerationState {
    fn new(recurrent: RecurrentState) -> Self {
        Self {
            recurrent,
            input: StrokeSample::origin(),
            steps: 0,
            phase: GenerationPhase::Init,
        }
    }
}

struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    fn check(
        deadline: &Option<Deadline>,
        line: usize,
        steps: usize,
    ) -> Result<(), HandwritingError> {
        match deadline {
            Some(d) if Instant::now() >= d.at => Err(HandwritingError::GenerationTimeout {
                line,
                steps,
                timeout_ms: d.timeout.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}

pub struct Generator<'m> {
    model: &'m dyn StrokeModel,
    config: GeneratorConfig,
}

impl<'m> Generator<'m> {
    pub fn new(model: &'m dyn StrokeModel, config: GeneratorConfig) -> Self {
        Self { model, config }
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest<'_>,
        rng: &mut R,
    ) -> Result<Generation, HandwritingError> {
        let line = request.line_index;
        // A timeout too large to represent as an instant means no deadline.
        let deadline = request.timeout.and_then(|timeout| {
            Instant::now()
                .checked_add(timeout)
                .map(|at| Deadline { at, timeout })
        });
        let mut state = GenerationState::new(self.model.initial_state());

        let characters = match request.primer {
            Some(primer) => primer.characters.joined_with_space(request.characters),
            None => request.characters.clone(),
        };

        // ── Prime ───────────────────────────────────────────────────────────
        if let Some(primer) = request.primer {
            for sample in primer.strokes.samples() {
                Deadline::check(&deadline, line, 0)?;
                let (next, _) = self.model.step(&state.recurrent, &state.input, &characters)?;
                state.recurrent = next;
                state.input = *sample;
            }
            state.phase = GenerationPhase::Primed;
            debug!(
                line,
                style = primer.index,
                primed = primer.strokes.len(),
                attending = %decode(&characters),
                "Primed generator"
            );
        }

        // ── Sample ──────────────────────────────────────────────────────────
        state.phase = GenerationPhase::Sampling;
        let bound = self.config.step_bound(request.characters.len());
        let positions = characters.len() + self.config.end_margin;
        let final_index = characters.len().saturating_sub(1);
        let mut strokes = StrokeSequence::with_capacity(bound);

        while state.steps < bound {
            Deadline::check(&deadline, line, state.steps)?;
            let (next, output) = self.model.step(&state.recurrent, &state.input, &characters)?;
            let sample = BiasedMixture::new(&output.mixture, request.bias).sample(rng);
            strokes.push(sample);
            state.steps += 1;

            let position = output.attention.position(positions);
            let stop = if position > final_index {
                Some(StopReason::PastFinalCharacter)
            } else if position == final_index && sample.pen_lift {
                Some(StopReason::FinalCharacterLifted)
            } else {
                None
            };

            if let Some(reason) = stop {
                if let Some(last) = strokes.last_mut() {
                    last.pen_lift = true;
                }
                state.phase = GenerationPhase::Terminated(reason);
                debug!(
                    line,
                    steps = state.steps,
                    segments = strokes.pen_down_segments(),
                    stop = ?reason,
                    "Line generation finished"
                );
                return Ok(Generation {
                    strokes,
                    steps: state.steps,
                    stop: reason,
                });
            }

            state.recurrent = next;
            state.input = sample;
        }

        warn!(line, steps = state.steps, "Generation hit the step bound before attention finished");
        Err(HandwritingError::GenerationOverrun {
            line,
            steps: state.steps,
        })
    }
}
