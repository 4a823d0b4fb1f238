/// Cooperative rebuild scheduling with generation tokens
///
/// Every request bumps the generation counter. A build advances one phase per
/// [`RebuildScheduler::tick`]; before each phase the scheduler checks that the
/// task's token is still current, so a rebuild superseded mid-flight is
/// abandoned and its partial result never reaches the caller.

use crate::fingerprint::DatasetFingerprint;
use crate::poi::PointOfInterest;
use crate::presence::{AggregatedCells, BinnedStage, PresenceEngine, ScoredStage};
use crate::resolution::Resolution;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Monotonic identity of one rebuild request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing scheduled
    Idle,
    /// One phase ran; more remain
    Progressed,
    /// The current request finished
    Applied(AggregatedCells),
    /// A superseded request was dropped
    Discarded(GenerationToken),
}

enum Phase {
    Binning,
    Scoring(BinnedStage),
    Annotating(ScoredStage),
}

struct RebuildTask {
    token: GenerationToken,
    points: Rc<Vec<PointOfInterest>>,
    resolution: Resolution,
    phase: Phase,
}

#[derive(Default)]
pub struct RebuildScheduler {
    generation: u64,
    task: Option<RebuildTask>,
    pending: Option<RebuildTask>,
}

impl RebuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a rebuild; any earlier request becomes stale
    pub fn request(
        &mut self,
        points: Rc<Vec<PointOfInterest>>,
        resolution: Resolution,
    ) -> GenerationToken {
        self.generation += 1;
        let token = GenerationToken(self.generation);
        debug!(token = token.0, %resolution, points = points.len(), "rebuild requested");
        self.pending = Some(RebuildTask {
            token,
            points,
            resolution,
            phase: Phase::Binning,
        });
        token
    }

    pub fn current(&self) -> GenerationToken {
        GenerationToken(self.generation)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        token.0 == self.generation
    }

    /// A request is queued or in flight
    pub fn is_busy(&self) -> bool {
        self.task.is_some() || self.pending.is_some()
    }

    /// Run at most one phase
    ///
    /// A task in flight is always given one tick to notice it is stale, so
    /// superseded work is reported as `Discarded` before the newer request
    /// starts.
    pub fn tick(&mut self, engine: &mut PresenceEngine) -> TickOutcome {
        let mut task = match self.task.take().or_else(|| self.pending.take()) {
            Some(task) => task,
            None => return TickOutcome::Idle,
        };

        if !self.is_current(task.token) {
            warn!(token = task.token.0, current = self.generation, "stale rebuild abandoned");
            return TickOutcome::Discarded(task.token);
        }

        let phase = std::mem::replace(&mut task.phase, Phase::Binning);
        match phase {
            Phase::Binning => {
                trace!(token = task.token.0, "binning");
                task.phase = Phase::Scoring(engine.bin(&task.points, task.resolution));
            }
            Phase::Scoring(binned) => {
                trace!(token = task.token.0, "scoring");
                task.phase = Phase::Annotating(engine.score(binned));
            }
            Phase::Annotating(scored) => {
                trace!(token = task.token.0, "annotating");
                let fingerprint = DatasetFingerprint::of(&task.points);
                let result = engine.annotate(scored, &task.points, fingerprint);
                if !self.is_current(task.token) {
                    warn!(token = task.token.0, "stale rebuild result discarded");
                    return TickOutcome::Discarded(task.token);
                }
                return TickOutcome::Applied(result);
            }
        }

        self.task = Some(task);
        TickOutcome::Progressed
    }

    /// Tick until the current request is applied or nothing is left
    pub fn run_to_completion(&mut self, engine: &mut PresenceEngine) -> Option<AggregatedCells> {
        loop {
            match self.tick(engine) {
                TickOutcome::Applied(result) => return Some(result),
                TickOutcome::Idle => return None,
                TickOutcome::Progressed | TickOutcome::Discarded(_) => {}
            }
        }
    }
}
