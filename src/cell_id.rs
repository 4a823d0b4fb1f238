/// Cell identity under either indexing scheme
///
/// The two schemes never mix inside one aggregation pass, but they share one
/// comparable key so caches and outputs are agnostic to the scheme.

use crate::resolution::Resolution;
use h3o::CellIndex;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellId {
    OffsetGrid {
        resolution: Resolution,
        row: i64,
        col: i64,
    },
    GlobalIndex {
        resolution: Resolution,
        cell: CellIndex,
    },
}

impl CellId {
    pub fn offset(resolution: Resolution, row: i64, col: i64) -> Self {
        CellId::OffsetGrid { resolution, row, col }
    }

    pub fn global(resolution: Resolution, cell: CellIndex) -> Self {
        CellId::GlobalIndex { resolution, cell }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            CellId::OffsetGrid { resolution, .. } | CellId::GlobalIndex { resolution, .. } => *resolution,
        }
    }

    /// Stable string key, e.g. `coarse:r172:c-301` or `fine:862a1072fffffff`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellId::OffsetGrid { resolution, row, col } => write!(f, "{}:r{}:c{}", resolution, row, col),
            CellId::GlobalIndex { resolution, cell } => write!(f, "{}:{}", resolution, cell),
        }
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}
