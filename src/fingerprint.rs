/// Cheap dataset fingerprint for cache invalidation
///
/// Hashes a bounded, fixed-stride sample of the point set together with the
/// total count, so a changed dataset is detected without rehashing every point.

use crate::constants::{FINGERPRINT_MAX_SAMPLES, FINGERPRINT_SEED, FINGERPRINT_STRIDE};
use crate::poi::PointOfInterest;
use serde::Serialize;
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DatasetFingerprint {
    pub hash: u64,
    pub point_count: usize,
}

impl DatasetFingerprint {
    pub fn of(points: &[PointOfInterest]) -> Self {
        let mut hasher = XxHash64::with_seed(FINGERPRINT_SEED);
        hasher.write_u64(points.len() as u64);

        let mut write_point = |p: &PointOfInterest| {
            hasher.write_u64(p.position.longitude.to_bits());
            hasher.write_u64(p.position.latitude.to_bits());
            hasher.write_u8(p.kind as u8);
        };

        for point in points
            .iter()
            .step_by(FINGERPRINT_STRIDE)
            .take(FINGERPRINT_MAX_SAMPLES)
        {
            write_point(point);
        }
        if let Some(last) = points.last() {
            write_point(last);
        }

        Self {
            hash: hasher.finish(),
            point_count: points.len(),
        }
    }
}

impl fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}/{}", self.hash, self.point_count)
    }
}
