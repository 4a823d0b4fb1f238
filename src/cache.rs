/// In-memory caches owned by the presence engine
///
/// Both caches are plain key-value stores with `get`, `put` and `clear`. They
/// live for the engine's lifetime and are cleared explicitly when their key
/// inputs change.

use crate::annotate::CellSummary;
use crate::cell_id::CellId;
use crate::fingerprint::DatasetFingerprint;
use crate::hex_geometry::Ring;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct AnnotationEntry {
    fingerprint: DatasetFingerprint,
    summary: CellSummary,
}

/// Containment summaries keyed by `(cell, dataset fingerprint)`
///
/// One entry per cell: storing a summary under a new fingerprint evicts the
/// stale one, and a lookup with a different fingerprint is always a miss.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    entries: HashMap<CellId, AnnotationEntry>,
    hits: u64,
    misses: u64,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, id: &CellId, fingerprint: &DatasetFingerprint) -> Option<&CellSummary> {
        match self.entries.get(id) {
            Some(entry) if entry.fingerprint == *fingerprint => {
                self.hits += 1;
                Some(&entry.summary)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, id: CellId, fingerprint: DatasetFingerprint, summary: CellSummary) {
        self.entries.insert(id, AnnotationEntry { fingerprint, summary });
    }

    /// Drop every entry not computed under `fingerprint`
    pub fn retain_fingerprint(&mut self, fingerprint: &DatasetFingerprint) {
        self.entries.retain(|_, entry| entry.fingerprint == *fingerprint);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Cell polygons keyed by identity
#[derive(Debug, Default)]
pub struct HexBuildCache {
    rings: HashMap<CellId, Ring>,
}

impl HexBuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CellId) -> Option<&Ring> {
        self.rings.get(id)
    }

    pub fn put(&mut self, id: CellId, ring: Ring) {
        self.rings.insert(id, ring);
    }

    pub fn get_or_build<F: FnOnce() -> Ring>(&mut self, id: CellId, build: F) -> Ring {
        self.rings.entry(id).or_insert_with(build).clone()
    }

    pub fn clear(&mut self) {
        self.rings.clear();
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::GeoPoint;
    use crate::resolution::Resolution;

    fn fingerprint(hash: u64) -> DatasetFingerprint {
        DatasetFingerprint { hash, point_count: 10 }
    }

    fn summary(count: u32) -> CellSummary {
        CellSummary {
            total: count,
            ..CellSummary::default()
        }
    }

    #[test]
    fn test_annotation_hit_requires_matching_fingerprint() {
        let mut cache = AnnotationCache::new();
        let id = CellId::offset(Resolution::Coarse, 1, 2);
        cache.put(id, fingerprint(1), summary(4));

        assert_eq!(cache.get(&id, &fingerprint(1)).map(|s| s.total), Some(4));
        assert!(cache.get(&id, &fingerprint(2)).is_none());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_new_fingerprint_evicts_stale_entry() {
        let mut cache = AnnotationCache::new();
        let id = CellId::offset(Resolution::Coarse, 1, 2);
        cache.put(id, fingerprint(1), summary(4));
        cache.put(id, fingerprint(2), summary(9));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&id, &fingerprint(1)).is_none());
        assert_eq!(cache.get(&id, &fingerprint(2)).map(|s| s.total), Some(9));
    }

    #[test]
    fn test_retain_fingerprint() {
        let mut cache = AnnotationCache::new();
        cache.put(CellId::offset(Resolution::Fine, 0, 0), fingerprint(1), summary(1));
        cache.put(CellId::offset(Resolution::Fine, 0, 1), fingerprint(2), summary(1));
        cache.retain_fingerprint(&fingerprint(2));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hex_cache_builds_once() {
        let mut cache = HexBuildCache::new();
        let id = CellId::offset(Resolution::Medium, 3, 3);
        let mut builds = 0;
        for _ in 0..3 {
            cache.get_or_build(id, || {
                builds += 1;
                vec![GeoPoint::new(0.0, 0.0)]
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.get(&id).map(|r| r.len()), Some(1));
    }
}
