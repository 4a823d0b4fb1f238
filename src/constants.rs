// Spherical web-mercator
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78; // beyond this the transform blows up

// Polygon vertices are rounded to this many decimals so neighbors share bit-identical corners
pub const RING_DECIMALS: i32 = 8;
pub const HEX_COVERAGE: f64 = 1.0;

// === Aggregation limits ===
pub const DEFAULT_CELL_CAP: usize = 100_000;
pub const DEFAULT_MIN_DISPLAY_COUNT: u32 = 3; // k-anonymity floor
pub const HALO_FRACTION: f64 = 0.25;

// === Tier thresholds, in sixteenths of the resolution max estimate ===
pub const TIER_SIGNIFICANT_COUNT: u32 = 16;
pub const TIER_NOTABLE_COUNT: u32 = 8;
pub const TIER_MODERATE_COUNT: u32 = 4;
pub const TIER_LOW_COUNT: u32 = 2;

pub const SCORE_PERCENTILE: f64 = 95.0;

// === Zoom hysteresis ===
pub const ZOOM_ENTER_MEDIUM: f64 = 6.0;
pub const ZOOM_ENTER_FINE: f64 = 9.0;
pub const ZOOM_HYSTERESIS_BAND: f64 = 1.0;

// === Dataset fingerprint sampling ===
pub const FINGERPRINT_STRIDE: usize = 17;
pub const FINGERPRINT_MAX_SAMPLES: usize = 4096;
pub const FINGERPRINT_SEED: u64 = 0x5eed_0f_9e0;
