//! Vegetation health score from mean NDVI.

/// Map mean NDVI to a discretized 0-1 vegetation health score.
pub fn vegetation_health_score(mean_ndvi: f64) -> f64 {
    if mean_ndvi >= 0.65 {
        1.0
    } else if mean_ndvi >= 0.5 {
        0.7
    } else if mean_ndvi >= 0.3 {
        0.4
    } else {
        0.1
    }
}
