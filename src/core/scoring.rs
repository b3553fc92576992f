// src/core/scoring.rs

/// Every portfolio starts from this balance; the return rate is always
/// measured against it.
pub const STARTING_ASSETS: i64 = 1_000_000;

/// Tiered asset delta for a completed session.
///
/// A pure step function of the percentage score, evaluated top-down with
/// inclusive lower bounds, so 9/10 and 90/100 land in the same tier. A
/// session with no questions moves nothing.
pub fn asset_delta(score: i64, total_questions: i64) -> i64 {
    if total_questions <= 0 {
        return 0;
    }
    let percentage = score as f64 / total_questions as f64 * 100.0;

    if percentage >= 90.0 {
        50_000
    } else if percentage >= 80.0 {
        30_000
    } else if percentage >= 70.0 {
        15_000
    } else if percentage >= 60.0 {
        5_000
    } else if percentage >= 50.0 {
        0
    } else {
        -20_000
    }
}

/// Percentage change relative to the fixed starting balance. Computed on
/// read paths only, never stored.
pub fn return_rate(virtual_assets: i64) -> f64 {
    (virtual_assets - STARTING_ASSETS) as f64 * 100.0 / STARTING_ASSETS as f64
}

/// Replays (score, total_questions) results into the asset curve a student's
/// portfolio followed, starting at `STARTING_ASSETS`.
pub fn replay_assets(results: impl IntoIterator<Item = (i64, i64)>) -> Vec<i64> {
    let mut value = STARTING_ASSETS;
    let mut curve = vec![value];
    for (score, total) in results {
        value += asset_delta(score, total);
        curve.push(value);
    }
    curve
}
