//! Dutch-auction rate-bump curve.
//!
//! The curve starts at `initial_rate_bump` at `start_time`, passes through
//! every declared point, and reaches zero at `start_time + duration`.
//! Between breakpoints the bump is interpolated linearly:
//!
//! ```text
//! bump = prev_bump + (next_bump - prev_bump) * (t - (start + prev_t)) / (next_t - prev_t)
//! ```
//!
//! The division truncates toward zero. A time exactly on a breakpoint
//! yields that breakpoint's bump.

use fusion_types::{AuctionDetails, Timestamp};

/// Rate bump in force at `now`.
///
/// - `now <= start_time` → `initial_rate_bump`
/// - `now >= start_time + duration` → `0`
/// - otherwise linear interpolation between the bracketing breakpoints
#[must_use]
pub fn compute_rate_bump(now: Timestamp, details: &AuctionDetails) -> u64 {
    let start = Timestamp::from(details.start_time);
    if now <= start {
        return u64::from(details.initial_rate_bump);
    }
    if now >= details.end_time() {
        return 0;
    }

    let elapsed = now - start;
    let mut prev_bump = u64::from(details.initial_rate_bump);
    let mut prev_offset = 0u64;

    for point in &details.points {
        let offset = u64::from(point.offset);
        if elapsed < offset {
            return interpolate(prev_bump, prev_offset, u64::from(point.rate_bump), offset, elapsed);
        }
        prev_bump = u64::from(point.rate_bump);
        prev_offset = offset;
    }

    interpolate(prev_bump, prev_offset, 0, u64::from(details.duration), elapsed)
}

/// Caller guarantees `prev_t <= t < next_t`.
fn interpolate(prev_bump: u64, prev_t: u64, next_bump: u64, next_t: u64, t: u64) -> u64 {
    // Bumps are 24-bit and times 32-bit, so the product fits i128 with room
    // to spare; the signed difference truncates toward zero.
    let delta = i128::from(next_bump) - i128::from(prev_bump);
    let step = delta * i128::from(t - prev_t) / i128::from(next_t - prev_t);
    let bump = i128::from(prev_bump) + step;
    u64::try_from(bump).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_types::AuctionPoint;

    const START: u32 = 1_000_000;

    fn details(initial: u32, points: &[(u32, u32)]) -> AuctionDetails {
        AuctionDetails::new(
            START,
            1_800,
            initial,
            points
                .iter()
                .map(|&(rate_bump, offset)| AuctionPoint { rate_bump, offset })
                .collect(),
        )
        .unwrap()
    }

    fn at(offset: u64) -> Timestamp {
        Timestamp::from(START) + offset
    }

    #[test]
    fn before_start_is_initial_bump() {
        let d = details(1_000_000, &[]);
        assert_eq!(compute_rate_bump(0, &d), 1_000_000);
        assert_eq!(compute_rate_bump(at(0), &d), 1_000_000);
    }

    #[test]
    fn at_and_after_end_is_zero() {
        let d = details(1_000_000, &[(900_000, 240)]);
        assert_eq!(compute_rate_bump(at(1_800), &d), 0);
        assert_eq!(compute_rate_bump(at(10_000), &d), 0);
    }

    #[test]
    fn linear_decay_without_points() {
        let d = details(1_000_000, &[]);
        // Halfway: 1_000_000 - 1_000_000 * 900 / 1800
        assert_eq!(compute_rate_bump(at(900), &d), 500_000);
        // Truncation toward zero on the step: -1_000_000 * 1 / 1800 = -555
        assert_eq!(compute_rate_bump(at(1), &d), 999_445);
    }

    #[test]
    fn exact_point_offset_returns_point_bump() {
        let d = details(0, &[(900_000, 240)]);
        assert_eq!(compute_rate_bump(at(240), &d), 900_000);
    }

    #[test]
    fn before_point_interpolates_from_initial() {
        let d = details(1_000_000, &[(900_000, 240)]);
        assert_eq!(compute_rate_bump(at(120), &d), 950_000);
    }

    #[test]
    fn after_point_interpolates_to_zero_at_end() {
        let d = details(0, &[(900_000, 240)]);
        // 900_000 - 900_000 * 520 / 1560 = 600_000
        assert_eq!(compute_rate_bump(at(760), &d), 600_000);
    }

    #[test]
    fn between_two_points() {
        let d = details(0, &[(500_000, 240), (100_000, 1_480)]);
        // 500_000 - 400_000 * 620 / 1240 = 300_000
        assert_eq!(compute_rate_bump(at(860), &d), 300_000);
        assert_eq!(compute_rate_bump(at(1_480), &d), 100_000);
    }

    #[test]
    fn rising_segment_interpolates_upward() {
        let d = details(0, &[(900_000, 240)]);
        assert_eq!(compute_rate_bump(at(120), &d), 450_000);
    }

    #[test]
    fn decreasing_curve_is_non_increasing_over_lifetime() {
        let d = details(2_000_000, &[(1_500_000, 300), (400_000, 1_200)]);
        let mut last = compute_rate_bump(at(0), &d);
        for t in 1..=1_900 {
            let bump = compute_rate_bump(at(t), &d);
            assert!(bump <= last, "bump rose at t={t}: {last} -> {bump}");
            last = bump;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn zero_duration_auction_is_flat_zero_after_start() {
        let d = AuctionDetails::new(START, 0, 500_000, Vec::new()).unwrap();
        assert_eq!(compute_rate_bump(at(0), &d), 500_000);
        assert_eq!(compute_rate_bump(at(1), &d), 0);
    }
}
