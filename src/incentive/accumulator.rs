use crate::error::MathError;
use crate::state::PoolData;
use crate::storage::{IncentiveStorage, Storage};
use alloy_primitives::U256;

/// Tick points at the four ticks a range query touches.
///
/// Ticks at or below the pool's active interval hold the growth collected
/// below them; ticks at or above it hold the growth collected above them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Corners {
    pub min: U256,
    pub max: U256,
    pub lower: U256,
    pub upper: U256,
}

impl Corners {
    pub fn new(min: U256, max: U256, lower: U256, upper: U256) -> Self {
        Self {
            min,
            max,
            lower,
            upper,
        }
    }

    /// Loads the corners for `[q_min, q_max)` against the pool's current
    /// interval.
    pub fn read<S: Storage>(
        store: &IncentiveStorage<S>,
        pool_id: U256,
        pool: &PoolData,
        q_min: u64,
        q_max: u64,
    ) -> Self {
        Self {
            min: store.read_tick_points(pool_id, q_min),
            max: store.read_tick_points(pool_id, q_max),
            lower: store.read_tick_points(pool_id, pool.q_lower),
            upper: store.read_tick_points(pool_id, pool.q_upper),
        }
    }
}

/// Which side of the pool's active interval a position range sits on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RangePlacement {
    /// The whole range is at or above `q_upper`.
    Above,
    /// The whole range is at or below `q_lower`.
    Below,
    Overlapping,
}

impl RangePlacement {
    pub fn of(pool: &PoolData, q_min: u64, q_max: u64) -> Self {
        if pool.q_upper <= q_min {
            RangePlacement::Above
        } else if q_max <= pool.q_lower {
            RangePlacement::Below
        } else {
            RangePlacement::Overlapping
        }
    }
}

/// Evanescent points per share accumulated inside `[q_min, q_max)` over the
/// pool's whole history.
///
/// The caller is expected to skip this when the pool has no range
/// (`q_lower == q_upper`); nothing has accrued in that case.
pub fn calculate_evanescent_points_per_share(
    pool: &PoolData,
    q_min: u64,
    q_max: u64,
    corners: &Corners,
) -> Result<U256, MathError> {
    match RangePlacement::of(pool, q_min, q_max) {
        RangePlacement::Above => corners
            .min
            .checked_sub(corners.max)
            .ok_or(MathError::Underflow),
        RangePlacement::Below => corners
            .max
            .checked_sub(corners.min)
            .ok_or(MathError::Underflow),
        RangePlacement::Overlapping => pool
            .active_evanescent_points_per_share
            .checked_add(corners.lower)
            .ok_or(MathError::Overflow)?
            .checked_sub(corners.min)
            .ok_or(MathError::Underflow)?
            .checked_add(corners.upper)
            .ok_or(MathError::Overflow)?
            .checked_sub(corners.max)
            .ok_or(MathError::Underflow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(q_lower: u64, q_upper: u64, active: u64) -> PoolData {
        PoolData {
            block_number: 0,
            q_lower,
            q_upper,
            active_evanescent_points_per_share: U256::from(active),
        }
    }

    fn u(x: u64) -> U256 {
        U256::from(x)
    }

    // Corner words are planted the way the reference harness does it: two
    // halves derived from a pool word and two from a pool id, ordered so the
    // subtraction in each case is non-negative.
    fn halves(word: U256) -> (U256, U256) {
        let mod_96 = (U256::ONE << 96) - U256::ONE;
        ((word >> 160) >> 1, (word & mod_96) >> 1)
    }

    // ------------------------- placement -------------------------

    #[test]
    fn placement_selects_the_case() {
        let p = pool(100, 110, 0);
        assert_eq!(RangePlacement::of(&p, 110, 150), RangePlacement::Above);
        assert_eq!(RangePlacement::of(&p, 50, 100), RangePlacement::Below);
        assert_eq!(RangePlacement::of(&p, 90, 120), RangePlacement::Overlapping);
        assert_eq!(RangePlacement::of(&p, 100, 110), RangePlacement::Overlapping);
    }

    // ------------------------- harness vectors -------------------------

    #[test]
    fn above_range_matches_harness_formula() {
        let word = U256::from_limbs([0xF00F_F00F, 0x1234, 0xABCD, 0xFFFF_0000_1111_2222]);
        let (p0, p1) = halves(word);
        let p = pool(0, 10, 5);
        // A: corner[qMin] = max, corner[qMax] = min
        let corners = Corners::new(p0.max(p1), p0.min(p1), U256::ZERO, U256::ZERO);
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 20, 30, &corners).unwrap(),
            p0.max(p1) - p0.min(p1)
        );
    }

    #[test]
    fn below_range_matches_harness_formula() {
        let word = U256::from_limbs([7, 0, 0, 0xF00F]);
        let (p0, p1) = halves(word);
        let p = pool(40, 50, 5);
        // B: corner[qMin] = min, corner[qMax] = max
        let corners = Corners::new(p0.min(p1), p0.max(p1), U256::ZERO, U256::ZERO);
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 20, 30, &corners).unwrap(),
            p0.max(p1) - p0.min(p1)
        );
    }

    #[test]
    fn overlapping_range_matches_harness_formula() {
        let (p0, p1) = halves(U256::from_limbs([0x1111, 0x2222, 0x3333, 0x4444]));
        let (p2, p3) = halves(U256::from_limbs([0x9999, 0x8888, 0x7777, 0x6666]));
        let active = 1234u64;
        let p = pool(20, 30, active);
        let corners = Corners::new(p0.min(p1), p2.min(p3), p0.max(p1), p2.max(p3));
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 10, 40, &corners).unwrap(),
            u(active) + p0.max(p1) + p2.max(p3) - p0.min(p1) - p2.min(p3)
        );
    }

    // ------------------------- semantics -------------------------

    #[test]
    fn overlap_with_matching_bounds_is_the_active_value() {
        // qMin == qLower and qMax == qUpper read the same ticks twice
        let p = pool(20, 30, 77);
        let corners = Corners::new(u(5), u(9), u(5), u(9));
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 20, 30, &corners).unwrap(),
            u(77)
        );
    }

    #[test]
    fn wider_overlap_adds_growth_on_both_sides() {
        // growth below 20 is 40, below 10 is 15; above 30 is 25, above 50 is 5
        let p = pool(20, 30, 100);
        let corners = Corners::new(u(15), u(5), u(40), u(25));
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 10, 50, &corners).unwrap(),
            u(100 + 25 + 20)
        );
    }

    #[test]
    fn inconsistent_corners_underflow() {
        let p = pool(0, 10, 0);
        let corners = Corners::new(u(1), u(2), U256::ZERO, U256::ZERO);
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 20, 30, &corners),
            Err(MathError::Underflow)
        );
    }

    #[test]
    fn overlap_overflow_is_reported() {
        let p = pool(0, 10, 1);
        let corners = Corners::new(U256::ZERO, U256::ZERO, U256::MAX, U256::ZERO);
        assert_eq!(
            calculate_evanescent_points_per_share(&p, 0, 10, &corners),
            Err(MathError::Overflow)
        );
    }
}
