//! Vesting curves
//!
//! Pure integer arithmetic; no floating point anywhere in the payout path.

use super::types::{VestingSchedule, VestingType};

/// Step-vesting month: fixed 30 days, not a calendar month
pub const MONTH_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Fixed-point scale for the linear ratio
const RATIO_SCALE: u128 = 1_000_000;

/// Amount vested by `now` under the schedule's curve
pub fn vested_amount_at(schedule: &VestingSchedule, now: i64) -> u64 {
    vested_amount(
        schedule.total_amount,
        schedule.start_time,
        schedule.end_time,
        schedule.cliff_time,
        schedule.vesting_type,
        now,
    )
}

pub fn vested_amount(
    total: u64,
    start: i64,
    end: i64,
    cliff: Option<i64>,
    vesting_type: VestingType,
    now: i64,
) -> u64 {
    if now < start {
        return 0;
    }
    if cliff.is_some_and(|cliff| now < cliff) {
        return 0;
    }
    if now >= end {
        return total;
    }

    // start <= now < end here, so both spans are positive; i128 keeps them exact
    let elapsed = (now as i128 - start as i128) as u128;
    let duration = (end as i128 - start as i128) as u128;
    match vesting_type {
        VestingType::Linear => {
            let ratio = elapsed * RATIO_SCALE / duration;
            (total as u128 * ratio / RATIO_SCALE) as u64
        }
        VestingType::Cliff => match cliff {
            // Past the cliff (checked above)
            Some(_) => total,
            // Without a cliff the whole amount waits for the end
            None => 0,
        },
        VestingType::Step => {
            let total_months = (duration / MONTH_SECONDS as u128).max(1);
            let elapsed_months = (elapsed / MONTH_SECONDS as u128).min(total_months);
            (total as u128 * elapsed_months / total_months) as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;
    const T: i64 = 1_700_000_000;

    fn all_types() -> [VestingType; 3] {
        [VestingType::Linear, VestingType::Cliff, VestingType::Step]
    }

    #[test]
    fn test_linear_quarter_point() {
        let vested = vested_amount(1_000_000_000, T, T + 100 * DAY, None, VestingType::Linear, T + 25 * DAY);
        assert!((249_999_999..=250_000_001).contains(&vested), "vested {}", vested);
    }

    #[test]
    fn test_before_start_and_after_end() {
        for kind in all_types() {
            let cliff = Some(T + 10 * DAY);
            assert_eq!(vested_amount(500, T, T + 90 * DAY, cliff, kind, T - 1), 0);
            assert_eq!(vested_amount(500, T, T + 90 * DAY, cliff, kind, T + 90 * DAY), 500);
            assert_eq!(vested_amount(500, T, T + 90 * DAY, cliff, kind, i64::MAX), 500);
        }
    }

    #[test]
    fn test_cliff_is_two_valued() {
        let total = 777_777;
        let cliff = T + 40 * DAY;
        for offset in (0..120).map(|d| d * DAY / 2) {
            let now = T + offset;
            let vested = vested_amount(total, T, T + 60 * DAY, Some(cliff), VestingType::Cliff, now);
            if now < cliff {
                assert_eq!(vested, 0);
            } else {
                assert_eq!(vested, total);
            }
        }
    }

    #[test]
    fn test_cliff_gates_linear() {
        let cliff = T + 30 * DAY;
        assert_eq!(vested_amount(1_000, T, T + 100 * DAY, Some(cliff), VestingType::Linear, cliff - 1), 0);
        assert_eq!(vested_amount(1_000, T, T + 100 * DAY, Some(cliff), VestingType::Linear, cliff), 300);
    }

    #[test]
    fn test_step_whole_months() {
        let end = T + 12 * MONTH_SECONDS;
        assert_eq!(vested_amount(1_200, T, end, None, VestingType::Step, T + MONTH_SECONDS - 1), 0);
        assert_eq!(vested_amount(1_200, T, end, None, VestingType::Step, T + MONTH_SECONDS), 100);
        assert_eq!(vested_amount(1_200, T, end, None, VestingType::Step, T + 7 * MONTH_SECONDS + 5), 700);
    }

    #[test]
    fn test_step_shorter_than_a_month() {
        let end = T + 10 * DAY;
        assert_eq!(vested_amount(1_000, T, end, None, VestingType::Step, T + 9 * DAY), 0);
        assert_eq!(vested_amount(1_000, T, end, None, VestingType::Step, end), 1_000);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let totals = [1u64, 999, 1_000_000_000, u64::MAX];
        let cliffs = [None, Some(T + 17 * DAY)];
        for kind in all_types() {
            for total in totals {
                for cliff in cliffs {
                    let end = T + 95 * DAY;
                    let mut previous = 0;
                    let mut now = T - DAY;
                    while now <= end + DAY {
                        let vested = vested_amount(total, T, end, cliff, kind, now);
                        assert!(vested >= previous, "{:?} decreased at {}", kind, now);
                        assert!(vested <= total);
                        previous = vested;
                        now += 3_600 * 7;
                    }
                    assert_eq!(previous, total);
                }
            }
        }
    }

    #[test]
    fn test_spans_wider_than_i64() {
        let start = -5_000_000_000_000_000_000;
        let end = 5_000_000_000_000_000_000;
        assert_eq!(vested_amount(1_000, start, end, None, VestingType::Linear, 0), 500);

        for kind in all_types() {
            let vested = vested_amount(1_000, i64::MIN, i64::MAX, Some(0), kind, 0);
            assert!(vested <= 1_000, "{:?} vested {}", kind, vested);
        }
        assert_eq!(vested_amount(1_000, i64::MIN, i64::MAX, None, VestingType::Linear, 0), 500);
        assert_eq!(vested_amount(1_000, i64::MIN, i64::MAX, Some(0), VestingType::Cliff, 0), 1_000);
        assert_eq!(vested_amount(1_000, i64::MIN, i64::MAX, None, VestingType::Step, 0), 499);
    }
}
