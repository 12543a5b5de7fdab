//! Platform fee arithmetic
//!
//! Every path that advertises or charges a fee goes through `split`, so the
//! quoted net and the on-chain fee transfer always agree.

use serde::{Deserialize, Serialize};

/// Platform fee in basis points (10%)
pub const FEE_RATE_BPS: u64 = 1_000;

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
}

impl FeeBreakdown {
    /// Component-wise sum, used for batch totals
    pub fn combine(self, other: FeeBreakdown) -> FeeBreakdown {
        FeeBreakdown {
            gross: self.gross.saturating_add(other.gross),
            fee: self.fee.saturating_add(other.fee),
            net: self.net.saturating_add(other.net),
        }
    }
}

/// Split a gross lamport amount into fee and net payout
///
/// `fee = floor(gross * FEE_RATE_BPS / 10_000)`, `net = gross - fee`.
pub fn split(gross: u64) -> FeeBreakdown {
    let fee = (gross as u128 * FEE_RATE_BPS as u128 / BPS_DENOMINATOR as u128) as u64;
    FeeBreakdown {
        gross,
        fee,
        net: gross - fee,
    }
}

/// Sum of per-item splits; not the same as splitting the sum
pub fn split_each<I: IntoIterator<Item = u64>>(grosses: I) -> FeeBreakdown {
    grosses
        .into_iter()
        .map(split)
        .fold(FeeBreakdown::default(), FeeBreakdown::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_minimum_split() {
        let breakdown = split(2_039_280);
        assert_eq!(breakdown.fee, 203_928);
        assert_eq!(breakdown.net, 1_835_352);
    }

    #[test]
    fn test_fee_rounds_down() {
        assert_eq!(split(9).fee, 0);
        assert_eq!(split(19).fee, 1);
        assert_eq!(split(0), FeeBreakdown::default());
    }

    #[test]
    fn test_conservation_holds_across_range() {
        let samples = (0..5_000u64)
            .chain([u64::MAX, u64::MAX - 1, 1 << 63, 2_039_280, 999_999_999]);
        for gross in samples {
            let b = split(gross);
            assert_eq!(b.fee + b.net, gross, "gross {}", gross);
            assert_eq!(b.fee as u128, gross as u128 / 10, "gross {}", gross);
        }
    }

    #[test]
    fn test_split_each_sums_per_item_fees() {
        let total = split_each([19, 19]);
        // Per-item floor: 1 + 1, not floor(38 / 10)
        assert_eq!(total.fee, 2);
        assert_eq!(total.gross, 38);
        assert_eq!(total.net, 36);
    }
}
