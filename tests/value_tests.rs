//! Asset bag arithmetic, bounds, fee split and wire decoding.

use githoney_escrow::sdk::value::{self, BASIS_POINTS};
use githoney_escrow::sdk::{AssetBag, AssetClass, BountyError, MAX_ASSETS};
use num_bigint::BigUint;

fn token(n: u8) -> AssetClass {
    AssetClass::new(vec![0xaa, n], b"TOKEN".to_vec())
}

/// `n` distinct non-native classes, one unit each.
fn tokens(range: std::ops::Range<u8>) -> AssetBag {
    range.fold(AssetBag::new(), |bag, n| bag.with(token(n), 1))
}

// ---------------------------------------------------------------------------
// Union
// ---------------------------------------------------------------------------

mod merge {
    use super::*;

    #[test]
    fn is_commutative() {
        let a = AssetBag::lovelace(1_000).with(token(1), 5);
        let b = AssetBag::lovelace(50).with(token(2), 7);
        assert_eq!(value::merge(&a, &b), value::merge(&b, &a));
    }

    #[test]
    fn with_itself_keeps_size_and_doubles_quantities() {
        let a = AssetBag::lovelace(1_000).with(token(1), 5).with(token(2), 1);
        let doubled = a.merge(&a);
        assert_eq!(value::size(&doubled), value::size(&a));
        assert_eq!(doubled.quantity_of(&AssetClass::lovelace()), BigUint::from(2_000u32));
        assert_eq!(doubled.quantity_of(&token(1)), BigUint::from(10u32));
    }

    #[test]
    fn adds_quantities_per_class() {
        let merged = AssetBag::lovelace(1_000).merge(&AssetBag::lovelace(50));
        assert_eq!(merged, AssetBag::lovelace(1_050));
        assert_eq!(merged.size(), 1);
    }

    #[test]
    fn empty_is_identity() {
        let a = AssetBag::lovelace(3).with(token(9), 4);
        assert_eq!(a.merge(&AssetBag::new()), a);
        assert_eq!(AssetBag::new().merge(&a), a);
    }

    #[test]
    fn quantities_exceed_u64() {
        let big = AssetBag::new().with(token(1), u64::MAX);
        let sum = big.merge(&big);
        let expected = BigUint::from(u64::MAX) * 2u32;
        assert_eq!(sum.quantity_of(&token(1)), expected);
    }

    #[test]
    fn zero_quantities_never_stored() {
        let mut bag = AssetBag::new();
        bag.add(token(1), BigUint::from(0u32));
        assert!(bag.is_empty());
        assert_eq!(AssetBag::new().with(token(2), 0).size(), 0);
    }
}

// ---------------------------------------------------------------------------
// Cardinality bound
// ---------------------------------------------------------------------------

mod bound {
    use super::*;

    #[test]
    fn native_asset_counts_toward_size() {
        let bag = AssetBag::lovelace(1).with(token(1), 1);
        assert_eq!(bag.size(), 2);
    }

    #[test]
    fn exactly_max_is_accepted() {
        let bag = AssetBag::lovelace(1).merge(&tokens(0..14));
        assert_eq!(bag.size(), MAX_ASSETS);
        assert!(value::enforce_bound(&bag).is_ok());
    }

    #[test]
    fn one_over_max_is_rejected() {
        let bag = AssetBag::lovelace(1).merge(&tokens(0..15));
        assert_eq!(
            bag.enforce_bound(),
            Err(BountyError::TooManyAssets {
                count: 16,
                max: MAX_ASSETS
            })
        );
    }
}

// ---------------------------------------------------------------------------
// Subtraction and coverage
// ---------------------------------------------------------------------------

mod subtraction {
    use super::*;

    #[test]
    fn covers_requires_every_class() {
        let held = AssetBag::lovelace(100).with(token(1), 3);
        assert!(held.covers(&AssetBag::lovelace(100)));
        assert!(held.covers(&AssetBag::new().with(token(1), 3)));
        assert!(!held.covers(&AssetBag::lovelace(101)));
        assert!(!held.covers(&AssetBag::new().with(token(2), 1)));
    }

    #[test]
    fn checked_sub_drops_exhausted_classes() {
        let held = AssetBag::lovelace(100).with(token(1), 3);
        let left = held.checked_sub(&AssetBag::new().with(token(1), 3)).unwrap();
        assert_eq!(left, AssetBag::lovelace(100));
    }

    #[test]
    fn checked_sub_uncovered_is_none() {
        assert!(AssetBag::lovelace(1).checked_sub(&AssetBag::lovelace(2)).is_none());
    }
}

// ---------------------------------------------------------------------------
// Fee split
// ---------------------------------------------------------------------------

mod fee_split {
    use super::*;

    #[test]
    fn floors_fee_per_asset() {
        // 5% of 1050 = 52.5 -> 52; 5% of 7 = 0.35 -> 0
        let live = AssetBag::lovelace(1_050).with(token(1), 7);
        let (payout, fee) = live.split_fee(500).unwrap();
        assert_eq!(fee, AssetBag::lovelace(52));
        assert_eq!(payout, AssetBag::lovelace(998).with(token(1), 7));
    }

    #[test]
    fn parts_sum_to_whole() {
        let live = AssetBag::lovelace(999_999).with(token(1), 12_345).with(token(2), 1);
        for bps in [0, 1, 250, 333, 5_000, 9_999, BASIS_POINTS] {
            let (payout, fee) = live.split_fee(bps).unwrap();
            assert_eq!(payout.merge(&fee), live, "bps {bps}");
        }
    }

    #[test]
    fn zero_rate_takes_nothing() {
        let live = AssetBag::lovelace(10);
        let (payout, fee) = live.split_fee(0).unwrap();
        assert_eq!(payout, live);
        assert!(fee.is_empty());
    }

    #[test]
    fn full_rate_takes_everything() {
        let live = AssetBag::lovelace(10).with(token(1), 3);
        let (payout, fee) = live.split_fee(BASIS_POINTS).unwrap();
        assert!(payout.is_empty());
        assert_eq!(fee, live);
    }

    #[test]
    fn rate_above_whole_is_rejected() {
        assert_eq!(
            AssetBag::lovelace(10).split_fee(10_001),
            Err(BountyError::InvalidFeeRate(10_001))
        );
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

mod wire {
    use super::*;

    #[test]
    fn quantities_are_decimal_strings() {
        let json = serde_json::to_value(AssetBag::lovelace(1_050)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "asset": {"policy_id": "", "asset_name": ""},
                "amount": "1050"
            }])
        );
    }

    #[test]
    fn decodes_large_quantities() {
        let raw = r#"[{"asset":{"policy_id":"aa01","asset_name":"544f4b454e"},"amount":"340282366920938463463374607431768211456"}]"#;
        let bag: AssetBag = serde_json::from_str(raw).unwrap();
        let expected: BigUint = "340282366920938463463374607431768211456".parse().unwrap();
        assert_eq!(bag.quantity_of(&token(1)), expected);
    }

    #[test]
    fn rejects_zero_quantity() {
        let raw = r#"[{"asset":{"policy_id":"","asset_name":""},"amount":"0"}]"#;
        assert!(serde_json::from_str::<AssetBag>(raw).is_err());
    }

    #[test]
    fn rejects_duplicate_class() {
        let raw = r#"[
            {"asset":{"policy_id":"","asset_name":""},"amount":"1"},
            {"asset":{"policy_id":"","asset_name":""},"amount":"2"}
        ]"#;
        assert!(serde_json::from_str::<AssetBag>(raw).is_err());
    }

    #[test]
    fn rejects_negative_quantity() {
        let raw = r#"[{"asset":{"policy_id":"","asset_name":""},"amount":"-5"}]"#;
        assert!(serde_json::from_str::<AssetBag>(raw).is_err());
    }
}
