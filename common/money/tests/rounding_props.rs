use bigdecimal::BigDecimal;
use common_money::{line_total, normalize_scale, Money};
use proptest::prelude::*;

proptest! {
    // Normalizing twice changes nothing and always yields two fractional digits.
    #[test]
    fn normalize_is_idempotent(units in -1_000_000i64..1_000_000, scale in 0i64..6) {
        let value = BigDecimal::new(units.into(), scale);
        let once = normalize_scale(&value);
        let twice = normalize_scale(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.as_bigint_and_exponent().1, 2);
    }

    // Rounding never moves a value by more than half a cent.
    #[test]
    fn normalize_stays_within_half_cent(units in -1_000_000i64..1_000_000, scale in 0i64..6) {
        let value = BigDecimal::new(units.into(), scale);
        let diff = (normalize_scale(&value) - &value).abs();
        prop_assert!(diff <= BigDecimal::new(5.into(), 3), "diff {} too large for {}", diff, value);
    }

    // Line totals are exact for cent-denominated prices.
    #[test]
    fn line_total_is_exact(cents in 0i64..10_000_000, quantity in 1i32..1_000) {
        let total = line_total(&Money::from_cents(cents), quantity);
        prop_assert_eq!(total, Money::from_cents(cents * i64::from(quantity)));
    }
}
