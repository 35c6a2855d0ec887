//! # Coupon Module
//!
//! Eligibility checks and redemption caps for coupon codes.
//!
//! ## Redemption Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  code "eid10 " ──► normalize_code ──► "EID10" ──► lookup (db)           │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  check: active? started? expired? min purchase? usage left?            │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  raw    = fixed amount | subtotal × rate                               │
//! │  capped = min(raw, max_redeemable, profit)   profit = subtotal − cost   │
//! │  redeem = max(capped, 0)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CouponError;
use crate::money::Money;
use crate::types::Coupon;

/// Canonical form of a coupon code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Which bound limited the redeemed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RedeemCap {
    /// The coupon's own value was used in full.
    None,
    /// Limited by the coupon's max redeemable amount.
    MaxRedeemable,
    /// Limited by the order's profit margin.
    Profit,
}

/// Outcome of applying a coupon to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub coupon_id: String,
    pub code: String,
    /// Discount before any cap.
    pub raw: Money,
    /// Discount actually subtracted from the order.
    pub amount: Money,
    pub capped_by: RedeemCap,
}

impl Coupon {
    /// Checks whether the coupon can be used on an order with `subtotal` at
    /// instant `now`.
    pub fn check(&self, subtotal: Money, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive {
                code: self.code.clone(),
            });
        }

        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return Err(CouponError::NotStarted {
                    code: self.code.clone(),
                });
            }
        }

        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return Err(CouponError::Expired {
                    code: self.code.clone(),
                });
            }
        }

        if subtotal < self.min_purchase() {
            return Err(CouponError::MinimumPurchaseNotMet {
                code: self.code.clone(),
                minimum: self.min_purchase_cents,
                subtotal: subtotal.cents(),
            });
        }

        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(CouponError::UsageLimitReached {
                    code: self.code.clone(),
                    limit,
                });
            }
        }

        Ok(())
    }
}

/// Applies `coupon` to an order with the given subtotal and cost.
///
/// The redeemed amount never exceeds the coupon's max redeemable amount nor
/// the order's profit, and is never negative.
///
/// ```rust
/// use bazaar_core::coupon::redeem;
/// # use bazaar_core::{AmountKind, Coupon, Money};
/// # use chrono::Utc;
/// # let now = Utc::now();
/// # let coupon = Coupon {
/// #     id: "c1".into(), code: "TAKE20".into(), kind: AmountKind::Percentage,
/// #     amount: 2000, starts_at: None, expires_at: None, min_purchase_cents: 0,
/// #     max_redeemable_cents: None, usage_count: 0, usage_limit: None,
/// #     is_active: true, created_at: now, updated_at: now,
/// # };
/// // 20% of $100 = $20, but profit is only $15
/// let r = redeem(&coupon, Money::from_cents(10_000), Money::from_cents(8_500), now).unwrap();
/// assert_eq!(r.amount.cents(), 1_500);
/// ```
pub fn redeem(
    coupon: &Coupon,
    subtotal: Money,
    cost: Money,
    now: DateTime<Utc>,
) -> Result<Redemption, CouponError> {
    coupon.check(subtotal, now)?;

    let raw = coupon.adjustment().amount_on(subtotal).floor_zero();
    let profit = (subtotal - cost).floor_zero();

    let mut amount = raw;
    let mut capped_by = RedeemCap::None;

    if let Some(max) = coupon.max_redeemable() {
        if amount > max {
            amount = max;
            capped_by = RedeemCap::MaxRedeemable;
        }
    }

    if amount > profit {
        amount = profit;
        capped_by = RedeemCap::Profit;
    }

    Ok(Redemption {
        coupon_id: coupon.id.clone(),
        code: coupon.code.clone(),
        raw,
        amount: amount.floor_zero(),
        capped_by,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AmountKind;
    use chrono::Duration;

    fn coupon(kind: AmountKind, amount: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "coupon-1".to_string(),
            code: "EID10".to_string(),
            kind,
            amount,
            starts_at: None,
            expires_at: None,
            min_purchase_cents: 0,
            max_redeemable_cents: None,
            usage_count: 0,
            usage_limit: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  eid10 "), "EID10");
    }

    #[test]
    fn test_fixed_coupon_within_profit() {
        let c = coupon(AmountKind::Fixed, 500);
        let r = redeem(&c, Money::from_cents(10_000), Money::from_cents(6_000), Utc::now()).unwrap();
        assert_eq!(r.amount.cents(), 500);
        assert_eq!(r.capped_by, RedeemCap::None);
    }

    #[test]
    fn test_percentage_coupon_capped_by_max_redeemable() {
        let mut c = coupon(AmountKind::Percentage, 2_000); // 20%
        c.max_redeemable_cents = Some(1_000);
        let r = redeem(&c, Money::from_cents(10_000), Money::from_cents(2_000), Utc::now()).unwrap();
        assert_eq!(r.raw.cents(), 2_000);
        assert_eq!(r.amount.cents(), 1_000);
        assert_eq!(r.capped_by, RedeemCap::MaxRedeemable);
    }

    #[test]
    fn test_coupon_capped_by_profit_after_max() {
        let mut c = coupon(AmountKind::Fixed, 5_000);
        c.max_redeemable_cents = Some(3_000);
        // profit is 1_200
        let r = redeem(&c, Money::from_cents(10_000), Money::from_cents(8_800), Utc::now()).unwrap();
        assert_eq!(r.amount.cents(), 1_200);
        assert_eq!(r.capped_by, RedeemCap::Profit);
    }

    #[test]
    fn test_coupon_on_loss_making_order_redeems_nothing() {
        let c = coupon(AmountKind::Fixed, 500);
        let r = redeem(&c, Money::from_cents(1_000), Money::from_cents(1_500), Utc::now()).unwrap();
        assert_eq!(r.amount, Money::zero());
    }

    #[test]
    fn test_inactive_coupon() {
        let mut c = coupon(AmountKind::Fixed, 500);
        c.is_active = false;
        let err = c.check(Money::from_cents(10_000), Utc::now()).unwrap_err();
        assert!(matches!(err, CouponError::Inactive { .. }));
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut c = coupon(AmountKind::Fixed, 500);

        c.starts_at = Some(now + Duration::days(1));
        assert!(matches!(
            c.check(Money::from_cents(10_000), now),
            Err(CouponError::NotStarted { .. })
        ));

        c.starts_at = Some(now - Duration::days(10));
        c.expires_at = Some(now - Duration::days(1));
        assert!(matches!(
            c.check(Money::from_cents(10_000), now),
            Err(CouponError::Expired { .. })
        ));

        c.expires_at = Some(now + Duration::days(1));
        assert!(c.check(Money::from_cents(10_000), now).is_ok());
    }

    #[test]
    fn test_minimum_purchase() {
        let mut c = coupon(AmountKind::Fixed, 500);
        c.min_purchase_cents = 5_000;
        let err = c.check(Money::from_cents(4_999), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            CouponError::MinimumPurchaseNotMet {
                code: "EID10".to_string(),
                minimum: 5_000,
                subtotal: 4_999,
            }
        );
        assert!(c.check(Money::from_cents(5_000), Utc::now()).is_ok());
    }

    #[test]
    fn test_usage_limit() {
        let mut c = coupon(AmountKind::Fixed, 500);
        c.usage_limit = Some(3);
        c.usage_count = 3;
        assert!(matches!(
            c.check(Money::from_cents(10_000), Utc::now()),
            Err(CouponError::UsageLimitReached { limit: 3, .. })
        ));
        c.usage_count = 2;
        assert!(c.check(Money::from_cents(10_000), Utc::now()).is_ok());
    }
}
