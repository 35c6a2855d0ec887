//! Delivery charge resolution.

use crate::money::Money;
use crate::types::DeliveryZone;

/// Resolves the delivery charge for an order whose discounted subtotal is
/// `base`.
///
/// No zone means no delivery (counter sales). A zone with a free-delivery
/// threshold ships free once `base` reaches it.
pub fn resolve(zone: Option<&DeliveryZone>, base: Money) -> Money {
    let Some(zone) = zone else {
        return Money::zero();
    };

    if let Some(min) = zone.free_delivery_min_cents {
        if min > 0 && base.cents() >= min {
            return Money::zero();
        }
    }

    zone.charge().floor_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(charge: i64, free_min: Option<i64>) -> DeliveryZone {
        DeliveryZone {
            id: "zone-1".to_string(),
            name: "Inside city".to_string(),
            charge_cents: charge,
            free_delivery_min_cents: free_min,
            is_active: true,
        }
    }

    #[test]
    fn test_no_zone_is_free() {
        assert_eq!(resolve(None, Money::from_cents(5_000)), Money::zero());
    }

    #[test]
    fn test_flat_charge() {
        let z = zone(600, None);
        assert_eq!(resolve(Some(&z), Money::from_cents(5_000)).cents(), 600);
    }

    #[test]
    fn test_free_delivery_threshold() {
        let z = zone(600, Some(10_000));
        assert_eq!(resolve(Some(&z), Money::from_cents(9_999)).cents(), 600);
        assert_eq!(resolve(Some(&z), Money::from_cents(10_000)), Money::zero());
    }

    #[test]
    fn test_zero_threshold_is_ignored() {
        let z = zone(600, Some(0));
        assert_eq!(resolve(Some(&z), Money::from_cents(1)).cents(), 600);
    }
}
