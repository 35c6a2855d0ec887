//! # Domain Types
//!
//! Core domain types used throughout Bazaar.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Variation     │   │     Order       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku            │   │  code           │   │  order_id (FK)  │       │
//! │  │  cost / sale    │   │  subtotal, tax  │   │  method         │       │
//! │  │  quantity       │   │  redeem, due    │   │  amount_cents   │       │
//! │  │  discount rule  │   │  statuses       │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Coupon      │   │    Settings     │   │  DeliveryZone   │       │
//! │  │  kind + amount  │   │  tax / VAT      │   │  charge         │       │
//! │  │  window, limits │   │  Adjustment     │   │  free over X    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row types carry raw `*_cents` / `*_value` columns so they map one-to-one
//! onto the database; accessor methods hand out `Money` and `Adjustment`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Amount Kind / Adjustment
// =============================================================================

/// Whether an amount is a flat value or a percentage of some base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AmountKind {
    /// `value` is in cents.
    Fixed,
    /// `value` is in basis points.
    Percentage,
}

/// A fixed-or-percentage amount: item discounts, coupons, tax and VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustment {
    pub kind: AmountKind,
    /// Cents when `kind` is fixed, basis points when percentage.
    pub value: i64,
}

impl Adjustment {
    pub const fn fixed(cents: i64) -> Self {
        Adjustment {
            kind: AmountKind::Fixed,
            value: cents,
        }
    }

    pub const fn percentage(bps: u32) -> Self {
        Adjustment {
            kind: AmountKind::Percentage,
            value: bps as i64,
        }
    }

    pub const fn none() -> Self {
        Adjustment::fixed(0)
    }

    /// Rebuilds an adjustment from nullable columns. Missing halves mean no
    /// adjustment at all.
    pub fn from_parts(kind: Option<AmountKind>, value: Option<i64>) -> Option<Self> {
        match (kind, value) {
            (Some(kind), Some(value)) => Some(Adjustment { kind, value }),
            _ => None,
        }
    }

    /// The rate for percentage adjustments, clamped into `u32`.
    pub fn rate(&self) -> Rate {
        Rate::from_bps(u32::try_from(self.value.max(0)).unwrap_or(u32::MAX))
    }

    /// Resolves the adjustment against `base`.
    ///
    /// ```rust
    /// use bazaar_core::{Adjustment, Money};
    ///
    /// let base = Money::from_cents(20_000);
    /// assert_eq!(Adjustment::fixed(500).amount_on(base).cents(), 500);
    /// assert_eq!(Adjustment::percentage(750).amount_on(base).cents(), 1_500);
    /// ```
    pub fn amount_on(&self, base: Money) -> Money {
        match self.kind {
            AmountKind::Fixed => Money::from_cents(self.value),
            AmountKind::Percentage => base.percent_of(self.rate()),
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }
}

impl Default for Adjustment {
    fn default() -> Self {
        Adjustment::none()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product. Prices and stock live on its variations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A purchasable SKU of a product (size/colour) with its own price and stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Variation {
    pub id: String,
    pub product_id: String,
    /// Joined from `products.name` when loaded from the database.
    pub product_name: String,
    pub sku: String,
    /// Variation label, e.g. "Red / M".
    pub name: String,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    /// Quantity on hand.
    pub quantity: i64,
    pub discount_kind: Option<AmountKind>,
    pub discount_value: Option<i64>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Variation {
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// The per-item discount rule, if one is configured.
    pub fn discount(&self) -> Option<Adjustment> {
        Adjustment::from_parts(self.discount_kind, self.discount_value)
    }

    /// Name frozen onto order items: "Product - Variation".
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.product_name.clone()
        } else {
            format!("{} - {}", self.product_name, self.name)
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A redeemable coupon code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    /// Stored upper-cased.
    pub code: String,
    pub kind: AmountKind,
    /// Cents for fixed coupons, basis points for percentage coupons.
    pub amount: i64,
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub min_purchase_cents: i64,
    /// Upper bound on the redeemed amount. `None` or zero means uncapped.
    pub max_redeemable_cents: Option<i64>,
    pub usage_count: i64,
    /// `None` means unlimited.
    pub usage_limit: Option<i64>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// The coupon value as an adjustment.
    pub fn adjustment(&self) -> Adjustment {
        Adjustment {
            kind: self.kind,
            value: self.amount,
        }
    }

    #[inline]
    pub fn min_purchase(&self) -> Money {
        Money::from_cents(self.min_purchase_cents)
    }

    /// The redeem cap, ignoring non-positive values.
    pub fn max_redeemable(&self) -> Option<Money> {
        self.max_redeemable_cents
            .filter(|cents| *cents > 0)
            .map(Money::from_cents)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Store-wide settings. Only the tax/VAT part feeds into pricing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settings {
    pub store_name: String,
    pub currency: String,
    pub tax_kind: AmountKind,
    pub tax_value: i64,
    pub vat_kind: AmountKind,
    pub vat_value: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    pub fn tax(&self) -> Adjustment {
        Adjustment {
            kind: self.tax_kind,
            value: self.tax_value,
        }
    }

    pub fn vat(&self) -> Adjustment {
        Adjustment {
            kind: self.vat_kind,
            value: self.vat_value,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_name: "Bazaar".to_string(),
            currency: "USD".to_string(),
            tax_kind: AmountKind::Percentage,
            tax_value: 0,
            vat_kind: AmountKind::Percentage,
            vat_value: 0,
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Delivery Zone
// =============================================================================

/// A shipping destination with a flat delivery charge.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DeliveryZone {
    pub id: String,
    pub name: String,
    pub charge_cents: i64,
    /// Orders whose discounted subtotal reaches this ship free.
    pub free_delivery_min_cents: Option<i64>,
    pub is_active: bool,
}

impl DeliveryZone {
    #[inline]
    pub fn charge(&self) -> Money {
        Money::from_cents(self.charge_cents)
    }
}

// =============================================================================
// Order Enums
// =============================================================================

/// Where the order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    /// Storefront checkout.
    Online,
    /// Counter quick order.
    Pos,
}

impl OrderChannel {
    /// Prefix of generated order codes.
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            OrderChannel::Online => "ORD",
            OrderChannel::Pos => "POS",
        }
    }
}

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// How much of the grand total has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Tender used for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileBanking,
    BankTransfer,
    CashOnDelivery,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order with its full price breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub code: String,
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub delivery_zone_id: Option<String>,
    pub coupon_id: Option<String>,
    pub subtotal_cents: i64,
    pub cost_cents: i64,
    /// Sum of per-item discounts, informational (already inside subtotal).
    pub discount_cents: i64,
    /// Coupon discount subtracted from the total.
    pub redeem_cents: i64,
    pub tax_cents: i64,
    pub vat_cents: i64,
    pub delivery_cents: i64,
    pub grand_total_cents: i64,
    pub paid_cents: i64,
    pub due_cents: i64,
    pub change_cents: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    #[inline]
    pub fn due(&self) -> Money {
        Money::from_cents(self.due_cents)
    }

    /// Only orders that have not left the store can be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Processing)
    }
}

/// One variation allocated to an order.
/// Uses the snapshot pattern to freeze catalog data at order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub variation_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub unit_cost_cents: i64,
    /// Sale price before the per-item discount.
    pub list_price_cents: i64,
    /// Price actually charged per unit.
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
    pub line_cost_cents: i64,
    pub discount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payment received against an order.
/// An order can collect several payments when it is paid in instalments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// External reference (card auth code, mobile banking trx id).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_from_parts() {
        assert_eq!(
            Adjustment::from_parts(Some(AmountKind::Fixed), Some(300)),
            Some(Adjustment::fixed(300))
        );
        assert_eq!(Adjustment::from_parts(Some(AmountKind::Fixed), None), None);
        assert_eq!(Adjustment::from_parts(None, Some(300)), None);
    }

    #[test]
    fn test_adjustment_negative_percentage_is_zero_rate() {
        let adj = Adjustment {
            kind: AmountKind::Percentage,
            value: -500,
        };
        assert!(adj.rate().is_zero());
        assert_eq!(adj.amount_on(Money::from_cents(10_000)), Money::zero());
    }

    #[test]
    fn test_coupon_max_redeemable_ignores_zero() {
        let now = Utc::now();
        let mut coupon = Coupon {
            id: "c1".to_string(),
            code: "SAVE".to_string(),
            kind: AmountKind::Fixed,
            amount: 500,
            starts_at: None,
            expires_at: None,
            min_purchase_cents: 0,
            max_redeemable_cents: Some(0),
            usage_count: 0,
            usage_limit: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(coupon.max_redeemable(), None);
        coupon.max_redeemable_cents = Some(250);
        assert_eq!(coupon.max_redeemable(), Some(Money::from_cents(250)));
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(OrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_channel_prefix() {
        assert_eq!(OrderChannel::Online.code_prefix(), "ORD");
        assert_eq!(OrderChannel::Pos.code_prefix(), "POS");
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
    }
}
