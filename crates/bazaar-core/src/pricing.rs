//! # Pricing Module
//!
//! The one checkout pipeline shared by storefront checkout, point-of-sale
//! quick orders and coupon validation.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         quote_order()                                   │
//! │                                                                         │
//! │  lines ──► merge duplicates ──► validate quantities                    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  price_line(): sale price ─► item discount ─► clamp to cost floor      │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  subtotal = Σ line totals          cost = Σ line costs                 │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  coupon::redeem() ──► redeem (≤ max redeemable, ≤ profit)              │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  base = subtotal − redeem                                              │
//! │  tax = settings.tax on base    vat = settings.vat on base              │
//! │  delivery = delivery::resolve(zone, base)                              │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  grand total = base + tax + vat + delivery                             │
//! │  settle(): due = max(grand − paid, 0)                                  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  stock plan: on hand − requested ≥ 0 for every variation               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches the database. `bazaar-db` persists the quote and
//! applies the stock plan inside a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coupon::{self, Redemption};
use crate::delivery;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_rate_bps;
use crate::types::{
    Adjustment, AmountKind, Coupon, DeliveryZone, Order, OrderStatus, PaymentStatus, Settings,
    Variation,
};
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

// =============================================================================
// Inputs
// =============================================================================

/// A requested quantity of one variation.
#[derive(Debug, Clone)]
pub struct QuoteLine {
    pub variation: Variation,
    pub quantity: i64,
}

/// Everything needed to price an order.
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub lines: Vec<QuoteLine>,
    pub coupon: Option<Coupon>,
    pub tax: Adjustment,
    pub vat: Adjustment,
    pub delivery_zone: Option<DeliveryZone>,
    /// Amount tendered at order creation.
    pub paid: Money,
    /// Instant used for coupon validity windows.
    pub now: DateTime<Utc>,
}

impl QuoteInput {
    /// Starts an input with the tax and VAT configured in `settings`.
    pub fn new(lines: Vec<QuoteLine>, settings: &Settings) -> Self {
        QuoteInput {
            lines,
            coupon: None,
            tax: settings.tax(),
            vat: settings.vat(),
            delivery_zone: None,
            paid: Money::zero(),
            now: Utc::now(),
        }
    }

    pub fn with_coupon(mut self, coupon: Option<Coupon>) -> Self {
        self.coupon = coupon;
        self
    }

    pub fn with_delivery_zone(mut self, zone: Option<DeliveryZone>) -> Self {
        self.delivery_zone = zone;
        self
    }

    pub fn with_paid(mut self, paid: Money) -> Self {
        self.paid = paid;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// One priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub variation_id: String,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_cost: Money,
    /// Sale price before the item discount.
    pub list_price: Money,
    /// Price charged per unit.
    pub unit_price: Money,
    pub unit_discount: Money,
    pub line_total: Money,
    pub line_cost: Money,
    pub line_discount: Money,
}

/// Stock movement required to fulfil one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockDeduction {
    pub variation_id: String,
    pub sku: String,
    pub requested: i64,
    pub on_hand: i64,
    pub remaining: i64,
}

/// Result of settling a grand total against payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Amount handed over by the customer in this step.
    pub tendered: Money,
    /// Total applied to the order, never above the grand total.
    pub paid: Money,
    pub due: Money,
    /// Overpayment returned to the customer.
    pub change: Money,
    pub payment_status: PaymentStatus,
}

/// The full priced breakdown of a prospective order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuote {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub cost: Money,
    /// Sum of item discounts, already reflected in `subtotal`.
    pub item_discount: Money,
    pub redemption: Option<Redemption>,
    pub redeem: Money,
    /// Subtotal after the coupon; tax, VAT and delivery are resolved on it.
    pub taxable: Money,
    pub tax: Money,
    pub vat: Money,
    pub delivery: Money,
    pub grand_total: Money,
    pub settlement: Settlement,
    pub stock: Vec<StockDeduction>,
}

impl OrderQuote {
    pub fn due(&self) -> Money {
        self.settlement.due
    }

    pub fn coupon_id(&self) -> Option<&str> {
        self.redemption.as_ref().map(|r| r.coupon_id.as_str())
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Applies an item discount to `sale`, never going below `cost`.
///
/// The result always lies in `[min(cost, sale), sale]`: a discount can only
/// lower the price, and only down to the cost price. When the sale price is
/// already under cost the discount is ignored.
///
/// ```rust
/// use bazaar_core::pricing::discounted_unit_price;
/// use bazaar_core::{Adjustment, Money};
///
/// let sale = Money::from_cents(1_000);
/// let cost = Money::from_cents(800);
/// // 30% off would be $7.00, floored at the $8.00 cost
/// let price = discounted_unit_price(sale, cost, Some(Adjustment::percentage(3_000)));
/// assert_eq!(price.cents(), 800);
/// ```
pub fn discounted_unit_price(sale: Money, cost: Money, discount: Option<Adjustment>) -> Money {
    let Some(discount) = discount else {
        return sale;
    };

    let off = match discount.kind {
        AmountKind::Fixed => Money::from_cents(discount.value),
        AmountKind::Percentage => sale.percent_of(discount.rate()),
    }
    .floor_zero();

    let floor = cost.min(sale).floor_zero();
    (sale - off).max(floor).min(sale)
}

/// Prices `quantity` units of `variation`.
pub fn price_line(variation: &Variation, quantity: i64) -> PricedLine {
    let list_price = variation.sale_price();
    let unit_cost = variation.cost_price();
    let unit_price = discounted_unit_price(list_price, unit_cost, variation.discount());
    let unit_discount = list_price - unit_price;

    PricedLine {
        variation_id: variation.id.clone(),
        product_id: variation.product_id.clone(),
        sku: variation.sku.clone(),
        name: variation.display_name(),
        quantity,
        unit_cost,
        list_price,
        unit_price,
        unit_discount,
        line_total: unit_price.multiply_quantity(quantity),
        line_cost: unit_cost.multiply_quantity(quantity),
        line_discount: unit_discount.multiply_quantity(quantity),
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Settles `grand_total` against a total of `paid`.
///
/// ```rust
/// use bazaar_core::pricing::settle;
/// use bazaar_core::{Money, PaymentStatus};
///
/// let s = settle(Money::from_cents(5_000), Money::from_cents(2_000));
/// assert_eq!(s.due.cents(), 3_000);
/// assert_eq!(s.payment_status, PaymentStatus::Partial);
/// ```
pub fn settle(grand_total: Money, paid: Money) -> Settlement {
    let tendered = paid.floor_zero();
    let due = (grand_total - tendered).floor_zero();
    let change = (tendered - grand_total).floor_zero();
    let applied = tendered - change;

    let payment_status = if due.is_zero() {
        PaymentStatus::Paid
    } else if applied.is_positive() {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    };

    Settlement {
        tendered,
        paid: applied,
        due,
        change,
        payment_status,
    }
}

/// Applies a further payment of `amount` to an existing order.
///
/// ## Rules
/// - amount must be positive
/// - cancelled orders take no payments
/// - a fully paid order takes no payments
pub fn apply_payment(order: &Order, amount: Money) -> CoreResult<Settlement> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "amount must be positive".to_string(),
        });
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(too_large("payment amount"));
    }

    if order.status == OrderStatus::Cancelled {
        return Err(CoreError::InvalidOrderStatus {
            code: order.code.clone(),
            status: order.status.as_str().to_string(),
        });
    }

    if !order.due().is_positive() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!("order {} is already paid", order.code),
        });
    }

    let total_paid = order
        .paid()
        .checked_add(amount)
        .ok_or_else(|| too_large("payment amount"))?;

    let mut settlement = settle(order.grand_total(), total_paid);
    settlement.tendered = amount;
    Ok(settlement)
}

// =============================================================================
// Quote
// =============================================================================

fn too_large(field: &str) -> CoreError {
    CoreError::AmountTooLarge {
        field: field.to_string(),
        max: MAX_AMOUNT_CENTS,
    }
}

/// Rejects catalog and settings amounts outside `0..=MAX_AMOUNT_CENTS`.
fn bounded(field: &str, cents: i64) -> CoreResult<()> {
    if cents > MAX_AMOUNT_CENTS {
        return Err(too_large(field));
    }
    Ok(())
}

/// Sums amounts, failing instead of wrapping.
fn checked_total(field: &str, amounts: &[Money]) -> CoreResult<Money> {
    amounts.iter().try_fold(Money::zero(), |acc, m| {
        acc.checked_add(*m).ok_or_else(|| too_large(field))
    })
}

/// Merges lines for the same variation, keeping first-seen order.
fn merge_lines(lines: Vec<QuoteLine>) -> CoreResult<Vec<QuoteLine>> {
    let mut merged: Vec<QuoteLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        match merged.iter_mut().find(|m| m.variation.id == line.variation.id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }

    Ok(merged)
}

/// Prices an order end to end.
///
/// ## Errors
/// - `EmptyOrder` when no lines are given
/// - `Validation` / `QuantityTooLarge` / `OrderTooLarge` on bad quantities
/// - `VariationNotFound` for inactive variations
/// - `Coupon` when the coupon is not redeemable
/// - `InsufficientStock` when a line cannot be allocated
pub fn quote_order(input: QuoteInput) -> CoreResult<OrderQuote> {
    if input.lines.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    let lines = merge_lines(input.lines)?;

    if lines.len() > MAX_ORDER_LINES {
        return Err(CoreError::OrderTooLarge {
            max: MAX_ORDER_LINES,
        });
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut stock = Vec::with_capacity(lines.len());

    for line in &lines {
        if line.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: line.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let variation = &line.variation;
        if !variation.is_active {
            return Err(CoreError::VariationNotFound(variation.id.clone()));
        }
        bounded("sale price", variation.sale_price_cents)?;
        bounded("cost price", variation.cost_price_cents)?;

        let remaining = variation.quantity - line.quantity;
        if remaining < 0 {
            return Err(CoreError::InsufficientStock {
                sku: variation.sku.clone(),
                available: variation.quantity.max(0),
                requested: line.quantity,
            });
        }

        stock.push(StockDeduction {
            variation_id: variation.id.clone(),
            sku: variation.sku.clone(),
            requested: line.quantity,
            on_hand: variation.quantity,
            remaining,
        });
        priced.push(price_line(variation, line.quantity));
    }

    let subtotal: Money = priced.iter().map(|l| l.line_total).sum();
    let cost: Money = priced.iter().map(|l| l.line_cost).sum();
    let item_discount: Money = priced.iter().map(|l| l.line_discount).sum();

    let redemption = match &input.coupon {
        Some(c) => Some(coupon::redeem(c, subtotal, cost, input.now)?),
        None => None,
    };
    let redeem = redemption
        .as_ref()
        .map(|r| r.amount)
        .unwrap_or_else(Money::zero);

    for (field, charge) in [("tax", input.tax), ("vat", input.vat)] {
        match charge.kind {
            AmountKind::Fixed => bounded(field, charge.value)?,
            AmountKind::Percentage => validate_rate_bps(field, charge.value)?,
        }
    }

    let taxable = (subtotal - redeem).floor_zero();
    let tax = input.tax.amount_on(taxable).floor_zero();
    let vat = input.vat.amount_on(taxable).floor_zero();
    let delivery = delivery::resolve(input.delivery_zone.as_ref(), taxable);

    let grand_total = checked_total("grand total", &[taxable, tax, vat, delivery])?;
    let settlement = settle(grand_total, input.paid);

    Ok(OrderQuote {
        lines: priced,
        subtotal,
        cost,
        item_discount,
        redemption,
        redeem,
        taxable,
        tax,
        vat,
        delivery,
        grand_total,
        settlement,
        stock,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
