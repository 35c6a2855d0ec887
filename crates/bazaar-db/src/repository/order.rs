//! # Order Repository
//!
//! Persists priced orders and everything that must change with them.
//!
//! ## Order Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     place_order() transaction                           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── for each stock deduction:                                       │
//! │    │     UPDATE variations SET quantity = quantity - n                  │
//! │    │     WHERE id = ? AND quantity >= n    ── 0 rows ─► ROLLBACK       │
//! │    │                                          (InsufficientStock)       │
//! │    ├── coupon redeemed?                                                │
//! │    │     UPDATE coupons SET usage_count = usage_count + 1              │
//! │    │     WHERE usage_limit IS NULL                                     │
//! │    │        OR usage_count < usage_limit   ── 0 rows ─► ROLLBACK       │
//! │    │                                          (CouponExhausted)         │
//! │    ├── INSERT orders (fresh code on collision, up to 5 tries)          │
//! │    ├── INSERT order_items (snapshots)                                  │
//! │    └── INSERT payments (if anything was paid)                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quoting happens outside the transaction against a snapshot of stock and
//! coupon usage. The guarded updates above re-check both under the write
//! lock, so two concurrent checkouts can never oversell.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bazaar_core::{
    Order, OrderChannel, OrderItem, OrderQuote, OrderStatus, Payment, PaymentMethod, Settlement,
    StockDeduction,
};

/// Codes drawn before a placement gives up on a UNIQUE collision.
const ORDER_CODE_ATTEMPTS: usize = 5;

const ORDER_SELECT: &str = r#"
    SELECT
        id, code, channel, status, payment_status,
        customer_name, customer_phone, shipping_address,
        delivery_zone_id, coupon_id,
        subtotal_cents, cost_cents, discount_cents, redeem_cents,
        tax_cents, vat_cents, delivery_cents, grand_total_cents,
        paid_cents, due_cents, change_cents,
        note, created_at, updated_at
    FROM orders
"#;

// =============================================================================
// Placement
// =============================================================================

/// Non-price details of an order being placed.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub delivery_zone_id: Option<String>,
    pub note: Option<String>,
    /// Tender for the amount paid at creation. Defaults to cash.
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
}

impl OrderDraft {
    pub fn new(channel: OrderChannel) -> Self {
        OrderDraft {
            channel,
            status: OrderStatus::Pending,
            customer_name: None,
            customer_phone: None,
            shipping_address: None,
            delivery_zone_id: None,
            note: None,
            payment_method: None,
            payment_reference: None,
        }
    }
}

/// Rows written by [`OrderRepository::place_order`], built from a quote.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub stock: Vec<StockDeduction>,
    /// Code of the redeemed coupon, for error reporting.
    pub coupon_code: Option<String>,
}

impl OrderPlacement {
    /// Freezes `quote` into order, item and payment rows.
    pub fn new(quote: &OrderQuote, draft: OrderDraft) -> Self {
        Self::at(quote, draft, Utc::now())
    }

    pub fn at(quote: &OrderQuote, draft: OrderDraft, now: DateTime<Utc>) -> Self {
        let order_id = Uuid::new_v4().to_string();
        let settlement = quote.settlement;

        let order = Order {
            id: order_id.clone(),
            code: generate_order_code(draft.channel, now),
            channel: draft.channel,
            status: draft.status,
            payment_status: settlement.payment_status,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            shipping_address: draft.shipping_address,
            delivery_zone_id: draft.delivery_zone_id,
            coupon_id: quote.coupon_id().map(str::to_string),
            subtotal_cents: quote.subtotal.cents(),
            cost_cents: quote.cost.cents(),
            discount_cents: quote.item_discount.cents(),
            redeem_cents: quote.redeem.cents(),
            tax_cents: quote.tax.cents(),
            vat_cents: quote.vat.cents(),
            delivery_cents: quote.delivery.cents(),
            grand_total_cents: quote.grand_total.cents(),
            paid_cents: settlement.paid.cents(),
            due_cents: settlement.due.cents(),
            change_cents: settlement.change.cents(),
            note: draft.note,
            created_at: now,
            updated_at: now,
        };

        let items = quote
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                variation_id: line.variation_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                unit_cost_cents: line.unit_cost.cents(),
                list_price_cents: line.list_price.cents(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: line.line_total.cents(),
                line_cost_cents: line.line_cost.cents(),
                discount_cents: line.line_discount.cents(),
                created_at: now,
            })
            .collect();

        let payment = settlement.paid.is_positive().then(|| Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            method: draft.payment_method.unwrap_or(PaymentMethod::Cash),
            amount_cents: settlement.paid.cents(),
            reference: draft.payment_reference,
            created_at: now,
        });

        OrderPlacement {
            order,
            items,
            payment,
            stock: quote.stock.clone(),
            coupon_code: quote.redemption.as_ref().map(|r| r.code.clone()),
        }
    }
}

/// Generates a human-readable order code.
///
/// ## Format
/// `{PREFIX}-{YYYYMMDD}-{XXXXXX}`, where the prefix is `ORD` for online
/// orders and `POS` for counter orders, and the suffix is six random hex
/// digits.
///
/// ## Example
/// `ORD-20260314-4F1A9C`
pub fn generate_order_code(channel: OrderChannel, now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();

    format!(
        "{}-{}-{}",
        channel.code_prefix(),
        now.format("%Y%m%d"),
        suffix
    )
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by its public code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Order>> {
        let sql = format!("{ORDER_SELECT} WHERE code = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(code.trim().to_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("{ORDER_SELECT} WHERE id = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Lists the most recent orders, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC LIMIT ?1");

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Gets the items of an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, order_id, product_id, variation_id,
                sku_snapshot, name_snapshot,
                unit_cost_cents, list_price_cents, unit_price_cents,
                quantity, line_total_cents, line_cost_cents, discount_cents,
                created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the payments of an order, oldest first.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, method, amount_cents, reference, created_at
            FROM payments
            WHERE order_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Places an order atomically.
    ///
    /// Either every row is written and every stock/coupon counter moves, or
    /// nothing changes at all.
    ///
    /// ## Errors
    /// - `InsufficientStock` when a variation no longer has enough on hand
    /// - `NotFound` when a variation vanished or was deactivated
    /// - `CouponExhausted` when the coupon hit its usage limit meanwhile
    ///
    /// The returned order carries the code actually stored, which differs
    /// from `placement.order.code` when that one was already taken.
    pub async fn place_order(&self, placement: &OrderPlacement) -> DbResult<Order> {
        let mut order = placement.order.clone();
        debug!(
            code = %order.code,
            lines = placement.items.len(),
            grand_total_cents = order.grand_total_cents,
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for deduction in &placement.stock {
            decrement_stock(&mut tx, deduction, now).await?;
        }

        if let Some(coupon_id) = &order.coupon_id {
            let result = sqlx::query(
                r#"
                UPDATE coupons
                SET usage_count = usage_count + 1, updated_at = ?1
                WHERE id = ?2
                  AND is_active = 1
                  AND (usage_limit IS NULL OR usage_count < usage_limit)
                "#,
            )
            .bind(now)
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let code = placement
                    .coupon_code
                    .clone()
                    .unwrap_or_else(|| coupon_id.clone());
                warn!(order = %order.code, coupon = %code, "Coupon exhausted during placement");
                return Err(DbError::CouponExhausted { code });
            }
        }

        insert_order_with_unique_code(&mut tx, &mut order).await?;

        for item in &placement.items {
            insert_item(&mut tx, item).await?;
        }

        if let Some(payment) = &placement.payment {
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            code = %order.code,
            channel = ?order.channel,
            grand_total_cents = order.grand_total_cents,
            due_cents = order.due_cents,
            "Order placed"
        );

        Ok(order)
    }

    // =========================================================================
    // Follow-up
    // =========================================================================

    /// Records a further payment settled by `bazaar_core::pricing::apply_payment`.
    ///
    /// The update is guarded on the paid amount the settlement was computed
    /// from; a concurrent payment turns this one into a `Conflict`.
    pub async fn record_payment(
        &self,
        order: &Order,
        method: PaymentMethod,
        reference: Option<String>,
        settlement: &Settlement,
    ) -> DbResult<(Order, Payment)> {
        let now = Utc::now();
        let applied = settlement.paid.cents() - order.paid_cents;

        debug!(
            code = %order.code,
            tendered_cents = settlement.tendered.cents(),
            applied_cents = applied,
            "Recording payment"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET paid_cents = ?1,
                due_cents = ?2,
                change_cents = change_cents + ?3,
                payment_status = ?4,
                updated_at = ?5
            WHERE id = ?6 AND paid_cents = ?7 AND status != 'cancelled'
            "#,
        )
        .bind(settlement.paid.cents())
        .bind(settlement.due.cents())
        .bind(settlement.change.cents())
        .bind(settlement.payment_status)
        .bind(now)
        .bind(&order.id)
        .bind(order.paid_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Order", &order.code));
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            method,
            amount_cents: applied,
            reference,
            created_at: now,
        };
        insert_payment(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            code = %order.code,
            paid_cents = settlement.paid.cents(),
            due_cents = settlement.due.cents(),
            "Payment recorded"
        );

        let updated = self
            .get_by_id(&order.id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &order.code))?;

        Ok((updated, payment))
    }

    /// Cancels an order, returning its stock and coupon use.
    ///
    /// Only pending and processing orders can be cancelled.
    pub async fn cancel_order(&self, order: &Order) -> DbResult<Order> {
        let now = Utc::now();
        debug!(code = %order.code, "Cancelling order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(OrderStatus::Cancelled)
        .bind(now)
        .bind(&order.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Order", &order.code));
        }

        // Stock goes back per line, read inside the transaction
        let lines: Vec<(String, i64)> = sqlx::query_as(
            "SELECT variation_id, quantity FROM order_items WHERE order_id = ?1",
        )
        .bind(&order.id)
        .fetch_all(&mut *tx)
        .await?;

        for (variation_id, quantity) in &lines {
            sqlx::query(
                "UPDATE variations SET quantity = quantity + ?1, updated_at = ?2 WHERE id = ?3",
            )
            .bind(quantity)
            .bind(now)
            .bind(variation_id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(coupon_id) = &order.coupon_id {
            sqlx::query(
                r#"
                UPDATE coupons
                SET usage_count = usage_count - 1, updated_at = ?1
                WHERE id = ?2 AND usage_count > 0
                "#,
            )
            .bind(now)
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(code = %order.code, restored_lines = lines.len(), "Order cancelled");

        self.get_by_id(&order.id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &order.code))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn decrement_stock(
    tx: &mut Transaction<'_, Sqlite>,
    deduction: &StockDeduction,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE variations
        SET quantity = quantity - ?1, updated_at = ?2
        WHERE id = ?3 AND is_active = 1 AND quantity >= ?1
        "#,
    )
    .bind(deduction.requested)
    .bind(now)
    .bind(&deduction.variation_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let current: Option<(i64, bool)> =
        sqlx::query_as("SELECT quantity, is_active FROM variations WHERE id = ?1")
            .bind(&deduction.variation_id)
            .fetch_optional(&mut **tx)
            .await?;

    match current {
        Some((available, true)) => {
            warn!(
                sku = %deduction.sku,
                available,
                requested = deduction.requested,
                "Stock changed during placement"
            );
            Err(DbError::InsufficientStock {
                sku: deduction.sku.clone(),
                available,
                requested: deduction.requested,
            })
        }
        _ => Err(DbError::not_found("Variation", &deduction.variation_id)),
    }
}

/// Inserts the order row, drawing a new code while the current one is taken.
///
/// A failed INSERT only aborts its own statement, so the stock and coupon
/// updates already made in `tx` survive the retry.
async fn insert_order_with_unique_code(
    tx: &mut Transaction<'_, Sqlite>,
    order: &mut Order,
) -> DbResult<()> {
    let mut attempt = 1;
    loop {
        match insert_order(tx, order).await {
            Err(DbError::UniqueViolation { field, .. })
                if field == "orders.code" && attempt < ORDER_CODE_ATTEMPTS =>
            {
                let fresh = generate_order_code(order.channel, order.created_at);
                warn!(taken = %order.code, retry = %fresh, attempt, "Order code collision");
                order.code = fresh;
                attempt += 1;
            }
            other => return other,
        }
    }
}

async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, code, channel, status, payment_status,
            customer_name, customer_phone, shipping_address,
            delivery_zone_id, coupon_id,
            subtotal_cents, cost_cents, discount_cents, redeem_cents,
            tax_cents, vat_cents, delivery_cents, grand_total_cents,
            paid_cents, due_cents, change_cents,
            note, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8,
            ?9, ?10,
            ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18,
            ?19, ?20, ?21,
            ?22, ?23, ?24
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.code)
    .bind(order.channel)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.shipping_address)
    .bind(&order.delivery_zone_id)
    .bind(&order.coupon_id)
    .bind(order.subtotal_cents)
    .bind(order.cost_cents)
    .bind(order.discount_cents)
    .bind(order.redeem_cents)
    .bind(order.tax_cents)
    .bind(order.vat_cents)
    .bind(order.delivery_cents)
    .bind(order.grand_total_cents)
    .bind(order.paid_cents)
    .bind(order.due_cents)
    .bind(order.change_cents)
    .bind(&order.note)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &order.code),
        other => other,
    })?;

    Ok(())
}

/// Inserts an order item.
///
/// ## Snapshot Pattern
/// SKU, name and prices are copied onto the item so the order keeps its
/// history when the catalog changes later.
async fn insert_item(tx: &mut Transaction<'_, Sqlite>, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, variation_id,
            sku_snapshot, name_snapshot,
            unit_cost_cents, list_price_cents, unit_price_cents,
            quantity, line_total_cents, line_cost_cents, discount_cents,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.variation_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.unit_cost_cents)
    .bind(item.list_price_cents)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.line_total_cents)
    .bind(item.line_cost_cents)
    .bind(item.discount_cents)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_payment(tx: &mut Transaction<'_, Sqlite>, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, order_id, method, amount_cents, reference, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(&payment.reference)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::fixtures;
    use bazaar_core::pricing::{apply_payment, quote_order, QuoteInput, QuoteLine};
    use bazaar_core::{AmountKind, Coupon, Money, PaymentStatus, Settings, Variation};

    fn quote(lines: &[(&Variation, i64)], coupon: Option<Coupon>, paid: i64) -> OrderQuote {
        let lines = lines
            .iter()
            .map(|(v, qty)| QuoteLine {
                variation: (*v).clone(),
                quantity: *qty,
            })
            .collect();
        let input = QuoteInput::new(lines, &Settings::default())
            .with_coupon(coupon)
            .with_paid(Money::from_cents(paid));
        quote_order(input).unwrap()
    }

    async fn quantity(db: &Database, id: &str) -> i64 {
        db.products().get_variation(id).await.unwrap().unwrap().quantity
    }

    #[test]
    fn test_order_code_format() {
        let now = DateTime::parse_from_rfc3339("2026-03-14T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let code = generate_order_code(OrderChannel::Pos, now);
        assert!(code.starts_with("POS-20260314-"));
        assert_eq!(code.len(), "POS-20260314-".len() + 6);
        assert!(code[13..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_place_order_persists_everything() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let b = fixtures::stocked_variation(&db, "B-1", 1_200, 2_500, 4).await;
        let coupon = fixtures::coupon("WELCOME", AmountKind::Fixed, 300);
        db.coupons().insert(&coupon).await.unwrap();

        let q = quote(&[(&a, 2), (&b, 1)], Some(coupon.clone()), 1_000);
        let mut draft = OrderDraft::new(OrderChannel::Online);
        draft.customer_name = Some("Ayesha".to_string());
        let placement = OrderPlacement::new(&q, draft);

        let order = db.orders().place_order(&placement).await.unwrap();
        assert!(order.code.starts_with("ORD-"));
        assert_eq!(order.grand_total_cents, 4_200);
        assert_eq!(order.redeem_cents, 300);
        assert_eq!(order.paid_cents, 1_000);
        assert_eq!(order.due_cents, 3_200);
        assert_eq!(order.payment_status, PaymentStatus::Partial);

        let stored = db.orders().get_by_code(&order.code.to_lowercase()).await.unwrap().unwrap();
        assert_eq!(stored.id, order.id);
        assert_eq!(stored.coupon_id.as_deref(), Some(coupon.id.as_str()));
        assert_eq!(stored.customer_name.as_deref(), Some("Ayesha"));

        let items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].sku_snapshot, "A-1");
        assert_eq!(items[0].line_total_cents, 2_000);

        let payments = db.orders().get_payments(&order.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_cents, 1_000);
        assert_eq!(payments[0].method, PaymentMethod::Cash);

        assert_eq!(quantity(&db, &a.id).await, 8);
        assert_eq!(quantity(&db, &b.id).await, 3);

        let used = db.coupons().get_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(used.usage_count, 1);
    }

    #[tokio::test]
    async fn test_taken_order_code_is_redrawn() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let now = DateTime::parse_from_rfc3339("2026-03-14T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let first = quote(&[(&a, 1)], None, 0);
        let first = OrderPlacement::at(&first, OrderDraft::new(OrderChannel::Pos), now);
        let first = db.orders().place_order(&first).await.unwrap();

        let second = quote(&[(&a, 2)], None, 0);
        let mut second = OrderPlacement::at(&second, OrderDraft::new(OrderChannel::Pos), now);
        second.order.code = first.code.clone();

        let placed = db.orders().place_order(&second).await.unwrap();
        assert_ne!(placed.code, first.code);
        assert!(placed.code.starts_with("POS-20260314-"));
        assert_eq!(placed.id, second.order.id);

        let stored = db.orders().get_by_code(&placed.code).await.unwrap().unwrap();
        assert_eq!(stored.id, second.order.id);
        assert_eq!(db.orders().get_items(&stored.id).await.unwrap().len(), 1);
        assert_eq!(quantity(&db, &a.id).await, 7);
    }

    #[tokio::test]
    async fn test_duplicate_order_id_is_not_retried() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;

        let q = quote(&[(&a, 1)], None, 0);
        let placement = OrderPlacement::new(&q, OrderDraft::new(OrderChannel::Online));
        db.orders().place_order(&placement).await.unwrap();

        let mut replay = placement.clone();
        replay.order.code = generate_order_code(OrderChannel::Online, Utc::now());
        let err = db.orders().place_order(&replay).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "orders.id"));
        assert_eq!(quantity(&db, &a.id).await, 9);
    }

    #[tokio::test]
    async fn test_unpaid_order_has_no_payment_row() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;

        let placement = OrderPlacement::new(&quote(&[(&a, 1)], None, 0), OrderDraft::new(OrderChannel::Online));
        let order = db.orders().place_order(&placement).await.unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert!(db.orders().get_payments(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_race_rolls_back_whole_order() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let b = fixtures::stocked_variation(&db, "B-1", 600, 1_000, 5).await;

        let q = quote(&[(&a, 2), (&b, 3)], None, 0);

        // Another checkout takes most of B after the quote was made
        db.products().restock(&b.id, -4).await.unwrap();

        let placement = OrderPlacement::new(&q, OrderDraft::new(OrderChannel::Online));
        let err = db.orders().place_order(&placement).await.unwrap_err();
        match err {
            DbError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "B-1");
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(quantity(&db, &a.id).await, 10);
        assert_eq!(quantity(&db, &b.id).await, 1);
        assert!(db
            .orders()
            .get_by_code(&placement.order.code)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_exhausted_coupon_rolls_back() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let mut coupon = fixtures::coupon("ONCE", AmountKind::Fixed, 100);
        coupon.usage_limit = Some(1);
        db.coupons().insert(&coupon).await.unwrap();

        let first = quote(&[(&a, 1)], Some(coupon.clone()), 0);
        let second = quote(&[(&a, 1)], Some(coupon.clone()), 0);

        db.orders()
            .place_order(&OrderPlacement::new(&first, OrderDraft::new(OrderChannel::Online)))
            .await
            .unwrap();

        let err = db
            .orders()
            .place_order(&OrderPlacement::new(&second, OrderDraft::new(OrderChannel::Online)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CouponExhausted { ref code } if code == "ONCE"));

        // Only the first order took stock
        assert_eq!(quantity(&db, &a.id).await, 9);
    }

    #[tokio::test]
    async fn test_record_payment_settles_order() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let placement = OrderPlacement::new(&quote(&[(&a, 3)], None, 1_000), OrderDraft::new(OrderChannel::Online));
        let order = db.orders().place_order(&placement).await.unwrap();

        let settlement = apply_payment(&order, Money::from_cents(2_500)).unwrap();
        let (updated, payment) = db
            .orders()
            .record_payment(&order, PaymentMethod::MobileBanking, Some("TRX-1".to_string()), &settlement)
            .await
            .unwrap();

        assert_eq!(payment.amount_cents, 2_000);
        assert_eq!(updated.paid_cents, 3_000);
        assert_eq!(updated.due_cents, 0);
        assert_eq!(updated.change_cents, 500);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(db.orders().get_payments(&order.id).await.unwrap().len(), 2);

        // A second writer working from the stale row loses
        let err = db
            .orders()
            .record_payment(&order, PaymentMethod::Cash, None, &settlement)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_coupon() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;
        let coupon = fixtures::coupon("BACK", AmountKind::Fixed, 100);
        db.coupons().insert(&coupon).await.unwrap();

        let placement = OrderPlacement::new(
            &quote(&[(&a, 4)], Some(coupon.clone()), 0),
            OrderDraft::new(OrderChannel::Online),
        );
        let order = db.orders().place_order(&placement).await.unwrap();
        assert_eq!(quantity(&db, &a.id).await, 6);

        let cancelled = db.orders().cancel_order(&order).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(quantity(&db, &a.id).await, 10);
        let restored = db.coupons().get_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(restored.usage_count, 0);

        // Cancelling twice is a conflict, and stock stays put
        let err = db.orders().cancel_order(&order).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(quantity(&db, &a.id).await, 10);
    }

    #[tokio::test]
    async fn test_delivered_order_cannot_be_cancelled() {
        let db = fixtures::database().await;
        let a = fixtures::stocked_variation(&db, "A-1", 600, 1_000, 10).await;

        let mut draft = OrderDraft::new(OrderChannel::Pos);
        draft.status = OrderStatus::Delivered;
        let order = db
            .orders()
            .place_order(&OrderPlacement::new(&quote(&[(&a, 1)], None, 1_000), draft))
            .await
            .unwrap();
        assert!(order.code.starts_with("POS-"));

        let err = db.orders().cancel_order(&order).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(db.orders().list_recent(10).await.unwrap().len(), 1);
    }
}
