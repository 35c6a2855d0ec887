//! # Checkout Service
//!
//! The single pricing path behind every endpoint that computes a total.
//!
//! ## Call Sites
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /api/checkout ─────┐                                             │
//! │  POST /api/pos/orders ───┼──► load_lines / load_coupon / load_zone     │
//! │  POST /api/coupons/      │           │                                  │
//! │        validate ─────────┘           ▼                                  │
//! │                              bazaar_core::pricing::quote_order          │
//! │                                      │                                  │
//! │                 ┌────────────────────┴──────────────┐                   │
//! │                 ▼                                   ▼                   │
//! │     checkout / quick_order                  validate_coupon            │
//! │     OrderRepository::place_order            (nothing persisted)        │
//! │     (stock, coupon usage, order, payment)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info};

use bazaar_core::pricing::{apply_payment, quote_order};
use bazaar_core::validation::{
    validate_coupon_code, validate_line_count, validate_name, validate_payment_amount,
    validate_phone, validate_quantity, validate_tendered_cents, validate_uuid,
};
use bazaar_core::{
    normalize_code, Coupon, CouponError, CoreError, DeliveryZone, Money, OrderChannel, OrderQuote,
    OrderStatus, PaymentMethod, QuoteInput, QuoteLine, ValidationError,
};
use bazaar_db::{Database, OrderDraft, OrderPlacement};

use crate::dto::{
    CheckoutRequest, CouponValidation, CouponValidationRequest, OrderDetail, OrderDto,
    OrderLineRequest, PaymentDto, PaymentReceipt, PaymentRequest, PosOrderRequest,
};
use crate::error::{ApiError, ApiResult};

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 500;
const MAX_NOTE_LEN: usize = 1_000;

/// Prices and places orders.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Places a storefront order.
    ///
    /// Customer name, phone, shipping address and delivery zone are required.
    /// The order starts `pending`.
    pub async fn checkout(&self, req: CheckoutRequest) -> ApiResult<OrderDetail> {
        let customer_name = required("customer name", req.customer_name)?;
        validate_name("customer name", &customer_name, MAX_NAME_LEN)?;
        let customer_phone = required("phone", req.customer_phone)?;
        validate_phone(&customer_phone)?;
        let shipping_address = required("shipping address", req.shipping_address)?;
        validate_name("shipping address", &shipping_address, MAX_ADDRESS_LEN)?;
        let zone_id = required("delivery zone", req.delivery_zone_id)?;
        let note = optional_text("note", req.note, MAX_NOTE_LEN)?;

        validate_tendered_cents(req.paid_cents)?;
        if req.paid_cents > 0 && req.payment_method.is_none() {
            return Err(ValidationError::Required {
                field: "payment method".to_string(),
            }
            .into());
        }

        let lines = self.load_lines(&req.items).await?;
        let coupon = self.load_coupon(req.coupon_code.as_deref()).await?;
        let zone = self.load_zone(Some(zone_id.as_str())).await?;
        let quote = self
            .quote(lines, coupon, zone, Money::from_cents(req.paid_cents))
            .await?;

        let draft = OrderDraft {
            channel: OrderChannel::Online,
            status: OrderStatus::Pending,
            customer_name: Some(customer_name),
            customer_phone: Some(customer_phone),
            shipping_address: Some(shipping_address),
            delivery_zone_id: Some(zone_id),
            note,
            payment_method: req.payment_method,
            payment_reference: trimmed(req.payment_reference),
        };

        self.place(&quote, draft).await
    }

    /// Places a point-of-sale quick order.
    ///
    /// Customer details are optional, delivery is only charged when a zone is
    /// given, and the goods leave with the customer so the order is created
    /// `delivered`.
    pub async fn quick_order(&self, req: PosOrderRequest) -> ApiResult<OrderDetail> {
        let customer_name = optional_text("customer name", req.customer_name, MAX_NAME_LEN)?;
        let customer_phone = trimmed(req.customer_phone);
        if let Some(phone) = &customer_phone {
            validate_phone(phone)?;
        }
        let shipping_address =
            optional_text("shipping address", req.shipping_address, MAX_ADDRESS_LEN)?;
        let zone_id = trimmed(req.delivery_zone_id);
        let note = optional_text("note", req.note, MAX_NOTE_LEN)?;
        validate_tendered_cents(req.paid_cents)?;

        let lines = self.load_lines(&req.items).await?;
        let coupon = self.load_coupon(req.coupon_code.as_deref()).await?;
        let zone = self.load_zone(zone_id.as_deref()).await?;
        let quote = self
            .quote(lines, coupon, zone, Money::from_cents(req.paid_cents))
            .await?;

        let draft = OrderDraft {
            channel: OrderChannel::Pos,
            status: OrderStatus::Delivered,
            customer_name,
            customer_phone,
            shipping_address,
            delivery_zone_id: zone_id,
            note,
            payment_method: Some(req.payment_method.unwrap_or(PaymentMethod::Cash)),
            payment_reference: trimmed(req.payment_reference),
        };

        self.place(&quote, draft).await
    }

    /// Prices a cart with a coupon without persisting anything.
    ///
    /// Fails with the coupon's rejection reason when it cannot be applied.
    pub async fn validate_coupon(
        &self,
        req: CouponValidationRequest,
    ) -> ApiResult<CouponValidation> {
        validate_coupon_code(&req.code)?;

        let lines = self.load_lines(&req.items).await?;
        let coupon = self.load_coupon(Some(req.code.as_str())).await?;
        let zone_id = trimmed(req.delivery_zone_id);
        let zone = self.load_zone(zone_id.as_deref()).await?;
        let quote = self.quote(lines, coupon, zone, Money::zero()).await?;

        let coupon = quote.redemption.clone().ok_or_else(|| {
            ApiError::from(CouponError::NotFound {
                code: normalize_code(&req.code),
            })
        })?;

        debug!(
            code = %coupon.code,
            redeem_cents = coupon.amount.cents(),
            capped_by = ?coupon.capped_by,
            "Coupon validated"
        );

        Ok(CouponValidation { coupon, quote })
    }

    /// Loads an order with its items and payments.
    pub async fn order_detail(&self, code: &str) -> ApiResult<OrderDetail> {
        let order = self
            .db
            .orders()
            .get_by_code(code)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", code))?;

        let items = self.db.orders().get_items(&order.id).await?;
        let payments = self.db.orders().get_payments(&order.id).await?;

        Ok(OrderDetail::new(order, items, payments))
    }

    /// Records a later payment against an order's due amount.
    pub async fn record_payment(
        &self,
        code: &str,
        req: PaymentRequest,
    ) -> ApiResult<PaymentReceipt> {
        validate_payment_amount(req.amount_cents)?;

        let order = self
            .db
            .orders()
            .get_by_code(code)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", code))?;

        let settlement = apply_payment(&order, Money::from_cents(req.amount_cents))?;
        let (order, payment) = self
            .db
            .orders()
            .record_payment(&order, req.method, trimmed(req.reference), &settlement)
            .await?;

        Ok(PaymentReceipt {
            order: OrderDto::from(order),
            payment: PaymentDto::from(payment),
            change_cents: settlement.change.cents(),
        })
    }

    /// Cancels a pending or processing order and returns its stock.
    pub async fn cancel(&self, code: &str) -> ApiResult<OrderDetail> {
        let order = self
            .db
            .orders()
            .get_by_code(code)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", code))?;

        if !order.is_cancellable() {
            return Err(CoreError::InvalidOrderStatus {
                code: order.code.clone(),
                status: order.status.as_str().to_string(),
            }
            .into());
        }

        let order = self.db.orders().cancel_order(&order).await?;
        let items = self.db.orders().get_items(&order.id).await?;
        let payments = self.db.orders().get_payments(&order.id).await?;

        Ok(OrderDetail::new(order, items, payments))
    }

    // =========================================================================
    // Shared Pipeline
    // =========================================================================

    /// Resolves request lines to variations, in request order.
    async fn load_lines(&self, items: &[OrderLineRequest]) -> ApiResult<Vec<QuoteLine>> {
        validate_line_count(items.len())?;
        for item in items {
            validate_uuid("variation id", &item.variation_id)?;
            validate_quantity(item.quantity)?;
        }

        let mut ids: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            if !ids.contains(&item.variation_id) {
                ids.push(item.variation_id.clone());
            }
        }

        let found: HashMap<String, _> = self
            .db
            .products()
            .find_variations(&ids)
            .await?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        items
            .iter()
            .map(|item| {
                found
                    .get(&item.variation_id)
                    .map(|variation| QuoteLine {
                        variation: variation.clone(),
                        quantity: item.quantity,
                    })
                    .ok_or_else(|| ApiError::not_found("Variation", &item.variation_id))
            })
            .collect()
    }

    async fn load_coupon(&self, code: Option<&str>) -> ApiResult<Option<Coupon>> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        validate_coupon_code(code)?;

        let coupon = self.db.coupons().get_by_code(code).await?.ok_or_else(|| {
            ApiError::from(CouponError::NotFound {
                code: normalize_code(code),
            })
        })?;

        Ok(Some(coupon))
    }

    async fn load_zone(&self, id: Option<&str>) -> ApiResult<Option<DeliveryZone>> {
        let Some(id) = id else {
            return Ok(None);
        };

        match self.db.delivery_zones().get(id).await? {
            Some(zone) if zone.is_active => Ok(Some(zone)),
            _ => Err(ApiError::not_found("Delivery zone", id)),
        }
    }

    async fn quote(
        &self,
        lines: Vec<QuoteLine>,
        coupon: Option<Coupon>,
        zone: Option<DeliveryZone>,
        paid: Money,
    ) -> ApiResult<OrderQuote> {
        let settings = self.db.settings().get().await?;

        let input = QuoteInput::new(lines, &settings)
            .with_coupon(coupon)
            .with_delivery_zone(zone)
            .with_paid(paid)
            .at(Utc::now());

        Ok(quote_order(input)?)
    }

    async fn place(&self, quote: &OrderQuote, draft: OrderDraft) -> ApiResult<OrderDetail> {
        let placement = OrderPlacement::new(quote, draft);
        let order = self.db.orders().place_order(&placement).await?;

        info!(
            code = %order.code,
            channel = ?order.channel,
            grand_total = %quote.grand_total,
            due = %quote.due(),
            "Checkout complete"
        );

        Ok(OrderDetail::new(
            order,
            placement.items,
            placement.payment.into_iter().collect(),
        ))
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Trims an optional string, treating blank as absent.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str, value: Option<String>) -> ApiResult<String> {
    trimmed(value).ok_or_else(|| {
        ValidationError::Required {
            field: field.to_string(),
        }
        .into()
    })
}

fn optional_text(field: &str, value: Option<String>, max: usize) -> ApiResult<Option<String>> {
    let value = trimmed(value);
    if let Some(v) = &value {
        validate_name(field, v, max)?;
    }
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{catalog, Catalog};
    use bazaar_core::AmountKind;

    fn line(variation_id: &str, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            variation_id: variation_id.to_string(),
            quantity,
        }
    }

    fn online(cat: &Catalog, items: Vec<OrderLineRequest>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            customer_name: Some("Nadia Rahman".to_string()),
            customer_phone: Some("+880 1711-000000".to_string()),
            shipping_address: Some("House 4, Road 2, Dhanmondi".to_string()),
            delivery_zone_id: Some(cat.zone.id.clone()),
            ..CheckoutRequest::default()
        }
    }

    #[tokio::test]
    async fn test_checkout_prices_and_places_order() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let mut req = online(&cat, vec![line(&cat.tee.id, 2), line(&cat.hoodie.id, 1)]);
        req.coupon_code = Some(" save10 ".to_string());

        let detail = service.checkout(req).await.unwrap();
        let order = &detail.order;

        // tee 2 × 1_000, hoodie 4_000 → 6_000; coupon 10% → 600
        // base 5_400, VAT 7.5% → 405, delivery 600
        assert_eq!(order.subtotal_cents, 6_000);
        assert_eq!(order.redeem_cents, 600);
        assert_eq!(order.vat_cents, 405);
        assert_eq!(order.delivery_cents, 600);
        assert_eq!(order.grand_total_cents, 6_405);
        assert_eq!(order.due_cents, 6_405);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.code.starts_with("ORD-"));
        assert_eq!(detail.items.len(), 2);
        assert!(detail.payments.is_empty());

        let tee = cat.db.products().get_variation(&cat.tee.id).await.unwrap().unwrap();
        assert_eq!(tee.quantity, 8);
    }

    #[tokio::test]
    async fn test_checkout_requires_customer_details() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let mut req = online(&cat, vec![line(&cat.tee.id, 1)]);
        req.customer_phone = Some("   ".to_string());

        let err = service.checkout(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("phone"));

        let mut req = online(&cat, vec![line(&cat.tee.id, 1)]);
        req.delivery_zone_id = None;
        let err = service.checkout(req).await.unwrap_err();
        assert!(err.message.contains("delivery zone"));
    }

    #[tokio::test]
    async fn test_checkout_with_prepayment_needs_method() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let mut req = online(&cat, vec![line(&cat.tee.id, 1)]);
        req.paid_cents = 500;
        let err = service.checkout(req.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        req.payment_method = Some(PaymentMethod::Card);
        let detail = service.checkout(req).await.unwrap();
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.payments[0].method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn test_quick_order_defaults() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let req = PosOrderRequest {
            items: vec![line(&cat.tee.id, 1)],
            paid_cents: 2_000,
            ..PosOrderRequest::default()
        };
        let detail = service.quick_order(req).await.unwrap();
        let order = &detail.order;

        // 1_000 + 7.5% VAT, no delivery without a zone
        assert_eq!(order.grand_total_cents, 1_075);
        assert_eq!(order.delivery_cents, 0);
        assert_eq!(order.paid_cents, 1_075);
        assert_eq!(order.change_cents, 925);
        assert_eq!(order.due_cents, 0);
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.code.starts_with("POS-"));
        assert_eq!(detail.payments[0].method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_unknown_variation_and_coupon() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let req = PosOrderRequest {
            items: vec![line("550e8400-e29b-41d4-a716-446655440000", 1)],
            ..PosOrderRequest::default()
        };
        let err = service.quick_order(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let req = PosOrderRequest {
            items: vec![line(&cat.tee.id, 1)],
            coupon_code: Some("GHOST".to_string()),
            ..PosOrderRequest::default()
        };
        let err = service.quick_order(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("GHOST"));
    }

    #[tokio::test]
    async fn test_validate_coupon_persists_nothing() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let req = CouponValidationRequest {
            code: "save10".to_string(),
            items: vec![line(&cat.tee.id, 3)],
            delivery_zone_id: None,
        };
        let result = service.validate_coupon(req).await.unwrap();
        assert_eq!(result.coupon.code, "SAVE10");
        assert_eq!(result.coupon.amount.cents(), 300);
        assert_eq!(result.quote.subtotal.cents(), 3_000);

        let tee = cat.db.products().get_variation(&cat.tee.id).await.unwrap().unwrap();
        assert_eq!(tee.quantity, 10);
        let coupon = cat.db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(coupon.usage_count, 0);
    }

    #[tokio::test]
    async fn test_validate_coupon_reports_rejection() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let req = CouponValidationRequest {
            code: "BIGSPEND".to_string(),
            items: vec![line(&cat.tee.id, 1)],
            delivery_zone_id: None,
        };
        let err = service.validate_coupon(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponRejected);
        assert!(err.message.contains("minimum purchase"));
    }

    #[tokio::test]
    async fn test_oversized_payment_is_rejected() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let detail = service
            .quick_order(PosOrderRequest {
                items: vec![line(&cat.tee.id, 1)],
                paid_cents: 500,
                ..PosOrderRequest::default()
            })
            .await
            .unwrap();

        let err = service
            .record_payment(
                &detail.order.code,
                PaymentRequest {
                    method: PaymentMethod::Cash,
                    amount_cents: i64::MAX,
                    reference: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("payment amount"));

        let order = service.order_detail(&detail.order.code).await.unwrap().order;
        assert_eq!(order.paid_cents, 500);
        assert_eq!(order.due_cents, 575);
    }

    #[tokio::test]
    async fn test_oversized_stored_vat_fails_checkout() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let mut settings = cat.db.settings().get().await.unwrap();
        settings.vat_kind = AmountKind::Fixed;
        settings.vat_value = i64::MAX;
        cat.db.settings().update(&settings).await.unwrap();

        let err = service
            .checkout(online(&cat, vec![line(&cat.tee.id, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("vat"));

        let tee = cat.db.products().get_variation(&cat.tee.id).await.unwrap().unwrap();
        assert_eq!(tee.quantity, 10);
    }

    #[tokio::test]
    async fn test_payment_and_cancel_flow() {
        let cat = catalog().await;
        let service = CheckoutService::new(cat.db.clone());

        let detail = service
            .checkout(online(&cat, vec![line(&cat.tee.id, 1)]))
            .await
            .unwrap();
        let code = detail.order.code.clone();
        let due = detail.order.due_cents;

        let receipt = service
            .record_payment(
                &code,
                PaymentRequest {
                    method: PaymentMethod::MobileBanking,
                    amount_cents: due - 100,
                    reference: Some("TRX-42".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.order.due_cents, 100);
        assert_eq!(receipt.change_cents, 0);

        let cancelled = service.cancel(&code).await.unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payments.len(), 1);

        let tee = cat.db.products().get_variation(&cat.tee.id).await.unwrap().unwrap();
        assert_eq!(tee.quantity, 10);

        let err = service
            .record_payment(
                &code,
                PaymentRequest {
                    method: PaymentMethod::Cash,
                    amount_cents: 100,
                    reference: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let err = service.cancel(&code).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }
}
