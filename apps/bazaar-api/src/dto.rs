//! # Request / Response DTOs
//!
//! JSON shapes of the HTTP API, all camelCase.
//!
//! Domain rows from `bazaar-core` keep their column names; the DTOs here
//! decouple the wire contract from the schema and are exported to
//! TypeScript for the storefront and POS front-ends.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use bazaar_core::{
    Adjustment, DeliveryZone, Order, OrderChannel, OrderItem, OrderQuote, OrderStatus, Payment,
    PaymentMethod, PaymentStatus, Redemption, Settings,
};

// =============================================================================
// Requests
// =============================================================================

/// One requested variation and quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub variation_id: String,
    pub quantity: i64,
}

/// `POST /api/checkout`: storefront order.
///
/// Customer fields are optional in the JSON so that missing ones come back
/// as validation errors naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub items: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub delivery_zone_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    /// Amount paid up front (online payment), zero for cash on delivery.
    pub paid_cents: i64,
    pub payment_reference: Option<String>,
    pub note: Option<String>,
}

/// `POST /api/pos/orders`: counter quick order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct PosOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    /// Delivery is charged only when a zone is given.
    pub delivery_zone_id: Option<String>,
    /// Defaults to cash.
    pub payment_method: Option<PaymentMethod>,
    /// Cash tendered; any excess comes back as change.
    pub paid_cents: i64,
    pub payment_reference: Option<String>,
    pub note: Option<String>,
}

/// `POST /api/coupons/validate`: price preview with a coupon.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CouponValidationRequest {
    pub code: String,
    pub items: Vec<OrderLineRequest>,
    pub delivery_zone_id: Option<String>,
}

/// `POST /api/orders/{code}/payments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    #[serde(default)]
    pub reference: Option<String>,
}

/// `PUT /api/settings`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSettingsRequest {
    pub store_name: Option<String>,
    pub currency: Option<String>,
    pub tax: Option<Adjustment>,
    pub vat: Option<Adjustment>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
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
    pub discount_cents: i64,
    pub redeem_cents: i64,
    pub tax_cents: i64,
    pub vat_cents: i64,
    pub delivery_cents: i64,
    pub grand_total_cents: i64,
    pub paid_cents: i64,
    pub due_cents: i64,
    pub change_cents: i64,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        OrderDto {
            id: o.id,
            code: o.code,
            channel: o.channel,
            status: o.status,
            payment_status: o.payment_status,
            customer_name: o.customer_name,
            customer_phone: o.customer_phone,
            shipping_address: o.shipping_address,
            delivery_zone_id: o.delivery_zone_id,
            coupon_id: o.coupon_id,
            subtotal_cents: o.subtotal_cents,
            discount_cents: o.discount_cents,
            redeem_cents: o.redeem_cents,
            tax_cents: o.tax_cents,
            vat_cents: o.vat_cents,
            delivery_cents: o.delivery_cents,
            grand_total_cents: o.grand_total_cents,
            paid_cents: o.paid_cents,
            due_cents: o.due_cents,
            change_cents: o.change_cents,
            note: o.note,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub variation_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub list_price_cents: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub line_total_cents: i64,
}

impl From<OrderItem> for OrderItemDto {
    fn from(i: OrderItem) -> Self {
        OrderItemDto {
            variation_id: i.variation_id,
            sku: i.sku_snapshot,
            name: i.name_snapshot,
            quantity: i.quantity,
            list_price_cents: i.list_price_cents,
            unit_price_cents: i.unit_price_cents,
            discount_cents: i.discount_cents,
            line_total_cents: i.line_total_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub created_at: String,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        PaymentDto {
            id: p.id,
            method: p.method,
            amount_cents: p.amount_cents,
            reference: p.reference,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// An order with its items and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order: OrderDto,
    pub items: Vec<OrderItemDto>,
    pub payments: Vec<PaymentDto>,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderItem>, payments: Vec<Payment>) -> Self {
        OrderDetail {
            order: OrderDto::from(order),
            items: items.into_iter().map(OrderItemDto::from).collect(),
            payments: payments.into_iter().map(PaymentDto::from).collect(),
        }
    }
}

/// Response of `POST /api/orders/{code}/payments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub order: OrderDto,
    pub payment: PaymentDto,
    /// Change returned for this payment.
    pub change_cents: i64,
}

/// Response of `POST /api/coupons/validate`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub coupon: Redemption,
    pub quote: OrderQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub store_name: String,
    pub currency: String,
    pub tax: Adjustment,
    pub vat: Adjustment,
    pub updated_at: String,
}

impl From<Settings> for SettingsDto {
    fn from(s: Settings) -> Self {
        SettingsDto {
            tax: s.tax(),
            vat: s.vat(),
            store_name: s.store_name,
            currency: s.currency,
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZoneDto {
    pub id: String,
    pub name: String,
    pub charge_cents: i64,
    pub free_delivery_min_cents: Option<i64>,
}

impl From<DeliveryZone> for DeliveryZoneDto {
    fn from(z: DeliveryZone) -> Self {
        DeliveryZoneDto {
            id: z.id,
            name: z.name,
            charge_cents: z.charge_cents,
            free_delivery_min_cents: z.free_delivery_min_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
}
