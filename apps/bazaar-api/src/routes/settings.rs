//! Store settings: name, currency, tax and VAT.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use bazaar_core::validation::{validate_name, validate_price_cents, validate_rate_bps};
use bazaar_core::{Adjustment, AmountKind, Settings, ValidationError};

use crate::dto::{SettingsDto, UpdateSettingsRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}

/// GET /api/settings
async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SettingsDto>> {
    let settings = state.db.settings().get().await?;
    Ok(Json(SettingsDto::from(settings)))
}

/// PUT /api/settings - absent fields keep their stored value
async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsDto>> {
    let current = state.db.settings().get().await?;
    let next = merge(current, req)?;
    let stored = state.db.settings().update(&next).await?;

    info!(
        store = %stored.store_name,
        tax = ?stored.tax(),
        vat = ?stored.vat(),
        "Settings updated"
    );

    Ok(Json(SettingsDto::from(stored)))
}

fn merge(mut settings: Settings, req: UpdateSettingsRequest) -> ApiResult<Settings> {
    if let Some(name) = req.store_name {
        validate_name("store name", &name, 100)?;
        settings.store_name = name.trim().to_string();
    }

    if let Some(currency) = req.currency {
        let currency = currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a three-letter ISO 4217 code".to_string(),
            }
            .into());
        }
        settings.currency = currency;
    }

    if let Some(tax) = req.tax {
        validate_adjustment("tax", tax)?;
        settings.tax_kind = tax.kind;
        settings.tax_value = tax.value;
    }

    if let Some(vat) = req.vat {
        validate_adjustment("vat", vat)?;
        settings.vat_kind = vat.kind;
        settings.vat_value = vat.value;
    }

    settings.updated_at = Utc::now();
    Ok(settings)
}

fn validate_adjustment(field: &str, adjustment: Adjustment) -> ApiResult<()> {
    match adjustment.kind {
        AmountKind::Percentage => validate_rate_bps(field, adjustment.value)?,
        AmountKind::Fixed => validate_price_cents(adjustment.value)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn settings() -> Settings {
        Settings {
            store_name: "Bazaar".to_string(),
            currency: "USD".to_string(),
            tax_kind: AmountKind::Fixed,
            tax_value: 0,
            vat_kind: AmountKind::Fixed,
            vat_value: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let req = UpdateSettingsRequest {
            vat: Some(Adjustment::percentage(1_500)),
            currency: Some(" bdt ".to_string()),
            ..UpdateSettingsRequest::default()
        };
        let merged = merge(settings(), req).unwrap();
        assert_eq!(merged.store_name, "Bazaar");
        assert_eq!(merged.currency, "BDT");
        assert_eq!(merged.vat(), Adjustment::percentage(1_500));
        assert_eq!(merged.tax(), Adjustment::none());
    }

    #[test]
    fn test_merge_rejects_bad_values() {
        let over = UpdateSettingsRequest {
            tax: Some(Adjustment::percentage(10_001)),
            ..UpdateSettingsRequest::default()
        };
        assert_eq!(merge(settings(), over).unwrap_err().code, ErrorCode::ValidationError);

        let negative = UpdateSettingsRequest {
            vat: Some(Adjustment::fixed(-1)),
            ..UpdateSettingsRequest::default()
        };
        assert!(merge(settings(), negative).is_err());

        let huge = UpdateSettingsRequest {
            tax: Some(Adjustment::fixed(i64::MAX)),
            ..UpdateSettingsRequest::default()
        };
        assert_eq!(merge(settings(), huge).unwrap_err().code, ErrorCode::ValidationError);

        let currency = UpdateSettingsRequest {
            currency: Some("dollars".to_string()),
            ..UpdateSettingsRequest::default()
        };
        assert!(merge(settings(), currency).is_err());

        let blank = UpdateSettingsRequest {
            store_name: Some("  ".to_string()),
            ..UpdateSettingsRequest::default()
        };
        assert!(merge(settings(), blank).is_err());
    }
}
