//! Shiprocket adapter
//!
//! Shiprocket works in kilograms, centimetres and INR. Bearer tokens come
//! either pre-issued or from an email/password login, and are cached per
//! adapter instance.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::{json, Value};
use tracing::instrument;

use crate::adapter::{CarrierAdapter, ProviderId};
use crate::auth::TokenCache;
use crate::config::{AdapterConfig, Credentials};
use crate::error::{
    extract_provider_message, normalize_error, ErrorKind, ErrorNormalizer, Operation, RawFailure, Result,
    ShippingError,
};
use crate::http::HttpTransport;
use crate::payload::{
    declared_value_minor, fill_or_placeholder, largest_parcel, minor_to_major, round_to, total_weight,
    PLACEHOLDER_EMAIL, PLACEHOLDER_PHONE,
};
use crate::status::{sort_events_most_recent_first, SHIPROCKET_STATUS_RULES};
use crate::types::{
    CancelShipmentRequest, CreateShipmentRequest, Money, OperationOutcome, RateRequest, ShipmentResult,
    ShipmentStatus, ShippingRate, TrackingEvent, TrackingRequest, TrackingResult,
};
use crate::units::{LengthUnit, WeightUnit};

const PROVIDER: &str = "shiprocket";
const CURRENCY: &str = "INR";
const ACCEPTED_CREDENTIALS: &str = "email + password or token";

const LOGIN_PATH: &str = "auth/login";
const CHANNELS_PATH: &str = "channels";
const SERVICEABILITY_PATH: &str = "courier/serviceability/";
const CREATE_ORDER_PATH: &str = "orders/create/adhoc";
const ASSIGN_AWB_PATH: &str = "courier/assign/awb";
const GENERATE_LABEL_PATH: &str = "courier/generate/label";
const TRACK_AWB_PATH: &str = "courier/track/awb";
const CANCEL_ORDER_PATH: &str = "orders/cancel";

const TRACKING_URL_PREFIX: &str = "https://shiprocket.co/tracking/";
const DEFAULT_PICKUP_LOCATION: &str = "Primary";
const TRACKING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static NULL: Value = Value::Null;

/// Shiprocket reports local Indian time (UTC+05:30)
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Adapter for the Shiprocket v1 external API
#[derive(Debug)]
pub struct ShiprocketAdapter {
    credentials: Credentials,
    transport: HttpTransport,
    tokens: TokenCache,
}

impl ShiprocketAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://apiv2.shiprocket.in/v1/external";

    pub fn new(credentials: Credentials, config: &AdapterConfig) -> Result<Self> {
        let base_url = config.resolve_base_url(Self::DEFAULT_BASE_URL);
        let transport = HttpTransport::new(PROVIDER, &base_url, &config.timeouts, config.retry.clone())?;
        tracing::debug!(base_url = %base_url, credentials = credentials.kind(), "Shiprocket adapter configured");

        Ok(Self {
            credentials,
            transport,
            tokens: TokenCache::new(config.token_ttl),
        })
    }

    /// Fail fast with an actionable message when credentials are unusable
    fn require_credentials(&self) -> Result<()> {
        match &self.credentials {
            creds if creds.is_none() => Err(ShippingError::missing_credentials(PROVIDER, ACCEPTED_CREDENTIALS)),
            Credentials::Token { .. } | Credentials::EmailPassword { .. } => Ok(()),
            other => Err(ShippingError::config(
                PROVIDER,
                format!(
                    "Shiprocket accepts {} credentials, but '{}' credentials were configured",
                    ACCEPTED_CREDENTIALS,
                    other.kind()
                ),
            )),
        }
    }

    async fn authenticate(&self) -> Result<String> {
        self.tokens.ensure_authenticated(|| self.login()).await
    }

    async fn login(&self) -> Result<String> {
        self.require_credentials()?;

        let (email, password) = match &self.credentials {
            Credentials::Token { token } => return Ok(token.trim().to_string()),
            Credentials::EmailPassword { email, password } => (email, password),
            _ => return Err(ShippingError::missing_credentials(PROVIDER, ACCEPTED_CREDENTIALS)),
        };

        tracing::debug!("Logging in to Shiprocket");
        let body = json!({ "email": email, "password": password });
        let response = self
            .transport
            .post_json(LOGIN_PATH, &body, None)
            .await
            .map_err(|raw| login_failure(&raw))?;

        response
            .get("token")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ShippingError::auth(PROVIDER, "login response did not include a token"))
    }

    async fn get(&self, operation: Operation, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.get_at(operation, path, &[], query).await
    }

    /// GET `path` followed by percent-encoded identifier segments
    async fn get_at(
        &self,
        operation: Operation,
        path: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value> {
        let token = self.authenticate().await?;
        let response = if segments.is_empty() {
            self.transport.get_json(path, query, Some(&token)).await
        } else {
            self.transport.get_json_segments(path, segments, query, Some(&token)).await
        };
        match response {
            Ok(value) => Ok(value),
            Err(raw) => Err(self.fail(operation, &raw, &token).await),
        }
    }

    async fn post(&self, operation: Operation, path: &str, body: &Value) -> Result<Value> {
        let token = self.authenticate().await?;
        match self.transport.post_json(path, body, Some(&token)).await {
            Ok(value) => Ok(value),
            Err(raw) => Err(self.fail(operation, &raw, &token).await),
        }
    }

    /// Normalize a failed call; the rejected token is dropped from the cache
    async fn fail(&self, operation: Operation, raw: &RawFailure, token: &str) -> ShippingError {
        let error = self.normalize(raw);
        if error.kind == ErrorKind::AuthError {
            self.tokens.invalidate_if(token).await;
        }
        error.in_operation(operation)
    }

    async fn probe_channels(&self) -> Result<()> {
        let channels = self.get(Operation::TestConnection, CHANNELS_PATH, &[]).await?;
        let listed = channels.is_array() || channels.get("data").is_some_and(Value::is_array);
        if listed {
            Ok(())
        } else {
            Err(ShippingError::unknown(PROVIDER, "unexpected response from the channels endpoint"))
        }
    }

    async fn generate_label(&self, shipment_id: &Value) -> Option<String> {
        let body = json!({ "shipment_id": [shipment_id] });
        match self.post(Operation::CreateShipment, GENERATE_LABEL_PATH, &body).await {
            Ok(response) => {
                let url = response
                    .get("label_url")
                    .and_then(Value::as_str)
                    .filter(|u| !u.trim().is_empty())
                    .map(str::to_string);
                if url.is_none() {
                    tracing::warn!(%shipment_id, "Label generation returned no label URL");
                }
                url
            }
            Err(err) => {
                tracing::warn!(%shipment_id, error = %err, "Label generation failed; continuing without a label");
                None
            }
        }
    }
}

impl ErrorNormalizer for ShiprocketAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    /// Shiprocket sometimes rejects stale tokens with a 4xx other than 401
    fn normalize(&self, raw: &RawFailure) -> ShippingError {
        let mut error = normalize_error(PROVIDER, raw);
        if let RawFailure::Http { status: 400..=499, body } = raw {
            if mentions_rejected_token(body) {
                error.kind = ErrorKind::AuthError;
                error.retryable = false;
            }
        }
        error
    }
}

#[async_trait]
impl CarrierAdapter for ShiprocketAdapter {
    fn provider(&self) -> &str {
        ProviderId::Shiprocket.as_str()
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn test_connection(&self) -> OperationOutcome {
        match self.probe_channels().await {
            Ok(()) => OperationOutcome::ok(),
            Err(err) => {
                tracing::debug!(error = %err, "Shiprocket connection test failed");
                OperationOutcome::failed(err.message)
            }
        }
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, parcels = request.parcels.len()))]
    async fn get_rates(&self, request: &RateRequest) -> Result<Vec<ShippingRate>> {
        self.require_credentials()?;
        request
            .validate()
            .map_err(|e| ShippingError::invalid_request(Operation::GetRates, PROVIDER, e.to_string()))?;

        let query = serviceability_query(request);
        let response = self.get(Operation::GetRates, SERVICEABILITY_PATH, &query).await?;
        let rates = parse_rates(&response);
        tracing::debug!(count = rates.len(), "Shiprocket rates received");
        Ok(rates)
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, service_code = %request.service_code))]
    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<ShipmentResult> {
        self.require_credentials()?;
        request
            .validate()
            .map_err(|e| ShippingError::invalid_request(Operation::CreateShipment, PROVIDER, e.to_string()))?;

        let now = Utc::now();
        let order_id = format!("CL-{}", now.timestamp_millis());
        let order = build_order_payload(request, &order_id, now);

        let created = self.post(Operation::CreateShipment, CREATE_ORDER_PATH, &order).await?;
        let shipment_id = created
            .get("shipment_id")
            .filter(|id| !id.is_null())
            .cloned()
            .ok_or_else(|| {
                create_error(format!(
                    "order was not accepted: {}",
                    message_of(&created).unwrap_or_else(|| "no shipment id returned".to_string())
                ))
            })?;
        let provider_order_id = created
            .get("order_id")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| order_id.clone());
        tracing::info!(order_id = %provider_order_id, %shipment_id, "Shiprocket order created");

        let assign = json!({
            "shipment_id": shipment_id,
            "courier_id": numeric_or_string(&request.service_code),
        });
        let assigned = self.post(Operation::CreateShipment, ASSIGN_AWB_PATH, &assign).await?;
        let awb = parse_awb(&assigned)?;
        let cost = parse_freight(&assigned);

        let label_url = self.generate_label(&shipment_id).await;
        let status = if label_url.is_some() {
            ShipmentStatus::LabelCreated
        } else {
            ShipmentStatus::Created
        };

        let shipment_id = scalar_to_string(&shipment_id).unwrap_or_default();
        Ok(ShipmentResult {
            id: format!("{}_{}", PROVIDER, shipment_id),
            provider_shipment_id: provider_order_id,
            tracking_url: format!("{}{}", TRACKING_URL_PREFIX, awb),
            tracking_number: awb,
            label_url: label_url.unwrap_or_default(),
            cost,
            status,
        })
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, tracking_number = %request.tracking_number))]
    async fn get_tracking(&self, request: &TrackingRequest) -> Result<TrackingResult> {
        self.require_credentials()?;
        let awb = request.tracking_number.trim();
        if awb.is_empty() {
            return Err(ShippingError::invalid_request(
                Operation::GetTracking,
                PROVIDER,
                "trackingNumber: a tracking number is required",
            ));
        }

        let response = self.get_at(Operation::GetTracking, TRACK_AWB_PATH, &[awb], &[]).await?;
        parse_tracking(awb, &response)
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, shipment = %request.provider_shipment_id))]
    async fn cancel_shipment(&self, request: &CancelShipmentRequest) -> OperationOutcome {
        if let Err(err) = self.require_credentials() {
            return OperationOutcome::failed(err.message);
        }
        let order_id = request.provider_shipment_id.trim();
        if order_id.is_empty() {
            return OperationOutcome::failed("a provider shipment id is required");
        }

        let body = json!({ "ids": [numeric_or_string(order_id)] });
        match self.post(Operation::CancelShipment, CANCEL_ORDER_PATH, &body).await {
            Ok(_) => {
                tracing::info!(order_id, "Shiprocket order cancelled");
                OperationOutcome::ok()
            }
            Err(err) => {
                tracing::debug!(order_id, error = %err, "Shiprocket cancellation refused");
                OperationOutcome::failed(err.message)
            }
        }
    }
}

fn login_failure(raw: &RawFailure) -> ShippingError {
    let mut error = ShippingError::auth(PROVIDER, format!("login failed: {}", raw.summary()));
    error.retryable = raw.is_transient();
    error
}

fn create_error(message: impl Into<String>) -> ShippingError {
    ShippingError::new(ErrorKind::CreateError, PROVIDER, message)
}

fn mentions_rejected_token(body: &str) -> bool {
    let message = extract_provider_message(body).unwrap_or_default().to_lowercase();
    message.contains("token has expired")
        || message.contains("token is invalid")
        || message.contains("unauthenticated")
}

/// Query parameters for the serviceability (rate) endpoint
fn serviceability_query(request: &RateRequest) -> Vec<(&'static str, String)> {
    let weight = round_to(total_weight(&request.parcels, WeightUnit::Kg), 3);
    let declared_value = minor_to_major(declared_value_minor(&request.items));

    let mut query = vec![
        ("pickup_postcode", request.ship_from.postal_code.trim().to_string()),
        ("delivery_postcode", request.ship_to.postal_code.trim().to_string()),
        ("weight", weight.to_string()),
        ("cod", "0".to_string()),
        ("declared_value", declared_value.to_string()),
    ];
    if let Some(parcel) = largest_parcel(&request.parcels) {
        query.push(("length", round_to(parcel.length_in(LengthUnit::Cm), 2).to_string()));
        query.push(("breadth", round_to(parcel.width_in(LengthUnit::Cm), 2).to_string()));
        query.push(("height", round_to(parcel.height_in(LengthUnit::Cm), 2).to_string()));
    }
    query
}

/// Courier options from a serviceability response, cheapest first
fn parse_rates(response: &Value) -> Vec<ShippingRate> {
    let couriers = match response
        .pointer("/data/available_courier_companies")
        .and_then(Value::as_array)
    {
        Some(couriers) => couriers,
        None => return Vec::new(),
    };

    let mut rates: Vec<ShippingRate> = couriers
        .iter()
        .filter_map(|courier| {
            let service_code = courier.get("courier_company_id").and_then(scalar_to_string)?;
            let Some(rate) = courier.get("rate").and_then(number_of) else {
                tracing::debug!(service_code = %service_code, "Skipping courier without a rate");
                return None;
            };
            let service_name = courier
                .get("courier_name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Courier {}", service_code));
            let estimated_days = courier
                .get("estimated_delivery_days")
                .and_then(number_of)
                .filter(|days| *days >= 0.0)
                .map(|days| days.round() as u32);

            Some(ShippingRate {
                service_name,
                service_code,
                currency: CURRENCY.to_string(),
                amount: Money::from_major(CURRENCY, rate).amount,
                estimated_days,
                provider: PROVIDER.to_string(),
            })
        })
        .collect();

    rates.sort_by_key(|rate| rate.amount);
    rates
}

/// Adhoc order payload
///
/// Billing and shipping are the same party (`shipTo`); the pickup
/// location is the Shiprocket pickup nickname taken from `shipFrom.name`.
fn build_order_payload(request: &CreateShipmentRequest, order_id: &str, now: DateTime<Utc>) -> Value {
    let to = &request.ship_to;
    let order_date = now
        .with_timezone(&ist())
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let pickup_location = request
        .ship_from
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PICKUP_LOCATION);

    let extra_lines: Vec<&str> = to
        .address_lines
        .iter()
        .skip(1)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let order_items: Vec<Value> = if request.items.is_empty() {
        let name = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("Shipment");
        vec![json!({ "name": name, "sku": format!("{}-1", order_id), "units": 1, "selling_price": 0.0 })]
    } else {
        request
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                json!({
                    "name": item.name.clone().unwrap_or_else(|| format!("Item {}", index + 1)),
                    "sku": item.sku.clone().unwrap_or_else(|| format!("{}-{}", order_id, index + 1)),
                    "units": item.quantity,
                    "selling_price": minor_to_major(item.value),
                })
            })
            .collect()
    };

    let mut order = json!({
        "order_id": order_id,
        "order_date": order_date,
        "pickup_location": pickup_location,
        "billing_customer_name": fill_or_placeholder("shipTo.name", to.name.as_deref(), "Customer"),
        "billing_last_name": "",
        "billing_address": fill_or_placeholder("shipTo.addressLines[0]", to.line(0), "N/A"),
        "billing_address_2": extra_lines.join(", "),
        "billing_city": fill_or_placeholder("shipTo.city", to.city.as_deref(), "N/A"),
        "billing_state": fill_or_placeholder("shipTo.state", to.state.as_deref(), "N/A"),
        "billing_pincode": to.postal_code.trim(),
        "billing_country": to.country.trim(),
        "billing_email": fill_or_placeholder("shipTo.email", to.email.as_deref(), PLACEHOLDER_EMAIL),
        "billing_phone": fill_or_placeholder("shipTo.phone", to.phone.as_deref(), PLACEHOLDER_PHONE),
        "shipping_is_billing": true,
        "order_items": order_items,
        "payment_method": "Prepaid",
        "sub_total": minor_to_major(declared_value_minor(&request.items)),
        "weight": round_to(total_weight(&request.parcels, WeightUnit::Kg), 3),
    });

    if let (Some(parcel), Some(fields)) = (largest_parcel(&request.parcels), order.as_object_mut()) {
        fields.insert("length".into(), json!(round_to(parcel.length_in(LengthUnit::Cm), 2)));
        fields.insert("breadth".into(), json!(round_to(parcel.width_in(LengthUnit::Cm), 2)));
        fields.insert("height".into(), json!(round_to(parcel.height_in(LengthUnit::Cm), 2)));
    }
    if let (Some(company), Some(fields)) = (to.company.as_deref(), order.as_object_mut()) {
        fields.insert("billing_company_name".into(), json!(company));
    }

    order
}

/// AWB code from an assign response; a missing code means the order has no carrier
fn parse_awb(response: &Value) -> Result<String> {
    let data = response.pointer("/response/data").unwrap_or(response);
    let awb = data
        .get("awb_code")
        .and_then(scalar_to_string)
        .filter(|code| !code.trim().is_empty());

    awb.ok_or_else(|| {
        let reason = data
            .get("awb_assign_error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| message_of(response))
            .unwrap_or_else(|| "no AWB code returned".to_string());
        create_error(format!("courier assignment failed: {}", reason))
    })
}

fn parse_freight(response: &Value) -> Money {
    let data = response.pointer("/response/data").unwrap_or(response);
    ["applied_weight_amount", "freight_charges"]
        .iter()
        .find_map(|field| data.get(*field).and_then(number_of))
        .map(|amount| Money::from_major(CURRENCY, amount))
        .unwrap_or_else(|| Money::zero(CURRENCY))
}

fn parse_tracking(awb: &str, response: &Value) -> Result<TrackingResult> {
    // Some accounts get a single-element array back
    let response = match response {
        Value::Array(entries) => entries.first().unwrap_or(&NULL),
        other => other,
    };
    let data = response
        .get("tracking_data")
        .ok_or_else(|| track_error(format!("unexpected tracking response for {}", awb)))?;

    if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(track_error(message));
    }
    if data.get("track_status").and_then(number_of) == Some(0.0) {
        return Err(track_error(format!("no tracking record for {}", awb)));
    }

    let mut events: Vec<TrackingEvent> = data
        .get("shipment_track_activities")
        .and_then(Value::as_array)
        .map(|activities| activities.iter().map(parse_activity).collect())
        .unwrap_or_default();
    sort_events_most_recent_first(&mut events);

    let track = data
        .get("shipment_track")
        .and_then(Value::as_array)
        .and_then(|tracks| tracks.first());

    let status = track
        .and_then(|t| t.get("current_status"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !is_placeholder(s))
        .map(|s| SHIPROCKET_STATUS_RULES.normalize(s))
        .or_else(|| events.first().map(|e| e.status))
        .unwrap_or(ShipmentStatus::Created);

    let estimated_delivery = track
        .and_then(|t| t.get("edd"))
        .and_then(Value::as_str)
        .and_then(parse_provider_time)
        .or_else(|| data.get("etd").and_then(Value::as_str).and_then(parse_provider_time));

    let actual_delivery = track
        .and_then(|t| t.get("delivered_date"))
        .and_then(Value::as_str)
        .and_then(parse_provider_time)
        .or_else(|| {
            if status != ShipmentStatus::Delivered {
                return None;
            }
            events
                .iter()
                .find(|e| e.status == ShipmentStatus::Delivered)
                .and_then(|e| e.timestamp)
        });

    Ok(TrackingResult {
        tracking_number: awb.to_string(),
        status,
        events,
        estimated_delivery,
        actual_delivery,
    })
}

fn parse_activity(activity: &Value) -> TrackingEvent {
    let text = |field: &str| {
        activity
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !is_placeholder(s))
            .map(str::to_string)
    };

    let description = text("activity").unwrap_or_default();
    let label = text("sr-status-label");
    let status = SHIPROCKET_STATUS_RULES.normalize(label.as_deref().unwrap_or(&description));

    TrackingEvent {
        timestamp: text("date").as_deref().and_then(parse_provider_time),
        status,
        location: text("location"),
        description,
        provider_status_code: activity.get("status").and_then(scalar_to_string).or(label),
    }
}

/// Shiprocket fills unknown text fields with "NA"
fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("n/a")
}

fn track_error(message: impl Into<String>) -> ShippingError {
    ShippingError::new(ErrorKind::TrackError, PROVIDER, message)
}

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse a Shiprocket timestamp into UTC
///
/// Zone-less values are IST. Accepts `YYYY-MM-DD HH:MM:SS`, a bare date
/// (midnight IST) and RFC 3339.
fn parse_provider_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, TRACKING_TIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    ist()
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Number from a JSON number or numeric string
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Shiprocket ids are numeric; send them as numbers when they look like one
fn numeric_or_string(id: &str) -> Value {
    let id = id.trim();
    id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id))
}

fn message_of(response: &Value) -> Option<String> {
    extract_provider_message(&response.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Item, Parcel};
    use chrono::Timelike;

    fn address(postal_code: &str) -> Address {
        Address {
            postal_code: postal_code.to_string(),
            country: "India".to_string(),
            ..Default::default()
        }
    }

    fn parcel_kg(length: f64, width: f64, height: f64, weight: f64) -> Parcel {
        Parcel {
            length,
            width,
            height,
            distance_unit: LengthUnit::Cm,
            weight,
            mass_unit: WeightUnit::Kg,
        }
    }

    fn shipment_request(parcels: Vec<Parcel>, items: Vec<Item>) -> CreateShipmentRequest {
        CreateShipmentRequest {
            ship_from: Address {
                name: Some("Warehouse-BLR".to_string()),
                ..address("560001")
            },
            ship_to: Address {
                name: Some("Asha Rao".to_string()),
                address_lines: vec!["12 MG Road".to_string(), "Flat 4".to_string(), " ".to_string()],
                city: Some("Mumbai".to_string()),
                state: Some("Maharashtra".to_string()),
                phone: Some("9876543210".to_string()),
                ..address("400001")
            },
            parcels,
            service_code: "51".to_string(),
            items,
            description: Some("Books".to_string()),
        }
    }

    #[test]
    fn test_order_payload_aggregates_parcels() {
        let request = shipment_request(
            vec![parcel_kg(10.0, 10.0, 10.0, 1.0), parcel_kg(30.0, 20.0, 15.0, 2.0)],
            vec![Item {
                value: 49_950,
                quantity: 2,
                name: Some("Novel".to_string()),
                sku: None,
            }],
        );
        let payload = build_order_payload(&request, "CL-1", Utc::now());

        assert_eq!(payload["weight"], json!(3.0));
        assert_eq!(payload["length"], json!(30.0));
        assert_eq!(payload["breadth"], json!(20.0));
        assert_eq!(payload["height"], json!(15.0));
        assert_eq!(payload["sub_total"], json!(999.0));
        assert_eq!(payload["order_items"][0]["selling_price"], json!(499.5));
        assert_eq!(payload["order_items"][0]["sku"], json!("CL-1-1"));
        assert_eq!(payload["pickup_location"], json!("Warehouse-BLR"));
        assert_eq!(payload["billing_address_2"], json!("Flat 4"));
    }

    #[test]
    fn test_order_payload_placeholders_and_synthesized_item() {
        let mut request = shipment_request(vec![parcel_kg(10.0, 10.0, 10.0, 0.5)], vec![]);
        request.ship_to.email = None;
        request.ship_to.phone = None;
        request.ship_from.name = None;

        let payload = build_order_payload(&request, "CL-2", Utc::now());
        assert_eq!(payload["billing_email"], json!(PLACEHOLDER_EMAIL));
        assert_eq!(payload["billing_phone"], json!(PLACEHOLDER_PHONE));
        assert_eq!(payload["pickup_location"], json!(DEFAULT_PICKUP_LOCATION));
        assert_eq!(payload["order_items"].as_array().unwrap().len(), 1);
        assert_eq!(payload["order_items"][0]["name"], json!("Books"));
        assert_eq!(payload["sub_total"], json!(0.0));
    }

    #[test]
    fn test_serviceability_query_converts_units() {
        let request = RateRequest {
            ship_from: address("560001"),
            ship_to: address("400001"),
            parcels: vec![Parcel {
                length: 10.0,
                width: 5.0,
                height: 2.0,
                distance_unit: LengthUnit::In,
                weight: 2.0,
                mass_unit: WeightUnit::Lb,
            }],
            items: vec![],
        };
        let query = serviceability_query(&request);
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()).unwrap();

        assert_eq!(get("weight"), "0.907");
        assert_eq!(get("length"), "25.4");
        assert_eq!(get("breadth"), "12.7");
        assert_eq!(get("height"), "5.08");
        assert_eq!(get("cod"), "0");
        assert_eq!(get("pickup_postcode"), "560001");
    }

    #[test]
    fn test_parse_rates_sorted_and_tolerant() {
        let response = json!({
            "status": 200,
            "data": {
                "available_courier_companies": [
                    {"courier_name": "Delhivery", "courier_company_id": 12, "rate": 120.5, "estimated_delivery_days": "4"},
                    {"courier_name": "Xpressbees", "courier_company_id": 33, "rate": "89.00", "estimated_delivery_days": 3},
                    {"courier_name": "No Rate", "courier_company_id": 7},
                ]
            }
        });
        let rates = parse_rates(&response);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].service_code, "33");
        assert_eq!(rates[0].amount, 8900);
        assert_eq!(rates[0].estimated_days, Some(3));
        assert_eq!(rates[1].amount, 12050);
        assert_eq!(rates[1].currency, "INR");
        assert_eq!(rates[1].provider, "shiprocket");
    }

    #[test]
    fn test_parse_rates_without_couriers_is_empty() {
        assert!(parse_rates(&json!({"status": 404, "message": "not serviceable"})).is_empty());
        assert!(parse_rates(&json!({"data": {"available_courier_companies": []}})).is_empty());
    }

    #[test]
    fn test_parse_awb_and_freight() {
        let response = json!({
            "awb_assign_status": 1,
            "response": {"data": {"awb_code": "141123221084922", "applied_weight_amount": "105.5"}}
        });
        assert_eq!(parse_awb(&response).unwrap(), "141123221084922");
        assert_eq!(parse_freight(&response), Money::new("INR", 10550));

        let rejected = json!({
            "awb_assign_status": 0,
            "response": {"data": {"awb_assign_error": "Courier not serviceable"}}
        });
        let err = parse_awb(&rejected).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CreateError);
        assert!(err.message.contains("Courier not serviceable"));
        assert_eq!(parse_freight(&rejected), Money::zero("INR"));
    }

    #[test]
    fn test_provider_time_is_ist() {
        let parsed = parse_provider_time("2024-03-10 15:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-10T10:00:00+00:00");

        let date_only = parse_provider_time("2024-03-10").unwrap();
        assert_eq!(date_only.hour(), 18);

        assert!(parse_provider_time("2024-03-10T10:00:00Z").is_some());
        assert!(parse_provider_time("soon").is_none());
        assert!(parse_provider_time("").is_none());
    }

    #[test]
    fn test_parse_tracking_orders_and_normalizes() {
        let response = json!({
            "tracking_data": {
                "track_status": 1,
                "shipment_track": [{"current_status": "Delivered", "delivered_date": "2024-03-12 14:00:00", "edd": null}],
                "shipment_track_activities": [
                    {"date": "2024-03-10 09:00:00", "status": "6", "activity": "Shipment picked up", "location": "Bengaluru", "sr-status-label": "PICKED UP"},
                    {"date": "2024-03-11 09:00:00", "status": "18", "activity": "In transit to hub", "location": "Pune", "sr-status-label": "IN TRANSIT"},
                    {"date": "2024-03-12 14:00:00", "status": "7", "activity": "Delivered to consignee", "location": "Mumbai", "sr-status-label": "DELIVERED"}
                ]
            }
        });
        let result = parse_tracking("AWB1", &response).unwrap();

        assert_eq!(result.status, ShipmentStatus::Delivered);
        assert_eq!(result.events.len(), 3);
        assert_eq!(result.events[0].status, ShipmentStatus::Delivered);
        assert_eq!(result.events[1].status, ShipmentStatus::InTransit);
        assert_eq!(result.events[2].status, ShipmentStatus::PickedUp);
        assert_eq!(result.events[2].location.as_deref(), Some("Bengaluru"));
        assert_eq!(result.events[0].provider_status_code.as_deref(), Some("7"));
        assert!(result.events[0].timestamp > result.events[1].timestamp);
        assert_eq!(
            result.actual_delivery.map(|t| t.to_rfc3339()),
            Some("2024-03-12T08:30:00+00:00".to_string())
        );
        assert!(result.estimated_delivery.is_none());
    }

    #[test]
    fn test_parse_tracking_errors() {
        let missing = json!({"tracking_data": {"track_status": 0, "shipment_status": 0}});
        assert_eq!(parse_tracking("X", &missing).unwrap_err().kind, ErrorKind::TrackError);

        let errored = json!({"tracking_data": {"error": "Aahh! There is no activities found in our DB."}});
        let err = parse_tracking("X", &errored).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TrackError);
        assert!(err.message.contains("no activities"));

        assert_eq!(parse_tracking("X", &json!({})).unwrap_err().kind, ErrorKind::TrackError);
    }

    #[test]
    fn test_parse_tracking_falls_back_to_newest_event() {
        let response = json!([{
            "tracking_data": {
                "track_status": 1,
                "etd": "2024-03-15 18:00:00",
                "shipment_track_activities": [
                    {"date": "2024-03-10 09:00:00", "activity": "Picked up", "sr-status-label": "NA"},
                    {"date": "2024-03-11 09:00:00", "activity": "Out for delivery"}
                ]
            }
        }]);
        let result = parse_tracking("AWB2", &response).unwrap();
        assert_eq!(result.status, ShipmentStatus::InTransit);
        assert!(result.estimated_delivery.is_some());
        assert!(result.actual_delivery.is_none());
    }

    #[test]
    fn test_same_instant_activities_take_newest_status() {
        let response = json!({
            "tracking_data": {
                "track_status": 1,
                "shipment_track": [{"current_status": "NA"}],
                "shipment_track_activities": [
                    {"date": "2024-05-14 10:00:00", "activity": "Shipment picked up", "sr-status-label": "PICKED UP"},
                    {"date": "2024-05-14 10:00:00", "activity": "In transit to hub", "sr-status-label": "IN TRANSIT"}
                ]
            }
        });
        let result = parse_tracking("AWB3", &response).unwrap();
        let descriptions: Vec<_> = result.events.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, ["In transit to hub", "Shipment picked up"]);
        assert_eq!(result.status, ShipmentStatus::InTransit);
    }

    #[test]
    fn test_placeholder_current_status_falls_back_to_events() {
        for placeholder in ["NA", "na", " N/A "] {
            let response = json!({
                "tracking_data": {
                    "track_status": 1,
                    "shipment_track": [{"current_status": placeholder}],
                    "shipment_track_activities": [
                        {"date": "2024-05-15 09:00:00", "activity": "Delivered to consignee"}
                    ]
                }
            });
            let result = parse_tracking("AWB4", &response).unwrap();
            assert_eq!(result.status, ShipmentStatus::Delivered, "current_status {:?}", placeholder);
        }
    }

    #[test]
    fn test_stale_token_message_maps_to_auth_error() {
        let adapter = ShiprocketAdapter::new(Credentials::token("abc"), &AdapterConfig::default()).unwrap();
        let raw = RawFailure::Http {
            status: 400,
            body: r#"{"message": "Token has expired"}"#.to_string(),
        };
        assert_eq!(adapter.normalize(&raw).kind, ErrorKind::AuthError);

        let raw = RawFailure::Http {
            status: 422,
            body: r#"{"message": "Oops! Invalid Data."}"#.to_string(),
        };
        assert_eq!(adapter.normalize(&raw).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_numeric_ids_are_sent_as_numbers() {
        assert_eq!(numeric_or_string("12345"), json!(12345));
        assert_eq!(numeric_or_string("CL-1"), json!("CL-1"));
    }
}
