//! Handlers for the carrier contract commands

use super::utils::{build_adapter, load_request, with_spinner};
use crate::cli::{CancelArgs, OutputFormat, ProviderArgs, RequestFileArgs, ShipArgs, TrackArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use carrierlink_core::{
    supported_providers, CancelShipmentRequest, CreateShipmentRequest, OperationOutcome, ProviderId, RateRequest,
    TrackingRequest,
};
use serde::Serialize;
use tracing::Instrument;

/// One row of `carrierlink providers`
#[derive(Debug, Serialize)]
struct ProviderSummary {
    id: &'static str,
    name: &'static str,
    credentials: &'static str,
    configured: bool,
}

/// Handle the providers command
pub async fn handle_providers(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let summaries = supported_providers()
        .into_iter()
        .filter_map(|id| id.parse::<ProviderId>().ok())
        .map(|id| {
            let credentials = config.resolve_provider(id.as_str()).credentials();
            ProviderSummary {
                id: id.as_str(),
                name: id.display_name(),
                credentials: credentials.kind(),
                configured: !credentials.is_none(),
            }
        })
        .collect::<Vec<_>>();

    if output.format() != OutputFormat::Human {
        return output.data(&summaries);
    }

    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.name.to_string(),
                if s.configured {
                    s.credentials.to_string()
                } else {
                    "not configured".to_string()
                },
            ]
        })
        .collect::<Vec<_>>();
    output.table(&["Provider", "Name", "Credentials"], &rows)
}

/// Handle the test-connection command
pub async fn handle_test_connection(args: ProviderArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let adapter = build_adapter(&args.provider, config)?;
    let timer = Timer::for_provider("test_connection", adapter.provider());

    let outcome = with_spinner(
        output,
        "Contacting carrier...",
        adapter.test_connection().instrument(timer.span().clone()),
    )
    .await;

    report_outcome(
        output,
        "test-connection",
        &outcome,
        &format!("Connected to {}", adapter.provider()),
    )
}

/// Handle the rates command
pub async fn handle_rates(args: RequestFileArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let request: RateRequest = load_request(&args.request)?;
    let adapter = build_adapter(&args.provider, config)?;
    let timer = Timer::for_provider("get_rates", adapter.provider());

    let rates = with_spinner(
        output,
        "Fetching rates...",
        adapter.get_rates(&request).instrument(timer.span().clone()),
    )
    .await?;

    tracing::info!(provider = adapter.provider(), count = rates.len(), "Rates received");
    output.section(&format!("Rates from {}", adapter.provider()))?;
    output.rates(&rates)
}

/// Handle the ship command
pub async fn handle_ship(args: ShipArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mut request: CreateShipmentRequest = load_request(&args.request)?;
    if let Some(service_code) = args.service_code {
        request.service_code = service_code;
    }
    let adapter = build_adapter(&args.provider, config)?;
    let timer = Timer::for_provider("create_shipment", adapter.provider());

    let shipment = with_spinner(
        output,
        "Booking shipment...",
        adapter.create_shipment(&request).instrument(timer.span().clone()),
    )
    .await?;

    tracing::info!(
        provider = adapter.provider(),
        shipment_id = %shipment.id,
        status = %shipment.status,
        "Shipment booked"
    );
    output.shipment(&shipment)?;
    if shipment.label_url.is_empty() {
        output.warning("No label was generated; it can be produced later from the carrier dashboard")?;
    }
    Ok(())
}

/// Handle the track command
pub async fn handle_track(args: TrackArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let adapter = build_adapter(&args.provider, config)?;
    let timer = Timer::for_provider("get_tracking", adapter.provider());
    let request = TrackingRequest::new(args.tracking_number);

    let tracking = with_spinner(
        output,
        "Fetching tracking...",
        adapter.get_tracking(&request).instrument(timer.span().clone()),
    )
    .await?;

    output.tracking(&tracking)
}

/// Handle the cancel command
pub async fn handle_cancel(args: CancelArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let adapter = build_adapter(&args.provider, config)?;
    let timer = Timer::for_provider("cancel_shipment", adapter.provider());
    let request = CancelShipmentRequest::new(args.provider_shipment_id.clone());

    let outcome = with_spinner(
        output,
        "Cancelling shipment...",
        adapter.cancel_shipment(&request).instrument(timer.span().clone()),
    )
    .await;

    report_outcome(
        output,
        "cancel",
        &outcome,
        &format!("Shipment {} cancelled", args.provider_shipment_id),
    )
}

/// Print an advisory outcome; `success: false` becomes an error
fn report_outcome(output: &mut OutputWriter, operation: &str, outcome: &OperationOutcome, success: &str) -> Result<()> {
    if output.format() != OutputFormat::Human {
        output.data(outcome)?;
    } else if outcome.success {
        output.success(success)?;
    }

    if outcome.success {
        Ok(())
    } else {
        let message = outcome.error.clone().unwrap_or_else(|| "no reason given".to_string());
        Err(Error::operation_failed(operation, message))
    }
}
