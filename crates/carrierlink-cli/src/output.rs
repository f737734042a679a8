//! Output formatting and writing utilities
//!
//! Results are written to stdout in the selected format. Machine formats
//! serialize the canonical result types as-is; the human format renders
//! tables and summaries.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use carrierlink_core::{Money, ShipmentResult, ShippingRate, TrackingResult};
use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting output with specialized support for carrier results
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format quoted rates
    fn format_rates(&self, rates: &[ShippingRate]) -> Result<String>;

    /// Format a booked shipment
    fn format_shipment(&self, shipment: &ShipmentResult) -> Result<String>;

    /// Format a tracking history
    fn format_tracking(&self, tracking: &TrackingResult) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_rates(&self, rates: &[ShippingRate]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_rates_human(rates)),
            _ => self.format(&rates),
        }
    }

    fn format_shipment(&self, shipment: &ShipmentResult) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_shipment_human(shipment)),
            _ => self.format(shipment),
        }
    }

    fn format_tracking(&self, tracking: &TrackingResult) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_tracking_human(tracking)),
            _ => self.format(tracking),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "✓".green(), message.green()))
        } else {
            self.writeln(&format!("OK: {}", message))
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.trace_redacted(value);
        let formatted = self.format.format(value)?;
        self.emit(&formatted)
    }

    /// Write quoted rates
    pub fn rates(&mut self, rates: &[ShippingRate]) -> Result<()> {
        self.trace_redacted(&rates);
        let formatted = self.format.format_rates(rates)?;
        self.emit(&formatted)
    }

    /// Write a booked shipment
    pub fn shipment(&mut self, shipment: &ShipmentResult) -> Result<()> {
        self.trace_redacted(shipment);
        let formatted = self.format.format_shipment(shipment)?;
        self.emit(&formatted)
    }

    /// Write a tracking history
    pub fn tracking(&mut self, tracking: &TrackingResult) -> Result<()> {
        self.trace_redacted(tracking);
        let formatted = self.format.format_tracking(tracking)?;
        self.emit(&formatted)
    }

    /// Write a table (human format only)
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        let rendered = render_table(headers, rows);
        self.write(&rendered)
    }

    /// Create a spinner for a provider call
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn emit(&mut self, formatted: &str) -> Result<()> {
        if self.format == OutputFormat::Human || !formatted.ends_with('\n') {
            self.writeln(formatted.trim_end_matches('\n'))
        } else {
            self.write(formatted)
        }
    }

    fn trace_redacted<T: Serialize>(&self, value: &T) {
        if let Ok(mut value_json) = serde_json::to_value(value) {
            redaction::redact_json_value(&mut value_json);
            trace!(data = %value_json, "Writing result");
        }
    }
}

/// Spinner style shown while waiting on a carrier
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Render rows under headers with aligned columns
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();
    let header_row = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" │ ");
    output.push_str(header_row.trim_end());
    output.push('\n');

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&separator);
    output.push('\n');

    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = *width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join(" │ ");
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

fn format_rates_human(rates: &[ShippingRate]) -> String {
    if rates.is_empty() {
        return "No services available for this route\n".to_string();
    }

    let rows = rates
        .iter()
        .map(|rate| {
            vec![
                rate.service_name.clone(),
                rate.service_code.clone(),
                Money::new(rate.currency.clone(), rate.amount).to_string(),
                match rate.estimated_days {
                    Some(1) => "1 day".to_string(),
                    Some(days) => format!("{} days", days),
                    None => "-".to_string(),
                },
            ]
        })
        .collect::<Vec<_>>();

    render_table(&["Service", "Code", "Price", "Transit"], &rows)
}

fn format_shipment_human(shipment: &ShipmentResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Shipment:      {}\n", shipment.id));
    output.push_str(&format!("Provider ID:   {}\n", shipment.provider_shipment_id));
    output.push_str(&format!("Tracking:      {}\n", or_dash(&shipment.tracking_number)));
    output.push_str(&format!("Tracking URL:  {}\n", or_dash(&shipment.tracking_url)));
    output.push_str(&format!("Label:         {}\n", or_dash(&shipment.label_url)));
    output.push_str(&format!("Cost:          {}\n", shipment.cost));
    output.push_str(&format!("Status:        {}\n", shipment.status));

    output
}

fn format_tracking_human(tracking: &TrackingResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tracking {}: {}\n", tracking.tracking_number, tracking.status));
    if let Some(eta) = tracking.estimated_delivery {
        output.push_str(&format!("Estimated delivery: {}\n", format_time(Some(eta))));
    }
    if let Some(delivered) = tracking.actual_delivery {
        output.push_str(&format!("Delivered: {}\n", format_time(Some(delivered))));
    }

    if tracking.events.is_empty() {
        output.push_str("No tracking events yet\n");
        return output;
    }

    output.push('\n');
    let rows = tracking
        .events
        .iter()
        .map(|event| {
            vec![
                format_time(event.timestamp),
                event.status.to_string(),
                event.location.clone().unwrap_or_else(|| "-".to_string()),
                event.description.clone(),
            ]
        })
        .collect::<Vec<_>>();
    output.push_str(&render_table(&["Time", "Status", "Location", "Details"], &rows));

    output
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrierlink_core::{ShipmentStatus, TrackingEvent};
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn rate(name: &str, code: &str, amount: i64, days: Option<u32>) -> ShippingRate {
        ShippingRate {
            service_name: name.to_string(),
            service_code: code.to_string(),
            currency: "INR".to_string(),
            amount,
            estimated_days: days,
            provider: "shiprocket".to_string(),
        }
    }

    fn shipment() -> ShipmentResult {
        ShipmentResult {
            id: "shiprocket_9001".to_string(),
            provider_shipment_id: "CL-1700000000000".to_string(),
            tracking_number: "141123221084922".to_string(),
            tracking_url: "https://shiprocket.co/tracking/141123221084922".to_string(),
            label_url: String::new(),
            cost: Money::new("INR", 8550),
            status: ShipmentStatus::Created,
        }
    }

    #[test]
    fn test_rates_table_human() {
        let rates = vec![
            rate("Delhivery Surface", "10", 8550, Some(4)),
            rate("Xpressbees", "33", 12000, None),
        ];
        let rendered = OutputFormat::Human.format_rates(&rates).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].starts_with("Service"));
        assert!(lines[2].contains("Delhivery Surface"));
        assert!(lines[2].contains("85.50 INR"));
        assert!(lines[2].contains("4 days"));
        assert!(lines[3].contains("120.00 INR"));
        assert!(lines[3].ends_with("-"));
    }

    #[test]
    fn test_empty_rates_human() {
        let rendered = OutputFormat::Human.format_rates(&[]).unwrap();
        assert_eq!(rendered, "No services available for this route\n");
    }

    #[test]
    fn test_rates_json_keeps_minor_units() {
        let rates = vec![rate("Delhivery Surface", "10", 8550, Some(4))];
        let rendered = OutputFormat::Json.format_rates(&rates).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["amount"], 8550);
        assert_eq!(value[0]["serviceCode"], "10");
    }

    #[test]
    fn test_shipment_human() {
        let rendered = OutputFormat::Human.format_shipment(&shipment()).unwrap();
        assert!(rendered.contains("Provider ID:   CL-1700000000000"));
        assert!(rendered.contains("Label:         -"));
        assert!(rendered.contains("Cost:          85.50 INR"));
        assert!(rendered.contains("Status:        created"));
    }

    #[test]
    fn test_tracking_human() {
        let tracking = TrackingResult {
            tracking_number: "141123221084922".to_string(),
            status: ShipmentStatus::InTransit,
            events: vec![TrackingEvent {
                timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 2, 4, 30, 0).unwrap()),
                status: ShipmentStatus::InTransit,
                location: Some("Hyderabad".to_string()),
                description: "Shipment in transit".to_string(),
                provider_status_code: Some("18".to_string()),
            }],
            estimated_delivery: None,
            actual_delivery: None,
        };
        let rendered = OutputFormat::Human.format_tracking(&tracking).unwrap();
        assert!(rendered.starts_with("Tracking 141123221084922: in_transit\n"));
        assert!(rendered.contains("2024-03-02 04:30 UTC"));
        assert!(rendered.contains("Hyderabad"));
        assert!(!rendered.contains("Estimated delivery"));
    }

    #[test]
    fn test_writer_yaml_and_quiet() {
        let buffer = SharedBuffer::default();
        let mut writer = OutputWriter::with_writer(OutputFormat::Yaml, false, false, Box::new(buffer.clone()));
        writer.shipment(&shipment()).unwrap();
        writer.success("ignored for machine formats").unwrap();
        let contents = buffer.contents();
        assert!(contents.contains("providerShipmentId: CL-1700000000000"));
        assert!(!contents.contains("ignored"));

        let buffer = SharedBuffer::default();
        let mut writer = OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));
        writer.success("hidden").unwrap();
        writer.section("Rates").unwrap();
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_render_table_alignment() {
        let rendered = render_table(&["A", "Longer"], &[vec!["wide cell".to_string(), "x".to_string()]]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "A         │ Longer");
        assert_eq!(lines[2], "wide cell │ x");
    }
}
