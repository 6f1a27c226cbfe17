//! Invoice model and lifecycle.
//!
//! The status set is canonical here: whatever the backend sends goes
//! through [`classify`] before it reaches any display or decision code, so
//! an unexpected status can never crash the list view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Invoice lifecycle status.
///
/// `Unknown` is the safe degradation target for backend values outside the
/// canonical set; it renders as "None" and only permits viewing.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Signed,
    Financed,
    Unknown,
}

impl InvoiceStatus {
    /// All statuses a user can filter on. `Unknown` is deliberately absent:
    /// it is a display fallback, not a selectable state.
    pub const FILTERABLE: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Signed,
        InvoiceStatus::Financed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Signed => "Signed",
            InvoiceStatus::Financed => "Financed",
            InvoiceStatus::Unknown => "None",
        }
    }
}

/// Map a raw backend status string into the canonical set.
///
/// Total over all inputs. Historical spellings from earlier revisions of
/// the backend ("ongoing", "accepted", "Freelpaid", ...) are folded into
/// their canonical equivalents; anything unrecognized becomes `Unknown`.
pub fn classify(raw: &str) -> InvoiceStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "draft" | "ongoing" => InvoiceStatus::Draft,
        "sent" => InvoiceStatus::Sent,
        "signed" | "accepted" => InvoiceStatus::Signed,
        "financed" | "freelpaid" | "paid" => InvoiceStatus::Financed,
        _ => InvoiceStatus::Unknown,
    }
}

impl<'de> Deserialize<'de> for InvoiceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(classify(&raw))
    }
}

/// User-triggerable action on an invoice row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Send,
    View,
}

/// Actions available for an invoice in the given status.
///
/// Only `Draft` permits sending; every status permits viewing, so the
/// returned slice is never empty.
pub fn available_actions(status: InvoiceStatus) -> &'static [Action] {
    match status {
        InvoiceStatus::Draft => &[Action::Send, Action::View],
        _ => &[Action::View],
    }
}

/// An invoice as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub client: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub status: InvoiceStatus,
    /// Set once financing has actually occurred.
    #[serde(default)]
    pub financing_date: Option<DateTime<Utc>>,
    /// Populated only after server-side scoring.
    #[serde(default)]
    pub possible_financing: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Invoice {
    pub fn amount_display(&self) -> String {
        format_amount(self.amount, &self.currency)
    }

    /// Possible financing amount, or "-" when not yet scored.
    pub fn possible_financing_display(&self) -> String {
        match self.possible_financing {
            Some(v) => format_amount(v, &self.currency),
            None => "-".to_string(),
        }
    }

    pub fn financing_date_display(&self) -> String {
        match self.financing_date {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "-".to_string(),
        }
    }
}

fn format_amount(value: f64, currency: &str) -> String {
    format!("{:.2} {}", value, currency)
}

/// Body for manual invoice creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client: String,
    pub amount: f64,
    pub due_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
