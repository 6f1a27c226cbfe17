//! Local filtering of the fetched invoice list.
//!
//! Filtering is a synchronous projection over the authoritative list held
//! by the store; it never mutates or discards the underlying data. The
//! three criteria compose with AND and are order-independent.

use chrono::{DateTime, Utc};

use crate::invoice::{Invoice, InvoiceStatus};

/// Composable invoice list filter. An empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Case-insensitive substring match on client name or invoice number.
    pub search: Option<String>,
    /// Exact status match.
    pub status: Option<InvoiceStatus>,
    /// Inclusive lower bound on the created date.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the created date.
    pub to: Option<DateTime<Utc>>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !term.is_empty()
                && !invoice.client.to_lowercase().contains(&term)
                && !invoice.invoice_number.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if let Some(status) = self.status {
            if invoice.status != status {
                return false;
            }
        }
        if let Some(from) = self.from {
            if invoice.created_date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if invoice.created_date > to {
                return false;
            }
        }
        true
    }

    /// Derive the visible subset of `invoices`, preserving order.
    pub fn apply<'a>(&self, invoices: &'a [Invoice]) -> Vec<&'a Invoice> {
        invoices.iter().filter(|i| self.matches(i)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, str::is_empty)
            && self.status.is_none()
            && self.from.is_none()
            && self.to.is_none()
    }
}
