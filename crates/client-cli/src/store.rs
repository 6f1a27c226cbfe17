//! Invoice list store.
//!
//! Owns the authoritative fetched list and the cache-invalidation
//! contract: mutating operations (send, create, upload) invalidate the
//! list, and a refresh is the consequence of that invalidation rather
//! than an ad-hoc side effect. Status is never edited locally; only a
//! refresh changes what the list shows.

use shared::{Invoice, InvoiceFilter};

#[derive(Debug, Default)]
pub struct InvoiceStore {
    invoices: Vec<Invoice>,
    /// Set by mutating operations; cleared when a refresh settles.
    stale: bool,
    /// Whether any fetch attempt has settled yet.
    loaded: bool,
    /// Error from the most recent failed refresh, for a non-blocking
    /// notice. The previous list stays visible.
    last_error: Option<String>,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cached list stale. Every mutating operation calls this;
    /// the owner reacts by issuing exactly one refresh.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale || !self.loaded
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Apply a fetched list, replacing the cache wholesale.
    pub fn apply_refresh(&mut self, invoices: Vec<Invoice>) {
        self.invoices = invoices;
        self.stale = false;
        self.loaded = true;
        self.last_error = None;
    }

    /// Record a failed refresh. The previously displayed list remains
    /// intact (stale but visible). The attempt still settles the pending
    /// invalidation: another fetch requires a new `invalidate`, so an
    /// unreachable backend is not hammered with automatic retries.
    pub fn refresh_failed(&mut self, error: String) {
        self.stale = false;
        self.loaded = true;
        self.last_error = Some(error);
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Derived projection for display; never mutates the cache.
    pub fn visible<'a>(&'a self, filter: &InvoiceFilter) -> Vec<&'a Invoice> {
        filter.apply(&self.invoices)
    }

    pub fn get(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }
}
