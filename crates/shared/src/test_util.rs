use chrono::{TimeZone, Utc};

use crate::invoice::{Invoice, InvoiceStatus};

pub(crate) fn sample_invoice(id: &str, status: InvoiceStatus) -> Invoice {
    Invoice {
        id: id.to_string(),
        invoice_number: format!("INV-{}", id),
        client: "Acme".to_string(),
        amount: 1200.0,
        currency: "EUR".to_string(),
        due_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        description: None,
        created_date: Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap(),
        status,
        financing_date: None,
        possible_financing: None,
        score: None,
    }
}
