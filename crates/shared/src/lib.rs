//! Domain types and pure logic for the FreelPay client.
//!
//! Everything here is I/O-free: the invoice model and lifecycle, list
//! filtering, company-registry payload normalization, translation lookup
//! and profile wire types. Network calls live in the client crate.

pub mod company;
#[cfg(test)]
pub(crate) mod test_util;
pub mod filter;
pub mod i18n;
pub mod invoice;
pub mod profile;

pub use company::{CompanyInfo, RegistryError, RegistryResponse};
pub use filter::InvoiceFilter;
pub use i18n::{translate, Language};
pub use invoice::{available_actions, classify, Action, Invoice, InvoiceStatus, NewInvoice};
pub use profile::{ProfileUpdate, UserProfile};
