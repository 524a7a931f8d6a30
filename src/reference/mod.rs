//! Reference Module
//!
//! Static reference data shipped with the application.

pub mod tax_ids;

pub use tax_ids::{parse_table, TaxIdFormat, TAX_ID_FORMATS};
