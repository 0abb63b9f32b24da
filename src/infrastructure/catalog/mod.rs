//! Image catalog listing.

mod client;
mod dto;

pub use client::{CatalogClient, DEFAULT_CATALOG_BASE, DEFAULT_PAGE_SIZE, parse_page};
pub use dto::{ImageRecord, RecordRejection};
