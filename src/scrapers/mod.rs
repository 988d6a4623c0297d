//! Story listing scrapers.
//!
//! # Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`source`] | [`source::PageSource`] seam and its `reqwest` implementation |
//! | [`ao3`] | Archive of Our Own tag listing: parsing, filtering, pagination |
//!
//! The scraper is sequential: one request in flight, each page fully
//! processed and written before the next link is followed.

pub mod ao3;
pub mod source;
