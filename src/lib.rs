//! `ezgmail`: easy Gmail access.
//!
//! This crate builds Gmail search queries, fetches the matching messages
//! over the REST API and flattens their MIME part trees into plain-text and
//! HTML bodies plus lazily downloaded attachments.
//!
//! ```no_run
//! use ezgmail::config::load_config;
//! use ezgmail::search::{query::SearchCriteria, GmailService};
//!
//! # fn main() -> ezgmail::error::Result<()> {
//! let service = GmailService::from_config(&load_config())?;
//! let mut criteria = SearchCriteria::new();
//! criteria.in_inbox().has_attachment(true).newer_than("7d");
//!
//! for message in service.get_messages(&criteria)? {
//!     println!("{}", message.subject());
//!     for attachment in message.attachments() {
//!         let bytes = attachment.data()?;
//!         println!("  {} ({} bytes)", attachment.filename(), bytes.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod search;
pub mod transport;
