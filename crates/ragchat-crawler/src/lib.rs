//! RagChat Crawler Library
//!
//! Fetches pages of a single site breadth-first and hands their text to a
//! [`ragchat_core::PageSink`].

pub mod crawler;
pub mod html;

pub use crawler::{CrawlOptions, Crawler};
pub use html::{extract_links, extract_text};
