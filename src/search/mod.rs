//! Web lookup of company names via the Tavily search API.

pub mod client;
pub mod types;

pub use client::{SearchClient, SearchError, TavilyClient};
pub use types::LookupResult;
