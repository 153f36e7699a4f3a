//! The search pipeline: query parsing, term resolution, engine execution and
//! document retrieval, driven by [`SearchService`].

pub mod config;
pub mod parser;
pub mod resolver;
pub mod search;

pub use config::{DocumentEncoding, PopularTerm, SearchConfig};
pub use parser::parse_query;
pub use resolver::TermResolver;
pub use search::{SearchResponse, SearchService};
