//! Document loading: directory scan + JSON parsing.

pub mod parse;
pub mod scan;

pub use parse::load_documents;
pub use scan::list_candidates;
