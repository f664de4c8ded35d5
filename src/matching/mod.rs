pub mod composite_key;
pub mod schema;
pub mod tfidf;

pub use composite_key::{build_composite_keys, clean_text};
pub use schema::{reconcile_schema, ReconciledTable};
pub use tfidf::{CharNgramTfidf, FittedTfidf, SparseVector};
