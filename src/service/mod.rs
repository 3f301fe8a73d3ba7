pub mod accounts;
pub mod book_aggregate;
pub mod cover_cache;
pub mod library;
pub mod review_enrichment;
