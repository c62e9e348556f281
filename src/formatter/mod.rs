mod doc_block;

pub use doc_block::serialize;
