pub mod enrichment;
pub mod storage;
