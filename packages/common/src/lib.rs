pub mod source_type;
pub mod storage;

pub use source_type::SourceType;
