pub mod asset;
pub mod manifest;
pub mod report;
pub mod source;
