pub mod asset;
pub mod asset_tag;
pub mod blob_object;
pub mod source;
pub mod stored_file;
