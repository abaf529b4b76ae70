pub mod adapter;
pub mod comment;
pub mod context;
pub mod encoding;
pub mod id;
