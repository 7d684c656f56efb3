pub mod count;
pub mod handler;
