pub mod rpm;
pub mod summary;
