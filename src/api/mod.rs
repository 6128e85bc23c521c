pub mod posts;
pub mod validation;
