pub mod score;
pub mod validate;
