pub mod active;
pub mod normalize;
pub mod required;
pub mod resolve;
