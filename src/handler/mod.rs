pub mod context;
pub mod delay;
