pub mod caps;
pub mod cycle;
pub mod recommend;
pub mod types;
