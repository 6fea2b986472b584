pub mod bff;
pub mod session;
