pub mod envelope;
pub mod license;
pub mod session;
