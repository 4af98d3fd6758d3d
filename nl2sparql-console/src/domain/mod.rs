pub mod activity;
pub mod knowledge;
pub mod session;
