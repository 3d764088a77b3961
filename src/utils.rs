pub mod fsutils;
pub mod imgutils;
