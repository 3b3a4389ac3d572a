pub mod api_key;
pub mod generator;
pub mod reset;
pub mod session;
