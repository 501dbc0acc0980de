pub mod http;
pub mod runpod;
