pub mod capture;
pub mod gemini;
pub mod http_client;
pub mod sample;
pub mod state;
pub mod worker;
