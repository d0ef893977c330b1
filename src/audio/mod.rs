pub mod analysis;
pub mod decode;
pub mod features;
pub mod filter;
pub mod peaks;
pub mod tempo;
