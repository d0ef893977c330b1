pub mod buffer;
pub mod dynamics;
pub mod envelope;
pub mod eq;
pub mod offline;
pub mod pipeline;
