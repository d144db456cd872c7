pub mod board;
pub mod memory;
pub mod persistence;
pub mod sequencer;
pub mod session;
pub mod session_rows;
pub mod store;
