//! sprechfunk-voice – Empfangs-Pipeline des Clients
//!
//! ## Module
//! - [`jitter_buffer`] – Adaptiver Jitter Buffer mit Verlustverdeckung
//! - [`peers`] – Registry der bekannten Gegenstellen
//! - [`mischer`] – Mischt pro Tick einen Frame aus allen Peers

pub mod jitter_buffer;
pub mod mischer;
pub mod peers;

pub use jitter_buffer::JitterBuffer;
pub use mischer::frame_mischen;
pub use peers::PeerRegistry;
