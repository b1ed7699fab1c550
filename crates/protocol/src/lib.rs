//! sprechfunk-protocol – Binaeres Wire-Format
//!
//! Definiert die Nachrichten-Typen und das Frame-Format fuer die
//! TCP-Verbindung zwischen Client und Relay.
//!
//! ## Module
//! - [`message`] – `MsgType`, `Message` und Sample-Konvertierung
//! - [`wire`] – Encode/Decode, async Lese-/Schreib-Helfer und
//!   `MessageCodec` fuer `tokio_util::codec::Framed`

pub mod message;
pub mod wire;

pub use message::{bytes_zu_samples, samples_zu_bytes, Message, MsgType};
pub use wire::{nachricht_lesen, nachricht_schreiben, MessageCodec};
