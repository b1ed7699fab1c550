//! sprechfunk-core – Gemeinsame Typen und Fehler
//!
//! Enthaelt die Bausteine die alle anderen Crates teilen:
//! - [`types`] – `ClientId` und die Audio-Format-Konstanten
//! - [`error`] – Zentraler Fehler-Enum

pub mod error;
pub mod types;

pub use error::{Result, SprechfunkError};
pub use types::{ClientId, FRAME_DAUER_MS, FRAME_LAENGE, KANAELE, SAMPLE_RATE};
