//! sprechfunk-audio – Audio-Pipeline des Clients
//!
//! ## Module
//! - [`dsp`] – DSP-Bausteine (Biquad, De-Esser, Kompressor, Noise Gate)
//! - [`vorverarbeitung`] – Die feste Sprach-Vorverarbeitungskette
//! - [`sammler`] – Frame-Sammler (variable Bloecke -> feste Frames)
//! - [`ring`] – Mutex-gesicherter Audio-Ring zwischen Mixer und Wiedergabe
//! - [`geraete`] – Geraete-Auswahl via cpal
//! - [`aufnahme`] – Mikrofon-Capture-Stream (cpal)
//! - [`wiedergabe`] – Wiedergabe-Stream (cpal, liest aus dem Ring)

pub mod aufnahme;
pub mod dsp;
pub mod error;
pub mod geraete;
pub mod ring;
pub mod sammler;
pub mod vorverarbeitung;
pub mod wiedergabe;

pub use error::{AudioError, AudioResult};
pub use ring::AudioRing;
pub use sammler::FrameSammler;
pub use vorverarbeitung::Vorverarbeitung;
