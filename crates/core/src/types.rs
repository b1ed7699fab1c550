//! Identifikations-Typ und Audio-Format-Konstanten
//!
//! Die `ClientId` verwendet das Newtype-Pattern um Verwechslungen mit
//! rohen Bytes zur Compilezeit auszuschliessen. Die Audio-Konstanten
//! muessen auf beiden Seiten der Verbindung identisch sein, damit
//! Frames interpretierbar bleiben.

use std::fmt;

// ---------------------------------------------------------------------------
// Audio-Format
// ---------------------------------------------------------------------------

/// Abtastrate in Hz
pub const SAMPLE_RATE: u32 = 48_000;

/// Anzahl der Audio-Kanaele (Mono)
pub const KANAELE: u16 = 1;

/// Frame-Laenge in Samples (25 ms bei 48 kHz)
pub const FRAME_LAENGE: usize = 1200;

/// Frame-Dauer in Millisekunden
pub const FRAME_DAUER_MS: u64 = (FRAME_LAENGE as u64 * 1000) / SAMPLE_RATE as u64;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// Eindeutige Teilnehmer-ID (8 Bit)
///
/// Der Wert `0` ist reserviert: ein Client sendet `0` im Handshake und
/// bekommt vom Relay eine vergebene ID zugewiesen. Im Registry des Relays
/// kommt `0` niemals vor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u8);

impl ClientId {
    /// Sentinel-Wert "noch nicht vergeben" (Handshake)
    pub const UNVERGEBEN: ClientId = ClientId(0);

    /// Gibt true zurueck wenn die ID vom Relay vergeben wurde
    pub fn ist_vergeben(&self) -> bool {
        self.0 != 0
    }

    /// Gibt den inneren u8-Wert zurueck
    pub fn inner(&self) -> u8 {
        self.0
    }
}

impl From<u8> for ClientId {
    fn from(wert: u8) -> Self {
        Self(wert)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client:{}", self.0)
    }
}
