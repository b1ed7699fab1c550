//! Fehlertypen fuer Sprechfunk
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Sprechfunk
pub type Result<T> = std::result::Result<T, SprechfunkError>;

/// Alle moeglichen Fehler im Sprechfunk-System
#[derive(Debug, Error)]
pub enum SprechfunkError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Protokoll ---
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    #[error("Unerwarteter Nachrichtentyp: erwartet={erwartet}, erhalten={erhalten}")]
    FalscherNachrichtentyp { erwartet: String, erhalten: String },

    // --- Relay ---
    #[error("Relay voll: keine freie Client-ID")]
    RelayVoll,

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Audio ---
    #[error("Audiofehler: {0}")]
    Audio(String),

    // --- Intern ---
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl SprechfunkError {
    /// Erstellt einen Protokollfehler aus einer beliebigen Nachricht
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Gibt true zurueck wenn ein neuer Verbindungsversuch sinnvoll ist
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Verbindung(_) | Self::Getrennt(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = SprechfunkError::Protokoll("body_size == 0".into());
        assert_eq!(e.to_string(), "Protokollfehler: body_size == 0");
    }

    #[test]
    fn wiederholbar_erkennung() {
        assert!(SprechfunkError::Getrennt("EOF".into()).ist_wiederholbar());
        assert!(!SprechfunkError::Konfiguration("kaputt".into()).ist_wiederholbar());
    }

    #[test]
    fn falscher_nachrichtentyp_felder() {
        let e = SprechfunkError::FalscherNachrichtentyp {
            erwartet: "InitClient".into(),
            erhalten: "Audio".into(),
        };
        assert!(e.to_string().contains("erwartet=InitClient"));
        assert!(e.to_string().contains("erhalten=Audio"));
    }
}
