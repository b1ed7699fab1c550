//! Audio-Geraete-Auswahl via cpal
//!
//! Listet Ein-/Ausgabegeraete auf und waehlt per Index oder
//! Standardgeraet. Ungueltige Indizes sind Konfigurationsfehler und
//! beim Prozessstart fatal.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

use crate::error::{AudioError, AudioResult};

/// Gibt die Namen aller Eingabegeraete zurueck (Index = Position)
pub fn eingabegeraete() -> AudioResult<Vec<String>> {
    let host = cpal::default_host();
    let geraete = host
        .input_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    Ok(geraete.map(|d| geraet_name(&d)).collect())
}

/// Gibt die Namen aller Ausgabegeraete zurueck (Index = Position)
pub fn ausgabegeraete() -> AudioResult<Vec<String>> {
    let host = cpal::default_host();
    let geraete = host
        .output_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    Ok(geraete.map(|d| geraet_name(&d)).collect())
}

/// Waehlt ein Eingabegeraet per Index, sonst das Standardgeraet
pub fn eingabegeraet_waehlen(index: Option<usize>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match index {
        Some(idx) => {
            let mut geraete = host
                .input_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            geraete.nth(idx).ok_or_else(|| {
                AudioError::GeraetNichtGefunden(format!("Eingabegeraet mit Index {}", idx))
            })
        }
        None => host
            .default_input_device()
            .ok_or(AudioError::KeinStandardEingabegeraet),
    }
}

/// Waehlt ein Ausgabegeraet per Index, sonst das Standardgeraet
pub fn ausgabegeraet_waehlen(index: Option<usize>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match index {
        Some(idx) => {
            let mut geraete = host
                .output_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            geraete.nth(idx).ok_or_else(|| {
                AudioError::GeraetNichtGefunden(format!("Ausgabegeraet mit Index {}", idx))
            })
        }
        None => host
            .default_output_device()
            .ok_or(AudioError::KeinStandardAusgabegeraet),
    }
}

fn geraet_name(geraet: &Device) -> String {
    geraet.name().unwrap_or_else(|_| "Unbekannt".to_string())
}
