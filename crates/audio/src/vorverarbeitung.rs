//! Sprach-Vorverarbeitungskette
//!
//! Feste Kette, angewendet auf eine Kopie des Eingangs:
//!
//! 1. Hochpass 80 Hz (Trittschall, Plosive)
//! 2. Tiefpass 8 kHz (Obergrenze Sprachband)
//! 3. Sprach-EQ: +2.0 dB @ 3 kHz, -1.5 dB @ 250 Hz, +1.5 dB @ 5 kHz
//! 4. De-Esser (6.5 kHz Sidechain)
//! 5. Kompressor (-20 dB, 3:1)
//! 6. Noise Gate (-40 dB, 10 dB Hysterese)

use sprechfunk_core::SAMPLE_RATE;

use crate::dsp::biquad::BiquadFilter;
use crate::dsp::deesser::{DeEsser, DeEsserConfig};
use crate::dsp::kompressor::{Kompressor, KompressorConfig};
use crate::dsp::noise_gate::{NoiseGate, NoiseGateConfig};
use crate::dsp::AudioProcessor;

/// Die komplette Vorverarbeitungskette fuer das Mikrofonsignal
///
/// Alle Stufen sind zustandsbehaftet; `reset()` setzt Filter-Historien,
/// Envelopes und den Gate-Zustand zurueck und wird beim Session-Ende
/// aufgerufen.
pub struct Vorverarbeitung {
    hochpass: BiquadFilter,
    tiefpass: BiquadFilter,
    eq: [BiquadFilter; 3],
    deesser: DeEsser,
    kompressor: Kompressor,
    gate: NoiseGate,
}

impl Vorverarbeitung {
    /// Erstellt die Standard-Kette fuer die Session-Abtastrate
    pub fn neu() -> Self {
        Self::mit_abtastrate(SAMPLE_RATE)
    }

    /// Erstellt die Kette fuer eine beliebige Abtastrate
    pub fn mit_abtastrate(abtastrate: u32) -> Self {
        let fs = abtastrate as f32;
        Self {
            hochpass: BiquadFilter::hochpass(abtastrate, 80.0, 0.707),
            tiefpass: BiquadFilter::tiefpass(abtastrate, 8000.0, 0.707),
            eq: [
                // Praesenz fuer Verstaendlichkeit anheben
                BiquadFilter::peaking(abtastrate, 3000.0, 2.0, 1.2),
                // Mulmigkeit um 250 Hz leicht absenken
                BiquadFilter::peaking(abtastrate, 250.0, -1.5, 1.5),
                // Hochmitten fuer Klarheit anheben
                BiquadFilter::peaking(abtastrate, 5000.0, 1.5, 1.0),
            ],
            deesser: DeEsser::neu(DeEsserConfig {
                abtastrate,
                ..DeEsserConfig::default()
            }),
            kompressor: Kompressor::neu(KompressorConfig {
                abtastrate: fs,
                ..KompressorConfig::default()
            }),
            gate: NoiseGate::neu(NoiseGateConfig {
                abtastrate: fs,
                ..NoiseGateConfig::default()
            }),
        }
    }

    /// Wendet die gesamte Kette auf eine Kopie des Eingangs an
    pub fn verarbeiten(&mut self, eingang: &[f32]) -> Vec<f32> {
        if eingang.is_empty() {
            return Vec::new();
        }

        let mut samples = eingang.to_vec();

        self.hochpass.process(&mut samples);
        self.tiefpass.process(&mut samples);
        for filter in self.eq.iter_mut() {
            filter.process(&mut samples);
        }
        self.deesser.process(&mut samples);
        self.kompressor.process(&mut samples);
        self.gate.process(&mut samples);

        samples
    }

    /// Setzt alle Stufen zurueck (beim Session-Ende)
    pub fn reset(&mut self) {
        self.hochpass.reset();
        self.tiefpass.reset();
        for filter in self.eq.iter_mut() {
            filter.reset();
        }
        self.deesser.reset();
        self.kompressor.reset();
        self.gate.reset();
    }
}

impl Default for Vorverarbeitung {
    fn default() -> Self {
        Self::neu()
    }
}
