//! Dynamik-Kompressor
//!
//! Glaettet die Dynamik des Sprachsignals: Pegel oberhalb des
//! Schwellenwerts werden im Verhaeltnis `ratio` reduziert, ein statisches
//! Makeup-Gain kompensiert den Pegelverlust. Der Ausgang wird hart auf
//! +-1.0 begrenzt.

use super::{db_zu_linear, linear_zu_db, zeit_zu_koeffizient, AudioProcessor};

/// Konfiguration fuer den Kompressor
#[derive(Debug, Clone)]
pub struct KompressorConfig {
    /// Schwellenwert in dB (z.B. -20.0)
    pub threshold_db: f32,
    /// Kompressionsverhaeltnis (z.B. 3.0 fuer 3:1)
    pub ratio: f32,
    /// Attack-Zeit in Millisekunden
    pub attack_ms: f32,
    /// Release-Zeit in Millisekunden
    pub release_ms: f32,
    /// Abtastrate in Hz
    pub abtastrate: f32,
}

impl Default for KompressorConfig {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 3.0,
            attack_ms: 10.0,
            release_ms: 50.0,
            abtastrate: 48000.0,
        }
    }
}

/// Dynamik-Kompressor mit Envelope-Follower
pub struct Kompressor {
    config: KompressorConfig,
    attack_koeff: f32,
    release_koeff: f32,
    /// Statisches Makeup-Gain: `10^(-thr*(1-1/ratio)/40)`
    makeup_gain: f32,
    /// Gleitender Eingangspegel
    envelope: f32,
}

impl Kompressor {
    /// Erstellt einen neuen Kompressor
    pub fn neu(config: KompressorConfig) -> Self {
        let attack_koeff = zeit_zu_koeffizient(config.attack_ms / 1000.0, config.abtastrate);
        let release_koeff = zeit_zu_koeffizient(config.release_ms / 1000.0, config.abtastrate);
        let makeup_gain = Self::makeup_berechnen(config.threshold_db, config.ratio);

        Self {
            config,
            attack_koeff,
            release_koeff,
            makeup_gain,
            envelope: 0.0,
        }
    }

    /// Gibt das aktuelle Makeup-Gain zurueck
    pub fn makeup_gain(&self) -> f32 {
        self.makeup_gain
    }

    fn makeup_berechnen(threshold_db: f32, ratio: f32) -> f32 {
        10.0f32.powf(-threshold_db * (1.0 - 1.0 / ratio) / 40.0)
    }
}

impl AudioProcessor for Kompressor {
    fn process(&mut self, samples: &mut [f32]) {
        let threshold = db_zu_linear(self.config.threshold_db);

        for sample in samples.iter_mut() {
            let pegel = sample.abs();

            // Envelope-Follower mit Attack/Release
            if pegel > self.envelope {
                self.envelope += self.attack_koeff * (pegel - self.envelope);
            } else {
                self.envelope += self.release_koeff * (pegel - self.envelope);
            }

            // Gain-Reduktion oberhalb des Schwellenwerts (dB-Domaene)
            let mut gain = 1.0f32;
            if self.envelope > threshold {
                let envelope_db = linear_zu_db(self.envelope);
                let reduktion_db = (self.config.threshold_db - envelope_db)
                    + (envelope_db - self.config.threshold_db) / self.config.ratio;
                gain = db_zu_linear(reduktion_db);
            }

            // Gain + Makeup anwenden, hart begrenzen
            *sample = (*sample * gain * self.makeup_gain).clamp(-1.0, 1.0);
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
