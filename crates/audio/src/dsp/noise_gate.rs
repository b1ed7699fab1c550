//! Noise Gate mit Hysterese und Haltezeit
//!
//! Unterdrueckt das Signal unterhalb eines Schwellenwerts. Die Hysterese
//! (Oeffnen bei `threshold`, Schliessen erst unter `threshold - hysterese`)
//! und die Haltezeit verhindern Flattern an der Schwelle; das Gain wird
//! mit denselben Attack/Release-Koeffizienten geglaettet um Klicks zu
//! vermeiden.

use super::{db_zu_linear, zeit_zu_koeffizient, AudioProcessor};

/// Konfiguration fuer das Noise Gate
#[derive(Debug, Clone)]
pub struct NoiseGateConfig {
    /// Oeffnungs-Schwellenwert in dB
    pub threshold_db: f32,
    /// Hysterese in dB (Schliessen unter `threshold_db - hysterese_db`)
    pub hysterese_db: f32,
    /// Attack-Zeit in Millisekunden
    pub attack_ms: f32,
    /// Release-Zeit in Millisekunden
    pub release_ms: f32,
    /// Haltezeit in Millisekunden bevor das Gate schliesst
    pub halte_ms: f32,
    /// Abtastrate in Hz
    pub abtastrate: f32,
}

impl Default for NoiseGateConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            hysterese_db: 10.0,
            attack_ms: 1.0,
            release_ms: 50.0,
            halte_ms: 10.0,
            abtastrate: 48000.0,
        }
    }
}

/// Noise Gate mit geglaettetem Gain
pub struct NoiseGate {
    config: NoiseGateConfig,
    attack_koeff: f32,
    release_koeff: f32,
    halte_samples: u32,

    envelope: f32,
    offen: bool,
    halte_zaehler: u32,
    gain: f32,
}

impl NoiseGate {
    /// Erstellt ein neues Noise Gate
    pub fn neu(config: NoiseGateConfig) -> Self {
        let attack_koeff = zeit_zu_koeffizient(config.attack_ms / 1000.0, config.abtastrate);
        let release_koeff = zeit_zu_koeffizient(config.release_ms / 1000.0, config.abtastrate);
        let halte_samples = (config.halte_ms / 1000.0 * config.abtastrate) as u32;

        Self {
            config,
            attack_koeff,
            release_koeff,
            halte_samples,
            envelope: 0.0,
            offen: false,
            halte_zaehler: 0,
            gain: 0.0,
        }
    }

    /// Gibt zurueck ob das Gate aktuell offen ist
    pub fn ist_offen(&self) -> bool {
        self.offen
    }

    /// Gibt das aktuelle geglaettete Gain zurueck
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioProcessor for NoiseGate {
    fn process(&mut self, samples: &mut [f32]) {
        let oeffnen = db_zu_linear(self.config.threshold_db);
        let schliessen = db_zu_linear(self.config.threshold_db - self.config.hysterese_db);

        for sample in samples.iter_mut() {
            let pegel = sample.abs();

            // Envelope-Follower
            if pegel > self.envelope {
                self.envelope += self.attack_koeff * (pegel - self.envelope);
            } else {
                self.envelope += self.release_koeff * (pegel - self.envelope);
            }

            // Gate-Logik mit Hysterese und Haltezeit
            if self.offen {
                if self.envelope < schliessen {
                    if self.halte_zaehler > 0 {
                        self.halte_zaehler -= 1;
                    } else {
                        self.offen = false;
                    }
                } else {
                    self.halte_zaehler = self.halte_samples;
                }
            } else if self.envelope > oeffnen {
                self.offen = true;
                self.halte_zaehler = self.halte_samples;
            }

            // Gain glaetten um Klicks zu vermeiden
            let ziel = if self.offen { 1.0f32 } else { 0.0f32 };
            if ziel > self.gain {
                self.gain += self.attack_koeff * (ziel - self.gain);
            } else {
                self.gain += self.release_koeff * (ziel - self.gain);
            }

            *sample *= self.gain;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.offen = false;
        self.halte_zaehler = 0;
        self.gain = 0.0;
    }
}
