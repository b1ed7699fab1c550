//! De-Esser
//!
//! Reduziert scharfe Zischlaute (S, T, Sch) im Bereich um 6.5 kHz.
//! Ein Bandpass-Sidechain detektiert die Zischlaut-Energie; bei
//! Ueberschreitung des Schwellenwerts wird das Vollband-Signal im
//! Verhaeltnis `ratio` abgesenkt, begrenzt durch einen Gain-Boden von
//! 0.3 (ca. -10.4 dB) gegen Ueberbearbeitung.

use super::biquad::BiquadFilter;
use super::{db_zu_linear, linear_zu_db, zeit_zu_koeffizient, AudioProcessor};

/// Untergrenze fuer die Gain-Reduktion
const GAIN_BODEN: f32 = 0.3;

/// Konfiguration fuer den De-Esser
#[derive(Debug, Clone)]
pub struct DeEsserConfig {
    /// Mittenfrequenz des Sidechain-Bandpasses in Hz
    pub frequenz: f64,
    /// Guete des Sidechain-Bandpasses
    pub q: f64,
    /// Schwellenwert in dB
    pub threshold_db: f32,
    /// Kompressionsverhaeltnis
    pub ratio: f32,
    /// Attack-Zeit in Millisekunden
    pub attack_ms: f32,
    /// Release-Zeit in Millisekunden
    pub release_ms: f32,
    /// Abtastrate in Hz
    pub abtastrate: u32,
}

impl Default for DeEsserConfig {
    fn default() -> Self {
        Self {
            frequenz: 6500.0,
            q: 2.0,
            threshold_db: -12.0,
            ratio: 2.0,
            attack_ms: 1.0,
            release_ms: 50.0,
            abtastrate: 48000,
        }
    }
}

/// De-Esser mit Bandpass-Sidechain
pub struct DeEsser {
    config: DeEsserConfig,
    sidechain: BiquadFilter,
    attack_koeff: f32,
    release_koeff: f32,
    envelope: f32,
}

impl DeEsser {
    /// Erstellt einen neuen De-Esser
    pub fn neu(config: DeEsserConfig) -> Self {
        let sidechain = BiquadFilter::bandpass(config.abtastrate, config.frequenz, config.q);
        let fs = config.abtastrate as f32;
        let attack_koeff = zeit_zu_koeffizient(config.attack_ms / 1000.0, fs);
        let release_koeff = zeit_zu_koeffizient(config.release_ms / 1000.0, fs);

        Self {
            config,
            sidechain,
            attack_koeff,
            release_koeff,
            envelope: 0.0,
        }
    }
}

impl AudioProcessor for DeEsser {
    fn process(&mut self, samples: &mut [f32]) {
        let threshold = db_zu_linear(self.config.threshold_db);

        for sample in samples.iter_mut() {
            // Sidechain: Zischlaut-Energie im Band messen
            let sidechain_pegel = self.sidechain.sample_verarbeiten(*sample).abs();

            // Envelope-Follower auf dem Sidechain
            if sidechain_pegel > self.envelope {
                self.envelope += self.attack_koeff * (sidechain_pegel - self.envelope);
            } else {
                self.envelope += self.release_koeff * (sidechain_pegel - self.envelope);
            }

            // Gain-Reduktion bei erkanntem Zischlaut
            let mut gain = 1.0f32;
            if self.envelope > threshold {
                let envelope_db = linear_zu_db(self.envelope);
                let reduktion_db = (self.config.threshold_db - envelope_db)
                    + (envelope_db - self.config.threshold_db) / self.config.ratio;
                gain = db_zu_linear(reduktion_db).max(GAIN_BODEN);
            }

            *sample *= gain;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.sidechain.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sinus(frequenz: f32, laenge: usize, amplitude: f32) -> Vec<f32> {
        (0..laenge)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * frequenz / 48000.0).sin() * amplitude)
            .collect()
    }

    fn energie(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn zischlaut_wird_gedaempft() {
        let mut de = DeEsser::neu(DeEsserConfig::default());
        // Lautes Signal direkt auf der Sidechain-Frequenz
        let eingang = sinus(6500.0, 9600, 0.8);
        let mut ausgang = eingang.clone();
        de.process(&mut ausgang);
        assert!(
            energie(&ausgang) < energie(&eingang) * 0.95,
            "6.5 kHz bei hohem Pegel muss abgesenkt werden"
        );
    }

    #[test]
    fn tiefes_signal_kaum_beruehrt() {
        let mut de = DeEsser::neu(DeEsserConfig::default());
        let eingang = sinus(200.0, 9600, 0.8);
        let mut ausgang = eingang.clone();
        de.process(&mut ausgang);
        let verhaeltnis = energie(&ausgang) / energie(&eingang);
        assert!(
            verhaeltnis > 0.9,
            "200 Hz liegt ausserhalb des Sidechains: {}",
            verhaeltnis
        );
    }

    #[test]
    fn gain_boden_begrenzt_reduktion() {
        let mut de = DeEsser::neu(DeEsserConfig {
            threshold_db: -60.0, // extrem niedriger Threshold
            ratio: 100.0,
            ..DeEsserConfig::default()
        });
        let eingang = sinus(6500.0, 9600, 0.9);
        let mut ausgang = eingang.clone();
        de.process(&mut ausgang);
        // Selbst bei extremer Kompression bleibt mindestens GAIN_BODEN uebrig
        let verhaeltnis = energie(&ausgang) / energie(&eingang);
        assert!(
            verhaeltnis > (GAIN_BODEN * GAIN_BODEN * 0.5),
            "Gain-Boden unterschritten: {}",
            verhaeltnis
        );
    }

    #[test]
    fn stille_bleibt_stille() {
        let mut de = DeEsser::neu(DeEsserConfig::default());
        let mut samples = vec![0.0f32; 1200];
        de.process(&mut samples);
        de.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn reset_loescht_zustand() {
        let mut de = DeEsser::neu(DeEsserConfig::default());
        let mut samples = sinus(6500.0, 480, 0.8);
        de.process(&mut samples);
        assert!(de.envelope > 0.0);
        de.reset();
        assert_eq!(de.envelope, 0.0);
    }
}
