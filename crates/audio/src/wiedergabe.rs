//! Audio-Wiedergabe via cpal
//!
//! Oeffnet einen cpal OutputStream dessen Callback direkt aus dem
//! [`AudioRing`] liest. Stehen weniger Samples bereit als angefordert,
//! wird der Rest des Ausgabepuffers mit Stille aufgefuellt.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{debug, error};

use sprechfunk_core::{KANAELE, SAMPLE_RATE};

use crate::error::{AudioError, AudioResult};
use crate::ring::AudioRing;

/// Konfiguration fuer die Audio-Wiedergabe
#[derive(Debug, Clone)]
pub struct WiedergabeConfig {
    /// Abtastrate in Hz
    pub abtastrate: u32,
    /// Kanalanzahl
    pub kanaele: u16,
}

impl Default for WiedergabeConfig {
    fn default() -> Self {
        Self {
            abtastrate: SAMPLE_RATE,
            kanaele: KANAELE,
        }
    }
}

/// Audio-Wiedergabe-Stream
pub struct WiedergabeStream {
    _stream: Stream,
    config: WiedergabeConfig,
}

impl WiedergabeStream {
    /// Gibt die Konfiguration des Streams zurueck
    pub fn config(&self) -> &WiedergabeConfig {
        &self.config
    }
}

/// Oeffnet einen Wiedergabe-Stream der aus dem gegebenen Ring liest
pub fn wiedergabe_stream_oeffnen(
    geraet: &Device,
    config: WiedergabeConfig,
    ring: Arc<AudioRing>,
) -> AudioResult<WiedergabeStream> {
    let stream_config = StreamConfig {
        channels: config.kanaele,
        sample_rate: cpal::SampleRate(config.abtastrate),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| error!("Wiedergabe-Fehler: {}", err);

    let unterstuetzt = geraet
        .supported_output_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate().0 <= config.abtastrate
                && c.max_sample_rate().0 >= config.abtastrate
                && c.channels() >= config.kanaele
        });

    let sample_format = unterstuetzt
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let stream = match sample_format {
        SampleFormat::F32 => geraet
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    let gelesen = ring.lesen(data);
                    // Stille fuer fehlende Samples
                    data[gelesen..].fill(0.0);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::I16 => geraet
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _| {
                    let mut float_puffer = vec![0.0f32; data.len()];
                    let gelesen = ring.lesen(&mut float_puffer);
                    float_puffer[gelesen..].fill(0.0);
                    for (ziel, s) in data.iter_mut().zip(float_puffer.iter()) {
                        *ziel = (*s * i16::MAX as f32)
                            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        andere => {
            return Err(AudioError::StreamFehler(format!(
                "Nicht unterstuetztes Sample-Format: {:?}",
                andere
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!(
        "Wiedergabe-Stream geoeffnet: {}Hz {}ch",
        config.abtastrate, config.kanaele
    );

    Ok(WiedergabeStream {
        _stream: stream,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiedergabe_config_default() {
        let config = WiedergabeConfig::default();
        assert_eq!(config.abtastrate, 48000);
        assert_eq!(config.kanaele, 1);
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn wiedergabe_stream_oeffnen_standardgeraet() {
        if let Ok(geraet) = crate::geraete::ausgabegeraet_waehlen(None) {
            let ring = Arc::new(AudioRing::standard());
            let result = wiedergabe_stream_oeffnen(&geraet, WiedergabeConfig::default(), ring);
            assert!(result.is_ok(), "Wiedergabe-Stream sollte oeffenbar sein");
        }
    }
}
