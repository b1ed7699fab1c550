//! Mikrofon-Capture via cpal
//!
//! Oeffnet einen cpal InputStream und schreibt Samples in einen
//! lock-free Ring-Buffer (ringbuf). Der Geraete-Callback blockiert
//! damit niemals auf I/O; die eigentliche Vorverarbeitung laeuft im
//! Capture-Thread des Clients, der den Consumer leert.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{debug, error, warn};

use sprechfunk_core::{KANAELE, SAMPLE_RATE};

use crate::error::{AudioError, AudioResult};

/// Konfiguration fuer den Audio-Capture
#[derive(Debug, Clone)]
pub struct AufnahmeConfig {
    /// Abtastrate in Hz
    pub abtastrate: u32,
    /// Kanalanzahl
    pub kanaele: u16,
    /// Ring-Buffer-Kapazitaet in Samples
    pub puffer_groesse: usize,
}

impl Default for AufnahmeConfig {
    fn default() -> Self {
        Self {
            abtastrate: SAMPLE_RATE,
            kanaele: KANAELE,
            puffer_groesse: SAMPLE_RATE as usize * 2, // 2 Sekunden Puffer
        }
    }
}

/// Konsumiert Samples fuer die Vorverarbeitung
pub type AufnahmeConsumer = HeapCons<f32>;

/// Audio-Capture-Stream
///
/// Haelt den cpal-Stream am Leben. Wird der Stream gedroppt, stoppt
/// die Aufnahme automatisch.
pub struct AufnahmeStream {
    _stream: Stream,
    config: AufnahmeConfig,
}

impl AufnahmeStream {
    /// Gibt die Konfiguration des Streams zurueck
    pub fn config(&self) -> &AufnahmeConfig {
        &self.config
    }
}

/// Oeffnet einen Capture-Stream auf dem gegebenen Geraet
///
/// Gibt den Stream und den Ring-Buffer-Consumer zurueck. Der Producer
/// laeuft im cpal-Callback-Thread.
pub fn aufnahme_stream_oeffnen(
    geraet: &Device,
    config: AufnahmeConfig,
) -> AudioResult<(AufnahmeStream, AufnahmeConsumer)> {
    let stream_config = StreamConfig {
        channels: config.kanaele,
        sample_rate: cpal::SampleRate(config.abtastrate),
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<f32>::new(config.puffer_groesse);
    let (mut producer, consumer) = rb.split();

    let err_fn = |err| error!("Capture-Fehler: {}", err);

    // Unterstuetztes Sample-Format ermitteln
    let unterstuetzt = geraet
        .supported_input_configs()
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
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let geschrieben = producer.push_slice(data);
                    if geschrieben < data.len() {
                        warn!(
                            "Capture-Ring voll, {} Samples verworfen",
                            data.len() - geschrieben
                        );
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::I16 => geraet
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    let geschrieben = producer.push_slice(&floats);
                    if geschrieben < floats.len() {
                        warn!("Capture-Ring voll");
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
        "Capture-Stream geoeffnet: {}Hz {}ch",
        config.abtastrate, config.kanaele
    );

    Ok((
        AufnahmeStream {
            _stream: stream,
            config,
        },
        consumer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aufnahme_config_default() {
        let config = AufnahmeConfig::default();
        assert_eq!(config.abtastrate, 48000);
        assert_eq!(config.kanaele, 1);
        assert!(config.puffer_groesse > 0);
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn aufnahme_stream_oeffnen_standardgeraet() {
        if let Ok(geraet) = crate::geraete::eingabegeraet_waehlen(None) {
            let result = aufnahme_stream_oeffnen(&geraet, AufnahmeConfig::default());
            assert!(result.is_ok(), "Capture-Stream sollte oeffenbar sein");
        }
    }
}
