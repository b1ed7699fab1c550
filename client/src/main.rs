//! Sprechfunk Client – Einstiegspunkt
//!
//! Startet Audio-Thread und Mixer-Task, verbindet zum Relay und treibt
//! die Chat-Schleife auf stdin. Nach einem Verbindungsabriss wartet die
//! Hauptschleife auf einen Tastendruck und verbindet neu – beliebig oft.

mod aufnahme_pfad;
mod chat;
mod config;
mod session;

use anyhow::Result;
use clap::Parser;
use sprechfunk_audio::{geraete, AudioRing};
use sprechfunk_core::{FRAME_DAUER_MS, FRAME_LAENGE};
use sprechfunk_voice::{frame_mischen, PeerRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

use config::Args;
use session::{SendeZiel, Session};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging_initialisieren();

    if args.geraete {
        return geraete_auflisten();
    }

    let benutzername = args.benutzername();
    let peers = PeerRegistry::neu();
    let ring = Arc::new(AudioRing::standard());
    let sende_ziel = Arc::new(SendeZiel::neu());

    // Audio-Thread: haelt die cpal-Streams und fuehrt die Capture-Schleife aus
    let (bereit_tx, bereit_rx) = oneshot::channel();
    let _audio_thread = aufnahme_pfad::audio_thread_starten(
        args.eingabe,
        args.ausgabe,
        Arc::clone(&ring),
        Arc::clone(&sende_ziel),
        bereit_tx,
    )?;
    bereit_rx
        .await
        .map_err(|_| anyhow::anyhow!("Audio-Thread hat sich nicht gemeldet"))??;

    // Mixer-Task: mischt alle 25 ms einen Frame aus den Peers in den Ring
    let mixer_peers = peers.clone();
    let mixer_ring = Arc::clone(&ring);
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(Duration::from_millis(FRAME_DAUER_MS));
        loop {
            takt.tick().await;
            if let Some(frame) = frame_mischen(&mixer_peers, FRAME_LAENGE) {
                mixer_ring.schreiben(&frame);
            }
        }
    });

    hauptschleife(&args.relay, &benutzername, peers, sende_ziel).await
}

/// Verbindet, treibt die Chat-Schleife und verbindet nach Abriss neu
async fn hauptschleife(
    relay: &str,
    benutzername: &str,
    peers: PeerRegistry,
    sende_ziel: Arc<SendeZiel>,
) -> Result<()> {
    let mut zeilen = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut session = match Session::verbinden(
            relay,
            benutzername,
            peers.clone(),
            Arc::clone(&sende_ziel),
        )
        .await
        {
            Ok(session) => {
                chat::hinweis_anzeigen(&format!(
                    "\x1b[32mVerbunden mit {} als {} ({})\x1b[m",
                    relay, session.name, session.id
                ));
                session
            }
            Err(e) => {
                chat::hinweis_anzeigen(&format!(
                    "\x1b[31mVerbindung zu {} fehlgeschlagen: {}\x1b[m",
                    relay, e
                ));
                auf_tastendruck_warten(&mut zeilen).await;
                continue;
            }
        };

        // Chat-Schleife bis zum Session-Ende
        loop {
            tokio::select! {
                zeile = zeilen.next_line() => {
                    match zeile {
                        Ok(Some(zeile)) => eingabe_behandeln(&zeile, &peers, &sende_ziel),
                        Ok(None) => {
                            // stdin geschlossen: Client beenden
                            return Ok(());
                        }
                        Err(e) => {
                            tracing::warn!(fehler = %e, "stdin-Fehler");
                            return Ok(());
                        }
                    }
                }
                _ = session.ende_rx.recv() => {
                    break;
                }
            }
        }

        auf_tastendruck_warten(&mut zeilen).await;
    }
}

/// Behandelt eine Eingabezeile: Befehl oder Chat-Nachricht
fn eingabe_behandeln(zeile: &str, peers: &PeerRegistry, sende_ziel: &SendeZiel) {
    match chat::eingabe_parsen(zeile) {
        chat::Eingabe::Status => chat::teilnehmer_anzeigen(&peers.liste()),
        chat::Eingabe::Hilfe => chat::hilfe_anzeigen(),
        chat::Eingabe::Unbekannt(befehl) => {
            chat::hinweis_anzeigen(&format!("Unbekannter Befehl: {} (/h fuer Hilfe)", befehl));
        }
        chat::Eingabe::Text(text) => {
            if !sende_ziel.text_senden(&text) {
                chat::hinweis_anzeigen("Nachricht nicht gesendet (keine Verbindung)");
            } else {
                chat::prompt();
            }
        }
        chat::Eingabe::Leer => chat::prompt(),
    }
}

/// Wartet nach einem Verbindungsabriss auf Enter
async fn auf_tastendruck_warten(
    zeilen: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) {
    chat::hinweis_anzeigen("Verbindung getrennt – Enter fuer neuen Versuch");
    let _ = zeilen.next_line().await;
}

/// Listet die verfuegbaren Audio-Geraete auf (--geraete)
fn geraete_auflisten() -> Result<()> {
    println!("\x1b[34m= Eingabegeraete =\x1b[m");
    for (i, name) in geraete::eingabegeraete()?.iter().enumerate() {
        println!("{} {}", i, name);
    }
    println!();
    println!("\x1b[34m= Ausgabegeraete =\x1b[m");
    for (i, name) in geraete::ausgabegeraete()?.iter().enumerate() {
        println!("{} {}", i, name);
    }
    Ok(())
}

/// Initialisiert tracing-subscriber
///
/// Logs gehen auf stderr damit sie den Chat auf stdout nicht stoeren.
/// `SF_LOG_LEVEL` und `SF_LOG_FORMAT` steuern Level und Format.
fn logging_initialisieren() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("SF_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let format = std::env::var("SF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .init();
        }
    }
}
