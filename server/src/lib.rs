//! Sprechfunk Relay
//!
//! Nimmt TCP-Verbindungen an, vergibt 8-Bit-IDs und verteilt Audio-,
//! Text- und Presence-Nachrichten sternfoermig an alle anderen
//! Teilnehmer. Das Relay mischt nicht und persistiert nichts; sein
//! einziger Zustand ist die Menge der verbundenen Clients.

pub mod config;
pub mod registry;
pub mod verbindung;

use std::time::Duration;
use tokio::net::TcpListener;

use config::RelayConfig;
use registry::ClientRegistry;

/// Das Relay: Listener plus Client-Registry
pub struct Relay {
    config: RelayConfig,
    registry: ClientRegistry,
}

impl Relay {
    /// Erstellt ein neues Relay aus der Konfiguration
    pub fn neu(config: RelayConfig) -> Self {
        let registry = ClientRegistry::neu(config.relay.queue_groesse);
        Self { config, registry }
    }

    /// Bindet den konfigurierten Socket und nimmt Verbindungen an
    pub async fn starten(self) -> anyhow::Result<()> {
        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse).await?;
        tracing::info!(adresse = %adresse, "Relay gestartet");
        self.accept_loop(listener).await;
        Ok(())
    }

    /// Nimmt Verbindungen auf einem bereits gebundenen Listener an
    ///
    /// Fuer Tests: der Aufrufer bindet selbst (z.B. auf Port 0).
    pub async fn starten_mit_listener(self, listener: TcpListener) {
        self.accept_loop(listener).await;
    }

    /// Accept-Loop: ueberlebt jeden Verbindungsfehler
    async fn accept_loop(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    // Client-Limit pruefen
                    if self.registry.anzahl() as u32 >= self.config.relay.max_clients {
                        tracing::warn!(
                            peer = %peer_addr,
                            max = self.config.relay.max_clients,
                            "Relay voll – Verbindung abgelehnt"
                        );
                        drop(stream);
                        continue;
                    }

                    tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        verbindung::verarbeiten(registry, stream, peer_addr).await;
                    });
                }
                Err(e) => {
                    tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
