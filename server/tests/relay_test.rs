//! Integrationstests fuer das Relay
//!
//! Starten das Relay auf einem freien Port und sprechen das echte
//! Wire-Format ueber TCP: Handshake, Fan-Out, Presence und
//! Protokollfehler-Behandlung.

use sprechfunk_core::{ClientId, FRAME_LAENGE};
use sprechfunk_protocol::{nachricht_lesen, nachricht_schreiben, Message, MsgType};
use sprechfunk_server::{config::RelayConfig, Relay};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

async fn relay_starten() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let adresse = listener.local_addr().unwrap();
    let relay = Relay::neu(RelayConfig::default());
    tokio::spawn(relay.starten_mit_listener(listener));
    adresse
}

async fn verbinden(adresse: SocketAddr, name: &str) -> (TcpStream, Message) {
    let mut stream = TcpStream::connect(adresse).await.unwrap();
    nachricht_schreiben(&mut stream, &Message::neu_init(name))
        .await
        .unwrap();
    let antwort = nachricht_lesen(&mut stream).await.unwrap();
    (stream, antwort)
}

#[tokio::test]
async fn handshake_vergibt_erste_id() {
    let adresse = relay_starten().await;
    let (_stream, antwort) = verbinden(adresse, "alice").await;

    assert_eq!(antwort.typ, MsgType::InitClient);
    assert_eq!(antwort.id, ClientId(1));
    assert_eq!(antwort.name, "alice");
    assert!(antwort.payload.is_empty());
}

#[tokio::test]
async fn ids_steigen_pro_handshake() {
    let adresse = relay_starten().await;
    let (_s1, a1) = verbinden(adresse, "a").await;
    let (_s2, a2) = verbinden(adresse, "b").await;
    let (_s3, a3) = verbinden(adresse, "c").await;

    assert_eq!(a1.id, ClientId(1));
    assert_eq!(a2.id, ClientId(2));
    assert_eq!(a3.id, ClientId(3));
}

#[tokio::test]
async fn leerer_name_wird_durch_client_id_ersetzt() {
    let adresse = relay_starten().await;
    let (_stream, antwort) = verbinden(adresse, "").await;

    assert_eq!(antwort.name, format!("Client{}", antwort.id.inner()));
}

#[tokio::test]
async fn audio_fan_out_ohne_echo() {
    let adresse = relay_starten().await;
    let (mut a, antwort_a) = verbinden(adresse, "alice").await;
    let (mut b, _antwort_b) = verbinden(adresse, "bob").await;

    // A sieht den Beitritt von B; damit ist B sicher registriert
    let join = nachricht_lesen(&mut a).await.unwrap();
    assert_eq!(join.typ, MsgType::ClientJoin);
    assert!(join.payload_text().contains("CONNECTED"));

    // A sendet einen vollen Audio-Frame
    let samples: Vec<f32> = (0..FRAME_LAENGE).map(|i| (i as f32) / 1200.0).collect();
    let audio = Message::neu_audio(antwort_a.id, &samples, &antwort_a.name);
    nachricht_schreiben(&mut a, &audio).await.unwrap();

    // B empfaengt den Frame mit Absender-ID und -Name
    let empfangen = nachricht_lesen(&mut b).await.unwrap();
    assert_eq!(empfangen.typ, MsgType::Audio);
    assert_eq!(empfangen.id, ClientId(1));
    assert_eq!(empfangen.name, "alice");
    assert_eq!(empfangen.payload.len(), 4 * FRAME_LAENGE);
    assert_eq!(empfangen.audio_samples(), samples);

    // A bekommt sein eigenes Paket nicht zurueck
    let echo = timeout(Duration::from_millis(200), nachricht_lesen(&mut a)).await;
    assert!(echo.is_err(), "Absender darf kein Echo empfangen");
}

#[tokio::test]
async fn text_fan_out_verbatim() {
    let adresse = relay_starten().await;
    let (mut a, antwort_a) = verbinden(adresse, "alice").await;
    let (mut b, _) = verbinden(adresse, "bob").await;

    let _join = nachricht_lesen(&mut a).await.unwrap();

    let text = Message::neu_text(antwort_a.id, "hi", "alice");
    nachricht_schreiben(&mut a, &text).await.unwrap();

    let empfangen = nachricht_lesen(&mut b).await.unwrap();
    assert_eq!(empfangen.typ, MsgType::Text);
    assert_eq!(empfangen.id, ClientId(1));
    assert_eq!(empfangen.payload_text(), "hi");
    assert_eq!(empfangen.name, "alice");

    let echo = timeout(Duration::from_millis(200), nachricht_lesen(&mut a)).await;
    assert!(echo.is_err(), "Absender darf kein Echo empfangen");
}

#[tokio::test]
async fn falsche_erste_nachricht_schliesst_verbindung() {
    let adresse = relay_starten().await;
    let mut stream = TcpStream::connect(adresse).await.unwrap();

    // Text statt InitClient als erste Nachricht
    let falsch = Message::neu_text(ClientId(0), "hallo", "eindringling");
    nachricht_schreiben(&mut stream, &falsch).await.unwrap();

    let antwort = nachricht_lesen(&mut stream).await;
    assert!(antwort.is_err(), "Relay muss die Verbindung schliessen");
}

#[tokio::test]
async fn init_mit_vergebener_id_abgelehnt() {
    let adresse = relay_starten().await;
    let mut stream = TcpStream::connect(adresse).await.unwrap();

    // InitClient muss mit ID 0 kommen
    let falsch = Message::neu(MsgType::InitClient, ClientId(7), Vec::new(), "x");
    nachricht_schreiben(&mut stream, &falsch).await.unwrap();

    let antwort = nachricht_lesen(&mut stream).await;
    assert!(antwort.is_err());
}

#[tokio::test]
async fn zweites_init_client_trennt() {
    let adresse = relay_starten().await;
    let (mut a, _) = verbinden(adresse, "alice").await;

    nachricht_schreiben(&mut a, &Message::neu_init("nochmal"))
        .await
        .unwrap();

    let antwort = nachricht_lesen(&mut a).await;
    assert!(
        antwort.is_err(),
        "InitClient nach Handshake ist ein Protokollfehler"
    );
}

#[tokio::test]
async fn leave_wird_an_verbliebene_gemeldet() {
    let adresse = relay_starten().await;
    let (mut a, _) = verbinden(adresse, "alice").await;
    let (b, antwort_b) = verbinden(adresse, "bob").await;

    let join = nachricht_lesen(&mut a).await.unwrap();
    assert_eq!(join.typ, MsgType::ClientJoin);

    // B trennt die Verbindung
    drop(b);

    let leave = nachricht_lesen(&mut a).await.unwrap();
    assert_eq!(leave.typ, MsgType::ClientLeave);
    assert_eq!(leave.id, antwort_b.id);
    assert!(leave.payload_text().contains("DISCONNECTED"));
    assert!(leave.payload_text().contains("bob"));
}

#[tokio::test]
async fn dritter_teilnehmer_bekommt_beide_nachrichten() {
    let adresse = relay_starten().await;
    let (mut a, antwort_a) = verbinden(adresse, "alice").await;
    let (mut b, antwort_b) = verbinden(adresse, "bob").await;
    let (mut c, _) = verbinden(adresse, "carol").await;

    // Joins konsumieren damit alle registriert sind
    let _ = nachricht_lesen(&mut a).await.unwrap(); // bob join
    let _ = nachricht_lesen(&mut a).await.unwrap(); // carol join
    let _ = nachricht_lesen(&mut b).await.unwrap(); // carol join

    nachricht_schreiben(&mut a, &Message::neu_text(antwort_a.id, "von a", "alice"))
        .await
        .unwrap();
    nachricht_schreiben(&mut b, &Message::neu_text(antwort_b.id, "von b", "bob"))
        .await
        .unwrap();

    let mut texte = Vec::new();
    for _ in 0..2 {
        let msg = nachricht_lesen(&mut c).await.unwrap();
        assert_eq!(msg.typ, MsgType::Text);
        texte.push(msg.payload_text());
    }
    texte.sort();
    assert_eq!(texte, vec!["von a".to_string(), "von b".to_string()]);
}
