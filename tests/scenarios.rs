//! End-to-end scenarios (spec §8 S1-S4, S6) driving the full gateway stack
//! — [`GatewayCore`] plus the downstream reader — over real loopback UDP
//! sockets, with a mock radio standing in for the SX127x driver.
use async_trait::async_trait;
use lora_pktfwd::codec::{
    self, Bandwidth, CodingRate, DataRate, DatrValue, GatewayId, Identifier, Modulation,
    SerializablePacket, SpreadingFactor, StringOrNum,
};
use lora_pktfwd::gateway::{self, GatewayCore};
use lora_pktfwd::model::{CrcStatus, RxModulation, RxPacket};
use lora_pktfwd::radio::{RadioAdapter, RadioConfig, RadioError};
use lora_pktfwd::stats::{GatewayLocation, Statistics};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Stands in for the SX127x driver: `poll_received` drains a queue the test
/// feeds, `send` records every packet handed to it.
#[derive(Clone, Default)]
struct MockRadio {
    to_receive: Arc<Mutex<Vec<RxPacket>>>,
    sent: Arc<Mutex<Vec<lora_pktfwd::model::TxPacket>>>,
}

#[async_trait]
impl RadioAdapter for MockRadio {
    async fn configure(&mut self, _config: RadioConfig) -> Result<(), RadioError> {
        Ok(())
    }

    async fn start_receive(&mut self, _config: RadioConfig) -> Result<(), RadioError> {
        Ok(())
    }

    async fn poll_received(&mut self) -> Result<Vec<RxPacket>, RadioError> {
        let mut queue = self.to_receive.lock().unwrap();
        Ok(std::mem::take(&mut *queue))
    }

    async fn send(&mut self, packet: &lora_pktfwd::model::TxPacket) -> Result<(), RadioError> {
        self.sent.lock().unwrap().push(packet.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn blank_location() -> GatewayLocation {
    GatewayLocation {
        latitude: None,
        longitude: None,
        altitude_m: None,
        description: None,
        mail: None,
    }
}

fn radio_config() -> RadioConfig {
    RadioConfig {
        freq_hz: 868_100_000,
        modulation: Modulation::LORA,
        bandwidth: Bandwidth::Bw125,
        coding_rate: CodingRate::Cr4_5,
        spreading_factor: SpreadingFactor::SF12,
        preamble_len: 8,
    }
}

/// Binds a gateway with `radio`, servers pointed at `server_addr`, and
/// short tickers unless overridden, then spawns the event loop + downstream
/// reader in the background. Returns the gateway's bound address.
async fn spawn_gateway(
    radio: MockRadio,
    server_addr: SocketAddr,
    keepalive: Duration,
    status: Duration,
) -> SocketAddr {
    let gateway_id = GatewayId::from_hex("AA555A0000000000").unwrap();
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let gateway_addr = socket.local_addr().unwrap();

    let core = GatewayCore::new(
        gateway_id,
        vec![server_addr],
        Arc::clone(&socket),
        Box::new(radio),
        radio_config(),
        Statistics::new(blank_location()),
        keepalive,
        status,
    );

    tokio::spawn(gateway::run(core, socket, gateway_id));
    gateway_addr
}

/// Reads datagrams on `server_socket` until one decodes as an uplink,
/// skipping the startup PULL_DATA handshake when the caller is waiting for
/// something else (e.g. a PUSH_DATA).
async fn recv_uplink(server_socket: &UdpSocket) -> (codec::Up, SocketAddr) {
    let mut buf = [0u8; 2048];
    loop {
        let (len, origin) = timeout(Duration::from_secs(2), server_socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for uplink")
            .unwrap();
        if let Ok(up) = codec::Packet::parse_uplink(&buf[..len]) {
            return (up, origin);
        }
    }
}

#[tokio::test]
async fn s1_upstream_rx_framing() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();

    let rxpacket = RxPacket {
        time: None,
        count_us: 0,
        freq_hz: 868_100_000,
        modulation: RxModulation::Lora {
            bandwidth: Bandwidth::Bw125,
            coding_rate: Some(CodingRate::Cr4_5),
            spreading_factor: SpreadingFactor::SF12,
        },
        rssi_dbm: -80,
        lora_snr_db: Some(7.5),
        stat_crc: CrcStatus::Ok,
        chain_if: 0,
        chain_rf: 0,
        data: b"hello".to_vec(),
    };
    let radio = MockRadio::default();
    radio.to_receive.lock().unwrap().push(rxpacket);

    spawn_gateway(
        radio,
        server_addr,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    )
    .await;

    // First datagram is the startup PULL_DATA handshake (S6 invariant).
    let (first, _) = recv_uplink(&server).await;
    assert!(matches!(first, codec::Up::PullData(_)));

    let (second, _) = recv_uplink(&server).await;
    let codec::Up::PushData(push) = second else {
        panic!("expected PUSH_DATA carrying the RX batch");
    };
    let rxpk = push.data.rxpk.expect("rxpk present");
    assert_eq!(rxpk.len(), 1);
    let pk = &rxpk[0];
    assert_eq!(pk.freq, 868.100);
    assert_eq!(pk.chan, 0);
    assert_eq!(pk.rfch, 0);
    assert_eq!(pk.rssi, -80);
    assert_eq!(pk.size, 5);
    assert_eq!(pk.data, b"hello");
    assert!(matches!(pk.datr, DatrValue::Lora(DataRate { spreading_factor: SpreadingFactor::SF12, bandwidth: Bandwidth::Bw125 })));
    assert_eq!(pk.codr, Some(CodingRate::Cr4_5));
}

#[tokio::test]
async fn s2_downstream_immediate_send() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();
    let radio = MockRadio::default();
    let sent = Arc::clone(&radio.sent);

    let gateway_addr = spawn_gateway(
        radio,
        server_addr,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    )
    .await;

    // Drain the startup PULL_DATA handshake, learning the gateway's origin.
    let (_, _) = recv_uplink(&server).await;

    let token: u16 = 0xBEEF;
    let pull_resp = codec::pull_resp::Packet {
        random_token: token,
        data: codec::pull_resp::Data {
            txpk: codec::pull_resp::TxPk {
                imme: true,
                tmst: None,
                tmms: None,
                freq: 868.5,
                rfch: 0,
                powe: 20,
                modu: Modulation::LORA,
                datr: DatrValue::Lora(DataRate {
                    spreading_factor: SpreadingFactor::SF9,
                    bandwidth: Bandwidth::Bw125,
                }),
                codr: Some(CodingRate::Cr4_5),
                fdev: None,
                ipol: true,
                prea: None,
                data: vec![0, 1, 2],
                size: 3,
                ncrc: None,
            },
        },
    };
    let packet: codec::Packet = pull_resp.into();
    let mut buf = [0u8; 512];
    let len = packet.serialize(&mut buf).unwrap();
    server.send_to(&buf[..len as usize], gateway_addr).await.unwrap();

    // TX_ACK with the same token arrives back, reporting acceptance.
    let mut ack_buf = [0u8; 512];
    let (ack_len, _) = timeout(Duration::from_secs(2), server.recv_from(&mut ack_buf))
        .await
        .expect("timed out waiting for TX_ACK")
        .unwrap();
    assert_eq!(ack_buf[3], Identifier::TxAck as u8);
    let ack_token = (ack_buf[1] as u16) << 8 | ack_buf[2] as u16;
    assert_eq!(ack_token, token);
    assert_eq!(ack_len, 12, "a clean acceptance carries no JSON body");

    // Give the event loop a moment to hand the immediate packet to the radio.
    for _ in 0..50 {
        if !sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.freq_hz, 868_500_000);
    assert_eq!(tx.data, vec![0, 1, 2]);
    match tx.modulation {
        lora_pktfwd::model::TxModulation::Lora { spreading_factor, .. } => {
            assert_eq!(spreading_factor, SpreadingFactor::SF9)
        }
        _ => panic!("expected LoRa modulation"),
    }
}

#[tokio::test]
async fn s3_scheduled_sends_fire_in_count_us_order() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();
    let radio = MockRadio::default();
    let sent = Arc::clone(&radio.sent);

    let gateway_addr = spawn_gateway(
        radio,
        server_addr,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    )
    .await;
    let (_, _) = recv_uplink(&server).await;

    // Offsets are spaced far enough apart (100ms+) that the back-to-back
    // sends below land in the queue well before the earliest one is due,
    // regardless of scheduling jitter — the point under test is dequeue
    // order, not real-time precision.
    let base_us = 300_000u32;
    for (token, count_us) in [(1u16, base_us + 300_000), (2, base_us + 100_000), (3, base_us + 200_000)] {
        let pull_resp = codec::pull_resp::Packet {
            random_token: token,
            data: codec::pull_resp::Data {
                txpk: codec::pull_resp::TxPk {
                    imme: false,
                    tmst: Some(StringOrNum::N(count_us)),
                    tmms: None,
                    freq: 868.1,
                    rfch: 0,
                    powe: 14,
                    modu: Modulation::LORA,
                    datr: DatrValue::Lora(DataRate {
                        spreading_factor: SpreadingFactor::SF7,
                        bandwidth: Bandwidth::Bw125,
                    }),
                    codr: Some(CodingRate::Cr4_5),
                    fdev: None,
                    ipol: true,
                    prea: None,
                    data: vec![token as u8],
                    size: 1,
                    ncrc: None,
                },
            },
        };
        let packet: codec::Packet = pull_resp.into();
        let mut buf = [0u8; 512];
        let len = packet.serialize(&mut buf).unwrap();
        server.send_to(&buf[..len as usize], gateway_addr).await.unwrap();
    }

    // Drain the three TX_ACKs (order doesn't matter here, acceptance does).
    for _ in 0..3 {
        let mut ack_buf = [0u8; 512];
        timeout(Duration::from_secs(2), server.recv_from(&mut ack_buf))
            .await
            .expect("timed out waiting for TX_ACK")
            .unwrap();
    }

    // count_us is relative to gateway startup; waiting past the highest one
    // guarantees all three have had a chance to fire.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].data, vec![2]);
    assert_eq!(sent[1].data, vec![3]);
    assert_eq!(sent[2].data, vec![1]);
}

#[tokio::test]
async fn s4_keepalive_cadence() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();
    spawn_gateway(
        MockRadio::default(),
        server_addr,
        Duration::from_secs(1),
        Duration::from_secs(3600),
    )
    .await;

    let mut pull_data_count = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(3500);
    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        let mut buf = [0u8; 2048];
        match timeout(remaining, server.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => {
                if let Ok(codec::Up::PullData(_)) = codec::Packet::parse_uplink(&buf[..len]) {
                    pull_data_count += 1;
                }
            }
            _ => break,
        }
    }
    assert!(pull_data_count >= 3, "expected >= 3 PULL_DATA frames, saw {pull_data_count}");
}

#[tokio::test]
async fn s6_malformed_downstream_is_dropped_silently() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();
    let gateway_addr = spawn_gateway(
        MockRadio::default(),
        server_addr,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    )
    .await;
    let (_, _) = recv_uplink(&server).await;

    // Version byte 0x01 instead of the required 0x02.
    let bogus = [0x01u8, 0xAA, 0xBB, 0x03];
    server.send_to(&bogus, gateway_addr).await.unwrap();

    let mut buf = [0u8; 64];
    let result = timeout(Duration::from_millis(300), server.recv_from(&mut buf)).await;
    assert!(result.is_err(), "gateway must not reply to a malformed frame");
}
