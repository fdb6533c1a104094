//! Gateway statistics: rolling counters mutated only by the event loop,
//! plus the static metadata fields carried unchanged since startup.
use crate::codec::Stat;
use chrono::Utc;

#[derive(Debug, Clone)]
pub struct GatewayLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<i64>,
    pub description: Option<String>,
    pub mail: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Statistics {
    rxnb: u64,
    rxok: u64,
    rxfw: u64,
    dwnb: u64,
    txnb: u64,
    upstream_sent: u64,
    upstream_acked: u64,
    location: Option<GatewayLocation>,
}

impl Statistics {
    pub fn new(location: GatewayLocation) -> Self {
        Statistics {
            location: Some(location),
            ..Default::default()
        }
    }

    pub fn record_rx_batch(&mut self, received: u64, crc_ok: u64) {
        self.rxnb += received;
        self.rxok += crc_ok;
    }

    pub fn record_forwarded(&mut self, count: u64) {
        self.rxfw += count;
    }

    pub fn record_downstream_datagram(&mut self) {
        self.dwnb += 1;
    }

    pub fn record_tx(&mut self) {
        self.txnb += 1;
    }

    /// Call once per upstream datagram emitted (PUSH_DATA or PULL_DATA);
    /// feeds `ackr`.
    pub fn record_upstream_sent(&mut self) {
        self.upstream_sent += 1;
    }

    /// Call whenever a PUSH_ACK or PULL_ACK is observed on the downstream
    /// reader.
    pub fn record_upstream_acked(&mut self) {
        self.upstream_acked += 1;
    }

    /// Snapshots the current counters into a wire `Stat` object and resets
    /// the rolling counters (`rxnb`, `rxfw`, `dwnb`) and the ack tally, per
    /// the keepalive-reset semantics in §4.7. `rxok`/`txnb` also reset, as
    /// they are meaningful only for the interval just reported.
    pub fn snapshot_and_reset(&mut self) -> Stat {
        let ackr = if self.upstream_sent == 0 {
            None
        } else {
            Some((self.upstream_acked as f64 / self.upstream_sent as f64 * 1000.0).round() / 10.0)
        };
        let stat = Stat {
            time: Utc::now().format("%Y-%m-%d %H:%M:%S GMT").to_string(),
            lati: self.location.as_ref().and_then(|l| l.latitude),
            long: self.location.as_ref().and_then(|l| l.longitude),
            alti: self.location.as_ref().and_then(|l| l.altitude_m),
            rxnb: self.rxnb,
            rxok: self.rxok,
            rxfw: self.rxfw,
            ackr,
            dwnb: self.dwnb,
            txnb: self.txnb,
            desc: self.location.as_ref().and_then(|l| l.description.clone()),
            mail: self.location.as_ref().and_then(|l| l.mail.clone()),
        };
        self.rxnb = 0;
        self.rxok = 0;
        self.rxfw = 0;
        self.dwnb = 0;
        self.txnb = 0;
        self.upstream_sent = 0;
        self.upstream_acked = 0;
        stat
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn blank_location() -> GatewayLocation {
        GatewayLocation {
            latitude: None,
            longitude: None,
            altitude_m: None,
            description: None,
            mail: None,
        }
    }

    #[test]
    fn ackr_is_none_when_nothing_sent() {
        let mut stats = Statistics::new(blank_location());
        assert_eq!(stats.snapshot_and_reset().ackr, None);
    }

    #[test]
    fn ackr_reflects_ratio_of_acked_datagrams() {
        let mut stats = Statistics::new(blank_location());
        for _ in 0..4 {
            stats.record_upstream_sent();
        }
        stats.record_upstream_acked();
        stats.record_upstream_acked();
        assert_eq!(stats.snapshot_and_reset().ackr, Some(50.0));
    }

    #[test]
    fn counters_reset_after_snapshot() {
        let mut stats = Statistics::new(blank_location());
        stats.record_rx_batch(10, 8);
        stats.record_forwarded(1);
        stats.record_downstream_datagram();
        let first = stats.snapshot_and_reset();
        assert_eq!(first.rxnb, 10);

        stats.record_rx_batch(2, 2);
        let second = stats.snapshot_and_reset();
        assert_eq!(second.rxnb, 2);
        assert_eq!(second.rxfw, 0);
        assert_eq!(second.dwnb, 0);
    }
}
