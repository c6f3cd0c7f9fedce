//! 802.11 attack detection
//!
//! Two detections over the wireless link:
//! - disassociation/deauthentication floods: two such management frames
//!   arriving within the configured interval are suspicious
//! - WEP ARP-replay: an encrypted data frame of the characteristic
//!   ARP-over-WEP size whose ciphertext byte-equals one of the last ten,
//!   received within the interval of the previous WEP frame
//!
//! The module never vetoes a frame; it reports only.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::bus::{LogEvent, Message, Module, Reception};
use crate::config::Config;
use crate::wireless::frame::{Dot11Body, Dot11Frame, MacAddr};

/// How many recent WEP ciphertexts are remembered.
const WEP_HISTORY: usize = 10;

/// Encrypted payload size of an ARP request over WEP: 28 octets of
/// LLC/SNAP+ARP plus 8 octets of IV/ICV overhead.
const WEP_ARP_PAYLOAD_LEN: usize = 36;

/// The wireless detection module.
#[derive(Debug)]
pub struct WifiModule {
    /// Two frames closer together than this are treated as an attack.
    interval: Duration,
    prev_deauth: Option<Instant>,
    prev_wep: Option<Instant>,
    recent_weps: VecDeque<Vec<u8>>,
}

impl WifiModule {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_nanos(1_000_000_000),
            prev_deauth: None,
            prev_wep: None,
            recent_weps: VecDeque::with_capacity(WEP_HISTORY),
        }
    }

    fn observe_deauth(&mut self, addr1: MacAddr, now: Instant) -> Option<LogEvent> {
        let event = match self.prev_deauth {
            Some(prev) if now.duration_since(prev) < self.interval => {
                Some(LogEvent::notice(format!(
                    "Host {} is possibly performing a disassociation or deauthentication attack",
                    addr1
                )))
            }
            _ => None,
        };
        self.prev_deauth = Some(now);
        event
    }

    fn observe_wep(&mut self, addr1: MacAddr, ciphertext: &[u8], now: Instant) -> Option<LogEvent> {
        let mut event = None;

        // Only compare when this frame follows the previous WEP frame within
        // the interval; the queue entries carry no timestamps of their own.
        if let Some(prev) = self.prev_wep {
            if now.duration_since(prev) < self.interval
                && self.recent_weps.iter().any(|wep| wep == ciphertext)
            {
                event = Some(LogEvent::notice(format!(
                    "Host {} is possibly performing an ARP replay attack",
                    addr1
                )));
            }
        }

        if self.recent_weps.len() == WEP_HISTORY {
            self.recent_weps.pop_front();
        }
        self.recent_weps.push_back(ciphertext.to_vec());
        self.prev_wep = Some(now);

        event
    }

    fn observe(&mut self, dot11: &Dot11Frame, now: Instant) -> Option<LogEvent> {
        match &dot11.body {
            Dot11Body::Deauthentication { .. } | Dot11Body::Disassociation { .. } => {
                self.observe_deauth(dot11.addr1, now)
            }
            Dot11Body::ProtectedData(ciphertext)
                if ciphertext.len() == WEP_ARP_PAYLOAD_LEN =>
            {
                self.observe_wep(dot11.addr1, ciphertext, now)
            }
            _ => None,
        }
    }
}

impl Default for WifiModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for WifiModule {
    fn name(&self) -> &'static str {
        "wifi"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_PACKET]
    }

    fn init(&mut self, config: &Config) -> anyhow::Result<()> {
        self.interval = Duration::from_nanos(config.interval);
        Ok(())
    }

    fn receive(&mut self, message: &Message) -> Reception {
        let Message::Packet(frame) = message else {
            return Reception::allow();
        };
        let Some(dot11) = frame.dot11.as_ref() else {
            return Reception::allow();
        };

        match self.observe(dot11, Instant::now()) {
            Some(event) => Reception::allow_with(vec![event]),
            None => Reception::allow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: MacAddr = MacAddr::BROADCAST;

    fn module_with_interval(interval: Duration) -> WifiModule {
        let mut module = WifiModule::new();
        module.interval = interval;
        module
    }

    #[test]
    fn single_deauth_is_silent() {
        let mut module = module_with_interval(Duration::from_secs(1));
        assert!(module.observe_deauth(ADDR, Instant::now()).is_none());
    }

    #[test]
    fn rapid_deauths_are_reported() {
        let mut module = module_with_interval(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(module.observe_deauth(ADDR, t0).is_none());
        let event = module.observe_deauth(ADDR, t0 + Duration::from_millis(100));
        assert!(event.unwrap().message.contains("deauthentication attack"));
    }

    #[test]
    fn spaced_deauths_are_silent() {
        let mut module = module_with_interval(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(module.observe_deauth(ADDR, t0).is_none());
        assert!(module
            .observe_deauth(ADDR, t0 + Duration::from_secs(2))
            .is_none());
    }

    /// Two identical ciphertexts 500 ms apart trip the replay detection; a
    /// third identical one two seconds later does not.
    #[test]
    fn wep_replay_window() {
        let mut module = module_with_interval(Duration::from_secs(1));
        let ciphertext = [0xabu8; WEP_ARP_PAYLOAD_LEN];
        let t0 = Instant::now();

        assert!(module.observe_wep(ADDR, &ciphertext, t0).is_none());
        let event = module.observe_wep(ADDR, &ciphertext, t0 + Duration::from_millis(500));
        assert!(event.unwrap().message.contains("ARP replay attack"));
        assert!(module
            .observe_wep(ADDR, &ciphertext, t0 + Duration::from_millis(2500))
            .is_none());
    }

    #[test]
    fn wep_different_ciphertexts_are_silent() {
        let mut module = module_with_interval(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(module
            .observe_wep(ADDR, &[0xaa; WEP_ARP_PAYLOAD_LEN], t0)
            .is_none());
        assert!(module
            .observe_wep(
                ADDR,
                &[0xbb; WEP_ARP_PAYLOAD_LEN],
                t0 + Duration::from_millis(100)
            )
            .is_none());
    }

    /// The history holds ten entries; an eleventh pushes the first out.
    #[test]
    fn wep_history_is_bounded() {
        let mut module = module_with_interval(Duration::from_secs(60));
        let t0 = Instant::now();
        let first = [0u8; WEP_ARP_PAYLOAD_LEN];
        module.observe_wep(ADDR, &first, t0);

        for i in 1..=WEP_HISTORY {
            let mut body = [0u8; WEP_ARP_PAYLOAD_LEN];
            body[0] = i as u8;
            module.observe_wep(ADDR, &body, t0 + Duration::from_millis(i as u64));
        }
        assert_eq!(module.recent_weps.len(), WEP_HISTORY);

        // `first` has been evicted, so replaying it goes unnoticed.
        assert!(module
            .observe_wep(ADDR, &first, t0 + Duration::from_millis(20))
            .is_none());
    }

    /// Non-ARP-sized WEP payloads are not tracked at all.
    #[test]
    fn oversized_wep_payload_is_ignored() {
        let mut module = module_with_interval(Duration::from_secs(1));
        let frame = Dot11Frame::parse(&crate::testing::synthetic::dot11_wep_data(
            *ADDR.as_bytes(),
            &[0xcc; 100],
        ))
        .unwrap();
        assert!(module.observe(&frame, Instant::now()).is_none());
        assert!(module.recent_weps.is_empty());
    }
}
