//! ARP anomaly detection
//!
//! Watches ARP traffic for noticeable or erroneous conditions and reports
//! them over the log topic:
//! - hosts binding to the Ethernet broadcast address (error)
//! - requests not sent to the broadcast address (notice)
//! - replies for which no request was observed (notice)
//! - broadcast and gratuitous replies (notice)
//! - replies violating the configured IP-to-MAC allowlist (notice)
//!
//! The module never vetoes a frame; it reports only.

use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, Context, Result};

use crate::bus::{LogEvent, Message, Module, Reception};
use crate::config::Config;
use crate::protocols::arp::{fmt_protocol_addr, ArpPacket, Opcode};

/// Requests kept while waiting for a reply. Oldest entries are evicted past
/// this bound so a request flood cannot grow the set without limit.
const PENDING_LIMIT: usize = 1024;

/// An observed request, remembered until a matching reply arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRequest {
    sender_proto: Vec<u8>,
    target_proto: Vec<u8>,
}

/// The ARP detection module.
#[derive(Debug, Default)]
pub struct ArpWatchModule {
    /// Allowed hardware addresses per protocol address. An empty map means
    /// no binding is valid and every reply is reported.
    valid_bindings: HashMap<Vec<u8>, Vec<[u8; 6]>>,
    pending_requests: VecDeque<PendingRequest>,
}

impl ArpWatchModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn analyse(&mut self, arp: &ArpPacket) -> Vec<LogEvent> {
        match arp.opcode {
            Opcode::Request => self.analyse_request(arp),
            Opcode::Reply => self.analyse_reply(arp),
        }
    }

    fn analyse_request(&mut self, arp: &ArpPacket) -> Vec<LogEvent> {
        let mut events = Vec::new();

        if arp.is_gratuitous() {
            events.push(LogEvent::notice(format!(
                "Host {} sent a gratuitous request",
                fmt_protocol_addr(&arp.sender_proto)
            )));
        } else if arp.is_unicast_request() {
            events.push(LogEvent::notice(format!(
                "Host {} is unicasting an ARP request to {}",
                fmt_protocol_addr(&arp.sender_proto),
                fmt_protocol_addr(&arp.target_proto)
            )));
        }

        // Gratuitous requests announce, they do not ask; nothing to match a
        // reply against.
        if !arp.is_gratuitous() {
            if self.pending_requests.len() == PENDING_LIMIT {
                self.pending_requests.pop_front();
            }
            self.pending_requests.push_back(PendingRequest {
                sender_proto: arp.sender_proto.clone(),
                target_proto: arp.target_proto.clone(),
            });
        }

        events
    }

    fn analyse_reply(&mut self, arp: &ArpPacket) -> Vec<LogEvent> {
        let mut events = Vec::new();

        // A reply answers the request whose (sender, target) protocol
        // addresses mirror its own.
        let matching = self.pending_requests.iter().position(|req| {
            req.sender_proto == arp.target_proto && req.target_proto == arp.sender_proto
        });

        if !arp.is_gratuitous() && matching.is_none() {
            events.push(LogEvent::notice(format!(
                "Host {} sent a reply to a request that was never made",
                fmt_protocol_addr(&arp.sender_proto)
            )));
        }
        if let Some(index) = matching {
            self.pending_requests.remove(index);
        }

        if arp.is_binding_ethernet() {
            events.push(LogEvent::error(format!(
                "Host {} is trying to bind to the Ethernet broadcast address",
                fmt_protocol_addr(&arp.sender_proto)
            )));
        } else if arp.is_broadcast_reply() {
            events.push(LogEvent::notice(format!(
                "Host {} is replying to a request from host {} using a broadcast message",
                fmt_protocol_addr(&arp.sender_proto),
                fmt_protocol_addr(&arp.target_proto)
            )));
        } else if arp.is_gratuitous() {
            events.push(LogEvent::notice(format!(
                "Host {} sent a gratuitous reply",
                fmt_protocol_addr(&arp.sender_proto)
            )));
        } else if !self.is_valid_binding(arp) {
            events.push(LogEvent::notice(format!(
                "Host {} is using a hardware address outside its allowed bindings",
                fmt_protocol_addr(&arp.sender_proto)
            )));
        }

        events
    }

    /// The allowlist contains the sender's protocol address and one of its
    /// permitted hardware addresses matches the sender's.
    fn is_valid_binding(&self, arp: &ArpPacket) -> bool {
        self.valid_bindings
            .get(&arp.sender_proto)
            .map(|allowed| allowed.iter().any(|mac| arp.sender_hw == mac))
            .unwrap_or(false)
    }
}

/// Parse a colon-separated hardware address.
fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 6 {
        return Err(anyhow!("invalid hardware address: {}", s));
    }
    let mut mac = [0u8; 6];
    for (i, part) in parts.iter().enumerate() {
        mac[i] = u8::from_str_radix(part, 16)
            .with_context(|| format!("invalid hardware address: {}", s))?;
    }
    Ok(mac)
}

impl Module for ArpWatchModule {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_PACKET]
    }

    fn init(&mut self, config: &Config) -> Result<()> {
        for (ip, macs) in &config.arp_bindings {
            let addr: std::net::Ipv4Addr = ip
                .parse()
                .with_context(|| format!("invalid binding address: {}", ip))?;
            let allowed = macs
                .iter()
                .map(|mac| parse_mac(mac))
                .collect::<Result<Vec<_>>>()?;
            self.valid_bindings.insert(addr.octets().to_vec(), allowed);
        }
        Ok(())
    }

    fn receive(&mut self, message: &Message) -> Reception {
        let Message::Packet(frame) = message else {
            return Reception::allow();
        };
        let Some(payload) = frame.arp_payload() else {
            return Reception::allow();
        };

        match ArpPacket::decode(payload) {
            Ok(arp) => Reception::allow_with(self.analyse(&arp)),
            Err(e) => Reception::allow_with(vec![LogEvent::error(format!(
                "failed to decode ARP packet: {}",
                e
            ))]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{CATEGORY_ERROR, CATEGORY_NOTICE};
    use crate::testing::synthetic::{arp_reply, arp_request};
    use std::net::Ipv4Addr;

    const MAC_A: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0a];
    const MAC_B: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0b];
    const BROADCAST: [u8; 6] = [0xff; 6];

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 0, last)
    }

    fn module_with_binding(addr: Ipv4Addr, mac: &str) -> ArpWatchModule {
        let mut config = Config::default();
        config
            .arp_bindings
            .insert(addr.to_string(), vec![mac.to_string()]);
        let mut module = ArpWatchModule::new();
        module.init(&config).unwrap();
        module
    }

    #[test]
    fn init_rejects_bad_bindings() {
        let mut config = Config::default();
        config
            .arp_bindings
            .insert("not-an-ip".to_string(), vec!["aa:bb:cc:dd:ee:ff".into()]);
        assert!(ArpWatchModule::new().init(&config).is_err());

        let mut config = Config::default();
        config
            .arp_bindings
            .insert("192.168.0.1".to_string(), vec!["nonsense".into()]);
        assert!(ArpWatchModule::new().init(&config).is_err());
    }

    #[test]
    fn broadcast_request_is_silent() {
        let mut module = ArpWatchModule::new();
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(13));
        let events = module.analyse(&request);
        assert!(events.is_empty());
        assert_eq!(module.pending_requests.len(), 1);
    }

    #[test]
    fn unicast_request_is_noticed() {
        let mut module = ArpWatchModule::new();
        let request = arp_request(MAC_A, ip(5), MAC_B, ip(13));
        let events = module.analyse(&request);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, CATEGORY_NOTICE);
        assert!(events[0].message.contains("unicasting"));
    }

    #[test]
    fn gratuitous_request_is_noticed_and_not_pending() {
        let mut module = ArpWatchModule::new();
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(5));
        let events = module.analyse(&request);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("gratuitous request"));
        assert!(module.pending_requests.is_empty());
    }

    /// Broadcast-MAC bind: error event, and the module still allows.
    #[test]
    fn binding_to_broadcast_is_an_error() {
        let mut module = ArpWatchModule::new();
        let reply = arp_reply(BROADCAST, ip(5), MAC_B, ip(13));
        let events = module.analyse(&reply);
        assert!(events
            .iter()
            .any(|e| e.category == CATEGORY_ERROR
                && e.message.contains("Ethernet broadcast address")));
    }

    #[test]
    fn spurious_reply_is_noticed() {
        let mut module = module_with_binding(ip(5), "02:00:00:00:00:0a");
        let reply = arp_reply(MAC_A, ip(5), MAC_B, ip(13));
        let events = module.analyse(&reply);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("never made"));
    }

    #[test]
    fn answered_request_is_matched_and_removed() {
        let mut module = module_with_binding(ip(13), "02:00:00:00:00:0b");
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(13));
        assert!(module.analyse(&request).is_empty());

        // Reply mirrors the request's addresses.
        let reply = arp_reply(MAC_B, ip(13), MAC_A, ip(5));
        let events = module.analyse(&reply);
        assert!(events.is_empty(), "unexpected events: {:?}", events);
        assert!(module.pending_requests.is_empty());

        // The same reply again has nothing left to match.
        let events = module.analyse(&reply);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("never made"));
    }

    /// An empty allowlist means every otherwise-normal reply is reported.
    #[test]
    fn empty_allowlist_reports_all_replies() {
        let mut module = ArpWatchModule::new();
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(13));
        module.analyse(&request);

        let reply = arp_reply(MAC_B, ip(13), MAC_A, ip(5));
        let events = module.analyse(&reply);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("allowed bindings"));
    }

    #[test]
    fn allowed_binding_is_silent() {
        let mut module = module_with_binding(ip(13), "02:00:00:00:00:0b");
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(13));
        module.analyse(&request);
        let reply = arp_reply(MAC_B, ip(13), MAC_A, ip(5));
        assert!(module.analyse(&reply).is_empty());
    }

    #[test]
    fn wrong_mac_for_bound_ip_is_noticed() {
        let mut module = module_with_binding(ip(13), "02:00:00:00:00:0a");
        let request = arp_request(MAC_A, ip(5), BROADCAST, ip(13));
        module.analyse(&request);
        // Reply comes from MAC_B, but the binding allows only MAC_A.
        let reply = arp_reply(MAC_B, ip(13), MAC_A, ip(5));
        let events = module.analyse(&reply);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("allowed bindings"));
    }

    #[test]
    fn pending_queue_is_bounded() {
        let mut module = ArpWatchModule::new();
        for i in 0..(PENDING_LIMIT + 10) {
            let request = arp_request(
                MAC_A,
                Ipv4Addr::new(10, 0, (i >> 8) as u8, i as u8),
                BROADCAST,
                ip(13),
            );
            module.analyse(&request);
        }
        assert_eq!(module.pending_requests.len(), PENDING_LIMIT);
    }

    #[test]
    fn non_arp_frames_are_ignored() {
        let mut module = ArpWatchModule::new();
        let frame = crate::core::parse_frame(
            crate::testing::synthetic::tcp_frame(ip(1), ip(2), 1, 2, 0x02, 0),
            crate::core::LinkKind::Ethernet,
        );
        let reception = module.receive(&Message::Packet(std::sync::Arc::new(frame)));
        assert!(reception.verdict);
        assert!(reception.events.is_empty());
    }

    #[test]
    fn malformed_arp_reports_decode_error() {
        let mut module = ArpWatchModule::new();
        // An Ethernet frame with ethertype ARP but a garbage payload.
        let mut data = Vec::new();
        data.extend_from_slice(&[0xff; 6]);
        data.extend_from_slice(&MAC_A);
        data.extend_from_slice(&0x0806u16.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x09, 0x08, 0x00, 6, 4, 0, 1]); // bad hardware type

        let frame = crate::core::parse_frame(data, crate::core::LinkKind::Ethernet);
        let reception = module.receive(&Message::Packet(std::sync::Arc::new(frame)));
        assert!(reception.verdict);
        assert_eq!(reception.events.len(), 1);
        assert_eq!(reception.events[0].category, CATEGORY_ERROR);
    }
}
