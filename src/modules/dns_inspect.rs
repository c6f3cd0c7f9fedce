//! DNS inspection
//!
//! Runs the RFC 1035 decoder over every UDP port-53 payload. Well-formed
//! messages are traced for diagnostics; malformed ones are reported over the
//! log topic as errors, since a message that does not parse is either
//! corruption or an attempt to confuse a resolver.
//!
//! The module never vetoes a frame; it reports only.

use tracing::debug;

use crate::bus::{LogEvent, Message, Module, Reception};
use crate::protocols::dns;

/// The DNS inspection module.
#[derive(Debug, Default)]
pub struct DnsInspectModule;

impl DnsInspectModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for DnsInspectModule {
    fn name(&self) -> &'static str {
        "dns"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_PACKET]
    }

    fn receive(&mut self, message: &Message) -> Reception {
        let Message::Packet(frame) = message else {
            return Reception::allow();
        };
        let Some(payload) = frame.dns_payload() else {
            return Reception::allow();
        };

        match dns::Message::decode(payload) {
            Ok(msg) => {
                debug!("DNS {}", msg.summary());
                Reception::allow()
            }
            Err(e) => Reception::allow_with(vec![LogEvent::error(format!(
                "failed to decode DNS message: {}",
                e
            ))]),
        }
    }
}
