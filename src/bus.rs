//! Topic-keyed publish/subscribe dispatcher
//!
//! Every captured frame is published on the `packet` topic and fanned out to
//! the detection modules in registration order. Each handler returns a
//! boolean verdict plus any log-event emissions; the first `false` verdict
//! vetoes the frame and stops dispatch. Emitted log events are delivered on
//! the `log` topic once the packet dispatch has completed (also after a
//! veto), where verdicts are ignored.
//!
//! Dispatch is synchronous relative to the publisher; the bus never spawns
//! threads. The subscription table is built during init and read-only
//! afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::core::Frame;

/// Topic carrying captured frames.
pub const TOPIC_PACKET: &str = "packet";
/// Topic carrying categorised log events.
pub const TOPIC_LOG: &str = "log";

/// Log category understood by the report module.
pub const CATEGORY_NOTICE: &str = "notice";
pub const CATEGORY_ERROR: &str = "error";

/// A categorised log event destined for the operator sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Category string; the report module knows `notice` and `error` and
    /// falls back to notice for anything else.
    pub category: String,
    pub message: String,
}

impl LogEvent {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            category: CATEGORY_NOTICE.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: CATEGORY_ERROR.to_string(),
            message: message.into(),
        }
    }
}

/// A message routed over the bus.
#[derive(Debug, Clone)]
pub enum Message {
    Packet(Arc<Frame>),
    Log(LogEvent),
}

/// What a handler hands back: its verdict and any log emissions.
#[derive(Debug)]
pub struct Reception {
    /// `true` allows the frame, `false` vetoes it.
    pub verdict: bool,
    pub events: Vec<LogEvent>,
}

impl Reception {
    pub fn allow() -> Self {
        Self {
            verdict: true,
            events: Vec::new(),
        }
    }

    pub fn allow_with(events: Vec<LogEvent>) -> Self {
        Self {
            verdict: true,
            events,
        }
    }

    pub fn veto() -> Self {
        Self {
            verdict: false,
            events: Vec::new(),
        }
    }
}

/// A detection module subscribed on the bus.
///
/// The module declares its topics once; the handler converts the message to
/// the form it expects and rejects anything else with an allow verdict. A
/// module that only produces side effects must always return an allow.
pub trait Module {
    fn name(&self) -> &'static str;

    /// Topics this module wants to receive.
    fn topics(&self) -> &'static [&'static str];

    /// Prepare module state from the configuration. A failed init keeps the
    /// module off the bus; the rest of the system continues.
    fn init(&mut self, config: &Config) -> anyhow::Result<()> {
        let _ = config;
        Ok(())
    }

    /// Handle one message.
    fn receive(&mut self, message: &Message) -> Reception;
}

/// The broker through which all messages go.
pub struct Bus {
    modules: Vec<Box<dyn Module>>,
    subscriptions: HashMap<String, Vec<usize>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            subscriptions: HashMap::new(),
        }
    }

    /// Register a module under each of its declared topics. Dispatch order
    /// within a topic is registration order.
    pub fn subscribe(&mut self, module: Box<dyn Module>) {
        let index = self.modules.len();
        for topic in module.topics() {
            self.subscriptions
                .entry((*topic).to_string())
                .or_default()
                .push(index);
        }
        self.modules.push(module);
    }

    /// Number of subscribed modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Publish a message; returns `false` as soon as one of the subscribers
    /// vetoes, `true` otherwise. Log emissions collected during dispatch are
    /// delivered on the log topic before returning.
    pub fn publish(&mut self, topic: &str, message: &Message) -> bool {
        let mut emitted = Vec::new();
        let verdict = self.dispatch(topic, message, &mut emitted);

        // Log verdicts are ignored, and emissions from log handlers are not
        // redelivered.
        let mut nested = Vec::new();
        for event in emitted {
            self.dispatch(TOPIC_LOG, &Message::Log(event), &mut nested);
        }

        verdict
    }

    fn dispatch(&mut self, topic: &str, message: &Message, emitted: &mut Vec<LogEvent>) -> bool {
        let Some(indices) = self.subscriptions.get(topic) else {
            return true;
        };
        for index in indices.clone() {
            let reception = self.modules[index].receive(message);
            emitted.extend(reception.events);
            if !reception.verdict {
                return false;
            }
        }
        true
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
