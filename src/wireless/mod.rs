//! 802.11 frame decoding
//!
//! Just enough of IEEE 802.11 for the wireless detection module: frame
//! control, addressing, deauthentication/disassociation reason codes and
//! protected (WEP) data payloads. Requires a capture source delivering raw
//! 802.11 frames, optionally behind a radiotap header.

pub mod frame;
pub mod radiotap;

pub use frame::{Dot11Body, Dot11Frame, Dot11Type, FrameControl, MacAddr};
