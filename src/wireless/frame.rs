//! 802.11 frame structure

use std::fmt;

/// MAC address (6 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&data[..6]);
            Some(Self(bytes))
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Frame type (2 bits of the frame control field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dot11Type {
    Management,
    Control,
    Data,
    Extension,
}

impl From<u8> for Dot11Type {
    fn from(val: u8) -> Self {
        match val & 0x03 {
            0 => Dot11Type::Management,
            1 => Dot11Type::Control,
            2 => Dot11Type::Data,
            _ => Dot11Type::Extension,
        }
    }
}

/// Management frame subtypes this decoder cares about.
pub mod mgmt_subtypes {
    pub const DISASSOCIATION: u8 = 0x0a;
    pub const DEAUTHENTICATION: u8 = 0x0c;
}

/// Frame control field (2 bytes).
#[derive(Debug, Clone, Copy)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: Dot11Type,
    /// Raw 4-bit subtype.
    pub subtype: u8,
    pub to_ds: bool,
    pub from_ds: bool,
    pub retry: bool,
    /// Protected frame flag (WEP/WPA).
    pub protected: bool,
}

impl FrameControl {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }
        let fc0 = data[0];
        let fc1 = data[1];
        Some(Self {
            protocol_version: fc0 & 0x03,
            frame_type: Dot11Type::from((fc0 >> 2) & 0x03),
            subtype: (fc0 >> 4) & 0x0f,
            to_ds: fc1 & 0x01 != 0,
            from_ds: fc1 & 0x02 != 0,
            retry: fc1 & 0x08 != 0,
            protected: fc1 & 0x40 != 0,
        })
    }
}

/// Decoded frame body.
#[derive(Debug, Clone)]
pub enum Dot11Body {
    Deauthentication { reason_code: u16 },
    Disassociation { reason_code: u16 },
    /// Encrypted data payload as captured: IV, key id, ciphertext and ICV.
    ProtectedData(Vec<u8>),
    Other,
}

/// A parsed 802.11 frame.
#[derive(Debug, Clone)]
pub struct Dot11Frame {
    pub fc: FrameControl,
    pub duration: u16,
    /// Receiver/destination address.
    pub addr1: MacAddr,
    pub addr2: Option<MacAddr>,
    pub addr3: Option<MacAddr>,
    pub seq_control: Option<u16>,
    pub body: Dot11Body,
}

impl Dot11Frame {
    /// Parse an 802.11 frame. Returns `None` when even the fixed header is
    /// missing; unknown frame kinds decode with an [`Dot11Body::Other`] body.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 10 {
            return None;
        }

        let fc = FrameControl::parse(data)?;
        let duration = u16::from_le_bytes([data[2], data[3]]);
        let addr1 = MacAddr::from_slice(&data[4..])?;

        // Management and data frames carry addr2, addr3 and sequence control
        // in a fixed 24-byte header; QoS data adds two bytes.
        let (addr2, addr3, seq_control, body_offset) = match fc.frame_type {
            Dot11Type::Management | Dot11Type::Data if data.len() >= 24 => {
                let addr2 = MacAddr::from_slice(&data[10..]);
                let addr3 = MacAddr::from_slice(&data[16..]);
                let seq = u16::from_le_bytes([data[22], data[23]]);
                let qos = fc.frame_type == Dot11Type::Data && fc.subtype & 0x08 != 0;
                let offset = if qos { 26 } else { 24 };
                (addr2, addr3, Some(seq), offset)
            }
            _ => (None, None, None, 10),
        };

        let body_data = data.get(body_offset..).unwrap_or(&[]);
        let body = match fc.frame_type {
            Dot11Type::Management => match fc.subtype {
                mgmt_subtypes::DEAUTHENTICATION if body_data.len() >= 2 => {
                    Dot11Body::Deauthentication {
                        reason_code: u16::from_le_bytes([body_data[0], body_data[1]]),
                    }
                }
                mgmt_subtypes::DISASSOCIATION if body_data.len() >= 2 => {
                    Dot11Body::Disassociation {
                        reason_code: u16::from_le_bytes([body_data[0], body_data[1]]),
                    }
                }
                _ => Dot11Body::Other,
            },
            Dot11Type::Data if fc.protected => Dot11Body::ProtectedData(body_data.to_vec()),
            _ => Dot11Body::Other,
        };

        Some(Self {
            fc,
            duration,
            addr1,
            addr2,
            addr3,
            seq_control,
            body,
        })
    }

    /// Deauthentication or disassociation management frame.
    pub fn is_deauth_like(&self) -> bool {
        matches!(
            self.body,
            Dot11Body::Deauthentication { .. } | Dot11Body::Disassociation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(fc0: u8, fc1: u8) -> Vec<u8> {
        let mut data = vec![fc0, fc1, 0x00, 0x00];
        data.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x01]); // addr1
        data.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x02]); // addr2
        data.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x03]); // addr3
        data.extend_from_slice(&[0x00, 0x00]); // sequence control
        data
    }

    #[test]
    fn parse_deauth() {
        // Type management (00), subtype 12 (deauthentication).
        let mut data = header(0xc0, 0x00);
        data.extend_from_slice(&7u16.to_le_bytes()); // reason code

        let frame = Dot11Frame::parse(&data).unwrap();
        assert_eq!(frame.fc.frame_type, Dot11Type::Management);
        assert!(frame.is_deauth_like());
        match frame.body {
            Dot11Body::Deauthentication { reason_code } => assert_eq!(reason_code, 7),
            other => panic!("expected deauthentication, got {:?}", other),
        }
        assert_eq!(frame.addr1, MacAddr::new([0x02, 0, 0, 0, 0, 0x01]));
    }

    #[test]
    fn parse_disassoc() {
        // Subtype 10 (disassociation).
        let mut data = header(0xa0, 0x00);
        data.extend_from_slice(&1u16.to_le_bytes());

        let frame = Dot11Frame::parse(&data).unwrap();
        assert!(frame.is_deauth_like());
    }

    #[test]
    fn parse_protected_data() {
        // Type data (10), protected flag set.
        let mut data = header(0x08, 0x40);
        data.extend_from_slice(&[0xaa; 36]);

        let frame = Dot11Frame::parse(&data).unwrap();
        assert_eq!(frame.fc.frame_type, Dot11Type::Data);
        assert!(frame.fc.protected);
        match frame.body {
            Dot11Body::ProtectedData(payload) => assert_eq!(payload.len(), 36),
            other => panic!("expected protected data, got {:?}", other),
        }
    }

    #[test]
    fn parse_plain_data_is_other() {
        let frame = Dot11Frame::parse(&header(0x08, 0x00)).unwrap();
        assert!(matches!(frame.body, Dot11Body::Other));
        assert!(!frame.is_deauth_like());
    }

    #[test]
    fn parse_too_short() {
        assert!(Dot11Frame::parse(&[0x08, 0x40, 0x00]).is_none());
    }
}
