//! DNS wire-format decoding (RFC 1035)
//!
//! Decodes a raw DNS payload into a header, questions and resource records.
//! Name compression is resolved during decoding; a compression pointer must
//! target an offset strictly before the pointer itself, which rejects
//! self-referential and forward pointers on malicious input.

use std::fmt;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Errors produced while decoding a DNS message.
///
/// Every variant aborts the decode of the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DnsError {
    #[error("message too small")]
    TooSmall,
    #[error("offset too large")]
    OffsetTooLarge,
    #[error("name pointer incomplete")]
    PointerIncomplete,
    #[error("name pointer loop")]
    PointerLoop,
    #[error("label length too long")]
    LabelTooLong,
    #[error("domain name too long")]
    NameTooLong,
    #[error("character string length too long")]
    CharStringTooLong,
    #[error("resource length longer than the message length")]
    ResourceTooLong,
}

/// Kind of query carried in the header (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Unknown(u8),
}

impl From<u8> for Opcode {
    fn from(val: u8) -> Self {
        match val {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            other => Opcode::Unknown(other),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Query => write!(f, "Query"),
            Opcode::IQuery => write!(f, "IQuery"),
            Opcode::Status => write!(f, "Status"),
            Opcode::Unknown(n) => write!(f, "Opcode({})", n),
        }
    }
}

/// Response code set by the server (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RCode {
    NoError,
    FormatError,
    ServerFail,
    NameError,
    NotImpl,
    Refused,
    Unknown(u8),
}

impl From<u8> for RCode {
    fn from(val: u8) -> Self {
        match val {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFail,
            3 => RCode::NameError,
            4 => RCode::NotImpl,
            5 => RCode::Refused,
            other => RCode::Unknown(other),
        }
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RCode::NoError => write!(f, "NoError"),
            RCode::FormatError => write!(f, "FormatError"),
            RCode::ServerFail => write!(f, "ServerFail"),
            RCode::NameError => write!(f, "NameError"),
            RCode::NotImpl => write!(f, "NotImpl"),
            RCode::Refused => write!(f, "Refused"),
            RCode::Unknown(n) => write!(f, "RCode({})", n),
        }
    }
}

/// TYPE and QTYPE values (RFC 1035 §3.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Ns,
    CName,
    Soa,
    Ptr,
    Mx,
    Txt,
    Aaaa,
    Any,
    Unknown(u16),
}

impl From<u16> for RecordType {
    fn from(val: u16) -> Self {
        match val {
            1 => RecordType::A,
            2 => RecordType::Ns,
            5 => RecordType::CName,
            6 => RecordType::Soa,
            12 => RecordType::Ptr,
            15 => RecordType::Mx,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            255 => RecordType::Any,
            other => RecordType::Unknown(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Ns => write!(f, "NS"),
            RecordType::CName => write!(f, "CNAME"),
            RecordType::Soa => write!(f, "SOA"),
            RecordType::Ptr => write!(f, "PTR"),
            RecordType::Mx => write!(f, "MX"),
            RecordType::Txt => write!(f, "TXT"),
            RecordType::Aaaa => write!(f, "AAAA"),
            RecordType::Any => write!(f, "*"),
            RecordType::Unknown(n) => write!(f, "Type({})", n),
        }
    }
}

/// CLASS and QCLASS values (RFC 1035 §3.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    In,
    Cs,
    Ch,
    Hs,
    Any,
    Unknown(u16),
}

impl From<u16> for RecordClass {
    fn from(val: u16) -> Self {
        match val {
            1 => RecordClass::In,
            2 => RecordClass::Cs,
            3 => RecordClass::Ch,
            4 => RecordClass::Hs,
            255 => RecordClass::Any,
            other => RecordClass::Unknown(other),
        }
    }
}

/// Fixed 12-byte message header (RFC 1035 §4.1.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    /// Query (false) or response (true).
    pub qr: bool,
    pub opcode: Opcode,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncation.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    /// Reserved; decoded as zero.
    pub z: u8,
    pub rcode: RCode,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

/// A single entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: String,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

/// Type-specific RDATA of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Ns(String),
    CName(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Ptr(String),
    Mx { preference: u16, exchange: String },
    Txt(Vec<String>),
    /// Any type this decoder has no variant for.
    Raw(Vec<u8>),
}

/// A resource record from the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub rd_length: u16,
    pub rdata: RData,
}

/// A complete DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl Message {
    /// Decode a raw DNS payload.
    pub fn decode(data: &[u8]) -> Result<Message, DnsError> {
        if data.len() < 12 {
            return Err(DnsError::TooSmall);
        }

        let header = Header::decode(data);
        let mut offset = 12;

        let mut questions = Vec::with_capacity(header.qd_count as usize);
        for _ in 0..header.qd_count {
            let (question, next) = decode_question(data, offset)?;
            questions.push(question);
            offset = next;
        }

        let mut answers = Vec::with_capacity(header.an_count as usize);
        for _ in 0..header.an_count {
            let (record, next) = decode_record(data, offset)?;
            answers.push(record);
            offset = next;
        }

        let mut authorities = Vec::with_capacity(header.ns_count as usize);
        for _ in 0..header.ns_count {
            let (record, next) = decode_record(data, offset)?;
            authorities.push(record);
            offset = next;
        }

        let mut additionals = Vec::with_capacity(header.ar_count as usize);
        for _ in 0..header.ar_count {
            let (record, next) = decode_record(data, offset)?;
            additionals.push(record);
            offset = next;
        }

        Ok(Message {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    /// One-line summary for diagnostics.
    pub fn summary(&self) -> String {
        let kind = if self.header.qr { "response" } else { "query" };
        let subject = self
            .questions
            .first()
            .map(|q| q.qname.clone())
            .unwrap_or_else(|| "<no question>".to_string());
        format!(
            "id {} {} {} ({} answers, rcode {})",
            self.header.id, kind, subject, self.header.an_count, self.header.rcode
        )
    }
}

impl Header {
    /// Decode the 12-byte header. The caller has verified the length.
    fn decode(data: &[u8]) -> Header {
        Header {
            id: u16::from_be_bytes([data[0], data[1]]),
            qr: data[2] & 0x80 != 0,
            opcode: Opcode::from((data[2] >> 3) & 0x0f),
            aa: data[2] & 0x04 != 0,
            tc: data[2] & 0x02 != 0,
            rd: data[2] & 0x01 != 0,
            ra: data[3] & 0x80 != 0,
            z: 0,
            rcode: RCode::from(data[3] & 0x0f),
            qd_count: u16::from_be_bytes([data[4], data[5]]),
            an_count: u16::from_be_bytes([data[6], data[7]]),
            ns_count: u16::from_be_bytes([data[8], data[9]]),
            ar_count: u16::from_be_bytes([data[10], data[11]]),
        }
    }
}

fn decode_question(data: &[u8], offset: usize) -> Result<(Question, usize), DnsError> {
    let (qname, offset) = decode_name(data, offset)?;
    if offset + 4 > data.len() {
        return Err(DnsError::TooSmall);
    }

    let qtype = u16::from_be_bytes([data[offset], data[offset + 1]]);
    let qclass = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
    Ok((
        Question {
            qname,
            qtype: RecordType::from(qtype),
            qclass: RecordClass::from(qclass),
        },
        offset + 4,
    ))
}

fn decode_record(data: &[u8], offset: usize) -> Result<(Record, usize), DnsError> {
    let (name, offset) = decode_name(data, offset)?;
    if offset + 10 > data.len() {
        return Err(DnsError::TooSmall);
    }

    let rtype = RecordType::from(u16::from_be_bytes([data[offset], data[offset + 1]]));
    let class = RecordClass::from(u16::from_be_bytes([data[offset + 2], data[offset + 3]]));
    let ttl = u32::from_be_bytes([
        data[offset + 4],
        data[offset + 5],
        data[offset + 6],
        data[offset + 7],
    ]);
    let rd_length = u16::from_be_bytes([data[offset + 8], data[offset + 9]]);

    let offset = offset + 10;
    if offset + rd_length as usize > data.len() {
        return Err(DnsError::ResourceTooLong);
    }

    let rdata = decode_rdata(data, offset, rd_length, rtype)?;

    Ok((
        Record {
            name,
            rtype,
            class,
            ttl,
            rd_length,
            rdata,
        },
        // The cursor advances by RDLength regardless of the variant decoded.
        offset + rd_length as usize,
    ))
}

fn decode_rdata(
    data: &[u8],
    offset: usize,
    rd_length: u16,
    rtype: RecordType,
) -> Result<RData, DnsError> {
    let raw = &data[offset..offset + rd_length as usize];

    let rdata = match rtype {
        RecordType::A if rd_length == 4 => {
            RData::A(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))
        }
        RecordType::Ns => RData::Ns(decode_name(data, offset)?.0),
        RecordType::CName => RData::CName(decode_name(data, offset)?.0),
        RecordType::Ptr => RData::Ptr(decode_name(data, offset)?.0),
        RecordType::Soa => {
            let (mname, next) = decode_name(data, offset)?;
            let (rname, next) = decode_name(data, next)?;
            if next + 20 > data.len() {
                return Err(DnsError::TooSmall);
            }
            RData::Soa {
                mname,
                rname,
                serial: read_u32(data, next),
                refresh: read_u32(data, next + 4),
                retry: read_u32(data, next + 8),
                expire: read_u32(data, next + 12),
                minimum: read_u32(data, next + 16),
            }
        }
        RecordType::Mx => {
            if rd_length < 2 {
                return Err(DnsError::TooSmall);
            }
            let preference = u16::from_be_bytes([raw[0], raw[1]]);
            let (exchange, _) = decode_name(data, offset + 2)?;
            RData::Mx {
                preference,
                exchange,
            }
        }
        RecordType::Txt => RData::Txt(decode_character_strings(raw)?),
        _ => RData::Raw(raw.to_vec()),
    };
    Ok(rdata)
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Decode a domain name starting at `offset`, resolving compression pointers.
///
/// Returns the name without a trailing dot, and the offset just past the name
/// as read in place (a pointer consumes two octets at the outer position).
pub fn decode_name(data: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    decode_name_bounded(data, offset, 0)
}

/// RFC 1035 §2.3.4: labels are 63 octets or less and a full name is 255
/// octets or less (label octets plus label length octets).
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;

fn decode_name_bounded(
    data: &[u8],
    offset: usize,
    depth: usize,
) -> Result<(String, usize), DnsError> {
    if offset >= data.len() {
        return Err(DnsError::OffsetTooLarge);
    }
    // Each recursion level follows exactly one pointer; a chain longer than
    // the input cannot be made of distinct targets.
    if depth > data.len() {
        return Err(DnsError::PointerLoop);
    }

    let mut index = offset;
    let mut name = String::new();
    // Octets consumed by the name itself: labels plus their length octets.
    let mut name_len = 0usize;

    loop {
        let octet = data[index];

        if octet == 0x00 {
            return Ok((name, index + 1));
        }

        if octet & 0xc0 == 0xc0 {
            // Compression pointer (RFC 1035 §4.1.4). A lone 0xc0 at the end
            // of the data would otherwise read past the buffer.
            if index + 2 > data.len() {
                return Err(DnsError::PointerIncomplete);
            }
            let target =
                (u16::from_be_bytes([data[index], data[index + 1]]) & 0x3fff) as usize;
            if target >= data.len() {
                return Err(DnsError::OffsetTooLarge);
            }
            // Pointers may only refer to a prior occurrence; a target at or
            // past the pointer is self-referential or forward.
            if target >= index {
                return Err(DnsError::PointerLoop);
            }
            let (suffix, _) = decode_name_bounded(data, target, depth + 1)?;
            // The 255-octet bound covers the whole name, pointer segments
            // included. The suffix's wire size is its string length plus one
            // length octet for the leading label.
            if !suffix.is_empty() && name_len + suffix.len() + 1 > MAX_NAME_LEN {
                return Err(DnsError::NameTooLong);
            }
            if !name.is_empty() && !suffix.is_empty() {
                name.push('.');
            }
            name.push_str(&suffix);
            return Ok((name, index + 2));
        }

        let len = octet as usize;
        if len > MAX_LABEL_LEN {
            return Err(DnsError::LabelTooLong);
        }
        if index + 1 + len > data.len() {
            return Err(DnsError::LabelTooLong);
        }
        name_len += 1 + len;
        if name_len > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong);
        }

        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(&String::from_utf8_lossy(&data[index + 1..index + 1 + len]));
        index += 1 + len;

        if index >= data.len() {
            return Err(DnsError::OffsetTooLarge);
        }
    }
}

/// Decode a run of `<character-string>`s covering the whole slice
/// (RFC 1035 §3.3; used by TXT RDATA).
pub fn decode_character_strings(data: &[u8]) -> Result<Vec<String>, DnsError> {
    let mut strings = Vec::new();
    let mut index = 0;
    while index < data.len() {
        let len = data[index] as usize;
        if index + 1 + len > data.len() {
            return Err(DnsError::CharStringTooLong);
        }
        strings.push(String::from_utf8_lossy(&data[index + 1..index + 1 + len]).into_owned());
        index += 1 + len;
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_name_valid() {
        let name = b"\x06google\x03com\x00";
        let (res, offset) = decode_name(name, 0).unwrap();
        assert_eq!(res, "google.com");
        assert_eq!(offset, name.len());
    }

    #[test]
    fn decode_name_offset_too_large() {
        let name = b"\x06google\x03com\x00";
        assert_eq!(decode_name(name, 12), Err(DnsError::OffsetTooLarge));
    }

    #[test]
    fn decode_name_root() {
        let (res, offset) = decode_name(b"\x00", 0).unwrap();
        assert_eq!(res, "");
        assert_eq!(offset, 1);
    }

    #[test]
    fn decode_name_pointer_valid() {
        let name = b"\x06google\x03com\x00\xc0\x00";
        let (res, offset) = decode_name(name, 12).unwrap();
        assert_eq!(res, "google.com");
        assert_eq!(offset, 14);
    }

    #[test]
    fn decode_name_pointer_incomplete() {
        assert_eq!(decode_name(b"\xc0", 0), Err(DnsError::PointerIncomplete));
    }

    #[test]
    fn decode_name_pointer_target_too_large() {
        let name = b"\x06google\x03com\x00\xcf\xff";
        assert_eq!(decode_name(name, 12), Err(DnsError::OffsetTooLarge));
    }

    #[test]
    fn decode_name_pointer_to_self() {
        // A pointer at offset 12 targeting offset 12.
        let name = b"\x06google\x03com\x00\xc0\x0c";
        assert_eq!(decode_name(name, 12), Err(DnsError::PointerLoop));
    }

    #[test]
    fn decode_name_forward_pointer() {
        let name = b"\xc0\x04\x00\x00\x03com\x00";
        assert_eq!(decode_name(name, 0), Err(DnsError::PointerLoop));
    }

    #[test]
    fn decode_name_label_too_long() {
        // 0x40 is not a valid label length nor a pointer tag.
        let mut name = vec![0x40u8];
        name.extend_from_slice(&[b'a'; 0x40]);
        name.push(0x00);
        assert_eq!(decode_name(&name, 0), Err(DnsError::LabelTooLong));
    }

    #[test]
    fn decode_name_max_label_accepted() {
        let mut name = vec![63u8];
        name.extend_from_slice(&[b'a'; 63]);
        name.push(0x00);
        let (res, offset) = decode_name(&name, 0).unwrap();
        assert_eq!(res.len(), 63);
        assert_eq!(offset, name.len());
    }

    #[test]
    fn decode_name_total_length_bounded() {
        // Five 62-octet labels: 5 * 63 = 315 octets of name > 255.
        let mut name = Vec::new();
        for _ in 0..5 {
            name.push(62u8);
            name.extend_from_slice(&[b'a'; 62]);
        }
        name.push(0x00);
        assert_eq!(decode_name(&name, 0), Err(DnsError::NameTooLong));
    }

    /// The 255-octet bound holds across compression pointers: a label
    /// prefixed onto an already-maximal suffix overflows.
    #[test]
    fn decode_name_length_bounded_through_pointer() {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.push(62u8);
            data.extend_from_slice(&[b'a'; 62]);
        }
        data.push(0x00); // 252 name octets, within bounds
        let prefix_at = data.len();
        data.push(62u8);
        data.extend_from_slice(&[b'b'; 62]);
        data.extend_from_slice(&[0xc0, 0x00]);

        assert!(decode_name(&data, 0).is_ok());
        assert_eq!(decode_name(&data, prefix_at), Err(DnsError::NameTooLong));
    }

    #[test]
    fn decode_name_truncated_label() {
        let name = b"\x06goo";
        assert_eq!(decode_name(name, 0), Err(DnsError::LabelTooLong));
    }

    #[test]
    fn character_strings_valid() {
        let data = b"\x06google\x03com";
        let res = decode_character_strings(data).unwrap();
        assert_eq!(res, vec!["google".to_string(), "com".to_string()]);
    }

    #[test]
    fn character_strings_length_too_long() {
        let data = b"\x06google\x04com";
        assert_eq!(
            decode_character_strings(data),
            Err(DnsError::CharStringTooLong)
        );
    }

    #[test]
    fn decode_message_too_small() {
        assert_eq!(Message::decode(&[0u8; 11]), Err(DnsError::TooSmall));
    }

    /// A response carrying one question and one A record whose name is a
    /// compression pointer back to the question.
    #[test]
    fn decode_a_record_response() {
        let data: Vec<u8> = vec![
            0x04, 0xd2, // ID = 1234
            0x85, 0x00, // QR, AA, RD
            0x00, 0x01, // QDCount
            0x00, 0x01, // ANCount
            0x00, 0x00, // NSCount
            0x00, 0x00, // ARCount
            0x06, b'g', b'o', b'o', b'g', b'l', b'e', 0x03, b'c', b'o', b'm', 0x00,
            0x00, 0x01, // QType = A
            0x00, 0x01, // QClass = IN
            0xc0, 0x0c, // Name: pointer to offset 12
            0x00, 0x01, // Type = A
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x3c, // TTL = 60
            0x00, 0x04, // RDLength
            0x08, 0x08, 0x08, 0x08, // 8.8.8.8
        ];

        let msg = Message::decode(&data).unwrap();
        assert_eq!(msg.header.id, 1234);
        assert!(msg.header.qr);
        assert!(msg.header.aa);
        assert!(msg.header.rd);
        assert!(!msg.header.ra);
        assert_eq!(msg.header.opcode, Opcode::Query);
        assert_eq!(msg.header.rcode, RCode::NoError);
        assert_eq!(msg.header.qd_count, 1);
        assert_eq!(msg.header.an_count, 1);

        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.questions[0].qname, "google.com");
        assert_eq!(msg.questions[0].qtype, RecordType::A);
        assert_eq!(msg.questions[0].qclass, RecordClass::In);

        assert_eq!(msg.answers.len(), 1);
        let answer = &msg.answers[0];
        assert_eq!(answer.name, "google.com");
        assert_eq!(answer.ttl, 60);
        assert_eq!(answer.rd_length, 4);
        assert_eq!(answer.rdata, RData::A(Ipv4Addr::new(8, 8, 8, 8)));
    }

    /// The cursor after decoding all sections must land exactly at the end of
    /// the message.
    #[test]
    fn decode_cursor_consumes_whole_message() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o', b'm', 0x00,
            0x00, 0x01, 0x00, 0x01,
        ];
        // Rebuilding the walk: header (12) + question. decode_question returns
        // the final cursor, which must equal the message length.
        let (_, offset) = decode_question(&data, 12).unwrap();
        assert_eq!(offset, data.len());
        assert!(Message::decode(&data).is_ok());
    }

    #[test]
    fn decode_txt_record() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            0x03, b'f', b'o', b'o', 0x00, // name
            0x00, 0x10, // Type = TXT
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x0a, // TTL
            0x00, 0x08, // RDLength
            0x03, b'a', b'b', b'c', 0x03, b'd', b'e', b'f',
        ];
        let msg = Message::decode(&data).unwrap();
        assert_eq!(
            msg.answers[0].rdata,
            RData::Txt(vec!["abc".to_string(), "def".to_string()])
        );
    }

    #[test]
    fn decode_mx_record() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            0x03, b'f', b'o', b'o', 0x00, // name
            0x00, 0x0f, // Type = MX
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x0a, // TTL
            0x00, 0x09, // RDLength
            0x00, 0x0a, // Preference = 10
            0x04, b'm', b'a', b'i', b'l', 0xc0, 0x0c, // mail.foo via pointer
        ];
        let msg = Message::decode(&data).unwrap();
        assert_eq!(
            msg.answers[0].rdata,
            RData::Mx {
                preference: 10,
                exchange: "mail.foo".to_string()
            }
        );
    }

    #[test]
    fn decode_soa_record() {
        let mut data: Vec<u8> = vec![
            0x00, 0x01, 0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            0x03, b'f', b'o', b'o', 0x00, // name
            0x00, 0x06, // Type = SOA
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x0a, // TTL
            0x00, 0x1b, // RDLength = 27
            0x02, b'n', b's', 0xc0, 0x0c, // ns.foo
            0xc0, 0x0c, // foo
        ];
        for field in [1u32, 2, 3, 4, 5] {
            data.extend_from_slice(&field.to_be_bytes());
        }
        let msg = Message::decode(&data).unwrap();
        match &msg.answers[0].rdata {
            RData::Soa {
                mname,
                rname,
                serial,
                minimum,
                ..
            } => {
                assert_eq!(mname, "ns.foo");
                assert_eq!(rname, "foo");
                assert_eq!(*serial, 1);
                assert_eq!(*minimum, 5);
            }
            other => panic!("expected SOA, got {:?}", other),
        }
    }

    #[test]
    fn decode_resource_length_past_message() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            0x03, b'f', b'o', b'o', 0x00, // name
            0x00, 0x01, // Type = A
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x0a, // TTL
            0x00, 0x20, // RDLength = 32, but only 4 bytes follow
            0x08, 0x08, 0x08, 0x08,
        ];
        assert_eq!(Message::decode(&data), Err(DnsError::ResourceTooLong));
    }

    #[test]
    fn decode_a_record_odd_length_kept_raw() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
            0x03, b'f', b'o', b'o', 0x00, // name
            0x00, 0x01, // Type = A
            0x00, 0x01, // Class = IN
            0x00, 0x00, 0x00, 0x0a, // TTL
            0x00, 0x02, // RDLength = 2: not a valid A address
            0x08, 0x08,
        ];
        let msg = Message::decode(&data).unwrap();
        assert_eq!(msg.answers[0].rdata, RData::Raw(vec![0x08, 0x08]));
    }
}
