mod error;

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::crc;

pub use error::{Error, Result};

pub type Apid = u16;

/// Packet is the first packet in a packet group
pub const SEQ_FIRST: u8 = 1;
/// Packet is a part of a packet group, but not first and not last
pub const SEQ_CONTINUATION: u8 = 0;
/// Packet is the last packet in a packet group
pub const SEQ_LAST: u8 = 2;
/// Packet is not part of a packet group, i.e., standalone.
pub const SEQ_UNSEGMENTED: u8 = 3;

/// Bias subtracted from the secondary header, payload, and checksum byte count to
/// produce the length field. Ground segment convention; note it is not the
/// `len - 1` of CCSDS 133.0-B.
pub const LENGTH_BIAS: usize = 7;

/// Largest payload whose length still fits in the 16-bit length field.
pub const MAX_PAYLOAD: usize = u16::MAX as usize + LENGTH_BIAS - SecondaryHeader::LEN - crc::LEN;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    #[serde(rename = "TM")]
    Telemetry,
    #[serde(rename = "TC")]
    Telecommand,
}

impl Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Telemetry => write!(f, "TM"),
            Self::Telecommand => write!(f, "TC"),
        }
    }
}

/// CCSDS Primary Header
///
/// The primary header format is common to all CCSDS space packets.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub version: u8,
    pub packet_type: PacketType,
    pub has_secondary_header: bool,
    pub apid: Apid,
    /// Defines a packets grouping. See the `SEQ_*` values.
    pub sequence_flags: u8,
    pub sequence_count: u16,
    /// Length field exactly as it appears on the wire. See [LENGTH_BIAS].
    pub data_length: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = 16383;
    pub const APID_MAX: Apid = 2047;

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        Some(PrimaryHeader {
            version: (d1 >> 13 & 0x7) as u8,
            packet_type: if d1 >> 12 & 0x1 == 1 {
                PacketType::Telecommand
            } else {
                PacketType::Telemetry
            },
            has_secondary_header: (d1 >> 11 & 0x1) == 1,
            apid: (d1 & 0x7ff),
            sequence_flags: (d2 >> 14 & 0x3) as u8,
            sequence_count: (d2 & 0x3fff),
            data_length: d3,
        })
    }

    /// True for the first packet of a packet group.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.sequence_flags == SEQ_FIRST
    }

    /// True for a packet inside a packet group that is neither first nor last.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.sequence_flags == SEQ_CONTINUATION
    }

    /// True for the last packet of a packet group.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.sequence_flags == SEQ_LAST
    }

    /// True for a standalone packet.
    #[must_use]
    pub fn is_unsegmented(&self) -> bool {
        self.sequence_flags == SEQ_UNSEGMENTED
    }

    /// Encode to the 3 big-endian header words. Out of range fields are masked to
    /// their bit widths.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let type_flag = u16::from(self.packet_type == PacketType::Telecommand);
        let d1 = u16::from(self.version & 0x7) << 13
            | type_flag << 12
            | u16::from(self.has_secondary_header) << 11
            | (self.apid & Self::APID_MAX);
        let d2 = u16::from(self.sequence_flags & 0x3) << 14 | (self.sequence_count & Self::SEQ_MAX);

        let mut buf = [0u8; Self::LEN];
        buf[..2].copy_from_slice(&d1.to_be_bytes());
        buf[2..4].copy_from_slice(&d2.to_be_bytes());
        buf[4..].copy_from_slice(&self.data_length.to_be_bytes());
        buf
    }
}

/// PUS style secondary header carried by every telemetry packet we produce.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct SecondaryHeader {
    /// Seconds into the UTC day the packet was built.
    pub coarse_time: u32,
    pub pus_version: u8,
    pub service: u8,
    pub subtype: u8,
    pub destination_id: u16,
    pub source_id: u16,
}

impl Default for SecondaryHeader {
    fn default() -> Self {
        Self {
            coarse_time: 0,
            pus_version: 1,
            service: 3,
            subtype: 1,
            destination_id: 1000,
            source_id: 2000,
        }
    }
}

impl SecondaryHeader {
    pub const LEN: usize = 11;
    const SECONDS_PER_DAY: i64 = 86_400;

    /// Default header stamped with the coarse time of `time`.
    #[must_use]
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            coarse_time: time.timestamp().rem_euclid(Self::SECONDS_PER_DAY) as u32,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        Some(Self {
            coarse_time: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            pus_version: buf[4],
            service: buf[5],
            subtype: buf[6],
            destination_id: u16::from_be_bytes([buf[7], buf[8]]),
            source_id: u16::from_be_bytes([buf[9], buf[10]]),
        })
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[..4].copy_from_slice(&self.coarse_time.to_be_bytes());
        buf[4] = self.pus_version;
        buf[5] = self.service;
        buf[6] = self.subtype;
        buf[7..9].copy_from_slice(&self.destination_id.to_be_bytes());
        buf[9..].copy_from_slice(&self.source_id.to_be_bytes());
        buf
    }
}

/// Interpretation of the packet user data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Payload {
    /// Bytes that are not JSON, hex encoded.
    Raw { raw: String },
    /// JSON telemetry document.
    Telemetry(Value),
}

impl Payload {
    /// Parse `dat` as JSON, falling back to a hex rendering of the bytes.
    #[must_use]
    pub fn from_bytes(dat: &[u8]) -> Self {
        match serde_json::from_slice(dat) {
            Ok(value) => Self::Telemetry(value),
            Err(err) => {
                trace!(%err, "payload is not json");
                Self::raw(dat)
            }
        }
    }

    #[must_use]
    pub fn raw(dat: &[u8]) -> Self {
        Self::Raw {
            raw: hex::encode(dat),
        }
    }

    #[must_use]
    pub fn telemetry(&self) -> Option<&Value> {
        match self {
            Self::Telemetry(value) => Some(value),
            Self::Raw { .. } => None,
        }
    }
}

/// Result of the checksum and length checks performed when decoding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Integrity {
    /// Checksum and length field agree with the packet bytes.
    Ok,
    /// Packet was too short or had no secondary header, so there was no checksum to
    /// verify.
    NotChecked,
    CrcMismatch { declared: u16, computed: u16 },
    LengthMismatch { declared: u16, expected: usize },
}

impl Display for Integrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::NotChecked => write!(f, "not checked"),
            Self::CrcMismatch { declared, computed } => {
                write!(f, "crc mismatch: declared={declared:#06x} computed={computed:#06x}")
            }
            Self::LengthMismatch { declared, expected } => {
                write!(f, "length mismatch: declared={declared} expected={expected}")
            }
        }
    }
}

/// A single decoded space packet.
///
/// Packets without a secondary header, or too short to carry one plus a checksum,
/// decode with a raw payload covering everything after the primary header and
/// [Integrity::NotChecked].
///
/// A packet of exactly [Packet::MIN_STRUCTURED_LEN] bytes with the secondary header flag
/// set is structured: its secondary header and checksum are decoded and its payload is
/// `Payload::Raw` with an empty `raw` string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Packet {
    pub header: PrimaryHeader,
    pub secondary_header: Option<SecondaryHeader>,
    pub payload: Payload,
    /// Payload bytes, excluding headers and checksum.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Declared checksum, if the packet carried one.
    pub crc: Option<u16>,
    pub integrity: Integrity,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet{{header: {:?}, data:[len={}], integrity: {}}}",
            self.header,
            self.data.len(),
            self.integrity,
        )
    }
}

impl Packet {
    /// Offset of the payload in a packet with a secondary header.
    pub const PAYLOAD_OFFSET: usize = PrimaryHeader::LEN + SecondaryHeader::LEN;
    /// Smallest packet decoded as primary header, secondary header, payload, and crc.
    pub const MIN_STRUCTURED_LEN: usize = Self::PAYLOAD_OFFSET + crc::LEN;

    /// Decode from bytes using a permissive [Decoder].
    ///
    /// # Errors
    /// [Error::TooShort] if there are not enough bytes for a primary header.
    pub fn decode(dat: &[u8]) -> Result<Packet> {
        Decoder::default().decode(dat)
    }

    /// True if the checksum or length field disagree with the packet bytes.
    #[must_use]
    pub fn is_suspect(&self) -> bool {
        matches!(
            self.integrity,
            Integrity::CrcMismatch { .. } | Integrity::LengthMismatch { .. }
        )
    }
}

/// Decodes packets, optionally rejecting those that fail integrity checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    strict: bool,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject packets whose checksum or length field is wrong rather than returning
    /// them flagged as suspect.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Decode a single packet from `dat`.
    ///
    /// # Errors
    /// [Error::TooShort] if there are not enough bytes for a primary header, and
    /// [Error::Suspect] for a strict decoder given a packet that fails its checks.
    pub fn decode(&self, dat: &[u8]) -> Result<Packet> {
        let Some(header) = PrimaryHeader::decode(dat) else {
            return Err(Error::TooShort {
                actual: dat.len(),
                minimum: PrimaryHeader::LEN,
            });
        };

        if !header.has_secondary_header || dat.len() < Packet::MIN_STRUCTURED_LEN {
            trace!(apid = header.apid, len = dat.len(), "decoding as raw payload");
            let data = dat[PrimaryHeader::LEN..].to_vec();
            return Ok(Packet {
                header,
                secondary_header: None,
                payload: Payload::raw(&data),
                data,
                crc: None,
                integrity: Integrity::NotChecked,
            });
        }

        let secondary_header =
            SecondaryHeader::decode(&dat[PrimaryHeader::LEN..]).ok_or(Error::TooShort {
                actual: dat.len(),
                minimum: Packet::MIN_STRUCTURED_LEN,
            })?;
        let body_end = dat.len() - crc::LEN;
        let declared = u16::from_be_bytes([dat[body_end], dat[body_end + 1]]);
        let computed = crc::compute(&dat[..body_end]);
        let expected = dat.len() - PrimaryHeader::LEN - LENGTH_BIAS;

        let integrity = if declared != computed {
            Integrity::CrcMismatch { declared, computed }
        } else if usize::from(header.data_length) != expected {
            Integrity::LengthMismatch {
                declared: header.data_length,
                expected,
            }
        } else {
            Integrity::Ok
        };
        if self.strict && integrity != Integrity::Ok {
            return Err(Error::Suspect(integrity));
        }

        let data = dat[Packet::PAYLOAD_OFFSET..body_end].to_vec();
        Ok(Packet {
            header,
            secondary_header: Some(secondary_header),
            payload: Payload::from_bytes(&data),
            data,
            crc: Some(declared),
            integrity,
        })
    }
}

/// Encode an unsegmented telemetry packet stamped with the current time.
///
/// `sequence_count` wraps modulo 16384 and `apid` is masked to 11 bits.
///
/// # Errors
/// [Error::PayloadTooLarge] if `payload` is longer than [MAX_PAYLOAD].
///
/// # Example
/// ```
/// use ccsds_mo::spacepacket::{encode, Packet};
///
/// let dat = encode(100, 7, br#"{"subsystem":"POWER"}"#).unwrap();
/// let packet = Packet::decode(&dat).unwrap();
/// assert_eq!(packet.header.apid, 100);
/// assert_eq!(packet.header.sequence_count, 7);
/// ```
pub fn encode(apid: Apid, sequence_count: u32, payload: &[u8]) -> Result<Vec<u8>> {
    encode_with(
        PacketType::Telemetry,
        apid,
        sequence_count,
        &SecondaryHeader::now(),
        payload,
    )
}

/// Encode an unsegmented packet with an explicit type and secondary header.
///
/// # Errors
/// [Error::PayloadTooLarge] if `payload` is longer than [MAX_PAYLOAD].
pub fn encode_with(
    packet_type: PacketType,
    apid: Apid,
    sequence_count: u32,
    secondary_header: &SecondaryHeader,
    payload: &[u8],
) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge {
            actual: payload.len(),
            maximum: MAX_PAYLOAD,
        });
    }
    let data_length = (SecondaryHeader::LEN + payload.len() + crc::LEN - LENGTH_BIAS) as u16;
    let header = PrimaryHeader {
        version: 0,
        packet_type,
        has_secondary_header: true,
        apid: apid & PrimaryHeader::APID_MAX,
        sequence_flags: SEQ_UNSEGMENTED,
        sequence_count: (sequence_count % (u32::from(PrimaryHeader::SEQ_MAX) + 1)) as u16,
        data_length,
    };

    let mut buf = Vec::with_capacity(Packet::MIN_STRUCTURED_LEN + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(&secondary_header.encode());
    buf.extend_from_slice(payload);
    let crc = crc::compute(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    const PAYLOAD: &[u8] = br#"{"measurements":{"voltage_bus":12.3}}"#;

    #[test]
    fn decode_primary_header() {
        #[rustfmt::skip]
        let dat: &[u8] = &[
            // apid 100, secondary header flag set
            0x08, 0x64,
            // unsegmented, sequence 5
            0xc0, 0x05,
            0x00, 0x2b,
        ];
        let header = PrimaryHeader::decode(dat).unwrap();

        assert_eq!(header.version, 0);
        assert_eq!(header.packet_type, PacketType::Telemetry);
        assert!(header.has_secondary_header);
        assert_eq!(header.apid, 100);
        assert_eq!(header.sequence_flags, SEQ_UNSEGMENTED);
        assert_eq!(header.sequence_count, 5);
        assert_eq!(header.data_length, 43);
        assert_eq!(header.encode(), dat);
    }

    #[test_case(0x00, SEQ_CONTINUATION; "continuation")]
    #[test_case(0x40, SEQ_FIRST; "first")]
    #[test_case(0x80, SEQ_LAST; "last")]
    #[test_case(0xc0, SEQ_UNSEGMENTED; "unsegmented")]
    fn sequence_flags(d2_hi: u8, flags: u8) {
        let header = PrimaryHeader::decode(&[0x08, 0x64, d2_hi, 0x05, 0x00, 0x00]).unwrap();
        assert_eq!(header.sequence_flags, flags);
        assert_eq!(header.is_first(), flags == SEQ_FIRST);
        assert_eq!(header.is_continuation(), flags == SEQ_CONTINUATION);
        assert_eq!(header.is_last(), flags == SEQ_LAST);
        assert_eq!(header.is_unsegmented(), flags == SEQ_UNSEGMENTED);
        assert_eq!(header.sequence_count, 5);
    }

    #[test]
    fn decode_telecommand_type() {
        let header = PrimaryHeader::decode(&[0x18, 0x01, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(header.packet_type, PacketType::Telecommand);
        assert_eq!(header.apid, 1);
    }

    #[test]
    fn secondary_header_layout() {
        let header = SecondaryHeader {
            coarse_time: 45_296,
            ..SecondaryHeader::default()
        };
        #[rustfmt::skip]
        let expected: [u8; SecondaryHeader::LEN] = [
            0x00, 0x00, 0xb0, 0xf0,
            0x01, 0x03, 0x01,
            0x03, 0xe8,
            0x07, 0xd0,
        ];
        assert_eq!(header.encode(), expected);
        assert_eq!(SecondaryHeader::decode(&expected), Some(header));
    }

    #[test]
    fn secondary_header_coarse_time_is_seconds_of_day() {
        let time = DateTime::parse_from_rfc3339("2024-12-27T12:34:56Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(SecondaryHeader::at(time).coarse_time, 12 * 3600 + 34 * 60 + 56);
    }

    #[test]
    fn encode_decode() {
        let dat = encode(100, 42, PAYLOAD).unwrap();
        let packet = Packet::decode(&dat).unwrap();

        assert_eq!(packet.header.apid, 100);
        assert_eq!(packet.header.sequence_count, 42);
        assert_eq!(packet.header.sequence_flags, SEQ_UNSEGMENTED);
        assert_eq!(packet.data, PAYLOAD);
        assert_eq!(packet.integrity, Integrity::Ok);
        assert_eq!(
            packet.payload,
            Payload::Telemetry(json!({"measurements": {"voltage_bus": 12.3}}))
        );
        let secondary = packet.secondary_header.unwrap();
        assert_eq!(secondary.service, 3);
        assert_eq!(secondary.source_id, 2000);
    }

    #[test]
    fn encoded_crc_covers_all_preceding_bytes() {
        let dat = encode(100, 1, PAYLOAD).unwrap();
        let (body, trailer) = dat.split_at(dat.len() - 2);
        assert_eq!(crc::compute(body).to_be_bytes(), trailer);
    }

    #[test]
    fn sequence_count_wraps() {
        let secondary = SecondaryHeader::default();
        let a = encode_with(PacketType::Telemetry, 100, 16384, &secondary, PAYLOAD).unwrap();
        let b = encode_with(PacketType::Telemetry, 100, 0, &secondary, PAYLOAD).unwrap();
        assert_eq!(a, b);

        let packet = Packet::decode(&encode(100, 16385, PAYLOAD).unwrap()).unwrap();
        assert_eq!(packet.header.sequence_count, 1);
    }

    #[test]
    fn length_field_convention() {
        for len in [0usize, 1, 37, 1024] {
            let payload = vec![b'x'; len];
            let dat = encode(100, 0, &payload).unwrap();
            let header = PrimaryHeader::decode(&dat).unwrap();
            let expected = SecondaryHeader::LEN + len + 2 - 7;
            assert_eq!(
                usize::from(header.data_length),
                expected,
                "Expected length field {expected} for payload of {len} bytes"
            );
        }
    }

    #[test]
    fn apid_is_masked() {
        let packet = Packet::decode(&encode(0xffff, 0, PAYLOAD).unwrap()).unwrap();
        assert_eq!(packet.header.apid, PrimaryHeader::APID_MAX);
    }

    #[test]
    fn payload_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let err = encode(100, 0, &payload).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }), "got {err:?}");
        assert!(encode(100, 0, &payload[..MAX_PAYLOAD]).is_ok());
    }

    #[test]
    fn too_short() {
        for len in 0..PrimaryHeader::LEN {
            let err = Packet::decode(&vec![0u8; len]).unwrap_err();
            assert!(
                matches!(err, Error::TooShort { actual, minimum: 6 } if actual == len),
                "got {err:?}"
            );
        }
    }

    #[test]
    fn no_secondary_header_is_raw() {
        #[rustfmt::skip]
        let dat: &[u8] = &[
            0x00, 0x64, 0xc0, 0x01, 0x00, 0x01,
            0xca, 0xfe,
        ];
        let packet = Packet::decode(dat).unwrap();
        assert!(packet.secondary_header.is_none());
        assert_eq!(packet.integrity, Integrity::NotChecked);
        assert_eq!(
            packet.payload,
            Payload::Raw {
                raw: "cafe".to_string()
            }
        );
    }

    #[test]
    fn short_with_secondary_flag_is_raw() {
        let dat = encode(100, 0, b"").unwrap();
        let packet = Packet::decode(&dat[..Packet::MIN_STRUCTURED_LEN - 1]).unwrap();
        assert!(packet.secondary_header.is_none());
        assert_eq!(packet.data, &dat[PrimaryHeader::LEN..Packet::MIN_STRUCTURED_LEN - 1]);
        assert!(!packet.is_suspect());
    }

    #[test]
    fn minimum_structured_packet_has_empty_payload() {
        let dat = encode(100, 0, b"").unwrap();
        assert_eq!(dat.len(), Packet::MIN_STRUCTURED_LEN);

        let packet = Packet::decode(&dat).unwrap();
        assert!(packet.secondary_header.is_some());
        assert!(packet.data.is_empty());
        assert!(packet.crc.is_some());
        assert_eq!(packet.integrity, Integrity::Ok);
        assert_eq!(
            packet.payload,
            Payload::Raw {
                raw: String::new()
            },
            "Expected empty raw payload"
        );
    }

    #[test]
    fn non_json_payload_is_hex() {
        let dat = encode(100, 3, &[0xff, 0x00, 0x7b]).unwrap();
        let packet = Packet::decode(&dat).unwrap();
        assert_eq!(packet.integrity, Integrity::Ok);
        assert_eq!(
            packet.payload,
            Payload::Raw {
                raw: "ff007b".to_string()
            }
        );
    }

    #[test]
    fn crc_mismatch_is_flagged() {
        let mut dat = encode(100, 3, PAYLOAD).unwrap();
        let idx = Packet::PAYLOAD_OFFSET + 2;
        dat[idx] = b'M';
        let packet = Packet::decode(&dat).unwrap();
        assert!(packet.is_suspect());
        assert!(matches!(packet.integrity, Integrity::CrcMismatch { .. }));
    }

    #[test]
    fn length_mismatch_is_flagged() {
        let mut dat = encode(100, 3, PAYLOAD).unwrap();
        dat.truncate(dat.len() - 2);
        dat.truncate(dat.len() - 1);
        let crc = crc::compute(&dat);
        dat.extend_from_slice(&crc.to_be_bytes());

        let packet = Packet::decode(&dat).unwrap();
        let expected = SecondaryHeader::LEN + PAYLOAD.len() - 1 + 2 - LENGTH_BIAS;
        assert_eq!(
            packet.integrity,
            Integrity::LengthMismatch {
                declared: (expected + 1) as u16,
                expected,
            }
        );
    }

    #[test]
    fn strict_decoder_rejects_suspect() {
        let mut dat = encode(100, 3, PAYLOAD).unwrap();
        let last = dat.len() - 1;
        dat[last] ^= 0x01;

        let err = Decoder::new().with_strict(true).decode(&dat).unwrap_err();
        assert!(matches!(err, Error::Suspect(Integrity::CrcMismatch { .. })), "got {err:?}");
    }

    #[test]
    fn payload_serializes_like_the_wire_document() {
        let raw = serde_json::to_value(Payload::raw(&[0xab])).unwrap();
        assert_eq!(raw, json!({"raw": "ab"}));
        let telemetry = serde_json::to_value(Payload::from_bytes(b"[1,2]")).unwrap();
        assert_eq!(telemetry, json!([1, 2]));
    }
}
