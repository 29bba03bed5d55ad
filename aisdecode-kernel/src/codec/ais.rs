/**
 * CODEC AIS - Phrases NMEA 0183 AIVDM / AIVDO
 *
 * RÔLE : Vérifie la somme de contrôle, réassemble les messages multi-fragments,
 * désarme la charge utile 6 bits et produit les champs des types 1/2/3, 4, 5, 18,
 * 19, 21 et 24.
 *
 * FONCTIONNEMENT :
 * - Fragment 1 d'un message : (ré)ouvre l'entrée `séquence:canal`
 * - Fragments suivants : rangés à leur index, le dernier fournit les bits de bourrage
 * - Entrées non terminées oubliées après `fragment_ttl`
 * - Un fragment orphelin est ignoré (`Ok(None)`)
 */

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{CodecError, DecodedPacket, PacketKind, SentenceCodec};
use crate::models::FieldSet;

pub const DEFAULT_FRAGMENT_TTL: Duration = Duration::from_secs(10);

const LATLON_SCALE: f64 = 600_000.0;

/// Le champ "nombre de fragments" d'une phrase AIVDM tient sur un chiffre.
pub const MAX_FRAGMENTS: usize = 9;

struct PendingMessage {
    total: usize,
    parts: Vec<Option<String>>,
    fill_bits: usize,
    started: Instant,
}

pub struct AisCodec {
    pending: HashMap<String, PendingMessage>,
    fragment_ttl: Duration,
}

impl Default for AisCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl AisCodec {
    pub fn new() -> Self {
        Self::with_fragment_ttl(DEFAULT_FRAGMENT_TTL)
    }

    pub fn with_fragment_ttl(fragment_ttl: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            fragment_ttl,
        }
    }

    /// Nombre de messages multi-fragments en cours de réassemblage.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Oublie les messages dont le premier fragment a plus de `fragment_ttl`.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.fragment_ttl;
        self.pending
            .retain(|_, pending| now.saturating_duration_since(pending.started) < ttl);
    }

    pub fn decode_at(
        &mut self,
        raw: &str,
        now: Instant,
    ) -> Result<Option<DecodedPacket>, CodecError> {
        let sentence = Sentence::parse(raw)?;

        self.prune(now);

        if sentence.total == 1 {
            return decode_payload(sentence.payload, sentence.fill_bits).map(Some);
        }

        let key = format!("{}:{}", sentence.sequence, sentence.channel);
        if sentence.index == 1 {
            self.pending.insert(
                key.clone(),
                PendingMessage {
                    total: sentence.total,
                    parts: vec![None; sentence.total],
                    fill_bits: 0,
                    started: now,
                },
            );
        }

        let Some(pending) = self.pending.get_mut(&key) else {
            return Ok(None);
        };
        if pending.total != sentence.total {
            let previous = pending.total;
            self.pending.remove(&key);
            return Err(CodecError::Malformed(format!(
                "fragment count changed from {previous} to {} for message {key}",
                sentence.total
            )));
        }

        pending.parts[sentence.index - 1] = Some(sentence.payload.to_string());
        if sentence.index == sentence.total {
            pending.fill_bits = sentence.fill_bits;
        }
        if pending.parts.iter().any(Option::is_none) {
            return Ok(None);
        }

        let Some(complete) = self.pending.remove(&key) else {
            return Ok(None);
        };
        let payload: String = complete.parts.into_iter().flatten().collect();
        decode_payload(&payload, complete.fill_bits).map(Some)
    }
}

impl SentenceCodec for AisCodec {
    fn decode(&mut self, raw: &str) -> Result<Option<DecodedPacket>, CodecError> {
        self.decode_at(raw, Instant::now())
    }
}

struct Sentence<'a> {
    total: usize,
    index: usize,
    sequence: &'a str,
    channel: &'a str,
    payload: &'a str,
    fill_bits: usize,
}

impl<'a> Sentence<'a> {
    fn parse(raw: &'a str) -> Result<Self, CodecError> {
        let line = raw.trim();
        let body = line
            .strip_prefix('!')
            .or_else(|| line.strip_prefix('$'))
            .ok_or_else(|| CodecError::NotAis(line.to_string()))?;
        let (body, checksum) = body
            .split_once('*')
            .ok_or_else(|| CodecError::Malformed("missing checksum".to_string()))?;

        let checksum = checksum.get(..2).unwrap_or(checksum);
        let expected = u8::from_str_radix(checksum, 16)
            .map_err(|_| CodecError::Malformed(format!("invalid checksum '{checksum}'")))?;
        let computed = body.bytes().fold(0u8, |acc, b| acc ^ b);
        if expected != computed {
            return Err(CodecError::Checksum { expected, computed });
        }

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() < 7 {
            return Err(CodecError::Malformed(format!(
                "expected 7 fields, got {}",
                fields.len()
            )));
        }
        if !(fields[0].ends_with("VDM") || fields[0].ends_with("VDO")) {
            return Err(CodecError::NotAis(fields[0].to_string()));
        }

        let total = parse_number(fields[1], "fragment count")?;
        let index = parse_number(fields[2], "fragment index")?;
        if total == 0 || total > MAX_FRAGMENTS || index == 0 || index > total {
            return Err(CodecError::Malformed(format!(
                "fragment {index} of {total}"
            )));
        }
        let fill_bits = if fields[6].is_empty() {
            0
        } else {
            parse_number(fields[6], "fill bits")?
        };
        if fill_bits > 5 {
            return Err(CodecError::Malformed(format!("fill bits {fill_bits}")));
        }

        Ok(Self {
            total,
            index,
            sequence: fields[3],
            channel: fields[4],
            payload: fields[5],
            fill_bits,
        })
    }
}

fn parse_number(value: &str, what: &str) -> Result<usize, CodecError> {
    value
        .parse()
        .map_err(|_| CodecError::Malformed(format!("invalid {what} '{value}'")))
}

/// Charge utile désarmée, un bit par octet. Les lectures au-delà de la fin valent 0.
struct BitReader {
    bits: Vec<u8>,
}

impl BitReader {
    fn from_payload(payload: &str, fill_bits: usize) -> Result<Self, CodecError> {
        let mut bits = Vec::with_capacity(payload.len() * 6);
        for c in payload.chars() {
            let code = c as u32;
            if !(48..=119).contains(&code) || (88..=95).contains(&code) {
                return Err(CodecError::InvalidPayload(c));
            }
            let mut value = code - 48;
            if value > 40 {
                value -= 8;
            }
            for shift in (0..6).rev() {
                bits.push(((value >> shift) & 1) as u8);
            }
        }
        let kept = bits.len().saturating_sub(fill_bits);
        bits.truncate(kept);
        Ok(Self { bits })
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn uint(&self, start: usize, len: usize) -> u64 {
        (start..start + len).fold(0u64, |acc, i| {
            (acc << 1) | u64::from(self.bits.get(i).copied().unwrap_or(0))
        })
    }

    fn int(&self, start: usize, len: usize) -> i64 {
        let raw = self.uint(start, len);
        if len > 0 && (raw >> (len - 1)) & 1 == 1 {
            raw as i64 - (1i64 << len)
        } else {
            raw as i64
        }
    }

    fn flag(&self, start: usize) -> bool {
        self.uint(start, 1) == 1
    }

    fn text(&self, start: usize, len: usize) -> String {
        let mut text: String = (0..len / 6)
            .map(|i| {
                let value = self.uint(start + i * 6, 6) as u8;
                char::from(if value < 32 { value + 64 } else { value })
            })
            .collect();
        if let Some(end) = text.find('@') {
            text.truncate(end);
        }
        text.trim_end().to_string()
    }
}

fn put(fields: &mut FieldSet, key: &str, value: impl Into<Value>) {
    fields.insert(key.to_string(), value.into());
}

fn scaled(raw: u64, divisor: f64) -> f64 {
    raw as f64 / divisor
}

fn decode_payload(payload: &str, fill_bits: usize) -> Result<DecodedPacket, CodecError> {
    let bits = BitReader::from_payload(payload, fill_bits)?;
    let msg_type = bits.uint(0, 6) as u8;
    if bits.len() < 38 {
        return Err(CodecError::TooShort {
            msg_type,
            bits: bits.len(),
        });
    }

    let (kind, min_bits) = match msg_type {
        1..=3 => (PacketKind::PositionReport, 168),
        4 => (PacketKind::BaseStationReport, 168),
        5 => (PacketKind::ShipStaticData, 420),
        18 => (PacketKind::StandardClassBPositionReport, 168),
        19 => (PacketKind::ExtendedClassBPositionReport, 312),
        21 => (PacketKind::AidsToNavigationReport, 272),
        24 => (PacketKind::StaticDataReport, 160),
        other => return Err(CodecError::Unsupported(other)),
    };
    if bits.len() < min_bits {
        return Err(CodecError::TooShort {
            msg_type,
            bits: bits.len(),
        });
    }

    let mut fields = FieldSet::new();
    put(&mut fields, "MessageID", bits.uint(0, 6));
    put(&mut fields, "RepeatIndicator", bits.uint(6, 2));
    put(&mut fields, "UserID", bits.uint(8, 30));

    match msg_type {
        1..=3 => position_report(&bits, &mut fields),
        4 => base_station_report(&bits, &mut fields),
        5 => ship_static_data(&bits, &mut fields),
        18 => class_b_position(&bits, &mut fields),
        19 => extended_class_b_position(&bits, &mut fields),
        21 => aids_to_navigation(&bits, &mut fields),
        _ => static_data_report(&bits, &mut fields, msg_type)?,
    }

    Ok(DecodedPacket::new(kind, fields))
}

fn position(bits: &BitReader, fields: &mut FieldSet, lon_at: usize, lat_at: usize) {
    put(fields, "Longitude", bits.int(lon_at, 28) as f64 / LATLON_SCALE);
    put(fields, "Latitude", bits.int(lat_at, 27) as f64 / LATLON_SCALE);
}

fn dimension(bits: &BitReader, at: usize) -> Value {
    let mut dim = FieldSet::new();
    put(&mut dim, "A", bits.uint(at, 9));
    put(&mut dim, "B", bits.uint(at + 9, 9));
    put(&mut dim, "C", bits.uint(at + 18, 6));
    put(&mut dim, "D", bits.uint(at + 24, 6));
    Value::Object(dim)
}

fn position_report(bits: &BitReader, fields: &mut FieldSet) {
    put(fields, "NavigationalStatus", bits.uint(38, 4));
    put(fields, "RateOfTurn", bits.int(42, 8));
    put(fields, "Sog", scaled(bits.uint(50, 10), 10.0));
    put(fields, "PositionAccuracy", bits.flag(60));
    position(bits, fields, 61, 89);
    put(fields, "Cog", scaled(bits.uint(116, 12), 10.0));
    put(fields, "TrueHeading", bits.uint(128, 9));
    put(fields, "Timestamp", bits.uint(137, 6));
    put(fields, "SpecialManoeuvreIndicator", bits.uint(143, 2));
    put(fields, "Spare", bits.uint(145, 3));
    put(fields, "Raim", bits.flag(148));
    put(fields, "CommunicationState", bits.uint(149, 19));
}

fn base_station_report(bits: &BitReader, fields: &mut FieldSet) {
    put(fields, "UtcYear", bits.uint(38, 14));
    put(fields, "UtcMonth", bits.uint(52, 4));
    put(fields, "UtcDay", bits.uint(56, 5));
    put(fields, "UtcHour", bits.uint(61, 5));
    put(fields, "UtcMinute", bits.uint(66, 6));
    put(fields, "UtcSecond", bits.uint(72, 6));
    put(fields, "PositionAccuracy", bits.flag(78));
    position(bits, fields, 79, 107);
    put(fields, "FixType", bits.uint(134, 4));
    put(fields, "LongRangeEnable", bits.flag(138));
    put(fields, "Spare", bits.uint(139, 9));
    put(fields, "Raim", bits.flag(148));
    put(fields, "CommunicationState", bits.uint(149, 19));
}

fn ship_static_data(bits: &BitReader, fields: &mut FieldSet) {
    put(fields, "AisVersion", bits.uint(38, 2));
    put(fields, "ImoNumber", bits.uint(40, 30));
    put(fields, "CallSign", bits.text(70, 42));
    put(fields, "Name", bits.text(112, 120));
    put(fields, "Type", bits.uint(232, 8));
    put(fields, "Dimension", dimension(bits, 240));
    put(fields, "FixType", bits.uint(270, 4));

    let mut eta = FieldSet::new();
    put(&mut eta, "Month", bits.uint(274, 4));
    put(&mut eta, "Day", bits.uint(278, 5));
    put(&mut eta, "Hour", bits.uint(283, 5));
    put(&mut eta, "Minute", bits.uint(288, 6));
    put(fields, "Eta", Value::Object(eta));

    put(fields, "MaximumStaticDraught", scaled(bits.uint(294, 8), 10.0));
    put(fields, "Destination", bits.text(302, 120));
    put(fields, "Dte", bits.flag(422));
    put(fields, "Spare", bits.flag(423));
}

fn class_b_common(bits: &BitReader, fields: &mut FieldSet) {
    put(fields, "Spare1", bits.uint(38, 8));
    put(fields, "Sog", scaled(bits.uint(46, 10), 10.0));
    put(fields, "PositionAccuracy", bits.flag(56));
    position(bits, fields, 57, 85);
    put(fields, "Cog", scaled(bits.uint(112, 12), 10.0));
    put(fields, "TrueHeading", bits.uint(124, 9));
    put(fields, "Timestamp", bits.uint(133, 6));
}

fn class_b_position(bits: &BitReader, fields: &mut FieldSet) {
    class_b_common(bits, fields);
    put(fields, "Spare2", bits.uint(139, 2));
    put(fields, "ClassBUnit", bits.flag(141));
    put(fields, "ClassBDisplay", bits.flag(142));
    put(fields, "ClassBDsc", bits.flag(143));
    put(fields, "ClassBBand", bits.flag(144));
    put(fields, "ClassBMsg22", bits.flag(145));
    put(fields, "AssignedMode", bits.flag(146));
    put(fields, "Raim", bits.flag(147));
    put(fields, "CommunicationStateIsItdma", bits.flag(148));
    put(fields, "CommunicationState", bits.uint(149, 19));
}

fn extended_class_b_position(bits: &BitReader, fields: &mut FieldSet) {
    class_b_common(bits, fields);
    put(fields, "Spare2", bits.uint(139, 4));
    put(fields, "Name", bits.text(143, 120));
    put(fields, "Type", bits.uint(263, 8));
    put(fields, "Dimension", dimension(bits, 271));
    put(fields, "FixType", bits.uint(301, 4));
    put(fields, "Raim", bits.flag(305));
    put(fields, "Dte", bits.flag(306));
    put(fields, "AssignedMode", bits.flag(307));
    put(fields, "Spare3", bits.uint(308, 4));
}

fn aids_to_navigation(bits: &BitReader, fields: &mut FieldSet) {
    put(fields, "Type", bits.uint(38, 5));
    put(fields, "Name", bits.text(43, 120));
    put(fields, "PositionAccuracy", bits.flag(163));
    position(bits, fields, 164, 192);
    put(fields, "Dimension", dimension(bits, 219));
    put(fields, "FixType", bits.uint(249, 4));
    put(fields, "Timestamp", bits.uint(253, 6));
    put(fields, "OffPosition", bits.flag(259));
    put(fields, "AtoN", bits.uint(260, 8));
    put(fields, "Raim", bits.flag(268));
    put(fields, "VirtualAtoN", bits.flag(269));
    put(fields, "AssignedMode", bits.flag(270));
    put(fields, "Spare", bits.flag(271));
}

fn static_data_report(
    bits: &BitReader,
    fields: &mut FieldSet,
    msg_type: u8,
) -> Result<(), CodecError> {
    let part = bits.uint(38, 2);
    put(fields, "PartNumber", part);
    match part {
        0 => put(fields, "Name", bits.text(40, 120)),
        1 => {
            if bits.len() < 168 {
                return Err(CodecError::TooShort {
                    msg_type,
                    bits: bits.len(),
                });
            }
            put(fields, "Type", bits.uint(40, 8));
            put(fields, "VendorIDName", bits.text(48, 18));
            put(fields, "VendorIDModel", bits.uint(66, 4));
            put(fields, "VendorIDSerial", bits.uint(70, 20));
            put(fields, "CallSign", bits.text(90, 42));
            put(fields, "Dimension", dimension(bits, 132));
            put(fields, "FixType", bits.uint(162, 4));
            put(fields, "Spare", bits.uint(166, 2));
        }
        other => {
            return Err(CodecError::Malformed(format!(
                "static data report part {other}"
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION_REPORT: &str = "!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C";
    const CLASS_B: &str = "!AIVDM,1,1,,B,B52MJh00=>gDK@62ko1hSwg5kP06,0*36";
    const STATIC_PART_1: &str =
        "!AIVDM,2,1,3,A,53aDo802;=`10@48000pu8@T>1=@580000000016<PD:<5WfNBlSm51DQ0C@,0*7C";
    const STATIC_PART_2: &str = "!AIVDM,2,2,3,A,00000000000,2*27";

    fn decode(raw: &str) -> DecodedPacket {
        AisCodec::new().decode(raw).unwrap().unwrap()
    }

    fn approx(value: &Value, expected: f64) {
        let got = value.as_f64().unwrap();
        assert!((got - expected).abs() < 1e-6, "{got} != {expected}");
    }

    #[test]
    fn test_position_report() {
        let packet = decode(POSITION_REPORT);
        assert_eq!(packet.kind, PacketKind::PositionReport);
        let f = &packet.fields;
        assert_eq!(f["MessageID"], 1);
        assert_eq!(f["UserID"], 477553000);
        assert_eq!(f["NavigationalStatus"], 5);
        assert_eq!(f["RateOfTurn"], 0);
        approx(&f["Sog"], 0.0);
        approx(&f["Longitude"], -122.345_833_333);
        approx(&f["Latitude"], 47.582_833_333);
        approx(&f["Cog"], 51.0);
        assert_eq!(f["TrueHeading"], 181);
        assert_eq!(f["Timestamp"], 15);
        assert_eq!(f["CommunicationState"], 149208);
    }

    #[test]
    fn test_class_b_position_report() {
        let packet = decode(CLASS_B);
        assert_eq!(packet.kind, PacketKind::StandardClassBPositionReport);
        let f = &packet.fields;
        assert_eq!(f["UserID"], 338123456);
        approx(&f["Sog"], 5.2);
        assert_eq!(f["PositionAccuracy"], true);
        approx(&f["Longitude"], -70.5);
        approx(&f["Latitude"], 42.25);
        approx(&f["Cog"], 180.0);
        assert_eq!(f["TrueHeading"], 511);
        assert_eq!(f["ClassBUnit"], true);
        assert_eq!(f["ClassBDisplay"], false);
        assert_eq!(f["CommunicationStateIsItdma"], true);
        assert_eq!(f["CommunicationState"], 393222);
    }

    #[test]
    fn test_multi_fragment_static_data() {
        let mut codec = AisCodec::new();
        assert!(codec.decode(STATIC_PART_1).unwrap().is_none());
        assert_eq!(codec.pending_len(), 1);

        let packet = codec.decode(STATIC_PART_2).unwrap().unwrap();
        assert_eq!(codec.pending_len(), 0);
        assert_eq!(packet.kind, PacketKind::ShipStaticData);
        let f = &packet.fields;
        assert_eq!(f["UserID"], 244660000);
        assert_eq!(f["ImoNumber"], 9123456);
        assert_eq!(f["CallSign"], "PDAB");
        assert_eq!(f["Name"], "NORDIC STAR");
        assert_eq!(f["Type"], 70);
        assert_eq!(f["Dimension"]["A"], 100);
        assert_eq!(f["Dimension"]["D"], 12);
        assert_eq!(f["Eta"]["Month"], 6);
        assert_eq!(f["Eta"]["Minute"], 30);
        approx(&f["MaximumStaticDraught"], 7.5);
        assert_eq!(f["Destination"], "ROTTERDAM");
    }

    #[test]
    fn test_orphan_fragment_is_pending() {
        let mut codec = AisCodec::new();
        assert!(codec.decode(STATIC_PART_2).unwrap().is_none());
        assert_eq!(codec.pending_len(), 0);
    }

    #[test]
    fn test_stale_fragments_are_forgotten() {
        let mut codec = AisCodec::with_fragment_ttl(Duration::from_secs(1));
        let start = Instant::now();
        assert!(codec.decode_at(STATIC_PART_1, start).unwrap().is_none());
        let later = start + Duration::from_secs(2);
        assert!(codec.decode_at(STATIC_PART_2, later).unwrap().is_none());
        assert_eq!(codec.pending_len(), 0);
    }

    #[test]
    fn test_static_data_report_parts() {
        let part_a = decode("!AIVDM,1,1,,B,H52MJh1<D6098DE`D0000000000,2*6C");
        assert_eq!(part_a.kind, PacketKind::StaticDataReport);
        assert_eq!(part_a.fields["PartNumber"], 0);
        assert_eq!(part_a.fields["Name"], "SEA BREEZE");

        let part_b = decode("!AIVDM,1,1,,B,H52MJh4U13B430qG43ijkl104220,0*23");
        let f = &part_b.fields;
        assert_eq!(f["PartNumber"], 1);
        assert_eq!(f["Type"], 37);
        assert_eq!(f["VendorIDName"], "ACR");
        assert_eq!(f["VendorIDSerial"], 12345);
        assert_eq!(f["CallSign"], "WDC1234");
        assert_eq!(f["Dimension"]["A"], 8);
    }

    #[test]
    fn test_base_station_report() {
        let packet = decode("!AIVDM,1,1,,A,403OviQvTo<N5PDVG0MhC0700000,0*7E");
        assert_eq!(packet.kind, PacketKind::BaseStationReport);
        let f = &packet.fields;
        assert_eq!(f["UserID"], 3669702);
        assert_eq!(f["UtcYear"], 2025);
        assert_eq!(f["UtcMonth"], 3);
        assert_eq!(f["UtcSecond"], 5);
        approx(&f["Longitude"], 4.5);
        approx(&f["Latitude"], 52.0);
        assert_eq!(f["FixType"], 7);
    }

    #[test]
    fn test_rejections() {
        let mut codec = AisCodec::new();
        assert!(matches!(
            codec.decode("hello world"),
            Err(CodecError::NotAis(_))
        ));
        assert!(matches!(
            codec.decode("!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*00"),
            Err(CodecError::Checksum { expected: 0, computed: 0x5C })
        ));
        assert!(matches!(
            codec.decode("!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0"),
            Err(CodecError::Malformed(_))
        ));
        assert_eq!(
            codec.decode("!AIVDM,1,1,,A,80000000,0*2E"),
            Err(CodecError::Unsupported(8))
        );
        assert_eq!(
            codec.decode("!AIVDM,1,1,,A,10000000000,0*17"),
            Err(CodecError::TooShort {
                msg_type: 1,
                bits: 66
            })
        );
        assert_eq!(
            codec.decode("!AIVDM,1,1,,A,1X000000,0*4F"),
            Err(CodecError::InvalidPayload('X'))
        );
    }

    fn framed(body: &str) -> String {
        let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
        format!("!{body}*{checksum:02X}")
    }

    #[test]
    fn test_fragment_count_is_bounded() {
        let mut codec = AisCodec::new();
        for total in ["99999999999999", "10", "99999999999999999999999"] {
            let raw = framed(&format!("AIVDM,{total},1,7,A,53aDo802,0"));
            assert!(
                matches!(codec.decode(&raw), Err(CodecError::Malformed(_))),
                "{raw}"
            );
        }
        assert_eq!(codec.pending_len(), 0);

        let raw = framed(&format!("AIVDM,{MAX_FRAGMENTS},1,7,A,53aDo802,0"));
        assert!(codec.decode(&raw).unwrap().is_none());
        assert_eq!(codec.pending_len(), 1);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let packet = decode(&format!("  {POSITION_REPORT}\r\n"));
        assert_eq!(packet.fields["UserID"], 477553000);
    }
}
