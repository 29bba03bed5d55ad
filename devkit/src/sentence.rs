/*!
Générateur de phrases AIVDM pour tests

Écrit les champs bit à bit, arme la charge utile en 6 bits, découpe en fragments
et calcule la somme de contrôle : la sortie passe par le vrai codec du kernel.
*/

/// Accumulateur de bits, poids fort d'abord.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bits: Vec<u8>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint(&mut self, value: u64, len: usize) -> &mut Self {
        for shift in (0..len).rev() {
            self.bits.push(((value >> shift) & 1) as u8);
        }
        self
    }

    pub fn int(&mut self, value: i64, len: usize) -> &mut Self {
        let mask = if len >= 64 { u64::MAX } else { (1u64 << len) - 1 };
        self.uint(value as u64 & mask, len)
    }

    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.uint(u64::from(value), 1)
    }

    /// Texte 6 bits, complété par '@'.
    pub fn text(&mut self, text: &str, len: usize) -> &mut Self {
        let mut chars = text.chars();
        for _ in 0..len / 6 {
            let code = chars.next().unwrap_or('@') as u32;
            let value = if code >= 64 { code - 64 } else { code };
            self.uint(u64::from(value & 0x3f), 6);
        }
        self
    }

    pub fn degrees(&mut self, value: f64, len: usize) -> &mut Self {
        self.int((value * 600_000.0).round() as i64, len)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Charge utile armée + nombre de bits de bourrage.
    pub fn armor(&self) -> (String, usize) {
        let fill = (6 - self.bits.len() % 6) % 6;
        let mut bits = self.bits.clone();
        bits.resize(bits.len() + fill, 0);
        let payload = bits
            .chunks(6)
            .map(|chunk| {
                let value = chunk.iter().fold(0u8, |acc, b| (acc << 1) | b);
                let mut code = value + 48;
                if code > 87 {
                    code += 8;
                }
                char::from(code)
            })
            .collect();
        (payload, fill)
    }
}

pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

pub fn frame(total: usize, index: usize, sequence: &str, channel: char, payload: &str, fill: usize) -> String {
    let body = format!("AIVDM,{total},{index},{sequence},{channel},{payload},{fill}");
    format!("!{body}*{:02X}", checksum(&body))
}

fn header(msg_type: u64, mmsi: u32) -> BitWriter {
    let mut bits = BitWriter::new();
    bits.uint(msg_type, 6).uint(0, 2).uint(u64::from(mmsi), 30);
    bits
}

fn dimension(bits: &mut BitWriter, a: u64, b: u64, c: u64, d: u64) {
    bits.uint(a, 9).uint(b, 9).uint(c, 6).uint(d, 6);
}

/// Phrases valides pour les types de messages que le kernel fusionne.
pub struct SentenceBuilder;

impl SentenceBuilder {
    /// Type 1, classe A. `sog` en nœuds.
    pub fn position_report(mmsi: u32, lat: f64, lon: f64, sog: f64) -> String {
        let mut bits = header(1, mmsi);
        bits.uint(0, 4)
            .int(0, 8)
            .uint((sog * 10.0).round() as u64, 10)
            .flag(true)
            .degrees(lon, 28)
            .degrees(lat, 27)
            .uint(0, 12)
            .uint(511, 9)
            .uint(60, 6)
            .uint(0, 2)
            .uint(0, 3)
            .flag(false)
            .uint(0, 19);
        let (payload, fill) = bits.armor();
        frame(1, 1, "", 'A', &payload, fill)
    }

    /// Type 5 sur deux fragments (séquence `sequence`, canal A).
    pub fn static_voyage(mmsi: u32, call_sign: &str, name: &str, destination: &str, sequence: u8) -> Vec<String> {
        let mut bits = header(5, mmsi);
        bits.uint(0, 2)
            .uint(0, 30)
            .text(call_sign, 42)
            .text(name, 120)
            .uint(70, 8);
        dimension(&mut bits, 100, 20, 10, 12);
        bits.uint(1, 4)
            .uint(6, 4)
            .uint(15, 5)
            .uint(14, 5)
            .uint(30, 6)
            .uint(75, 8)
            .text(destination, 120)
            .flag(false)
            .flag(false);
        let (payload, fill) = bits.armor();
        let (first, second) = payload.split_at(60);
        let sequence = sequence.to_string();
        vec![
            frame(2, 1, &sequence, 'A', first, 0),
            frame(2, 2, &sequence, 'A', second, fill),
        ]
    }

    /// Type 18, classe B.
    pub fn class_b_position(mmsi: u32, lat: f64, lon: f64) -> String {
        let mut bits = header(18, mmsi);
        bits.uint(0, 8)
            .uint(0, 10)
            .flag(true)
            .degrees(lon, 28)
            .degrees(lat, 27)
            .uint(0, 12)
            .uint(511, 9)
            .uint(60, 6)
            .uint(0, 2)
            .uint(0b1011_1000, 8)
            .uint(0, 19);
        let (payload, fill) = bits.armor();
        frame(1, 1, "", 'B', &payload, fill)
    }

    /// Type 24 partie B : porte l'indicatif d'une station classe B.
    pub fn static_data_b(mmsi: u32, call_sign: &str) -> String {
        let mut bits = header(24, mmsi);
        bits.uint(1, 2)
            .uint(37, 8)
            .text("ACR", 18)
            .uint(1, 4)
            .uint(12345, 20)
            .text(call_sign, 42);
        dimension(&mut bits, 8, 4, 2, 2);
        bits.uint(0, 4).uint(0, 2);
        let (payload, fill) = bits.armor();
        frame(1, 1, "", 'B', &payload, fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aisdecode_kernel::codec::ais::AisCodec;
    use aisdecode_kernel::codec::{PacketKind, SentenceCodec};

    #[test]
    fn test_checksum_matches_known_sentence() {
        assert_eq!(checksum("AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0"), 0x5C);
    }

    #[test]
    fn test_armor_matches_known_payload() {
        let mut bits = header(1, 477553000);
        bits.uint(5, 4).int(0, 8).uint(0, 10).flag(false);
        bits.int(-73407500, 28).int(28549700, 27);
        bits.uint(510, 12).uint(181, 9).uint(15, 6).uint(0, 2).uint(0, 3).flag(false).uint(149208, 19);
        assert_eq!(bits.len(), 168);
        assert_eq!(bits.armor(), ("177KQJ5000G?tO`K>RA1wUbN0TKH".to_string(), 0));
    }

    #[test]
    fn test_built_sentences_decode() {
        let mut codec = AisCodec::new();

        let position = SentenceBuilder::position_report(111222333, 10.0, 20.0, 12.3);
        let packet = codec.decode(&position).unwrap().unwrap();
        assert_eq!(packet.kind, PacketKind::PositionReport);
        assert_eq!(packet.fields["UserID"], 111222333);
        assert_eq!(packet.fields["Latitude"], 10.0);
        assert_eq!(packet.fields["Longitude"], 20.0);

        let fragments = SentenceBuilder::static_voyage(111222333, "ABC", "TEST SHIP", "OSLO", 4);
        assert!(codec.decode(&fragments[0]).unwrap().is_none());
        let packet = codec.decode(&fragments[1]).unwrap().unwrap();
        assert_eq!(packet.fields["CallSign"], "ABC");
        assert_eq!(packet.fields["Name"], "TEST SHIP");
        assert_eq!(packet.fields["Destination"], "OSLO");

        let packet = codec.decode(&SentenceBuilder::static_data_b(338000001, "WDC1234")).unwrap().unwrap();
        assert_eq!(packet.kind, PacketKind::StaticDataReport);
        assert_eq!(packet.fields["CallSign"], "WDC1234");

        let packet = codec.decode(&SentenceBuilder::class_b_position(338000001, -33.5, 151.25)).unwrap().unwrap();
        assert_eq!(packet.kind, PacketKind::StandardClassBPositionReport);
        assert_eq!(packet.fields["Latitude"], -33.5);
    }
}
