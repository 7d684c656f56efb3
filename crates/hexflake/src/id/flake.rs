use core::{fmt, str::FromStr};

use crate::{
    Error, Result,
    id::hex::{decode_hex, encode_hex},
};

/// A 128-bit Snowflake-style ID rendered as 32 lowercase hex characters.
///
/// - 48 bits timestamp (ms since the clock's epoch)
/// - 64 bits machine ID (a 48-bit hardware address, zero-extended)
/// - 16 bits sequence
///
/// ```text
///  Byte Index:  0            5 6                  13 14         15
///              +--------------+---------------------+-------------+
///  Field:      | timestamp(48)|   machine ID (64)   | sequence(16)|
///              +--------------+---------------------+-------------+
///              |<----- MSB -------- 128 bits -------- LSB ------->|
/// ```
///
/// All fields are stored big-endian, so byte order, numeric order and
/// `(timestamp, machine_id, sequence)` order agree.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexFlakeId {
    id: u128,
}

impl HexFlakeId {
    /// Size of the binary encoding, in bytes.
    pub const SIZE: usize = 16;

    /// Size of the hex encoding, in characters.
    pub const HEX_SIZE: usize = Self::SIZE * 2;

    /// Bitmask for the 48-bit timestamp field. Occupies bits 80 through 127.
    pub const TIMESTAMP_MASK: u128 = (1 << 48) - 1;

    /// Bitmask for the 64-bit machine ID field. Occupies bits 16 through 79.
    pub const MACHINE_ID_MASK: u128 = (1 << 64) - 1;

    /// Bitmask for the 16-bit sequence field. Occupies bits 0 through 15.
    pub const SEQUENCE_MASK: u128 = (1 << 16) - 1;

    /// Number of bits to shift the timestamp to its position (bit 80).
    pub const TIMESTAMP_SHIFT: u128 = 80;

    /// Number of bits to shift the machine ID to its position (bit 16).
    pub const MACHINE_ID_SHIFT: u128 = 16;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u128 = 0;

    /// Packs the three fields into an ID.
    ///
    /// Only the low 48 bits of `timestamp` are kept. This never fails.
    pub const fn from(timestamp: u64, machine_id: u64, sequence: u16) -> Self {
        let timestamp = (timestamp as u128 & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_id = (machine_id as u128 & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        let sequence = (sequence as u128 & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_id | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        ((self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK) as u64
    }

    /// Extracts the machine ID from the packed ID.
    pub const fn machine_id(&self) -> u64 {
        ((self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK) as u64
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u16 {
        ((self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK) as u16
    }

    /// Largest timestamp the layout can hold.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK as u64
    }

    /// Largest sequence value the layout can hold.
    pub const fn max_sequence() -> u16 {
        Self::SEQUENCE_MASK as u16
    }

    /// Returns the raw 128-bit value.
    pub const fn to_raw(&self) -> u128 {
        self.id
    }

    /// Wraps a raw 128-bit value. Every `u128` is a valid ID.
    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw }
    }

    /// Returns the canonical 16-byte big-endian encoding.
    pub const fn encode(&self) -> [u8; Self::SIZE] {
        self.id.to_be_bytes()
    }

    /// Rebuilds an ID from its 16-byte big-endian encoding.
    pub const fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self::from_raw(u128::from_be_bytes(bytes))
    }

    /// Writes the 32-character lowercase hex encoding into a stack buffer.
    pub fn encode_hex_into(&self, buf: &mut [u8; Self::HEX_SIZE]) {
        encode_hex(&self.encode(), buf);
    }

    /// Returns the 32-character lowercase hex encoding.
    ///
    /// # Example
    ///
    /// ```
    /// use hexflake::HexFlakeId;
    ///
    /// let id = HexFlakeId::from(1, 0x0102_0304_0506, 2);
    /// assert_eq!(id.to_hex(), "00000000000100000102030405060002");
    /// ```
    pub fn to_hex(&self) -> String {
        let mut buf = [0_u8; Self::HEX_SIZE];
        self.encode_hex_into(&mut buf);
        // The alphabet is ASCII, so every byte maps to one char.
        buf.iter().map(|&b| char::from(b)).collect()
    }

    /// Parses a 32-character hex encoding (either case).
    ///
    /// # Errors
    ///
    /// - [`Error::DecodeInvalidLen`] if the input is not 32 bytes long
    /// - [`Error::DecodeInvalidAscii`] if it contains a non-hex byte
    pub fn decode_hex(encoded: &str) -> Result<Self> {
        decode_hex(encoded, Self::HEX_SIZE).map(Self::from_raw)
    }
}

impl FromStr for HexFlakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode_hex(s)
    }
}

impl From<[u8; HexFlakeId::SIZE]> for HexFlakeId {
    fn from(bytes: [u8; HexFlakeId::SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<HexFlakeId> for [u8; HexFlakeId::SIZE] {
    fn from(id: HexFlakeId) -> Self {
        id.encode()
    }
}

impl fmt::Display for HexFlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0_u8; Self::HEX_SIZE];
        self.encode_hex_into(&mut buf);
        f.write_str(core::str::from_utf8(&buf).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for HexFlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HexFlakeId")
            .field("hex", &format_args!("{self}"))
            .field("timestamp", &self.timestamp())
            .field("machine_id", &format_args!("{:#014x}", self.machine_id()))
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_land_in_documented_bytes() {
        let id = HexFlakeId::from(0x0A0B_0C0D_0E0F, 0x1112_1314_1516_1718, 0x2122);
        assert_eq!(
            id.encode(),
            [
                0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // timestamp
                0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, // machine id
                0x21, 0x22, // sequence
            ]
        );
        assert_eq!(id.to_hex(), "0a0b0c0d0e0f11121314151617182122");
    }

    #[test]
    fn mac_sized_machine_id_is_zero_extended() {
        let id = HexFlakeId::from(0, 0x0102_0304_0506, 0);
        assert_eq!(&id.encode()[6..14], &[0, 0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn timestamp_keeps_low_48_bits() {
        let id = HexFlakeId::from(u64::MAX, 0, 0);
        assert_eq!(id.timestamp(), HexFlakeId::max_timestamp());
        assert_eq!(id.machine_id(), 0);
        assert_eq!(id.sequence(), 0);

        let id = HexFlakeId::from((1 << 48) | 7, 0, 0);
        assert_eq!(id.timestamp(), 7);
    }

    #[test]
    fn fields_and_bounds() {
        let ts = HexFlakeId::max_timestamp();
        let mid = u64::MAX;
        let seq = HexFlakeId::max_sequence();

        let id = HexFlakeId::from(ts, mid, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.machine_id(), mid);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), u128::MAX);
        assert_eq!(id.to_hex(), "f".repeat(32));
    }

    #[test]
    fn decode_recovers_fields() {
        let id = HexFlakeId::from(1_700_000_000_123, 0x00AA_BBCC_DDEE, 513);

        let from_bytes = HexFlakeId::from_bytes(id.encode());
        assert_eq!(from_bytes, id);

        let from_hex = HexFlakeId::decode_hex(&id.to_hex()).unwrap();
        assert_eq!(from_hex.timestamp(), 1_700_000_000_123);
        assert_eq!(from_hex.machine_id(), 0x00AA_BBCC_DDEE);
        assert_eq!(from_hex.sequence(), 513);

        let upper = id.to_hex().to_ascii_uppercase();
        assert_eq!(upper.parse::<HexFlakeId>().unwrap(), id);
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(
            HexFlakeId::decode_hex("abcd").unwrap_err(),
            Error::DecodeInvalidLen { len: 4 }
        );
        let bad = format!("{}z", "0".repeat(31));
        assert_eq!(
            bad.parse::<HexFlakeId>().unwrap_err(),
            Error::DecodeInvalidAscii {
                byte: b'z',
                index: 31
            }
        );
    }

    #[test]
    fn display_matches_to_hex() {
        let id = HexFlakeId::from(42, 0x0102_0304_05, 8);
        assert_eq!(id.to_string(), id.to_hex());
        assert_eq!(id.to_string().len(), HexFlakeId::HEX_SIZE);
    }

    #[test]
    fn debug_shows_fields() {
        let id = HexFlakeId::from(42, 0x0102_0304_05, 8);
        let dbg = format!("{id:?}");
        assert!(dbg.contains("timestamp: 42"));
        assert!(dbg.contains("machine_id: 0x000102030405"));
        assert!(dbg.contains("sequence: 8"));
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = HexFlakeId::from(10, 5, 65535);
        let b = HexFlakeId::from(11, 5, 1);
        let c = HexFlakeId::from(11, 5, 2);
        assert!(a < b && b < c);
        assert!(a.to_hex() < b.to_hex() && b.to_hex() < c.to_hex());
    }

    #[test]
    fn consecutive_sequences_differ_only_in_last_four_chars() {
        let machine_id = 0x01_0203_0405;
        let hexes: Vec<String> = (8..=10)
            .map(|seq| HexFlakeId::from(1_700_000_000_000, machine_id, seq).to_hex())
            .collect();

        let prefix = &hexes[0][..28];
        for hex in &hexes {
            assert_eq!(&hex[..28], prefix);
        }
        assert_eq!(&hexes[0][28..], "0008");
        assert_eq!(&hexes[1][28..], "0009");
        assert_eq!(&hexes[2][28..], "000a");
    }
}
