use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::HexFlakeId;

impl Serialize for HexFlakeId {
    /// Serializes as the 32-character lowercase hex string.
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        as_hex::serialize(self, s)
    }
}

impl<'de> Deserialize<'de> for HexFlakeId {
    /// Deserializes from a 32-character hex string (either case).
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        as_hex::deserialize(d)
    }
}

pub mod as_hex {
    use super::{Deserializer, Serializer};
    use crate::HexFlakeId;

    /// Serialize an ID as its 32-character lowercase hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &HexFlakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut buf = [0_u8; HexFlakeId::HEX_SIZE];
        id.encode_hex_into(&mut buf);
        let hex = core::str::from_utf8(&buf).map_err(serde::ser::Error::custom)?;
        s.serialize_str(hex)
    }

    /// Deserialize an ID from its hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not 32 characters long
    /// - The string contains a non-hex character
    pub fn deserialize<'de, D>(d: D) -> Result<HexFlakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HexVisitor;

        impl serde::de::Visitor<'_> for HexVisitor {
            type Value = HexFlakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a 32-character hex encoded ID")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                HexFlakeId::decode_hex(v).map_err(serde::de::Error::custom)
            }
        }

        d.deserialize_str(HexVisitor)
    }
}

pub mod as_native {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::HexFlakeId;

    /// Serialize an ID as its raw 128-bit integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &HexFlakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize an ID from its raw 128-bit integer. Every value is valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails.
    pub fn deserialize<'de, D>(d: D) -> Result<HexFlakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        u128::deserialize(d).map(HexFlakeId::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_impl_is_hex() {
        let id = HexFlakeId::from(1_700_000_000_000, 0x0102_0304_05, 8);
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, json!(id.to_hex()));

        let back: HexFlakeId = serde_json::from_value(value).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn hex_field_roundtrip() {
        #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
        struct Row {
            #[serde(with = "as_hex")]
            id: HexFlakeId,
        }

        let row = Row {
            id: HexFlakeId::from(42, 0xAABB_CCDD_EEFF, 3),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"00000000002a0000aabbccddeeff0003"}"#);
        assert_eq!(serde_json::from_str::<Row>(&json).unwrap(), row);
    }

    #[test]
    fn native_field_roundtrip() {
        #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
        struct Row {
            #[serde(with = "as_native")]
            id: HexFlakeId,
        }

        let row = Row {
            id: HexFlakeId::from_raw(42),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":42}"#);
        assert_eq!(serde_json::from_str::<Row>(&json).unwrap(), row);
    }

    #[test]
    fn rejects_malformed_hex() {
        let err = serde_json::from_value::<HexFlakeId>(json!("abc")).unwrap_err();
        assert!(err.to_string().contains("invalid hex ID length"));

        let err = serde_json::from_value::<HexFlakeId>(json!(42)).unwrap_err();
        assert!(err.to_string().contains("hex encoded ID"));
    }
}
