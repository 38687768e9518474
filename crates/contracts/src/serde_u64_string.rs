//! Seeds travel as strings over JSON so 64-bit values survive clients
//! that parse numbers as doubles; plain numbers are still accepted.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedRepr {
        Text(String),
        Raw(u64),
    }

    match SeedRepr::deserialize(deserializer)? {
        SeedRepr::Text(raw) => raw.trim().parse::<u64>().map_err(D::Error::custom),
        SeedRepr::Raw(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Seeded {
        #[serde(with = "super")]
        seed: u64,
    }

    #[test]
    fn accepts_string_and_numeric_seeds() {
        let from_text: Seeded = serde_json::from_str(r#"{"seed":"9001"}"#).expect("string seed");
        let from_number: Seeded = serde_json::from_str(r#"{"seed":9001}"#).expect("numeric seed");
        assert_eq!(from_text, from_number);
    }

    #[test]
    fn serializes_as_string() {
        let encoded = serde_json::to_string(&Seeded { seed: u64::MAX }).expect("serialize");
        assert_eq!(encoded, r#"{"seed":"18446744073709551615"}"#);
    }
}
