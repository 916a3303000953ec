use serde::{Deserialize, Serialize};

use super::reference::CodenameReference;

/// One binary asset with its per-language metadata, as stored in the
/// snapshot. The binary payload is base64-encoded on disk so the snapshot
/// stays a plain JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationAsset {
    pub codename: String,
    pub filename: String,
    pub title: String,
    #[serde(with = "binary_base64")]
    pub binary_data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CodenameReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<CodenameReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<AssetDescription>,
}

/// Asset description for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescription {
    pub language: CodenameReference,
    pub description: Option<String>,
}

mod binary_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_data_round_trips_as_base64() {
        let asset = MigrationAsset {
            codename: "logo".to_string(),
            filename: "logo.png".to_string(),
            title: "Logo".to_string(),
            binary_data: vec![0x89, 0x50, 0x4e, 0x47],
            collection: None,
            folder: Some(CodenameReference::new("brand")),
            descriptions: vec![AssetDescription {
                language: CodenameReference::new("en"),
                description: Some("Company logo".to_string()),
            }],
        };

        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["binary_data"], "iVBORw==");

        let back: MigrationAsset = serde_json::from_value(json).unwrap();
        assert_eq!(asset, back);
    }
}
