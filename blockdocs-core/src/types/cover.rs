//! Cover configuration, mirrored verbatim into `cover.json`

use serde::{Deserialize, Serialize};

/// Declarative description of the synthesized cover
///
/// Percentages are of the canvas width (paddings) or height (vertical offset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverConfig {
    /// Text color (CSS color)
    pub color: String,

    /// Flat CSS color or a `linear-gradient(...)` expression
    pub background: String,

    /// Remote font to load before measuring text
    pub font_url: Option<String>,

    /// Title font size in pixels
    pub font_size: f32,

    /// Left padding, percent of the canvas width
    pub padding_left: f32,

    /// Right padding, percent of the canvas width
    pub padding_right: f32,

    /// Extra vertical offset, percent of the canvas height
    pub vertical_offset: f32,

    /// JPEG used verbatim instead of the synthesized cover
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "base64_serde"
    )]
    pub custom_image: Option<Vec<u8>>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            background: "#ffffff".to_string(),
            font_url: None,
            font_size: 160.0,
            padding_left: 10.0,
            padding_right: 10.0,
            vertical_offset: 0.0,
            custom_image: None,
        }
    }
}

impl CoverConfig {
    /// Set the background fill
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Set the text color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Use a custom JPEG instead of the synthesized cover
    pub fn with_custom_image(mut self, jpeg: Vec<u8>) -> Self {
        self.custom_image = Some(jpeg);
        self
    }

    /// Parse `cover.json`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Render `cover.json`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Base64 serialization for the optional custom cover bytes
mod base64_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cover_json() {
        let value = serde_json::to_value(CoverConfig::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "color": "#000000",
                "background": "#ffffff",
                "fontUrl": null,
                "fontSize": 160.0,
                "paddingLeft": 10.0,
                "paddingRight": 10.0,
                "verticalOffset": 0.0
            })
        );
    }

    #[test]
    fn test_partial_json_is_defaulted() {
        let config = CoverConfig::from_json(r#"{"background": "linear-gradient(#f00, #00f)"}"#)
            .unwrap();
        assert_eq!(config.background, "linear-gradient(#f00, #00f)");
        assert_eq!(config.color, "#000000");
        assert_eq!(config.font_size, 160.0);
    }

    #[test]
    fn test_custom_image_survives_json() {
        let config = CoverConfig::default().with_custom_image(vec![0xff, 0xd8, 0xff]);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"customImage\": \"/9j/\""));
        assert_eq!(CoverConfig::from_json(&json).unwrap(), config);
    }
}
