//! Custom serde deserializers for PubMed XML text nodes

use std::fmt;
use std::result;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Text content of an element that may also carry attributes
///
/// `<PublicationType UI="D016454">Review</PublicationType>` and a bare
/// `<AbstractText>...</AbstractText>` both deserialize to their text. Attribute
/// values are skipped and multiple text chunks are concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct TextContent(pub String);

impl TextContent {
    pub fn trimmed(&self) -> Option<String> {
        let text = self.0.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl<'de> Deserialize<'de> for TextContent {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = TextContent;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("element text content")
            }

            fn visit_str<E>(self, value: &str) -> result::Result<TextContent, E>
            where
                E: de::Error,
            {
                Ok(TextContent(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> result::Result<TextContent, E>
            where
                E: de::Error,
            {
                Ok(TextContent(value))
            }

            fn visit_unit<E>(self) -> result::Result<TextContent, E>
            where
                E: de::Error,
            {
                Ok(TextContent::default())
            }

            fn visit_map<M>(self, mut map: M) -> result::Result<TextContent, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut parts = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == "$text" || key == "$value" {
                        parts.push(map.next_value::<String>()?);
                    } else {
                        let _: IgnoredAny = map.next_value()?;
                    }
                }
                Ok(TextContent(parts.join("")))
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}
