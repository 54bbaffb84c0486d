//! XML cleanup applied before deserialization

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

fn inline_tag_regex() -> &'static Regex {
    static INLINE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    INLINE_TAG_REGEX.get_or_init(|| {
        Regex::new(r"</?(?:i|b|u|sup|sub|em|strong|italic|bold|underline|sc)(?:\s[^>]*)?>")
            .expect("Failed to compile inline tag regex")
    })
}

/// Strip inline formatting tags (`<i>`, `<sup>`, `<sub>`, `<b>`, ...)
///
/// Titles and abstracts use these for chemical formulas and species names.
/// Left in place they turn a text node into mixed content, which the serde
/// deserializer cannot map onto a string.
///
/// ```ignore
/// let cleaned = strip_inline_html_tags("<AbstractText>C<sub>6</sub>H<sub>6</sub></AbstractText>");
/// assert_eq!(cleaned, "<AbstractText>C6H6</AbstractText>");
/// ```
pub(crate) fn strip_inline_html_tags(xml: &str) -> String {
    let cleaned = inline_tag_regex().replace_all(xml, "");

    if cleaned.len() != xml.len() {
        debug!(
            original_bytes = xml.len(),
            removed_bytes = xml.len() - cleaned.len(),
            "Stripped inline formatting tags"
        );
    }

    cleaned.into_owned()
}
