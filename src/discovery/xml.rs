//! Shared XML helpers for sitemap documents

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::discovery::error::ParseError;

/// Return the local name of the document's root element
///
/// Namespace prefixes are dropped, so `<sm:urlset>` yields `urlset`.
pub(crate) fn root_element_name(xml: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedRoot {
                    expected: "element",
                    found: "an empty document".to_string(),
                });
            }
            _ => {}
        }
    }
}

/// Fail unless the document root is `<expected>`
pub(crate) fn expect_root(xml: &str, expected: &'static str) -> Result<(), ParseError> {
    let found = root_element_name(xml)?;
    if found == expected {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot {
            expected,
            found: format!("<{}>", found),
        })
    }
}

/// Trim a text value, mapping blank text to `None`
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
