//! Product sitemap parsing
//!
//! Product sitemaps carry Google image extension children
//! (`<image:image><image:loc/><image:title/></image:image>`). Elements are
//! matched by local name, so the image fields are found whatever prefix the
//! document binds to the image namespace.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::discovery::error::ParseError;
use crate::discovery::xml::{expect_root, non_blank};
use crate::discovery::{ProductImage, ProductRecord};

/// Element whose text is currently being collected
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Location,
    ImageLocation,
    ImageTitle,
}

/// Parse every `<url>` entry of a product sitemap, in document order
///
/// An entry without `<loc>` is kept with `location: None` so positions stay
/// aligned with the source document.
pub fn parse_products(xml: &str) -> Result<Vec<ProductRecord>, ParseError> {
    expect_root(xml, "urlset")?;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut record: Option<ProductRecord> = None;
    let mut image: Option<ProductImage> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match (stack.len(), name.as_str()) {
                    (1, "url") => record = Some(ProductRecord::default()),
                    (2, "loc") if record.is_some() => field = Some(Field::Location),
                    (2, "image") if record.is_some() => image = Some(ProductImage::default()),
                    (3, "loc") if image.is_some() => field = Some(Field::ImageLocation),
                    (3, "title") if image.is_some() => field = Some(Field::ImageTitle),
                    _ => {}
                }
                text.clear();
                stack.push(name);
            }
            Event::Empty(e) => match (stack.len(), e.local_name().as_ref()) {
                (1, b"url") => records.push(ProductRecord::default()),
                (2, b"image") => {
                    if let Some(record) = record.as_mut() {
                        record.images.push(ProductImage::default());
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if field.is_some() {
                    text.push_str(
                        &e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?,
                    );
                }
            }
            Event::CData(e) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                match (field.take(), name.as_str()) {
                    (Some(Field::Location), _) => {
                        if let Some(record) = record.as_mut() {
                            record.location = non_blank(&text);
                        }
                    }
                    (Some(Field::ImageLocation), _) => {
                        if let Some(image) = image.as_mut() {
                            image.url = non_blank(&text);
                        }
                    }
                    (Some(Field::ImageTitle), _) => {
                        if let Some(image) = image.as_mut() {
                            image.title = non_blank(&text);
                        }
                    }
                    (None, "image") if stack.len() == 2 => {
                        if let (Some(record), Some(image)) = (record.as_mut(), image.take()) {
                            record.images.push(image);
                        }
                    }
                    (None, "url") if stack.len() == 1 => {
                        if let Some(record) = record.take() {
                            records.push(record);
                        }
                    }
                    _ => {}
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml(format!(
            "document ended inside <{}>",
            stack.join("> <")
        )));
    }

    if records.is_empty() {
        return Err(ParseError::MissingElement("urlset/url"));
    }

    debug!("Parsed {} product entries", records.len());
    Ok(records)
}
