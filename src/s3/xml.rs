//! XML codec for S3 request and response bodies
//!
//! Decoding walks quick-xml events and matches tags as byte slices; encoding
//! writes events directly. Both sides work on UTF-8 byte buffers and build a
//! fresh value, so a failed decode never leaves partial state behind.

use crate::s3::types::{Bucket, BucketListing, CreateBucketConfiguration, ErrorResponse, Owner};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use thiserror::Error;

/// The S3 XML namespace
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Errors produced while encoding or decoding XML entities
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    #[error("unexpected element: expected <{expected}>, found <{found}>")]
    UnexpectedElement {
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of document")]
    UnexpectedEof,

    #[error("empty document")]
    Empty,
}

/// Types that can be written as an S3 XML document
pub trait XmlEncode {
    /// Root element name
    const ROOT: &'static str;

    /// Write the child elements of the root
    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError>;
}

/// Types that can be read from an S3 XML document
pub trait XmlDecode: Sized {
    /// Root element name
    const ROOT: &'static str;

    /// Read the children of the root element. The reader is positioned just
    /// after the root start tag; implementations consume through its end tag.
    fn read_children(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Encode a value as a complete XML document with declaration and namespace
pub fn to_xml<T: XmlEncode>(value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new(T::ROOT).with_attributes([("xmlns", S3_NAMESPACE)]),
    ))?;
    value.write_children(&mut writer)?;
    writer.write_event(Event::End(BytesEnd::new(T::ROOT)))?;

    Ok(buf)
}

/// Decode a complete XML document into `T`, checking the root element name
pub fn from_xml<T: XmlDecode>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() != T::ROOT.as_bytes() {
                    return Err(XmlError::UnexpectedElement {
                        expected: T::ROOT,
                        found: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    });
                }
                return T::read_children(&mut reader);
            }
            Event::Eof => return Err(XmlError::Empty),
            // Declaration, comments, processing instructions
            _ => {}
        }
    }
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Read the text of the current element and consume its end tag
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

/// Skip the current element and all of its children
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth = 1u32;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

impl XmlEncode for CreateBucketConfiguration {
    const ROOT: &'static str = "CreateBucketConfiguration";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        write_text_element(writer, "LocationConstraint", &self.location_constraint)
    }
}

impl XmlDecode for CreateBucketConfiguration {
    const ROOT: &'static str = "CreateBucketConfiguration";

    fn read_children(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = CreateBucketConfiguration::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"LocationConstraint" => config.location_constraint = read_text(reader)?,
                    _ => skip_element(reader)?,
                },
                Event::End(_) => return Ok(config),
                Event::Eof => return Err(XmlError::UnexpectedEof),
                _ => {}
            }
        }
    }
}

impl XmlDecode for ErrorResponse {
    const ROOT: &'static str = "Error";

    fn read_children(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut code = None;
        let mut error = ErrorResponse::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"Code" => code = Some(read_text(reader)?),
                    b"Message" => error.message = read_text(reader)?,
                    b"Resource" => error.resource = Some(read_text(reader)?),
                    b"RequestId" => error.request_id = Some(read_text(reader)?),
                    b"HostId" => error.host_id = Some(read_text(reader)?),
                    _ => skip_element(reader)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(XmlError::UnexpectedEof),
                _ => {}
            }
        }
        error.code = code.ok_or(XmlError::MissingElement("Code"))?;
        Ok(error)
    }
}

impl XmlDecode for BucketListing {
    const ROOT: &'static str = "ListAllMyBucketsResult";

    fn read_children(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut listing = BucketListing::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"Owner" => listing.owner = Some(read_owner(reader)?),
                    b"Buckets" => listing.buckets = read_buckets(reader)?,
                    _ => skip_element(reader)?,
                },
                Event::End(_) => return Ok(listing),
                Event::Eof => return Err(XmlError::UnexpectedEof),
                _ => {}
            }
        }
    }
}

fn read_owner(reader: &mut Reader<&[u8]>) -> Result<Owner, XmlError> {
    let mut owner = Owner::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ID" => owner.id = read_text(reader)?,
                b"DisplayName" => owner.display_name = read_text(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(owner),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn read_buckets(reader: &mut Reader<&[u8]>) -> Result<Vec<Bucket>, XmlError> {
    let mut buckets = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Bucket" => buckets.push(read_bucket(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => return Ok(buckets),
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
}

fn read_bucket(reader: &mut Reader<&[u8]>) -> Result<Bucket, XmlError> {
    let mut name = None;
    let mut bucket = Bucket::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Name" => name = Some(read_text(reader)?),
                b"CreationDate" => bucket.creation_date = read_text(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof),
            _ => {}
        }
    }
    bucket.name = name.ok_or(XmlError::MissingElement("Name"))?;
    Ok(bucket)
}
