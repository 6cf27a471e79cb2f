//! Streaming element reader and record decoder.
//!
//! [`RecordReader`] pulls a forward-only sequence of structural events from a
//! byte stream with `quick-xml` and decodes each `<record>` element into a
//! [`Record`] without ever materializing the whole document. The event buffer
//! is reused across pulls, so steady-state memory is bounded by the largest
//! single element, not the document size.
//!
//! The decoder consumes exactly the events belonging to one `record` element.
//! A shape mismatch (missing `<name>` or `<value>` child) yields a non-fatal
//! [`DecodeError`]; any well-formedness problem in the underlying stream is a
//! fatal [`IngestError::MalformedXml`]. Extra attributes and unknown child
//! elements are ignored.
//!
//! The reader owns the input stream and releases it on drop, on every exit
//! path.

use crate::error::{DecodeError, IngestError};
use crate::record::Record;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Outcome of scanning for the next `record` element-start.
enum Scan {
    /// Something other than a record boundary; keep scanning.
    Skip,
    /// `<record>` with children follows.
    RecordStart,
    /// Self-closing `<record/>`; nothing to decode.
    RecordEmpty,
    /// End of document.
    Eof,
}

/// Which child of the current record we are capturing text for.
#[derive(Clone, Copy, PartialEq)]
enum Field {
    Name,
    Value,
}

/// Forward-only reader yielding one decoded record per `<record>` element.
///
/// Non-restartable: once [`next_record`](RecordReader::next_record) returns
/// `Ok(None)` the underlying stream is exhausted.
pub struct RecordReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl RecordReader<BufReader<File>> {
    /// Open `path` and read records from it through a buffered reader.
    ///
    /// The file handle is released when the reader is dropped, whether the
    /// ingestion finished, skipped out of the decode loop, or aborted on a
    /// fatal parse error.
    ///
    /// # Errors
    /// Returns [`IngestError::Open`] if the file cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap an already-open byte stream.
    pub fn new(input: R) -> Self {
        Self { reader: Reader::from_reader(input), buf: Vec::new() }
    }

    /// Advance to the next `record` element and decode it.
    ///
    /// Returns:
    /// - `Ok(Some(Ok(record)))` — a well-shaped record;
    /// - `Ok(Some(Err(decode)))` — the element was seen but did not decode;
    ///   the reader has already advanced past it and the next call continues
    ///   with the following element;
    /// - `Ok(None)` — end of document;
    /// - `Err(fatal)` — the stream is not well-formed XML. The reader must
    ///   not be used again afterwards.
    pub fn next_record(
        &mut self,
    ) -> Result<Option<Result<Record, DecodeError>>, IngestError> {
        loop {
            let scan = {
                self.buf.clear();
                match self.reader.read_event_into(&mut self.buf) {
                    Err(err) => {
                        return Err(IngestError::malformed(
                            self.reader.buffer_position() as u64,
                            err,
                        ));
                    }
                    Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"record" => {
                        Scan::RecordStart
                    }
                    Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"record" => {
                        Scan::RecordEmpty
                    }
                    Ok(Event::Eof) => Scan::Eof,
                    Ok(_) => Scan::Skip,
                }
            };
            match scan {
                Scan::Skip => continue,
                Scan::RecordStart => return self.decode_record().map(Some),
                Scan::RecordEmpty => return Ok(Some(Err(DecodeError::MissingName))),
                Scan::Eof => return Ok(None),
            }
        }
    }

    /// Consume the events of one `record` element (the start tag has already
    /// been read) and build a [`Record`] from its `name`/`value` children.
    fn decode_record(&mut self) -> Result<Result<Record, DecodeError>, IngestError> {
        let mut name: Option<String> = None;
        let mut value: Option<String> = None;
        // Which direct child we are inside, and how deep below <record> we are.
        let mut capture: Option<Field> = None;
        let mut depth = 0u32;

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    return Err(IngestError::malformed(
                        self.reader.buffer_position() as u64,
                        err,
                    ));
                }
            };
            match event {
                Event::Start(ref e) => {
                    capture = if depth == 0 {
                        match e.local_name().as_ref() {
                            b"name" => {
                                name.get_or_insert_with(String::new);
                                Some(Field::Name)
                            }
                            b"value" => {
                                value.get_or_insert_with(String::new);
                                Some(Field::Value)
                            }
                            _ => None,
                        }
                    } else {
                        // Mixed content under <name>/<value> is not captured.
                        None
                    };
                    depth += 1;
                }
                Event::Empty(ref e) => {
                    if depth == 0 {
                        match e.local_name().as_ref() {
                            b"name" => {
                                name.get_or_insert_with(String::new);
                            }
                            b"value" => {
                                value.get_or_insert_with(String::new);
                            }
                            _ => {}
                        }
                    }
                }
                Event::Text(ref e) => {
                    if depth == 1 {
                        if let Some(field) = capture {
                            let text = match e.unescape() {
                                Ok(text) => text,
                                Err(err) => {
                                    return Err(IngestError::malformed(
                                        self.reader.buffer_position() as u64,
                                        err,
                                    ));
                                }
                            };
                            match field {
                                Field::Name => push_text(&mut name, &text),
                                Field::Value => push_text(&mut value, &text),
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if depth == 1 {
                        if let Some(field) = capture {
                            let bytes = e.into_inner();
                            let text = match std::str::from_utf8(&bytes) {
                                Ok(text) => text,
                                Err(err) => {
                                    return Err(IngestError::malformed(
                                        self.reader.buffer_position() as u64,
                                        err,
                                    ));
                                }
                            };
                            match field {
                                Field::Name => push_text(&mut name, text),
                                Field::Value => push_text(&mut value, text),
                            }
                        }
                    }
                }
                Event::End(_) => {
                    if depth == 0 {
                        // </record>
                        break;
                    }
                    depth -= 1;
                    if depth == 0 {
                        capture = None;
                    }
                }
                Event::Eof => {
                    return Err(IngestError::malformed(
                        self.reader.buffer_position() as u64,
                        "unexpected end of document inside record element",
                    ));
                }
                _ => {}
            }
        }

        Ok(match (name, value) {
            (Some(name), Some(value)) => Ok(Record { name, value }),
            (None, _) => Err(DecodeError::MissingName),
            (_, None) => Err(DecodeError::MissingValue),
        })
    }
}

fn push_text(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(xml: &str) -> Vec<Result<Record, DecodeError>> {
        let mut reader = RecordReader::new(xml.as_bytes());
        let mut out = Vec::new();
        while let Some(decoded) = reader.next_record().expect("well-formed input") {
            out.push(decoded);
        }
        out
    }

    #[test]
    fn decodes_a_flat_record_list() {
        let out = read_all(
            "<records>\
               <record><name>a</name><value>1</value></record>\
               <record><name>b</name><value>2</value></record>\
             </records>",
        );
        assert_eq!(
            out,
            vec![Ok(Record::new("a", "1")), Ok(Record::new("b", "2"))]
        );
    }

    #[test]
    fn empty_document_yields_no_records() {
        assert!(read_all("<records></records>").is_empty());
    }

    #[test]
    fn extra_attributes_and_elements_are_ignored() {
        let out = read_all(
            "<records>\
               <record id=\"7\"><meta>x</meta><name>a</name><value>1</value><extra/></record>\
             </records>",
        );
        assert_eq!(out, vec![Ok(Record::new("a", "1"))]);
    }

    #[test]
    fn missing_value_is_a_decode_error_not_a_fatal_one() {
        let out = read_all(
            "<records>\
               <record><name>a</name></record>\
               <record><name>b</name><value>2</value></record>\
             </records>",
        );
        assert_eq!(
            out,
            vec![Err(DecodeError::MissingValue), Ok(Record::new("b", "2"))]
        );
    }

    #[test]
    fn self_closing_record_is_skipped() {
        let out = read_all("<records><record/></records>");
        assert_eq!(out, vec![Err(DecodeError::MissingName)]);
    }

    #[test]
    fn empty_children_decode_to_empty_strings() {
        let out = read_all(
            "<records><record><name></name><value/></record></records>",
        );
        assert_eq!(out, vec![Ok(Record::new("", ""))]);
    }

    #[test]
    fn entities_and_cdata_are_resolved() {
        let out = read_all(
            "<records>\
               <record><name>a&amp;b</name><value><![CDATA[<raw>]]></value></record>\
             </records>",
        );
        assert_eq!(out, vec![Ok(Record::new("a&b", "<raw>"))]);
    }

    #[test]
    fn unterminated_tag_is_fatal() {
        let mut reader =
            RecordReader::new("<records><record><name>a</name>".as_bytes());
        let err = loop {
            match reader.next_record() {
                Ok(Some(_)) => {}
                Ok(None) => panic!("expected a malformed-xml error"),
                Err(err) => break err,
            }
        };
        assert!(matches!(err, IngestError::MalformedXml { .. }));
    }

    #[test]
    fn mismatched_close_tag_is_fatal() {
        let mut reader = RecordReader::new(
            "<records><record><name>a</name><value>1</wrong></record></records>".as_bytes(),
        );
        let err = loop {
            match reader.next_record() {
                Ok(Some(_)) => {}
                Ok(None) => panic!("expected a malformed-xml error"),
                Err(err) => break err,
            }
        };
        assert!(matches!(err, IngestError::MalformedXml { .. }));
    }
}
