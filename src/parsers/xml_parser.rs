use crate::domain::model::RawRecord;
use crate::utils::error::{EtlError, Result};
use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const DEFAULT_RECORD_TAG: &str = "item_basic_data";

/// Streams `<record_tag>` elements out of an XML feed, one record at a time.
///
/// Each direct child of a record element becomes one field: the child's tag
/// is the key and the text before its first sub-element is the value.
/// Nothing but the record being assembled is kept in memory.
pub struct XmlRecordReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    record_tag: String,
    current: Option<OpenRecord>,
    finished: bool,
}

struct OpenRecord {
    record: RawRecord,
    depth: usize,
    child: Option<OpenChild>,
}

struct OpenChild {
    name: String,
    text: String,
    // set once a nested element starts; later text is tail text
    sealed: bool,
}

enum Node {
    Open(String),
    Close,
    Empty(String),
    Text(String),
    Eof,
    Skip,
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> EtlError {
    EtlError::XmlError {
        position,
        message: err.to_string(),
    }
}

// follows the encoding named in the XML declaration
fn decode(decoder: Decoder, position: u64, raw: &[u8]) -> Result<String> {
    decoder
        .decode(raw)
        .map(|text| text.into_owned())
        .map_err(|e| xml_error(position, e))
}

impl XmlRecordReader<BufReader<File>> {
    pub fn open(path: &Path, record_tag: &str) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), record_tag))
    }
}

impl<R: BufRead> XmlRecordReader<R> {
    pub fn from_reader(reader: R, record_tag: &str) -> Self {
        let reader = Reader::from_reader(reader);
        Self {
            reader,
            buf: Vec::new(),
            record_tag: record_tag.to_string(),
            current: None,
            finished: false,
        }
    }

    fn next_node(&mut self) -> Result<Node> {
        self.buf.clear();
        let position = self.reader.buffer_position() as u64;
        let event = self.reader.read_event_into(&mut self.buf);
        let decoder = self.reader.decoder();
        let node = match event {
            Ok(Event::Start(e)) => {
                Node::Open(decode(decoder, position, e.local_name().as_ref())?)
            }
            Ok(Event::End(_)) => Node::Close,
            Ok(Event::Empty(e)) => {
                Node::Empty(decode(decoder, position, e.local_name().as_ref())?)
            }
            Ok(Event::Text(t)) => Node::Text(
                t.unescape()
                    .map_err(|e| xml_error(position, e))?
                    .into_owned(),
            ),
            Ok(Event::CData(c)) => Node::Text(decode(decoder, position, &c)?),
            Ok(Event::Eof) => Node::Eof,
            Ok(_) => Node::Skip,
            Err(e) => return Err(xml_error(position, e)),
        };
        Ok(node)
    }

    fn step(&mut self) -> Result<Option<RawRecord>> {
        loop {
            match self.next_node()? {
                Node::Eof => {
                    self.finished = true;
                    if self.current.is_some() {
                        let position = self.reader.buffer_position() as u64;
                        return Err(xml_error(
                            position,
                            format!("document ended inside <{}>", self.record_tag),
                        ));
                    }
                    return Ok(None);
                }
                Node::Open(name) => match self.current.as_mut() {
                    None => {
                        if name == self.record_tag {
                            self.current = Some(OpenRecord {
                                record: RawRecord::new(),
                                depth: 0,
                                child: None,
                            });
                        }
                    }
                    Some(open) => {
                        open.depth += 1;
                        if open.depth == 1 {
                            open.child = Some(OpenChild {
                                name,
                                text: String::new(),
                                sealed: false,
                            });
                        } else if let Some(child) = open.child.as_mut() {
                            child.sealed = true;
                        }
                    }
                },
                Node::Empty(name) => match self.current.as_mut() {
                    None => {
                        if name == self.record_tag {
                            return Ok(Some(RawRecord::new()));
                        }
                    }
                    Some(open) => {
                        if open.depth == 0 {
                            // an empty child overrides an earlier value
                            open.record.data.remove(&name);
                        } else if let Some(child) = open.child.as_mut() {
                            child.sealed = true;
                        }
                    }
                },
                Node::Text(text) => {
                    if let Some(open) = self.current.as_mut() {
                        if open.depth == 1 {
                            if let Some(child) = open.child.as_mut().filter(|c| !c.sealed) {
                                child.text.push_str(&text);
                            }
                        }
                    }
                }
                Node::Close => {
                    let Some(open) = self.current.as_mut() else {
                        continue;
                    };
                    if open.depth == 0 {
                        let finished = self.current.take().map(|open| open.record);
                        return Ok(finished);
                    }
                    if open.depth == 1 {
                        if let Some(child) = open.child.take() {
                            // pieces are joined raw and trimmed once here
                            let text = child.text.trim();
                            if text.is_empty() {
                                open.record.data.remove(&child.name);
                            } else {
                                open.record.insert(child.name, text);
                            }
                        }
                    }
                    open.depth -= 1;
                }
                Node::Skip => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlRecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
