use std::collections::BTreeMap;
use std::str::FromStr;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::elements::{LonLat, LonLatRect};
use crate::utils::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub val: String,
}

impl Tag {
    pub fn new(key: String, val: String) -> Tag {
        Tag { key, val }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsmWay {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Vec<Tag>,
}

impl OsmWay {
    pub fn new(id: i64) -> OsmWay {
        OsmWay {
            id,
            refs: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.iter().any(|t| t.key == key)
    }

    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.val.as_str())
    }
}

/// The parts of an OSM XML document used for tile geometry: node locations,
/// ways with their node refs and tags, and the optional bounds element.
/// Relations are skipped.
#[derive(Debug, Default)]
pub struct OsmDocument {
    pub bounds: Option<LonLatRect>,
    pub nodes: BTreeMap<i64, LonLat>,
    pub ways: Vec<OsmWay>,
}

fn get_value(kv: &Attribute) -> Result<String> {
    Ok(kv.unescape_value()?.into_owned())
}

fn parse_value<T: FromStr>(what: &str, val: &str) -> Result<T> {
    match val.parse() {
        Ok(v) => Ok(v),
        Err(_) => Err(Error::XmlDataError(format!(
            "{} attribute is not a number: {:?}",
            what, val
        ))),
    }
}

fn all_whitespace(s: &[u8]) -> bool {
    s.iter().all(|c| c.is_ascii_whitespace())
}

fn read_bounds(e: &BytesStart) -> Result<LonLatRect> {
    let mut vals: [Option<f64>; 4] = [None; 4];
    for a in e.attributes() {
        let kv = a?;
        let slot = match kv.key.as_ref() {
            b"minlon" => 0,
            b"minlat" => 1,
            b"maxlon" => 2,
            b"maxlat" => 3,
            _ => continue,
        };
        vals[slot] = Some(parse_value("bounds", &get_value(&kv)?)?);
    }
    match vals {
        [Some(minlon), Some(minlat), Some(maxlon), Some(maxlat)] => {
            Ok(LonLatRect::new(minlon, minlat, maxlon, maxlat))
        }
        _ => Err(Error::XmlDataError(String::from(
            "bounds element missing one of minlon, minlat, maxlon, maxlat",
        ))),
    }
}

fn read_node(e: &BytesStart) -> Result<(i64, LonLat)> {
    let mut id: Option<i64> = None;
    let mut lon: Option<f64> = None;
    let mut lat: Option<f64> = None;
    for a in e.attributes() {
        let kv = a?;
        match kv.key.as_ref() {
            b"id" => {
                id = Some(parse_value("node id", &get_value(&kv)?)?);
            }
            b"lon" => {
                lon = Some(parse_value("node lon", &get_value(&kv)?)?);
            }
            b"lat" => {
                lat = Some(parse_value("node lat", &get_value(&kv)?)?);
            }
            _ => {}
        }
    }
    match (id, lon, lat) {
        (Some(id), Some(lon), Some(lat)) => Ok((id, LonLat::new(lon, lat))),
        (Some(id), _, _) => Err(Error::XmlDataError(format!(
            "node {} has no location",
            id
        ))),
        _ => Err(Error::XmlDataError(String::from("node missing id"))),
    }
}

fn read_tag(e: &BytesStart) -> Result<Tag> {
    let mut k: Option<String> = None;
    let mut v: Option<String> = None;

    for a in e.attributes() {
        let kv = a?;
        match kv.key.as_ref() {
            b"k" => {
                k = Some(get_value(&kv)?);
            }
            b"v" => {
                v = Some(get_value(&kv)?);
            }
            _ => {}
        }
    }

    match (k, v) {
        (Some(k), Some(v)) => Ok(Tag::new(k, v)),
        (None, _) => Err(Error::XmlDataError("tag missing key".to_string())),
        (Some(k), None) => Err(Error::XmlDataError(format!(
            "tag missing val [key={}]",
            k
        ))),
    }
}

fn read_ref(e: &BytesStart) -> Result<i64> {
    for a in e.attributes() {
        let kv = a?;
        if kv.key.as_ref() == b"ref" {
            return parse_value("nd ref", &get_value(&kv)?);
        }
    }
    Err(Error::XmlDataError("nd without ref attribute".to_string()))
}

fn read_way_header(e: &BytesStart) -> Result<OsmWay> {
    for a in e.attributes() {
        let kv = a?;
        if kv.key.as_ref() == b"id" {
            return Ok(OsmWay::new(parse_value("way id", &get_value(&kv)?)?));
        }
    }
    Err(Error::XmlDataError("way missing id".to_string()))
}

fn read_way_children(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>, w: &mut OsmWay) -> Result<()> {
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Empty(ref e) => match e.name().as_ref() {
                b"tag" => {
                    w.tags.push(read_tag(e)?);
                }
                b"nd" => {
                    w.refs.push(read_ref(e)?);
                }
                _ => {}
            },
            Event::Start(ref e) => {
                // e.g. <nd> with inline geometry children
                let name = e.name().as_ref().to_vec();
                if name.as_slice() == b"nd" {
                    w.refs.push(read_ref(e)?);
                }
                let mut skip = Vec::new();
                reader.read_to_end_into(QName(&name), &mut skip)?;
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"way" {
                    return Ok(());
                }
                return Err(Error::XmlDataError(format!(
                    "unexpected end {} inside way {}",
                    String::from_utf8_lossy(e.name().as_ref()),
                    w.id
                )));
            }
            Event::Eof => {
                return Err(Error::XmlDataError(format!(
                    "document ended inside way {}",
                    w.id
                )));
            }
            _ => {}
        }
    }
}

fn read_remark(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Text(e) => {
                text.push_str(&e.unescape()?);
            }
            Event::End(_) | Event::Eof => {
                return Ok(text.trim().to_string());
            }
            _ => {}
        }
    }
}

/// Reads an OSM XML document (as served by the OSM API or Overpass).
pub fn read_osm_xml(data: &[u8]) -> Result<OsmDocument> {
    let mut res = OsmDocument::default();

    let mut reader = Reader::from_reader(data);

    let mut buf = Vec::new();
    let mut buf2 = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"osm" => {
                    seen_root = true;
                }
                b"bounds" => {
                    res.bounds = Some(read_bounds(e)?);
                    reader.read_to_end_into(QName(b"bounds"), &mut buf2)?;
                }
                b"node" => {
                    let (id, ll) = read_node(e)?;
                    res.nodes.insert(id, ll);
                    reader.read_to_end_into(QName(b"node"), &mut buf2)?;
                }
                b"way" => {
                    let mut w = read_way_header(e)?;
                    read_way_children(&mut reader, &mut buf2, &mut w)?;
                    res.ways.push(w);
                }
                b"remark" => {
                    let remark = read_remark(&mut reader, &mut buf2)?;
                    if remark.contains("error") {
                        return Err(Error::XmlDataError(format!(
                            "server reported: {}",
                            remark
                        )));
                    }
                }
                n => {
                    let name = n.to_vec();
                    reader.read_to_end_into(QName(&name), &mut buf2)?;
                }
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"osm" => {
                    seen_root = true;
                }
                b"bounds" => {
                    res.bounds = Some(read_bounds(e)?);
                }
                b"node" => {
                    let (id, ll) = read_node(e)?;
                    res.nodes.insert(id, ll);
                }
                b"way" => {
                    res.ways.push(read_way_header(e)?);
                }
                _ => {}
            },
            Ok(Event::End(_)) => {}

            Ok(Event::Eof) => {
                break;
            }

            Ok(Event::Text(e)) => {
                if !all_whitespace(&e) {
                    return Err(Error::XmlDataError(format!(
                        "unexpected text at {}",
                        reader.buffer_position()
                    )));
                }
            }
            Ok(_) => {}

            Err(e) => {
                return Err(Error::XmlDataError(format!(
                    "Error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
        buf2.clear();
    }
    if !seen_root {
        return Err(Error::XmlDataError(String::from("no osm root element")));
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="Overpass API">
  <note>The data included in this document is from www.openstreetmap.org.</note>
  <meta osm_base="2024-01-01T00:00:00Z"/>
  <bounds minlat="35.5" minlon="139.7" maxlat="35.7" maxlon="139.8"/>
  <node id="1" lat="35.60" lon="139.75" version="2"/>
  <node id="2" lat="35.61" lon="139.76">
    <tag k="amenity" v="bench"/>
  </node>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="footway"/>
    <tag k="name" v="Fish &amp; Chips Lane"/>
  </way>
  <way id="11"/>
  <relation id="100">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>"#;

    #[test]
    fn test_read_small_document() {
        let doc = read_osm_xml(SMALL.as_bytes()).unwrap();
        assert_eq!(doc.bounds, Some(LonLatRect::new(139.7, 35.5, 139.8, 35.7)));
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[&2], LonLat::new(139.76, 35.61));

        assert_eq!(doc.ways.len(), 2);
        let w = &doc.ways[0];
        assert_eq!(w.id, 10);
        assert_eq!(w.refs, vec![1, 2]);
        assert_eq!(w.get_tag("highway"), Some("footway"));
        assert_eq!(w.get_tag("name"), Some("Fish & Chips Lane"));
        assert!(!w.has_tag("building"));
        assert!(doc.ways[1].refs.is_empty());
    }

    #[test]
    fn test_missing_bounds_is_not_an_error_here() {
        let doc = read_osm_xml(b"<osm><node id=\"1\" lat=\"1\" lon=\"2\"/></osm>").unwrap();
        assert!(doc.bounds.is_none());
        assert_eq!(doc.nodes[&1], LonLat::new(2.0, 1.0));
    }

    #[test]
    fn test_bad_documents() {
        assert!(read_osm_xml(b"<osm><node id=\"x\" lat=\"1\" lon=\"2\"/></osm>").is_err());
        assert!(read_osm_xml(b"<osm><node id=\"1\"/></osm>").is_err());
        assert!(read_osm_xml(b"<osm><way id=\"3\"><nd ref=\"1\"/>").is_err());
        assert!(read_osm_xml(b"<html><body>Too many requests</body></html>").is_err());
        assert!(read_osm_xml(b"").is_err());
    }

    #[test]
    fn test_overpass_remark() {
        let doc = br#"<osm version="0.6">
  <remark> runtime error: Query timed out in "query" at line 1 after 25 seconds. </remark>
</osm>"#;
        match read_osm_xml(doc) {
            Err(Error::XmlDataError(msg)) => assert!(msg.contains("timed out")),
            r => panic!("expected XmlDataError, got {:?}", r),
        }
    }
}
