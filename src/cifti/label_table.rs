//! Rewrites label colours inside CIFTI XML.

use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::CiftiError;

/// RGBA with components in [0, 1], as CIFTI label tables store them.
pub type LabelColor = [f32; 4];

const COLOR_ATTRS: [&str; 4] = ["Red", "Green", "Blue", "Alpha"];

fn xml_err(e: impl std::fmt::Display) -> CiftiError {
    CiftiError::Xml(e.to_string())
}

/// Replace the colour of every `<Label Key="k">` whose key is in `colors`.
///
/// All other markup is copied through unchanged. Every requested key must
/// exist in the document.
pub fn recolor(xml: &str, colors: &BTreeMap<u32, LabelColor>) -> Result<String, CiftiError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut seen = BTreeSet::new();

    loop {
        let event = match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"Label" => {
                Event::Start(recolor_label(e, colors, &mut seen)?)
            }
            Event::Empty(e) if e.name().as_ref() == b"Label" => {
                Event::Empty(recolor_label(e, colors, &mut seen)?)
            }
            other => other,
        };
        writer.write_event(event).map_err(xml_err)?;
    }

    if let Some(missing) = colors.keys().find(|k| !seen.contains(*k)) {
        return Err(CiftiError::MissingLabel(*missing));
    }
    String::from_utf8(writer.into_inner()).map_err(|_| CiftiError::XmlEncoding)
}

fn recolor_label<'a>(
    label: BytesStart<'a>,
    colors: &BTreeMap<u32, LabelColor>,
    seen: &mut BTreeSet<u32>,
) -> Result<BytesStart<'a>, CiftiError> {
    let key = label_key(&label)?;
    let Some((key, rgba)) = key.and_then(|k| colors.get(&k).map(|c| (k, c))) else {
        return Ok(label);
    };
    seen.insert(key);

    let mut out = BytesStart::new("Label");
    for attr in label.attributes() {
        let attr: Attribute = attr.map_err(xml_err)?;
        let is_color = COLOR_ATTRS
            .iter()
            .any(|name| attr.key.as_ref() == name.as_bytes());
        if !is_color {
            out.push_attribute(attr);
        }
    }
    for (name, value) in COLOR_ATTRS.iter().zip(rgba) {
        out.push_attribute((*name, format!("{:.6}", value.clamp(0.0, 1.0)).as_str()));
    }
    Ok(out.into_owned())
}

fn label_key(label: &BytesStart<'_>) -> Result<Option<u32>, CiftiError> {
    for attr in label.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == b"Key" {
            let raw = attr.unescape_value().map_err(xml_err)?;
            let key = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| CiftiError::Xml(format!("label key '{raw}' is not an integer")))?;
            return Ok(Some(key));
        }
    }
    Ok(None)
}

/// Colours of every label in the document, by key.
pub fn label_colors(xml: &str) -> Result<BTreeMap<u32, LabelColor>, CiftiError> {
    let mut reader = Reader::from_str(xml);
    let mut out = BTreeMap::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Label" => {
                let Some(key) = label_key(&e)? else { continue };
                let mut rgba = [0.0f32; 4];
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    if let Some(i) = COLOR_ATTRS
                        .iter()
                        .position(|name| attr.key.as_ref() == name.as_bytes())
                    {
                        let raw = attr.unescape_value().map_err(xml_err)?;
                        rgba[i] = raw.trim().parse().map_err(|_| {
                            CiftiError::Xml(format!("label {key}: bad colour '{raw}'"))
                        })?;
                    }
                }
                out.insert(key, rgba);
            }
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"<LabelTable>
<Label Key="0" Red="0" Green="0" Blue="0" Alpha="0">???</Label>
<Label Key="1" Red="0.1" Green="0.2" Blue="0.3" Alpha="1">R_V1_ROI</Label>
<Label Key="2" Red="0.4" Green="0.5" Blue="0.6" Alpha="1">R_MST_ROI</Label>
</LabelTable>"#;

    #[test]
    fn recolors_only_requested_keys() {
        let colors = BTreeMap::from([(2, [1.0, 0.0, 0.5, 1.0])]);
        let out = recolor(TABLE, &colors).unwrap();

        let table = label_colors(&out).unwrap();
        assert_eq!(table[&0], [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(table[&1], [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(table[&2], [1.0, 0.0, 0.5, 1.0]);
        assert!(out.contains(">R_MST_ROI</Label>"));
        assert!(out.contains(">???</Label>"));
    }

    #[test]
    fn missing_key_is_an_error() {
        let colors = BTreeMap::from([(9, [1.0; 4])]);
        assert!(matches!(
            recolor(TABLE, &colors),
            Err(CiftiError::MissingLabel(9))
        ));
    }

    #[test]
    fn empty_label_elements_are_handled() {
        let xml = r#"<LabelTable><Label Key="3" Red="0" Green="0" Blue="0" Alpha="1"/></LabelTable>"#;
        let out = recolor(xml, &BTreeMap::from([(3, [0.5, 0.5, 0.5, 1.0])])).unwrap();
        assert_eq!(label_colors(&out).unwrap()[&3], [0.5, 0.5, 0.5, 1.0]);
    }
}
