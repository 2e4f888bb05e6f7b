//! JDF parsing for round-trip verification
//!
//! Only the elements this crate writes are read back. Unknown elements are
//! skipped so files touched by other JDF tools still parse.

use super::document::{CuttingJobDocument, EncodedCut, EncodedTrim};
use super::profile::{CoordinateOrigin, Unit};
use super::writer::{axis_name, kind_name};
use crate::cuts::{CutAxis, CutKind};
use crate::types::*;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// One cut block read back from a document
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub index: usize,
    pub block_name: String,
    pub run_list: Option<String>,
    pub trim_size: (f64, f64),
    pub declared_cuts: usize,
    pub cuts: Vec<EncodedCut>,
    pub trims: Vec<EncodedTrim>,
}

/// Content of a JDF cutting job as read from XML
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedJob {
    pub job_id: String,
    pub version: String,
    pub unit: Unit,
    pub origin: CoordinateOrigin,
    pub media: (f64, f64),
    pub sheets: Vec<ParsedSheet>,
    /// File names per RunList ID, front first
    pub artifacts: HashMap<String, Vec<String>>,
}

impl ParsedJob {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn cut_count(&self) -> usize {
        self.sheets.iter().map(|s| s.cuts.len()).sum()
    }

    /// Artifact names referenced by one sheet
    pub fn sheet_artifacts(&self, sheet: &ParsedSheet) -> &[String] {
        sheet
            .run_list
            .as_ref()
            .and_then(|id| self.artifacts.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check that this parsed job reproduces `doc`
    ///
    /// Sheet count, cut count, artifact names and every coordinate (within
    /// the document's written precision) must match.
    pub fn verify_against(&self, doc: &CuttingJobDocument) -> Result<()> {
        let tolerance = 10f64.powi(-(doc.precision as i32));
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;

        if self.job_id != doc.job_id {
            return Err(mismatch(format!(
                "job ID {} != {}",
                self.job_id, doc.job_id
            )));
        }
        if self.version != doc.version {
            return Err(mismatch(format!(
                "JDF version {} != {}",
                self.version, doc.version
            )));
        }
        if self.unit != doc.unit || self.origin != doc.origin {
            return Err(mismatch("unit or origin".to_string()));
        }
        if !close(self.media.0, doc.media_width) || !close(self.media.1, doc.media_height) {
            return Err(mismatch("media dimensions".to_string()));
        }
        if self.sheet_count() != doc.sheet_count() {
            return Err(mismatch(format!(
                "sheet count {} != {}",
                self.sheet_count(),
                doc.sheet_count()
            )));
        }
        if self.cut_count() != doc.cut_count() {
            return Err(mismatch(format!(
                "cut count {} != {}",
                self.cut_count(),
                doc.cut_count()
            )));
        }

        for (parsed, block) in self.sheets.iter().zip(&doc.sheets) {
            let sheet = block.index + 1;
            if parsed.index != block.index || parsed.declared_cuts != parsed.cuts.len() {
                return Err(mismatch(format!("header of sheet {}", sheet)));
            }
            let artifacts = self.sheet_artifacts(parsed);
            if artifacts.first() != Some(&block.artifact)
                || artifacts.get(1) != block.back_artifact.as_ref()
            {
                return Err(mismatch(format!("artifacts of sheet {}", sheet)));
            }
            for (a, b) in parsed.cuts.iter().zip(&block.cuts) {
                let same = a.order == b.order
                    && a.pass == b.pass
                    && a.axis == b.axis
                    && a.kind == b.kind
                    && close(a.position, b.position)
                    && close(a.start, b.start)
                    && close(a.end, b.end);
                if !same {
                    return Err(mismatch(format!("cut {} on sheet {}", b.order, sheet)));
                }
            }
            if parsed.trims.len() != block.trims.len() {
                return Err(mismatch(format!("trim count on sheet {}", sheet)));
            }
            for (a, b) in parsed.trims.iter().zip(&block.trims) {
                let same = a.card_id == b.card_id
                    && close(a.llx, b.llx)
                    && close(a.lly, b.lly)
                    && close(a.urx, b.urx)
                    && close(a.ury, b.ury);
                if !same {
                    return Err(mismatch(format!(
                        "trim of card {} on sheet {}",
                        b.card_id, sheet
                    )));
                }
            }
        }
        Ok(())
    }
}

fn mismatch(what: String) -> ImposeError {
    ImposeError::Encoding(format!("Round trip mismatch: {}", what))
}

fn malformed(what: impl std::fmt::Display) -> ImposeError {
    ImposeError::Xml(format!("Malformed cutting job: {}", what))
}

/// Attribute map of one element
fn attributes(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ImposeError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn get<'a>(attrs: &'a HashMap<String, String>, element: &str, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| malformed(format!("<{}> without {}", element, key)))
}

fn number(attrs: &HashMap<String, String>, element: &str, key: &str) -> Result<f64> {
    let value = get(attrs, element, key)?;
    value
        .parse()
        .map_err(|_| malformed(format!("{}=\"{}\" on <{}>", key, value, element)))
}

fn index(attrs: &HashMap<String, String>, element: &str, key: &str) -> Result<usize> {
    let value = get(attrs, element, key)?;
    value
        .parse()
        .map_err(|_| malformed(format!("{}=\"{}\" on <{}>", key, value, element)))
}

fn pair(attrs: &HashMap<String, String>, element: &str, key: &str) -> Result<(f64, f64)> {
    let value = get(attrs, element, key)?;
    let mut parts = value.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
        _ => Err(malformed(format!("{}=\"{}\" on <{}>", key, value, element))),
    }
}

fn parse_cut(attrs: &HashMap<String, String>) -> Result<EncodedCut> {
    let axis = match get(attrs, "Cut", "Axis")? {
        a if a == axis_name(CutAxis::Horizontal) => CutAxis::Horizontal,
        a if a == axis_name(CutAxis::Vertical) => CutAxis::Vertical,
        other => return Err(malformed(format!("cut axis {}", other))),
    };
    let kind = match get(attrs, "Cut", "Kind")? {
        k if k == kind_name(CutKind::Edge) => CutKind::Edge,
        k if k == kind_name(CutKind::Internal) => CutKind::Internal,
        other => return Err(malformed(format!("cut kind {}", other))),
    };
    Ok(EncodedCut {
        order: index(attrs, "Cut", "Order")?,
        pass: index(attrs, "Cut", "Pass")?,
        axis,
        kind,
        position: number(attrs, "Cut", "Position")?,
        start: number(attrs, "Cut", "Start")?,
        end: number(attrs, "Cut", "End")?,
    })
}

/// Parse a JDF cutting job produced by [`to_xml`](super::to_xml)
pub fn parse_jdf(xml: &str) -> Result<ParsedJob> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut job = ParsedJob::default();
    let mut saw_root = false;
    let mut current_sheet: Option<ParsedSheet> = None;
    let mut current_run_list: Option<String> = None;
    let mut current_card: Option<String> = None;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let attrs = attributes(&reader, e)?;
                match name.as_str() {
                    "JDF" => {
                        saw_root = true;
                        job.job_id = get(&attrs, "JDF", "JobID")?.to_string();
                        job.version = get(&attrs, "JDF", "Version")?.to_string();
                    }
                    "Media" => {
                        job.media = pair(&attrs, "Media", "Dimension")?;
                    }
                    "RunList" => {
                        let id = get(&attrs, "RunList", "ID")?.to_string();
                        job.artifacts.entry(id.clone()).or_default();
                        current_run_list = Some(id);
                    }
                    "FileSpec" => {
                        if let Some(id) = &current_run_list {
                            let url = get(&attrs, "FileSpec", "URL")?.to_string();
                            job.artifacts.entry(id.clone()).or_default().push(url);
                        }
                    }
                    "CuttingParams" => {
                        let unit = get(&attrs, "CuttingParams", "Unit")?;
                        job.unit = Unit::from_symbol(unit)
                            .ok_or_else(|| malformed(format!("unit {}", unit)))?;
                        let origin = get(&attrs, "CuttingParams", "Origin")?;
                        job.origin = CoordinateOrigin::from_name(origin)
                            .ok_or_else(|| malformed(format!("origin {}", origin)))?;
                    }
                    "CutBlock" => {
                        current_sheet = Some(ParsedSheet {
                            index: index(&attrs, "CutBlock", "SheetIndex")?,
                            block_name: get(&attrs, "CutBlock", "BlockName")?.to_string(),
                            run_list: attrs.get("RunListRef").cloned(),
                            trim_size: pair(&attrs, "CutBlock", "TrimSize")?,
                            declared_cuts: index(&attrs, "CutBlock", "CutCount")?,
                            cuts: Vec::new(),
                            trims: Vec::new(),
                        });
                    }
                    "Cut" => {
                        let sheet = current_sheet
                            .as_mut()
                            .ok_or_else(|| malformed("<Cut> outside <CutBlock>"))?;
                        sheet.cuts.push(parse_cut(&attrs)?);
                    }
                    "CutMark" => {
                        current_card = Some(get(&attrs, "CutMark", "CardID")?.to_string());
                    }
                    "Rectangle" => {
                        let sheet = current_sheet
                            .as_mut()
                            .ok_or_else(|| malformed("<Rectangle> outside <CutBlock>"))?;
                        sheet.trims.push(EncodedTrim {
                            card_id: current_card.clone().unwrap_or_default(),
                            llx: number(&attrs, "Rectangle", "LLx")?,
                            lly: number(&attrs, "Rectangle", "LLy")?,
                            urx: number(&attrs, "Rectangle", "URx")?,
                            ury: number(&attrs, "Rectangle", "URy")?,
                        });
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"CutBlock" => {
                    if let Some(sheet) = current_sheet.take() {
                        job.sheets.push(sheet);
                    }
                }
                b"RunList" => current_run_list = None,
                b"CutMark" => current_card = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(malformed("no <JDF> root element"));
    }
    Ok(job)
}
