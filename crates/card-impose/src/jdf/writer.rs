//! JDF serialization with quick-xml

use super::document::{CuttingJobDocument, EncodedCut, EncodedTrim, SheetBlock};
use crate::constants::{CUTTING_PARAMS_RESOURCE_ID, MEDIA_RESOURCE_ID};
use crate::cuts::{CutAxis, CutKind};
use crate::types::*;
use chrono::SecondsFormat;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

pub const JDF_NAMESPACE: &str = "http://www.CIP4.org/JDFSchema_1_1";

pub(crate) fn axis_name(axis: CutAxis) -> &'static str {
    match axis {
        CutAxis::Horizontal => "Horizontal",
        CutAxis::Vertical => "Vertical",
    }
}

pub(crate) fn kind_name(kind: CutKind) -> &'static str {
    match kind {
        CutKind::Edge => "Edge",
        CutKind::Internal => "Internal",
    }
}

struct JdfWriter {
    writer: Writer<Vec<u8>>,
}

impl JdfWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn tag<'a>(name: &'a str, attrs: &[(&str, String)]) -> BytesStart<'a> {
        let mut tag = BytesStart::new(name);
        for (key, value) in attrs {
            tag.push_attribute((*key, value.as_str()));
        }
        tag
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.writer.write_event(Event::Start(Self::tag(name, attrs)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.writer.write_event(Event::Empty(Self::tag(name, attrs)))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| ImposeError::Xml(format!("Document is not valid UTF-8: {}", e)))
    }
}

/// Serialize a cutting job document to JDF XML
pub fn to_xml(doc: &CuttingJobDocument) -> Result<String> {
    let mut w = JdfWriter::new();
    w.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = vec![
        ("xmlns", JDF_NAMESPACE.to_string()),
        ("ID", format!("JDF_{}", doc.job_id)),
        ("JobID", doc.job_id.clone()),
        ("Type", "ProcessGroup".to_string()),
        ("Types", "Cutting".to_string()),
        ("Status", "Waiting".to_string()),
        ("Version", doc.version.clone()),
    ];
    if let Some(description) = &doc.description {
        root.push(("DescriptiveName", description.clone()));
    }
    w.open("JDF", &root)?;

    w.open("ResourcePool", &[])?;
    w.empty(
        "Media",
        &[
            ("ID", MEDIA_RESOURCE_ID.to_string()),
            ("Class", "Consumable".to_string()),
            ("Status", "Available".to_string()),
            ("MediaType", doc.media_type.clone()),
            ("Dimension", pair(doc, doc.media_width, doc.media_height)),
            ("Unit", doc.unit.symbol().to_string()),
        ],
    )?;

    for sheet in &doc.sheets {
        write_run_list(&mut w, sheet)?;
    }

    w.open(
        "CuttingParams",
        &[
            ("ID", CUTTING_PARAMS_RESOURCE_ID.to_string()),
            ("Class", "Parameter".to_string()),
            ("Status", "Available".to_string()),
            ("Unit", doc.unit.symbol().to_string()),
            ("Origin", doc.origin.name().to_string()),
            ("Profile", doc.profile_name.clone()),
        ],
    )?;
    for sheet in &doc.sheets {
        write_cut_block(&mut w, doc, sheet)?;
    }
    w.close("CuttingParams")?;
    w.close("ResourcePool")?;

    w.empty(
        "NodeInfo",
        &[
            ("NodeStatus", "Waiting".to_string()),
            ("Start", doc.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("End", doc.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ],
    )?;

    w.open("ResourceLinkPool", &[])?;
    w.empty(
        "MediaLink",
        &[
            ("Usage", "Input".to_string()),
            ("rRef", MEDIA_RESOURCE_ID.to_string()),
        ],
    )?;
    for sheet in &doc.sheets {
        w.empty(
            "RunListLink",
            &[
                ("Usage", "Input".to_string()),
                ("rRef", sheet.run_list_id()),
            ],
        )?;
    }
    w.empty(
        "CuttingParamsLink",
        &[
            ("Usage", "Input".to_string()),
            ("rRef", CUTTING_PARAMS_RESOURCE_ID.to_string()),
        ],
    )?;
    w.close("ResourceLinkPool")?;

    w.close("JDF")?;
    w.finish()
}

fn pair(doc: &CuttingJobDocument, a: f64, b: f64) -> String {
    format!("{} {}", doc.format(a), doc.format(b))
}

fn write_run_list(w: &mut JdfWriter, sheet: &SheetBlock) -> Result<()> {
    w.open(
        "RunList",
        &[
            ("ID", sheet.run_list_id()),
            ("Class", "Parameter".to_string()),
            ("Status", "Available".to_string()),
            ("SheetIndex", sheet.index.to_string()),
        ],
    )?;
    w.open("LayoutElement", &[])?;
    w.empty(
        "FileSpec",
        &[
            ("URL", sheet.artifact.clone()),
            ("Side", "Front".to_string()),
        ],
    )?;
    if let Some(back) = &sheet.back_artifact {
        w.empty(
            "FileSpec",
            &[("URL", back.clone()), ("Side", "Back".to_string())],
        )?;
    }
    w.close("LayoutElement")?;
    w.close("RunList")
}

fn write_cut_block(w: &mut JdfWriter, doc: &CuttingJobDocument, sheet: &SheetBlock) -> Result<()> {
    let unit = doc.unit.symbol().to_string();
    w.open(
        "CutBlock",
        &[
            ("BlockName", sheet.block_name()),
            ("SheetIndex", sheet.index.to_string()),
            ("TrimSize", pair(doc, sheet.width, sheet.height)),
            ("RunListRef", sheet.run_list_id()),
            ("Unit", unit.clone()),
            ("CutCount", sheet.cuts.len().to_string()),
        ],
    )?;
    for cut in &sheet.cuts {
        write_cut(w, doc, cut)?;
    }
    for trim in &sheet.trims {
        write_trim(w, doc, trim, &unit)?;
    }
    w.close("CutBlock")
}

fn write_cut(w: &mut JdfWriter, doc: &CuttingJobDocument, cut: &EncodedCut) -> Result<()> {
    w.empty(
        "Cut",
        &[
            ("Order", cut.order.to_string()),
            ("Pass", cut.pass.to_string()),
            ("Axis", axis_name(cut.axis).to_string()),
            ("Kind", kind_name(cut.kind).to_string()),
            ("Position", doc.format(cut.position)),
            ("Start", doc.format(cut.start)),
            ("End", doc.format(cut.end)),
        ],
    )
}

fn write_trim(
    w: &mut JdfWriter,
    doc: &CuttingJobDocument,
    trim: &EncodedTrim,
    unit: &str,
) -> Result<()> {
    let center = pair(
        doc,
        (trim.llx + trim.urx) / 2.0,
        (trim.lly + trim.ury) / 2.0,
    );
    w.open(
        "CutMark",
        &[
            ("MarkType", "CutContour".to_string()),
            ("CardID", trim.card_id.clone()),
            ("Center", center),
            ("Size", pair(doc, trim.width(), trim.height())),
            ("Unit", unit.to_string()),
        ],
    )?;
    w.open("CutPath", &[])?;
    w.empty(
        "Rectangle",
        &[
            ("LLx", doc.format(trim.llx)),
            ("LLy", doc.format(trim.lly)),
            ("URx", doc.format(trim.urx)),
            ("URy", doc.format(trim.ury)),
            ("Unit", unit.to_string()),
        ],
    )?;
    w.close("CutPath")?;
    w.close("CutMark")
}
