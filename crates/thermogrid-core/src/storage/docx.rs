//! Word report writer (`.docx`).
//!
//! The package is assembled by hand: a handful of fixed WordprocessingML
//! parts plus one media part per chart snapshot.

use std::io::{Seek, Write};
use std::path::Path;

use thermogrid_engine::Dataset;
use thermogrid_engine::engine::format_value;

use super::{ReportOptions, write_report};
use crate::error::Result;

const EMU_PER_PIXEL: u64 = 9525;
/// Widest image that fits the default page margins (6 inches).
const MAX_IMAGE_WIDTH_EMU: u64 = 5_486_400;

/// A chart snapshot to embed.
#[derive(Clone, Debug)]
pub struct ChartImage {
    pub title: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn write_docx_file(
    path: &Path,
    dataset: &Dataset,
    charts: &[ChartImage],
    options: &ReportOptions,
) -> Result<()> {
    write_report(path, |file| write_docx(file, dataset, charts, options))?;
    log::info!("wrote report {}", path.display());
    Ok(())
}

/// Write the report to any seekable writer.
pub fn write_docx<W: Write + Seek>(
    writer: W,
    dataset: &Dataset,
    charts: &[ChartImage],
    options: &ReportOptions,
) -> Result<()> {
    let mut zip = zip::ZipWriter::new(writer);
    let file_options = zip::write::SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", file_options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", file_options)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", file_options)?;
    zip.write_all(document_rels(charts.len()).as_bytes())?;

    zip.start_file("word/document.xml", file_options)?;
    zip.write_all(document_xml(dataset, charts, options).as_bytes())?;

    for (i, chart) in charts.iter().enumerate() {
        zip.start_file(format!("word/media/chart{}.png", i + 1), file_options)?;
        zip.write_all(&chart.png)?;
    }

    zip.finish()?;
    Ok(())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="png" ContentType="image/png"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn document_rels(chart_count: usize) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=chart_count {
        content.push_str(&format!(
            r#"
    <Relationship Id="rIdChart{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/chart{i}.png"/>"#
        ));
    }
    content.push_str("\n</Relationships>");
    content
}

fn document_xml(dataset: &Dataset, charts: &[ChartImage], options: &ReportOptions) -> String {
    let mut body = String::new();
    body.push_str(&heading(&options.title, 1));
    body.push_str(&blank_paragraph());

    let groups: Vec<_> = dataset.schema().chunks(options.chunk_size).collect();
    for (i, group) in groups.iter().enumerate() {
        body.push_str("<w:tbl><w:tblPr><w:tblW w:w=\"5000\" w:type=\"pct\"/><w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            body.push_str(&format!(
                "<w:{side} w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>"
            ));
        }
        body.push_str("</w:tblBorders></w:tblPr>");

        body.push_str("<w:tr>");
        for column in group.iter() {
            body.push_str(&cell(column.header(), true));
        }
        body.push_str("</w:tr>");

        for row in dataset.rows().iter() {
            body.push_str("<w:tr>");
            for column in group.iter() {
                let text = row
                    .get(column.field())
                    .map(|v| format_value(v, column.format()))
                    .unwrap_or_default();
                body.push_str(&cell(&text, false));
            }
            body.push_str("</w:tr>");
        }
        body.push_str("</w:tbl>");

        if i + 1 < groups.len() {
            body.push_str(&blank_paragraph());
        }
    }

    for (i, chart) in charts.iter().enumerate() {
        body.push_str(&blank_paragraph());
        body.push_str(&heading(&chart.title, 2));
        body.push_str(&image_paragraph(i + 1, chart));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
<w:body>{body}<w:sectPr/></w:body>
</w:document>"#
    )
}

fn heading(text: &str, level: u8) -> String {
    let size = if level == 1 { 32 } else { 26 };
    format!(
        "<w:p><w:pPr><w:outlineLvl w:val=\"{}\"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        level - 1,
        size,
        escape_xml(text)
    )
}

fn blank_paragraph() -> String {
    "<w:p/>".to_string()
}

fn cell(text: &str, bold: bool) -> String {
    let run_props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        "<w:tc><w:p><w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r></w:p></w:tc>",
        run_props,
        escape_xml(text)
    )
}

fn image_paragraph(index: usize, chart: &ChartImage) -> String {
    let mut cx = chart.width as u64 * EMU_PER_PIXEL;
    let mut cy = chart.height as u64 * EMU_PER_PIXEL;
    if cx > MAX_IMAGE_WIDTH_EMU {
        cy = cy * MAX_IMAGE_WIDTH_EMU / cx;
        cx = MAX_IMAGE_WIDTH_EMU;
    }
    let name = escape_xml(&chart.title);
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{index}" name="{name}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{index}" name="chart{index}.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="rIdChart{index}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use thermogrid_engine::{ColumnDefinition, Record, Schema};

    fn wide_dataset(columns: usize) -> Dataset {
        let schema = Schema::replace_all(
            (0..columns)
                .map(|i| ColumnDefinition::numeric(format!("c{i}"), format!("Col <{i}>")))
                .collect(),
        )
        .unwrap();
        Dataset::replace_all(schema, vec![Record::new().with("c0", 1.5)])
    }

    fn read_part(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        Some(out)
    }

    fn render(dataset: &Dataset, charts: &[ChartImage]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        write_docx(&mut out, dataset, charts, &ReportOptions::default()).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_ten_columns_make_two_tables() {
        let bytes = render(&wide_dataset(10), &[]);
        let xml = String::from_utf8(read_part(&bytes, "word/document.xml").unwrap()).unwrap();
        assert_eq!(xml.matches("<w:tbl>").count(), 2);
        let second = &xml[xml.rfind("<w:tbl>").unwrap()..];
        assert_eq!(second.split("</w:tr>").next().unwrap().matches("<w:tc>").count(), 3);
        assert!(xml.contains("Temperature Monitoring"));
        assert!(xml.contains("Col &lt;0&gt;"));
        assert!(xml.contains(">1.50<"));
    }

    #[test]
    fn test_charts_embedded() {
        let chart = ChartImage {
            title: "Chart 1".to_string(),
            png: b"not really a png".to_vec(),
            width: 800,
            height: 400,
        };
        let bytes = render(&wide_dataset(2), &[chart]);
        assert_eq!(
            read_part(&bytes, "word/media/chart1.png").unwrap(),
            b"not really a png".to_vec()
        );
        let rels = String::from_utf8(read_part(&bytes, "word/_rels/document.xml.rels").unwrap())
            .unwrap();
        assert!(rels.contains("media/chart1.png"));
        let xml = String::from_utf8(read_part(&bytes, "word/document.xml").unwrap()).unwrap();
        assert!(xml.contains("r:embed=\"rIdChart1\""));
        assert!(xml.contains(">Chart 1<"));
        assert!(read_part(&bytes, "word/media/chart2.png").is_none());
    }
}
