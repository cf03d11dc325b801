//! Minimal read-only XLSX reader.
//!
//! Parses just the parts charting needs: sheet names, shared strings and raw
//! cell values. Styles, formulas, merges and the rest of the OOXML surface
//! are ignored.

use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::IngestError;
use crate::sheet::{Cell, Grid, Sheet, Workbook};

/// Read an XLSX workbook from an in-memory byte buffer.
pub fn read_xlsx_bytes(bytes: &[u8]) -> Result<Workbook, IngestError> {
    read_xlsx(Cursor::new(bytes))
}

/// Read an XLSX workbook from any seekable reader.
pub fn read_xlsx<R: Read + Seek>(reader: R) -> Result<Workbook, IngestError> {
    let mut archive = zip::ZipArchive::new(reader)?;

    if archive.by_name("[Content_Types].xml").is_err() {
        return Err(IngestError::Workbook("missing [Content_Types].xml".into()));
    }

    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_info = read_workbook_xml(&mut archive)?;
    let sheet_paths = read_workbook_rels(&mut archive)?;

    let mut workbook = Workbook::default();
    for (name, r_id) in sheet_info {
        if let Some(path) = sheet_paths.get(&r_id) {
            let grid = read_worksheet(&mut archive, path, &shared_strings)?;
            workbook.sheets.push(Sheet { name, grid });
        }
    }

    if workbook.sheets.is_empty() {
        return Err(IngestError::Workbook("workbook has no sheets".into()));
    }
    log::debug!("read xlsx workbook with {} sheet(s)", workbook.sheets.len());
    Ok(workbook)
}

/// Shared strings table, absent in small files.
fn read_shared_strings<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<String>, IngestError> {
    let mut strings = Vec::new();

    let file = match archive.by_name("xl/sharedStrings.xml") {
        Ok(f) => f,
        Err(_) => return Ok(strings),
    };

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"si" => {
                    strings.push(current.clone());
                    current.clear();
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(e) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Sheet names and rIds from workbook.xml, in workbook order.
fn read_workbook_xml<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<(String, String)>, IngestError> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| IngestError::Workbook("missing xl/workbook.xml".into()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"r:id" => r_id = attr.unescape_value().ok().map(|s| s.to_string()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// rId → archive path for worksheet parts.
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<HashMap<String, String>, IngestError> {
    let file = archive
        .by_name("xl/_rels/workbook.xml.rels")
        .map_err(|_| IngestError::Workbook("missing xl/_rels/workbook.xml.rels".into()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Target" => target = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Type" => rel_type = attr.unescape_value().ok().map(|s| s.to_string()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        // Target is relative to xl/ unless rooted.
                        let full_path = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("xl/{target}")
                        };
                        rels.insert(id, full_path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

fn read_worksheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
) -> Result<Grid, IngestError> {
    let file = archive
        .by_name(path)
        .map_err(|_| IngestError::Workbook(format!("missing worksheet part {path}")))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut grid: Grid = Vec::new();

    let mut in_cell = false;
    let mut in_value = false;
    let mut in_inline_str = false;
    let mut in_inline_text = false;
    let mut cell_ref: Option<String> = None;
    let mut cell_type: Option<String> = None;
    let mut cell_value: Option<String> = None;
    let mut inline_text = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"c" => {
                    in_cell = true;
                    cell_ref = None;
                    cell_type = None;
                    cell_value = None;
                    inline_text.clear();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => cell_ref = attr.unescape_value().ok().map(|s| s.to_string()),
                            b"t" => cell_type = attr.unescape_value().ok().map(|s| s.to_string()),
                            _ => {}
                        }
                    }
                }
                b"v" if in_cell => in_value = true,
                b"is" if in_cell => in_inline_str = true,
                b"t" if in_inline_str => in_inline_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"c" => {
                    if let Some(r) = cell_ref.take() {
                        let cell = decode_cell(
                            cell_type.as_deref(),
                            cell_value.as_deref(),
                            &inline_text,
                            shared_strings,
                        );
                        if let Some((row, col)) = parse_cell_ref(&r) {
                            place_cell(&mut grid, row, col, cell);
                        }
                    }
                    in_cell = false;
                }
                b"v" => in_value = false,
                b"is" => in_inline_str = false,
                b"t" => in_inline_text = false,
                _ => {}
            },
            Event::Text(e) => {
                if in_value {
                    if let Ok(text) = e.unescape() {
                        cell_value = Some(text.to_string());
                    }
                } else if in_inline_text {
                    if let Ok(text) = e.unescape() {
                        inline_text.push_str(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

fn decode_cell(
    cell_type: Option<&str>,
    value: Option<&str>,
    inline_text: &str,
    shared_strings: &[String],
) -> Cell {
    match cell_type {
        Some("s") => value
            .and_then(|v| v.parse::<usize>().ok())
            .and_then(|i| shared_strings.get(i))
            .map_or(Cell::Empty, |s| Cell::Text(s.clone())),
        Some("str") => value.map_or(Cell::Empty, |v| Cell::Text(v.to_string())),
        Some("inlineStr") => {
            if inline_text.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(inline_text.to_string())
            }
        }
        Some("b") => value.map_or(Cell::Empty, |v| Cell::Bool(v == "1")),
        // Default cell type is numeric.
        _ => match value.and_then(|v| v.parse::<f64>().ok()) {
            Some(n) => Cell::Number(n),
            None => value.map_or(Cell::Empty, |v| Cell::Text(v.to_string())),
        },
    }
}

/// Parse an A1-style reference into zero-based (row, column).
fn parse_cell_ref(cell_ref: &str) -> Option<(usize, usize)> {
    let split = cell_ref.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell_ref.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (c as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

// Sparse cells land in a dense grid; gaps stay Empty.
fn place_cell(grid: &mut Grid, row: usize, col: usize, cell: Cell) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let grid_row = &mut grid[row];
    if grid_row.len() <= col {
        grid_row.resize(col + 1, Cell::Empty);
    }
    grid_row[col] = cell;
}
