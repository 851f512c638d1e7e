//! DOCX text extraction by walking the document body.

use docx_rs::{
    DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild,
};

/// Extract plain text from an in-memory .docx file.
///
/// Paragraph text is joined with newlines; table cells with " | " so row
/// structure stays readable for the model.
pub fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|err| err.to_string())?;

    let mut out = String::new();
    for child in &docx.document.children {
        walk(child, &mut out);
    }
    Ok(out)
}

fn walk(element: &DocumentChild, out: &mut String) {
    match element {
        DocumentChild::Paragraph(para) => {
            paragraph_text(&para.children, out);
            out.push('\n');
        }
        DocumentChild::Table(table) => {
            for row in &table.rows {
                let TableChild::TableRow(tr) = row;
                for cell in &tr.cells {
                    let TableRowChild::TableCell(tc) = cell;
                    for content in &tc.children {
                        if let TableCellContent::Paragraph(para) = content {
                            paragraph_text(&para.children, out);
                            out.push_str(" | ");
                        }
                    }
                }
                out.push('\n');
            }
        }
        _ => {}
    }
}

fn paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => run_text(&run.children, out),
            ParagraphChild::Hyperlink(link) => {
                for nested in &link.children {
                    if let ParagraphChild::Run(run) = nested {
                        run_text(&run.children, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn run_text(children: &[RunChild], out: &mut String) {
    for child in children {
        if let RunChild::Text(text) = child {
            out.push_str(&text.text);
        }
    }
}
