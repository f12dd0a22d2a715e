//! Text extraction from uploaded files, repository checkouts and web pages.
//!
//! One input becomes one document; nothing is chunked.

use crate::types::{Skipped, SourceText};
use ragdesk_core::{AppError, AppResult};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions accepted by [`extract_file`].
pub const UPLOAD_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "html", "htm"];

/// Extensions read from a repository checkout.
pub const REPOSITORY_EXTENSIONS: &[&str] = &["py", "md", "txt", "js", "java", "c", "cpp"];

/// Elements whose content is never visible text.
const IGNORE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate words when their tags are removed.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Result of a batch extraction: documents that produced text, and the
/// inputs that were dropped.
#[derive(Debug, Default)]
pub struct ExtractBatch {
    pub documents: Vec<SourceText>,
    pub skipped: Vec<Skipped>,
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
    Html,
}

impl DocumentFormat {
    /// Detect format from the (case-insensitive) file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
            Self::Html => "html",
        }
    }
}

/// Extract the text of one uploaded file.
///
/// Fails with `UnsupportedFormat` for extensions outside
/// [`UPLOAD_EXTENSIONS`] and with `Extraction` when the file cannot be read
/// or decoded.
pub fn extract_file(path: &Path) -> AppResult<String> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        AppError::UnsupportedFormat(format!(
            "{} (supported: {})",
            path.display(),
            UPLOAD_EXTENSIONS.join(", ")
        ))
    })?;

    tracing::debug!("Extracting {} as {}", path.display(), format.as_str());

    match format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Text => {
            let bytes = read_bytes(path)?;
            let text = String::from_utf8(bytes).map_err(|e| {
                AppError::Extraction(format!("{} is not valid UTF-8: {}", path.display(), e))
            })?;
            Ok(text.trim().to_string())
        }
        DocumentFormat::Html => {
            let bytes = read_bytes(path)?;
            Ok(extract_html(&String::from_utf8_lossy(&bytes)))
        }
    }
}

/// Extract a batch of uploads.
///
/// Unsupported formats, unreadable files and files without text are logged
/// and recorded in `skipped`; the rest of the batch continues.
pub fn extract_files<P: AsRef<Path>>(paths: &[P]) -> ExtractBatch {
    let mut batch = ExtractBatch::default();

    for path in paths {
        let path = path.as_ref();
        let source = path.display().to_string();

        match extract_file(path) {
            Ok(text) if text.is_empty() => {
                tracing::warn!("No text extracted from {}, skipping", source);
                batch.skipped.push(Skipped::new(source, "no text extracted"));
            }
            Ok(text) => batch.documents.push(SourceText::new(source, text)),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", source, e);
                batch.skipped.push(Skipped::new(source, e));
            }
        }
    }

    tracing::info!(
        "Extracted {} documents ({} skipped)",
        batch.documents.len(),
        batch.skipped.len()
    );

    batch
}

/// Walk a repository checkout and read every file with an allow-listed
/// extension.
///
/// Files are read as UTF-8 with undecodable bytes dropped. Unreadable and
/// empty files are skipped. Results are ordered by path.
pub fn extract_repository(root: &Path) -> AppResult<Vec<SourceText>> {
    if !root.is_dir() {
        return Err(AppError::Extraction(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_repository_file(path) {
            continue;
        }

        match read_bytes(path) {
            Ok(bytes) => {
                let text = decode_ignoring_errors(&bytes);
                if text.trim().is_empty() {
                    tracing::debug!("Skipping empty file {}", path.display());
                    continue;
                }
                documents.push(SourceText::new(path.display().to_string(), text));
            }
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    tracing::info!(
        "Read {} files from repository {}",
        documents.len(),
        root.display()
    );

    Ok(documents)
}

/// Visible text of an HTML document.
///
/// Drops `script`, `style`, `noscript` and `template` content and collapses
/// whitespace.
pub fn extract_html(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut buf = String::new();
    collect_text(document.root_element(), &mut buf);
    collapse_whitespace(&buf)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if IGNORE_TAGS.contains(&name) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push(' ');
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    if block {
        out.push(' ');
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_repository_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| REPOSITORY_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn decode_ignoring_errors(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\u{FFFD}', "")
}

fn read_bytes(path: &Path) -> AppResult<Vec<u8>> {
    fs::read(path)
        .map_err(|e| AppError::Extraction(format!("Failed to read {}: {}", path.display(), e)))
}

fn extract_pdf(path: &Path) -> AppResult<String> {
    let doc = pdf_oxide::PdfDocument::open(path).map_err(|e| {
        AppError::Extraction(format!("Failed to open PDF {}: {}", path.display(), e))
    })?;

    let pages = doc.page_count().map_err(|e| {
        AppError::Extraction(format!("Failed to read PDF {}: {}", path.display(), e))
    })?;

    let mut parts = Vec::with_capacity(pages);
    for page in 0..pages {
        match doc.extract_text(page) {
            Ok(text) if !text.trim().is_empty() => parts.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("No text on page {} of {}: {}", page + 1, path.display(), e)
            }
        }
    }

    Ok(parts.join(" ").trim().to_string())
}

fn extract_docx(path: &Path) -> AppResult<String> {
    let file = fs::File::open(path)
        .map_err(|e| AppError::Extraction(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        AppError::Extraction(format!("{} is not a docx container: {}", path.display(), e))
    })?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| {
            AppError::Extraction(format!("{} has no document body: {}", path.display(), e))
        })?
        .read_to_string(&mut xml)
        .map_err(|e| {
            AppError::Extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;

    Ok(docx_paragraphs(&xml).join(" ").trim().to_string())
}

/// Paragraph texts of a WordprocessingML body, empty paragraphs omitted.
fn docx_paragraphs(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(lt) = rest.find('<') {
        if in_text {
            current.push_str(&unescape_xml(&rest[..lt]));
        }

        let Some(gt) = rest[lt..].find('>') else {
            break;
        };
        let tag = &rest[lt + 1..lt + gt];
        rest = &rest[lt + gt + 1..];

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match (name, closing) {
            ("w:p", false) if !self_closing => current.clear(),
            ("w:p", true) => {
                let text = current.trim();
                if !text.is_empty() {
                    paragraphs.push(text.to_string());
                }
                current.clear();
            }
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tab", false) => current.push('\t'),
            ("w:br", false) | ("w:cr", false) => current.push('\n'),
            _ => {}
        }
    }

    paragraphs
}

fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];

        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Paths given on the command line, expanded one level for directories.
pub fn expand_upload_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut children: Vec<PathBuf> = WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            children.sort();
            expanded.extend(children);
        } else {
            expanded.push(path.clone());
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_docx(path: &Path, body: &str) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(
                "word/document.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/Report.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("page.htm")),
            Some(DocumentFormat::Html)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("image.png")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_extract_txt_trims() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "\n  The sky is blue.  \n\n").unwrap();

        assert_eq!(extract_file(&path).unwrap(), "The sky is blue.");
    }

    #[test]
    fn test_extract_txt_rejects_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("binary.txt");
        fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("image.png");
        fs::write(&path, [0u8; 8]).unwrap();

        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert!(err.is_skippable());
    }

    #[test]
    fn test_extract_docx_paragraphs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.docx");
        write_docx(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> report</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Revenue &amp; costs &lt;rose&gt;</w:t></w:r></w:p>
<w:p><w:r><w:t></w:t></w:r></w:p>
</w:body>
</w:document>"#,
        );

        assert_eq!(
            extract_file(&path).unwrap(),
            "Quarterly report Revenue & costs <rose>"
        );
    }

    #[test]
    fn test_extract_docx_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.docx");
        fs::write(&path, "plain text").unwrap();

        assert!(matches!(
            extract_file(&path).unwrap_err(),
            AppError::Extraction(_)
        ));
    }

    #[test]
    fn test_extract_pdf_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, "this is not a pdf").unwrap();

        assert!(matches!(
            extract_file(&path).unwrap_err(),
            AppError::Extraction(_)
        ));
    }

    #[test]
    fn test_extract_html_drops_scripts() {
        let html = r#"<html><head><title>Docs</title><style>p { color: red }</style></head>
<body><script>var x = 1;</script><p>Hello <b>world</b></p><div>Second</div>
<noscript>enable js</noscript></body></html>"#;

        assert_eq!(extract_html(html), "Docs Hello world Second");
    }

    #[test]
    fn test_extract_html_non_ascii() {
        let html = "<p>Ação é rápida</p><p>日本語</p>";
        assert_eq!(extract_html(html), "Ação é rápida 日本語");
    }

    #[test]
    fn test_unescape_numeric_entities() {
        assert_eq!(unescape_xml("a&#233;b&#x41;&unknown;"), "aébA&unknown;");
        assert_eq!(unescape_xml("trailing &"), "trailing &");
    }

    #[test]
    fn test_extract_files_skips_and_continues() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.txt");
        let empty = temp.path().join("empty.txt");
        let image = temp.path().join("photo.jpg");
        let missing = temp.path().join("missing.txt");
        fs::write(&good, "useful content").unwrap();
        fs::write(&empty, "   \n").unwrap();
        fs::write(&image, [0xffu8, 0xd8]).unwrap();

        let batch = extract_files(&[image, good.clone(), empty, missing]);

        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].source, good.display().to_string());
        assert_eq!(batch.documents[0].text, "useful content");
        assert_eq!(batch.skipped.len(), 3);
    }

    #[test]
    fn test_extract_repository_allow_list() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("README.md"), "# Project").unwrap();
        fs::write(root.join("src/main.py"), "print('hi')").unwrap();
        fs::write(root.join("src/nested/lib.cpp"), "int main() {}").unwrap();
        fs::write(root.join("src/logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        fs::write(root.join("src/empty.txt"), "").unwrap();
        fs::write(root.join("src/latin1.txt"), [b'c', b'a', 0xe9, b'f']).unwrap();

        let docs = extract_repository(root).unwrap();
        let sources: Vec<String> = docs.iter().map(|d| d.source.clone()).collect();

        assert_eq!(docs.len(), 4);
        assert!(sources.iter().any(|s| s.ends_with("README.md")));
        assert!(sources.iter().any(|s| s.ends_with("main.py")));
        assert!(sources.iter().any(|s| s.ends_with("lib.cpp")));
        assert!(!sources.iter().any(|s| s.ends_with("logo.png")));

        let latin1 = docs
            .iter()
            .find(|d| d.source.ends_with("latin1.txt"))
            .unwrap();
        assert_eq!(latin1.text, "caf");
    }

    #[test]
    fn test_extract_repository_requires_directory() {
        let temp = TempDir::new().unwrap();
        assert!(extract_repository(&temp.path().join("nope")).is_err());
    }

    #[test]
    fn test_expand_upload_paths() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        let single = PathBuf::from("single.pdf");

        let expanded = expand_upload_paths(&[temp.path().to_path_buf(), single.clone()]);
        assert_eq!(
            expanded,
            vec![temp.path().join("a.txt"), temp.path().join("b.txt"), single]
        );
    }
}
