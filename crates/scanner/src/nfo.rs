//! `movie.nfo` sidecar store.
//!
//! The sidecar is a small XML document with a `<movie>` root holding
//! `title`, `year`, `plot`, `rating`, `poster` and `imdbid`. Unknown optional
//! values are written as [`PLACEHOLDER`]; a missing title or identifier is an
//! empty element.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use posterfin_core::types::{MetadataRecord, PLACEHOLDER};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use thiserror::Error;
use tracing::warn;

pub const NFO_FILE_NAME: &str = "movie.nfo";

const ROOT: &str = "movie";

#[derive(Debug, Error)]
pub enum NfoError {
    #[error("sidecar not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("sidecar parse error: {0}")]
    Parse(String),
    #[error("sidecar write error: {0}")]
    Write(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sidecar location for a media folder.
pub fn nfo_path(folder: &Path) -> PathBuf {
    folder.join(NFO_FILE_NAME)
}

fn write_err(e: impl std::fmt::Display) -> NfoError {
    NfoError::Write(e.to_string())
}

/// Serialize a record to the sidecar document.
pub fn render_nfo(record: &MetadataRecord) -> Result<Vec<u8>, NfoError> {
    let fields = [
        ("title", record.title.as_deref().unwrap_or("")),
        ("year", record.year.as_deref().unwrap_or(PLACEHOLDER)),
        ("plot", record.plot.as_str()),
        ("rating", record.rating.as_str()),
        ("poster", record.poster_url.as_deref().unwrap_or(PLACEHOLDER)),
        ("imdbid", record.imdb_id.as_deref().unwrap_or("")),
    ];

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT)))
        .map_err(write_err)?;
    for (name, value) in fields {
        writer
            .create_element(name)
            .write_text_content(BytesText::new(value))
            .map_err(write_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(write_err)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write the sidecar for `folder`, replacing any existing one.
///
/// The document goes to a temporary sibling first and is renamed into place.
pub fn write_nfo(folder: &Path, record: &MetadataRecord) -> Result<PathBuf, NfoError> {
    let bytes = render_nfo(record)?;
    let path = nfo_path(folder);
    let tmp_path = folder.join(format!(
        ".{NFO_FILE_NAME}.{}.tmp",
        uuid::Uuid::new_v4().simple()
    ));

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| std::fs::rename(&tmp_path, &path)) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(NfoError::Io(e));
    }

    Ok(path)
}

/// Fields collected from a sidecar, plus the first syntax error hit, if any.
struct Scan {
    fields: HashMap<String, String>,
    error: Option<String>,
}

impl Scan {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim())
    }
}

/// Stream the document, keeping every child of the root read before an error.
fn scan(text: &str) -> Scan {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut fields = HashMap::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut current: Option<String> = None;

    let fail = |fields, msg: String| Scan {
        fields,
        error: Some(msg),
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                depth += 1;
                if depth == 1 {
                    if name != ROOT {
                        return fail(fields, format!("unexpected root element <{name}>"));
                    }
                    root_seen = true;
                } else if depth == 2 {
                    fields.entry(name.clone()).or_insert_with(String::new);
                    current = Some(name);
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match depth {
                    0 if name == ROOT => root_seen = true,
                    0 => return fail(fields, format!("unexpected root element <{name}>")),
                    1 => {
                        fields.entry(name).or_insert_with(String::new);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if depth == 2 {
                    if let Some(name) = current.as_ref() {
                        match e.unescape() {
                            Ok(text) => fields
                                .entry(name.clone())
                                .or_insert_with(String::new)
                                .push_str(&text),
                            Err(err) => return fail(fields, format!("<{name}>: {err}")),
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if depth == 2 {
                    if let Some(name) = current.as_ref() {
                        let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                        fields
                            .entry(name.clone())
                            .or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return fail(
                    fields,
                    format!("XML error at byte {}: {e}", reader.buffer_position()),
                );
            }
        }
    }

    if depth != 0 {
        return fail(fields, "document is truncated".to_string());
    }
    if !root_seen {
        return fail(fields, format!("no <{ROOT}> root element"));
    }
    Scan {
        fields,
        error: None,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != PLACEHOLDER)
        .map(str::to_string)
}

/// A year is usable only as four ASCII digits.
fn normalize_year(value: Option<&str>) -> Option<String> {
    non_blank(value).filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a sidecar strictly; any syntax or encoding problem is an error.
pub fn read_nfo(path: &Path) -> Result<MetadataRecord, NfoError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(NfoError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(NfoError::Io(e)),
    };
    let text =
        String::from_utf8(bytes).map_err(|e| NfoError::Parse(format!("invalid UTF-8: {e}")))?;

    let scan = scan(&text);
    if let Some(err) = scan.error {
        return Err(NfoError::Parse(err));
    }

    Ok(MetadataRecord {
        title: non_blank(scan.field("title")),
        year: non_blank(scan.field("year")),
        plot: scan.field("plot").unwrap_or(PLACEHOLDER).to_string(),
        rating: scan.field("rating").unwrap_or(PLACEHOLDER).to_string(),
        poster_url: non_blank(scan.field("poster")),
        imdb_id: non_blank(scan.field("imdbid")),
    })
}

/// Lenient read used by the narrow accessors below.
fn scan_lenient(path: &Path) -> Option<Scan> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read sidecar");
            return None;
        }
    };
    let scan = scan(&String::from_utf8_lossy(&bytes));
    if let Some(err) = scan.error.as_deref() {
        warn!(path = %path.display(), error = %err, "sidecar is malformed, using fields read so far");
    }
    Some(scan)
}

/// IMDb identifier from a sidecar, or `None` when absent or unreadable.
pub fn read_imdb_id(path: &Path) -> Option<String> {
    let scan = scan_lenient(path)?;
    non_blank(scan.field("imdbid"))
}

/// Title and year from a sidecar, each independently `None` when unusable.
pub fn read_title_year(path: &Path) -> (Option<String>, Option<String>) {
    let Some(scan) = scan_lenient(path) else {
        return (None, None);
    };
    (
        non_blank(scan.field("title")),
        normalize_year(scan.field("year")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inception() -> MetadataRecord {
        MetadataRecord {
            title: Some("Inception".into()),
            year: Some("2010".into()),
            plot: "A thief who steals corporate secrets.".into(),
            rating: "8.8".into(),
            poster_url: Some("https://image.tmdb.org/t/p/original/inception.jpg".into()),
            imdb_id: Some("tt1375666".into()),
        }
    }

    #[test]
    fn written_sidecar_has_every_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), &inception()).unwrap();
        assert_eq!(path, dir.path().join(NFO_FILE_NAME));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        for element in [
            "<title>Inception</title>",
            "<year>2010</year>",
            "<rating>8.8</rating>",
            "<imdbid>tt1375666</imdbid>",
        ] {
            assert!(text.contains(element), "missing {element} in {text}");
        }
        assert_eq!(read_nfo(&path).unwrap(), inception());
    }

    #[test]
    fn unknown_fields_use_placeholder() {
        let record = MetadataRecord {
            title: Some("Obscure".into()),
            year: None,
            plot: PLACEHOLDER.into(),
            rating: PLACEHOLDER.into(),
            poster_url: None,
            imdb_id: None,
        };
        let text = String::from_utf8(render_nfo(&record).unwrap()).unwrap();
        assert!(text.contains("<year>N/A</year>"));
        assert!(text.contains("<poster>N/A</poster>"));
        assert!(text.contains("<imdbid></imdbid>"));
    }

    #[test]
    fn special_characters_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = inception();
        record.title = Some("Tom & Jerry <Uncut>".into());
        let path = write_nfo(dir.path(), &record).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Tom &amp; Jerry &lt;Uncut&gt;"));
        assert_eq!(read_nfo(&path).unwrap().title, record.title);
    }

    #[test]
    fn write_replaces_existing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(nfo_path(dir.path()), "stale").unwrap();
        write_nfo(dir.path(), &inception()).unwrap();
        assert_eq!(read_nfo(&nfo_path(dir.path())).unwrap(), inception());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn missing_sidecar_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = nfo_path(dir.path());
        assert!(matches!(read_nfo(&path), Err(NfoError::Missing(_))));
        assert_eq!(read_imdb_id(&path), None);
        assert_eq!(read_title_year(&path), (None, None));
    }

    #[test]
    fn malformed_sidecar_fails_strict_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = nfo_path(dir.path());
        std::fs::write(&path, "<movie><title>Heat</year></movie>").unwrap();
        assert!(matches!(read_nfo(&path), Err(NfoError::Parse(_))));

        std::fs::write(&path, b"<movie><title>\xff\xfe</title></movie>").unwrap();
        assert!(matches!(read_nfo(&path), Err(NfoError::Parse(_))));
    }

    #[test]
    fn accessors_keep_fields_before_damage() {
        let dir = tempfile::tempdir().unwrap();
        let path = nfo_path(dir.path());
        std::fs::write(
            &path,
            "<movie>\n  <imdbid>tt0113277</imdbid>\n  <title>Heat</title>\n  <year>1995</year>\n  <plot>broken",
        )
        .unwrap();

        assert!(read_nfo(&path).is_err());
        assert_eq!(read_imdb_id(&path).as_deref(), Some("tt0113277"));
        assert_eq!(
            read_title_year(&path),
            (Some("Heat".to_string()), Some("1995".to_string()))
        );
    }

    #[test]
    fn unusable_year_keeps_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = nfo_path(dir.path());
        std::fs::write(
            &path,
            "<movie><title>Heat</title><year>None</year><imdbid>tt0113277</imdbid></movie>",
        )
        .unwrap();

        assert_eq!(read_imdb_id(&path).as_deref(), Some("tt0113277"));
        assert_eq!(read_title_year(&path), (Some("Heat".to_string()), None));
    }

    #[test]
    fn wrong_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = nfo_path(dir.path());
        std::fs::write(&path, "<tvshow><title>Lost</title></tvshow>").unwrap();
        assert!(matches!(read_nfo(&path), Err(NfoError::Parse(_))));
        assert_eq!(read_title_year(&path), (None, None));
    }
}
