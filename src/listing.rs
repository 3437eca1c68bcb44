//! Listing normalizer: turns either `MLSD` facts or legacy `LIST` lines
//! into one ordered sequence of [`Entry`] values.

use std::collections::HashMap;

use chrono::NaiveDate;
use regex::Regex;

use super::types::{Entry, EntryKind, MalformedEntry};

lazy_static! {
    // Legacy listing line: eight whitespace-separated columns, then the name
    // (which may itself contain spaces).
    // drwxr-xr-x 2 owner group 4096 Jan 01 12:00 some name
    static ref LEGACY_RE: Regex = Regex::new(
        r"^(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(.+)$"
    ).unwrap();

    // `modify` fact: YYYYMMDDHHMMSS with optional fractional seconds.
    static ref MODIFY_RE: Regex = Regex::new(
        r"^(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(?:\.\d+)?$"
    ).unwrap();
}

/// Facts of one structured listing record, keyed by lowercased fact name.
pub type Facts = HashMap<String, String>;

/// A directory listing as it came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawListing {
    /// `MLSD` records already split into name and facts.
    Facts(Vec<(String, Facts)>),
    /// Free-text `LIST` lines.
    Lines(Vec<String>),
}

impl RawListing {
    /// Build a structured listing from raw `MLSD` lines, dropping the
    /// records that cannot be split.
    pub fn from_mlsd_lines<S: AsRef<str>>(lines: &[S]) -> RawListing {
        RawListing::Facts(
            lines
                .iter()
                .filter_map(|line| match parse_facts_line(line.as_ref()) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        trace!("skipping {}", err);
                        None
                    }
                })
                .collect(),
        )
    }
}

/// Split one `MLSD` record, `type=file;size=10;modify=20240101120000; a.txt`,
/// into its name and facts.
pub fn parse_facts_line(line: &str) -> Result<(String, Facts), MalformedEntry> {
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
    let (facts_str, name) = line
        .split_once(' ')
        .ok_or_else(|| MalformedEntry(line.to_string()))?;
    if name.is_empty() {
        return Err(MalformedEntry(line.to_string()));
    }

    let facts = facts_str
        .split(';')
        .filter_map(|fact| fact.split_once('='))
        .map(|(key, value)| (key.trim().to_lowercase(), value.to_string()))
        .collect();
    Ok((name.to_string(), facts))
}

/// Normalize one structured record. `Ok(None)` marks the current or parent
/// directory pseudo-entries.
pub fn parse_facts(name: &str, facts: &Facts) -> Result<Option<Entry>, MalformedEntry> {
    if name == "." || name == ".." {
        return Ok(None);
    }
    let kind = match facts.get("type").map(|t| t.to_lowercase()) {
        Some(ref t) if t == "cdir" || t == "pdir" => return Ok(None),
        Some(ref t) if t == "dir" => EntryKind::Directory,
        _ => EntryKind::File,
    };
    let size = match (kind, facts.get("size")) {
        (EntryKind::File, Some(size)) => size
            .parse::<u64>()
            .map_err(|_| MalformedEntry(format!("{}: size '{}'", name, size)))?,
        _ => 0,
    };
    let modified_at = facts.get("modify").map(|m| format_modify(m)).unwrap_or_default();

    Ok(Some(make_entry(name.to_string(), kind, size, modified_at)))
}

/// Parse one legacy `LIST` line. `Ok(None)` marks `.` and `..`.
pub fn parse_legacy_line(line: &str) -> Result<Option<Entry>, MalformedEntry> {
    let line = line.trim();
    let caps = LEGACY_RE
        .captures(line)
        .ok_or_else(|| MalformedEntry(line.to_string()))?;

    let name = caps[9].to_string();
    if name == "." || name == ".." {
        return Ok(None);
    }
    let kind = if caps[1].starts_with('d') { EntryKind::Directory } else { EntryKind::File };
    let size = caps[5]
        .parse::<u64>()
        .map_err(|_| MalformedEntry(line.to_string()))?;
    let modified_at = format!("{} {} {}", &caps[6], &caps[7], &caps[8]);

    Ok(Some(make_entry(name, kind, size, modified_at)))
}

fn make_entry(name: String, kind: EntryKind, size: u64, modified_at: String) -> Entry {
    let (size, human_size) = match kind {
        EntryKind::File => (Some(size), human_size(size)),
        EntryKind::Directory => (None, String::new()),
    };
    Entry { name, kind, size, modified_at, human_size }
}

/// Convert a raw listing into entries: directories first, then by name
/// ignoring case. Records that fail to parse are dropped.
pub fn normalize(raw: RawListing) -> Vec<Entry> {
    let parsed: Vec<Result<Option<Entry>, MalformedEntry>> = match raw {
        RawListing::Facts(records) => records
            .iter()
            .map(|&(ref name, ref facts)| parse_facts(name, facts))
            .collect(),
        RawListing::Lines(lines) => lines.iter().map(|line| parse_legacy_line(line)).collect(),
    };

    let mut entries: Vec<Entry> = parsed
        .into_iter()
        .filter_map(|res| match res {
            Ok(entry) => entry,
            Err(err) => {
                trace!("skipping {}", err);
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    entries
}

/// Decimal, magnitude-suffixed size: `"10 B"`, `"1.2 MB"`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["kB", "MB", "GB", "TB", "PB"];

    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

// Render `modify` as `YYYY-MM-DD HH:MM:SS`; keep unrecognised values as they are.
fn format_modify(raw: &str) -> String {
    MODIFY_RE
        .captures(raw)
        .and_then(|caps| {
            let (year, month, day) = (
                caps[1].parse::<i32>().ok()?,
                caps[2].parse::<u32>().ok()?,
                caps[3].parse::<u32>().ok()?,
            );
            let (hour, minute, second) = (
                caps[4].parse::<u32>().ok()?,
                caps[5].parse::<u32>().ok()?,
                caps[6].parse::<u32>().ok()?,
            );
            NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
        })
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}
