use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

const PREFIX: &str = "grafico_bobina_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `grafico_bobina_<coil>_<YYYYMMDD_HHMMSS>.png`.
///
/// Anything outside `[A-Za-z0-9_-]` in the coil id becomes `_` so the name
/// can never escape the chart directory.
pub fn artifact_filename(coil_id: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{PREFIX}{}_{}.png",
        sanitize(coil_id),
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

fn sanitize(coil_id: &str) -> String {
    coil_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// First free path for `filename` in `dir`: the name itself, then
/// `<stem>_2.png`, `<stem>_3.png`, …
pub fn unique_artifact_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (filename, String::new()),
    };
    (2u32..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn matches_pattern(name: &str, id: &str) -> bool {
        let Some(rest) = name.strip_prefix(&format!("{PREFIX}{id}_")) else {
            return false;
        };
        let Some(ts) = rest.strip_suffix(".png") else {
            return false;
        };
        let bytes = ts.as_bytes();
        bytes.len() == 15
            && bytes[8] == b'_'
            && bytes[..8].iter().chain(&bytes[9..]).all(u8::is_ascii_digit)
    }

    #[test]
    fn formats_timestamp() {
        assert_eq!(
            artifact_filename("B1234", at(7, 5, 9)),
            "grafico_bobina_B1234_20241105_070509.png"
        );
    }

    #[test]
    fn pattern_holds_for_arbitrary_ids() {
        for id in ["42", "AB-12_x", "", "bobina 7", "a/b\\c", "çã.ü"] {
            let name = artifact_filename(id, at(23, 59, 59));
            assert!(matches_pattern(&name, &sanitize(id)), "{name}");
            assert!(!name.contains('/') && !name.contains('\\'));
        }
        assert_eq!(sanitize("a/b c"), "a_b_c");
    }

    #[test]
    fn same_second_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let name = artifact_filename("7", at(10, 0, 0));

        let first = unique_artifact_path(dir.path(), &name);
        assert_eq!(first, dir.path().join(&name));
        std::fs::write(&first, b"x").unwrap();

        let second = unique_artifact_path(dir.path(), &name);
        assert_eq!(second, dir.path().join("grafico_bobina_7_20241105_100000_2.png"));
        std::fs::write(&second, b"x").unwrap();

        let third = unique_artifact_path(dir.path(), &name);
        assert_eq!(third, dir.path().join("grafico_bobina_7_20241105_100000_3.png"));
    }
}
