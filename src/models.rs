use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A normalized fund record: domain field name -> scalar value.
///
/// A record may be empty, which is the "no data available" sentinel. Fetchers
/// always return a record shape, never a missing result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a record from a vendor payload object using a rename table.
    ///
    /// Only vendor keys listed in `renames` are carried over; everything else
    /// in the payload is dropped. Null values are dropped too, so a response
    /// of all-null fields normalizes to an empty record. String values are
    /// whitespace-trimmed with embedded newlines collapsed.
    pub fn from_payload(payload: &Value, renames: &[(&str, &str)]) -> Self {
        let mut record = Self::empty();
        let Some(object) = payload.as_object() else {
            return record;
        };
        for (vendor_key, field) in renames {
            match object.get(*vendor_key) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => {
                    let cleaned = s.split_whitespace().collect::<Vec<_>>().join(" ");
                    record.insert(field, Value::String(cleaned));
                }
                Some(value) => record.insert(field, value.clone()),
            }
        }
        record
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Tags the record with its source fund code unless the fetcher already
    /// filled one in. The batch runner aggregates in completion order, so the
    /// tag is what lets callers re-sort by submission order.
    pub fn tag_code(&mut self, code: &str) {
        if !self.fields.contains_key("code") {
            self.insert("code", Value::String(code.to_string()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Policy for identifiers whose fetch yields an empty record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Keep an all-empty record in the aggregate, one per identifier.
    IncludeEmpty,
    /// Drop the identifier's contribution entirely.
    Omit,
}

impl EmptyPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            EmptyPolicy::IncludeEmpty => "include-empty",
            EmptyPolicy::Omit => "omit",
        }
    }
}

/// One entry of the filing-announcement listing for a fund.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub artifact_id: String,
    pub title: String,
}

/// One unit of download work: a remote PDF bound to its destination path.
///
/// Consumed by exactly one download task; a zero-length payload rolls the
/// written file back so no empty artifact is left on disk.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub code: String,
    pub url: String,
    pub dest: PathBuf,
}

impl DownloadJob {
    pub fn new(code: &str, url: String, entry: &ReportEntry, dest_root: &Path) -> Self {
        let filename = format!("{}.pdf", sanitize_filename(&entry.title));
        Self {
            code: code.to_string(),
            url,
            dest: dest_root.join(code).join(filename),
        }
    }
}

fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '-' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_renames_and_drops() {
        let payload = json!({
            "FCODE": "000001",
            "SHORTNAME": "Fund A",
            "DWJZ": 1.23,
            "UNMAPPED": "ignored",
        });
        let renames = [("FCODE", "code"), ("SHORTNAME", "name"), ("DWJZ", "latest_nav")];
        let record = Record::from_payload(&payload, &renames);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("code"), Some(&json!("000001")));
        assert_eq!(record.get("latest_nav"), Some(&json!(1.23)));
        assert_eq!(record.get("UNMAPPED"), None);
    }

    #[test]
    fn test_from_payload_null_and_missing_fields_absent() {
        let payload = json!({ "FCODE": null });
        let renames = [("FCODE", "code"), ("SHORTNAME", "name")];
        let record = Record::from_payload(&payload, &renames);
        assert!(record.is_empty());
    }

    #[test]
    fn test_from_payload_non_object_is_empty() {
        let record = Record::from_payload(&json!([1, 2, 3]), &[("A", "a")]);
        assert!(record.is_empty());
    }

    #[test]
    fn test_from_payload_trims_strings() {
        let payload = json!({ "COMMENTS": "  a fund\nwith newlines  " });
        let record = Record::from_payload(&payload, &[("COMMENTS", "summary")]);
        assert_eq!(record.get("summary"), Some(&json!("a fund with newlines")));
    }

    #[test]
    fn test_tag_code_does_not_overwrite() {
        let mut record = Record::empty();
        record.insert("code", json!("000001"));
        record.tag_code("999999");
        assert_eq!(record.get("code"), Some(&json!("000001")));

        let mut empty = Record::empty();
        empty.tag_code("000002");
        assert_eq!(empty.get("code"), Some(&json!("000002")));
    }

    #[test]
    fn test_download_job_dest_path() {
        let entry = ReportEntry {
            artifact_id: "AN123".to_string(),
            title: "2023 Annual Report: Part 1/2".to_string(),
        };
        let job = DownloadJob::new(
            "000001",
            "http://example.com/a.pdf".to_string(),
            &entry,
            Path::new("./pdf"),
        );
        assert_eq!(
            job.dest,
            Path::new("./pdf/000001/2023 Annual Report- Part 1-2.pdf")
        );
    }
}
