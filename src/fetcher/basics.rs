//! Fund basic-information fetcher (FundMNNBasicInformation).
//!
//! This is the fetcher multi-code lookups fan out through the batch runner.

use crate::endpoint::{EndpointClient, FetchError};
use crate::fetcher::{mobile_params, RecordFetcher};
use crate::models::{EmptyPolicy, Record};
use async_trait::async_trait;
use serde_json::Value;

const RENAMES: &[(&str, &str)] = &[
    ("FCODE", "code"),
    ("SHORTNAME", "name"),
    ("ESTABDATE", "inception_date"),
    ("RZDF", "change_pct"),
    ("DWJZ", "latest_nav"),
    ("JJGS", "manager"),
    ("FSRQ", "nav_date"),
    ("COMMENTS", "summary"),
];

pub struct BasicsFetcher {
    client: EndpointClient,
}

impl BasicsFetcher {
    pub fn new(client: EndpointClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordFetcher for BasicsFetcher {
    fn name(&self) -> &'static str {
        "basics"
    }

    fn empty_policy(&self) -> EmptyPolicy {
        // Keep one row per requested code so a multi-code lookup stays
        // positionally re-sortable by the caller.
        EmptyPolicy::IncludeEmpty
    }

    async fn fetch(&self, code: &str) -> Result<Record, FetchError> {
        let mut params = mobile_params(&self.client.config().credentials);
        params.push(("FCODE", code.to_string()));

        let url = self.client.api_url("FundMNNBasicInformation");
        let payload = self.client.get_json(&url, &params).await?;
        Ok(basics_record(&payload))
    }
}

/// Normalizes one basic-information payload. A null or missing `Datas`
/// object is the no-data shape and yields an empty record.
fn basics_record(payload: &Value) -> Record {
    Record::from_payload(&payload["Datas"], RENAMES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basics_record_renames_fields() {
        let payload = json!({
            "Datas": {
                "FCODE": "000001",
                "SHORTNAME": "华夏成长混合",
                "ESTABDATE": "2001-12-18",
                "RZDF": "-0.52",
                "DWJZ": "1.06",
                "JJGS": "华夏基金",
                "FSRQ": "2021-01-15",
                "COMMENTS": "  稳健成长\n混合型基金 ",
                "RISKLEVEL": "3",
            }
        });

        let record = basics_record(&payload);
        assert_eq!(record.get("code"), Some(&json!("000001")));
        assert_eq!(record.get("latest_nav"), Some(&json!("1.06")));
        assert_eq!(record.get("summary"), Some(&json!("稳健成长 混合型基金")));
        // Unmapped vendor keys are dropped.
        assert_eq!(record.get("RISKLEVEL"), None);
    }

    #[test]
    fn test_basics_record_no_data_is_empty() {
        assert!(basics_record(&json!({ "Datas": null })).is_empty());
        assert!(basics_record(&json!({})).is_empty());
    }
}
