//! Founder sub-import for startup records.
//!
//! A startup's `founders` array is rewritten before the startup is POSTed:
//! each founder becomes `{name, id_legacy, image}` with the image fetched
//! from the ancient API. Image fetches are paced; founders without an id are
//! dropped and logged.

use serde_json::{json, Value};

use crate::clean::clean_text;
use crate::clients::LegacyApi;
use crate::logbook::Logbook;
use crate::throttle::Pacer;

/// Rewrite `record["founders"]` in place. Expects the record to already carry
/// `id_legacy` (the startup's legacy id, needed for the image endpoint).
pub(crate) async fn prepare_founders(
    record: &mut Value,
    legacy: &dyn LegacyApi,
    pacer: &mut Pacer,
    logbook: &Logbook,
    resource: &str,
) {
    let Some(startup_id) = record.get("id_legacy").and_then(Value::as_i64) else {
        return;
    };
    let Some(raw_founders) = record.get("founders").and_then(Value::as_array).cloned() else {
        return;
    };

    let mut prepared = Vec::with_capacity(raw_founders.len());
    for founder in raw_founders {
        let Some(founder_id) = founder.get("id").and_then(Value::as_i64) else {
            logbook.append(
                resource,
                &format!("startup {startup_id}: founder without id skipped"),
            );
            continue;
        };
        let name = founder
            .get("name")
            .and_then(Value::as_str)
            .map(clean_text)
            .unwrap_or_default();

        pacer.wait().await;
        let image = legacy.fetch_founder_image(startup_id, founder_id).await;

        prepared.push(json!({
            "name": name,
            "id_legacy": founder_id,
            "image": image,
        }));
    }

    record["founders"] = Value::Array(prepared);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::clients::{ClientError, DetailOutcome};

    /// Legacy API fake that records which founder images were requested.
    #[derive(Default)]
    struct ImageLog {
        requested: Mutex<Vec<(i64, i64)>>,
        missing: Vec<i64>,
    }

    #[async_trait]
    impl LegacyApi for ImageLog {
        async fn fetch_all(&self, _resource: &str) -> Result<Vec<Value>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_detail(&self, _resource: &str, _id: i64) -> DetailOutcome {
            DetailOutcome::Missing
        }

        async fn fetch_image(&self, _resource: &str, _id: i64) -> Option<String> {
            None
        }

        async fn fetch_founder_image(&self, startup_id: i64, founder_id: i64) -> Option<String> {
            self.requested.lock().unwrap().push((startup_id, founder_id));
            if self.missing.contains(&founder_id) {
                None
            } else {
                Some(format!("img-{founder_id}"))
            }
        }
    }

    #[tokio::test]
    async fn rewrites_founders_with_images() {
        let legacy = ImageLog::default();
        let logbook = Logbook::new(tempfile::tempdir().unwrap().path());
        let mut pacer = Pacer::new(Duration::ZERO);
        let mut record = json!({
            "id_legacy": 9,
            "founders": [
                {"id": 1, "name": "\x00Ada"},
                {"id": 2, "name": "Grace"}
            ]
        });

        prepare_founders(&mut record, &legacy, &mut pacer, &logbook, "startups").await;

        let founders = record["founders"].as_array().unwrap();
        assert_eq!(founders.len(), 2);
        assert_eq!(founders[0], json!({"name": "Ada", "id_legacy": 1, "image": "img-1"}));
        assert_eq!(founders[1]["image"], "img-2");
        assert_eq!(
            *legacy.requested.lock().unwrap(),
            vec![(9, 1), (9, 2)]
        );
    }

    #[tokio::test]
    async fn founder_without_id_is_dropped_without_image_fetch() {
        let legacy = ImageLog::default();
        let dir = tempfile::tempdir().unwrap();
        let logbook = Logbook::new(dir.path());
        let mut pacer = Pacer::new(Duration::ZERO);
        let mut record = json!({
            "id_legacy": 9,
            "founders": [{"name": "Nameless"}, {"id": 3, "name": "Kept"}]
        });

        prepare_founders(&mut record, &legacy, &mut pacer, &logbook, "startups").await;

        let founders = record["founders"].as_array().unwrap();
        assert_eq!(founders.len(), 1);
        assert_eq!(founders[0]["id_legacy"], 3);
        assert_eq!(*legacy.requested.lock().unwrap(), vec![(9, 3)]);

        let log = std::fs::read_to_string(dir.path().join("startups.log")).unwrap();
        assert!(log.contains("founder without id skipped"));
    }

    #[tokio::test]
    async fn image_failure_yields_null_not_error() {
        let legacy = ImageLog {
            missing: vec![4],
            ..Default::default()
        };
        let logbook = Logbook::new(tempfile::tempdir().unwrap().path());
        let mut pacer = Pacer::new(Duration::ZERO);
        let mut record = json!({"id_legacy": 9, "founders": [{"id": 4, "name": "Shy"}]});

        prepare_founders(&mut record, &legacy, &mut pacer, &logbook, "startups").await;

        assert_eq!(record["founders"][0]["image"], Value::Null);
    }

    #[tokio::test]
    async fn records_without_founders_are_untouched() {
        let legacy = ImageLog::default();
        let logbook = Logbook::new(tempfile::tempdir().unwrap().path());
        let mut pacer = Pacer::new(Duration::ZERO);
        let mut record = json!({"id_legacy": 9, "name": "solo"});
        let before = record.clone();

        prepare_founders(&mut record, &legacy, &mut pacer, &logbook, "startups").await;

        assert_eq!(record, before);
    }
}
