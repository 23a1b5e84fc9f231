//! CRUD translator
//!
//! Maps canonical CRUD operations onto the correct remote verb for an
//! entity, transforming payloads on the way out. The batch form produces
//! one outcome per input op instead of raising on first failure.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::crud::{CrudOp, SyncOutcome};
use crate::error::AdapterResult;
use crate::manifest::EntityManifestEntry;
use crate::traits::EntityClient;
use crate::types::{CrudKind, RemoteOperation};

/// Apply one already-transformed payload to the remote system.
///
/// * `insert` strips the primary-key field (the remote system assigns its
///   own id) and calls create; a client without create capability is a
///   successful no-op.
/// * `update` and `upsert` both map to the remote update verb, with the
///   external id included in the payload.
/// * `delete` calls the delete verb; a no-op when unsupported.
#[instrument(skip(client, payload), fields(entity = client.entity()))]
pub async fn apply(
    client: &dyn EntityClient,
    kind: CrudKind,
    pk_field: Option<&str>,
    external_id: &str,
    payload: Value,
) -> AdapterResult<()> {
    match kind {
        CrudKind::Insert => {
            if !client.supports(RemoteOperation::Create) {
                debug!(external_id, "no create capability, skipping insert");
                return Ok(());
            }
            let mut attributes = payload;
            if let (Some(field), Some(obj)) = (pk_field, attributes.as_object_mut()) {
                obj.remove(field);
            }
            client.create(attributes).await?;
            Ok(())
        }
        CrudKind::Update | CrudKind::Upsert => {
            let mut attributes = payload;
            if let (Some(field), Some(obj)) = (pk_field, attributes.as_object_mut()) {
                obj.entry(field.to_string())
                    .or_insert_with(|| Value::String(external_id.to_string()));
            }
            client.update(external_id, attributes).await?;
            Ok(())
        }
        CrudKind::Delete => {
            if !client.supports(RemoteOperation::Delete) {
                debug!(external_id, "no delete capability, skipping delete");
                return Ok(());
            }
            client.delete(external_id).await
        }
    }
}

/// Apply a batch of canonical ops sequentially, in input order.
///
/// Per-op failures are absorbed into failed outcomes so one bad record
/// never aborts the rest of the batch.
pub async fn run_batch(
    entry: &EntityManifestEntry,
    client: &dyn EntityClient,
    ops: &[CrudOp],
) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::with_capacity(ops.len());
    for op in ops {
        outcomes.push(apply_one(entry, client, op).await);
    }
    outcomes
}

async fn apply_one(entry: &EntityManifestEntry, client: &dyn EntityClient, op: &CrudOp) -> SyncOutcome {
    // Best-effort id for the outcome even when extraction fails below.
    let display_id = op
        .primary_key
        .values()
        .next()
        .cloned()
        .unwrap_or_default();

    let result: AdapterResult<()> = async {
        let external_id = op.external_id()?;
        let payload = match op.op {
            CrudKind::Delete => Value::Null,
            kind => entry
                .transformer
                .to_external(&op.value, kind == CrudKind::Update)?,
        };
        apply(client, op.op, op.primary_key_field(), external_id, payload).await
    }
    .await;

    match result {
        Ok(()) => SyncOutcome::ok(&entry.name, display_id, op.op),
        Err(e) => {
            warn!(
                entity = %entry.name,
                external_id = %display_id,
                operation = %op.op,
                error = %e,
                "crud op failed"
            );
            SyncOutcome::failed(&entry.name, display_id, op.op, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointDefinition, EndpointDescriptor, HttpMethod};
    use crate::envelope::SingleEnvelope;
    use crate::error::AdapterError;
    use crate::manifest::EntityManifest;
    use crate::transform::FieldMap;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(Value),
        Update(String, Value),
        Delete(String),
    }

    struct MockClient {
        calls: Mutex<Vec<Call>>,
        supported: Vec<RemoteOperation>,
        fail_on: Option<String>,
    }

    impl MockClient {
        fn full() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                supported: vec![
                    RemoteOperation::Create,
                    RemoteOperation::Update,
                    RemoteOperation::Delete,
                ],
                fail_on: None,
            }
        }

        fn without(mut self, op: RemoteOperation) -> Self {
            self.supported.retain(|o| *o != op);
            self
        }

        fn failing_on(mut self, external_id: &str) -> Self {
            self.fail_on = Some(external_id.to_string());
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn check_fail(&self, id: &str) -> AdapterResult<()> {
            if self.fail_on.as_deref() == Some(id) {
                return Err(AdapterError::sync("update", "remote rejected"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntityClient for MockClient {
        fn entity(&self) -> &str {
            "Person"
        }

        fn supports(&self, op: RemoteOperation) -> bool {
            self.supported.contains(&op)
        }

        async fn get(&self, external_id: &str) -> AdapterResult<SingleEnvelope> {
            Ok(SingleEnvelope {
                data: json!({"id": external_id}),
                included: Vec::new(),
            })
        }

        async fn create(&self, attributes: Value) -> AdapterResult<SingleEnvelope> {
            self.calls.lock().unwrap().push(Call::Create(attributes));
            Ok(SingleEnvelope {
                data: json!({"id": "per_new"}),
                included: Vec::new(),
            })
        }

        async fn update(&self, external_id: &str, attributes: Value) -> AdapterResult<SingleEnvelope> {
            self.check_fail(external_id)?;
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(external_id.to_string(), attributes));
            Ok(SingleEnvelope {
                data: json!({"id": external_id}),
                included: Vec::new(),
            })
        }

        async fn delete(&self, external_id: &str) -> AdapterResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(external_id.to_string()));
            Ok(())
        }
    }

    fn person_entry() -> EntityManifestEntry {
        let manifest = EntityManifest::from_definitions(vec![EndpointDefinition {
            entity: "Person".to_string(),
            module: "people".to_string(),
            external_type: "Person".to_string(),
            operation: RemoteOperation::List,
            descriptor: EndpointDescriptor::new(HttpMethod::Get, "/people/v2/people"),
            fields: FieldMap::new()
                .map("id", "id")
                .map("first_name", "firstName"),
        }]);
        manifest.get("Person").unwrap().clone()
    }

    #[tokio::test]
    async fn test_insert_strips_primary_key() {
        let entry = person_entry();
        let client = MockClient::full();
        let ops = vec![CrudOp::new(
            CrudKind::Insert,
            "people",
            "per_1",
            json!({"id": "per_1", "firstName": "Ada"}),
        )];

        let outcomes = run_batch(&entry, &client, &ops).await;
        assert!(outcomes[0].success);

        match &client.calls()[0] {
            Call::Create(attrs) => {
                assert!(attrs.get("id").is_none());
                assert_eq!(attrs["first_name"], "Ada");
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_without_create_capability_is_noop_success() {
        let entry = person_entry();
        let client = MockClient::full().without(RemoteOperation::Create);
        let ops = vec![CrudOp::new(
            CrudKind::Insert,
            "people",
            "per_1",
            json!({"firstName": "Ada"}),
        )];

        let outcomes = run_batch(&entry, &client, &ops).await;
        assert!(outcomes[0].success);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_upsert_both_map_to_update() {
        let entry = person_entry();
        let client = MockClient::full();
        let ops = vec![
            CrudOp::new(CrudKind::Update, "people", "per_1", json!({"firstName": "A"})),
            CrudOp::new(CrudKind::Upsert, "people", "per_2", json!({"firstName": "B"})),
        ];

        let outcomes = run_batch(&entry, &client, &ops).await;
        assert!(outcomes.iter().all(|o| o.success));

        let calls = client.calls();
        assert!(matches!(&calls[0], Call::Update(id, _) if id == "per_1"));
        assert!(matches!(&calls[1], Call::Update(id, _) if id == "per_2"));
    }

    #[tokio::test]
    async fn test_batch_cardinality_and_order() {
        let entry = person_entry();
        let client = MockClient::full();
        let ops = vec![
            CrudOp::new(CrudKind::Insert, "people", "per_1", json!({"firstName": "A"})),
            CrudOp::new(CrudKind::Update, "people", "per_2", json!({"firstName": "B"})),
            CrudOp::delete("people", "per_3"),
        ];

        let outcomes = run_batch(&entry, &client, &ops).await;
        assert_eq!(outcomes.len(), ops.len());
        for (outcome, op) in outcomes.iter().zip(&ops) {
            assert_eq!(outcome.operation, op.op);
            assert!(outcome.success);
        }
        assert_eq!(outcomes[0].external_id, "per_1");
        assert_eq!(outcomes[2].external_id, "per_3");
    }

    #[tokio::test]
    async fn test_per_op_failure_does_not_abort_batch() {
        let entry = person_entry();
        let client = MockClient::full().failing_on("per_2");
        let ops = vec![
            CrudOp::new(CrudKind::Update, "people", "per_1", json!({"firstName": "A"})),
            CrudOp::new(CrudKind::Update, "people", "per_2", json!({"firstName": "B"})),
            CrudOp::new(CrudKind::Update, "people", "per_3", json!({"firstName": "C"})),
        ];

        let outcomes = run_batch(&entry, &client, &ops).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.as_deref().unwrap().contains("rejected"));
        assert!(outcomes[2].success);
    }

    #[tokio::test]
    async fn test_update_payload_is_partial_transform() {
        let entry = person_entry();
        let client = MockClient::full();
        let ops = vec![CrudOp::new(
            CrudKind::Update,
            "people",
            "per_1",
            json!({"firstName": "Ada"}),
        )];

        run_batch(&entry, &client, &ops).await;
        match &client.calls()[0] {
            Call::Update(_, attrs) => {
                // partial: only supplied fields plus the id, no nulled-out columns
                assert_eq!(attrs["first_name"], "Ada");
                assert_eq!(attrs["id"], "per_1");
                assert_eq!(attrs.as_object().unwrap().len(), 2);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }
}
