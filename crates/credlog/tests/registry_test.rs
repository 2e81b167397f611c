//! Registry façade over in-memory and file-backed topics

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use credlog::prelude::*;
use credlog::InstitutionUpdate;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tempfile::TempDir;

const INSTITUTIONS: TopicId = TopicId::new(0, 0, 100);
const APP: TopicId = TopicId::new(0, 0, 200);
const SUBMISSIONS: TopicId = TopicId::new(0, 0, 300);

fn config() -> RegistryConfig {
    RegistryConfig::new(
        TopicConfig::new(INSTITUTIONS)
            .with_app_topic(APP)
            .with_submission_topic(SUBMISSIONS),
    )
    .with_visibility(
        VisibilityConfig::new()
            .with_timeout(Duration::from_secs(10))
            .with_backoff(BackoffStrategy::Fixed(Duration::from_millis(500))),
    )
}

fn memory_registry(log_config: MemoryTopicLogConfig) -> (Registry, Arc<MemoryTopicLog>) {
    let log = Arc::new(MemoryTopicLog::new(log_config));
    (Registry::with_log(log.clone(), config()), log)
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn acme() -> Institution {
    Institution::new("Acme University")
        .with_did("did:hedera:testnet:acme")
        .with_type("EDUCATION")
        .with_creator("0.0.1001")
}

#[tokio::test]
async fn test_register_then_list_and_get() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());

    registry.register_institution(acme()).await.unwrap();
    registry
        .register_institution(Institution::new("Beta College").with_id("inst-b"))
        .await
        .unwrap();

    let all = registry.list_institutions().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].entity.name, "Acme University");
    assert_eq!(all[1].key, "inst-b");

    let acme = registry
        .get_institution("did:hedera:testnet:acme")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acme.entity.institution_type, "EDUCATION");
    assert_eq!(acme.entity.status, InstitutionStatus::Pending);
}

#[tokio::test]
async fn test_updates_merge_into_institution() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    let key = "did:hedera:testnet:acme";

    registry.register_institution(acme()).await.unwrap();
    registry
        .update_institution(key, fields(json!({ "status": "verified", "website": "https://acme.edu" })))
        .await
        .unwrap();

    let record = registry.get_institution(key).await.unwrap().unwrap();
    assert_eq!(record.entity.status, InstitutionStatus::Verified);
    assert_eq!(record.entity.extra["website"], "https://acme.edu");
    assert_eq!(record.entity.name, "Acme University");
    assert!(record.updated_at > record.created_at);

    registry.deactivate_institution(key).await.unwrap();
    let record = registry.get_institution(key).await.unwrap().unwrap();
    assert_eq!(record.entity.status, InstitutionStatus::Inactive);
}

#[tokio::test]
async fn test_unknown_institution_is_none() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    registry.register_institution(acme()).await.unwrap();

    assert!(registry.get_institution("did:nope").await.unwrap().is_none());
    assert!(registry.institutions_by_owner("0.0.9999").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_institutions_by_owner() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    registry.register_institution(acme()).await.unwrap();
    registry
        .register_institution(Institution::new("Mine Too").with_id("i2").with_creator("0.0.1001"))
        .await
        .unwrap();
    registry
        .register_institution(Institution::new("Other").with_id("i3").with_creator("0.0.2002"))
        .await
        .unwrap();

    let mine = registry.institutions_by_owner("0.0.1001").await.unwrap();
    let keys: Vec<_> = mine.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["did:hedera:testnet:acme", "i2"]);
}

#[tokio::test]
async fn test_institution_updated_by_id_when_keyed_by_did() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    registry
        .register_institution(acme().with_id("inst-1"))
        .await
        .unwrap();
    registry
        .update_institution("inst-1", fields(json!({ "status": "inactive" })))
        .await
        .unwrap();

    let by_id = registry.get_institution("inst-1").await.unwrap().unwrap();
    assert_eq!(by_id.key, "did:hedera:testnet:acme");
    assert_eq!(by_id.entity.status, InstitutionStatus::Inactive);

    let by_did = registry
        .get_institution("did:hedera:testnet:acme")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_did, by_id);
}

#[tokio::test]
async fn test_get_institution_merges_updates_from_its_own_topic() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default());
    let own_topic = TopicId::new(0, 0, 500);
    let key = "did:hedera:testnet:acme";

    registry
        .register_institution(acme().with_topic(own_topic.to_string()))
        .await
        .unwrap();
    let update = LedgerEvent::InstitutionUpdate(InstitutionUpdate::for_key(
        key,
        fields(json!({ "status": "verified" })),
    ));
    registry.submit_event(&own_topic, &update).await.unwrap();
    registry
        .create_form(CredentialForm::new("form-1", key, "Transcript"))
        .await
        .unwrap();
    assert_eq!(log.len(&own_topic), 2);

    let record = registry.get_institution(key).await.unwrap().unwrap();
    assert_eq!(record.entity.status, InstitutionStatus::Verified);
    assert_eq!(record.entity.name, "Acme University");

    // Forms on the same topic are untouched by the merge
    assert_eq!(registry.forms_for_institution(key).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_institutions_by_owner_includes_the_app_topic() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    registry.register_institution(acme()).await.unwrap();

    let legacy = Institution::new("Legacy Academy")
        .with_id("legacy-1")
        .with_creator("0.0.1001");
    registry
        .submit_event(&APP, &LedgerEvent::InstitutionRegistration(legacy))
        .await
        .unwrap();
    let update = LedgerEvent::InstitutionUpdate(InstitutionUpdate::for_key(
        "legacy-1",
        fields(json!({ "status": "active" })),
    ));
    registry.submit_event(&APP, &update).await.unwrap();

    let mine = registry.institutions_by_owner("0.0.1001").await.unwrap();
    let keys: Vec<_> = mine.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["did:hedera:testnet:acme", "legacy-1"]);
    assert_eq!(mine[1].entity.status, InstitutionStatus::Active);

    // The full listing stays on the institution topic
    assert_eq!(registry.list_institutions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_institution_stops_at_registration() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default().with_page_size(2));

    for i in 0..9 {
        registry
            .register_institution(Institution::new(format!("filler {i}")).with_id(format!("f{i}")))
            .await
            .unwrap();
    }
    registry.register_institution(Institution::new("Target").with_id("t")).await.unwrap();
    registry
        .update_institution("t", fields(json!({ "name": "Target, renamed" })))
        .await
        .unwrap();

    let before = log.pages_served();
    let record = registry.get_institution("t").await.unwrap().unwrap();
    assert_eq!(record.entity.name, "Target, renamed");
    assert_eq!(log.pages_served() - before, 1);
}

#[tokio::test]
async fn test_forms_follow_the_institution_topic() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default());
    let own_topic = TopicId::new(0, 0, 500);

    registry
        .register_institution(acme().with_topic(own_topic.to_string()))
        .await
        .unwrap();
    registry
        .register_institution(Institution::new("No Topic").with_did("did:plain"))
        .await
        .unwrap();

    registry
        .create_form(CredentialForm::new("form-1", "did:hedera:testnet:acme", "Transcript"))
        .await
        .unwrap();
    registry
        .create_form(CredentialForm::new("form-2", "did:plain", "Diploma"))
        .await
        .unwrap();

    assert_eq!(log.len(&own_topic), 1);
    assert_eq!(log.len(&APP), 1);

    let acme_forms = registry
        .forms_for_institution("did:hedera:testnet:acme")
        .await
        .unwrap();
    assert_eq!(acme_forms.len(), 1);
    assert_eq!(acme_forms[0].entity.name, "Transcript");

    let plain_forms = registry.forms_for_institution("did:plain").await.unwrap();
    assert_eq!(plain_forms.len(), 1);
    assert_eq!(plain_forms[0].key, "form-2");
}

#[tokio::test]
async fn test_form_update_and_delete() {
    let (registry, _log) = memory_registry(MemoryTopicLogConfig::default());
    let did = "did:hedera:testnet:acme";
    registry.register_institution(acme()).await.unwrap();

    let form = CredentialForm::new("form-1", did, "Transcript")
        .with_field(FormField::new("Student name", FieldType::Text).required());
    registry.create_form(form).await.unwrap();
    registry
        .update_form(did, "form-1", fields(json!({ "description": "Official transcript" })))
        .await
        .unwrap();

    let record = registry.get_form(did, "form-1").await.unwrap().unwrap();
    assert_eq!(record.entity.description, "Official transcript");
    assert_eq!(record.entity.fields.len(), 1);

    // Another institution cannot see it through its own lookup
    assert!(registry.get_form("did:other", "form-1").await.unwrap().is_none());

    registry.delete_form(did, "form-1").await.unwrap();
    assert!(registry.get_form(did, "form-1").await.unwrap().is_none());
    assert!(registry.forms_for_institution(did).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submissions_for_form() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default());

    let mut submission = FormSubmission::new("sub-1", "form-1");
    submission.applicant_id = Some("0.0.4242".to_string());
    submission.extra.insert("answers".into(), json!({ "Student name": "Ada" }));
    registry.submit_application(submission).await.unwrap();
    registry
        .submit_application(FormSubmission::new("sub-2", "form-2"))
        .await
        .unwrap();

    assert_eq!(log.len(&SUBMISSIONS), 2);
    let subs = registry.submissions_for_form("form-1").await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].entity.applicant_id.as_deref(), Some("0.0.4242"));
}

#[tokio::test(start_paused = true)]
async fn test_submit_does_not_wait_for_visibility() {
    let (registry, _log) = memory_registry(
        MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(3)),
    );
    let key = "did:hedera:testnet:acme";

    let receipt = registry.register_institution(acme()).await.unwrap();
    assert_eq!(receipt.topic_id, INSTITUTIONS);
    assert!(registry.get_institution(key).await.unwrap().is_none());

    match registry.await_institution(key).await.unwrap() {
        Visibility::Visible(record) => assert_eq!(record.entity.name, "Acme University"),
        other => panic!("expected visible, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_not_yet_visible_is_an_outcome() {
    let (registry, _log) = memory_registry(
        MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(60)),
    );
    registry.register_institution(acme()).await.unwrap();

    let outcome = registry
        .await_institution("did:hedera:testnet:acme")
        .await
        .unwrap();
    match outcome {
        Visibility::NotYetVisible { attempts, waited } => {
            assert!(attempts > 1);
            assert_eq!(waited, Duration::from_secs(10));
        }
        Visibility::Visible(_) => panic!("should not be visible yet"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_await_form() {
    let (registry, _log) = memory_registry(
        MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(1)),
    );
    registry
        .create_form(CredentialForm::new("form-1", "did:x", "Badge"))
        .await
        .unwrap();

    let outcome = registry.await_form("did:x", "form-1").await.unwrap();
    assert!(outcome.is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_await_institution_change_waits_for_the_update() {
    let (registry, _log) = memory_registry(
        MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(2)),
    );
    let key = "did:hedera:testnet:acme";
    registry.register_institution(acme()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let receipt = registry
        .update_institution(key, fields(json!({ "status": "verified" })))
        .await
        .unwrap();

    // The existing record is visible at once, without the update
    let stale = registry.await_institution(key).await.unwrap().into_option().unwrap();
    assert_eq!(stale.entity.status, InstitutionStatus::Pending);

    match registry.await_institution_change(key, &receipt).await.unwrap() {
        Visibility::Visible(record) => {
            assert_eq!(record.entity.status, InstitutionStatus::Verified);
            assert!(record.updated_at >= receipt.consensus_timestamp);
        }
        other => panic!("expected visible, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_await_form_change_and_removal() {
    let (registry, _log) = memory_registry(
        MemoryTopicLogConfig::default().with_propagation_delay(Duration::from_secs(1)),
    );
    registry
        .create_form(CredentialForm::new("form-1", "did:x", "Badge"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let receipt = registry
        .update_form("did:x", "form-1", fields(json!({ "active": false })))
        .await
        .unwrap();
    let record = registry
        .await_form_change("did:x", "form-1", &receipt)
        .await
        .unwrap()
        .into_option()
        .unwrap();
    assert!(!record.entity.active);

    registry.delete_form("did:x", "form-1").await.unwrap();
    assert!(registry.get_form("did:x", "form-1").await.unwrap().is_some());
    assert!(registry
        .await_form_removed("did:x", "form-1")
        .await
        .unwrap()
        .is_visible());
    assert!(registry.get_form("did:x", "form-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_entries_are_skipped() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default());
    registry.register_institution(acme()).await.unwrap();

    log.append_raw(
        &INSTITUTIONS,
        TopicMessage {
            consensus_timestamp: "9999999999.000000000".into(),
            sequence_number: 2,
            message: STANDARD.encode("not json"),
        },
    );
    log.append_raw(
        &INSTITUTIONS,
        TopicMessage {
            consensus_timestamp: "9999999999.000000001".into(),
            sequence_number: 3,
            message: STANDARD.encode(r#"{"type":"CREDENTIAL_REQUEST","data":{}}"#),
        },
    );
    registry
        .register_institution(Institution::new("After").with_id("after"))
        .await
        .unwrap();

    let run = registry.project::<Institution>(&INSTITUTIONS).await.unwrap();
    assert_eq!(run.projection.len(), 2);
    assert_eq!(run.decode.invalid_json, 1);
    assert_eq!(run.decode.unknown_kind, 1);
}

#[tokio::test]
async fn test_writes_validate_keys() {
    let (registry, log) = memory_registry(MemoryTopicLogConfig::default());

    let err = registry
        .register_institution(Institution::new("Nameless"))
        .await
        .unwrap_err();
    assert!(matches!(err, CredlogError::InvalidState(_)));

    let err = registry
        .create_form(CredentialForm::new("", "did:x", "Nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, CredlogError::InvalidState(_)));
    assert!(log.is_empty(&INSTITUTIONS));
}

#[tokio::test]
async fn test_read_only_registry_rejects_writes() {
    let log = Arc::new(MemoryTopicLog::default());
    let registry = Registry::new(log.clone(), Arc::new(ReadOnlyWriter), config());

    let err = registry.register_institution(acme()).await.unwrap_err();
    assert!(matches!(err, CredlogError::Submit(_)));
    assert!(log.is_empty(&INSTITUTIONS));
}

#[tokio::test]
async fn test_file_backed_registry_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let open = || {
        let log = FileTopicLog::open(FileTopicLogConfig::new(temp.path())).unwrap();
        Registry::with_log(Arc::new(log), config())
    };

    {
        let registry = open();
        registry.register_institution(acme()).await.unwrap();
        registry
            .update_institution("did:hedera:testnet:acme", fields(json!({ "status": "active" })))
            .await
            .unwrap();
    }

    let registry = open();
    let record = registry
        .get_institution("did:hedera:testnet:acme")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.entity.status, InstitutionStatus::Active);
}
