use chrono::{NaiveDate, TimeZone, Utc};
use crm_core::model::activity::{Activity, ActivityKind, SYSTEM_USER};
use crm_core::model::client::LEAD_CONVERTED_TAG;
use crm_core::model::task::TaskKind;
use crm_core::storage::StorageResult;
use crm_core::{
    Client, ClientPatch, ClientStatus, CrmStore, EntityKind, FixedClock, Lead, LeadSource,
    LocalStorage, MemoryStorage, Opportunity, StoreConfig, StoreError, Task, TaskPatch,
    TaskStatus, ValidationError, DEFAULT_STORAGE_KEY,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn store() -> CrmStore<MemoryStorage> {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    CrmStore::open(MemoryStorage::new(), StoreConfig::default().with_clock(clock)).unwrap()
}

fn client(name: &str) -> Client {
    Client::new(name, format!("{name}@example.com"), "Acme", today())
}

fn deal(client_id: &str, title: &str, value: f64) -> Opportunity {
    Opportunity::new(
        client_id,
        title,
        value,
        "Ana",
        today(),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    )
}

fn task(title: &str) -> Task {
    Task::new(title, TaskKind::Call, "Ana", today(), today())
}

#[test]
fn add_client_assigns_id_logs_activity_and_persists() {
    let mut store = store();

    let id = store.add_client(client("Maria")).unwrap();

    assert!(!id.is_empty());
    assert_eq!(store.client(&id).unwrap().name, "Maria");
    let activity = &store.activities()[0];
    assert_eq!(activity.kind, ActivityKind::ClientCreated);
    assert_eq!(activity.user, SYSTEM_USER);
    assert_eq!(activity.client_id.as_deref(), Some(id.as_str()));
    assert_eq!(store.metrics().clients.total, 1);

    let persisted = store
        .storage()
        .get_item(DEFAULT_STORAGE_KEY)
        .unwrap()
        .expect("document written after mutation");
    assert!(persisted.contains("\"clientes\""));
    assert!(persisted.contains("\"timestamp\""));
}

#[test]
fn invalid_client_is_rejected_without_side_effects() {
    let mut store = store();

    let err = store.add_client(client("   ")).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyField { field: "nome", .. })
    ));
    assert!(store.clients().is_empty());
    assert!(store.activities().is_empty());
    assert!(store.storage().is_empty());
}

#[test]
fn edit_client_merges_only_supplied_fields() {
    let mut store = store();
    let id = store.add_client(client("Maria")).unwrap();

    let patch = ClientPatch {
        status: Some(ClientStatus::Active),
        total_value: Some(12_500.0),
        ..ClientPatch::default()
    };
    store.edit_client(&id, patch).unwrap();

    let edited = store.client(&id).unwrap();
    assert_eq!(edited.status, ClientStatus::Active);
    assert_eq!(edited.total_value, 12_500.0);
    assert_eq!(edited.email, "Maria@example.com");
    assert_eq!(store.metrics().clients.active, 1);
}

#[test]
fn edit_that_breaks_validation_leaves_record_untouched() {
    let mut store = store();
    let id = store.add_client(client("Maria")).unwrap();

    let patch = ClientPatch {
        total_value: Some(-1.0),
        ..ClientPatch::default()
    };
    assert!(store.edit_client(&id, patch).is_err());
    assert_eq!(store.client(&id).unwrap().total_value, 0.0);
}

#[test]
fn unknown_ids_report_not_found() {
    let mut store = store();

    let err = store.remove_client("missing").unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Client,
            ..
        }
    ));
    assert!(matches!(
        store.edit_task("missing", TaskPatch::default()),
        Err(StoreError::NotFound {
            kind: EntityKind::Task,
            ..
        })
    ));
    assert!(store.complete_task("missing", None).is_err());
    assert!(store.storage().is_empty());
}

#[test]
fn removing_client_cascades_to_opportunities_and_tasks() {
    let mut store = store();
    let maria = store.add_client(client("Maria")).unwrap();
    let joao = store.add_client(client("Joao")).unwrap();
    let maria_deal = store.add_opportunity(deal(&maria, "ERP", 10_000.0)).unwrap();
    let joao_deal = store.add_opportunity(deal(&joao, "CRM", 5_000.0)).unwrap();

    let mut on_client = task("Call Maria");
    on_client.client_id = Some(maria.clone());
    let mut on_deal = task("Send ERP proposal");
    on_deal.opportunity_id = Some(maria_deal.clone());
    let mut unrelated = task("Call Joao");
    unrelated.client_id = Some(joao.clone());
    store.add_task(on_client).unwrap();
    store.add_task(on_deal).unwrap();
    let kept_task = store.add_task(unrelated).unwrap();
    let activities_before = store.activities().len();

    store.remove_client(&maria).unwrap();

    assert!(store.client(&maria).is_none());
    assert!(store.opportunity(&maria_deal).is_none());
    assert!(store.opportunity(&joao_deal).is_some());
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, kept_task);
    assert_eq!(store.activities().len(), activities_before);
}

#[test]
fn removing_lead_or_opportunity_cascades_to_linked_tasks() {
    let mut store = store();
    let lead = store
        .add_lead(Lead::new("Rita", "rita@example.com", LeadSource::Website, "Ana", today()))
        .unwrap();
    let owner = store.add_client(client("Maria")).unwrap();
    let opportunity = store.add_opportunity(deal(&owner, "ERP", 1_000.0)).unwrap();

    let mut lead_task = task("Qualify Rita");
    lead_task.lead_id = Some(lead.clone());
    let mut deal_task = task("Demo");
    deal_task.opportunity_id = Some(opportunity.clone());
    store.add_task(lead_task).unwrap();
    store.add_task(deal_task).unwrap();

    store.remove_lead(&lead).unwrap();
    assert_eq!(store.tasks().len(), 1);

    store.remove_opportunity(&opportunity).unwrap();
    assert!(store.tasks().is_empty());
    assert!(store.client(&owner).is_some());
}

#[test]
fn task_with_two_links_is_rejected() {
    let mut store = store();
    let mut linked = task("Ambiguous");
    linked.client_id = Some("c1".to_string());
    linked.lead_id = Some("l1".to_string());

    let err = store.add_task(linked).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MultipleTaskLinks)
    ));
}

#[test]
fn complete_task_stamps_date_and_result() {
    let mut store = store();
    let id = store.add_task(task("Follow up")).unwrap();
    assert_eq!(store.metrics().tasks.pending, 1);

    store
        .complete_task(&id, Some("Client agreed to a demo".to_string()))
        .unwrap();

    let done = store.task(&id).unwrap();
    assert_eq!(done.status, TaskStatus::Done);
    assert_eq!(done.completed_on, Some(today()));
    assert_eq!(done.result.as_deref(), Some("Client agreed to a demo"));
    assert_eq!(store.metrics().tasks.done, 1);
    assert_eq!(store.metrics().tasks.completion_rate, 100.0);
}

#[test]
fn activities_are_prepended_newest_first() {
    let mut store = store();
    store.add_client(client("Maria")).unwrap();

    let call = Activity::new(
        ActivityKind::CallMade,
        "Call with Maria",
        "Discussed renewal",
        "Ana",
        store.now(),
    );
    let id = store.log_activity(call).unwrap();

    assert_eq!(store.activities()[0].id, id);
    assert_eq!(store.activities()[0].kind, ActivityKind::CallMade);
    assert_eq!(store.activities()[1].kind, ActivityKind::ClientCreated);
    assert_eq!(store.recent_activities(1).len(), 1);
}

#[test]
fn converted_tag_marks_synthesized_clients_only() {
    let mut store = store();
    let id = store.add_client(client("Maria")).unwrap();
    assert!(!store.client(&id).unwrap().has_tag(LEAD_CONVERTED_TAG));
}

#[test]
fn edit_task_moves_link_from_client_to_lead() {
    let mut store = store();
    let client_id = store.add_client(client("Maria")).unwrap();
    let lead_id = store
        .add_lead(Lead::new("Rita", "rita@example.com", LeadSource::Event, "Ana", today()))
        .unwrap();
    let mut linked = task("Call Maria");
    linked.client_id = Some(client_id);
    let id = store.add_task(linked).unwrap();

    let patch: TaskPatch =
        serde_json::from_str(&format!(r#"{{"clienteId": null, "leadId": "{lead_id}"}}"#))
            .unwrap();
    store.edit_task(&id, patch).unwrap();

    let moved = store.task(&id).unwrap();
    assert_eq!(moved.client_id, None);
    assert_eq!(moved.lead_id.as_deref(), Some(lead_id.as_str()));

    let to_deal = TaskPatch {
        opportunity_id: Some(Some("o1".to_string())),
        ..TaskPatch::default()
    };
    store.edit_task(&id, to_deal).unwrap();

    let moved = store.task(&id).unwrap();
    assert_eq!(moved.lead_id, None);
    assert_eq!(moved.opportunity_id.as_deref(), Some("o1"));
}

#[test]
fn edit_task_reopens_completed_task() {
    let mut store = store();
    let id = store.add_task(task("Follow up")).unwrap();
    store.complete_task(&id, Some("done".to_string())).unwrap();

    let patch: TaskPatch = serde_json::from_str(
        r#"{"status": "pendente", "dataConclusao": null, "resultado": null}"#,
    )
    .unwrap();
    store.edit_task(&id, patch).unwrap();

    let reopened = store.task(&id).unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.completed_on, None);
    assert_eq!(reopened.result, None);
    assert_eq!(store.metrics().tasks.pending, 1);
}

/// Storage whose writes start failing once `fail` is raised.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fail: Arc<AtomicBool>,
}

impl LocalStorage for FlakyStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(rusqlite::Error::InvalidQuery.into());
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(rusqlite::Error::InvalidQuery.into());
        }
        self.inner.remove_item(key)
    }
}

#[test]
fn failed_write_rolls_back_the_mutation() {
    let storage = FlakyStorage::default();
    let fail = Arc::clone(&storage.fail);
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    let mut store = CrmStore::open(storage, StoreConfig::default().with_clock(clock)).unwrap();
    let kept = store.add_client(client("Maria")).unwrap();
    let persisted = store.storage().get_item(DEFAULT_STORAGE_KEY).unwrap();

    fail.store(true, Ordering::SeqCst);

    assert!(matches!(
        store.add_client(client("Joao")),
        Err(StoreError::Storage(_))
    ));
    assert_eq!(store.clients().len(), 1);
    assert_eq!(store.activities().len(), 1);
    assert_eq!(store.metrics().clients.total, 1);

    let patch = ClientPatch {
        total_value: Some(9_000.0),
        ..ClientPatch::default()
    };
    assert!(store.edit_client(&kept, patch).is_err());
    assert_eq!(store.client(&kept).unwrap().total_value, 0.0);

    assert!(store.remove_client(&kept).is_err());
    assert!(store.client(&kept).is_some());

    assert!(store.clear_all().is_err());
    assert_eq!(store.clients().len(), 1);

    assert_eq!(store.storage().get_item(DEFAULT_STORAGE_KEY).unwrap(), persisted);

    fail.store(false, Ordering::SeqCst);
    store.add_client(client("Joao")).unwrap();
    assert_eq!(store.clients().len(), 2);
}
