//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the CRM store to Dart through one opaque handle.
//! - Exchange records as the same JSON shapes the store persists.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Mutations answer with a `CrmActionResponse`; import answers with a bool.
//! - One handle owns one store; calls on a handle are serialized by its lock.

use crm_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Activity, Client, ClientPatch, CrmStore, EntityId, Lead, LeadPatch, Opportunity,
    OpportunityPatch, PipelineStage, SqliteLocalStorage, StoreConfig, StoreResult, Task,
    TaskPatch, User,
};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DB_PATH_ENV: &str = "CRM_DB_PATH";
const DB_FILE_NAME: &str = "crm_local_storage.sqlite3";

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Id of the created (or affected) record.
    pub entity_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl CrmActionResponse {
    fn success(message: impl Into<String>, entity_id: Option<EntityId>) -> Self {
        Self {
            ok: true,
            entity_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entity_id: None,
            message: message.into(),
        }
    }
}

/// Opaque handle around one SQLite-backed CRM store.
#[flutter_rust_bridge::frb(opaque)]
pub struct CrmHandle {
    store: Mutex<CrmStore<SqliteLocalStorage>>,
}

impl CrmHandle {
    /// Opens the store at `db_path`, falling back to `CRM_DB_PATH` and then
    /// to a file in the system temp directory.
    ///
    /// `users_json` is the read-only sales rep roster (a JSON array of
    /// users); `sales_target` overrides the default dashboard target.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(
        db_path: Option<String>,
        users_json: Option<String>,
        sales_target: Option<f64>,
    ) -> Result<CrmHandle, String> {
        let mut config = StoreConfig::default();
        if let Some(json) = users_json {
            config = config.with_users(decode::<Vec<User>>(&json)?);
        }
        if let Some(target) = sales_target {
            if !target.is_finite() || target < 0.0 {
                return Err(format!("sales target must be a non-negative amount, got {target}"));
            }
            config.sales_target = target;
        }

        let path = resolve_db_path(db_path);
        let storage = SqliteLocalStorage::open(&path)
            .map_err(|err| format!("storage open failed at `{}`: {err}", path.display()))?;
        let store = CrmStore::open(storage, config)
            .map_err(|err| format!("store open failed: {err}"))?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    /// Collections, users and metrics as one JSON document.
    #[flutter_rust_bridge::frb(sync)]
    pub fn snapshot(&self) -> Result<String, String> {
        let store = self.lock()?;
        store.snapshot_json().map_err(|err| err.to_string())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn metrics_json(&self) -> Result<String, String> {
        let store = self.lock()?;
        serde_json::to_string(store.metrics()).map_err(|err| err.to_string())
    }

    /// Sales report for the reports page.
    #[flutter_rust_bridge::frb(sync)]
    pub fn sales_report_json(&self) -> Result<String, String> {
        self.view(|store| store.sales_report())
    }

    /// Pipeline board: one column per stage, in pipeline order.
    #[flutter_rust_bridge::frb(sync)]
    pub fn pipeline_summary_json(&self) -> Result<String, String> {
        self.view(|store| store.pipeline_summary())
    }

    /// Pending tasks, earliest due first, at most `limit`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn pending_tasks_json(&self, limit: u32) -> Result<String, String> {
        self.view(|store| {
            store.pending_tasks(limit as usize)
                .into_iter()
                .cloned()
                .collect::<Vec<Task>>()
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn overdue_tasks_json(&self) -> Result<String, String> {
        self.view(|store| {
            store.overdue_tasks()
                .into_iter()
                .cloned()
                .collect::<Vec<Task>>()
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn tasks_for_owner_json(&self, owner: String) -> Result<String, String> {
        self.view(|store| {
            store.tasks_for_owner(&owner)
                .into_iter()
                .cloned()
                .collect::<Vec<Task>>()
        })
    }

    /// Latest activities, newest first, at most `limit`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn recent_activities_json(&self, limit: u32) -> Result<String, String> {
        self.view(|store| {
            store.recent_activities(limit as usize)
                .into_iter()
                .cloned()
                .collect::<Vec<Activity>>()
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_client(&self, client_json: String) -> CrmActionResponse {
        self.create::<Client>("add_client", &client_json, CrmStore::add_client)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn edit_client(&self, id: String, patch_json: String) -> CrmActionResponse {
        self.update::<ClientPatch>("edit_client", &id, &patch_json, |store, id, patch| {
            store.edit_client(id, patch)
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_client(&self, id: String) -> CrmActionResponse {
        self.act("remove_client", &id, |store| store.remove_client(&id))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_lead(&self, lead_json: String) -> CrmActionResponse {
        self.create::<Lead>("add_lead", &lead_json, CrmStore::add_lead)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn edit_lead(&self, id: String, patch_json: String) -> CrmActionResponse {
        self.update::<LeadPatch>("edit_lead", &id, &patch_json, |store, id, patch| {
            store.edit_lead(id, patch)
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_lead(&self, id: String) -> CrmActionResponse {
        self.act("remove_lead", &id, |store| store.remove_lead(&id))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_opportunity(&self, opportunity_json: String) -> CrmActionResponse {
        self.create::<Opportunity>("add_opportunity", &opportunity_json, CrmStore::add_opportunity)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn edit_opportunity(&self, id: String, patch_json: String) -> CrmActionResponse {
        self.update::<OpportunityPatch>("edit_opportunity", &id, &patch_json, |store, id, patch| {
            store.edit_opportunity(id, patch)
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_opportunity(&self, id: String) -> CrmActionResponse {
        self.act("remove_opportunity", &id, |store| store.remove_opportunity(&id))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_task(&self, task_json: String) -> CrmActionResponse {
        self.create::<Task>("add_task", &task_json, CrmStore::add_task)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn edit_task(&self, id: String, patch_json: String) -> CrmActionResponse {
        self.update::<TaskPatch>("edit_task", &id, &patch_json, |store, id, patch| {
            store.edit_task(id, patch)
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_task(&self, id: String) -> CrmActionResponse {
        self.act("remove_task", &id, |store| store.remove_task(&id))
    }

    /// Converts a lead; `entity_id` carries the new opportunity id.
    #[flutter_rust_bridge::frb(sync)]
    pub fn convert_lead_to_opportunity(
        &self,
        lead_id: String,
        opportunity_json: String,
    ) -> CrmActionResponse {
        let opportunity = match decode::<Opportunity>(&opportunity_json) {
            Ok(opportunity) => opportunity,
            Err(message) => return CrmActionResponse::failure(message),
        };
        let mut store = match self.lock() {
            Ok(store) => store,
            Err(message) => return CrmActionResponse::failure(message),
        };
        match store.convert_lead_to_opportunity(&lead_id, opportunity) {
            Ok(outcome) => CrmActionResponse::success(
                format!("lead converted; client {}", outcome.client_id),
                Some(outcome.opportunity_id),
            ),
            Err(err) => CrmActionResponse::failure(format!("convert_lead failed: {err}")),
        }
    }

    /// Moves an opportunity to a stage given by its wire name (`ganho`, ...).
    #[flutter_rust_bridge::frb(sync)]
    pub fn move_opportunity(&self, id: String, stage: String) -> CrmActionResponse {
        let stage = match stage.parse::<PipelineStage>() {
            Ok(stage) => stage,
            Err(err) => return CrmActionResponse::failure(err.to_string()),
        };
        self.act("move_opportunity", &id, |store| {
            store.move_opportunity(&id, stage)
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn complete_task(&self, id: String, result: Option<String>) -> CrmActionResponse {
        self.act("complete_task", &id, |store| store.complete_task(&id, result))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn log_activity(&self, activity_json: String) -> CrmActionResponse {
        self.create::<Activity>("log_activity", &activity_json, CrmStore::log_activity)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn export_data(&self) -> Result<String, String> {
        let store = self.lock()?;
        store.export_data().map_err(|err| err.to_string())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn export_file_name(&self) -> Result<String, String> {
        Ok(self.lock()?.export_file_name())
    }

    /// Returns `false` when the blob is malformed; nothing is applied then.
    #[flutter_rust_bridge::frb(sync)]
    pub fn import_data(&self, blob: String) -> bool {
        match self.lock() {
            Ok(mut store) => store.import_data(&blob).is_ok(),
            Err(_) => false,
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn clear_all(&self) -> CrmActionResponse {
        match self.lock() {
            Ok(mut store) => match store.clear_all() {
                Ok(()) => CrmActionResponse::success("all data cleared", None),
                Err(err) => CrmActionResponse::failure(format!("clear_all failed: {err}")),
            },
            Err(message) => CrmActionResponse::failure(message),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CrmStore<SqliteLocalStorage>>, String> {
        self.store.lock().map_err(|_| {
            warn!("event=handle_lock module=ffi status=error error_code=poisoned");
            "CRM store lock poisoned".to_string()
        })
    }

    fn view<T: Serialize>(
        &self,
        project: impl FnOnce(&CrmStore<SqliteLocalStorage>) -> T,
    ) -> Result<String, String> {
        let store = self.lock()?;
        serde_json::to_string(&project(&store)).map_err(|err| err.to_string())
    }

    fn create<T: DeserializeOwned>(
        &self,
        operation: &str,
        json: &str,
        add: impl FnOnce(&mut CrmStore<SqliteLocalStorage>, T) -> StoreResult<EntityId>,
    ) -> CrmActionResponse {
        let record = match decode::<T>(json) {
            Ok(record) => record,
            Err(message) => return CrmActionResponse::failure(message),
        };
        let mut store = match self.lock() {
            Ok(store) => store,
            Err(message) => return CrmActionResponse::failure(message),
        };
        match add(&mut store, record) {
            Ok(id) => CrmActionResponse::success(format!("{operation} ok"), Some(id)),
            Err(err) => CrmActionResponse::failure(format!("{operation} failed: {err}")),
        }
    }

    fn update<P: DeserializeOwned>(
        &self,
        operation: &str,
        id: &str,
        patch_json: &str,
        edit: impl FnOnce(&mut CrmStore<SqliteLocalStorage>, &str, P) -> StoreResult<()>,
    ) -> CrmActionResponse {
        let patch = match decode::<P>(patch_json) {
            Ok(patch) => patch,
            Err(message) => return CrmActionResponse::failure(message),
        };
        self.act(operation, id, |store| edit(store, id, patch))
    }

    fn act(
        &self,
        operation: &str,
        id: &str,
        run: impl FnOnce(&mut CrmStore<SqliteLocalStorage>) -> StoreResult<()>,
    ) -> CrmActionResponse {
        let mut store = match self.lock() {
            Ok(store) => store,
            Err(message) => return CrmActionResponse::failure(message),
        };
        match run(&mut store) {
            Ok(()) => CrmActionResponse::success(format!("{operation} ok"), Some(id.to_string())),
            Err(err) => CrmActionResponse::failure(format!("{operation} failed: {err}")),
        }
    }
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|err| format!("invalid JSON payload: {err}"))
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    let configured = explicit.or_else(|| std::env::var(DB_PATH_ENV).ok());
    match configured.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_logging, ping, resolve_db_path, CrmHandle};

    fn open_temp() -> (tempfile::TempDir, CrmHandle) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crm.sqlite3");
        let handle =
            CrmHandle::open(Some(path.to_string_lossy().into_owned()), None, None).expect("open");
        (dir, handle)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/crm-logs".to_string()).is_empty());
    }

    #[test]
    fn explicit_db_path_wins_and_blank_falls_back() {
        assert_eq!(
            resolve_db_path(Some("/data/crm.sqlite3".to_string())),
            std::path::PathBuf::from("/data/crm.sqlite3")
        );
        assert!(resolve_db_path(Some("   ".to_string())).is_absolute());
    }

    #[test]
    fn client_json_round_trips_through_handle() {
        let (_dir, handle) = open_temp();

        let created = handle.add_client(
            r#"{
                "nome": "Maria Silva",
                "email": "maria@example.com",
                "telefone": "",
                "empresa": "Acme",
                "status": "ativo",
                "valorTotal": 1500,
                "dataUltimoContato": "2024-01-10",
                "dataCadastro": "2024-01-02",
                "origem": "website",
                "tags": []
            }"#
            .to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let id = created.entity_id.expect("client id");

        let snapshot: serde_json::Value =
            serde_json::from_str(&handle.snapshot().expect("snapshot")).expect("json");
        assert_eq!(snapshot["clientes"][0]["id"], id.as_str());
        assert_eq!(snapshot["metrics"]["clientes"]["ativos"], 1);

        let removed = handle.remove_client(id.clone());
        assert!(removed.ok, "{}", removed.message);
        let missing = handle.remove_client(id);
        assert!(!missing.ok);
    }

    #[test]
    fn bad_payloads_and_stages_fail_softly() {
        let (_dir, handle) = open_temp();

        assert!(!handle.add_lead("not json".to_string()).ok);
        assert!(!handle
            .move_opportunity("any".to_string(), "sideways".to_string())
            .ok);
        assert!(!handle.import_data("{".to_string()));
        assert!(handle.import_data(r#"{"tarefas": []}"#.to_string()));
        assert!(handle.clear_all().ok);
    }

    #[test]
    fn open_applies_roster_and_sales_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crm.sqlite3");
        let users = r#"[{
            "id": "u1",
            "nome": "Ana Souza",
            "email": "ana@example.com",
            "role": "vendedor",
            "meta": {"mensal": 50000, "trimestral": 150000, "anual": 600000}
        }]"#;
        let handle = CrmHandle::open(
            Some(path.to_string_lossy().into_owned()),
            Some(users.to_string()),
            Some(120_000.0),
        )
        .expect("open");

        let snapshot: serde_json::Value =
            serde_json::from_str(&handle.snapshot().expect("snapshot")).expect("json");
        assert_eq!(snapshot["usuarios"][0]["id"], "u1");
        assert_eq!(snapshot["usuarios"][0]["meta"]["mensal"], 50000.0);
        assert_eq!(snapshot["metrics"]["vendas"]["meta"], 120000.0);
    }

    #[test]
    fn open_rejects_bad_roster_and_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crm.sqlite3").to_string_lossy().into_owned();

        assert!(CrmHandle::open(Some(path.clone()), Some("{".to_string()), None).is_err());
        assert!(CrmHandle::open(Some(path.clone()), None, Some(-1.0)).is_err());
        assert!(CrmHandle::open(Some(path), None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn view_methods_return_json() {
        let (_dir, handle) = open_temp();
        let created = handle.add_task(
            r#"{
                "titulo": "Call back",
                "tipo": "ligacao",
                "prioridade": "alta",
                "status": "pendente",
                "dataVencimento": "2000-01-05",
                "dataCriacao": "2000-01-01",
                "responsavel": "Ana Souza"
            }"#
            .to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let task_id = created.entity_id.expect("task id");

        let pending: serde_json::Value =
            serde_json::from_str(&handle.pending_tasks_json(10).expect("pending")).expect("json");
        assert_eq!(pending.as_array().map(Vec::len), Some(1));
        assert_eq!(pending[0]["id"], task_id.as_str());

        let overdue: serde_json::Value =
            serde_json::from_str(&handle.overdue_tasks_json().expect("overdue")).expect("json");
        assert_eq!(overdue[0]["id"], task_id.as_str());

        let owned: serde_json::Value = serde_json::from_str(
            &handle
                .tasks_for_owner_json("Ana Souza".to_string())
                .expect("owner tasks"),
        )
        .expect("json");
        assert_eq!(owned.as_array().map(Vec::len), Some(1));
        let other = handle
            .tasks_for_owner_json("Nobody".to_string())
            .expect("owner tasks");
        assert_eq!(other, "[]");

        let recent: serde_json::Value =
            serde_json::from_str(&handle.recent_activities_json(5).expect("recent"))
                .expect("json");
        assert_eq!(recent[0]["tarefaId"], task_id.as_str());

        let report: serde_json::Value =
            serde_json::from_str(&handle.sales_report_json().expect("report")).expect("json");
        assert_eq!(report["winRate"], 0.0);
        assert!(report["pipelineByStage"].is_array());

        let board: serde_json::Value =
            serde_json::from_str(&handle.pipeline_summary_json().expect("board")).expect("json");
        assert!(board.is_object());
    }

    #[test]
    fn export_file_name_has_backup_prefix() {
        let (_dir, handle) = open_temp();
        let name = handle.export_file_name().expect("file name");
        assert!(name.starts_with("crm-backup-"));
        assert!(name.ends_with(".json"));
    }
}
