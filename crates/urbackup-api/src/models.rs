// Response types for the UrBackup web API.
//
// Every action answers with a flat JSON object; which keys are present
// depends on server version, configuration, and the caller's permissions.
// Fields use `#[serde(default)]` liberally and each record keeps a
// catch-all `extra` map, so a newer server never breaks deserialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Settings map as the server hands it out: setting key to JSON value.
///
/// Values are strings on the wire, but the server mixes in numbers and
/// booleans for some keys; resubmission stringifies them back.
pub type Settings = serde_json::Map<String, serde_json::Value>;

// ── Login handshake ──────────────────────────────────────────────────

/// Answer to the `login` action, both anonymous and credentialed:
/// ```json
/// { "success": true, "session": "xxxxxxxx" }
/// ```
/// The anonymous variant carries the session under `session`; the salted
/// handshake already holds one from the `salt` step, so the credentialed
/// answer may omit it.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session: Option<String>,
}

/// Answer to the `salt` action. `ses` is absent when the username is
/// unknown; `salt`/`rnd` are absent on legacy servers this library does
/// not support.
#[derive(Debug, Deserialize)]
pub struct SaltResponse {
    #[serde(default)]
    pub ses: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
    #[serde(default)]
    pub rnd: Option<String>,
    #[serde(default)]
    pub pbkdf2_rounds: Option<u32>,
}

// ── Status ───────────────────────────────────────────────────────────

/// Answer to the `status` action.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<Vec<ClientStatus>>,
    #[serde(default)]
    pub extra_clients: Option<Vec<ExtraClient>>,
    #[serde(default)]
    pub server_identity: Option<String>,
}

/// Timestamps in status records are Unix seconds, or the text `"-"` when
/// the event never happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackupTime {
    Timestamp(i64),
    Text(String),
}

impl BackupTime {
    /// The Unix timestamp, or `None` for the "never" marker.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(t) => Some(*t),
            Self::Text(_) => None,
        }
    }
}

/// One client's row in the server status list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStatus {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub groupname: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub lastbackup: Option<BackupTime>,
    #[serde(default)]
    pub lastbackup_image: Option<BackupTime>,
    #[serde(default)]
    pub lastseen: Option<BackupTime>,
    #[serde(default)]
    pub file_ok: Option<bool>,
    #[serde(default)]
    pub image_ok: Option<bool>,
    #[serde(default)]
    pub client_version_string: Option<String>,
    #[serde(default)]
    pub os_version_string: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A client registered by network address only (no agent installed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraClient {
    pub id: i64,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Settings ─────────────────────────────────────────────────────────

/// Answer to the `settings` action in its read forms
/// (`sa=general`, `sa=clientsettings`).
#[derive(Debug, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// Answer to the `settings` action in its save forms. The server signals
/// success by including `saved_ok`; its value carries no extra meaning.
#[derive(Debug, Deserialize)]
pub struct SaveSettingsResponse {
    #[serde(default)]
    pub saved_ok: Option<bool>,
}

// ── Backups ──────────────────────────────────────────────────────────

/// Answer to the `start_backup` action.
#[derive(Debug, Deserialize)]
pub struct StartBackupResponse {
    #[serde(default)]
    pub result: Option<Vec<StartResult>>,
}

/// One entry of the `start_backup` result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResult {
    #[serde(default)]
    pub start_ok: Option<bool>,
    #[serde(default)]
    pub clientid: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Answer to the `backups` action (`sa=backups`) for one client.
#[derive(Debug, Deserialize)]
pub struct BackupsResponse {
    #[serde(default)]
    pub backups: Option<Vec<FileBackup>>,
    #[serde(default)]
    pub backup_images: Option<Vec<ImageBackup>>,
}

/// Historical file backup of one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackup {
    pub id: i64,
    #[serde(default)]
    pub backuptime: Option<i64>,
    /// 0 for a full backup, otherwise the incremental counter.
    #[serde(default)]
    pub incremental: Option<i64>,
    #[serde(default)]
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub archived: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Historical image backup of one volume of one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBackup {
    pub id: i64,
    #[serde(default)]
    pub backuptime: Option<i64>,
    #[serde(default)]
    pub incremental: Option<i64>,
    /// Volume designator, e.g. `C`, `SYSVOL`, `ESP`.
    #[serde(default)]
    pub letter: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Activities ───────────────────────────────────────────────────────

/// Answer to the `progress` action, used both for listing running
/// activities and for acknowledging a stop request.
#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub progress: Option<Vec<RunningAction>>,
}

/// A running server activity (backup, restore, maintenance).
///
/// Stopping one requires both `clientid` and `id`; records from older
/// servers can lack either, which `stop_action` rejects up front.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunningAction {
    #[serde(default)]
    pub action: Option<i32>,
    #[serde(default)]
    pub clientid: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Percent done, `-1` while indexing.
    #[serde(default)]
    pub pcdone: Option<i32>,
    #[serde(default)]
    pub done_bytes: Option<i64>,
    #[serde(default)]
    pub total_bytes: Option<i64>,
    #[serde(default)]
    pub eta_ms: Option<i64>,
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RunningAction {
    /// Decode the numeric `action` code, if present and known.
    pub fn kind(&self) -> Option<ActionKind> {
        self.action.and_then(ActionKind::from_code)
    }
}

/// Numeric activity codes used in progress records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    IncrFileBackup,
    FullFileBackup,
    IncrImageBackup,
    FullImageBackup,
    ResumedIncrFileBackup,
    ResumedFullFileBackup,
    FileRestore,
    ImageRestore,
    ClientUpdate,
    CheckDbIntegrity,
    BackupDatabase,
    RecalculateStatistics,
}

impl ActionKind {
    /// Map a wire code to its activity. Code 7 is unassigned and unknown
    /// codes from newer servers yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::IncrFileBackup),
            2 => Some(Self::FullFileBackup),
            3 => Some(Self::IncrImageBackup),
            4 => Some(Self::FullImageBackup),
            5 => Some(Self::ResumedIncrFileBackup),
            6 => Some(Self::ResumedFullFileBackup),
            8 => Some(Self::FileRestore),
            9 => Some(Self::ImageRestore),
            10 => Some(Self::ClientUpdate),
            11 => Some(Self::CheckDbIntegrity),
            12 => Some(Self::BackupDatabase),
            13 => Some(Self::RecalculateStatistics),
            _ => None,
        }
    }

    /// The wire code for this activity.
    pub fn code(self) -> i32 {
        match self {
            Self::IncrFileBackup => 1,
            Self::FullFileBackup => 2,
            Self::IncrImageBackup => 3,
            Self::FullImageBackup => 4,
            Self::ResumedIncrFileBackup => 5,
            Self::ResumedFullFileBackup => 6,
            Self::FileRestore => 8,
            Self::ImageRestore => 9,
            Self::ClientUpdate => 10,
            Self::CheckDbIntegrity => 11,
            Self::BackupDatabase => 12,
            Self::RecalculateStatistics => 13,
        }
    }
}

/// Backup flavor for the `start_backup` action's `start_type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartType {
    IncrFile,
    FullFile,
    IncrImage,
    FullImage,
}

impl StartType {
    /// The wire literal sent as `start_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncrFile => "incr_file",
            Self::FullFile => "full_file",
            Self::IncrImage => "incr_image",
            Self::FullImage => "full_image",
        }
    }
}

impl fmt::Display for StartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Live log ─────────────────────────────────────────────────────────

/// Answer to the `livelog` action.
#[derive(Debug, Deserialize)]
pub struct LivelogResponse {
    #[serde(default)]
    pub logdata: Option<Vec<LogEntry>>,
}

/// One live-log line. Only `id` is stable across server versions; the
/// message, level, and time fields vary and land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Usage ────────────────────────────────────────────────────────────

/// Answer to the `usage` action.
#[derive(Debug, Deserialize)]
pub struct UsageResponse {
    #[serde(default)]
    pub usage: Option<Vec<UsageEntry>>,
}

/// Storage usage of one client, all sizes in bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    pub name: String,
    #[serde(default)]
    pub files: Option<i64>,
    #[serde(default)]
    pub images: Option<i64>,
    #[serde(default)]
    pub used: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Client registration ──────────────────────────────────────────────

/// Answer to the `add_client` action. `already_exists` (any value) means
/// the name is taken; otherwise `new_clientid`/`new_authkey` describe the
/// fresh registration.
#[derive(Debug, Deserialize)]
pub struct AddClientResponse {
    #[serde(default)]
    pub already_exists: Option<bool>,
    #[serde(default)]
    pub new_clientid: Option<i64>,
    #[serde(default)]
    pub new_authkey: Option<String>,
}

/// A successfully registered client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub id: i64,
    /// Internet authentication key the client must present.
    pub authkey: String,
}
