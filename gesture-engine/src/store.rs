//! Gesture catalog: custom templates, bindings and command specs.
//!
//! The catalog is persisted as JSON.  Template samples are accepted in
//! several historical shapes and normalized once, when a template enters
//! the catalog, into a list of validated `LandmarkFrame`s per sample.
//! Stores hand out immutable snapshots so a reload can swap the whole
//! catalog while matching is in progress.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::recognition::landmarks::{Hand, LandmarkError, LandmarkFrame, Point3};

/// Current normalized template layout.
pub const TEMPLATE_SCHEMA: u32 = 2;

/// Default per-template acceptance threshold.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.15;

/// Binding value meaning "no command".
pub const NO_COMMAND: &str = "none";

// ── Errors ─────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template id must not be empty")]
    EmptyId,
}

/// Why a stored sample could not be normalized.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("unrecognized sample shape")]
    Shape,
    #[error("sample has no frames")]
    Empty,
    #[error(transparent)]
    Landmarks(#[from] LandmarkError),
}

// ── Templates ──────────────────────────────────────────────

/// Kind of custom gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    #[serde(alias = "custom_static")]
    Static,
    #[serde(alias = "custom_dynamic")]
    Dynamic,
    Combo,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Combo => "combo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "static" | "custom_static" => Some(Self::Static),
            "dynamic" | "custom_dynamic" => Some(Self::Dynamic),
            "combo" => Some(Self::Combo),
            _ => None,
        }
    }
}

/// One recorded repetition. Static samples hold exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSample {
    pub frames: Vec<LandmarkFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl TemplateSample {
    pub fn new(frames: Vec<LandmarkFrame>, recorded_at: Option<DateTime<Utc>>) -> Self {
        Self {
            frames,
            recorded_at,
        }
    }
}

/// A user-recorded gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTemplate")]
pub struct GestureTemplate {
    pub id: String,
    pub label: String,
    pub kind: TemplateKind,
    /// Hand the gesture was recorded with, if any.
    pub hand: Option<Hand>,
    pub samples: Vec<TemplateSample>,
    /// Mean sample distance must be strictly below this to match.
    pub match_threshold: f32,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    /// Capture window per sample, in seconds.
    pub capture_window_s: Option<f64>,
    pub schema: u32,
}

impl GestureTemplate {
    pub fn new(id: &str, kind: TemplateKind, samples: Vec<TemplateSample>) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            kind,
            hand: None,
            samples,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            enabled: true,
            created_at: None,
            capture_window_s: None,
            schema: TEMPLATE_SCHEMA,
        }
    }

    /// Drop samples whose shape does not fit `kind` and mark the template
    /// as normalized.
    fn normalize(mut self) -> Self {
        let id = self.id.clone();
        let kind = self.kind;
        self.samples.retain_mut(|sample| {
            if sample.frames.is_empty() {
                warn!("Template {}: dropping sample with no frames", id);
                return false;
            }
            if kind != TemplateKind::Dynamic && sample.frames.len() > 1 {
                debug!(
                    "Template {}: static sample has {} frames, keeping the first",
                    id,
                    sample.frames.len()
                );
                sample.frames.truncate(1);
            }
            true
        });
        self.schema = TEMPLATE_SCHEMA;
        self
    }
}

// ── Sample shape normalization ─────────────────────────────

/// Unvalidated template as found on disk.
#[derive(Deserialize)]
struct RawTemplate {
    #[serde(default)]
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(alias = "type")]
    kind: TemplateKind,
    #[serde(default)]
    hand: Option<Value>,
    #[serde(default)]
    samples: Vec<Value>,
    #[serde(default = "default_threshold", alias = "dtw_threshold")]
    match_threshold: f32,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    capture_window_s: Option<f64>,
}

fn default_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl From<RawTemplate> for GestureTemplate {
    fn from(raw: RawTemplate) -> Self {
        let mut samples = Vec::with_capacity(raw.samples.len());
        for (i, value) in raw.samples.iter().enumerate() {
            match normalize_sample(value) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("Template {}: skipping sample {}: {}", raw.id, i, e),
            }
        }
        let template = GestureTemplate {
            label: raw.label.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            kind: raw.kind,
            hand: raw
                .hand
                .as_ref()
                .and_then(Value::as_str)
                .and_then(Hand::from_str),
            samples,
            match_threshold: raw.match_threshold,
            enabled: raw.enabled,
            created_at: raw.created_at.as_ref().and_then(parse_time),
            capture_window_s: raw.capture_window_s,
            schema: TEMPLATE_SCHEMA,
        };
        template.normalize()
    }
}

/// Accepts `{"frames": ...}` (current), `{"landmarks": ...}` (earlier
/// recorders), a legacy capture entry `{"hands": [...]}`, or a bare
/// landmark array.
pub fn normalize_sample(value: &Value) -> Result<TemplateSample, SampleError> {
    let (data, recorded_at) = match value {
        Value::Object(map) if map.contains_key("hands") => (value, None),
        Value::Object(map) => {
            let data = map
                .get("frames")
                .or_else(|| map.get("landmarks"))
                .ok_or(SampleError::Shape)?;
            let recorded_at = map
                .get("recorded_at")
                .or_else(|| map.get("timestamp"))
                .and_then(parse_time);
            (data, recorded_at)
        }
        _ => (value, None),
    };
    let frames = if data.is_object() {
        vec![parse_frame(data)?]
    } else {
        parse_frames(data)?
    };
    Ok(TemplateSample::new(frames, recorded_at))
}

fn is_point(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|a| a.first())
        .map_or(false, Value::is_number)
}

fn has_no_hands(value: &Value) -> bool {
    value
        .get("hands")
        .and_then(Value::as_array)
        .map_or(false, |hands| hands.is_empty())
}

/// A single 21x3 array, or a legacy entry whose first hand carries one.
fn parse_frame(value: &Value) -> Result<LandmarkFrame, SampleError> {
    if let Some(hands) = value.get("hands") {
        let landmarks = hands
            .get(0)
            .and_then(|h| h.get("landmarks"))
            .ok_or(SampleError::Shape)?;
        return parse_frame(landmarks);
    }
    let points = Vec::<Point3>::deserialize(value).map_err(|_| SampleError::Shape)?;
    Ok(LandmarkFrame::try_from(points)?)
}

/// A bare 21x3 array (one frame) or a list of frames.
fn parse_frames(value: &Value) -> Result<Vec<LandmarkFrame>, SampleError> {
    let items = value.as_array().ok_or(SampleError::Shape)?;
    let first = items.first().ok_or(SampleError::Empty)?;
    if is_point(first) {
        return Ok(vec![parse_frame(value)?]);
    }
    let frames = items
        .iter()
        .filter(|item| !has_no_hands(item))
        .map(parse_frame)
        .collect::<Result<Vec<_>, _>>()?;
    if frames.is_empty() {
        return Err(SampleError::Empty);
    }
    Ok(frames)
}

/// RFC 3339 string or Unix seconds.
fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
        _ => None,
    }
}

// ── Commands and bindings ──────────────────────────────────

/// How a command's magnitude is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Scale by finger count and the other hand's multiplier.
    FingerCount,
}

/// Static properties of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSpec {
    /// Fire every frame the gesture persists.
    pub repeatable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Modifier>,
}

impl CommandSpec {
    fn repeatable() -> Self {
        Self {
            repeatable: true,
            modifier: None,
        }
    }

    fn finger_count() -> Self {
        Self {
            repeatable: false,
            modifier: Some(Modifier::FingerCount),
        }
    }
}

/// A resolved gesture -> command mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub command_id: String,
    pub repeatable: bool,
    pub modifier: Option<Modifier>,
}

/// Factory bindings for built-in gestures and combos.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("SWIPE_DOWN", "window_minimize"),
    ("SWIPE_UP", "window_maximize"),
    ("SWIPE_LEFT", "tab_switch_left"),
    ("SWIPE_RIGHT", "tab_switch_right"),
    ("INDEX_ONLY", "tab_new"),
    ("FIST", "tab_close"),
    ("THUMBS_UP", "fullscreen_toggle"),
    ("PEACE", "cursor_activate"),
    ("PALM", NO_COMMAND),
    ("OK", NO_COMMAND),
    ("POINTING_RIGHT", NO_COMMAND),
    ("POINTING_UP", NO_COMMAND),
    ("POINTING_LEFT", NO_COMMAND),
    ("POINTING_DOWN", NO_COMMAND),
    ("WAVE", NO_COMMAND),
    ("TWO_FISTS", NO_COMMAND),
    ("HIGH_FIVE", NO_COMMAND),
    ("DOUBLE_THUMBS_UP", NO_COMMAND),
];

fn default_commands() -> BTreeMap<String, CommandSpec> {
    let mut commands = BTreeMap::new();
    for id in [
        "window_minimize",
        "window_maximize",
        "tab_new",
        "tab_close",
        "fullscreen_toggle",
        "cursor_activate",
    ] {
        commands.insert(id.to_string(), CommandSpec::default());
    }
    for id in ["tab_switch_left", "tab_switch_right"] {
        commands.insert(id.to_string(), CommandSpec::finger_count());
    }
    for id in ["cursor_move", "scroll_up", "scroll_down"] {
        commands.insert(id.to_string(), CommandSpec::repeatable());
    }
    commands
}

fn default_bindings() -> BTreeMap<String, String> {
    DEFAULT_BINDINGS
        .iter()
        .map(|(g, c)| (g.to_string(), c.to_string()))
        .collect()
}

// ── Catalog ────────────────────────────────────────────────

/// Templates, bindings and command specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureCatalog {
    pub version: u32,
    #[serde(deserialize_with = "deserialize_templates")]
    templates: BTreeMap<String, GestureTemplate>,
    #[serde(deserialize_with = "deserialize_bindings")]
    bindings: BTreeMap<String, String>,
    commands: BTreeMap<String, CommandSpec>,
    /// Built-in gestures switched off by the user. Templates carry their
    /// own `enabled` flag instead.
    #[serde(rename = "disabled_gestures", skip_serializing_if = "BTreeSet::is_empty")]
    disabled: BTreeSet<String>,
}

impl Default for GestureCatalog {
    fn default() -> Self {
        Self {
            version: TEMPLATE_SCHEMA,
            templates: BTreeMap::new(),
            bindings: default_bindings(),
            commands: default_commands(),
            disabled: BTreeSet::new(),
        }
    }
}

/// Templates keyed by id. Entries that fail to parse, and `_`-prefixed
/// metadata keys, are skipped.
fn deserialize_templates<'de, D>(de: D) -> Result<BTreeMap<String, GestureTemplate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(de)?;
    let mut templates = BTreeMap::new();
    for (id, value) in raw {
        if id.starts_with('_') {
            continue;
        }
        match GestureTemplate::deserialize(&value) {
            Ok(mut template) => {
                template.id = id.clone();
                templates.insert(id, template);
            }
            Err(e) => warn!("Skipping template {}: {}", id, e),
        }
    }
    Ok(templates)
}

/// Gesture -> command strings; non-string values and `_` keys are skipped.
fn deserialize_bindings<'de, D>(de: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(de)?;
    Ok(raw
        .into_iter()
        .filter(|(k, _)| !k.starts_with('_'))
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect())
}

impl GestureCatalog {
    /// Parse a catalog. Older layouts are upgraded in memory and written
    /// back in the current layout on the next save.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let mut catalog: Self = serde_json::from_str(json)?;
        if catalog.version != TEMPLATE_SCHEMA {
            debug!(
                "Upgrading catalog version {} -> {}",
                catalog.version, TEMPLATE_SCHEMA
            );
            catalog.version = TEMPLATE_SCHEMA;
        }
        Ok(catalog)
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Catalog loaded from {:?}: {} templates, {} bindings",
            path,
            catalog.templates.len(),
            catalog.bindings.len()
        );
        Ok(catalog)
    }

    pub fn save_json_file(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.to_json_string()?).map_err(io_err)?;
        debug!("Catalog saved to {:?}", path);
        Ok(())
    }

    // ── Templates ──

    pub fn template(&self, id: &str) -> Option<&GestureTemplate> {
        self.templates.get(id)
    }

    pub fn templates(&self) -> impl Iterator<Item = &GestureTemplate> {
        self.templates.values()
    }

    /// Insert or overwrite a template. A new template gets a `none`
    /// binding if it has none yet.
    pub fn insert_template(&mut self, template: GestureTemplate) {
        let template = template.normalize();
        self.bindings
            .entry(template.id.clone())
            .or_insert_with(|| NO_COMMAND.to_string());
        self.templates.insert(template.id.clone(), template);
    }

    /// Remove a template and its binding.
    pub fn remove_template(&mut self, id: &str) -> Option<GestureTemplate> {
        let removed = self.templates.remove(id);
        if removed.is_some() {
            self.bindings.remove(id);
        }
        removed
    }

    /// Whether `gesture_id` is a template or a gesture with a binding.
    pub fn has_gesture(&self, gesture_id: &str) -> bool {
        self.templates.contains_key(gesture_id) || self.bindings.contains_key(gesture_id)
    }

    pub fn is_gesture_enabled(&self, gesture_id: &str) -> bool {
        match self.templates.get(gesture_id) {
            Some(t) => t.enabled,
            None => !self.disabled.contains(gesture_id),
        }
    }

    /// Switch a template or built-in gesture on or off. Returns false for
    /// an unknown id.
    pub fn set_gesture_enabled(&mut self, gesture_id: &str, enabled: bool) -> bool {
        if let Some(t) = self.templates.get_mut(gesture_id) {
            t.enabled = enabled;
        } else if self.bindings.contains_key(gesture_id) {
            if enabled {
                self.disabled.remove(gesture_id);
            } else {
                self.disabled.insert(gesture_id.to_string());
            }
        } else {
            warn!("Cannot toggle unknown gesture {}", gesture_id);
            return false;
        }
        let state = if enabled { "enabled" } else { "disabled" };
        info!("Gesture {} {}", gesture_id, state);
        true
    }

    // ── Bindings ──

    /// Bound command for a gesture, `None` when unbound, bound to `none`
    /// or disabled.
    pub fn binding(&self, gesture_id: &str) -> Option<Binding> {
        if !self.is_gesture_enabled(gesture_id) {
            return None;
        }
        let command_id = self.bindings.get(gesture_id)?;
        if command_id == NO_COMMAND || command_id.is_empty() {
            return None;
        }
        let spec = self.commands.get(command_id).cloned().unwrap_or_default();
        Some(Binding {
            command_id: command_id.clone(),
            repeatable: spec.repeatable,
            modifier: spec.modifier,
        })
    }

    /// Raw binding value, including `none`.
    pub fn binding_value(&self, gesture_id: &str) -> Option<&str> {
        self.bindings.get(gesture_id).map(String::as_str)
    }

    /// Bind a gesture to a command (one binding per gesture). Binding a
    /// disabled template to a real command re-enables it.
    pub fn set_binding(&mut self, gesture_id: &str, command_id: &str) {
        self.bindings
            .insert(gesture_id.to_string(), command_id.to_string());
        if command_id != NO_COMMAND {
            if let Some(t) = self.templates.get_mut(gesture_id) {
                if !t.enabled {
                    info!("Re-enabling template {} (bound to {})", gesture_id, command_id);
                    t.enabled = true;
                }
            }
        }
        info!("Binding updated: {} -> {}", gesture_id, command_id);
    }

    /// Restore factory bindings for built-in gestures. Template bindings
    /// are left alone.
    pub fn reset_default_bindings(&mut self) {
        for (gesture, command) in DEFAULT_BINDINGS {
            self.bindings.insert(gesture.to_string(), command.to_string());
        }
        info!("Built-in bindings reset to defaults");
    }

    pub fn command(&self, command_id: &str) -> Option<&CommandSpec> {
        self.commands.get(command_id)
    }
}

// ── Stores ─────────────────────────────────────────────────

/// Shared access to the catalog.
///
/// Readers take a snapshot per lookup and never hold references across
/// calls. Writers go through `edit`, which publishes a new snapshot only
/// after the change has been stored; a failed write leaves the current
/// catalog untouched.
pub trait TemplateStore: Send + Sync {
    /// Current catalog.
    fn snapshot(&self) -> Arc<GestureCatalog>;

    /// Apply `edit` to a copy of the catalog, store it, then publish it.
    fn edit(&self, edit: &mut dyn FnMut(&mut GestureCatalog)) -> Result<(), StoreError>;

    /// Swap in a whole new catalog (external reload).
    fn replace(&self, catalog: GestureCatalog);

    /// Insert or overwrite a template by id.
    fn save_template(&self, template: GestureTemplate) -> Result<(), StoreError> {
        if template.id.is_empty() {
            return Err(StoreError::EmptyId);
        }
        let summary = format!(
            "{} ({}, {} samples)",
            template.id,
            template.kind.as_str(),
            template.samples.len()
        );
        let mut pending = Some(template);
        self.edit(&mut |c: &mut GestureCatalog| {
            if let Some(t) = pending.take() {
                c.insert_template(t);
            }
        })?;
        info!("Template saved: {}", summary);
        Ok(())
    }

    /// Returns whether a template was removed.
    fn delete_template(&self, id: &str) -> Result<bool, StoreError> {
        if self.snapshot().template(id).is_none() {
            return Ok(false);
        }
        self.edit(&mut |c: &mut GestureCatalog| {
            c.remove_template(id);
        })?;
        info!("Template deleted: {}", id);
        Ok(true)
    }

    fn set_binding(&self, gesture_id: &str, command_id: &str) -> Result<(), StoreError> {
        self.edit(&mut |c: &mut GestureCatalog| c.set_binding(gesture_id, command_id))
    }

    /// Returns false for an unknown id, without touching the store.
    fn set_gesture_enabled(&self, gesture_id: &str, enabled: bool) -> Result<bool, StoreError> {
        if !self.snapshot().has_gesture(gesture_id) {
            warn!("Cannot toggle unknown gesture {}", gesture_id);
            return Ok(false);
        }
        self.edit(&mut |c: &mut GestureCatalog| {
            c.set_gesture_enabled(gesture_id, enabled);
        })?;
        Ok(true)
    }

    fn reset_default_bindings(&self) -> Result<(), StoreError> {
        self.edit(&mut |c: &mut GestureCatalog| c.reset_default_bindings())
    }
}

/// In-memory copy-on-write store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Arc<GestureCatalog>>,
}

impl MemoryStore {
    pub fn new(catalog: GestureCatalog) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Edit a copy under the write lock and publish it once `commit`
    /// accepts it.
    fn update(
        &self,
        edit: &mut dyn FnMut(&mut GestureCatalog),
        commit: impl FnOnce(&GestureCatalog) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut guard = self.catalog.write();
        let mut next = GestureCatalog::clone(&guard);
        edit(&mut next);
        commit(&next)?;
        *guard = Arc::new(next);
        Ok(())
    }
}

impl TemplateStore for MemoryStore {
    fn snapshot(&self) -> Arc<GestureCatalog> {
        self.catalog.read().clone()
    }

    fn edit(&self, edit: &mut dyn FnMut(&mut GestureCatalog)) -> Result<(), StoreError> {
        self.update(edit, |_| Ok(()))
    }

    fn replace(&self, catalog: GestureCatalog) {
        *self.catalog.write() = Arc::new(catalog);
        debug!("Catalog replaced");
    }
}

/// A `MemoryStore` backed by a JSON file. Every change is written to disk
/// before it becomes visible.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Load `path`, or start from defaults when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let catalog = if path.exists() {
            GestureCatalog::from_json_file(&path)?
        } else {
            info!("No catalog at {:?}, starting from defaults", path);
            GestureCatalog::default()
        };
        Ok(Self {
            path,
            memory: MemoryStore::new(catalog),
        })
    }
}

impl TemplateStore for JsonFileStore {
    fn snapshot(&self) -> Arc<GestureCatalog> {
        self.memory.snapshot()
    }

    fn edit(&self, edit: &mut dyn FnMut(&mut GestureCatalog)) -> Result<(), StoreError> {
        self.memory
            .update(edit, |catalog| catalog.save_json_file(&self.path))
    }

    /// Reloads are not written back; the new catalog came from disk.
    fn replace(&self, catalog: GestureCatalog) {
        self.memory.replace(catalog);
    }
}

// ── Tests ──────────────────────────────────────────────────
