//! Quest generation
//!
//! [`GenerationController`] validates the form, calls the backend once and
//! routes the outcome into both the display sink and the active chat session.
//! Success and failure take the same path out: the rendered text is shown,
//! stored, and the generate control is re-enabled.

use crate::chat::SessionManager;
use crate::error::{QuestgenError, Result, ValidationError};
use crate::providers::{GenerateRequest, Provider, ProviderSelection, QuestBackend};
use crate::storage::KeyValueStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shown while a request is in flight
pub const PENDING_MESSAGE: &str = "Generating... please wait.";

/// Shown for transport failures
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error or the request could not be processed. Please try again.";

/// Display surface for generation results
pub trait ResultView {
    /// Show the pending indicator
    fn show_pending(&mut self);

    /// Show result text (quest JSON or an error line)
    fn show_result(&mut self, text: &str);

    /// Enable or disable the generate control
    fn set_generate_enabled(&mut self, enabled: bool);
}

/// User input for one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationForm {
    /// Setting text as typed
    pub setting: String,
    /// Selected provider
    pub provider: Provider,
    /// Selected model
    pub model: Option<String>,
}

/// What the backend produced
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Quest payload from a 2xx response
    Quest(Value),
    /// Error message (without the `Error: ` prefix)
    Failed(String),
}

impl GenerationOutcome {
    /// Canonical text stored in the session and shown to the user
    ///
    /// Quests are pretty-printed with two-space indentation and their
    /// original key order. Whole-valued floats print without a fraction
    /// (`1.0` becomes `1`), matching how browsers serialize numbers.
    pub fn render(&self) -> Result<String> {
        match self {
            GenerationOutcome::Quest(value) => {
                Ok(serde_json::to_string_pretty(&normalize_numbers(value))?)
            }
            GenerationOutcome::Failed(message) => Ok(format!("Error: {}", message)),
        }
    }

    /// True for a quest payload
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Quest(_))
    }
}

/// Largest magnitude at which every whole f64 is exact as an integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Copy of `value` with finite whole floats turned into integers
fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Outcome of a completed generation round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Session the result was stored in
    pub session_id: String,
    /// Typed outcome
    pub outcome: GenerationOutcome,
    /// Rendered text as stored and displayed
    pub text: String,
}

/// Clears the in-flight flag when dropped
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> std::result::Result<Self, ValidationError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(ValidationError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Validates input and runs generation requests
pub struct GenerationController {
    backend: Arc<dyn QuestBackend>,
    kv: Arc<dyn KeyValueStore>,
    in_flight: AtomicBool,
}

impl GenerationController {
    /// Create a controller
    pub fn new(backend: Arc<dyn QuestBackend>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            kv,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a request is currently in flight
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Check the form and build the request
    ///
    /// Checks run in order: setting, API key, model. The first failure is
    /// returned and nothing is sent.
    pub fn prepare(&self, form: &GenerationForm) -> Result<GenerateRequest> {
        let setting = form.setting.trim();
        if setting.is_empty() {
            return Err(QuestgenError::Validation(ValidationError::EmptySetting).into());
        }

        let selection = ProviderSelection::resolve(self.kv.as_ref(), form.provider.clone())?;
        selection.require_key().map_err(QuestgenError::Validation)?;

        let model = form
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(QuestgenError::Validation(ValidationError::MissingModel))?;

        Ok(GenerateRequest {
            setting: setting.to_string(),
            api_provider: selection.provider.name().to_string(),
            api_key: selection.api_key,
            model: Some(model.to_string()),
        })
    }

    /// Generate a quest for `form` into the active session
    ///
    /// Validation failures return `Err` before any network call. Backend
    /// failures are not errors: they produce a [`GenerationOutcome::Failed`]
    /// that is displayed and stored like a quest.
    ///
    /// # Arguments
    ///
    /// * `sessions` - Session manager whose active session receives the result
    /// * `view` - Display sink for the pending indicator and the result
    /// * `form` - Setting, provider and model as entered
    ///
    /// # Returns
    ///
    /// Returns the session id, the typed outcome and the rendered text
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty setting, a missing API key,
    /// a missing model, or a request already in flight. Storage failures while
    /// recording the result are also returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use questgen::chat::{SessionManager, DEFAULT_PAGE_SIZE};
    /// use questgen::config::BackendConfig;
    /// use questgen::generate::{GenerationController, GenerationForm, ResultView};
    /// use questgen::providers::{HttpBackend, Provider};
    /// use questgen::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// struct Stdout;
    ///
    /// impl ResultView for Stdout {
    ///     fn show_pending(&mut self) {}
    ///     fn show_result(&mut self, text: &str) {
    ///         println!("{}", text);
    ///     }
    ///     fn set_generate_enabled(&mut self, _enabled: bool) {}
    /// }
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let kv = Arc::new(MemoryStore::new());
    /// let backend = Arc::new(HttpBackend::new(&BackendConfig::default())?);
    /// let controller = GenerationController::new(backend, kv.clone());
    /// let mut sessions = SessionManager::open(kv, DEFAULT_PAGE_SIZE)?;
    ///
    /// let form = GenerationForm {
    ///     setting: "a haunted lighthouse".to_string(),
    ///     provider: Provider::Local,
    ///     model: Some("phi3-mini".to_string()),
    /// };
    /// let result = controller.generate(&mut sessions, &mut Stdout, &form).await?;
    /// println!("stored in {}", result.session_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate(
        &self,
        sessions: &mut SessionManager,
        view: &mut dyn ResultView,
        form: &GenerationForm,
    ) -> Result<GenerationResult> {
        let request = self.prepare(form)?;
        let _in_flight = InFlight::acquire(&self.in_flight).map_err(QuestgenError::Validation)?;

        view.set_generate_enabled(false);
        let result = self.run(sessions, view, form, &request).await;
        view.set_generate_enabled(true);

        result
    }

    async fn run(
        &self,
        sessions: &mut SessionManager,
        view: &mut dyn ResultView,
        form: &GenerationForm,
        request: &GenerateRequest,
    ) -> Result<GenerationResult> {
        sessions.update_setting(&form.setting)?;
        let session_id = sessions
            .active_id()
            .map(str::to_string)
            .ok_or_else(|| QuestgenError::UnknownSession("<none>".to_string()))?;

        view.show_pending();

        let outcome = match self.backend.generate(request).await {
            Ok(payload) => {
                tracing::info!("Quest generated for session {}", session_id);
                GenerationOutcome::Quest(payload)
            }
            Err(err) => {
                tracing::warn!("Generation failed for session {}: {:#}", session_id, err);
                GenerationOutcome::Failed(failure_message(&err))
            }
        };

        let text = outcome.render()?;
        view.show_result(&text);
        sessions.record_result(&text)?;

        Ok(GenerationResult {
            session_id,
            outcome,
            text,
        })
    }
}

/// User-facing message for a backend failure
///
/// Server-supplied messages are used verbatim; anything else gets the
/// generic retry hint.
pub fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<QuestgenError>() {
        Some(QuestgenError::Server { message, .. }) => message.clone(),
        _ => NETWORK_ERROR_MESSAGE.to_string(),
    }
}
