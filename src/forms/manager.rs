/// Form state management with validation hooks and guarded submission
use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::FormState;
use super::validator::Validator;
use crate::error::Result;
use crate::types::{FieldValue, FormErrors, FormValues};

pub type SubmitHandler = Arc<dyn Fn(FormValues) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Raw input change as delivered by the UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub value: String,
    pub checked: bool,
    pub is_checkbox: bool,
}

impl InputEvent {
    pub fn text(value: impl Into<String>) -> Self {
        InputEvent {
            value: value.into(),
            checked: false,
            is_checkbox: false,
        }
    }

    pub fn checkbox(checked: bool) -> Self {
        InputEvent {
            value: String::new(),
            checked,
            is_checkbox: true,
        }
    }

    fn effective_value(self) -> FieldValue {
        if self.is_checkbox {
            FieldValue::Bool(self.checked)
        } else {
            FieldValue::Text(self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submit was in flight; dropped
    Skipped,
    /// Validation failed; handler not called
    Invalid,
    Submitted,
    /// Handler returned an error; logged and swallowed
    Failed,
}

struct Inner {
    state: FormState,
    /// Bumped on reset so a stale submit cannot clear a newer flag
    generation: u64,
}

/// Clears `is_submitting` if the submit future is dropped before it
/// finishes (caller cancellation or a panicking handler)
struct SubmittingGuard {
    form_id: Uuid,
    inner: Arc<RwLock<Inner>>,
    generation: u64,
    armed: bool,
}

impl SubmittingGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!("Form {}: submit abandoned before completion", self.form_id);

        match self.inner.try_write() {
            Ok(mut inner) => finish_submit(&mut inner, self.generation, self.form_id),
            Err(_) => {
                // Lock busy: clear from a task once it frees up
                let inner = Arc::clone(&self.inner);
                let (generation, form_id) = (self.generation, self.form_id);
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let mut inner = inner.write().await;
                            finish_submit(&mut inner, generation, form_id);
                        });
                    }
                    Err(_) => error!(
                        "Form {}: no runtime to clear submitting flag",
                        form_id
                    ),
                }
            }
        }
    }
}

fn finish_submit(inner: &mut Inner, generation: u64, form_id: Uuid) {
    if inner.generation == generation {
        inner.state = inner.state.with_submitting(false);
    } else {
        warn!("Form {}: reset during submit - keeping post-reset state", form_id);
    }
}

pub struct FormManager {
    id: Uuid,
    initial: FormValues,
    validator: Option<Arc<dyn Validator>>,
    on_submit: SubmitHandler,
    inner: Arc<RwLock<Inner>>,
}

impl FormManager {
    pub fn new(initial: FormValues, on_submit: SubmitHandler) -> Self {
        FormManager {
            id: Uuid::new_v4(),
            inner: Arc::new(RwLock::new(Inner {
                state: FormState::new(initial.clone()),
                generation: 0,
            })),
            initial,
            validator: None,
            on_submit,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn set_value(&self, field: &str, value: FieldValue) {
        let mut inner = self.inner.write().await;
        inner.state = inner.state.with_value(field, value);
    }

    pub async fn handle_change(&self, field: &str, event: InputEvent) {
        self.set_value(field, event.effective_value()).await;
    }

    /// Mark touched and validate just this field
    pub async fn handle_blur(&self, field: &str) {
        let mut inner = self.inner.write().await;
        inner.state = inner.state.with_touched(field);

        let Some(validator) = &self.validator else {
            return;
        };

        let scoped: FormValues = inner
            .state
            .values
            .get(field)
            .map(|value| (field.to_string(), value.clone()))
            .into_iter()
            .collect();

        match validator.validate(&scoped) {
            Ok(mut errors) => {
                if let Some(message) = errors.remove(field) {
                    debug!("Form {}: field '{}' invalid: {}", self.id, field, message);
                    inner.state = inner.state.with_field_error(field, Some(message));
                }
            }
            Err(e) => {
                error!(
                    "Form {}: validator failed on blur of '{}': {} ({})",
                    self.id,
                    field,
                    e,
                    e.error_code()
                );
            }
        }
    }

    /// Whole-form validation; replaces the stored errors
    pub async fn validate_form(&self) -> bool {
        let mut inner = self.inner.write().await;
        self.validate_locked(&mut inner)
    }

    fn validate_locked(&self, inner: &mut Inner) -> bool {
        let Some(validator) = &self.validator else {
            return true;
        };

        match validator.validate(&inner.state.values) {
            Ok(errors) => {
                inner.state = inner.state.with_errors(errors);
                inner.state.is_valid()
            }
            Err(e) => {
                error!(
                    "Form {}: validator failed: {} ({})",
                    self.id,
                    e,
                    e.error_code()
                );
                false
            }
        }
    }

    /// Validate, then hand the values to the submit handler. Never fails;
    /// handler errors are logged.
    pub async fn handle_submit(&self) -> SubmitOutcome {
        let (values, generation) = {
            let mut inner = self.inner.write().await;

            if inner.state.is_submitting {
                debug!("Form {}: submit already in progress - ignoring", self.id);
                return SubmitOutcome::Skipped;
            }

            inner.state = inner.state.with_all_touched();

            if !self.validate_locked(&mut inner) {
                debug!(
                    "Form {}: submit blocked by {} invalid field(s)",
                    self.id,
                    inner.state.errors.len()
                );
                return SubmitOutcome::Invalid;
            }

            inner.state = inner.state.with_submitting(true);
            (inner.state.values.clone(), inner.generation)
        };

        let guard = SubmittingGuard {
            form_id: self.id,
            inner: Arc::clone(&self.inner),
            generation,
            armed: true,
        };

        info!("Form {}: submitting {} field(s)", self.id, values.len());
        let result = (self.on_submit)(values).await;

        {
            let mut inner = self.inner.write().await;
            finish_submit(&mut inner, generation, self.id);
        }
        guard.disarm();

        match result {
            Ok(()) => {
                info!("Form {}: submitted", self.id);
                SubmitOutcome::Submitted
            }
            Err(e) => {
                error!(
                    "Form {}: submit handler failed: {} ({})",
                    self.id,
                    e,
                    e.error_code()
                );
                SubmitOutcome::Failed
            }
        }
    }

    /// Restore `new_values` (or the initial values) and clear everything else
    pub async fn reset(&self, new_values: Option<FormValues>) {
        let mut inner = self.inner.write().await;
        inner.state = FormState::new(new_values.unwrap_or_else(|| self.initial.clone()));
        inner.generation += 1;
        debug!("Form {}: reset", self.id);
    }

    pub async fn field_error(&self, field: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner.state.field_error(field).map(str::to_string)
    }

    pub async fn snapshot(&self) -> FormState {
        self.inner.read().await.state.clone()
    }

    pub async fn values(&self) -> FormValues {
        self.inner.read().await.state.values.clone()
    }

    pub async fn errors(&self) -> FormErrors {
        self.inner.read().await.state.errors.clone()
    }

    pub async fn touched(&self) -> BTreeSet<String> {
        self.inner.read().await.state.touched.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.read().await.state.is_submitting
    }

    /// Reflects the last validation pass, not a fresh check
    pub async fn is_valid(&self) -> bool {
        self.inner.read().await.state.is_valid()
    }

    /// Numbers compare by bit pattern, so a restored NaN is not dirty
    pub async fn is_dirty(&self) -> bool {
        self.inner.read().await.state.values != self.initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeiraError;
    use crate::forms::validator::{FieldRule, RuleValidator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn initial() -> FormValues {
        let mut values = FormValues::new();
        values.insert("nome".to_string(), FieldValue::from(""));
        values.insert("email".to_string(), FieldValue::from(""));
        values.insert("aceite".to_string(), FieldValue::from(false));
        values
    }

    fn counting_handler(calls: Arc<AtomicUsize>) -> SubmitHandler {
        Arc::new(move |_values| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), FeiraError>(())
            })
        })
    }

    fn validator() -> Arc<dyn Validator> {
        Arc::new(
            RuleValidator::new()
                .rule("nome", FieldRule::Required)
                .rule("email", FieldRule::Email),
        )
    }

    #[tokio::test]
    async fn test_set_value_clears_error() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()))
            .with_validator(validator());

        assert!(!form.validate_form().await);
        assert!(form.errors().await.contains_key("nome"));

        form.set_value("nome", FieldValue::from("Rosa")).await;

        assert_eq!(form.values().await["nome"], FieldValue::from("Rosa"));
        assert!(!form.errors().await.contains_key("nome"));
    }

    #[tokio::test]
    async fn test_handle_change_checkbox_and_text() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()));

        form.handle_change("aceite", InputEvent::checkbox(true)).await;
        form.handle_change("email", InputEvent::text("rosa@feira.com")).await;

        let values = form.values().await;
        assert_eq!(values["aceite"], FieldValue::Bool(true));
        assert_eq!(values["email"], FieldValue::from("rosa@feira.com"));
        assert!(form.is_dirty().await);
    }

    #[tokio::test]
    async fn test_blur_validates_only_that_field() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()))
            .with_validator(validator());

        form.set_value("email", FieldValue::from("invalido")).await;
        form.handle_blur("nome").await;

        assert_eq!(form.field_error("nome").await.as_deref(), Some("Campo obrigatório"));
        assert!(!form.errors().await.contains_key("email"));
        assert!(form.touched().await.contains("nome"));
    }

    #[tokio::test]
    async fn test_field_error_hidden_until_touched() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()))
            .with_validator(validator());

        form.validate_form().await;
        assert!(form.errors().await.contains_key("nome"));
        assert_eq!(form.field_error("nome").await, None);

        form.handle_blur("nome").await;
        assert!(form.field_error("nome").await.is_some());
    }

    #[tokio::test]
    async fn test_no_validator_always_valid() {
        let calls = Arc::new(AtomicUsize::new(0));
        let form = FormManager::new(initial(), counting_handler(Arc::clone(&calls)));

        assert!(form.validate_form().await);
        assert_eq!(form.handle_submit().await, SubmitOutcome::Submitted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_submit_touches_all_and_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let form = FormManager::new(initial(), counting_handler(Arc::clone(&calls)))
            .with_validator(validator());

        form.set_value("email", FieldValue::from("rosa@feira.com")).await;

        assert_eq!(form.handle_submit().await, SubmitOutcome::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!form.is_submitting().await);

        let touched = form.touched().await;
        assert_eq!(touched.len(), 3);
        assert_eq!(form.errors().await.len(), 1);
        assert!(!form.is_valid().await);
    }

    #[tokio::test]
    async fn test_double_submit_calls_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let handler: SubmitHandler = {
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            Arc::new(move |_values| {
                let calls = Arc::clone(&calls);
                let release = Arc::clone(&release);
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Ok::<(), FeiraError>(())
                })
            })
        };

        let form = Arc::new(FormManager::new(initial(), handler));

        let first = {
            let form = Arc::clone(&form);
            tokio::spawn(async move { form.handle_submit().await })
        };

        tokio::time::timeout(Duration::from_secs(2), async {
            while !form.is_submitting().await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(form.handle_submit().await, SubmitOutcome::Skipped);

        release.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Submitted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!form.is_submitting().await);
    }

    #[tokio::test]
    async fn test_handler_failure_swallowed() {
        let handler: SubmitHandler = Arc::new(|_values| {
            Box::pin(async { Err::<(), _>(FeiraError::SubmitFailed("firestore offline".to_string())) })
        });
        let form = FormManager::new(initial(), handler);

        assert_eq!(form.handle_submit().await, SubmitOutcome::Failed);
        assert!(!form.is_submitting().await);
        assert!(form.errors().await.is_empty());
    }

    #[tokio::test]
    async fn test_validator_fault_is_contained() {
        let failing = |_: &FormValues| -> Result<FormErrors> {
            Err(FeiraError::ValidatorFailed("boom".to_string()))
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let form = FormManager::new(initial(), counting_handler(Arc::clone(&calls)))
            .with_validator(Arc::new(failing));

        form.handle_blur("nome").await;
        assert!(form.touched().await.contains("nome"));
        assert!(form.errors().await.is_empty());

        assert_eq!(form.handle_submit().await, SubmitOutcome::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_restores_initial_snapshot() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()))
            .with_validator(validator());

        form.set_value("nome", FieldValue::from("Rosa")).await;
        form.set_value("email", FieldValue::from("invalido")).await;
        assert_eq!(form.handle_submit().await, SubmitOutcome::Invalid);
        assert!(form.is_dirty().await);
        assert!(!form.errors().await.is_empty());
        assert!(!form.touched().await.is_empty());

        form.reset(None).await;

        let state = form.snapshot().await;
        assert_eq!(state.values, initial());
        assert!(state.errors.is_empty());
        assert!(state.touched.is_empty());
        assert!(!state.is_submitting);
        assert!(!form.is_dirty().await);
    }

    #[tokio::test]
    async fn test_reset_with_new_values() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()));

        let mut next = FormValues::new();
        next.insert("nome".to_string(), FieldValue::from("Banca do Zé"));
        form.reset(Some(next.clone())).await;

        assert_eq!(form.values().await, next);
        assert!(form.is_dirty().await);
    }

    #[tokio::test]
    async fn test_reset_during_submit_keeps_post_reset_state() {
        let release = Arc::new(Notify::new());
        let handler: SubmitHandler = {
            let release = Arc::clone(&release);
            Arc::new(move |_values| {
                let release = Arc::clone(&release);
                Box::pin(async move {
                    release.notified().await;
                    Ok::<(), FeiraError>(())
                })
            })
        };
        let form = Arc::new(FormManager::new(initial(), handler));

        let first = {
            let form = Arc::clone(&form);
            tokio::spawn(async move { form.handle_submit().await })
        };

        tokio::time::timeout(Duration::from_secs(2), async {
            while !form.is_submitting().await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        form.reset(None).await;
        assert!(!form.is_submitting().await);

        release.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Submitted);
        assert_eq!(form.snapshot().await, FormState::new(initial()));
    }

    #[tokio::test]
    async fn test_reset_clears_errors_from_empty_required_field() {
        let form = FormManager::new(initial(), counting_handler(Arc::default()))
            .with_validator(validator());

        assert!(!form.validate_form().await);
        form.handle_blur("nome").await;
        assert!(form.field_error("nome").await.is_some());

        form.reset(None).await;

        assert!(form.errors().await.is_empty());
        assert_eq!(form.field_error("nome").await, None);
        assert!(form.is_valid().await);
    }

    #[tokio::test]
    async fn test_timed_out_submit_returns_to_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler: SubmitHandler = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_values| {
                let calls = Arc::clone(&calls);
                Box::pin(async move {
                    // first call hangs, later ones succeed
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        std::future::pending::<()>().await;
                    }
                    Ok::<(), FeiraError>(())
                })
            })
        };
        let form = FormManager::new(initial(), handler);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), form.handle_submit()).await;
        assert!(timed_out.is_err());
        assert!(!form.is_submitting().await);

        assert_eq!(form.handle_submit().await, SubmitOutcome::Submitted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_to_idle() {
        let handler: SubmitHandler = Arc::new(|_values| {
            Box::pin(async {
                if true {
                    panic!("handler crashed");
                }
                Ok::<(), FeiraError>(())
            })
        });
        let form = Arc::new(FormManager::new(initial(), handler));

        let task = {
            let form = Arc::clone(&form);
            tokio::spawn(async move { form.handle_submit().await })
        };

        let joined = task.await;
        assert!(joined.unwrap_err().is_panic());
        assert!(!form.is_submitting().await);
    }

    #[tokio::test]
    async fn test_nan_value_not_dirty_after_reset() {
        let mut values = initial();
        values.insert("preco".to_string(), FieldValue::Number(f64::NAN));
        let form = FormManager::new(values, counting_handler(Arc::default()));

        assert!(!form.is_dirty().await);

        form.set_value("preco", FieldValue::Number(2.5)).await;
        assert!(form.is_dirty().await);

        form.reset(None).await;
        assert!(!form.is_dirty().await);
    }
}
