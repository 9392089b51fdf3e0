use crate::config::toml_config::BrandingConfig;
use crate::domain::model::{ChannelKind, ContactDetails, DeliveryOutcome, ResultMapping, Submission};
use crate::utils::error::{RelayError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const OVERLAY_ID: &str = "leadCaptureOverlay";

/// Lifecycle of the open form, as reflected by its submit control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Editing,
    Sending,
    Sent,
    EmailOpened,
    TryAgain,
}

impl UiState {
    pub fn for_outcome(outcome: &DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::FallbackUsed {
                channel: ChannelKind::Mailto,
            } => UiState::EmailOpened,
            DeliveryOutcome::Delivered { .. } | DeliveryOutcome::FallbackUsed { .. } => UiState::Sent,
            DeliveryOutcome::Failed { .. } => UiState::TryAgain,
        }
    }

    pub fn accepts_submit(self) -> bool {
        matches!(self, UiState::Editing | UiState::TryAgain)
    }

    pub fn is_success(self) -> bool {
        matches!(self, UiState::Sent | UiState::EmailOpened)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub id: &'static str,
    pub kind: FieldKind,
    pub placeholder: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonView {
    pub label: String,
    pub enabled: bool,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

/// Declarative description of the capture form. Hosts render it however they
/// like and report back through [`FormEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureView {
    pub overlay_id: &'static str,
    pub calculator: String,
    pub heading: String,
    pub intro: String,
    pub heading_color: String,
    pub summary: Vec<SummaryLine>,
    pub fields: Vec<FieldView>,
    pub submit: ButtonView,
    pub privacy_note: String,
    pub close_label: &'static str,
    pub state: UiState,
}

pub fn render_capture_form(
    branding: &BrandingConfig,
    calculator_name: &str,
    results: &ResultMapping,
    state: UiState,
) -> CaptureView {
    let (label, color) = match state {
        UiState::Editing => ("Ontvang Persoonlijk Advies →", &branding.accent_color),
        UiState::Sending => ("Verzenden...", &branding.accent_color),
        UiState::Sent => ("✓ Verstuurd!", &branding.brand_color),
        UiState::EmailOpened => ("✓ Email geopend!", &branding.brand_color),
        UiState::TryAgain => ("Probeer opnieuw", &branding.accent_color),
    };

    CaptureView {
        overlay_id: OVERLAY_ID,
        calculator: calculator_name.to_string(),
        heading: "Je berekening is klaar!".to_string(),
        intro: "Wil je deze resultaten bewaren en persoonlijk advies ontvangen?".to_string(),
        heading_color: branding.brand_color.clone(),
        summary: results
            .iter()
            .map(|(label, value)| SummaryLine {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect(),
        fields: vec![
            FieldView {
                id: "name",
                kind: FieldKind::Text,
                placeholder: "Je naam",
                required: true,
            },
            FieldView {
                id: "email",
                kind: FieldKind::Email,
                placeholder: "je@email.nl",
                required: true,
            },
            FieldView {
                id: "phone",
                kind: FieldKind::Tel,
                placeholder: "Telefoonnummer (optioneel)",
                required: false,
            },
        ],
        submit: ButtonView {
            label: label.to_string(),
            enabled: state.accepts_submit(),
            color: color.clone(),
        },
        privacy_note: "🔒 Je gegevens zijn veilig. We nemen binnen 24 uur contact op.".to_string(),
        close_label: "×",
        state,
    }
}

/// What the host reports back from the rendered form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Submit(ContactDetails),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    Submit(Submission),
    Cancelled,
}

pub type CompletionCallback = Box<dyn FnOnce(ContactDetails) + Send>;

struct OpenForm {
    instance_id: u64,
    calculator_name: String,
    results: ResultMapping,
    state: UiState,
    contact: Option<ContactDetails>,
    on_success: Option<CompletionCallback>,
}

/// A removed form whose completion callback has not run yet.
pub struct Completion {
    on_success: Option<CompletionCallback>,
    contact: Option<ContactDetails>,
}

impl Completion {
    pub fn contact(&self) -> Option<&ContactDetails> {
        self.contact.as_ref()
    }

    pub fn run(self) {
        if let (Some(callback), Some(contact)) = (self.on_success, self.contact) {
            callback(contact);
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("has_callback", &self.on_success.is_some())
            .field("contact", &self.contact)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowReceipt {
    pub instance_id: u64,
    /// An earlier form was open and has been removed.
    pub replaced: bool,
}

/// Holds the single capture form a page may show at a time.
pub struct CaptureSurface {
    branding: BrandingConfig,
    next_instance: u64,
    open: Option<OpenForm>,
}

pub type SharedSurface = Arc<Mutex<CaptureSurface>>;

pub fn lock_surface(surface: &SharedSurface) -> MutexGuard<'_, CaptureSurface> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CaptureSurface {
    pub fn new(branding: BrandingConfig) -> Self {
        Self {
            branding,
            next_instance: 1,
            open: None,
        }
    }

    pub fn shared(branding: BrandingConfig) -> SharedSurface {
        Arc::new(Mutex::new(Self::new(branding)))
    }

    /// Opens the form, removing any form that is still open.
    pub fn show(
        &mut self,
        calculator_name: impl Into<String>,
        results: ResultMapping,
        on_success: Option<CompletionCallback>,
    ) -> ShowReceipt {
        let replaced = self.open.take().is_some();
        let instance_id = self.next_instance;
        self.next_instance += 1;

        let calculator_name = calculator_name.into();
        if replaced {
            tracing::debug!("🗂️ Replacing open capture form with one for {}", calculator_name);
        }

        self.open = Some(OpenForm {
            instance_id,
            calculator_name,
            results,
            state: UiState::Editing,
            contact: None,
            on_success,
        });

        ShowReceipt {
            instance_id,
            replaced,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn instance_id(&self) -> Option<u64> {
        self.open.as_ref().map(|f| f.instance_id)
    }

    pub fn state(&self) -> Option<UiState> {
        self.open.as_ref().map(|f| f.state)
    }

    pub fn view(&self) -> Option<CaptureView> {
        self.open.as_ref().map(|form| {
            render_capture_form(&self.branding, &form.calculator_name, &form.results, form.state)
        })
    }

    pub fn handle_event(
        &mut self,
        event: FormEvent,
        source_url: &str,
        now: DateTime<Utc>,
    ) -> Result<FormAction> {
        match event {
            FormEvent::Submit(contact) => self.submit(contact, source_url, now).map(FormAction::Submit),
            FormEvent::Close => {
                self.close();
                Ok(FormAction::Cancelled)
            }
        }
    }

    /// Validates the input and disables the submit control. Exactly one
    /// submission exists per accepted submit.
    pub fn submit(
        &mut self,
        contact: ContactDetails,
        source_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        let form = self.open.as_mut().ok_or(RelayError::NoActiveForm)?;
        if !form.state.accepts_submit() {
            return Err(RelayError::SubmissionInProgress);
        }

        let submission = Submission::new(
            &contact,
            form.calculator_name.clone(),
            form.results.clone(),
            source_url,
            now,
        )?;

        form.state = UiState::Sending;
        form.contact = Some(submission.contact());
        Ok(submission)
    }

    /// Reflects a dispatch result on the form that produced it.
    pub fn apply_outcome(&mut self, instance_id: u64, outcome: &DeliveryOutcome) -> Result<UiState> {
        let form = self
            .open
            .as_mut()
            .filter(|f| f.instance_id == instance_id)
            .ok_or(RelayError::NoActiveForm)?;

        form.state = UiState::for_outcome(outcome);
        Ok(form.state)
    }

    /// Removes a successfully submitted form. The returned [`Completion`]
    /// carries its callback; run it once the surface lock is released.
    pub fn complete(&mut self, instance_id: u64) -> Option<Completion> {
        let done = matches!(
            &self.open,
            Some(f) if f.instance_id == instance_id && f.state.is_success()
        );
        if !done {
            return None;
        }

        self.open.take().map(|form| Completion {
            on_success: form.on_success,
            contact: form.contact,
        })
    }

    /// Close control: removes the form without a callback.
    pub fn close(&mut self) -> bool {
        self.open.take().is_some()
    }
}

#[derive(Debug)]
pub enum AutoCapture {
    /// Delay was zero; whether the form was shown.
    Immediate(bool),
    Scheduled(JoinHandle<bool>),
}

/// Shows the form after `delay`, provided the producer then has results.
///
/// A zero delay shows it right away without suspending. Returning `None` or
/// an empty mapping from the producer shows nothing.
pub fn schedule_auto_capture<F>(
    surface: SharedSurface,
    calculator_name: impl Into<String>,
    producer: F,
    delay: Duration,
) -> AutoCapture
where
    F: FnOnce() -> Option<ResultMapping> + Send + 'static,
{
    let calculator_name = calculator_name.into();

    if delay.is_zero() {
        return AutoCapture::Immediate(show_if_results(&surface, calculator_name, producer));
    }

    AutoCapture::Scheduled(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        show_if_results(&surface, calculator_name, producer)
    }))
}

fn show_if_results<F>(surface: &SharedSurface, calculator_name: String, producer: F) -> bool
where
    F: FnOnce() -> Option<ResultMapping>,
{
    match producer() {
        Some(results) if !results.is_empty() => {
            lock_surface(surface).show(calculator_name, results, None);
            true
        }
        _ => {
            tracing::debug!("🗂️ No results for {}, capture form not shown", calculator_name);
            false
        }
    }
}
