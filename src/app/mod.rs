// Application layer: the capture form and the flow that feeds it to the dispatcher.

pub mod capture;
pub mod presentation;

pub use capture::{CapturePolicy, CaptureResult, LeadCapture};
pub use presentation::{
    render_capture_form, schedule_auto_capture, AutoCapture, CaptureSurface, CaptureView, Completion,
    FormAction, FormEvent, SharedSurface, UiState,
};
