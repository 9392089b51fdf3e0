use anyhow::Result;
use httpmock::prelude::*;
use lead_relay::app::presentation::{lock_surface, schedule_auto_capture, AutoCapture, UiState};
use lead_relay::domain::ports::UriOpener;
use lead_relay::{
    CapturePolicy, CaptureSurface, ChannelKind, ContactDetails, DeliveryOutcome, LeadCapture,
    RelayConfig, RelayError, ResultMapping,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    fn uris(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UriOpener for RecordingOpener {
    fn open(&self, uri: &str) -> lead_relay::Result<()> {
        self.opened.lock().unwrap().push(uri.to_string());
        Ok(())
    }
}

fn base_config(server: &MockServer) -> RelayConfig {
    let mut config = RelayConfig::for_operator("ops@finaforte.nl");
    config.dispatch.channels = vec!["email".to_string()];
    config.branding.close_delay_ms = 0;
    config.email.endpoint = server.url("/ajax");
    config.crm.api_url = server.url("/contacts/");
    config.crm.api_key = Some("pit-test".to_string());
    config.crm.location_id = Some("loc-42".to_string());
    config.webhook.base_url = server.url("/hooks");
    config
}

fn results() -> ResultMapping {
    ResultMapping::new()
        .with("Netto maandloon", 2874)
        .with("Vakantiegeld", "€ 2.760")
}

fn contact() -> ContactDetails {
    ContactDetails {
        name: "Jane Public".to_string(),
        email: "jane@example.nl".to_string(),
        phone: None,
    }
}

fn counting_callback(counter: &Arc<AtomicUsize>) -> Box<dyn FnOnce(ContactDetails) + Send> {
    let counter = counter.clone();
    Box::new(move |_contact| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn test_email_success_closes_form_and_runs_callback() -> Result<()> {
    let server = MockServer::start();
    let email_mock = server.mock(|when, then| {
        when.method(POST).path_contains("/ajax/");
        then.status(200).json_body(serde_json::json!({"success": "true"}));
    });

    let opener = Arc::new(RecordingOpener::default());
    let capture = LeadCapture::from_config(&base_config(&server), CapturePolicy::EmailWithMailto, opener.clone())?;

    let calls = Arc::new(AtomicUsize::new(0));
    let surface = CaptureSurface::shared(Default::default());
    lock_surface(&surface).show("Salaris", results(), Some(counting_callback(&calls)));

    let result = capture.submit(&surface, contact(), "https://finaforte.nl/salaris").await?;

    assert_eq!(result.ui_state, UiState::Sent);
    assert!(result.completed);
    assert!(matches!(result.outcome, DeliveryOutcome::Delivered { .. }));
    assert!(!lock_surface(&surface).is_open());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(opener.uris().is_empty());
    email_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_completion_callback_can_show_the_next_form() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("/ajax/");
        then.status(200).json_body(serde_json::json!({"success": "true"}));
    });

    let capture = LeadCapture::from_config(
        &base_config(&server),
        CapturePolicy::EmailWithMailto,
        Arc::new(RecordingOpener::default()),
    )?;

    let surface = CaptureSurface::shared(Default::default());
    let inner = surface.clone();
    let lock_was_free = Arc::new(AtomicUsize::new(0));
    let seen = lock_was_free.clone();
    lock_surface(&surface).show(
        "Salaris",
        results(),
        Some(Box::new(move |_contact: ContactDetails| {
            if inner.try_lock().is_ok() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            lock_surface(&inner).show("Hypotheek", results(), None);
        })),
    );

    let result = capture.submit(&surface, contact(), "").await?;

    assert!(result.completed);
    assert_eq!(lock_was_free.load(Ordering::SeqCst), 1);
    let guard = lock_surface(&surface);
    assert_eq!(guard.state(), Some(UiState::Editing));
    assert_eq!(guard.view().unwrap().calculator, "Hypotheek");
    Ok(())
}

#[tokio::test]
async fn test_email_failure_opens_mailto_and_counts_as_success() -> Result<()> {
    let server = MockServer::start();
    let email_mock = server.mock(|when, then| {
        when.method(POST).path_contains("/ajax/");
        then.status(503);
    });

    let opener = Arc::new(RecordingOpener::default());
    let capture = LeadCapture::from_config(&base_config(&server), CapturePolicy::EmailWithMailto, opener.clone())?;

    let calls = Arc::new(AtomicUsize::new(0));
    let surface = CaptureSurface::shared(Default::default());
    lock_surface(&surface).show("Salaris", results(), Some(counting_callback(&calls)));

    let result = capture.submit(&surface, contact(), "https://finaforte.nl/salaris").await?;

    assert_eq!(
        result.outcome,
        DeliveryOutcome::FallbackUsed {
            channel: ChannelKind::Mailto
        }
    );
    assert_eq!(result.ui_state, UiState::EmailOpened);
    assert!(result.completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let uris = opener.uris();
    assert_eq!(uris.len(), 1);
    assert!(uris[0].starts_with("mailto:ops@finaforte.nl?subject="));
    let body = urlencoding::decode(uris[0].split_once("&body=").unwrap().1)?;
    assert!(body.contains("• Netto maandloon: 2874"));
    assert!(body.contains("• Vakantiegeld: € 2.760"));
    email_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_crm_failure_leaves_form_open_for_retry() -> Result<()> {
    let server = MockServer::start();
    let crm_mock = server.mock(|when, then| {
        when.method(POST).path("/contacts/");
        then.status(500);
    });
    let webhook_mock = server.mock(|when, then| {
        when.method(POST).path_contains("/webhook-trigger");
        then.status(500);
    });

    let mut config = base_config(&server);
    config.dispatch.channels = vec!["crm".to_string()];
    config.webhook.require_ack = true;

    let opener = Arc::new(RecordingOpener::default());
    let capture = LeadCapture::from_config(&config, CapturePolicy::CrmOnly, opener.clone())?;

    let calls = Arc::new(AtomicUsize::new(0));
    let surface = CaptureSurface::shared(Default::default());
    lock_surface(&surface).show("Salaris", results(), Some(counting_callback(&calls)));

    let result = capture.submit(&surface, contact(), "").await?;

    assert!(matches!(result.outcome, DeliveryOutcome::Failed { .. }));
    assert_eq!(result.ui_state, UiState::TryAgain);
    assert!(!result.completed);
    assert!(opener.uris().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    {
        let guard = lock_surface(&surface);
        assert!(guard.is_open());
        let view = guard.view().unwrap();
        assert!(view.submit.enabled);
        assert_eq!(view.submit.label, "Probeer opnieuw");
    }

    // A retry is a fresh submission through the same chain.
    capture.submit(&surface, contact(), "").await?;
    crm_mock.assert_hits(2);
    webhook_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_never_reaches_the_network() -> Result<()> {
    let server = MockServer::start();
    let email_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(serde_json::json!({}));
    });

    let capture = LeadCapture::from_config(
        &base_config(&server),
        CapturePolicy::EmailWithMailto,
        Arc::new(RecordingOpener::default()),
    )?;
    let surface = CaptureSurface::shared(Default::default());
    lock_surface(&surface).show("Salaris", results(), None);

    let mut input = contact();
    input.name = "   ".to_string();
    let err = capture.submit(&surface, input, "").await.unwrap_err();

    assert!(matches!(err, RelayError::ValidationError { .. }));
    assert_eq!(lock_surface(&surface).state(), Some(UiState::Editing));
    email_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_close_delay_holds_success_state() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("/ajax/");
        then.status(200).json_body(serde_json::json!({"success": "true"}));
    });

    let mut config = base_config(&server);
    config.branding.close_delay_ms = 30;
    let capture = LeadCapture::from_config(
        &config,
        CapturePolicy::EmailWithMailto,
        Arc::new(RecordingOpener::default()),
    )?;

    let surface = CaptureSurface::shared(Default::default());
    lock_surface(&surface).show("Salaris", results(), None);

    let started = std::time::Instant::now();
    let result = capture.submit(&surface, contact(), "").await?;
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(result.completed);
    Ok(())
}

#[test]
fn test_zero_delay_auto_capture_needs_no_runtime() {
    let surface = CaptureSurface::shared(Default::default());
    let scheduled = schedule_auto_capture(surface.clone(), "Salaris", || Some(results()), Duration::ZERO);

    assert!(matches!(scheduled, AutoCapture::Immediate(true)));
    assert_eq!(lock_surface(&surface).view().unwrap().calculator, "Salaris");
}

#[test]
fn test_delayed_auto_capture_replaces_open_form() {
    tokio_test::block_on(async {
        let surface = CaptureSurface::shared(Default::default());
        let first = lock_surface(&surface).show("Hypotheek", results(), None);

        let scheduled = schedule_auto_capture(
            surface.clone(),
            "Salaris",
            || Some(results()),
            Duration::from_millis(20),
        );
        assert_eq!(lock_surface(&surface).instance_id(), Some(first.instance_id));

        if let AutoCapture::Scheduled(handle) = scheduled {
            assert!(handle.await.unwrap());
        } else {
            panic!("expected a scheduled capture");
        }

        let guard = lock_surface(&surface);
        assert_ne!(guard.instance_id(), Some(first.instance_id));
        assert_eq!(guard.view().unwrap().calculator, "Salaris");
    });
}
