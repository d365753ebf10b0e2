use crate::prelude::*;
use futures::executor::{ThreadPool, block_on};
use gpui::SharedString;

#[derive(Clone, Debug, PartialEq, crate::form::FormModel)]
struct TicketForm {
    holder: SharedString,
    email: SharedString,
    seats: u8,
}

fn ticket_schema() -> Schema<TicketForm> {
    let fields = TicketForm::fields();
    Schema::new()
        .field(fields.holder(), Required::new("Holder name is required"))
        .field(fields.holder(), MinLength::new(2))
        .field(fields.email(), Email::default())
        .field(fields.seats(), InRange::new(1u8, 8u8))
}

#[test]
fn prelude_exports_form_and_feedback_types() {
    let _ = FormOptions::default();
    let _ = ValidationMode::OnBlur;
    let _ = SubmitState::Idle;
    let _ = ToastConfig::default();
    let _ = ToastKind::Announcement;
    assert_eq!(DEFAULT_TOAST_DURATION_MS, 6_000);
    assert_eq!(
        TicketForm::FIELD_KEYS,
        &[
            FieldKey::new("holder"),
            FieldKey::new("email"),
            FieldKey::new("seats")
        ]
    );
}

#[test]
fn submit_outcome_reported_through_toasts() {
    let scope = ArenaProvider::new().into_scope(ThreadPool::new().expect("thread pool"));
    let toasts = use_toasts(&scope);

    let controller = FormController::new(
        TicketForm {
            holder: "".into(),
            email: "fan@club.org".into(),
            seats: 2,
        },
        ticket_schema(),
        {
            let toasts = toasts.clone();
            move |values: TicketForm| {
                let toasts = toasts.clone();
                async move {
                    toasts.success("Tickets booked", format!("{} seat(s)", values.seats));
                    anyhow::Ok(())
                }
            }
        },
    );

    assert_eq!(
        block_on(controller.handle_submit()).expect("submit"),
        SubmitOutcome::Invalid
    );
    assert!(toasts.is_empty());

    controller
        .set_value(TicketForm::fields().holder(), "Sam Rivera".into())
        .expect("set holder");
    assert_eq!(
        block_on(controller.handle_submit()).expect("submit"),
        SubmitOutcome::Submitted
    );

    let entries = toasts.toasts();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ToastKind::Success);
    assert_eq!(entries[0].body, "2 seat(s)");
}
