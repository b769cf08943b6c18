//! A `tracing` layer that mails qualifying events through a [`MailHook`].

use crate::core::{FieldValue, LogEntry, Severity};
use crate::notification::hook::MailHook;
use crate::notification::sendgrid::{MailSender, SendGridClient};
use crate::notification::HookError;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{error, Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as busy delivering until dropped.
struct DeliveryGuard;

impl DeliveryGuard {
    fn enter() -> Self {
        DELIVERING.with(|flag| flag.set(true));
        DeliveryGuard
    }

    fn active() -> bool {
        DELIVERING.with(Cell::get)
    }
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(false));
    }
}

type ErrorHandler = Arc<dyn Fn(&HookError, &LogEntry) + Send + Sync>;

/// Forwards events whose level is in the hook's active set to
/// [`MailHook::handle`].
///
/// Delivery happens synchronously on the thread that emitted the event.
/// Events emitted on that thread while a delivery is in flight (including
/// the HTTP client's own diagnostics) are not mailed.
pub struct MailLayer<M: MailSender = SendGridClient> {
    hook: Arc<MailHook<M>>,
    on_error: ErrorHandler,
}

impl<M: MailSender> MailLayer<M> {
    /// Creates a layer that reports failed deliveries with `tracing::error!`.
    pub fn new(hook: Arc<MailHook<M>>) -> Self {
        Self {
            hook,
            on_error: Arc::new(|e, entry| {
                error!(error = %e, severity = %entry.severity, "Failed to deliver log notification");
            }),
        }
    }

    /// Replaces the handler called when an event could not be mailed.
    pub fn with_error_handler(
        mut self,
        on_error: impl Fn(&HookError, &LogEntry) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(on_error);
        self
    }

    pub fn hook(&self) -> &Arc<MailHook<M>> {
        &self.hook
    }
}

impl<S, M> Layer<S> for MailLayer<M>
where
    S: Subscriber,
    M: MailSender + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if DeliveryGuard::active() {
            return;
        }

        let severity = Severity::from(*event.metadata().level());
        if !self.hook.is_enabled(severity) {
            return;
        }

        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(severity, visitor.message.unwrap_or_default());
        entry.fields = visitor.fields;

        let _guard = DeliveryGuard::enter();
        if let Err(e) = self.hook.handle(&entry) {
            (self.on_error)(&e, &entry);
        }
    }
}

/// Collects an event's message and fields.
#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    fields: BTreeMap<String, FieldValue>,
}

impl EntryVisitor {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EntryVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.insert(field, FieldValue::Str(value_str));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::Str(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::Bool(value));
    }
}
