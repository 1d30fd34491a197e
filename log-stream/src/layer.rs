use crate::sender::{
    ConnectionState,
    LogSender,
};
use std::fmt::{
    self,
    Write as _,
};
use tracing::{
    field::{
        Field,
        Visit,
    },
    Event,
    Level,
    Subscriber,
};
use tracing_subscriber::{
    layer::Context,
    Layer,
};

/// Events from these targets are never streamed, they would feed back into the sender.
const SKIPPED_TARGETS: &[&str] = &["logtick_log_stream", "tokio_tungstenite", "tungstenite"];

/// Forwards `INFO` and more severe events to a [`LogSender`].
///
/// The line's service is the event's `collector` field when present, its
/// target otherwise.
pub struct StreamLayer {
    sender: LogSender,
}

impl StreamLayer {
    pub fn new(sender: LogSender) -> Self {
        Self { sender }
    }
}

impl<S: Subscriber> Layer<S> for StreamLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::INFO {
            return;
        }
        if SKIPPED_TARGETS.iter().any(|target| metadata.target().starts_with(target)) {
            return;
        }
        if self.sender.state() != ConnectionState::Connected {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let service = visitor.collector.unwrap_or_else(|| metadata.target().to_string());
        let message = visitor.message + &visitor.fields;
        let level = metadata.level().as_str().to_lowercase();
        self.sender.emit(&service, &message, &level);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
    collector: Option<String>,
}

impl LineVisitor {
    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {}={}", field.name(), value);
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "collector" => self.collector = Some(value.to_string()),
            _ => self.push_field(field, format_args!("{value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "collector" => self.collector = Some(format!("{value:?}").trim_matches('"').to_string()),
            _ => self.push_field(field, format_args!("{value:?}")),
        }
    }
}
