use color_eyre::Result;
use eyre::Context as _;
use logtick_log_stream::{
    LogSender,
    StreamLayer,
};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// JSON logs on stdout, filtered by `RUST_LOG` or else `level`. With a
/// sender, `INFO` and more severe events are also streamed.
pub fn init_logging(level: &str, log_sender: Option<LogSender>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level {level:?}"))?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().json().with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .with(log_sender.map(|sender| StreamLayer::new(sender).with_filter(LevelFilter::INFO)))
        .try_init()
        .wrap_err("Failed to initialize tracing subscriber")?;
    Ok(())
}
