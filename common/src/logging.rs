use crate::config::Loki;
use std::fs::File;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};
use url::Url;

fn filter(module_name: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{module_name}=debug,tower_http=info")))
}

/// Installs stdout and `<module_name>/log.txt` layers, plus a Loki layer when configured.
/// Must be called from inside a tokio runtime since the Loki shipper is spawned onto it.
pub fn setup_logging(module_name: &str, loki: Option<&Loki>) {
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_filter(filter(module_name));

    std::fs::create_dir_all(module_name).expect("failed to create log directory");
    let file = File::create(format!("{module_name}/log.txt")).expect("failed to create log file");
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(filter(module_name));

    let loki_log = loki.map(|loki| {
        let (layer, task) = tracing_loki::builder()
            .label("application", module_name)
            .expect("invalid loki label")
            .extra_field("pid", std::process::id().to_string())
            .expect("invalid loki field")
            .build_url(Url::parse(&loki.url).expect("invalid loki url"))
            .expect("could not build loki");
        tokio::spawn(task);
        layer.with_filter(filter(module_name))
    });

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(stdout_log)
            .with(file_log)
            .with(loki_log),
    )
    .expect("failed to set global default");
}
