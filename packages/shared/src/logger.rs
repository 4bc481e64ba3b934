//! Logging setup utilities for the Tandem binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level.
const TANDEM_CRATES: [&str; 3] = ["tandem_shared", "tandem_server", "tandem_client"];

/// Build the default filter directive string used when `RUST_LOG` is not set.
///
/// Every Tandem crate and the running binary are enabled at `default_log_level`;
/// everything else (axum, hyper, tungstenite...) falls back to `warn`.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        TANDEM_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, default_log_level)),
    );
    directives.push(format!(
        "{}={}",
        binary_name.replace('-', "_"),
        default_log_level
    ));
    directives.push(format!("tower_http={}", default_log_level));
    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "tandem-server", "tandem-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tandem_shared::logger::setup_logger;
///
/// setup_logger("tandem-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_enables_all_tandem_crates() {
        // テスト項目: すべての Tandem クレートが指定レベルで有効になる
        // given (前提条件):
        let binary = "tandem-server";

        // when (操作):
        let filter = default_filter(binary, "info");

        // then (期待する結果):
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("tandem_shared=info"));
        assert!(filter.contains("tandem_server=info"));
        assert!(filter.contains("tandem_client=info"));
    }

    #[test]
    fn test_default_filter_normalizes_binary_name() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let binary = "tandem-client";

        // when (操作):
        let filter = default_filter(binary, "debug");

        // then (期待する結果):
        assert!(filter.contains("tandem_client=debug"));
        assert!(!filter.contains("tandem-client"));
    }
}
