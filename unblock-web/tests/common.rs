#![allow(dead_code)]

use std::sync::OnceLock;

use unblock_common::observability::{LogConfig, LogFormat};
use unblock_web::{Credentials, UnlockerClient};
use wiremock::MockServer;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub const TOKEN: &str = "test-token";
pub const ZONE: &str = "unblocker";

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "unblock-tests",
            emit_stderr: true,
            format: if std::env::var("UNBLOCK_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
            ..LogConfig::default()
        };

        unblock_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn unlocker(server: &MockServer) -> UnlockerClient {
    UnlockerClient::with_credentials(&server.uri(), Credentials::new(TOKEN, ZONE).unwrap()).unwrap()
}
