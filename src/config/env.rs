//! Environment variable overlay.
//!
//! Every scalar in [`GatewayConfig`] can be overridden by a `NATS_GATEWAY_*`
//! variable. The overlay runs after the file layer, so a variable always
//! wins over the same setting in TOML.

use super::loader::ConfigError;
use super::schema::GatewayConfig;

/// Overrides `config` from the process environment.
pub fn apply_env(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    apply_from(config, |name| std::env::var(name).ok())
}

/// Overrides `config` from an arbitrary variable source.
///
/// Split out from [`apply_env`] so tests can drive the overlay without
/// touching process-global environment state.
pub fn apply_from<F>(config: &mut GatewayConfig, get: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    set_parsed(&get, "NATS_GATEWAY_PORT", &mut config.listener.port)?;
    set_parsed(&get, "NATS_GATEWAY_MAX_BODY_BYTES", &mut config.listener.max_body_bytes)?;
    set_string(&get, "NATS_GATEWAY_BUS_URL", &mut config.bus.url);
    set_parsed(&get, "NATS_GATEWAY_REPLY_TIMEOUT_MS", &mut config.bus.reply_timeout_ms)?;

    set_parsed(&get, "NATS_GATEWAY_HEAD_STATUS_CODE", &mut config.response.head_status)?;
    set_parsed(&get, "NATS_GATEWAY_GET_STATUS_CODE", &mut config.response.get_status)?;
    set_parsed(&get, "NATS_GATEWAY_PUT_STATUS_CODE", &mut config.response.put_status)?;
    set_parsed(&get, "NATS_GATEWAY_POST_STATUS_CODE", &mut config.response.post_status)?;
    set_parsed(&get, "NATS_GATEWAY_PATCH_STATUS_CODE", &mut config.response.patch_status)?;
    set_parsed(&get, "NATS_GATEWAY_DELETE_STATUS_CODE", &mut config.response.delete_status)?;
    set_string(&get, "NATS_GATEWAY_CONTENT_TYPE", &mut config.response.content_type);

    set_string(&get, "NATS_GATEWAY_METRICS_SUBJECT", &mut config.observability.metrics_subject);
    set_string(&get, "NATS_GATEWAY_LOGS_SUBJECT", &mut config.observability.logs_subject);
    set_string(&get, "NATS_GATEWAY_TRACE_HEADER", &mut config.observability.trace_header);
    set_parsed(&get, "NATS_GATEWAY_PROMETHEUS_ENABLED", &mut config.observability.prometheus_enabled)?;
    set_string(&get, "NATS_GATEWAY_PROMETHEUS_ADDRESS", &mut config.observability.prometheus_address);

    Ok(())
}

fn set_string<F>(get: &F, var: &'static str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = get(var) {
        *target = value;
    }
}

fn set_parsed<F, T>(get: &F, var: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = get(var) {
        *target = value.parse().map_err(|e: T::Err| ConfigError::Env {
            var,
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
