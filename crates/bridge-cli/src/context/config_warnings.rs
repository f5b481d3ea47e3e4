use bridge_config::BridgeConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &BridgeConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &BridgeConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.erp.is_configured() && has_env_prefix(&env_keys, "ERPBRIDGE_ERP") {
        warnings.push(
            "ERP config appears incomplete while ERPBRIDGE_ERP* env vars exist. Use double underscores (example: ERPBRIDGE_ERP__URL)."
                .to_string(),
        );
    }

    if config.tenants.is_empty() && has_env_prefix(&env_keys, "ERPBRIDGE_TENANTS") {
        warnings.push(
            "No tenant connections loaded while ERPBRIDGE_TENANTS* env vars exist. Use ERPBRIDGE_TENANTS__<TENANT>__URL."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter()
        .any(|key| key.starts_with(prefix) && !key.contains("__"))
}
