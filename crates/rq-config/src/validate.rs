use crate::rq::RqConfig;

/// Internal validation, called automatically during `RqConfig::from_str` / `load`.
pub(crate) fn validate(config: &RqConfig) -> anyhow::Result<()> {
    // service.base_uri must be an http(s) URI with a host
    let uri = &config.service.base_uri;
    let rest = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .ok_or_else(|| {
            anyhow::anyhow!("service.base_uri must start with \"http://\" or \"https://\", got {uri:?}")
        })?;
    if rest.trim_matches('/').is_empty() {
        anyhow::bail!("service.base_uri has no host: {uri:?}");
    }
    if uri.contains('?') || uri.contains('#') {
        anyhow::bail!("service.base_uri must not carry a query or fragment: {uri:?}");
    }

    if config.service.default_top == Some(0) {
        anyhow::bail!("service.default_top must be > 0");
    }

    if config.schema.files.trim().is_empty() {
        anyhow::bail!("schema.files must not be empty");
    }

    if config.logging.level.trim().is_empty() {
        anyhow::bail!("logging.level must not be empty");
    }

    Ok(())
}
