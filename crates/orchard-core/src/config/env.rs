#[must_use]
pub(super) fn read_non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn parse_u64_at_least(raw: Option<&str>, default_value: u64, min_value: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
pub(super) fn read_env_u64_at_least(name: &str, default_value: u64, min_value: u64) -> u64 {
    parse_u64_at_least(
        std::env::var(name).ok().as_deref(),
        default_value,
        min_value,
    )
}
