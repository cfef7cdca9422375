pub fn compact_error(value: &str) -> String {
    const LIMIT: usize = 120;
    let cleaned = value.replace('\n', " ");
    if cleaned.chars().count() <= LIMIT {
        return cleaned;
    }
    let truncated = cleaned.chars().take(LIMIT).collect::<String>();
    format!("{truncated}...")
}
