/// Clamps page to `>= 1` and page size to `1..=max_limit`.
pub fn validate_pagination(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
    max_limit: u32,
) -> (u32, u32) {
    let max_limit = max_limit.max(1);
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults_and_bounds() {
        assert_eq!(validate_pagination(None, None, 10, 100), (1, 10));
        assert_eq!(validate_pagination(Some(0), Some(0), 10, 100), (1, 1));
        assert_eq!(validate_pagination(Some(4), Some(500), 10, 100), (4, 100));
    }
}
