use crate::query::{validate_page_size, SortDirection, PAGE_SIZES};

/// Splits a raw `Key: Value` header. Both sides are trimmed; the name must not
/// be empty.
pub fn parse_header(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Parses `COLUMN[:asc|desc]`. Without a direction the column's own first
/// direction applies, so `None` is returned for it.
pub fn parse_sort_arg(value: &str) -> Result<(String, Option<SortDirection>), String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("sort column is empty".to_string());
    }
    match raw.rsplit_once(':') {
        Some((column, direction)) => {
            let column = column.trim();
            if column.is_empty() {
                return Err("sort column is empty".to_string());
            }
            let direction = SortDirection::parse(direction)
                .ok_or_else(|| format!("invalid sort direction '{}'", direction.trim()))?;
            Ok((column.to_string(), Some(direction)))
        }
        None => Ok((raw.to_string(), None)),
    }
}

pub fn parse_page_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid page size '{}'", value.trim()))?;
    validate_page_size(size).map_err(|e| e.to_string())
}

pub fn page_sizes_csv() -> String {
    PAGE_SIZES
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pads or cuts `value` to exactly `width` characters.
pub fn fit(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count <= width {
        return format!("{value}{}", " ".repeat(width - count));
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = value.chars().take(width - 1).collect();
    out.push('~');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_trims_both_sides() {
        assert_eq!(
            parse_header("Authorization:  Bearer abc "),
            Some(("Authorization", "Bearer abc"))
        );
        assert_eq!(parse_header("X-Empty:"), Some(("X-Empty", "")));
        assert_eq!(parse_header(": value"), None);
        assert_eq!(parse_header("no separator"), None);
    }

    #[test]
    fn parse_sort_arg_accepts_optional_direction() {
        assert_eq!(
            parse_sort_arg("grade:asc").unwrap(),
            ("grade".to_string(), Some(SortDirection::Asc))
        );
        assert_eq!(
            parse_sort_arg(" eviction_count ").unwrap(),
            ("eviction_count".to_string(), None)
        );
        assert_eq!(
            parse_sort_arg("Eviction Count:DESC").unwrap(),
            ("Eviction Count".to_string(), Some(SortDirection::Desc))
        );
        assert!(parse_sort_arg("grade:up").is_err());
        assert!(parse_sort_arg(":asc").is_err());
        assert!(parse_sort_arg("  ").is_err());
    }

    #[test]
    fn parse_page_size_only_allows_known_sizes() {
        assert_eq!(parse_page_size("25"), Ok(25));
        assert_eq!(parse_page_size(" 100 "), Ok(100));
        assert!(parse_page_size("20").is_err());
        assert!(parse_page_size("ten").is_err());
        assert_eq!(page_sizes_csv(), "10, 25, 50, 100");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc~");
        assert_eq!(fit("abc", 3), "abc");
        assert_eq!(fit("abc", 0), "");
    }
}
