use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, pages start at 1".to_string());
        }
    }
    if let Some(size) = args.page_size {
        crate::utils::parse_page_size(&size.to_string())
            .map_err(|e| format!("invalid --page-size: {e}"))?;
    }
    if let Some(raw) = args.sort.as_deref() {
        crate::utils::parse_sort_arg(raw).map_err(|e| format!("invalid --sort '{raw}': {e}"))?;
    }
    if let Some(raw) = args.keyword.as_deref() {
        if raw.trim().is_empty() {
            return Err("invalid --keyword, expected non-empty text".to_string());
        }
    }
    if let Some(raw) = args.header.as_deref() {
        if crate::utils::parse_header(raw).is_none() {
            return Err(format!("invalid --header '{raw}', expected 'Key: Value'"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text or json"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["landlordtop"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate(&args(&[])).is_ok());
    }

    #[test]
    fn rejects_zero_page_and_unknown_size() {
        assert!(validate(&args(&["--page", "0"])).is_err());
        assert!(validate(&args(&["--page-size", "20"])).is_err());
        assert!(validate(&args(&["--page-size", "50", "--page", "2"])).is_ok());
    }

    #[test]
    fn rejects_malformed_sort_and_header() {
        assert!(validate(&args(&["--sort", "grade:sideways"])).is_err());
        assert!(validate(&args(&["--header", "nocolon"])).is_err());
        assert!(validate(&args(&["--keyword", "  "])).is_err());
        assert!(validate(&args(&["--output-format", "xml"])).is_err());
    }

    #[test]
    fn sort_conflicts_with_unsorted() {
        let parsed = CliArgs::try_parse_from(["landlordtop", "--sort", "grade", "--unsorted"]);
        assert!(parsed.is_err());
    }
}
