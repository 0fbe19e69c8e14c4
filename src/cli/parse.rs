use tonebench_core::format::OutputFormat;
use tonebench_core::provider::ProviderKind;

/// Parse output format from string
pub fn parse_output_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Parse provider kind from string
pub fn parse_provider_kind(s: &str) -> std::result::Result<ProviderKind, String> {
    s.parse::<ProviderKind>().map_err(|e| e.to_string())
}
