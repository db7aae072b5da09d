//! `sourceMappingURL` directive extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `//# sourceMappingURL=<url>` and the legacy `//@ sourceMappingURL=<url>`.
static DIRECTIVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//[#@][ \t]*sourceMappingURL=([^\s'\x22]+)").unwrap());

/// Returns the URL of the last source-map directive in `script`.
///
/// Later directives override earlier ones, so only the last occurrence counts.
pub fn last_source_mapping_url(script: &str) -> Option<&str> {
    DIRECTIVE_PATTERN
        .captures_iter(script)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_hash_directive() {
        let js = "console.log(1);\n//# sourceMappingURL=main.js.map\n";
        assert_eq!(last_source_mapping_url(js), Some("main.js.map"));
    }

    #[test]
    fn finds_legacy_at_directive() {
        let js = "var a;\n//@ sourceMappingURL=legacy.map";
        assert_eq!(last_source_mapping_url(js), Some("legacy.map"));
    }

    #[test]
    fn last_directive_wins() {
        let js = "//# sourceMappingURL=first.map\ncode();\n//# sourceMappingURL=second.map\n";
        assert_eq!(last_source_mapping_url(js), Some("second.map"));
    }

    #[test]
    fn none_without_directive() {
        assert_eq!(last_source_mapping_url("function f() {}"), None);
        assert_eq!(last_source_mapping_url("// sourceMappingURL=nope.map"), None);
    }

    #[test]
    fn keeps_inline_payload_intact() {
        let js = "x();\n//# sourceMappingURL=data:application/json;base64,eyJ2ZXJzaW9uIjozfQ==";
        assert_eq!(
            last_source_mapping_url(js),
            Some("data:application/json;base64,eyJ2ZXJzaW9uIjozfQ==")
        );
    }
}
