//! Script-data escaping.
//!
//! An inline `<script>` body is parsed by the HTML tokeniser before the
//! JavaScript engine ever sees it: a `</` can close the script element
//! early and a `<!--` switches the tokeniser into its comment-aware state.
//! Both sequences are neutralised with a backslash, which is a no-op for
//! JavaScript inside string and regex literals and in source text, but
//! stops the HTML parser from acting on them.

/// Neutralise script-data end markers in an assembled script source.
pub fn escape_script_content(source: &str) -> String {
    source.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_tag_is_neutralised() {
        let escaped = escape_script_content("x = '</script><script>alert(1)</script>'");
        assert!(!escaped.contains("</"));
        assert_eq!(
            escaped,
            "x = '<\\/script><script>alert(1)<\\/script>'"
        );
    }

    #[test]
    fn test_comment_open_is_neutralised() {
        let escaped = escape_script_content("if (a <!--b) {}");
        assert!(!escaped.contains("<!--"));
        assert_eq!(escaped, "if (a <\\!--b) {}");
    }

    #[test]
    fn test_escaping_is_idempotent() {
        let once = escape_script_content("a</b<!--c");
        let twice = escape_script_content(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_plain_source_is_untouched() {
        let source = "(() => { console.log(1 < 2); })()";
        assert_eq!(escape_script_content(source), source);
    }
}
