//! The produced `<script>` element.

/// A script element ready for embedding in server-rendered HTML.
///
/// The escaped script source is its only content; no `src`, `type` or
/// `async` attributes are implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    inner_html: String,
}

impl ScriptElement {
    pub(crate) fn new(inner_html: String) -> Self {
        Self { inner_html }
    }

    pub fn tag(&self) -> &'static str {
        "script"
    }

    /// The raw, escaped script source.
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Render the element as it appears in the HTML stream.
    pub fn to_html(&self) -> String {
        format!("<script>{}</script>", self.inner_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_shape() {
        let el = ScriptElement::new("(() => {})()".to_string());
        assert_eq!(el.tag(), "script");
        assert_eq!(el.inner_html(), "(() => {})()");
        assert_eq!(el.to_html(), "<script>(() => {})()</script>");
    }
}
