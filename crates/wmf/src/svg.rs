//! SVG XML text emission: header/footer, namespace-prefixed tags, and text escaping.

/// Accumulates SVG output into an owned string buffer.
#[derive(Debug, Default)]
pub struct SvgWriter {
    buffer: String,
    /// Empty, or the namespace prefix with a trailing `:` already appended.
    namespace: String,
}

impl SvgWriter {
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        let namespace = if namespace.is_empty() { String::new() } else { format!("{namespace}:") };
        Self { buffer: String::new(), namespace }
    }

    /// Writes the XML prolog (if `delimiter` is set) and the opening `<svg>` element sized to
    /// `width`x`height`.
    pub fn header(&mut self, width: f64, height: f64, delimiter: bool) {
        if delimiter {
            self.buffer.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        }

        if self.namespace.is_empty() {
            self.buffer.push_str(&format!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
            ));
        } else {
            let prefix = self.namespace.trim_end_matches(':');
            self.buffer.push_str(&format!(
                "<{ns}svg xmlns:{prefix}=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n",
                ns = self.namespace,
            ));
        }
    }

    pub fn footer(&mut self) {
        self.buffer.push_str(&format!("</{}svg>\n", self.namespace));
    }

    /// Appends an already-formatted element, followed by a newline.
    pub fn push_element(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        self.buffer.push('\n');
    }

    /// Returns the tag name for `name`, decorated with the namespace prefix if one is set.
    #[must_use]
    pub fn tag(&self, name: &str) -> String {
        format!("{}{name}", self.namespace)
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Escapes `<`, `>`, `&`, and `"` for safe inclusion in SVG text content or attribute values.
/// Bytes outside this set are passed through unescaped; WMF text is not guaranteed to be valid
/// UTF-8, so this operates byte-wise rather than decoding the input as a string.
#[must_use]
pub fn escape_text(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input {
        match byte {
            b'<' => out.push_str("&lt;"),
            b'>' => out.push_str("&gt;"),
            b'&' => out.push_str("&amp;"),
            b'"' => out.push_str("&quot;"),
            _ => out.push(byte as char),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_xml_characters() {
        assert_eq!(escape_text(b"A&B <tag> \"quoted\""), "A&amp;B &lt;tag&gt; &quot;quoted&quot;");
    }

    #[test]
    fn namespaced_tag_decorates_every_element() {
        let writer = SvgWriter::new("wmf");
        assert_eq!(writer.tag("rect"), "wmf:rect");
    }

    #[test]
    fn bare_fragment_without_namespace() {
        let writer = SvgWriter::new("");
        assert_eq!(writer.tag("line"), "line");
    }

    #[test]
    fn header_without_delimiter_skips_xml_prolog() {
        let mut writer = SvgWriter::new("");
        writer.header(10.0, 20.0, false);
        let out = writer.finish();
        assert!(!out.contains("<?xml"));
        assert!(out.contains("viewBox=\"0 0 10 20\""));
    }
}
