use pulldown_cmark::{html, Parser};

/// Renders message Markdown (CommonMark: headings, emphasis, lists, links)
/// into the HTML stored next to it. Derived `message_html` fields must only
/// ever be produced by this function.
pub fn render(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, Parser::new(source));
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_renders() {
        assert_eq!(
            render("**Hello** class"),
            "<p><strong>Hello</strong> class</p>"
        );
    }

    #[test]
    fn headings_render() {
        assert_eq!(render("# Notice"), "<h1>Notice</h1>");
    }

    #[test]
    fn lists_render() {
        assert_eq!(
            render("- read chapter 4\n- solve exercises"),
            "<ul>\n<li>read chapter 4</li>\n<li>solve exercises</li>\n</ul>"
        );
    }

    #[test]
    fn links_render() {
        assert_eq!(
            render("[syllabus](https://example.com/syllabus)"),
            "<p><a href=\"https://example.com/syllabus\">syllabus</a></p>"
        );
    }

    #[test]
    fn plain_text_is_wrapped_in_a_paragraph() {
        assert_eq!(render("hello"), "<p>hello</p>");
    }
}
