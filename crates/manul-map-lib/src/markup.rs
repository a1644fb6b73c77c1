//! Popup and label markup
//!
//! Popups are described with a tiny HTML subset (`<b>`, `<strong>`,
//! `<small>`, `<br>`) so the same content can be handed to an HTML surface
//! or parsed into styled fragments for a painter. Text taken from the data
//! files is always escaped when it is interpolated, otherwise a record named
//! `<b>Zoo` would change the formatting of its own popup.

/// Escape the five characters that are significant in HTML text and attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Markup string built from escaped text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn builder() -> MarkupBuilder {
        MarkupBuilder::default()
    }

    /// Wrap markup that was authored by hand (not built from data)
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into styled fragments
    pub fn fragments(&self) -> Vec<Fragment> {
        parse(&self.0)
    }

    /// The text a reader sees, with line breaks as `\n`
    pub fn plain_text(&self) -> String {
        self.fragments()
            .iter()
            .map(|f| match f {
                Fragment::Text { text, .. } => text.as_str(),
                Fragment::LineBreak => "\n",
            })
            .collect()
    }
}

impl std::fmt::Display for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder that escapes every piece of text it is given
#[derive(Debug, Default)]
pub struct MarkupBuilder {
    out: String,
}

impl MarkupBuilder {
    pub fn text(mut self, text: &str) -> Self {
        self.out.push_str(&escape_html(text));
        self
    }

    pub fn bold(mut self, text: &str) -> Self {
        self.out.push_str("<b>");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</b>");
        self
    }

    pub fn small(mut self, text: &str) -> Self {
        self.out.push_str("<small>");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</small>");
        self
    }

    /// `<small><b>label</b> text</small>`
    pub fn small_labelled(mut self, label: &str, text: &str) -> Self {
        self.out.push_str("<small><b>");
        self.out.push_str(&escape_html(label));
        self.out.push_str("</b> ");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</small>");
        self
    }

    pub fn line_break(mut self) -> Self {
        self.out.push_str("<br>");
        self
    }

    pub fn build(self) -> Markup {
        Markup(self.out)
    }
}

/// A styled run of text or a hard line break
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text { text: String, bold: bool, small: bool },
    LineBreak,
}

/// Parse the markup subset into fragments
///
/// Unknown tags are dropped while their text is kept, entities are decoded,
/// and whitespace runs collapse to one space the way a browser renders them.
pub fn parse(markup: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut bold = 0usize;
    let mut small = 0usize;
    let mut text = String::new();
    let mut rest = markup;

    let flush = |text: &mut String, fragments: &mut Vec<Fragment>, bold: usize, small: usize| {
        if text.is_empty() {
            return;
        }
        let run = std::mem::take(text);
        let (bold, small) = (bold > 0, small > 0);
        if let Some(Fragment::Text {
            text: prev,
            bold: b,
            small: s,
        }) = fragments.last_mut()
            && *b == bold
            && *s == small
        {
            prev.push_str(&run);
            return;
        }
        fragments.push(Fragment::Text {
            text: run,
            bold,
            small,
        });
    };

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => match rest.find('>') {
                Some(end) => {
                    let tag = rest[1..end].trim().trim_end_matches('/').trim();
                    let (closing, name) = match tag.strip_prefix('/') {
                        Some(name) => (true, name.trim()),
                        None => (false, tag.split_whitespace().next().unwrap_or("")),
                    };
                    let name = name.to_ascii_lowercase();
                    match (name.as_str(), closing) {
                        ("b" | "strong", false) => {
                            flush(&mut text, &mut fragments, bold, small);
                            bold += 1;
                        }
                        ("b" | "strong", true) => {
                            flush(&mut text, &mut fragments, bold, small);
                            bold = bold.saturating_sub(1);
                        }
                        ("small", false) => {
                            flush(&mut text, &mut fragments, bold, small);
                            small += 1;
                        }
                        ("small", true) => {
                            flush(&mut text, &mut fragments, bold, small);
                            small = small.saturating_sub(1);
                        }
                        ("br", _) => {
                            flush(&mut text, &mut fragments, bold, small);
                            fragments.push(Fragment::LineBreak);
                        }
                        _ => {}
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    push_collapsed(&mut text, '<');
                    rest = &rest[1..];
                }
            },
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                push_collapsed(&mut text, decoded);
                rest = &rest[consumed..];
            }
            c => {
                push_collapsed(&mut text, c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    flush(&mut text, &mut fragments, bold, small);

    trim_lines(fragments)
}

fn push_collapsed(text: &mut String, c: char) {
    if c.is_whitespace() {
        if !text.ends_with(' ') {
            text.push(' ');
        }
    } else {
        text.push(c);
    }
}

/// Decode the entity at the start of `input`, returning the character and
/// the number of bytes consumed. Unknown entities decode to a literal `&`.
fn decode_entity(input: &str) -> (char, usize) {
    const NAMED: [(&str, char); 6] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&nbsp;", '\u{a0}'),
    ];
    for (entity, c) in NAMED {
        if input.starts_with(entity) {
            return (c, entity.len());
        }
    }

    if let Some(body) = input.strip_prefix("&#")
        && let Some(end) = body.find(';')
    {
        let digits = &body[..end];
        let code = match digits.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => digits.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return (c, 2 + end + 1);
        }
    }

    ('&', 1)
}

/// Drop leading and trailing spaces around line breaks and at both ends
fn trim_lines(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let len = fragments.len();
    let mut out: Vec<Fragment> = Vec::with_capacity(len);
    for (i, fragment) in fragments.into_iter().enumerate() {
        match fragment {
            Fragment::Text {
                mut text,
                bold,
                small,
            } => {
                let at_line_start = matches!(out.last(), None | Some(Fragment::LineBreak));
                if at_line_start {
                    text = text.trim_start().to_string();
                }
                let at_line_end = i + 1 == len;
                if at_line_end {
                    text = text.trim_end().to_string();
                }
                if !text.is_empty() {
                    out.push(Fragment::Text { text, bold, small });
                }
            }
            Fragment::LineBreak => {
                if let Some(Fragment::Text { text, .. }) = out.last_mut() {
                    let trimmed = text.trim_end().len();
                    text.truncate(trimmed);
                }
                out.push(Fragment::LineBreak);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(t: &str, bold: bool, small: bool) -> Fragment {
        Fragment::Text {
            text: t.to_string(),
            bold,
            small,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("Московский зоопарк"), "Московский зоопарк");
    }

    #[test]
    fn test_parse_popup_layout() {
        let markup = Markup::builder()
            .bold("Новосибирский зоопарк")
            .line_break()
            .small("Россия, Новосибирская область")
            .line_break()
            .small_labelled("Тип:", "зоопарк")
            .build();

        assert_eq!(
            markup.fragments(),
            vec![
                text("Новосибирский зоопарк", true, false),
                Fragment::LineBreak,
                text("Россия, Новосибирская область", false, true),
                Fragment::LineBreak,
                text("Тип:", true, true),
                text(" зоопарк", false, true),
            ]
        );
    }

    #[test]
    fn test_escaped_data_cannot_inject_formatting() {
        let markup = Markup::builder().text("<b>Zoo</b> & <br>Park").build();
        assert_eq!(
            markup.fragments(),
            vec![text("<b>Zoo</b> & <br>Park", false, false)]
        );
    }

    #[test]
    fn test_unescaped_text_would_inject() {
        // The reason escaping matters: raw markup changes the structure.
        let raw = Markup::trusted("<b>Zoo</b><br>Park");
        assert_eq!(
            raw.fragments(),
            vec![text("Zoo", true, false), Fragment::LineBreak, text("Park", false, false)]
        );
    }

    #[test]
    fn test_parse_collapses_whitespace_and_drops_unknown_tags() {
        let fragments = parse("  <div class=\"x\">Hello\n     <em>world</em></div>  ");
        assert_eq!(fragments, vec![text("Hello world", false, false)]);
    }

    #[test]
    fn test_decode_numeric_and_unknown_entities() {
        assert_eq!(parse("&#039;&#x41;&bogus;"), vec![text("'A&bogus;", false, false)]);
    }

    #[test]
    fn test_plain_text() {
        let markup = Markup::builder().bold("A").line_break().small("B").build();
        assert_eq!(markup.plain_text(), "A\nB");
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        assert_eq!(parse("a < b"), vec![text("a < b", false, false)]);
    }
}
