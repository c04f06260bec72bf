//! Navigable model of a fetched page.
//!
//! The raw fetch-and-parse primitive is an external concern; everything in
//! this crate consumes pages through [`Document`], a tolerant, block-local
//! view over the markup. Extraction is deliberately forgiving: tags are
//! matched case-insensitively, attribute order does not matter, and callers
//! re-scan inside a known block ([`Element::inner`]) instead of running
//! brittle whole-page expressions.

use std::collections::HashMap;

use regex::Regex;

/// A parsed page. Cheap to construct; queries scan on demand.
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
}

/// One matched element: its attributes and the markup between its tags.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    attrs: HashMap<String, String>,
    inner_html: String,
}

// Elements that never carry content between an opening and closing tag.
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

impl Document {
    pub fn parse(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// All elements with the given tag whose `class` attribute contains every
    /// whitespace-separated token of `class`. An empty `class` matches any
    /// element of that tag.
    pub fn find_all(&self, tag: &str, class: &str) -> Vec<Element> {
        let open_re = match open_tag_regex(tag) {
            Some(re) => re,
            None => return Vec::new(),
        };
        let wanted: Vec<&str> = class.split_whitespace().collect();

        let mut found = Vec::new();
        for caps in open_re.captures_iter(&self.html) {
            let whole = caps.get(0).expect("regex always has a full match");
            let attr_src = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let attrs = parse_attrs(attr_src);

            if !wanted.is_empty() {
                let classes = attrs.get("class").map(String::as_str).unwrap_or("");
                let have: Vec<&str> = classes.split_whitespace().collect();
                if !wanted.iter().all(|w| have.contains(w)) {
                    continue;
                }
            }

            let inner_html = if attr_src.trim_end().ends_with('/')
                || VOID_TAGS.contains(&tag.to_ascii_lowercase().as_str())
            {
                String::new()
            } else {
                inner_of(&self.html[whole.end()..], tag)
            };

            found.push(Element {
                tag: tag.to_ascii_lowercase(),
                attrs,
                inner_html,
            });
        }
        found
    }

    /// First match of [`find_all`](Self::find_all), if any.
    pub fn find(&self, tag: &str, class: &str) -> Option<Element> {
        self.find_all(tag, class).into_iter().next()
    }

    /// First element of `tag` carrying `attr="value"`, regardless of class.
    pub fn find_with_attr(&self, tag: &str, attr: &str, value: &str) -> Option<Element> {
        self.find_all(tag, "")
            .into_iter()
            .find(|el| el.attr(attr) == Some(value))
    }

    /// Visible text of every `tag`/`class` match, whitespace-normalized,
    /// empty strings dropped.
    pub fn texts(&self, tag: &str, class: &str) -> Vec<String> {
        self.find_all(tag, class)
            .into_iter()
            .map(|el| el.text())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Markup between this element's tags, verbatim.
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Re-scan inside this element. This is how nested structures (a blame
    /// hunk's line-number cells, a repo card's anchor) are read.
    pub fn inner(&self) -> Document {
        Document::parse(self.inner_html.clone())
    }

    /// Text content with tags stripped, entities decoded and whitespace
    /// collapsed.
    pub fn text(&self) -> String {
        let stripped = strip_tags_regex().replace_all(&self.inner_html, " ");
        let decoded = decode_entities(&stripped);
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn open_tag_regex(tag: &str) -> Option<Regex> {
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    // (?is): case-insensitive, and `.` spans attribute line breaks.
    Regex::new(&format!(r"(?is)<{}\b([^>]*)>", regex::escape(tag))).ok()
}

fn strip_tags_regex() -> Regex {
    Regex::new(r"(?s)<[^>]*>").expect("literal regex")
}

fn parse_attrs(src: &str) -> HashMap<String, String> {
    let re = Regex::new(r#"([a-zA-Z_][a-zA-Z0-9_:.-]*)\s*=\s*"([^"]*)""#).expect("literal regex");
    re.captures_iter(src)
        .map(|c| (c[1].to_ascii_lowercase(), decode_entities(&c[2])))
        .collect()
}

/// Markup from just after an opening `tag` up to its matching close,
/// tracking same-tag nesting. An unclosed tag yields the remainder of the
/// page, which downstream queries tolerate.
fn inner_of(rest: &str, tag: &str) -> String {
    let boundary =
        Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag))).expect("escaped tag");
    let mut depth = 1usize;
    for caps in boundary.captures_iter(rest) {
        let whole = caps.get(0).expect("full match");
        let closing = !caps[1].is_empty();
        let self_closing = whole.as_str().trim_end_matches('>').ends_with('/');
        if closing {
            depth -= 1;
            if depth == 0 {
                return rest[..whole.start()].to_string();
            }
        } else if !self_closing {
            depth += 1;
        }
    }
    rest.to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
