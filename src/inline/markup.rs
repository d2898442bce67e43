//! Tag-level scanning of serialized HTML.
//!
//! The inlining engine serializes a parsed document, so its output has
//! explicit end tags for every non-void element. That is enough structure to
//! prune subtrees and rewrite start tags without building a second DOM.

use std::sync::OnceLock;

use regex::Regex;

static TAG: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

fn tag_regex() -> &'static Regex {
    TAG.get_or_init(|| {
        Regex::new(r#"^<(/?)([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
            .expect("tag pattern is valid")
    })
}

fn attribute_regex() -> &'static Regex {
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Start,
    End,
}

/// One start or end tag and its byte span.
#[derive(Debug, Clone)]
pub(crate) struct Tag<'a> {
    pub kind: TagKind,
    /// Lowercased element name.
    pub name: String,
    /// Raw attribute text between the name and the closing `>`.
    pub attrs: &'a str,
    pub self_closing: bool,
    pub start: usize,
    pub end: usize,
}

impl Tag<'_> {
    pub fn is_start(&self) -> bool {
        self.kind == TagKind::Start
    }

    /// Start tag that has no end tag.
    pub fn is_standalone(&self) -> bool {
        self.is_start() && (self.self_closing || is_void(&self.name))
    }
}

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Scan all tags, skipping comments and raw text content.
pub(crate) fn tags(html: &str) -> Vec<Tag<'_>> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        let rest = &html[start..];

        if rest.starts_with("<!--") {
            pos = match rest.find("-->") {
                Some(end) => start + end + 3,
                None => html.len(),
            };
            continue;
        }

        let Some(caps) = tag_regex().captures(rest) else {
            pos = start + 1;
            continue;
        };

        let whole = caps.get(0).map_or(1, |m| m.end());
        let kind = if caps[1].is_empty() {
            TagKind::Start
        } else {
            TagKind::End
        };
        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map_or("", |m| &rest[m.start()..m.end()]);
        let self_closing = !caps[4].is_empty();
        let end = start + whole;

        let raw_text = kind == TagKind::Start && !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
        let closing = format!("</{}", name);

        tags.push(Tag {
            kind,
            name,
            attrs,
            self_closing,
            start,
            end,
        });

        pos = if raw_text {
            match find_ignore_case(&html[end..], &closing) {
                Some(i) => end + i,
                None => html.len(),
            }
        } else {
            end
        };
    }

    tags
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Index of the end tag closing the start tag at `index`.
pub(crate) fn matching_end(tags: &[Tag<'_>], index: usize) -> Option<usize> {
    let name = &tags[index].name;
    let mut depth = 0usize;

    for (j, tag) in tags.iter().enumerate().skip(index + 1) {
        if &tag.name != name {
            continue;
        }
        match tag.kind {
            TagKind::Start if !tag.self_closing => depth += 1,
            TagKind::Start => {}
            TagKind::End if depth == 0 => return Some(j),
            TagKind::End => depth -= 1,
        }
    }

    None
}

/// Parse attribute text into lowercased names and unquoted values.
pub(crate) fn attributes(attrs: &str) -> Vec<(String, Option<String>)> {
    attribute_regex()
        .captures_iter(attrs)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            (name, value)
        })
        .collect()
}

/// Value of attribute `name`, if present.
pub(crate) fn attribute<'a>(attrs: &'a [(String, Option<String>)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_deref().unwrap_or(""))
}

/// Parse a `style` attribute into lowercased property names and values,
/// in declaration order. `!important` is stripped.
pub(crate) fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property, value.to_string()))
        })
        .collect()
}

/// Effective value of `property`: the last declaration wins.
pub(crate) fn declared<'a>(decls: &'a [(String, String)], property: &str) -> Option<&'a str> {
    decls
        .iter()
        .rev()
        .find(|(p, _)| p == property)
        .map(|(_, v)| v.as_str())
}

pub(crate) fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
