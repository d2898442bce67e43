//! Legacy visual attributes for inlined markup.
//!
//! Some email clients ignore parts of the `style` attribute but still honour
//! HTML presentation attributes. For a few well-supported properties the
//! matching attribute is added, unless the element already has one.

use super::markup::{self, Tag};

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

fn is_one_of(name: &str, names: &[&str]) -> bool {
    names.contains(&name)
}

/// `12px` → `12`, `100%` → `100%` (percentages only where allowed).
fn dimension(value: &str, allow_percent: bool) -> Option<String> {
    let value = value.trim();
    if let Some(px) = value.strip_suffix("px") {
        return px
            .trim()
            .parse::<f64>()
            .ok()
            .map(|n| format!("{}", n.round() as i64));
    }
    if allow_percent && value.ends_with('%') && value[..value.len() - 1].parse::<f64>().is_ok() {
        return Some(value.to_string());
    }
    None
}

fn visual_attributes(tag: &Tag<'_>) -> Vec<(&'static str, String)> {
    let attrs = markup::attributes(tag.attrs);
    let Some(style) = markup::attribute(&attrs, "style") else {
        return Vec::new();
    };
    let decls = markup::declarations(style);
    let name = tag.name.as_str();

    let mut added: Vec<(&'static str, String)> = Vec::new();
    let mut add = |attr: &'static str, value: String| {
        let present = markup::attribute(&attrs, attr).is_some()
            || added.iter().any(|(a, _)| *a == attr);
        if !present {
            added.push((attr, value));
        }
    };

    if is_one_of(name, &["table", "tr", "td", "th", "body"]) {
        if let Some(color) = markup::declared(&decls, "background-color") {
            add("bgcolor", color.to_string());
        }
    }

    if is_one_of(name, &["p", "div", "td", "th"]) || is_one_of(name, HEADINGS) {
        if let Some(align) = markup::declared(&decls, "text-align") {
            let align = align.to_ascii_lowercase();
            if matches!(align.as_str(), "left" | "right" | "center" | "justify") {
                add("align", align);
            }
        }
    }

    if is_one_of(name, &["td", "th", "tr"]) {
        if let Some(valign) = markup::declared(&decls, "vertical-align") {
            let valign = valign.to_ascii_lowercase();
            if matches!(valign.as_str(), "top" | "middle" | "bottom" | "baseline") {
                add("valign", valign);
            }
        }
    }

    if is_one_of(name, &["img", "table"]) {
        if let Some(float) = markup::declared(&decls, "float") {
            let float = float.to_ascii_lowercase();
            if matches!(float.as_str(), "left" | "right") {
                add("align", float);
            }
        }
    }

    if is_one_of(name, &["img", "table", "td"]) {
        let allow_percent = name != "img";
        if let Some(width) = markup::declared(&decls, "width").and_then(|w| dimension(w, allow_percent)) {
            add("width", width);
        }
        if let Some(height) = markup::declared(&decls, "height").and_then(|h| dimension(h, allow_percent)) {
            add("height", height);
        }
    }

    if name == "table" {
        if let Some(spacing) = markup::declared(&decls, "border-spacing") {
            if matches!(spacing.trim(), "0" | "0px") {
                add("cellspacing", "0".to_string());
            }
        }
    }

    added
}

/// Add presentation attributes derived from each element's inline style.
pub(crate) fn add_visual_attributes(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut cursor = 0;

    for tag in markup::tags(html).iter().filter(|t| t.is_start()) {
        let added = visual_attributes(tag);
        if added.is_empty() {
            continue;
        }

        let close = if tag.self_closing { 2 } else { 1 };
        let insert_at = tag.end - close;
        out.push_str(&html[cursor..insert_at]);
        for (name, value) in added {
            out.push_str(&format!(" {}=\"{}\"", name, markup::escape_attribute(&value)));
        }
        cursor = insert_at;
    }

    out.push_str(&html[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_attributes() {
        let html = r#"<table style="background-color: #fff; width: 600px; border-spacing: 0"><tr><td style="text-align: Center; vertical-align: top; width: 50%">x</td></tr></table>"#;
        let out = add_visual_attributes(html);
        assert!(out.contains(r##"bgcolor="#fff""##));
        assert!(out.contains(r#"width="600""#));
        assert!(out.contains(r#"cellspacing="0""#));
        assert!(out.contains(r#"align="center""#));
        assert!(out.contains(r#"valign="top""#));
        assert!(out.contains(r#"width="50%""#));
        assert!(out.ends_with(">x</td></tr></table>"));
    }

    #[test]
    fn test_existing_attributes_are_kept() {
        let html = r#"<td bgcolor="red" style="background-color: blue">x</td>"#;
        assert_eq!(add_visual_attributes(html), html);
    }

    #[test]
    fn test_self_closing_image() {
        let html = r#"<img src="logo.png" style="float: right; width: 120px; height: 40.4px"/>"#;
        assert_eq!(
            add_visual_attributes(html),
            r#"<img src="logo.png" style="float: right; width: 120px; height: 40.4px" align="right" width="120" height="40"/>"#
        );
    }

    #[test]
    fn test_ignores_unsupported_values() {
        let html = r#"<p style="text-align: start">x</p><img style="width: 50%">"#;
        assert_eq!(add_visual_attributes(html), html);
    }

    #[test]
    fn test_elements_without_style_untouched() {
        let html = "<div><p>plain</p></div>";
        assert_eq!(add_visual_attributes(html), html);
    }
}
