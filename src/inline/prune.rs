//! Removal of hidden elements from inlined markup.
//!
//! After inlining, an element hidden by the stylesheet carries
//! `display: none` in its own `style` attribute. Such elements are dropped
//! with their whole subtree, as are `<script>` elements.

use super::markup::{self, Tag};

fn is_hidden(tag: &Tag<'_>) -> bool {
    if tag.name == "script" {
        return true;
    }
    let attrs = markup::attributes(tag.attrs);
    let Some(style) = markup::attribute(&attrs, "style") else {
        return false;
    };
    markup::declared(&markup::declarations(style), "display")
        .is_some_and(|display| display.eq_ignore_ascii_case("none"))
}

/// Drop every element whose inline style resolves to `display: none`.
pub(crate) fn remove_hidden(html: &str) -> String {
    let tags = markup::tags(html);
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut i = 0;

    while i < tags.len() {
        let tag = &tags[i];
        if !tag.is_start() || !is_hidden(tag) {
            i += 1;
            continue;
        }

        let last = if tag.is_standalone() {
            Some(i)
        } else {
            markup::matching_end(&tags, i)
        };

        match last {
            Some(j) => {
                out.push_str(&html[cursor..tag.start]);
                cursor = tags[j].end;
                i = j + 1;
            }
            None => {
                // Unclosed: drop the start tag only
                out.push_str(&html[cursor..tag.start]);
                cursor = tag.end;
                i += 1;
            }
        }
    }

    out.push_str(&html[cursor..]);
    out
}
