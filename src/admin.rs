//! Settings-page glue: the "Preview" column in the email settings table.

use crate::handler::{PreviewHandler, PREVIEW_ACTION};
use crate::template::EmailTemplate;

/// Key of the injected column.
pub const PREVIEW_COLUMN: &str = "preview";

/// Columns come before the preview column.
const PREVIEW_COLUMN_POSITION: usize = 4;

/// Shown instead of a link while the store has no orders.
pub const NO_ORDERS_MESSAGE: &str = "Preview will be available once an order has been placed.";

/// A settings table column: key and label.
pub type Column = (String, String);

/// The email settings table's own columns.
pub fn default_columns() -> Vec<Column> {
    [
        ("status", ""),
        ("name", "Email"),
        ("email_type", "Content type"),
        ("recipient", "Recipient(s)"),
        ("actions", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Insert the preview column after the 4th column (or at the end).
pub fn insert_preview_column(mut columns: Vec<Column>) -> Vec<Column> {
    let at = PREVIEW_COLUMN_POSITION.min(columns.len());
    columns.insert(at, (PREVIEW_COLUMN.to_string(), "Preview".to_string()));
    columns
}

/// The URL of the admin page being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    pub https: bool,
    pub host: String,
    /// Path plus optional `?query`.
    pub path_and_query: String,
}

impl RequestUrl {
    pub fn new(https: bool, host: impl Into<String>, path_and_query: impl Into<String>) -> Self {
        Self {
            https,
            host: host.into(),
            path_and_query: path_and_query.into(),
        }
    }

    pub fn current_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        let path = if self.path_and_query.starts_with('/') {
            self.path_and_query.clone()
        } else {
            format!("/{}", self.path_and_query)
        };
        format!("{}://{}{}", scheme, self.host, path)
    }
}

/// Set query arguments on `url`, replacing existing ones with the same key.
pub fn add_query_args(url: &str, args: &[(&str, &str)]) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((b, f)) => (b, Some(f)),
        None => (url, None),
    };
    let (path, query) = base.split_once('?').unwrap_or((base, ""));

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let key = p.split_once('=').map_or(*p, |(k, _)| k);
            let key = urlencoding::decode(key).map(|k| k.into_owned()).unwrap_or_else(|_| key.to_string());
            !args.iter().any(|(k, _)| *k == key)
        })
        .map(str::to_string)
        .collect();

    for (key, value) in args {
        pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }

    let mut out = path.to_string();
    if !pairs.is_empty() {
        out.push('?');
        out.push_str(&pairs.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

impl PreviewHandler {
    /// Build a signed preview link for `email_type` and `order_id`.
    pub fn preview_url(
        &self,
        email_type: &str,
        order_id: u64,
        lang: Option<&str>,
        request: &RequestUrl,
    ) -> String {
        let nonce = self.issue_token(email_type);
        let order = order_id.to_string();

        let mut args = vec![
            ("action", PREVIEW_ACTION),
            ("type", email_type),
            ("order", order.as_str()),
            ("nonce", nonce.as_str()),
        ];
        if let Some(lang) = lang.filter(|l| !l.is_empty()) {
            args.push(("lang", lang));
        }

        add_query_args(&request.current_url(), &args)
    }
}

/// The preview cell for one template row.
///
/// Uses the most recently created order as preview data.
pub fn preview_cell(
    handler: &PreviewHandler,
    template: &dyn EmailTemplate,
    request: &RequestUrl,
    lang: Option<&str>,
) -> String {
    let Some(order) = handler.renderer().orders().latest() else {
        return format!("<td>{}</td>", NO_ORDERS_MESSAGE);
    };

    let url = handler.preview_url(template.key(), order.id, lang, request);
    format!(
        "<td><a class=\"button button-secondary\" href=\"{}\" target=\"_blank\">Preview</a></td>",
        html_escape(&url)
    )
}

/// Render the email settings page with the preview column.
pub fn render_settings_page(
    handler: &PreviewHandler,
    request: &RequestUrl,
    lang: Option<&str>,
) -> String {
    let columns = insert_preview_column(default_columns());
    let templates = handler.renderer().templates().all();

    let mut head = String::new();
    for (key, label) in &columns {
        head.push_str(&format!(
            "<th class=\"wc-email-settings-table-{}\">{}</th>",
            html_escape(key),
            html_escape(label)
        ));
    }

    let mut rows = String::new();
    for template in &templates {
        rows.push_str("<tr>");
        for (key, _) in &columns {
            let cell = match key.as_str() {
                PREVIEW_COLUMN => preview_cell(handler, template.as_ref(), request, lang),
                "status" => {
                    let known = handler.registry().contains(template.key());
                    format!(
                        "<td><span class=\"status-{}\"></span></td>",
                        if known { "enabled" } else { "manual" }
                    )
                }
                "name" => format!("<td>{}</td>", html_escape(template.title())),
                "email_type" => format!("<td>{}</td>", template.content_type()),
                "recipient" => format!("<td>{}</td>", html_escape(template.recipient())),
                _ => "<td></td>".to_string(),
            };
            rows.push_str(&cell);
        }
        rows.push_str("</tr>");
    }

    let count = templates.len();
    let plural = if count == 1 { "" } else { "s" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Email notifications - {site}</title>
</head>
<body>
    <h1>Email notifications</h1>
    <p class="email-count">{count} email{plural}</p>
    <table class="wc_emails widefat">
        <thead><tr>{head}</tr></thead>
        <tbody>{rows}</tbody>
    </table>
</body>
</html>"#,
        site = html_escape(handler.renderer().site_title()),
        count = count,
        plural = plural,
        head = head,
        rows = rows,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_column_after_fourth() {
        let columns = insert_preview_column(default_columns());
        let keys: Vec<_> = columns.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["status", "name", "email_type", "recipient", "preview", "actions"]
        );
    }

    #[test]
    fn test_preview_column_appended_to_short_tables() {
        let columns = insert_preview_column(vec![("name".into(), "Email".into())]);
        assert_eq!(columns.last().unwrap().0, "preview");
        assert_eq!(insert_preview_column(Vec::new()).len(), 1);
    }

    #[test]
    fn test_current_url() {
        let url = RequestUrl::new(true, "shop.example", "/wp-admin/admin.php?page=wc-settings&tab=email");
        assert_eq!(
            url.current_url(),
            "https://shop.example/wp-admin/admin.php?page=wc-settings&tab=email"
        );
        assert_eq!(RequestUrl::new(false, "localhost:8080", "").current_url(), "http://localhost:8080/");
    }

    #[test]
    fn test_add_query_args_replaces_and_encodes() {
        let url = add_query_args(
            "http://h/admin.php?page=wc-settings&type=old#top",
            &[("type", "new order"), ("nonce", "1.a.b")],
        );
        assert_eq!(url, "http://h/admin.php?page=wc-settings&type=new%20order&nonce=1.a.b#top");
    }

    #[test]
    fn test_add_query_args_without_query() {
        assert_eq!(add_query_args("http://h/", &[("a", "1")]), "http://h/?a=1");
    }
}
