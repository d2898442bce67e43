//! Settings-page integration tests.

use chrono::{Duration, TimeZone, Utc};
use mailproof::admin::{preview_cell, render_settings_page, NO_ORDERS_MESSAGE};
use mailproof::{
    MemoryOrderStore, Order, OrderEmail, PreviewHandler, PreviewRequest, Principal, RequestUrl,
};

fn admin_url() -> RequestUrl {
    RequestUrl::new(
        true,
        "shop.example",
        "/wp-admin/admin.php?page=wc-settings&tab=email",
    )
}

fn query_of(url: &str) -> &str {
    url.split_once('?').map(|(_, q)| q).unwrap_or("")
}

#[test]
fn test_preview_url_round_trips_through_the_handler() {
    let orders = MemoryOrderStore::shared();
    orders.insert(Order::new(42, Utc::now()));
    let handler = PreviewHandler::builder("secret", orders).build();

    let url = handler.preview_url("new_order", 42, Some("nl"), &admin_url());
    assert!(url.starts_with("https://shop.example/wp-admin/admin.php?page=wc-settings&tab=email&"));
    assert!(url.contains("action=preview_email"));
    assert!(url.contains("type=new_order"));
    assert!(url.contains("order=42"));
    assert!(url.contains("lang=nl"));

    let request = PreviewRequest::from_query(query_of(&url)).unwrap();
    let response = handler
        .handle(&Principal::store_manager("1"), &request)
        .unwrap();
    assert_eq!(response.status, 200);
}

#[test]
fn test_preview_cell_uses_latest_order() {
    let orders = MemoryOrderStore::shared();
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    orders.insert(Order::new(100, base + Duration::days(2)));
    orders.insert(Order::new(7, base));
    let handler = PreviewHandler::builder("secret", orders).build();

    let template = OrderEmail::new("WC_Email_Customer_Invoice", "customer_invoice", "Invoice");
    let cell = preview_cell(&handler, &template, &admin_url(), None);

    assert!(cell.starts_with("<td><a class=\"button button-secondary\" href=\""));
    assert!(cell.ends_with("\" target=\"_blank\">Preview</a></td>"));
    assert!(cell.contains("order=100"));
    assert!(cell.contains("type=customer_invoice"));
    assert!(!cell.contains("lang="));
}

#[test]
fn test_preview_cell_without_orders() {
    let handler = PreviewHandler::builder("secret", MemoryOrderStore::shared()).build();
    let template = OrderEmail::new("WC_Email_New_Order", "new_order", "New order");

    let cell = preview_cell(&handler, &template, &admin_url(), None);
    assert_eq!(cell, format!("<td>{}</td>", NO_ORDERS_MESSAGE));
}

#[test]
fn test_settings_page_has_one_row_per_template() {
    let orders = MemoryOrderStore::shared();
    orders.insert(Order::new(1, Utc::now()));
    let handler = PreviewHandler::builder("secret", orders)
        .site_title("Tea & Co")
        .build();

    let page = render_settings_page(&handler, &admin_url(), None);
    let templates = handler.renderer().templates().len();

    assert_eq!(page.matches("<tr>").count(), templates + 1);
    assert_eq!(page.matches(">Preview</a>").count(), templates);
    assert!(page.contains("Tea &amp; Co"));
    assert!(page.contains(&format!("{} emails", templates)));

    // Preview sits between recipient and actions
    let recipient = page.find("wc-email-settings-table-recipient").unwrap();
    let preview = page.find("wc-email-settings-table-preview").unwrap();
    let actions = page.find("wc-email-settings-table-actions").unwrap();
    assert!(recipient < preview && preview < actions);
}
