use std::time::Duration;

use page_dom::{EventKind, MemoryPage, Notification, PageDom, Scope, Selector, Tone};

fn options_selector() -> Selector {
    Selector::parse("mat-option, [role=\"option\"]").unwrap()
}

#[tokio::test(start_paused = true)]
async fn overlay_renders_after_delay_and_selection_writes_trigger() {
    let page = MemoryPage::from_html(r#"<form><input name="gender" formcontrolname="gender"></form>"#);
    let trigger = page.find("input").unwrap();
    page.bind_overlay(trigger, Duration::from_millis(250), ["Male", "Female"]);

    page.click(trigger).await.unwrap();
    let early = page
        .query_all(Scope::Document, &options_selector())
        .await
        .unwrap();
    assert!(early.is_empty());
    assert!(page.overlay_open());

    tokio::time::advance(Duration::from_millis(250)).await;
    let rendered = page
        .query_all(Scope::Document, &options_selector())
        .await
        .unwrap();
    assert_eq!(rendered.len(), 2);
    assert_eq!(page.text_content(rendered[1]).await.unwrap(), "Female");

    page.click(rendered[1]).await.unwrap();
    assert_eq!(page.value_of(trigger), "Female");
    assert!(!page.overlay_open());
    assert!(page.value(rendered[0]).await.unwrap_err().is_stale());
}

#[tokio::test(start_paused = true)]
async fn body_click_closes_overlay_without_selection() {
    let page = MemoryPage::from_html(r#"<input name="photoIdType">"#);
    let trigger = page.find("input").unwrap();
    page.bind_overlay(trigger, Duration::from_millis(100), ["Aadhaar Card"]);

    page.click(trigger).await.unwrap();
    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(page.overlay_open());

    page.click_body().await.unwrap();
    assert!(!page.overlay_open());
    assert_eq!(page.value_of(trigger), "");
    let body = page.find("body").unwrap();
    assert_eq!(page.events_for(body), vec![EventKind::Click]);
}

#[tokio::test]
async fn events_are_recorded_in_dispatch_order() {
    let page = MemoryPage::from_html(r#"<input name="age" maxlength="2">"#);
    let input = page.find("input").unwrap();
    page.remove_attribute(input, "maxlength").await.unwrap();
    page.set_value(input, "30").await.unwrap();
    for kind in [EventKind::Input, EventKind::Change, EventKind::Blur] {
        page.dispatch_event(input, kind).await.unwrap();
    }
    assert_eq!(page.value_of(input), "30");
    assert_eq!(page.attribute_of(input, "maxlength"), None);
    assert_eq!(
        page.events_for(input),
        vec![EventKind::Input, EventKind::Change, EventKind::Blur]
    );
}

#[tokio::test]
async fn notification_replaces_previous_banner() {
    let page = MemoryPage::default();
    page.show_notification(&Notification::new("first", Tone::Info))
        .await
        .unwrap();
    page.show_notification(&Notification::new("Filled 5 fields in 12ms", Tone::Success))
        .await
        .unwrap();
    assert_eq!(
        page.notification().map(|n| n.message),
        Some("Filled 5 fields in 12ms".to_string())
    );
    page.dismiss_notification().await.unwrap();
    assert!(page.notification().is_none());
}

#[tokio::test]
async fn input_type_resolution() {
    let page = MemoryPage::from_html(
        r#"<input id="a"><input id="b" type="SUBMIT"><select id="c"></select><textarea id="d"></textarea>"#,
    );
    let kinds = [("#a", "text"), ("#b", "submit"), ("#c", "select-one"), ("#d", "textarea")];
    for (selector, expected) in kinds {
        let node = page.find(selector).unwrap();
        assert_eq!(page.input_type(node).await.unwrap(), expected, "{selector}");
    }
}
