use std::sync::Arc;
use std::time::Duration;

use fastfill_core_types::{FieldMap, FieldType, FillRequest, FillResponse, ProfileRecord};
use form_filler::{dropdown, FillEngine, FillError, FormFiller};
use page_dom::{EventKind, MemoryPage, NodeId, Tone};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const PILGRIM_FORM: &str = r#"
    <form class="pilgrim-form">
      <input name="fname" maxlength="20">
      <input name="age" type="number">
      <input name="gender" formcontrolname="gender">
      <input name="photoIdType" formcontrolname="photoIdType">
      <input name="idProofNumber" maxlength="10">
      <button type="submit">Continue</button>
    </form>"#;

fn john_doe() -> FieldMap {
    FieldMap::default()
        .with(FieldType::FullName, "John Doe")
        .with(FieldType::Age, "30")
        .with(FieldType::Gender, "Male")
        .with(FieldType::IdType, "Aadhaar Card")
        .with(FieldType::IdNumber, "123456789012")
}

fn single(data: FieldMap) -> FillRequest {
    FillRequest::Single {
        profile: ProfileRecord::new("p1", "John", data),
    }
}

fn input(page: &MemoryPage, name: &str) -> NodeId {
    page.find(&format!("input[name=\"{name}\"]")).unwrap()
}

fn first_event(page: &MemoryPage, node: NodeId) -> usize {
    page.events().iter().position(|(target, _)| *target == node).unwrap()
}

#[tokio::test(start_paused = true)]
async fn five_field_profile_populates_every_input() {
    let page = Arc::new(MemoryPage::from_html(PILGRIM_FORM));
    let gender = input(&page, "gender");
    let id_type = input(&page, "photoIdType");
    let id_number = input(&page, "idProofNumber");
    page.bind_overlay(gender, Duration::from_millis(250), ["Male", "Female", "Transgender"]);
    page.bind_overlay(id_type, Duration::from_millis(100), ["Aadhaar Card", "PAN Card"]);

    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine.fill(single(john_doe())).await;
    assert_eq!(outcome.response(), FillResponse::filled(5));

    let notice = page.notification().unwrap();
    assert!(notice.message.starts_with("✓ Filled 5 fields in"));
    assert_eq!(notice.tone, Tone::Success);

    assert_eq!(page.value_of(input(&page, "fname")), "John Doe");
    assert_eq!(page.value_of(input(&page, "age")), "30");
    assert_eq!(page.value_of(id_number), "123456789012");
    assert_eq!(page.attribute_of(id_number, "maxlength"), None);
    assert!(first_event(&page, id_type) < first_event(&page, id_number));

    let report = outcome.session.join().await;
    assert_eq!(report.failed, 0);
    assert_eq!(report.cancelled, 0);
    assert_eq!(page.value_of(gender), "Male");
    assert_eq!(page.value_of(id_type), "Aadhaar Card");
    assert!(!page.overlay_open());
    assert!(page.notification().is_none());
}

#[tokio::test(start_paused = true)]
async fn submit_buttons_are_never_written() {
    let page = Arc::new(MemoryPage::from_html(
        r#"<input type="submit" name="fullNameSubmit" value="Go">
           <input name="passengerName">"#,
    ));
    let engine = FillEngine::builder(page.clone()).build();
    let data = FieldMap::default().with(FieldType::FullName, "Asha");
    let outcome = engine.fill(single(data)).await;
    assert_eq!(outcome.response(), FillResponse::filled(1));

    let submit = page.find("input[type=\"submit\"]").unwrap();
    assert_eq!(page.value_of(submit), "Go");
    assert!(page.events_for(submit).is_empty());
    assert_eq!(page.value_of(input(&page, "passengerName")), "Asha");
}

#[tokio::test(start_paused = true)]
async fn native_select_takes_case_insensitive_match() {
    let page = Arc::new(MemoryPage::from_html(
        r#"<select name="gender">
             <option value="">Select</option>
             <option>Male</option><option>Female</option><option>Transgender</option>
           </select>"#,
    ));
    let engine = FillEngine::builder(page.clone()).build();
    let data = FieldMap::default().with(FieldType::Gender, "male");
    let outcome = engine.fill(single(data)).await;
    assert_eq!(outcome.response(), FillResponse::filled(1));
    let select = page.find("select").unwrap();
    assert_eq!(page.value_of(select), "Male");

    // Native selects never schedule an overlay follow-up.
    let report = outcome.session.join().await;
    assert_eq!(report.completed, 1);
}

#[tokio::test(start_paused = true)]
async fn refilling_an_unchanged_page_is_idempotent() {
    let page = Arc::new(MemoryPage::from_html(
        r#"<input name="email"><input name="city"><select name="state">
             <option>Karnataka</option><option>Andhra Pradesh</option></select>
           <input name="fullName"><input name="age">"#,
    ));
    let data = FieldMap::default()
        .with(FieldType::Email, "asha@example.com")
        .with(FieldType::City, "Tirupati")
        .with(FieldType::State, "andhra")
        .with(FieldType::FullName, "Asha Rao")
        .with(FieldType::Age, "34");
    let engine = FillEngine::builder(page.clone()).build();

    let snapshot = |page: &MemoryPage| -> Vec<String> {
        page.find_all("input, select")
            .into_iter()
            .map(|node| page.value_of(node))
            .collect()
    };

    let first = engine.fill(single(data.clone())).await;
    first.session.join().await;
    let after_first = snapshot(page.as_ref());

    let second = engine.fill(single(data)).await;
    second.session.join().await;
    assert_eq!(first.response(), second.response());
    assert_eq!(snapshot(page.as_ref()), after_first);
    assert_eq!(
        after_first,
        vec!["asha@example.com", "Tirupati", "Andhra Pradesh", "Asha Rao", "34"]
    );
}

#[tokio::test(start_paused = true)]
async fn dropdown_without_options_fails_and_selects_nothing() {
    let page = MemoryPage::from_html(r#"<input name="photoIdType">"#);
    let trigger = page.find("input").unwrap();
    let offsets = [300, 600, 1000].map(Duration::from_millis);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let err = dropdown::resolve(&page, trigger, "Aadhaar Card", offsets, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, FillError::DropdownExhausted { attempts: 3 });
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
    assert_eq!(page.value_of(trigger), "");

    let body = page.find("body").unwrap();
    assert_eq!(page.events_for(body), vec![EventKind::Click]);
}

#[tokio::test(start_paused = true)]
async fn unmatched_id_type_falls_back_to_input_scan() {
    let page = Arc::new(MemoryPage::from_html(
        r#"<input name="photoId" id="Type"><input name="aadhaarNumber">"#,
    ));
    let trigger = page.find("input[name=\"photoId\"]").unwrap();
    page.bind_overlay(trigger, Duration::from_millis(100), ["Aadhaar Card", "Passport"]);

    let data = FieldMap::default()
        .with(FieldType::IdType, "Aadhaar Card")
        .with(FieldType::IdNumber, "123456789012");
    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine.fill(single(data)).await;
    assert_eq!(outcome.response(), FillResponse::filled(0));

    let number = input(&page, "aadhaarNumber");
    assert_eq!(page.value_of(number), "");

    let report = outcome.session.join().await;
    assert_eq!(page.value_of(trigger), "Aadhaar Card");
    assert_eq!(page.value_of(number), "123456789012");
    assert_eq!(report.confirmed, 2);
}

#[tokio::test(start_paused = true)]
async fn empty_page_fills_nothing() {
    let page = Arc::new(MemoryPage::default());
    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine.fill(single(john_doe())).await;
    assert_eq!(outcome.response(), FillResponse::filled(0));
    assert!(outcome.result.is_ok());
}
