use std::sync::Arc;
use std::time::Duration;

use fastfill_core_types::{FieldMap, FieldType, FillRequest, FillResponse, GroupProfileRecord};
use form_filler::{FillEngine, FillPolicy, FormFiller};
use page_dom::MemoryPage;

fn member(name: &str, age: &str, gender: &str, id_type: &str, id_number: &str) -> FieldMap {
    FieldMap::default()
        .with(FieldType::FullName, name)
        .with(FieldType::Age, age)
        .with(FieldType::Gender, gender)
        .with(FieldType::IdType, id_type)
        .with(FieldType::IdNumber, id_number)
}

fn family() -> GroupProfileRecord {
    GroupProfileRecord::new(
        "m1",
        "Rao family",
        FieldMap::default()
            .with(FieldType::Email, "rao@example.com")
            .with(FieldType::City, "Tirupati"),
        vec![
            member("Asha Rao", "34", "Female", "Aadhaar Card", "111122223333"),
            member("Ravi Rao", "36", "Male", "PAN Card", "ABCDE1234F"),
        ],
    )
}

fn value(page: &MemoryPage, selector: &str) -> String {
    page.value_of(page.find(selector).unwrap())
}

const INDEXED_FORM: &str = r#"
    <input name="email">
    <div class="row">
      <input name="fname" id="0"><input name="age" id="0"><input name="gender" id="0">
      <input name="photoIdType" id="0"><input name="idProofNumber" id="0">
    </div>
    <div class="row">
      <input name="fname" id="1"><input name="age" id="1"><input name="gender" id="1">
      <input name="photoIdType" id="1"><input name="idProofNumber" id="1">
    </div>"#;

#[tokio::test(start_paused = true)]
async fn indexed_inputs_receive_their_own_member() {
    let page = Arc::new(MemoryPage::from_html(INDEXED_FORM));
    for index in 0..2 {
        let gender = page.find(&format!("input[name=\"gender\"][id=\"{index}\"]")).unwrap();
        let id_type = page
            .find(&format!("input[name=\"photoIdType\"][id=\"{index}\"]"))
            .unwrap();
        page.bind_overlay(gender, Duration::from_millis(100), ["Male", "Female"]);
        page.bind_overlay(id_type, Duration::from_millis(100), ["Aadhaar Card", "PAN Card"]);
    }

    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine
        .fill(FillRequest::Group {
            master_profile: family(),
        })
        .await;

    // One shared field plus the per-member estimate.
    assert_eq!(outcome.response(), FillResponse::filled(9));
    assert_eq!(
        page.notification().unwrap().message,
        "✓ Filling 2 pilgrims..."
    );
    assert_eq!(value(&page, "input[name=\"email\"]"), "rao@example.com");

    let report = outcome.session.join().await;
    assert_eq!(report.failed, 0);
    // Four writes and two dropdowns per member.
    assert_eq!(report.confirmed, 12);

    assert_eq!(value(&page, "input[name=\"fname\"][id=\"0\"]"), "Asha Rao");
    assert_eq!(value(&page, "input[name=\"fname\"][id=\"1\"]"), "Ravi Rao");
    assert_eq!(value(&page, "input[name=\"age\"][id=\"1\"]"), "36");
    assert_eq!(value(&page, "input[name=\"gender\"][id=\"0\"]"), "Female");
    assert_eq!(value(&page, "input[name=\"gender\"][id=\"1\"]"), "Male");
    assert_eq!(value(&page, "input[name=\"photoIdType\"][id=\"1\"]"), "PAN Card");
    assert_eq!(
        value(&page, "input[name=\"idProofNumber\"][id=\"0\"]"),
        "111122223333"
    );
    assert_eq!(
        value(&page, "input[name=\"idProofNumber\"][id=\"1\"]"),
        "ABCDE1234F"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_member_write_leaves_later_fields_alone() {
    let page = Arc::new(MemoryPage::from_html(INDEXED_FORM));
    for index in 0..2 {
        let gender = page.find(&format!("input[name=\"gender\"][id=\"{index}\"]")).unwrap();
        let id_type = page
            .find(&format!("input[name=\"photoIdType\"][id=\"{index}\"]"))
            .unwrap();
        page.bind_overlay(gender, Duration::from_millis(100), ["Male", "Female"]);
        page.bind_overlay(id_type, Duration::from_millis(100), ["Aadhaar Card", "PAN Card"]);
    }
    page.reject_writes(page.find("input[name=\"age\"][id=\"0\"]").unwrap());

    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine
        .fill(FillRequest::Group {
            master_profile: family(),
        })
        .await;
    let report = outcome.session.join().await;
    assert_eq!(report.failed, 0);
    assert_eq!(report.confirmed, 11);

    assert_eq!(value(&page, "input[name=\"age\"][id=\"0\"]"), "");
    assert_eq!(value(&page, "input[name=\"gender\"][id=\"0\"]"), "Female");
    assert_eq!(value(&page, "input[name=\"photoIdType\"][id=\"0\"]"), "Aadhaar Card");
    assert_eq!(
        value(&page, "input[name=\"idProofNumber\"][id=\"0\"]"),
        "111122223333"
    );
}

#[tokio::test(start_paused = true)]
async fn members_are_staggered() {
    let page = Arc::new(MemoryPage::from_html(INDEXED_FORM));
    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine
        .fill(FillRequest::Group {
            master_profile: family(),
        })
        .await;

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(value(&page, "input[name=\"fname\"][id=\"0\"]"), "Asha Rao");
    assert_eq!(value(&page, "input[name=\"fname\"][id=\"1\"]"), "");

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(value(&page, "input[name=\"fname\"][id=\"1\"]"), "Ravi Rao");
    outcome.session.join().await;
}

const SECTIONED_FORM: &str = r#"
    <div class="pilgrim-card">
      <input name="pilgrim_name"><input name="pilgrim_age">
      <input name="pilgrim_gender"><input name="id_type" formcontrolname="idType">
      <input name="id_number">
    </div>
    <div class="pilgrim-card">
      <input name="pilgrim_name"><input name="pilgrim_age">
      <input name="pilgrim_gender"><input name="id_type" formcontrolname="idType">
      <input name="id_number">
    </div>"#;

#[tokio::test(start_paused = true)]
async fn sections_scope_each_member() {
    let page = Arc::new(MemoryPage::from_html(SECTIONED_FORM));
    for trigger in page.find_all("input[name=\"pilgrim_gender\"]") {
        page.bind_overlay(trigger, Duration::from_millis(200), ["Male", "Female"]);
    }
    for trigger in page.find_all("input[name=\"id_type\"]") {
        page.bind_overlay(trigger, Duration::from_millis(200), ["Aadhaar Card", "PAN Card"]);
    }

    let group = family();
    let engine = FillEngine::builder(page.clone()).build();
    let outcome = engine
        .fill(FillRequest::Group {
            master_profile: group,
        })
        .await;
    // No shared field exists on this page.
    assert_eq!(outcome.response(), FillResponse::filled(8));

    let report = outcome.session.join().await;
    assert_eq!(report.failed, 0);
    assert_eq!(report.confirmed, 12);

    let cards = page.find_all("div.pilgrim-card");
    let expected = [
        ["Asha Rao", "34", "Female", "Aadhaar Card", "111122223333"],
        ["Ravi Rao", "36", "Male", "PAN Card", "ABCDE1234F"],
    ];
    let inputs = page.find_all("div.pilgrim-card input");
    assert_eq!(cards.len(), 2);
    for (index, values) in expected.iter().enumerate() {
        let written: Vec<String> = inputs[index * 5..index * 5 + 5]
            .iter()
            .map(|node| page.value_of(*node))
            .collect();
        assert_eq!(written, values.to_vec());
    }
}

#[tokio::test(start_paused = true)]
async fn stagger_follows_policy() {
    let page = Arc::new(MemoryPage::from_html(INDEXED_FORM));
    let mut policy = FillPolicy::default();
    policy.timings.member_stagger_ms = 500;
    policy.show_notifications = false;
    let engine = FillEngine::builder(page.clone()).with_policy(policy).build();
    let outcome = engine
        .fill(FillRequest::Group {
            master_profile: family(),
        })
        .await;
    assert!(page.notification().is_none());

    tokio::time::sleep(Duration::from_millis(510)).await;
    assert_eq!(value(&page, "input[name=\"fname\"][id=\"1\"]"), "Ravi Rao");
    outcome.session.join().await;
}
