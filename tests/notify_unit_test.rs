//! Unit tests for notification messages.
//!
//! Run with: cargo test --test notify_unit_test

use datalab_db::notify::{
    LogNotifier, Notifier, Recipient, delivery_url, model_ready_message, model_shared_message,
    usage_url,
};
use datalab_db::repository::Contact;

const BASE: &str = "https://app.example.org/build";

#[test]
fn links_carry_model_and_sensor_types() {
    assert_eq!(
        delivery_url(BASE, 17),
        "https://app.example.org/build?deliverModel=true&modelID=17"
    );
    assert_eq!(
        usage_url(BASE, 17, &[1, 2, 5]),
        "https://app.example.org/build?useModel=true&modelID=17&sensorTypes=1,2,5"
    );
    assert_eq!(
        usage_url(BASE, 3, &[]),
        "https://app.example.org/build?useModel=true&modelID=3&sensorTypes="
    );
}

#[test]
fn messages_embed_their_links() {
    let ready = model_ready_message(BASE, 17);
    assert!(ready.html_body.contains(&delivery_url(BASE, 17)));
    assert!(!ready.subject.is_empty());

    let shared = model_shared_message(BASE, 4, &[2]);
    assert!(shared.html_body.contains(&usage_url(BASE, 4, &[2])));
    assert_ne!(ready.subject, shared.subject);
}

#[test]
fn recipient_name_falls_back_to_address() {
    let parsed: Vec<Recipient> = serde_json::from_value(serde_json::json!([
        { "email": "bob@example.org", "name": "Bob" },
        { "email": "eve@example.org" }
    ]))
    .unwrap();
    assert_eq!(parsed[0].display_name(), "Bob");
    assert_eq!(parsed[1].display_name(), "eve@example.org");

    let from_contact = Recipient::from(Contact {
        name: "Ada".to_string(),
        email: "ada@example.org".to_string(),
    });
    assert_eq!(from_contact.display_name(), "Ada");
}

#[tokio::test]
async fn log_notifier_accepts_everything() {
    let recipients = [Recipient {
        email: "bob@example.org".to_string(),
        name: None,
    }];
    LogNotifier
        .notify(&recipients, &model_ready_message(BASE, 1))
        .await
        .unwrap();
}
