//! Action lookup and dispatch.
//!
//! Run with: cargo test --test dispatch_test

mod common;

use serde_json::{Value, json};

use datalab_db::dispatch::{Action, Output, dispatch};
use datalab_db::error::AppError;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, device_payload, insert_language, test_repo};

#[test]
fn every_action_name_resolves() {
    for action in Action::ALL {
        assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
    }
    assert_eq!(
        "send_data_points_again".parse::<Action>().unwrap(),
        Action::SendDataPointsAgain
    );
}

#[test]
fn internal_and_unknown_names_are_rejected() {
    for name in ["get_email", "get_sensor_types", "drop_tables", "", "Create_Project"] {
        match name.parse::<Action>() {
            Err(AppError::UnknownAction(rejected)) => assert_eq!(rejected, name),
            other => panic!("{name} resolved to {other:?}"),
        }
    }
}

#[test]
fn only_language_metas_ignores_the_body() {
    let without_body: Vec<_> = Action::ALL
        .into_iter()
        .filter(|a| !a.takes_params())
        .collect();
    assert_eq!(without_body, vec![Action::GetLanguageMetas]);
}

#[tokio::test]
async fn language_text_is_passed_through_raw() {
    let repo = test_repo().await;
    insert_language(repo.db(), "en", "English", r#"{ "hello": "Hello" }"#).await;

    let dispatched = dispatch(&repo, Action::LoadLanguage, &json!({ "languageCode": "en" }))
        .await
        .unwrap();
    assert_eq!(
        dispatched.output,
        Output::Raw(r#"{ "hello": "Hello" }"#.to_string())
    );

    let rejected = dispatch(&repo, Action::LoadLanguage, &json!({}))
        .await
        .unwrap();
    assert_eq!(
        rejected.output,
        Output::Json(json!({ "error": ["Param languageCode not set"] }))
    );
}

#[tokio::test]
async fn language_metas_need_no_params() {
    let repo = test_repo().await;
    insert_language(repo.db(), "en", "English", "{}").await;

    let dispatched = dispatch(&repo, Action::GetLanguageMetas, &Value::Null)
        .await
        .unwrap();
    assert_eq!(
        dispatched.output,
        Output::Json(json!([{ "languageCode": "en", "languageName": "English" }]))
    );
}

#[tokio::test]
async fn registration_and_login_report_the_user_to_bind() {
    let repo = test_repo().await;
    let registration = json!({
        "adminEmail": ADMIN_EMAIL,
        "adminName": "Ada",
        "password": ADMIN_PASSWORD,
        "device": device_payload(),
    });

    let registered = dispatch(&repo, Action::RegisterAdmin, &registration)
        .await
        .unwrap();
    let Output::Json(body) = &registered.output else {
        panic!("expected JSON output");
    };
    let admin_id = i32::try_from(body["adminID"].as_i64().unwrap()).unwrap();
    assert_eq!(registered.authenticated, Some(admin_id));

    let duplicate = dispatch(&repo, Action::RegisterAdmin, &registration)
        .await
        .unwrap();
    assert_eq!(duplicate.authenticated, None);

    let login = dispatch(
        &repo,
        Action::LoginAdmin,
        &json!({ "adminEmail": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await
    .unwrap();
    assert_eq!(login.authenticated, Some(admin_id));

    let failed = dispatch(
        &repo,
        Action::LoginAdmin,
        &json!({ "adminEmail": ADMIN_EMAIL, "password": "wrong" }),
    )
    .await
    .unwrap();
    assert_eq!(failed.authenticated, None);
    assert_eq!(failed.output, Output::Json(json!({})));
}

#[tokio::test]
async fn other_actions_never_authenticate() {
    let repo = test_repo().await;

    let dispatched = dispatch(&repo, Action::CreateProject, &json!({}))
        .await
        .unwrap();
    assert_eq!(dispatched.authenticated, None);
    assert_eq!(
        dispatched.output,
        Output::Json(json!({ "error": ["Param userID not set", "Param projectName not set"] }))
    );
}
