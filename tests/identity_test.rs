//! Registration and login.
//!
//! Run with: cargo test --test identity_test

mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use datalab_db::entity::{admins, devices, sensors, users};
use datalab_db::identity::{hash_password, verify_password};

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, create_project, device_payload, register_admin, test_repo};

#[test]
fn password_hashes_verify_and_are_salted() {
    let first = hash_password("secret").unwrap();
    let second = hash_password("secret").unwrap();

    assert!(first.starts_with("$argon2id$"));
    assert_ne!(first, second);
    assert!(verify_password("secret", &first));
    assert!(!verify_password("Secret", &first));
    assert!(!verify_password("secret", "plaintext"));
}

#[tokio::test]
async fn register_admin_creates_account_device_and_sensors() {
    let repo = test_repo().await;
    let admin = register_admin(&repo).await;

    let stored = admins::Entity::find_by_id(admin.id)
        .one(repo.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, ADMIN_EMAIL);
    assert_ne!(stored.password_hash, ADMIN_PASSWORD);

    let device = devices::Entity::find_by_id(admin.device_id)
        .one(repo.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(device.user_id, admin.id);
    assert_eq!(device.mac_address, "aa:bb:cc:dd:ee:ff");

    let device_sensors = sensors::Entity::find()
        .filter(sensors::Column::DeviceId.eq(admin.device_id))
        .all(repo.db())
        .await
        .unwrap();
    assert_eq!(device_sensors.len(), 2);
    assert_eq!(admin.sensor_ids.len(), 2);
}

#[tokio::test]
async fn duplicate_email_is_refused_without_writes() {
    let repo = test_repo().await;
    register_admin(&repo).await;

    let second = repo
        .register_admin(&json!({
            "adminEmail": ADMIN_EMAIL,
            "adminName": "Impostor",
            "password": "other",
            "device": {},
        }))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&second).unwrap(),
        json!({ "adminID": -1, "device": null })
    );
    assert!(second.done().unwrap().authenticated().is_none());
    assert_eq!(admins::Entity::find().count(repo.db()).await.unwrap(), 1);
    assert_eq!(users::Entity::find().count(repo.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_registrations_keep_one_admin_per_email() {
    let repo = test_repo().await;
    let params = json!({
        "adminEmail": ADMIN_EMAIL,
        "adminName": "Ada",
        "password": ADMIN_PASSWORD,
        "device": device_payload(),
    });

    let (first, second) = tokio::join!(repo.register_admin(&params), repo.register_admin(&params));
    let mut ids = vec![
        first.unwrap().done().unwrap().admin_id,
        second.unwrap().done().unwrap().admin_id,
    ];
    ids.sort_unstable();

    assert_eq!(ids[0], -1);
    assert!(ids[1] > 0);
    assert_eq!(admins::Entity::find().count(repo.db()).await.unwrap(), 1);
    assert_eq!(users::Entity::find().count(repo.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn register_admin_validates_device() {
    let repo = test_repo().await;

    let reply = repo
        .register_admin(&json!({
            "adminEmail": "x@example.org",
            "adminName": "X",
            "password": "pw",
            "device": { "sensorInformation": [{ "sensorTypeID": 1, "sensorName": "acc" }, "gyro"] },
        }))
        .await
        .unwrap();

    assert_eq!(
        reply.errors(),
        [
            "Param deviceUniqueSensorID not set",
            "Param sensorInformation.1 has not type object, but type string"
        ]
    );
    assert_eq!(users::Entity::find().count(repo.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn device_fields_default_to_empty() {
    let repo = test_repo().await;

    let registered = repo
        .register_admin(&json!({
            "adminEmail": "bare@example.org",
            "adminName": "Bare",
            "password": "pw",
            "device": {},
        }))
        .await
        .unwrap()
        .done()
        .unwrap();

    let device = registered.device.unwrap();
    assert!(device.sensor_ids.is_empty());
    let stored = devices::Entity::find_by_id(device.device_id)
        .one(repo.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "");
    assert_eq!(stored.mac_address, "");
}

#[tokio::test]
async fn login_with_correct_and_wrong_password() {
    let repo = test_repo().await;
    let admin = register_admin(&repo).await;

    let ok = repo
        .login_admin(&json!({ "adminEmail": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&ok).unwrap(),
        json!({
            "admin": {
                "adminID": admin.id,
                "email": ADMIN_EMAIL,
                "adminName": "Ada",
                "deviceID": admin.device_id,
            }
        })
    );

    let wrong = repo
        .login_admin(&json!({ "adminEmail": ADMIN_EMAIL, "password": "nope" }))
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(&wrong).unwrap(), json!({}));

    let unknown = repo
        .login_admin(&json!({ "adminEmail": "ghost@example.org", "password": ADMIN_PASSWORD }))
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(&unknown).unwrap(), json!({}));
}

#[tokio::test]
async fn dataminer_joins_project_by_session() {
    let repo = test_repo().await;
    let admin = register_admin(&repo).await;
    let (session_id, project_id) = create_project(&repo, admin.id, "gait").await;

    let registered = repo
        .register_dataminer(&json!({
            "dataminerName": "Bob",
            "sessionID": session_id,
            "device": device_payload(),
        }))
        .await
        .unwrap()
        .done()
        .unwrap();

    assert_ne!(registered.dataminer_id, admin.id);
    assert_eq!(registered.project.project_id, project_id);
    assert_eq!(registered.project.project_name, "gait");
    assert_eq!(registered.project.session_id, session_id);
    assert_eq!(registered.device.sensor_ids.len(), 2);

    // Dataminers are users, not admins
    assert_eq!(admins::Entity::find().count(repo.db()).await.unwrap(), 1);
    assert_eq!(users::Entity::find().count(repo.db()).await.unwrap(), 2);
}

#[tokio::test]
async fn dataminer_with_unknown_session_writes_nothing() {
    let repo = test_repo().await;

    let reply = repo
        .register_dataminer(&json!({
            "dataminerName": "Bob",
            "sessionID": 42,
            "device": device_payload(),
        }))
        .await
        .unwrap();

    assert!(reply.is_rejected());
    assert_eq!(users::Entity::find().count(repo.db()).await.unwrap(), 0);
    assert_eq!(devices::Entity::find().count(repo.db()).await.unwrap(), 0);
}
