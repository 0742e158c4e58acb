//! Account registration and admin login.
//!
//! Passwords are stored as argon2id PHC strings, salt embedded. Hashing and
//! verification run on the blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entity::{admins, devices, projects, users};
use crate::error::{AppError, AppResult};
use crate::repository::{DeviceInfo, DeviceRegistered, Repository, device_errors};
use crate::validate::{ParamType, Reply, checked, validate};

/// Id answered when an email address is already taken.
pub const DUPLICATE_ADMIN_ID: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminRegistered {
    #[serde(rename = "adminID")]
    pub admin_id: i32,
    pub device: Option<DeviceRegistered>,
}

impl AdminRegistered {
    /// User id to log in, if an account was created.
    #[must_use]
    pub fn authenticated(&self) -> Option<i32> {
        (self.admin_id != DUPLICATE_ADMIN_ID).then_some(self.admin_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DataminerRegistered {
    #[serde(rename = "dataminerID")]
    pub dataminer_id: i32,
    pub project: ProjectRef,
    pub device: DeviceRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectRef {
    #[serde(rename = "projectID")]
    pub project_id: i32,
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

/// `{"admin": {...}}` on success, `{}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoginResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminView {
    #[serde(rename = "adminID")]
    pub admin_id: i32,
    pub email: String,
    #[serde(rename = "adminName")]
    pub admin_name: String,
    #[serde(rename = "deviceID")]
    pub device_id: Option<i32>,
}

#[derive(Deserialize)]
struct RegisterAdmin {
    #[serde(rename = "adminEmail")]
    email: String,
    #[serde(rename = "adminName")]
    name: String,
    password: String,
    device: DeviceInfo,
}

#[derive(Deserialize)]
struct RegisterDataminer {
    #[serde(rename = "dataminerName")]
    name: String,
    #[serde(rename = "sessionID")]
    session_id: i32,
    device: DeviceInfo,
}

#[derive(Deserialize)]
struct Login {
    #[serde(rename = "adminEmail")]
    email: String,
    password: String,
}

/// Hash a password into a PHC string with a fresh salt.
///
/// # Errors
///
/// Returns `AppError::Internal` if argon2 rejects the input.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

async fn hash_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
}

async fn verify_blocking(password: String, stored: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))
}

impl Repository {
    /// Create an admin account with its recording device.
    ///
    /// An email address that is already registered yields `adminID = -1` and no
    /// writes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if an insert fails; nothing is kept then.
    pub async fn register_admin(&self, params: &Value) -> AppResult<Reply<AdminRegistered>> {
        let mut errors = validate(
            &[
                ("adminEmail", ParamType::String),
                ("adminName", ParamType::String),
                ("password", ParamType::String),
            ],
            params,
        );
        errors.extend(device_errors(params));
        let params: RegisterAdmin = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let taken = admins::Entity::find()
            .filter(admins::Column::Email.eq(params.email.as_str()))
            .one(self.db())
            .await?;
        if taken.is_some() {
            tracing::info!(email = %params.email, "Admin email already registered");
            return Ok(Reply::Done(AdminRegistered {
                admin_id: DUPLICATE_ADMIN_ID,
                device: None,
            }));
        }

        let password_hash = hash_blocking(params.password).await?;

        let txn = self.db().begin().await?;

        let user = users::ActiveModel {
            name: Set(params.name),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let admin = admins::ActiveModel {
            user_id: Set(user.id),
            email: Set(params.email.clone()),
            password_hash: Set(password_hash),
        }
        .insert(&txn)
        .await;
        // A concurrent registration took the address after the check above
        if let Err(err) = &admin
            && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        {
            tracing::info!(email = %params.email, "Admin email registered concurrently");
            return Ok(Reply::Done(AdminRegistered {
                admin_id: DUPLICATE_ADMIN_ID,
                device: None,
            }));
        }
        admin?;

        let device = Self::register_device(&txn, params.device, user.id).await?;

        txn.commit().await?;

        tracing::info!(admin_id = user.id, device_id = device.device_id, "Admin registered");

        Ok(Reply::Done(AdminRegistered {
            admin_id: user.id,
            device: Some(device),
        }))
    }

    /// Create a data collector for the project recording under `sessionID`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if an insert fails; nothing is kept then.
    pub async fn register_dataminer(
        &self,
        params: &Value,
    ) -> AppResult<Reply<DataminerRegistered>> {
        let mut errors = validate(
            &[
                ("dataminerName", ParamType::String),
                ("sessionID", ParamType::Integer),
            ],
            params,
        );
        errors.extend(device_errors(params));
        let params: RegisterDataminer = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let txn = self.db().begin().await?;

        let Some(project) = projects::Entity::find()
            .filter(projects::Column::SessionId.eq(params.session_id))
            .one(&txn)
            .await?
        else {
            return Ok(Reply::rejected(vec![format!(
                "No project records session {}",
                params.session_id
            )]));
        };

        let user = users::ActiveModel {
            name: Set(params.name),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let device = Self::register_device(&txn, params.device, user.id).await?;

        txn.commit().await?;

        tracing::info!(
            dataminer_id = user.id,
            project_id = project.id,
            "Dataminer registered"
        );

        Ok(Reply::Done(DataminerRegistered {
            dataminer_id: user.id,
            project: ProjectRef {
                project_id: project.id,
                project_name: project.name,
                session_id: project.session_id,
            },
            device,
        }))
    }

    /// Check admin credentials.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn login_admin(&self, params: &Value) -> AppResult<Reply<LoginResult>> {
        let errors = validate(
            &[
                ("adminEmail", ParamType::String),
                ("password", ParamType::String),
            ],
            params,
        );
        let params: Login = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let candidates = admins::Entity::find()
            .filter(admins::Column::Email.eq(params.email.as_str()))
            .find_also_related(users::Entity)
            .all(self.db())
            .await?;

        for (admin, user) in candidates {
            if !verify_blocking(params.password.clone(), admin.password_hash).await? {
                continue;
            }
            let Some(user) = user else {
                return Err(AppError::Integrity(format!(
                    "Admin {} has no user record",
                    admin.user_id
                )));
            };

            let device_id = devices::Entity::find()
                .filter(devices::Column::UserId.eq(user.id))
                .order_by_asc(devices::Column::Id)
                .one(self.db())
                .await?
                .map(|d| d.id);

            tracing::info!(admin_id = user.id, "Admin logged in");

            return Ok(Reply::Done(LoginResult {
                admin: Some(AdminView {
                    admin_id: user.id,
                    email: admin.email,
                    admin_name: user.name,
                    device_id,
                }),
            }));
        }

        tracing::info!(email = %params.email, "Login failed");
        Ok(Reply::Done(LoginResult { admin: None }))
    }
}
