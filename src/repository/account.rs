use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::{admins, devices, sensors, users};
use crate::error::{AppError, AppResult};
use crate::validate::{ParamType, field, type_name, validate, validate_optional};

/// Name and address of a user who can be notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

/// Recording device as announced by a client. All descriptive fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    #[serde(rename = "deviceName")]
    pub name: String,
    #[serde(rename = "deviceType")]
    pub device_type: String,
    pub firmware: String,
    pub generation: String,
    #[serde(rename = "MACADRESS")]
    pub mac_address: String,
    #[serde(rename = "sensorInformation")]
    pub sensors: Vec<SensorInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorInfo {
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: i32,
    #[serde(rename = "sensorName")]
    pub name: String,
    #[serde(rename = "deviceUniqueSensorID")]
    pub device_unique_sensor_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceRegistered {
    #[serde(rename = "deviceID")]
    pub device_id: i32,
    #[serde(rename = "sensorID")]
    pub sensor_ids: Vec<i32>,
}

/// Check the `device` member of a registration payload.
#[must_use]
pub fn device_errors(payload: &Value) -> Vec<String> {
    let mut errors = validate(&[("device", ParamType::Object)], payload);
    let Some(device) = field(payload, "device").filter(|d| d.is_object()) else {
        return errors;
    };

    errors.extend(validate_optional(
        &[
            ("deviceName", ParamType::String),
            ("deviceType", ParamType::String),
            ("firmware", ParamType::String),
            ("generation", ParamType::String),
            ("MACADRESS", ParamType::String),
            ("sensorInformation", ParamType::Array),
        ],
        device,
    ));

    if let Some(Value::Array(entries)) = field(device, "sensorInformation") {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                errors.push(format!(
                    "Param sensorInformation.{i} has not type object, but type {}",
                    type_name(entry)
                ));
                continue;
            }
            errors.extend(validate(
                &[
                    ("sensorTypeID", ParamType::Integer),
                    ("sensorName", ParamType::String),
                    ("deviceUniqueSensorID", ParamType::Integer),
                ],
                entry,
            ));
        }
    }

    errors
}

impl Repository {
    /// Store a device of `user_id` and its sensors.
    ///
    /// Runs on the caller's connection so it can join a registration transaction.
    pub(crate) async fn register_device<C: ConnectionTrait>(
        conn: &C,
        device: DeviceInfo,
        user_id: i32,
    ) -> AppResult<DeviceRegistered> {
        let stored = devices::ActiveModel {
            name: Set(device.name),
            device_type: Set(device.device_type),
            firmware: Set(device.firmware),
            generation: Set(device.generation),
            mac_address: Set(device.mac_address),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let mut sensor_ids = Vec::with_capacity(device.sensors.len());
        for sensor in device.sensors {
            let stored_sensor = sensors::ActiveModel {
                sensor_type_id: Set(sensor.sensor_type_id),
                name: Set(sensor.name),
                device_unique_sensor_id: Set(sensor.device_unique_sensor_id),
                device_id: Set(stored.id),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            sensor_ids.push(stored_sensor.id);
        }

        Ok(DeviceRegistered {
            device_id: stored.id,
            sensor_ids,
        })
    }

    /// Contact data of an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integrity` unless exactly one admin matches `user_id`.
    pub async fn get_email(&self, user_id: i32) -> AppResult<Contact> {
        let mut found = admins::Entity::find()
            .filter(admins::Column::UserId.eq(user_id))
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        if found.len() != 1 {
            return Err(AppError::Integrity(format!(
                "Illegal number of records ({}) for user {user_id}",
                found.len()
            )));
        }

        match found.pop() {
            Some((admin, Some(user))) => Ok(Contact {
                name: user.name,
                email: admin.email,
            }),
            _ => Err(AppError::Integrity(format!(
                "Admin {user_id} has no user record"
            ))),
        }
    }
}
