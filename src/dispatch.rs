//! Action dispatcher for `POST /api?action=<name>`.
//!
//! The action name is resolved against a closed set before any database access.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::repository::Repository;
use crate::validate::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetLanguageMetas,
    LoadLanguage,
    CreateProject,
    CreateDataSet,
    SendDataPoint,
    SendDataPointsAgain,
    LoadProject,
    GetProjectMetas,
    DeleteDataSet,
    RegisterAdmin,
    RegisterDataminer,
    LoginAdmin,
    CreateLabel,
    SetLabel,
    DeleteLabel,
}

impl Action {
    pub const ALL: [Self; 15] = [
        Self::GetLanguageMetas,
        Self::LoadLanguage,
        Self::CreateProject,
        Self::CreateDataSet,
        Self::SendDataPoint,
        Self::SendDataPointsAgain,
        Self::LoadProject,
        Self::GetProjectMetas,
        Self::DeleteDataSet,
        Self::RegisterAdmin,
        Self::RegisterDataminer,
        Self::LoginAdmin,
        Self::CreateLabel,
        Self::SetLabel,
        Self::DeleteLabel,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetLanguageMetas => "get_language_metas",
            Self::LoadLanguage => "load_language",
            Self::CreateProject => "create_project",
            Self::CreateDataSet => "create_data_set",
            Self::SendDataPoint => "send_data_point",
            Self::SendDataPointsAgain => "send_data_points_again",
            Self::LoadProject => "load_project",
            Self::GetProjectMetas => "get_project_metas",
            Self::DeleteDataSet => "delete_data_set",
            Self::RegisterAdmin => "register_admin",
            Self::RegisterDataminer => "register_dataminer",
            Self::LoginAdmin => "login_admin",
            Self::CreateLabel => "create_label",
            Self::SetLabel => "set_label",
            Self::DeleteLabel => "delete_label",
        }
    }

    /// Whether the action reads a request body at all.
    #[must_use]
    pub fn takes_params(self) -> bool {
        !matches!(self, Self::GetLanguageMetas)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AppError::UnknownAction(s.to_string()))
    }
}

/// Response body of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(Value),
    /// Text stored as JSON, passed through undecoded
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub output: Output,
    /// User that the action authenticated, to be bound to the caller's session
    pub authenticated: Option<i32>,
}

impl Dispatched {
    fn json<T: Serialize>(value: &T) -> AppResult<Self> {
        Ok(Self {
            output: Output::Json(serde_json::to_value(value)?),
            authenticated: None,
        })
    }

    fn logged_in<T: Serialize>(value: &T, user_id: Option<i32>) -> AppResult<Self> {
        Ok(Self {
            authenticated: user_id,
            ..Self::json(value)?
        })
    }
}

/// Run one action against the repository.
///
/// # Errors
///
/// Propagates fatal errors of the operation; validation failures are part of the
/// output.
pub async fn dispatch(repo: &Repository, action: Action, params: &Value) -> AppResult<Dispatched> {
    tracing::debug!(action = %action, "Dispatching action");

    match action {
        Action::GetLanguageMetas => Dispatched::json(&repo.get_language_metas().await?),
        Action::LoadLanguage => match repo.load_language(params).await? {
            Reply::Done(text) => Ok(Dispatched {
                output: Output::Raw(text),
                authenticated: None,
            }),
            rejected => Dispatched::json(&rejected),
        },
        Action::CreateProject => Dispatched::json(&repo.create_project(params).await?),
        Action::CreateDataSet => Dispatched::json(&repo.create_data_set(params).await?),
        Action::SendDataPoint => Dispatched::json(&repo.send_data_point(params).await?),
        Action::SendDataPointsAgain => {
            Dispatched::json(&repo.send_data_points_again(params).await?)
        }
        Action::LoadProject => Dispatched::json(&repo.load_project(params).await?),
        Action::GetProjectMetas => Dispatched::json(&repo.get_project_metas(params).await?),
        Action::DeleteDataSet => Dispatched::json(&repo.delete_data_set(params).await?),
        Action::RegisterAdmin => {
            let reply = repo.register_admin(params).await?;
            let user_id = match &reply {
                Reply::Done(registered) => registered.authenticated(),
                Reply::Rejected { .. } => None,
            };
            Dispatched::logged_in(&reply, user_id)
        }
        Action::RegisterDataminer => Dispatched::json(&repo.register_dataminer(params).await?),
        Action::LoginAdmin => {
            let reply = repo.login_admin(params).await?;
            let user_id = match &reply {
                Reply::Done(login) => login.admin.as_ref().map(|a| a.admin_id),
                Reply::Rejected { .. } => None,
            };
            Dispatched::logged_in(&reply, user_id)
        }
        Action::CreateLabel => Dispatched::json(&repo.create_label(params).await?),
        Action::SetLabel => Dispatched::json(&repo.set_label(params).await?),
        Action::DeleteLabel => Dispatched::json(&repo.delete_label(params).await?),
    }
}
