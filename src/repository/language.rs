use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::languages;
use crate::error::{AppError, AppResult};
use crate::validate::{ParamType, Reply, checked, validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LanguageMeta {
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(rename = "languageName")]
    pub language_name: String,
}

#[derive(Deserialize)]
struct LoadLanguage {
    #[serde(rename = "languageCode")]
    language_code: String,
}

impl Repository {
    /// List the available UI languages.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn get_language_metas(&self) -> AppResult<Vec<LanguageMeta>> {
        let rows = languages::Entity::find()
            .order_by_asc(languages::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|l| LanguageMeta {
                language_code: l.code,
                language_name: l.name,
            })
            .collect())
    }

    /// Fetch the stored translation text of one language, unparsed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown code, `AppError::Database` if the
    /// query fails.
    pub async fn load_language(&self, params: &Value) -> AppResult<Reply<String>> {
        let errors = validate(&[("languageCode", ParamType::String)], params);
        let params: LoadLanguage = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let language = languages::Entity::find_by_id(params.language_code.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Language '{}' not found", params.language_code))
            })?;

        Ok(Reply::Done(language.language))
    }
}
