//! Wire types for the ChurchMan API. Field names follow the server's JSON verbatim.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Level codes arrive as strings from some endpoints and as integers from others.
fn code_from_any<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number level code, got {}", other))),
    }
}

fn opt_code_from_any<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected string or number code, got {}", other))),
    }
}

/// One record, a list of records, or nothing: the API returns whichever it has.
fn one_or_many<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }
    Ok(match Option::<OneOrMany<T>>::deserialize(de)? {
        None => Vec::new(),
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(t)) => vec![t],
    })
}

fn default_true() -> bool { true }

/// A level the signed-in user may act under (`GET /auth/user_levels/me`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevel {
    #[serde(rename = "Level_Code", deserialize_with = "code_from_any")]
    pub level_code: String,
    #[serde(rename = "ChurchLevel_Code", default, deserialize_with = "opt_code_from_any")]
    pub church_level_code: Option<String>,
    #[serde(rename = "Church_Level", default)]
    pub church_level: Option<String>,
}

impl UserLevel {
    /// Code submitted on selection: the church-level code when present, else the level code.
    pub fn selection_code(&self) -> &str {
        self.church_level_code.as_deref().filter(|c| !c.is_empty()).unwrap_or(&self.level_code)
    }

    pub fn display_name(&self) -> &str {
        self.church_level.as_deref().unwrap_or(&self.level_code)
    }
}

/// One tier of the organizational hierarchy (`GET /hierarchy`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    #[serde(rename = "Level_Code", deserialize_with = "code_from_any")]
    pub level_code: String,
    #[serde(rename = "Level_No", default)]
    pub level_no: Option<i64>,
    #[serde(rename = "Head_Code", default)]
    pub head_code: Option<String>,
    #[serde(rename = "Church_Level", default)]
    pub church_level: Option<String>,
    #[serde(rename = "ChurchLevel_Code", default, deserialize_with = "opt_code_from_any")]
    pub church_level_code: Option<String>,
    #[serde(rename = "Is_Active", default = "default_true")]
    pub is_active: bool,
}

impl HierarchyLevel {
    pub fn display_name(&self) -> &str {
        self.church_level.as_deref().unwrap_or(&self.level_code)
    }
}

/// Access granted for a selected level (`user_access` of the select-level response,
/// and the rows of `GET /auth/users/me`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    #[serde(rename = "Usercode", default)]
    pub usercode: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Level_Code", default, deserialize_with = "opt_code_from_any")]
    pub level_code: Option<String>,
    #[serde(rename = "Level_No", default)]
    pub level_no: Option<i64>,
    #[serde(rename = "Role_Code", default)]
    pub role_code: Option<String>,
    #[serde(rename = "ChurchLevel_Code", default, deserialize_with = "opt_code_from_any")]
    pub church_level_code: Option<String>,
    #[serde(rename = "Church_Level", default)]
    pub church_level: Option<String>,
    #[serde(rename = "HeadChurch_Code", default)]
    pub head_church_code: Option<String>,
    #[serde(rename = "Module_Code", default)]
    pub module_code: Option<String>,
    #[serde(rename = "SubModule_Code", default)]
    pub submodule_code: Option<String>,
    #[serde(rename = "Access_Type", default)]
    pub access_type: Option<String>,
}

/// Body of a successful login or signup.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of a successful level selection.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectLevelResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub access_token: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub user_access: Vec<AccessGrant>,
}

/// `{data, message}` envelope used by the hierarchy endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    pub data: Vec<HierarchyLevel>,
    #[serde(default)]
    pub message: Option<String>,
}
