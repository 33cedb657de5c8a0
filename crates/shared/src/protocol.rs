use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{UserId, UserKind, UserRow, UserState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextQueryMethod {
    #[serde(rename = "TEXT_QUERY_METHOD_EQUALS")]
    Equals,
    #[serde(rename = "TEXT_QUERY_METHOD_EQUALS_IGNORE_CASE")]
    EqualsIgnoreCase,
    #[serde(rename = "TEXT_QUERY_METHOD_STARTS_WITH")]
    StartsWith,
    #[serde(rename = "TEXT_QUERY_METHOD_STARTS_WITH_IGNORE_CASE")]
    StartsWithIgnoreCase,
    #[serde(rename = "TEXT_QUERY_METHOD_CONTAINS")]
    Contains,
    #[default]
    #[serde(rename = "TEXT_QUERY_METHOD_CONTAINS_IGNORE_CASE")]
    ContainsIgnoreCase,
    #[serde(rename = "TEXT_QUERY_METHOD_ENDS_WITH")]
    EndsWith,
    #[serde(rename = "TEXT_QUERY_METHOD_ENDS_WITH_IGNORE_CASE")]
    EndsWithIgnoreCase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SearchQuery {
    TypeQuery {
        #[serde(rename = "type")]
        kind: UserKind,
    },
    UserNameQuery {
        user_name: String,
        method: TextQueryMethod,
    },
    FirstNameQuery {
        first_name: String,
        method: TextQueryMethod,
    },
    LastNameQuery {
        last_name: String,
        method: TextQueryMethod,
    },
    DisplayNameQuery {
        display_name: String,
        method: TextQueryMethod,
    },
    EmailQuery {
        email_address: String,
        method: TextQueryMethod,
    },
    StateQuery {
        state: UserState,
    },
}

impl SearchQuery {
    pub fn kind(kind: UserKind) -> Self {
        Self::TypeQuery { kind }
    }

    pub fn is_kind(&self) -> bool {
        matches!(self, Self::TypeQuery { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u32,
    pub asc: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersRequest {
    pub query: ListQuery,
    pub queries: Vec<SearchQuery>,
}

impl ListUsersRequest {
    pub fn new(limit: u32, offset: u64, queries: Vec<SearchQuery>) -> Self {
        Self {
            query: ListQuery {
                offset,
                limit,
                asc: true,
            },
            queries,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetails {
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_result: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ListDetails>,
    #[serde(default)]
    pub result: Vec<UserRecord>,
}

impl ListUsersResponse {
    pub fn total_result(&self) -> Option<u64> {
        self.details.as_ref().and_then(|d| d.total_result)
    }

    pub fn view_timestamp(&self) -> Option<DateTime<Utc>> {
        self.details.as_ref().and_then(|d| d.view_timestamp)
    }

    pub fn rows(&self) -> Vec<UserRow> {
        self.result.iter().cloned().map(UserRow::from).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanEmail {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_email_verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HumanRecord {
    #[serde(default)]
    pub profile: HumanProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<HumanEmail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub state: UserState,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub login_names: Vec<String>,
    #[serde(default)]
    pub preferred_login_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human: Option<HumanRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachineRecord>,
}

impl From<UserRecord> for UserRow {
    fn from(record: UserRecord) -> Self {
        let (kind, display_name, email) = match (record.human, record.machine) {
            (_, Some(machine)) => (UserKind::Machine, machine.name, None),
            (Some(human), None) => (
                UserKind::Human,
                human.profile.display_name,
                human.email.map(|e| e.email).filter(|e| !e.is_empty()),
            ),
            (None, None) => (UserKind::Human, String::new(), None),
        };

        Self {
            id: record.id,
            state: record.state,
            kind,
            display_name,
            email,
            preferred_login_name: record.preferred_login_name,
            login_names: record.login_names,
            user_name: record.user_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub user: UserRecord,
}

/// The gateway encodes 64-bit integers as strings; accept both forms.
fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_queries_use_gateway_field_names() {
        let queries = vec![
            SearchQuery::kind(UserKind::Machine),
            SearchQuery::UserNameQuery {
                user_name: "ali".into(),
                method: TextQueryMethod::ContainsIgnoreCase,
            },
        ];
        let json = serde_json::to_value(&queries).expect("encode");
        assert_eq!(
            json,
            serde_json::json!([
                { "typeQuery": { "type": "TYPE_MACHINE" } },
                { "userNameQuery": {
                    "userName": "ali",
                    "method": "TEXT_QUERY_METHOD_CONTAINS_IGNORE_CASE"
                } }
            ])
        );
    }

    #[test]
    fn list_response_accepts_stringified_totals() {
        let raw = r#"{
            "details": { "totalResult": "3", "viewTimestamp": "2024-05-01T10:00:00Z" },
            "result": [
                { "id": "1", "state": "USER_STATE_ACTIVE", "userName": "alice",
                  "preferredLoginName": "alice@acme",
                  "human": { "profile": { "displayName": "Alice A" },
                             "email": { "email": "alice@acme.test" } } },
                { "id": "2", "state": "USER_STATE_INACTIVE", "userName": "ci-bot",
                  "preferredLoginName": "ci-bot@acme",
                  "machine": { "name": "CI bot" } }
            ]
        }"#;
        let response: ListUsersResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(response.total_result(), Some(3));
        assert!(response.view_timestamp().is_some());

        let rows = response.rows();
        assert_eq!(rows[0].kind, UserKind::Human);
        assert_eq!(rows[0].email.as_deref(), Some("alice@acme.test"));
        assert_eq!(rows[0].display_name, "Alice A");
        assert_eq!(rows[1].kind, UserKind::Machine);
        assert_eq!(rows[1].email, None);
        assert_eq!(rows[1].state, UserState::Inactive);
    }

    #[test]
    fn missing_details_leave_totals_unknown() {
        let response: ListUsersResponse = serde_json::from_str("{}").expect("decode");
        assert_eq!(response.total_result(), None);
        assert_eq!(response.view_timestamp(), None);
        assert!(response.rows().is_empty());
    }
}
