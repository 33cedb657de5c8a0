use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(OrgId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserState {
    #[default]
    #[serde(rename = "USER_STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "USER_STATE_ACTIVE")]
    Active,
    #[serde(rename = "USER_STATE_INACTIVE")]
    Inactive,
    #[serde(rename = "USER_STATE_DELETED")]
    Deleted,
    #[serde(rename = "USER_STATE_LOCKED")]
    Locked,
    #[serde(rename = "USER_STATE_SUSPEND")]
    Suspend,
    #[serde(rename = "USER_STATE_INITIAL")]
    Initial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserKind {
    #[default]
    #[serde(rename = "TYPE_HUMAN")]
    Human,
    #[serde(rename = "TYPE_MACHINE")]
    Machine,
}

impl UserKind {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Machine => "machine",
        }
    }

    /// Parses the `type` route parameter. Anything unrecognised maps to [`UserKind::Human`].
    pub fn from_query_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("machine") {
            Self::Machine
        } else {
            Self::Human
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub state: UserState,
    pub kind: UserKind,
    pub user_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub preferred_login_name: String,
    #[serde(default)]
    pub login_names: Vec<String>,
}

impl UserRow {
    pub fn human(id: impl Into<String>, user_name: impl Into<String>, state: UserState) -> Self {
        let user_name = user_name.into();
        Self {
            id: UserId::new(id),
            state,
            kind: UserKind::Human,
            display_name: user_name.clone(),
            email: None,
            preferred_login_name: user_name.clone(),
            login_names: vec![user_name.clone()],
            user_name,
        }
    }

    pub fn machine(id: impl Into<String>, user_name: impl Into<String>, state: UserState) -> Self {
        Self {
            kind: UserKind::Machine,
            ..Self::human(id, user_name, state)
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
