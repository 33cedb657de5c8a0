use shared::{
    domain::UserKind,
    protocol::{SearchQuery, TextQueryMethod},
};

// The kind predicate is rebuilt from `kind` on each call and always comes first;
// `extra` follows in caller order.
pub fn compose(kind: UserKind, extra: &[SearchQuery]) -> Vec<SearchQuery> {
    let mut queries = Vec::with_capacity(extra.len() + 1);
    queries.push(SearchQuery::kind(kind));
    queries.extend(extra.iter().cloned());
    queries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKey {
    FirstName,
    LastName,
    DisplayName,
    UserName,
    Email,
}

impl SearchKey {
    pub fn query(self, value: impl Into<String>, method: TextQueryMethod) -> SearchQuery {
        let value = value.into();
        match self {
            Self::FirstName => SearchQuery::FirstNameQuery {
                first_name: value,
                method,
            },
            Self::LastName => SearchQuery::LastNameQuery {
                last_name: value,
                method,
            },
            Self::DisplayName => SearchQuery::DisplayNameQuery {
                display_name: value,
                method,
            },
            Self::UserName => SearchQuery::UserNameQuery {
                user_name: value,
                method,
            },
            Self::Email => SearchQuery::EmailQuery {
                email_address: value,
                method,
            },
        }
    }
}
