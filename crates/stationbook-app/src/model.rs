// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub site_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_station: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub account_number: String,
}

/// Request body for create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFields {
    pub site_name: String,
    pub service_station: String,
    pub account_number: String,
}

impl Account {
    pub fn fields(&self) -> AccountFields {
        AccountFields {
            site_name: self.site_name.clone(),
            service_station: self.service_station.clone(),
            account_number: self.account_number.clone(),
        }
    }

    pub fn with_fields(id: AccountId, fields: AccountFields) -> Self {
        Self {
            id,
            site_name: fields.site_name,
            service_station: fields.service_station,
            account_number: fields.account_number,
        }
    }

    /// Site name and service station match case-insensitively; the account
    /// number only matches verbatim. An empty query matches every account.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.site_name.to_lowercase().contains(&needle)
            || self.service_station.to_lowercase().contains(&needle)
            || self.account_number.contains(query)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{Account, AccountFields};
    use crate::AccountId;

    fn sample(site: &str, station: &str, number: &str) -> Account {
        Account {
            id: AccountId::new(1),
            site_name: site.to_owned(),
            service_station: station.to_owned(),
            account_number: number.to_owned(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(sample("", "", "").matches_query(""));
        assert!(sample("Main St", "Shell", "1001").matches_query(""));
    }

    #[test]
    fn text_fields_match_case_insensitively() {
        let account = sample("Main St", "Shell", "1001");
        assert!(account.matches_query("main"));
        assert!(account.matches_query("SHELL"));
        assert!(account.matches_query("n s"));
        assert!(!account.matches_query("chevron"));
    }

    #[test]
    fn account_number_matches_verbatim_substring() {
        let account = sample("Depot", "Esso", "AB-1001");
        assert!(account.matches_query("100"));
        assert!(account.matches_query("AB-"));
        assert!(!account.matches_query("ab-"));
        assert!(!account.matches_query("999"));
    }

    #[test]
    fn wire_format_uses_camel_case_and_tolerates_nulls() {
        let decoded: Account = serde_json::from_str(
            r#"{"id":7,"siteName":"Main St","serviceStation":null}"#,
        )
        .expect("account should decode");
        assert_eq!(decoded.id, AccountId::new(7));
        assert_eq!(decoded.site_name, "Main St");
        assert_eq!(decoded.service_station, "");
        assert_eq!(decoded.account_number, "");

        let body = serde_json::to_value(AccountFields {
            site_name: "North".to_owned(),
            service_station: "BP".to_owned(),
            account_number: "42".to_owned(),
        })
        .expect("fields should encode");
        assert_eq!(
            body,
            serde_json::json!({
                "siteName": "North",
                "serviceStation": "BP",
                "accountNumber": "42",
            })
        );
    }

    #[test]
    fn list_decodes_string_and_numeric_ids() {
        let decoded: Vec<Account> = serde_json::from_str(
            r#"[
                {"id":"a1b2","siteName":"Main St","serviceStation":"Shell","accountNumber":"1001"},
                {"id":12,"siteName":"Harbor","serviceStation":"BP","accountNumber":"2002"}
            ]"#,
        )
        .expect("mixed ids should decode");
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, AccountId::text("a1b2"));
        assert_eq!(decoded[0].id.to_string(), "a1b2");
        assert_eq!(decoded[1].id, AccountId::new(12));
    }
}
