// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Account, AccountFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Edit,
}

impl FormKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Create => "Add New Account",
            Self::Edit => "Edit Account",
        }
    }

    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Save",
            Self::Edit => "Save Changes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    SiteName,
    ServiceStation,
    AccountNumber,
}

impl FormField {
    pub const ALL: [Self; 3] = [Self::SiteName, Self::ServiceStation, Self::AccountNumber];

    pub const fn label(self) -> &'static str {
        match self {
            Self::SiteName => "Site Name",
            Self::ServiceStation => "Service Station",
            Self::AccountNumber => "Account Number",
        }
    }

    pub fn next(self) -> Self {
        self.rotate(1)
    }

    pub fn prev(self) -> Self {
        self.rotate(-1)
    }

    fn rotate(self, delta: isize) -> Self {
        let fields = Self::ALL;
        let current = fields
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0) as isize;
        let len = fields.len() as isize;
        fields[(current + delta).rem_euclid(len) as usize]
    }
}

/// Text buffers behind the create and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountForm {
    pub site_name: String,
    pub service_station: String,
    pub account_number: String,
}

impl AccountForm {
    pub fn from_account(account: &Account) -> Self {
        Self {
            site_name: account.site_name.clone(),
            service_station: account.service_station.clone(),
            account_number: account.account_number.clone(),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::SiteName => &self.site_name,
            FormField::ServiceStation => &self.service_station,
            FormField::AccountNumber => &self.account_number,
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::SiteName => self.site_name = value,
            FormField::ServiceStation => self.service_station = value,
            FormField::AccountNumber => self.account_number = value,
        }
    }

    /// Only empty buffers count as missing. Values, whitespace included, are
    /// submitted exactly as typed.
    pub fn validate(&self) -> Result<AccountFields> {
        if self.site_name.is_empty() {
            bail!("site name is required -- enter a site name and retry");
        }
        if self.service_station.is_empty() {
            bail!("service station is required -- enter a station name and retry");
        }
        if self.account_number.is_empty() {
            bail!("account number is required -- enter an account number and retry");
        }
        Ok(AccountFields {
            site_name: self.site_name.clone(),
            service_station: self.service_station.clone(),
            account_number: self.account_number.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountForm, FormField};
    use crate::{Account, AccountId};

    fn filled() -> AccountForm {
        AccountForm {
            site_name: "Main St".to_owned(),
            service_station: "Shell".to_owned(),
            account_number: "1001".to_owned(),
        }
    }

    #[test]
    fn blank_form_fails_on_first_missing_field() {
        let error = AccountForm::default()
            .validate()
            .expect_err("blank form should fail");
        assert!(error.to_string().contains("site name is required"));
    }

    #[test]
    fn each_field_is_required() {
        for field in FormField::ALL {
            let mut form = filled();
            form.set(field, String::new());
            assert!(form.validate().is_err(), "field {field:?} should be required");
        }
    }

    #[test]
    fn whitespace_counts_as_a_value() {
        for field in FormField::ALL {
            let mut form = filled();
            form.set(field, " ".to_owned());
            let fields = form.validate().expect("whitespace should be accepted");
            let submitted = match field {
                FormField::SiteName => fields.site_name,
                FormField::ServiceStation => fields.service_station,
                FormField::AccountNumber => fields.account_number,
            };
            assert_eq!(submitted, " ");
        }
    }

    #[test]
    fn valid_form_yields_fields_as_typed() {
        let mut form = filled();
        form.set(FormField::SiteName, " Main St ".to_owned());
        let fields = form.validate().expect("form should validate");
        assert_eq!(fields.site_name, " Main St ");
        assert_eq!(fields.account_number, "1001");
    }

    #[test]
    fn edit_buffer_seeds_from_account() {
        let account = Account {
            id: AccountId::new(3),
            site_name: "Harbor".to_owned(),
            service_station: "Texaco".to_owned(),
            account_number: "3003".to_owned(),
        };
        let form = AccountForm::from_account(&account);
        assert_eq!(form.value(FormField::SiteName), "Harbor");
        assert_eq!(form.value(FormField::ServiceStation), "Texaco");
        assert_eq!(form.value(FormField::AccountNumber), "3003");
    }

    #[test]
    fn field_cursor_wraps() {
        assert_eq!(FormField::AccountNumber.next(), FormField::SiteName);
        assert_eq!(FormField::SiteName.prev(), FormField::AccountNumber);
    }
}
