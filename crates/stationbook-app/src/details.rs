// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const DETAILS_TITLE: &str = "Details Screen";
pub const DETAILS_SUBTITLE: &str = "You entered:";
pub const DETAILS_PLACEHOLDER: &str = "Nothing entered";

/// Read-only screen that echoes the text it was navigated with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsView {
    input: Option<String>,
}

impl DetailsView {
    pub fn new(input: Option<String>) -> Self {
        Self { input }
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn body(&self) -> &str {
        match self.input.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => DETAILS_PLACEHOLDER,
        }
    }
}
