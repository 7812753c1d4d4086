// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact model and its Outlook JSON codec.
//!
//! Reads go through a typed serde model of the vendor payload. Writes are
//! built with `serde_json` in one of two shapes:
//! - update payloads keep empty email slots as `null` so a previously set
//!   address can be cleared
//! - create payloads drop empty slots, because Office 365 rejects `null`
//!   entries on create

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidateEmail, ValidationError};

/// Number of email slots a contact carries.
pub const EMAIL_SLOTS: usize = 3;

/// One email address entry on a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSlot {
    pub address: String,
    pub name: String,
}

impl EmailSlot {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.name.is_empty()
    }
}

/// Flat contact record used for display and editing.
///
/// Every field defaults to the empty string, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayContact {
    pub given_name: String,
    pub last_name: String,
    pub mobile_phone: String,
    pub emails: [EmailSlot; EMAIL_SLOTS],
    /// Vendor-assigned id, empty for contacts not yet created
    pub id: String,
}

/// Contact as returned by the Outlook REST API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutlookContact {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    surname: Option<String>,
    #[serde(default)]
    mobile_phone1: Option<String>,
    #[serde(default)]
    email_addresses: Option<Vec<Option<OutlookEmailAddress>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutlookEmailAddress {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl DisplayContact {
    /// Decode a contact from Outlook JSON.
    ///
    /// Null or missing values leave the field at its default. Email entries
    /// past the third are ignored.
    pub fn from_outlook(value: &Value) -> Result<Self, AppError> {
        let raw = OutlookContact::deserialize(value)
            .map_err(|e| AppError::Decoding(format!("Invalid contact JSON: {}", e)))?;

        let mut contact = DisplayContact {
            given_name: raw.given_name.unwrap_or_default(),
            last_name: raw.surname.unwrap_or_default(),
            mobile_phone: raw.mobile_phone1.unwrap_or_default(),
            id: raw.id.unwrap_or_default(),
            ..Default::default()
        };

        let entries = raw.email_addresses.unwrap_or_default();
        for (slot, entry) in contact.emails.iter_mut().zip(entries) {
            if let Some(entry) = entry {
                *slot = EmailSlot {
                    address: entry.address.unwrap_or_default(),
                    name: entry.name.unwrap_or_default(),
                };
            }
        }

        Ok(contact)
    }

    /// Decode every contact in a collection response (`{"value": [...]}`).
    pub fn list_from_outlook(value: &Value) -> Result<Vec<Self>, AppError> {
        let items = value
            .get("value")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Decoding("Contact list has no value array".to_string()))?;

        items.iter().map(Self::from_outlook).collect()
    }

    /// Encode the contact as a create (`emit_nulls = false`) or update
    /// (`emit_nulls = true`) payload.
    pub fn to_payload(&self, emit_nulls: bool) -> Value {
        let email_addresses: Vec<Value> = self
            .emails
            .iter()
            .filter_map(|slot| {
                if slot.is_empty() {
                    emit_nulls.then_some(Value::Null)
                } else {
                    Some(json!({
                        "Address": slot.address,
                        "Name": slot.name,
                    }))
                }
            })
            .collect();

        json!({
            "GivenName": self.given_name,
            "Surname": self.last_name,
            "MobilePhone1": self.mobile_phone,
            "EmailAddresses": email_addresses,
        })
    }
}

/// Contact fields posted by the create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub given_name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub mobile_phone: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email1_address: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub email1_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email2_address: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub email2_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email3_address: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub email3_name: String,
}

impl ContactForm {
    /// Validate the form and turn it into a contact (with an empty id).
    pub fn into_contact(self) -> Result<DisplayContact, AppError> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(DisplayContact {
            given_name: self.given_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            mobile_phone: self.mobile_phone.trim().to_string(),
            emails: [
                EmailSlot::new(self.email1_address.trim(), self.email1_name.trim()),
                EmailSlot::new(self.email2_address.trim(), self.email2_name.trim()),
                EmailSlot::new(self.email3_address.trim(), self.email3_name.trim()),
            ],
            id: String::new(),
        })
    }
}

/// Empty means "slot unused"; anything else must look like an address.
fn validate_optional_email(value: &String) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}
