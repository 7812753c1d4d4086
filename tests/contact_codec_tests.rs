// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact JSON codec tests.
//!
//! Update payloads must keep empty email slots as `null`, create payloads
//! must drop them; these tests pin both shapes.

use o365_contacts::error::AppError;
use o365_contacts::models::{DisplayContact, EmailSlot};
use serde_json::{json, Value};

fn only_first_email() -> DisplayContact {
    DisplayContact {
        given_name: "Pavel".to_string(),
        last_name: "Bansky".to_string(),
        emails: [
            EmailSlot::new("pavelb@alpineskihouse.com", "Pavel Bansky"),
            EmailSlot::default(),
            EmailSlot::default(),
        ],
        ..Default::default()
    }
}

fn full_contact() -> DisplayContact {
    DisplayContact {
        given_name: "Alex".to_string(),
        last_name: "Darrow".to_string(),
        mobile_phone: "+1 732 555 0102".to_string(),
        emails: [
            EmailSlot::new("alexd@alpineskihouse.com", "Alex Darrow"),
            EmailSlot::new("alex@example.com", "Alex (home)"),
            EmailSlot::new("ad@example.org", ""),
        ],
        id: String::new(),
    }
}

#[test]
fn test_create_payload_omits_empty_slots() {
    let payload = only_first_email().to_payload(false);
    let emails = payload["EmailAddresses"].as_array().unwrap();

    assert_eq!(emails.len(), 1);
    assert_eq!(
        emails[0],
        json!({"Address": "pavelb@alpineskihouse.com", "Name": "Pavel Bansky"})
    );
}

#[test]
fn test_update_payload_keeps_nulls() {
    let payload = only_first_email().to_payload(true);
    let emails = payload["EmailAddresses"].as_array().unwrap();

    assert_eq!(emails.len(), 3);
    assert!(emails[0].is_object());
    assert_eq!(emails[1], Value::Null);
    assert_eq!(emails[2], Value::Null);
}

#[test]
fn test_payload_shape() {
    let payload = only_first_email().to_payload(false);
    assert_eq!(
        payload,
        json!({
            "GivenName": "Pavel",
            "Surname": "Bansky",
            "MobilePhone1": "",
            "EmailAddresses": [
                {"Address": "pavelb@alpineskihouse.com", "Name": "Pavel Bansky"}
            ],
        })
    );
}

#[test]
fn test_no_emails() {
    let contact = DisplayContact {
        given_name: "Solo".to_string(),
        ..Default::default()
    };

    assert_eq!(contact.to_payload(false)["EmailAddresses"], json!([]));
    assert_eq!(
        contact.to_payload(true)["EmailAddresses"],
        json!([null, null, null])
    );
}

#[test]
fn test_roundtrip_through_update_payload() {
    for contact in [full_contact(), only_first_email(), DisplayContact::default()] {
        let decoded = DisplayContact::from_outlook(&contact.to_payload(true)).unwrap();
        assert_eq!(decoded, contact);
    }
}

#[test]
fn test_special_characters_are_escaped() {
    let contact = DisplayContact {
        given_name: r#"Robert "Bobby""#.to_string(),
        last_name: "O'Brien \\ Jr.".to_string(),
        ..Default::default()
    };

    let text = serde_json::to_string(&contact.to_payload(false)).unwrap();
    let reparsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed["GivenName"], r#"Robert "Bobby""#);
    assert_eq!(reparsed["Surname"], "O'Brien \\ Jr.");
}

#[test]
fn test_decode_vendor_contact() {
    let vendor = json!({
        "@odata.id": "https://outlook.office365.com/api/v1.0/Users('x')/Contacts('AAMkAD=')",
        "@odata.etag": "W/\"EQAAABYAAAA\"",
        "Id": "AAMkAD=",
        "GivenName": "Pavel",
        "Surname": "Bansky",
        "MobilePhone1": null,
        "BusinessPhones": ["+1 732 555 0102"],
        "EmailAddresses": [
            {"Address": "pavelb@alpineskihouse.com", "Name": "Pavel Bansky"}
        ]
    });

    let contact = DisplayContact::from_outlook(&vendor).unwrap();
    assert_eq!(contact.id, "AAMkAD=");
    assert_eq!(contact.given_name, "Pavel");
    assert_eq!(contact.last_name, "Bansky");
    assert_eq!(contact.mobile_phone, "");
    assert_eq!(contact.emails[0].address, "pavelb@alpineskihouse.com");
    assert!(contact.emails[1].is_empty());
    assert!(contact.emails[2].is_empty());
}

#[test]
fn test_decode_null_slots_and_extra_entries() {
    let vendor = json!({
        "Id": "1",
        "GivenName": null,
        "Surname": "Only",
        "MobilePhone1": "555-0100",
        "EmailAddresses": [
            null,
            {"Address": "two@example.com", "Name": null},
            {"Address": "three@example.com", "Name": "Three"},
            {"Address": "four@example.com", "Name": "Four"}
        ]
    });

    let contact = DisplayContact::from_outlook(&vendor).unwrap();
    assert_eq!(contact.given_name, "");
    assert_eq!(contact.mobile_phone, "555-0100");
    assert!(contact.emails[0].is_empty());
    assert_eq!(contact.emails[1], EmailSlot::new("two@example.com", ""));
    assert_eq!(contact.emails[2], EmailSlot::new("three@example.com", "Three"));
}

#[test]
fn test_decode_rejects_malformed_contact() {
    assert!(matches!(
        DisplayContact::from_outlook(&json!({"GivenName": 5})),
        Err(AppError::Decoding(_))
    ));
    assert!(matches!(
        DisplayContact::from_outlook(&json!("not an object")),
        Err(AppError::Decoding(_))
    ));
}

#[test]
fn test_decode_contact_list() {
    let body = json!({
        "value": [
            {"Id": "a", "GivenName": "Ann", "Surname": "A", "EmailAddresses": []},
            {"Id": "b", "GivenName": "Ben", "Surname": "B", "EmailAddresses": []}
        ]
    });

    let contacts = DisplayContact::list_from_outlook(&body).unwrap();
    let ids: Vec<&str> = contacts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    assert!(matches!(
        DisplayContact::list_from_outlook(&json!({"items": []})),
        Err(AppError::Decoding(_))
    ));
}
