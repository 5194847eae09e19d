//! Vendor Entity
//!
//! A caterer, decorator, photographer etc. saved to a group's directory.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, TableRecord};

/// Characters left alone by browser-style URI component encoding
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default)]
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    /// Kind of service, e.g. "Caterer"
    #[serde(rename = "type", default)]
    pub vendor_type: Option<String>,
    /// Phone number
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Outbound links for a vendor card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLinks {
    pub call: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub map: Option<String>,
}

impl Vendor {
    pub fn new(group_id: i64, name: String) -> Self {
        Self {
            id: 0,
            group_id,
            name,
            vendor_type: None,
            contact: None,
            email: None,
            address: None,
            created_at: None,
        }
    }

    pub fn contact_links(&self) -> ContactLinks {
        let contact = non_empty(&self.contact);
        let whatsapp = contact.and_then(|phone| {
            let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
            (!digits.is_empty()).then(|| format!("https://wa.me/{}", digits))
        });

        ContactLinks {
            call: contact.map(|phone| format!("tel:{}", phone)),
            whatsapp,
            email: non_empty(&self.email).map(|email| format!("mailto:{}", email)),
            map: non_empty(&self.address).map(|address| {
                format!(
                    "https://maps.google.com/?q={}",
                    utf8_percent_encode(address, URI_COMPONENT)
                )
            }),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Entity for Vendor {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for Vendor {
    const TABLE: &'static str = "vendors";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_links() {
        let mut vendor = Vendor::new(1, "Sharma Caterers".to_string());
        vendor.contact = Some("+91 98765 43210".to_string());
        vendor.email = Some("hello@sharma.in".to_string());
        vendor.address = Some("12 MG Road, Pune & Co".to_string());

        let links = vendor.contact_links();
        assert_eq!(links.call.as_deref(), Some("tel:+91 98765 43210"));
        assert_eq!(links.whatsapp.as_deref(), Some("https://wa.me/919876543210"));
        assert_eq!(links.email.as_deref(), Some("mailto:hello@sharma.in"));
        assert_eq!(
            links.map.as_deref(),
            Some("https://maps.google.com/?q=12%20MG%20Road%2C%20Pune%20%26%20Co")
        );
    }

    #[test]
    fn test_missing_contact_fields() {
        let mut vendor = Vendor::new(1, "Florist".to_string());
        vendor.email = Some("   ".to_string());
        assert_eq!(vendor.contact_links(), ContactLinks::default());
    }

    #[test]
    fn test_type_field_name() {
        let vendor: Vendor = serde_json::from_str(
            r#"{"id": 1, "group_id": 2, "name": "Lens Studio", "type": "Photographer"}"#,
        )
        .unwrap();
        assert_eq!(vendor.vendor_type.as_deref(), Some("Photographer"));
    }
}
