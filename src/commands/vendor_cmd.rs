//! Vendor directory commands

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Vendor};
use crate::repository::{Query, Repository, TableRepository};
use crate::view::{vendor_card_view, VendorCardView};
use crate::AppState;

use super::{optional_text, required_text};

/// Fields of the add-vendor form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorInput {
    pub name: String,
    #[serde(rename = "type")]
    pub vendor_type: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

fn repo(state: &AppState) -> TableRepository<Vendor> {
    TableRepository::new(state.store.clone())
}

pub async fn add_vendor(state: &AppState, input: VendorInput) -> DomainResult<Vendor> {
    let ctx = state.session().await?;
    let mut vendor = Vendor::new(ctx.group_id, required_text(&input.name, "vendor name")?);
    vendor.vendor_type = optional_text(input.vendor_type);
    vendor.contact = optional_text(input.contact);
    vendor.email = optional_text(input.email);
    vendor.address = optional_text(input.address);
    let created = repo(state).create(&vendor).await?;
    log::info!("added vendor {} to group {}", created.id, ctx.group_id);
    Ok(created)
}

/// Vendors of the current group by name
pub async fn list_vendors(state: &AppState) -> DomainResult<Vec<VendorCardView>> {
    let ctx = state.session().await?;
    let vendors = repo(state)
        .list_where(&Query::new().eq("group_id", ctx.group_id).order_by("name", true))
        .await?;
    Ok(vendors.iter().map(vendor_card_view).collect())
}

pub async fn delete_vendor(state: &AppState, vendor_id: i64) -> DomainResult<()> {
    let ctx = state.session().await?;
    repo(state)
        .find_one(&Query::new().eq("id", vendor_id).eq("group_id", ctx.group_id))
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("vendor {}", vendor_id)))?;
    repo(state).delete(vendor_id).await
}
