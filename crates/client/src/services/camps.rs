use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{flexible_date, Resource, ResourceService};

/// Canonical camp listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camp {
    #[serde(alias = "Id", alias = "campId", alias = "CampId", alias = "camp_id")]
    pub id: i64,

    #[serde(alias = "Name", alias = "campName", alias = "CampName", alias = "camp_name")]
    pub name: String,

    #[serde(default, alias = "Description")]
    pub description: String,

    #[serde(default, alias = "Location", alias = "address", alias = "Address")]
    pub location: String,

    #[serde(default, alias = "StartDate", alias = "start_date", deserialize_with = "flexible_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, alias = "EndDate", alias = "end_date", deserialize_with = "flexible_date")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, alias = "Price", alias = "fee", alias = "Fee")]
    pub price: f64,

    #[serde(default, alias = "Capacity", alias = "maxCampers", alias = "MaxCampers")]
    pub capacity: Option<u32>,

    #[serde(default, alias = "ImageUrl", alias = "imageURL", alias = "image_url", alias = "image")]
    pub image_url: Option<String>,

    /// 3D scene of the camp grounds, rendered by the model viewer.
    #[serde(default, alias = "ModelUrl", alias = "model_url")]
    pub model_url: Option<String>,
}

/// Fields accepted when creating or updating a camp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampDraft {
    pub name: String,
    pub description: String,
    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: f64,
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

pub struct Camps;

impl Resource for Camps {
    const PATH: &'static str = "/api/camps";
    type Model = Camp;
    type Draft = CampDraft;
}

pub type CampService = ResourceService<Camps>;
