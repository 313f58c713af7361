use serde::{Deserialize, Serialize};

use super::{Resource, ResourceService};

/// Vehicle used for camper transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(alias = "Id", alias = "vehicleId", alias = "VehicleId", alias = "vehicle_id")]
    pub id: i64,

    #[serde(
        alias = "PlateNumber",
        alias = "plate_number",
        alias = "licensePlate",
        alias = "LicensePlate",
        alias = "plate"
    )]
    pub plate_number: String,

    #[serde(default, alias = "Model", alias = "vehicleModel", alias = "VehicleModel")]
    pub model: String,

    #[serde(default, alias = "Capacity", alias = "seats", alias = "Seats")]
    pub capacity: u32,

    #[serde(default, alias = "DriverName", alias = "driver_name", alias = "driver")]
    pub driver_name: Option<String>,

    #[serde(default, alias = "Status")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub plate_number: String,
    pub model: String,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

pub struct Vehicles;

impl Resource for Vehicles {
    const PATH: &'static str = "/api/vehicles";
    type Model = Vehicle;
    type Draft = VehicleDraft;
}

pub type VehicleService = ResourceService<Vehicles>;
