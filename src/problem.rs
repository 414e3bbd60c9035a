//! Orders, vehicles and the input files they are read from.

use crate::error::{Result, RoutingError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }

    /// Latitude and longitude converted to radians.
    pub fn to_radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lon.to_radians())
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// The region an order was clustered into.
///
/// `Unclustered` marks points the density method could not place in any
/// dense cluster. It sorts after every real cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionId {
    Cluster(u32),
    Unclustered,
}

impl RegionId {
    pub fn cluster(&self) -> Option<u32> {
        match self {
            RegionId::Cluster(id) => Some(*id),
            RegionId::Unclustered => None,
        }
    }

    pub fn is_unclustered(&self) -> bool {
        matches!(self, RegionId::Unclustered)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Cluster(id) => write!(f, "{}", id),
            RegionId::Unclustered => write!(f, "unclustered"),
        }
    }
}

/// A delivery order. Pipeline stages fill in the mutable fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub coordinate: Option<Coordinate>,
    pub weight: f64,
    pub boxes: u32,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    /// Set by the clusterer
    #[serde(default)]
    pub region: Option<RegionId>,
    /// 0 while unassigned
    #[serde(default)]
    pub load_id: u32,
    /// Empty while unassigned
    #[serde(default)]
    pub vehicle_id: String,
    /// Position in the region route
    #[serde(default)]
    pub sequence_index: Option<usize>,
    /// `"{load_id}-{position}"` for assigned orders
    #[serde(default)]
    pub delivery_label: Option<String>,
}

impl Order {
    /// Create a new, unassigned order.
    pub fn new(id: impl Into<String>, coordinate: Coordinate, weight: f64, boxes: u32) -> Self {
        Order {
            id: id.into(),
            coordinate: Some(coordinate),
            weight,
            boxes,
            address: String::new(),
            city: String::new(),
            region: None,
            load_id: 0,
            vehicle_id: String::new(),
            sequence_index: None,
            delivery_label: None,
        }
    }

    /// Set the delivery city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set the free-text address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.load_id != 0
    }

    /// The coordinate, or `InvalidInput` when it is missing or not finite.
    pub fn require_coordinate(&self) -> Result<Coordinate> {
        match self.coordinate {
            Some(coordinate) if coordinate.is_finite() => Ok(coordinate),
            Some(_) => Err(RoutingError::InvalidInput(format!(
                "order {} has a non-finite coordinate",
                self.id
            ))),
            None => Err(RoutingError::InvalidInput(format!(
                "order {} has no coordinate",
                self.id
            ))),
        }
    }
}

/// A vehicle of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Plate or other identifier
    pub id: String,
    pub weight_capacity: f64,
    pub box_capacity: f64,
    #[serde(deserialize_with = "deserialize_availability", default = "default_available")]
    pub available: bool,
}

impl Vehicle {
    /// Create a new, available vehicle.
    pub fn new(id: impl Into<String>, weight_capacity: f64, box_capacity: f64) -> Self {
        Vehicle {
            id: id.into(),
            weight_capacity,
            box_capacity,
            available: true,
        }
    }

    /// Mark the vehicle as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// A copy with both capacities scaled by `percentage` (0-100).
    pub fn scaled(&self, percentage: f64) -> Vehicle {
        let factor = percentage / 100.0;
        Vehicle {
            id: self.id.clone(),
            weight_capacity: self.weight_capacity * factor,
            box_capacity: self.box_capacity * factor,
            available: self.available,
        }
    }
}

fn default_available() -> bool {
    true
}

/// Parse the textual availability flags found in fleet sheets.
pub fn parse_availability(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "sim" | "ativo" | "yes" | "true" | "1" | "available"
    )
}

fn deserialize_availability<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Number(number) => number != 0,
        Flag::Text(text) => parse_availability(&text),
    })
}

/// Flat order row as found in CSV exports.
#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    weight: f64,
    boxes: u32,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let coordinate = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        };

        Order {
            id: row.id,
            coordinate,
            weight: row.weight,
            boxes: row.boxes,
            address: row.address,
            city: row.city,
            region: None,
            load_id: 0,
            vehicle_id: String::new(),
            sequence_index: None,
            delivery_label: None,
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Load orders from a CSV or JSON file, chosen by extension.
pub fn load_orders<P: AsRef<Path>>(path: P) -> Result<Vec<Order>> {
    let path = path.as_ref();

    if is_csv(path) {
        let mut reader = csv::Reader::from_path(path)?;
        let mut orders = Vec::new();
        for row in reader.deserialize::<OrderRow>() {
            orders.push(Order::from(row?));
        }
        Ok(orders)
    } else {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Load vehicles from a CSV or JSON file, chosen by extension.
pub fn load_vehicles<P: AsRef<Path>>(path: P) -> Result<Vec<Vehicle>> {
    let path = path.as_ref();

    if is_csv(path) {
        let mut reader = csv::Reader::from_path(path)?;
        let mut vehicles = Vec::new();
        for row in reader.deserialize::<Vehicle>() {
            vehicles.push(row?);
        }
        Ok(vehicles)
    } else {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Check the fields every stage relies on.
pub fn validate_orders(orders: &[Order]) -> Result<()> {
    if orders.is_empty() {
        return Err(RoutingError::InvalidInput("order set is empty".to_string()));
    }

    for order in orders {
        order.require_coordinate()?;
        if !order.weight.is_finite() || order.weight < 0.0 {
            return Err(RoutingError::InvalidInput(format!(
                "order {} has an invalid weight {}",
                order.id, order.weight
            )));
        }
    }

    Ok(())
}
