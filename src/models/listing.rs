use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A listing exactly as the upstream MLS API returns it.
///
/// The feed is inconsistent across boards: prices and flags arrive as
/// numbers, strings or booleans, and several fields have two spellings
/// (`soldPrice`/`closePrice`, `daysOnMarket`/`dom`). The accessors below
/// fold those variants into one answer each; nothing outside this module
/// should reach into the raw fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "mlsNumber", default)]
    pub mls_number: Option<String>,
    #[serde(rename = "listingId", default)]
    pub listing_id: Option<String>,
    #[serde(default)]
    pub address: RawAddress,
    #[serde(rename = "listPrice", default)]
    pub list_price: Option<f64>,
    #[serde(rename = "soldPrice", default)]
    pub sold_price: Option<f64>,
    #[serde(rename = "closePrice", default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub details: RawDetails,
    #[serde(default)]
    pub lot: RawLot,
    #[serde(rename = "standardStatus", default)]
    pub standard_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "listDate", default)]
    pub list_date: Option<String>,
    #[serde(default)]
    pub timestamps: RawTimestamps,
    #[serde(rename = "soldDate", default)]
    pub sold_date: Option<String>,
    #[serde(rename = "closeDate", default)]
    pub close_date: Option<String>,
    #[serde(rename = "daysOnMarket", default)]
    pub days_on_market: Option<u32>,
    #[serde(default)]
    pub dom: Option<u32>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub map: RawMap,
    #[serde(default)]
    pub rooms: Vec<RawRoom>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAddress {
    #[serde(rename = "streetNumber", default)]
    pub street_number: Option<String>,
    #[serde(rename = "streetName", default)]
    pub street_name: Option<String>,
    #[serde(rename = "streetSuffix", default)]
    pub street_suffix: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDetails {
    #[serde(rename = "numBedrooms", default)]
    pub num_bedrooms: Option<f64>,
    #[serde(rename = "numBathrooms", default)]
    pub num_bathrooms: Option<f64>,
    #[serde(rename = "numBathroomsHalf", default)]
    pub num_bathrooms_half: Option<f64>,
    #[serde(default)]
    pub sqft: Option<Value>,
    #[serde(rename = "yearBuilt", default)]
    pub year_built: Option<Value>,
    #[serde(rename = "propertyType", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub waterfront: Option<Value>,
    #[serde(rename = "HOAFee", default)]
    pub hoa_fee: Option<Value>,
    #[serde(rename = "swimmingPool", default)]
    pub swimming_pool: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLot {
    #[serde(default)]
    pub acres: Option<Value>,
    #[serde(rename = "lotSizeArea", default)]
    pub lot_size_area: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTimestamps {
    #[serde(rename = "listDate", default)]
    pub list_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMap {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRoom {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(rename = "type", alias = "description", default)]
    pub room_type: Option<String>,
}

/// Coerce a numeric-or-string JSON value into f64. "n/a" and friends
/// come back as None.
fn value_as_f64(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

impl RawListing {
    pub fn mls_number(&self) -> &str {
        self.mls_number
            .as_deref()
            .or(self.listing_id.as_deref())
            .unwrap_or("")
    }

    pub fn status_label(&self) -> &str {
        self.standard_status
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or("")
    }

    pub fn sold_price(&self) -> Option<f64> {
        self.sold_price
            .or(self.close_price)
            .filter(|p| *p > 0.0)
    }

    pub fn list_date(&self) -> Option<&str> {
        self.list_date
            .as_deref()
            .or(self.timestamps.list_date.as_deref())
    }

    pub fn sold_date(&self) -> Option<&str> {
        self.sold_date.as_deref().or(self.close_date.as_deref())
    }

    pub fn days_on_market(&self) -> u32 {
        self.days_on_market.or(self.dom).unwrap_or(0)
    }

    pub fn photos(&self) -> Vec<String> {
        self.images
            .clone()
            .or_else(|| self.photos.clone())
            .unwrap_or_default()
    }

    pub fn subdivision(&self) -> &str {
        self.address.neighborhood.as_deref().unwrap_or("")
    }

    pub fn sqft(&self) -> u32 {
        value_as_f64(&self.details.sqft).unwrap_or(0.0).round() as u32
    }

    pub fn year_built(&self) -> u32 {
        value_as_f64(&self.details.year_built).unwrap_or(0.0).round() as u32
    }

    pub fn lot_acres(&self) -> f64 {
        value_as_f64(&self.lot.acres)
            .or_else(|| value_as_f64(&self.lot.lot_size_area))
            .unwrap_or(0.0)
    }

    /// Total bathroom count as reported, fractional halves included.
    pub fn baths(&self) -> f64 {
        self.details.num_bathrooms.unwrap_or(0.0)
    }

    pub fn half_baths(&self) -> u32 {
        self.details.num_bathrooms_half.unwrap_or(0.0).round() as u32
    }

    /// Full baths = total minus reported halves, floored at zero.
    pub fn full_baths(&self) -> u32 {
        let total = self.baths().floor() as i64;
        let halves = self.half_baths() as i64;
        (total - halves).max(0) as u32
    }

    /// Waterfront arrives as a bool on some boards and a feature string
    /// ("Lake Front") on others.
    pub fn is_waterfront(&self) -> bool {
        match &self.details.waterfront {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                !s.is_empty() && !s.eq_ignore_ascii_case("none") && !s.eq_ignore_ascii_case("no")
            }
            _ => false,
        }
    }

    pub fn has_hoa(&self) -> bool {
        match &self.details.hoa_fee {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) > 0.0,
            Some(Value::String(s)) => {
                let s = s.trim();
                !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("none")
            }
            _ => false,
        }
    }
}

/// The canonical property record returned to the front end.
///
/// Missing numerics become 0; missing prices and dates stay `None` so the
/// client can tell "no data" from "zero".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProperty {
    pub mls_number: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub list_price: f64,
    pub sold_price: Option<f64>,
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub lot_acres: f64,
    pub year_built: u32,
    pub property_type: String,
    pub status: String,
    pub list_date: Option<String>,
    pub sold_date: Option<String>,
    pub days_on_market: u32,
    pub photos: Vec<String>,
    pub subdivision: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NormalizedProperty {
    pub fn from_raw(raw: &RawListing) -> Self {
        Self {
            mls_number: raw.mls_number().to_string(),
            address: compose_street_address(&raw.address),
            city: raw.address.city.clone().unwrap_or_default(),
            state: raw.address.state.clone().unwrap_or_default(),
            zip: raw.address.zip.clone().unwrap_or_default(),
            list_price: raw.list_price.unwrap_or(0.0),
            sold_price: raw.sold_price(),
            beds: raw.details.num_bedrooms.unwrap_or(0.0).round() as u32,
            baths: raw.baths(),
            sqft: raw.sqft(),
            lot_acres: raw.lot_acres(),
            year_built: raw.year_built(),
            property_type: raw
                .details
                .property_type
                .clone()
                .or_else(|| raw.details.style.clone())
                .unwrap_or_default(),
            status: raw.status_label().to_string(),
            list_date: raw.list_date().map(str::to_string),
            sold_date: raw.sold_date().map(str::to_string),
            days_on_market: raw.days_on_market(),
            photos: raw.photos(),
            subdivision: raw.subdivision().to_string(),
            latitude: raw.map.latitude,
            longitude: raw.map.longitude,
        }
    }
}

fn compose_street_address(address: &RawAddress) -> String {
    [
        address.street_number.as_deref(),
        address.street_name.as_deref(),
        address.street_suffix.as_deref(),
    ]
    .iter()
    .flatten()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
