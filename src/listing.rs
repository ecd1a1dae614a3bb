//! Listing record and the field dispatch that feeds it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::{format_phone_input, format_price_input};
use crate::{Error, Result};

/// Longest headline accepted by the form, in characters.
pub const HEADLINE_MAX_CHARS: usize = 30;

pub const DEFAULT_LOCATION: &str = "İl, İlçe, Mahalle";
pub const DEFAULT_HEADLINE: &str = "30 Karakterlik İlan Başlığı";

/// Marketing transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingType {
    #[serde(rename = "Satılık")]
    ForSale,
    #[serde(rename = "Kiralık")]
    ForRent,
    #[serde(rename = "Devren Satılık")]
    TransferSale,
    #[serde(rename = "Kat Karşılığı")]
    FlatForLand,
}

impl ListingType {
    pub const ALL: [ListingType; 4] = [
        ListingType::ForSale,
        ListingType::ForRent,
        ListingType::TransferSale,
        ListingType::FlatForLand,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingType::ForSale => "Satılık",
            ListingType::ForRent => "Kiralık",
            ListingType::TransferSale => "Devren Satılık",
            ListingType::FlatForLand => "Kat Karşılığı",
        }
    }
}

/// Property kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioType {
    #[serde(rename = "Konut")]
    Residence,
    #[serde(rename = "Lüks Konut")]
    LuxuryResidence,
    #[serde(rename = "Mağaza")]
    Store,
    #[serde(rename = "Ofis")]
    Office,
    #[serde(rename = "Atölye")]
    Workshop,
    #[serde(rename = "Fabrika")]
    Factory,
    #[serde(rename = "Tarla")]
    Field,
    #[serde(rename = "Arsa")]
    Land,
}

impl PortfolioType {
    pub const ALL: [PortfolioType; 8] = [
        PortfolioType::Residence,
        PortfolioType::LuxuryResidence,
        PortfolioType::Store,
        PortfolioType::Office,
        PortfolioType::Workshop,
        PortfolioType::Factory,
        PortfolioType::Field,
        PortfolioType::Land,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PortfolioType::Residence => "Konut",
            PortfolioType::LuxuryResidence => "Lüks Konut",
            PortfolioType::Store => "Mağaza",
            PortfolioType::Office => "Ofis",
            PortfolioType::Workshop => "Atölye",
            PortfolioType::Factory => "Fabrika",
            PortfolioType::Field => "Tarla",
            PortfolioType::Land => "Arsa",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for PortfolioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ListingType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| Error::InvalidOption {
                field: Field::ListingType.name(),
                value: s.to_string(),
            })
    }
}

impl FromStr for PortfolioType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        PortfolioType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| Error::InvalidOption {
                field: Field::PortfolioType.name(),
                value: s.to_string(),
            })
    }
}

/// All form values of a single listing.
///
/// Phone and price hold their formatted display strings; select fields are
/// `None` until a value is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    pub consultant_name: String,
    pub gsm_number: String,
    pub listing_type: Option<ListingType>,
    pub portfolio_type: Option<PortfolioType>,
    pub price: String,
    pub location: String,
    pub headline: String,
}

impl Default for ListingData {
    fn default() -> Self {
        Self {
            consultant_name: String::new(),
            gsm_number: String::new(),
            listing_type: None,
            portfolio_type: None,
            price: String::new(),
            location: DEFAULT_LOCATION.to_string(),
            headline: DEFAULT_HEADLINE.to_string(),
        }
    }
}

impl ListingData {
    /// Current raw text of a field, as an input control would show it.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::ConsultantName => &self.consultant_name,
            Field::GsmNumber => &self.gsm_number,
            Field::ListingType => self.listing_type.map(ListingType::label).unwrap_or(""),
            Field::PortfolioType => self.portfolio_type.map(PortfolioType::label).unwrap_or(""),
            Field::Price => &self.price,
            Field::Location => &self.location,
            Field::Headline => &self.headline,
        }
    }
}

/// Identifies one input control of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ConsultantName,
    GsmNumber,
    ListingType,
    PortfolioType,
    Price,
    Location,
    Headline,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::ConsultantName,
        Field::GsmNumber,
        Field::ListingType,
        Field::PortfolioType,
        Field::Price,
        Field::Location,
        Field::Headline,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::ConsultantName => "consultantName",
            Field::GsmNumber => "gsmNumber",
            Field::ListingType => "listingType",
            Field::PortfolioType => "portfolioType",
            Field::Price => "price",
            Field::Location => "location",
            Field::Headline => "headline",
        }
    }

    /// Route raw input to the field's formatter and store the result.
    ///
    /// Select fields accept their exact labels or empty text (unselected);
    /// anything else is rejected and the stored value is left untouched.
    pub fn apply(self, data: &mut ListingData, raw: &str) -> Result<()> {
        match self {
            Field::ConsultantName => data.consultant_name = raw.to_string(),
            Field::GsmNumber => data.gsm_number = format_phone_input(raw),
            Field::ListingType => data.listing_type = parse_option(raw)?,
            Field::PortfolioType => data.portfolio_type = parse_option(raw)?,
            Field::Price => data.price = format_price_input(raw),
            Field::Location => data.location = raw.to_string(),
            Field::Headline => data.headline = raw.chars().take(HEADLINE_MAX_CHARS).collect(),
        }
        Ok(())
    }
}

fn parse_option<T: FromStr<Err = Error>>(raw: &str) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

/// Raw form input loaded in one go, e.g. from a JSON file.
///
/// Every present value goes through `Field::apply`, in form order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingInput {
    pub consultant_name: Option<String>,
    pub gsm_number: Option<String>,
    pub listing_type: Option<String>,
    pub portfolio_type: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub headline: Option<String>,
}

impl ListingInput {
    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::ConsultantName => self.consultant_name.as_deref(),
            Field::GsmNumber => self.gsm_number.as_deref(),
            Field::ListingType => self.listing_type.as_deref(),
            Field::PortfolioType => self.portfolio_type.as_deref(),
            Field::Price => self.price.as_deref(),
            Field::Location => self.location.as_deref(),
            Field::Headline => self.headline.as_deref(),
        }
    }

    /// Present values paired with their field, in form order.
    pub fn entries(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |f| self.value(f).map(|v| (f, v)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::ConfigError(format!("invalid listing input: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_form() {
        let d = ListingData::default();
        assert_eq!(d.location, "İl, İlçe, Mahalle");
        assert_eq!(d.headline, "30 Karakterlik İlan Başlığı");
        assert!(d.gsm_number.is_empty());
        assert!(d.listing_type.is_none());
    }

    #[test]
    fn dispatch_routes_phone_and_price_through_formatters() {
        let mut d = ListingData::default();
        Field::GsmNumber.apply(&mut d, "5551234567").unwrap();
        Field::Price.apply(&mut d, "3500000").unwrap();
        Field::ConsultantName.apply(&mut d, "  Ayşe Yılmaz ").unwrap();
        assert_eq!(d.gsm_number, "(555) 123 45 67");
        assert_eq!(d.price, "3.500.000 TL");
        assert_eq!(d.consultant_name, "  Ayşe Yılmaz ");
    }

    #[test]
    fn headline_is_capped_by_characters() {
        let mut d = ListingData::default();
        let long = "Ğ".repeat(40);
        Field::Headline.apply(&mut d, &long).unwrap();
        assert_eq!(d.headline.chars().count(), HEADLINE_MAX_CHARS);
    }

    #[test]
    fn select_fields_reject_unknown_labels() {
        let mut d = ListingData::default();
        Field::ListingType.apply(&mut d, "Kiralık").unwrap();
        assert_eq!(d.listing_type, Some(ListingType::ForRent));

        let err = Field::ListingType.apply(&mut d, "Takas").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { field: "listingType", .. }));
        assert_eq!(d.listing_type, Some(ListingType::ForRent));

        Field::ListingType.apply(&mut d, "").unwrap();
        assert_eq!(d.listing_type, None);
    }

    #[test]
    fn option_labels_round_trip_through_from_str() {
        for t in PortfolioType::ALL {
            assert_eq!(t.label().parse::<PortfolioType>().unwrap(), t);
        }
        assert_eq!(ListingType::ALL.len(), 4);
        assert_eq!(PortfolioType::ALL.len(), 8);
    }

    #[test]
    fn get_reflects_stored_values() {
        let mut d = ListingData::default();
        Field::PortfolioType.apply(&mut d, "Lüks Konut").unwrap();
        assert_eq!(d.get(Field::PortfolioType), "Lüks Konut");
        assert_eq!(d.get(Field::ListingType), "");
    }

    #[test]
    fn input_json_uses_form_field_names() {
        let input = ListingInput::from_json(
            r#"{"gsmNumber": "555 123 45 67", "price": "1250000", "listingType": "Satılık"}"#,
        )
        .unwrap();
        let fields: Vec<Field> = input.entries().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::GsmNumber, Field::ListingType, Field::Price]);
        assert!(ListingInput::from_json("{").is_err());
    }

    #[test]
    fn listing_serializes_labels() {
        let mut d = ListingData::default();
        Field::ListingType.apply(&mut d, "Devren Satılık").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["listingType"], "Devren Satılık");
        assert_eq!(json["portfolioType"], serde_json::Value::Null);
    }
}
