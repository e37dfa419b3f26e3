//! Raw record types.
//!
//! A [`RawRecord`] is one observation as the user (or the dataset) describes
//! it: five real-valued conditions plus three categorical selections. Nothing
//! here is encoded yet; see [`crate::encoding`] for the numeric form.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;

use super::error::InputError;
use crate::encoding::SchemaMismatch;

// =============================================================================
// Categorical values
// =============================================================================

/// A categorical field value with a fixed label set.
pub trait Categorical: Copy + Sized + 'static {
    /// Field the value belongs to.
    const FIELD: CategoricalField;

    /// Every value, in declaration order.
    const ALL: &'static [Self];

    /// Label as it appears in datasets and inbound records.
    fn label(self) -> &'static str;

    /// Look up a value by its exact label.
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }
}

macro_rules! categorical_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $field:expr => { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = concat!("`", $label, "`")]
                $variant,
            )+
        }

        impl Categorical for $name {
            const FIELD: CategoricalField = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical_enum! {
    /// Household water-use activity.
    Activity: CategoricalField::Activity => {
        Shower => "Shower",
        HandWashing => "Hand Washing",
        Dishwashing => "Dishwashing",
        Laundry => "Laundry",
    }
}

categorical_enum! {
    /// Part of the day the activity happens in.
    TimeOfDay: CategoricalField::TimeOfDay => {
        Morning => "Morning",
        Afternoon => "Afternoon",
        Evening => "Evening",
    }
}

categorical_enum! {
    /// Season of the year.
    Season: CategoricalField::Season => {
        Spring => "Spring",
        Summer => "Summer",
        Autumn => "Autumn",
        Winter => "Winter",
    }
}

// =============================================================================
// Field identifiers
// =============================================================================

/// The three categorical fields, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoricalField {
    Activity,
    TimeOfDay,
    Season,
}

impl CategoricalField {
    /// All categorical fields in encoding order.
    pub const ALL: [CategoricalField; 3] = [Self::Activity, Self::TimeOfDay, Self::Season];

    /// Column name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Activity => "Activity",
            Self::TimeOfDay => "TimeOfDay",
            Self::Season => "Season",
        }
    }

    /// Labels of every value the field can take.
    pub fn labels(self) -> Vec<&'static str> {
        match self {
            Self::Activity => Activity::ALL.iter().map(|v| v.label()).collect(),
            Self::TimeOfDay => TimeOfDay::ALL.iter().map(|v| v.label()).collect(),
            Self::Season => Season::ALL.iter().map(|v| v.label()).collect(),
        }
    }

    /// Look up a field by column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five real-valued fields, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericField {
    ExternalTemp,
    RoomTemp,
    RoomHumidity,
    FlowRate,
    ColdWaterTemp,
}

impl NumericField {
    /// All numeric fields in encoding order.
    pub const ALL: [NumericField; 5] = [
        Self::ExternalTemp,
        Self::RoomTemp,
        Self::RoomHumidity,
        Self::FlowRate,
        Self::ColdWaterTemp,
    ];

    /// Column name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::ExternalTemp => "ExternalTemp",
            Self::RoomTemp => "RoomTemp",
            Self::RoomHumidity => "RoomHumidity",
            Self::FlowRate => "FlowRate",
            Self::ColdWaterTemp => "ColdWaterTemp",
        }
    }

    /// Inclusive range offered by the input form's slider.
    ///
    /// Informational only: values outside it are accepted.
    pub fn ui_range(self) -> (f64, f64) {
        match self {
            Self::ExternalTemp => (-5.0, 35.0),
            Self::RoomTemp => (0.0, 50.0),
            Self::RoomHumidity => (40.0, 80.0),
            Self::FlowRate => (5.0, 50.0),
            Self::ColdWaterTemp => (0.0, 30.0),
        }
    }

    /// Look up a field by column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RawRecord
// =============================================================================

/// One observation of household conditions, before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub activity: Activity,
    pub time_of_day: TimeOfDay,
    pub season: Season,
    pub external_temp: f64,
    pub room_temp: f64,
    pub room_humidity: f64,
    pub flow_rate: f64,
    pub cold_water_temp: f64,
}

impl RawRecord {
    /// Value of a numeric field.
    #[inline]
    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::ExternalTemp => self.external_temp,
            NumericField::RoomTemp => self.room_temp,
            NumericField::RoomHumidity => self.room_humidity,
            NumericField::FlowRate => self.flow_rate,
            NumericField::ColdWaterTemp => self.cold_water_temp,
        }
    }

    /// Label of the selected value of a categorical field.
    #[inline]
    pub fn category(&self, field: CategoricalField) -> &'static str {
        match field {
            CategoricalField::Activity => self.activity.label(),
            CategoricalField::TimeOfDay => self.time_of_day.label(),
            CategoricalField::Season => self.season.label(),
        }
    }

    /// Numeric fields whose value lies outside the form's slider range.
    pub fn out_of_ui_range(&self) -> Vec<NumericField> {
        NumericField::ALL
            .into_iter()
            .filter(|&f| {
                let (lo, hi) = f.ui_range();
                let v = self.numeric(f);
                v < lo || v > hi
            })
            .collect()
    }
}

/// A complete historical observation with its supervised target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingRow {
    pub record: RawRecord,
    /// Water temperature the user chose.
    pub desired_temp: f64,
}

// =============================================================================
// InboundRecord
// =============================================================================

/// Flat `key -> value` mapping handed over by the form layer.
///
/// Keys are the dataset column names (`Activity`, `TimeOfDay`, `Season`,
/// `ExternalTemp`, `RoomTemp`, `RoomHumidity`, `FlowRate`, `ColdWaterTemp`).
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRecord {
    fields: BTreeMap<String, String>,
}

impl InboundRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(key.into(), value.to_string());
        self
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    /// Raw value of a field, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Parse the mapping into a typed [`RawRecord`].
    ///
    /// A category label that is not part of the field's label set is a
    /// [`SchemaMismatch::UnseenCategory`]: no trained model can have an
    /// indicator for it.
    pub fn to_raw_record(&self) -> crate::Result<RawRecord> {
        let record = RawRecord {
            activity: self.category::<Activity>()?,
            time_of_day: self.category::<TimeOfDay>()?,
            season: self.category::<Season>()?,
            external_temp: self.number(NumericField::ExternalTemp)?,
            room_temp: self.number(NumericField::RoomTemp)?,
            room_humidity: self.number(NumericField::RoomHumidity)?,
            flow_rate: self.number(NumericField::FlowRate)?,
            cold_water_temp: self.number(NumericField::ColdWaterTemp)?,
        };

        for field in record.out_of_ui_range() {
            let (lo, hi) = field.ui_range();
            warn!(
                "{} = {} is outside the form range [{}, {}]",
                field,
                record.numeric(field),
                lo,
                hi
            );
        }

        Ok(record)
    }

    fn category<C: Categorical>(&self) -> crate::Result<C> {
        let field = C::FIELD.name();
        let raw = self
            .get(field)
            .ok_or(InputError::MissingField { field })?
            .trim();
        C::from_label(raw).ok_or_else(|| {
            SchemaMismatch::UnseenCategory {
                field,
                value: raw.to_string(),
            }
            .into()
        })
    }

    fn number(&self, field: NumericField) -> Result<f64, InputError> {
        let name = field.name();
        let raw = self.get(name).ok_or(InputError::MissingField { field: name })?;
        let value: f64 = raw.trim().parse().map_err(|_| InputError::InvalidNumber {
            field: name,
            value: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(InputError::NonFinite { field: name, value });
        }
        Ok(value)
    }
}

impl From<&RawRecord> for InboundRecord {
    fn from(record: &RawRecord) -> Self {
        let mut inbound = InboundRecord::new();
        for field in CategoricalField::ALL {
            inbound.insert(field.name(), record.category(field));
        }
        for field in NumericField::ALL {
            inbound.insert(field.name(), record.numeric(field).to_string());
        }
        inbound
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InboundRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
