/// Kilometers light travels in one second.
pub const LIGHT_SECOND_KM: f64 = 299_792.458;

/// Kilometers in one astronomical unit.
pub const ASTRONOMICAL_UNIT_KM: f64 = 149_597_870.7;

/// Light-time unit a subscriber wants to be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    LightSecond,
    LightMinute,
    LightHour,
}

impl DistanceUnit {
    pub fn parse(unit: String) -> Result<DistanceUnit, String> {
        match unit.as_str() {
            "light_second" => Ok(DistanceUnit::LightSecond),
            "light_minute" => Ok(DistanceUnit::LightMinute),
            "light_hour" => Ok(DistanceUnit::LightHour),
            _ => Err(format!("{} is not a valid distance unit", unit)),
        }
    }

    /// Distance covered by light in this unit of time, in kilometers.
    pub fn kilometers(&self) -> f64 {
        match self {
            DistanceUnit::LightSecond => LIGHT_SECOND_KM,
            DistanceUnit::LightMinute => LIGHT_SECOND_KM * 60.0,
            DistanceUnit::LightHour => LIGHT_SECOND_KM * 3600.0,
        }
    }

    /// Human readable name, e.g. "light minute".
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::LightSecond => "light second",
            DistanceUnit::LightMinute => "light minute",
            DistanceUnit::LightHour => "light hour",
        }
    }
}

impl AsRef<str> for DistanceUnit {
    fn as_ref(&self) -> &str {
        match self {
            DistanceUnit::LightSecond => "light_second",
            DistanceUnit::LightMinute => "light_minute",
            DistanceUnit::LightHour => "light_hour",
        }
    }
}
