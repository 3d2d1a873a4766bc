//! Mock weather lookup over a fixed table.

use toolchat_core::registry::{DomainError, ToolOutput};
use toolchat_core::schema::{ObjectSchema, PropertySchema, SchemaError, ToolDeclaration};
use toolchat_core::validation::ToolArguments;

pub const NAME: &str = "get_weather";

struct Report {
    city: &'static str,
    celsius: f64,
    conditions: &'static str,
    humidity: u8,
}

const REPORTS: [Report; 6] = [
    Report { city: "Tokyo", celsius: 22.0, conditions: "Partly cloudy", humidity: 65 },
    Report { city: "London", celsius: 15.0, conditions: "Light rain", humidity: 80 },
    Report { city: "New York", celsius: 18.0, conditions: "Sunny", humidity: 55 },
    Report { city: "Jakarta", celsius: 31.0, conditions: "Thunderstorms", humidity: 85 },
    Report { city: "Sydney", celsius: 24.0, conditions: "Clear", humidity: 60 },
    Report { city: "Paris", celsius: 17.0, conditions: "Overcast", humidity: 70 },
];

pub fn declaration() -> Result<ToolDeclaration, SchemaError> {
    let schema = ObjectSchema::new(
        [
            ("city", PropertySchema::string("City name, e.g. Tokyo")),
            (
                "unit",
                PropertySchema::string("Temperature unit, celsius when omitted")
                    .with_enum(["celsius", "fahrenheit"]),
            ),
        ],
        ["city"],
    )?;
    let cities: Vec<&str> = known_cities().collect();
    Ok(ToolDeclaration::new(
        NAME,
        format!(
            "Returns the current (mock) weather for a city. Known cities: {}",
            cities.join(", ")
        ),
        schema,
    ))
}

pub fn handle(arguments: ToolArguments) -> Result<ToolOutput, DomainError> {
    let city = arguments.str("city").unwrap_or_default().trim();
    let report = REPORTS
        .iter()
        .find(|report| report.city.eq_ignore_ascii_case(city))
        .ok_or_else(|| DomainError::new(format!("No weather data for city: {city}")))?;

    let (temperature, symbol) = match arguments.str("unit") {
        Some("fahrenheit") => (report.celsius * 9.0 / 5.0 + 32.0, "°F"),
        _ => (report.celsius, "°C"),
    };

    Ok(ToolOutput::text(format!(
        "Weather in {}: {}{symbol}, {}, humidity {}%",
        report.city,
        super::calculator::format_number(temperature),
        report.conditions,
        report.humidity
    )))
}

/// Cities the table knows about, in table order.
pub fn known_cities() -> impl Iterator<Item = &'static str> {
    REPORTS.iter().map(|report| report.city)
}
