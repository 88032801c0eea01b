use crate::domain::distance_unit::{DistanceUnit, ASTRONOMICAL_UNIT_KM, LIGHT_SECOND_KM};

/// Rendered email ready to be handed to an `EmailSender`.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Figures shown to a subscriber once the spacecraft crossed their threshold.
pub struct DistanceReport<'a> {
    pub spacecraft: &'a str,
    pub unit: DistanceUnit,
    pub distance_km: f64,
}

impl DistanceReport<'_> {
    pub fn million_km(&self) -> f64 {
        self.distance_km / 1e6
    }

    pub fn astronomical_units(&self) -> f64 {
        self.distance_km / ASTRONOMICAL_UNIT_KM
    }

    pub fn light_seconds(&self) -> f64 {
        self.distance_km / LIGHT_SECOND_KM
    }

    pub fn subject(&self) -> String {
        format!("{} moved {}", self.spacecraft, self.unit.label())
    }

    pub fn render(&self) -> EmailContent {
        EmailContent {
            subject: self.subject(),
            text_body: self.render_text(),
            html_body: self.render_html(),
        }
    }

    fn render_text(&self) -> String {
        format!(
            r#"{spacecraft} Distance Update

{spacecraft} has traveled another {unit} through space!

Current distance from Earth: {million_km:.2} million km
In Astronomical Units: {au:.2} AU
Light travel time: {light_seconds:.1} seconds

This incredible spacecraft continues its journey through interstellar space,
carrying humanity's message to the stars.

Data courtesy of NASA JPL Horizons System.
"#,
            spacecraft = self.spacecraft,
            unit = self.unit.label(),
            million_km = self.million_km(),
            au = self.astronomical_units(),
            light_seconds = self.light_seconds(),
        )
    }

    fn render_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{spacecraft} Update</title>
</head>
<body style="margin: 0; padding: 0; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #0a0a0a; color: #ffffff;">
    <div style="max-width: 600px; margin: 0 auto; background: #1a1a2e; border-radius: 20px; overflow: hidden;">
        <div style="background: linear-gradient(45deg, #667eea 0%, #764ba2 100%); padding: 40px 30px; text-align: center;">
            <h1 style="margin: 0; font-size: 28px; font-weight: 300; letter-spacing: 2px;">{spacecraft_upper}</h1>
            <p style="margin: 10px 0 0 0; font-size: 14px; opacity: 0.8; letter-spacing: 1px;">DEEP SPACE EXPLORER</p>
        </div>
        <div style="padding: 40px 30px;">
            <h2 style="color: #667eea; font-size: 24px; margin: 0 0 10px 0; font-weight: 300;">Journey Update</h2>
            <p style="font-size: 16px; line-height: 1.6;">{spacecraft} has traveled another <strong style="color: #667eea;">{unit}</strong> through the cosmos!</p>
            <table style="width: 100%; margin: 30px 0; border-left: 4px solid #667eea; padding: 25px;">
                <tr><td style="color: #cccccc;">Distance from Earth:</td><td style="color: #667eea; font-weight: 600;">{million_km:.2} million km</td></tr>
                <tr><td style="color: #cccccc;">In Astronomical Units:</td><td style="color: #667eea; font-weight: 600;">{au:.2} AU</td></tr>
                <tr><td style="color: #cccccc;">Light Travel Time:</td><td style="color: #667eea; font-weight: 600;">{light_seconds:.1} seconds</td></tr>
            </table>
            <p style="font-size: 14px; line-height: 1.6; opacity: 0.9;">
                Launched in 1977, {spacecraft} continues its incredible journey through interstellar space,
                carrying humanity's message to the stars on the Golden Record.
            </p>
            <p style="margin-top: 40px; font-size: 12px; opacity: 0.6; text-align: center;">
                This notification was sent because you subscribed to {spacecraft} distance updates.<br>
                Data courtesy of NASA JPL Horizons System.
            </p>
        </div>
    </div>
</body>
</html>
"#,
            spacecraft = self.spacecraft,
            spacecraft_upper = self.spacecraft.to_uppercase(),
            unit = self.unit.label(),
            million_km = self.million_km(),
            au = self.astronomical_units(),
            light_seconds = self.light_seconds(),
        )
    }
}
