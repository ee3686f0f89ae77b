// Diagnostics derivations for the detail panel
use crate::domain::device::Position;

/// Battery readout, clamped to 0-100. Anything missing renders as the
/// "unknown" placeholder.
pub fn battery_display(battery: Option<f64>) -> String {
    match battery {
        Some(level) => format!("{:.0}%", level.clamp(0.0, 100.0)),
        None => "unknown".to_string(),
    }
}

/// Coarse compass direction from a heading in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    North,
    East,
    South,
    West,
}

impl CompassPoint {
    pub fn arrow(&self) -> &'static str {
        match self {
            CompassPoint::North => "\u{2191}",
            CompassPoint::East => "\u{2192}",
            CompassPoint::South => "\u{2193}",
            CompassPoint::West => "\u{2190}",
        }
    }
}

/// Buckets: (45,135] east, (135,225] south, (225,315] west, everything else
/// north. Headings outside [0,360) are wrapped first.
pub fn compass_point(heading: f64) -> CompassPoint {
    let wrapped = heading.rem_euclid(360.0);
    if wrapped > 45.0 && wrapped <= 135.0 {
        CompassPoint::East
    } else if wrapped > 135.0 && wrapped <= 225.0 {
        CompassPoint::South
    } else if wrapped > 225.0 && wrapped <= 315.0 {
        CompassPoint::West
    } else {
        CompassPoint::North
    }
}

/// Best-effort classification of where a fix came from. There is no
/// authoritative backend field for this; it is display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Gps,
    Wifi,
    Cell,
    Unknown,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Gps => "gps",
            LocationSource::Wifi => "wifi",
            LocationSource::Cell => "cell",
            LocationSource::Unknown => "unknown",
        }
    }
}

pub fn location_source(fix: &Position) -> LocationSource {
    if let Some(source) = fix.source.as_deref() {
        match source.to_ascii_lowercase().as_str() {
            "gps" | "gnss" => return LocationSource::Gps,
            "wifi" => return LocationSource::Wifi,
            "cell" | "cellular" => return LocationSource::Cell,
            _ => {}
        }
    }

    if fix.satellites.map(|n| n > 0).unwrap_or(false) {
        return LocationSource::Gps;
    }

    if let Some(network) = fix.network.as_deref() {
        let network = network.to_ascii_lowercase();
        if network.contains("wifi") {
            return LocationSource::Wifi;
        }
        // Remaining network hints are radio technology names (lte, gsm, ...)
        return LocationSource::Cell;
    }

    LocationSource::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::Position;

    #[test]
    fn test_battery_clamps_and_falls_back() {
        assert_eq!(battery_display(Some(87.4)), "87%");
        assert_eq!(battery_display(Some(130.0)), "100%");
        assert_eq!(battery_display(Some(-5.0)), "0%");
        assert_eq!(battery_display(None), "unknown");
    }

    #[test]
    fn test_compass_buckets() {
        assert_eq!(compass_point(0.0), CompassPoint::North);
        assert_eq!(compass_point(45.0), CompassPoint::North);
        assert_eq!(compass_point(45.1), CompassPoint::East);
        assert_eq!(compass_point(135.0), CompassPoint::East);
        assert_eq!(compass_point(180.0), CompassPoint::South);
        assert_eq!(compass_point(225.0), CompassPoint::South);
        assert_eq!(compass_point(270.0), CompassPoint::West);
        assert_eq!(compass_point(315.0), CompassPoint::West);
        assert_eq!(compass_point(316.0), CompassPoint::North);
        assert_eq!(compass_point(405.0), CompassPoint::North);
        assert_eq!(compass_point(-90.0), CompassPoint::West);
    }

    #[test]
    fn test_location_source_heuristic() {
        let mut fix = Position::at(0.0, 0.0);
        assert_eq!(location_source(&fix), LocationSource::Unknown);

        fix.satellites = Some(7);
        assert_eq!(location_source(&fix), LocationSource::Gps);

        fix.satellites = Some(0);
        fix.network = Some("wifi-2.4ghz".to_string());
        assert_eq!(location_source(&fix), LocationSource::Wifi);

        fix.network = Some("lte".to_string());
        assert_eq!(location_source(&fix), LocationSource::Cell);

        // An explicit source field wins over every other hint
        fix.source = Some("GPS".to_string());
        assert_eq!(location_source(&fix), LocationSource::Gps);
    }
}
