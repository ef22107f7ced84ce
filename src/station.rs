use serde::{Deserialize, Deserializer};

use crate::util::is_placeholder_date;

/// One row of the station listing for a department.
#[derive(Debug, Clone, Deserialize)]
pub struct StationSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
}

/// Descriptive metadata of a single station.
///
/// Optional fields come from nested reply arrays that are sometimes absent;
/// a missing piece degrades to `None` rather than failing the whole record.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Location label (`lieuDit`).
    pub locality: Option<String>,
    /// Hydrological basin (`bassin`).
    pub basin: Option<String>,
    /// Operational start date, as reported.
    pub opened: Option<String>,
    /// Operational end date. `None` means still active; far-future
    /// placeholder values are normalized to `None` too.
    pub closed: Option<String>,
    /// Type classification, first entry of `typesPoste`.
    pub kind: Option<i64>,
    pub altitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStation {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "nom")]
    name: String,
    #[serde(default, rename = "lieuDit")]
    locality: Option<String>,
    #[serde(default, rename = "bassin")]
    basin: Option<String>,
    #[serde(default, rename = "dateDebut")]
    opened: Option<String>,
    #[serde(default, rename = "dateFin")]
    closed: Option<String>,
    #[serde(default, rename = "typesPoste")]
    kinds: Vec<RawKind>,
    #[serde(default)]
    positions: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
struct RawKind {
    #[serde(default, rename = "type")]
    kind: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(default)]
    altitude: Option<f64>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl From<RawStation> for Station {
    fn from(raw: RawStation) -> Self {
        let position = raw.positions.first();
        Station {
            id: raw.id,
            name: raw.name,
            locality: raw.locality.filter(|s| !s.trim().is_empty()),
            basin: raw.basin.filter(|s| !s.trim().is_empty()),
            opened: raw.opened.filter(|s| !s.trim().is_empty()),
            closed: raw.closed.filter(|s| !is_placeholder_date(s)),
            kind: raw.kinds.first().and_then(|k| k.kind),
            altitude: position.and_then(|p| p.altitude),
            latitude: position.and_then(|p| p.latitude),
            longitude: position.and_then(|p| p.longitude),
        }
    }
}

impl Station {
    /// Year the station opened, if the reported date parses.
    pub fn opened_year(&self) -> Option<i32> {
        year_of(self.opened.as_deref()?)
    }

    /// Year the station closed; `None` while it is still active.
    pub fn closed_year(&self) -> Option<i32> {
        year_of(self.closed.as_deref()?)
    }

    /// Field/value pairs for the annotated output banner, in the order the
    /// banner prints them. Missing values render as `unknown`.
    pub fn metadata_fields(&self) -> Vec<(&'static str, String)> {
        fn or_unknown<T: ToString>(v: &Option<T>) -> String {
            v.as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        }

        vec![
            ("ID", self.id.clone()),
            ("Nom", self.name.clone()),
            ("LieuDit", or_unknown(&self.locality)),
            ("Bassin", or_unknown(&self.basin)),
            ("DateDebut", or_unknown(&self.opened)),
            ("DateFin", or_unknown(&self.closed)),
            ("Type", or_unknown(&self.kind)),
            ("Altitude", or_unknown(&self.altitude)),
            ("Latitude", or_unknown(&self.latitude)),
            ("Longitude", or_unknown(&self.longitude)),
        ]
    }
}

fn year_of(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Station ids appear both as JSON strings (with leading zeros) and as bare
/// numbers depending on the endpoint.
fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_record_maps_every_field() {
        let raw: RawStation = serde_json::from_str(
            r#"{
                "id": "59343001",
                "nom": "LILLE-LESQUIN",
                "lieuDit": "LESQUIN",
                "bassin": "A651",
                "dateDebut": "1944-01-01T00:00:00Z",
                "dateFin": "",
                "typesPoste": [{"type": 0, "dateDebut": "1944-01-01T00:00:00Z"}],
                "positions": [{"altitude": 47.0, "latitude": 50.57, "longitude": 3.0975}]
            }"#,
        )
        .unwrap();
        let station = Station::from(raw);
        assert_eq!(station.id, "59343001");
        assert_eq!(station.kind, Some(0));
        assert_eq!(station.altitude, Some(47.0));
        assert!(station.closed.is_none());
        assert_eq!(station.opened_year(), Some(1944));
    }

    #[test]
    fn missing_positions_degrade_to_unknown() {
        let raw: RawStation = serde_json::from_str(
            r#"{"id": 31069001, "nom": "TOULOUSE-BLAGNAC"}"#,
        )
        .unwrap();
        let station = Station::from(raw);
        assert_eq!(station.id, "31069001");
        assert!(station.altitude.is_none());
        assert!(station.latitude.is_none());
        assert!(station.longitude.is_none());
        assert!(station.kind.is_none());

        let banner = station.metadata_fields();
        let altitude = banner.iter().find(|(k, _)| *k == "Altitude").unwrap();
        assert_eq!(altitude.1, "unknown");
    }

    #[test]
    fn placeholder_closing_date_means_still_active() {
        let raw: RawStation = serde_json::from_str(
            r#"{"id": "1", "nom": "X", "dateFin": "9999-12-31T23:00:00Z"}"#,
        )
        .unwrap();
        assert!(Station::from(raw).closed.is_none());
    }
}
