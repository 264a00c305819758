//! Sensor Observation Service adapter.
//!
//! Capabilities are enumerated from `Contents/ObservationOfferingList`; each
//! offering's features of interest are located through a DescribeSensor
//! follow-up and reprojected to Web Mercator for display.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{query_value, OgcClient};
use crate::error::{OgcError, Result};
use crate::srs::{parse_epsg, transform_point};
use crate::xml;

/// Palette cycled through for offerings, in document order.
pub const OFFERING_COLORS: [&str; 7] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#4dacff", "#f47671", "#0088ff",
];

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const OM_RESPONSE_FORMAT: &str = "responseformat=text/xml;subtype=%22om/1.0.0%22";

/// One observation offering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosOffering {
    pub offering: String,
    pub color: String,
    pub name: String,
    pub observed_property: String,
    pub procedure: String,
    pub begin_time: String,
    pub end_time: String,
    /// GetObservation request for the whole offering.
    pub url: String,
    #[serde(rename = "defaultCRS")]
    pub default_crs: String,
    pub features_of_interest: Vec<FeatureOfInterest>,
}

/// A located sensor station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureOfInterest {
    pub name: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Position in EPSG:3857.
    pub location: [f64; 2],
    #[serde(rename = "defaultCRS")]
    pub default_crs: String,
    pub begin_time: String,
    pub end_time: String,
    /// GetObservation request for this station only.
    pub url: String,
}

/// One parsed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds since the epoch, UTC.
    pub timestamp: i64,
    pub sensor: String,
    pub value: String,
}

/// Time series parsed from a GetObservation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    pub observations: Vec<Observation>,
    /// `[epoch milliseconds, value]` pairs for charting.
    pub chartdata: Vec<(i64, f64)>,
}

/// An offering awaiting its DescribeSensor follow-ups.
#[derive(Debug, Clone)]
struct OfferingDraft {
    offering: SosOffering,
    /// `(feature of interest, procedure)` pairs.
    stations: Vec<(String, String)>,
}

/// Enumerate the observation offerings of an SOS endpoint.
///
/// The `sos.py` deployment publishes only relevant offerings, so all are
/// accepted there; elsewhere only offerings named in `allowed` are kept.
pub async fn get_capabilities(
    client: &OgcClient,
    url: Option<&str>,
    limit: usize,
    allowed: &[String],
) -> Result<Option<Vec<SosOffering>>> {
    let base = client.base_url(url);
    let Some(body) = client
        .fetch(&format!("{base}service=SOS&request=GetCapabilities"))
        .await
    else {
        return Ok(None);
    };

    let drafts = parse_capabilities(&body, &base, limit, allowed, Utc::now())?;
    let mut offerings = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let mut offering = draft.offering;
        for (station, procedure) in draft.stations {
            let describe_url = describe_sensor_url(&base, &procedure);
            let Some(sensor_doc) = client.fetch(&describe_url).await else {
                continue;
            };
            match parse_sensor(&sensor_doc) {
                Ok(Some(sensor)) => {
                    offering.default_crs = sensor.reference_frame.clone();
                    let record = station_record(&base, &offering, &station, &procedure, sensor);
                    offering.features_of_interest.push(record);
                }
                Ok(None) => debug!(procedure = %procedure, "sensor has no position"),
                Err(e) => warn!(procedure = %procedure, error = %e, "skipping sensor"),
            }
        }
        offerings.push(offering);
    }

    debug!(url = %base, count = offerings.len(), "listed SOS offerings");
    Ok(Some(offerings))
}

/// Fetch and parse a GetObservation response.
pub async fn get_observations(client: &OgcClient, url: &str) -> Result<Option<ObservationSeries>> {
    let Some(body) = client.fetch(url).await else {
        return Ok(None);
    };
    parse_observations(&body).map(Some)
}

fn parse_capabilities(
    body: &str,
    url: &str,
    limit: usize,
    allowed: &[String],
    now: DateTime<Utc>,
) -> Result<Vec<OfferingDraft>> {
    let doc = xml::parse(body)?;
    let list = xml::path(doc.root_element(), &["Contents", "ObservationOfferingList"])
        .ok_or_else(|| {
            OgcError::unparseable("SOS capabilities", "missing Contents/ObservationOfferingList")
        })?;

    let accept_all = url.contains("sos.py");
    let now = now.format(TIME_FORMAT).to_string();

    let drafts = xml::children(list, "ObservationOffering")
        .filter_map(|node| {
            let name = xml::first_attribute(node)?.to_string();
            (accept_all || allowed.iter().any(|a| *a == name)).then_some((node, name))
        })
        .take(limit)
        .enumerate()
        .map(|(index, (node, name))| {
            let mut offering = SosOffering {
                color: OFFERING_COLORS[index % OFFERING_COLORS.len()].to_string(),
                end_time: now.clone(),
                offering: name,
                ..Default::default()
            };

            let mut observed_property = String::new();
            if let Some(property) = xml::child(node, "observedProperty") {
                observed_property = xml::first_attribute(property).unwrap_or_default().to_string();
                let vendor = if accept_all { "aa" } else { "52n" };
                offering.name = observed_property.clone();
                offering.observed_property = format!("{vendor}:{observed_property}");
            }

            if let Some(period) = xml::child(node, "time").and_then(|t| {
                t.children().find(|n| n.is_element())
            }) {
                let mut bounds = period.children().filter(|n| n.is_element()).map(xml::text);
                let begin = bounds.next().unwrap_or_default();
                offering.begin_time = format!("{begin}T00:00:00");
                offering.url = offering_url(url, &offering.offering, &begin, &now, accept_all);
            }

            let stations = xml::children(node, "featureOfInterest")
                .filter_map(xml::first_attribute)
                .map(|station| {
                    let procedure = format!("{observed_property}-{station}");
                    (station.to_string(), procedure)
                })
                .collect::<Vec<_>>();
            if let Some((_, procedure)) = stations.last() {
                offering.procedure = procedure.clone();
            }

            OfferingDraft { offering, stations }
        })
        .collect();

    Ok(drafts)
}

fn offering_url(url: &str, offering: &str, begin: &str, now: &str, plain: bool) -> String {
    let property = capitalize(offering);
    let format = if plain {
        String::new()
    } else {
        format!("&{OM_RESPONSE_FORMAT}")
    };
    format!(
        "{url}service=SOS&request=GetObservation&version=1.0.0&observedProperty={property}&offering={offering}{format}&eventTime={begin}/{now}"
    )
}

fn describe_sensor_url(url: &str, procedure: &str) -> String {
    let procedure = query_value(procedure);
    if url.contains("sos.py") {
        format!("{url}service=SOS&request=DescribeSensor&procedure={procedure}")
    } else {
        format!(
            "{url}service=SOS&request=DescribeSensor&procedure={procedure}&outputformat=text/xml;subtype=\"sensorML/1.0.1\"&version=1.0.0"
        )
    }
}

fn station_record(
    url: &str,
    offering: &SosOffering,
    station: &str,
    procedure: &str,
    sensor: SensorPosition,
) -> FeatureOfInterest {
    FeatureOfInterest {
        name: station.to_string(),
        abstract_text: sensor.description,
        location: sensor.location,
        default_crs: sensor.reference_frame,
        begin_time: offering.begin_time.clone(),
        end_time: offering.end_time.clone(),
        url: format!(
            "{url}service=SOS&request=GetObservation&procedure={procedure}&version=1.0.0&offering={}&observedProperty={}&featureOfInterest={station}&{OM_RESPONSE_FORMAT}",
            offering.offering, offering.name
        ),
    }
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sensor location recovered from a SensorML document.
#[derive(Debug, Clone, PartialEq)]
struct SensorPosition {
    description: String,
    /// Reprojected to EPSG:3857.
    location: [f64; 2],
    reference_frame: String,
}

fn parse_sensor(body: &str) -> Result<Option<SensorPosition>> {
    let doc = xml::parse(body)?;
    let root = doc.root_element();
    let Some(position) = xml::descendant(root, "position") else {
        return Ok(None);
    };

    let reference_frame = position
        .descendants()
        .find_map(|n| xml::attribute(n, "referenceFrame"))
        .ok_or_else(|| OgcError::unparseable("SensorML", "position without referenceFrame"))?
        .to_string();
    let srid = parse_epsg(&reference_frame).ok_or_else(|| {
        OgcError::unparseable("SensorML", format!("referenceFrame '{reference_frame}'"))
    })?;

    let values: Vec<f64> = position
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "coordinate")
        .filter_map(|c| xml::descendant(c, "value"))
        .filter_map(|v| xml::text(v).parse().ok())
        .take(2)
        .collect();
    let [x, y] = values.as_slice() else {
        return Err(OgcError::unparseable("SensorML", "expected two coordinates"));
    };

    Ok(Some(SensorPosition {
        description: xml::descendant(root, "description")
            .map(xml::text)
            .unwrap_or_default(),
        location: transform_point([*x, *y], srid, 3857)?,
        reference_frame,
    }))
}

/// Parse the `values` blocks of a GetObservation response.
///
/// Blocks are `;`-separated records of `timestamp,sensor,value`.
pub fn parse_observations(body: &str) -> Result<ObservationSeries> {
    let doc = xml::parse(body)?;
    let mut series = ObservationSeries::default();

    let blocks = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "values")
        .filter_map(|n| n.text());

    for block in blocks {
        for record in block.split(';').map(str::trim).filter(|r| !r.is_empty()) {
            let fields: Vec<&str> = record.split(',').map(str::trim).collect();
            let [timestamp, sensor, value, ..] = fields.as_slice() else {
                return Err(OgcError::unparseable(
                    "SOS observations",
                    format!("record '{record}' has fewer than three fields"),
                ));
            };

            let epoch = parse_timestamp(timestamp)?;
            if let Ok(number) = value.parse::<f64>() {
                series.chartdata.push((epoch * 1000, number));
            }
            series.observations.push(Observation {
                timestamp: epoch,
                sensor: sensor.to_string(),
                value: value.to_string(),
            });
        }
    }

    Ok(series)
}

/// Parse an observation timestamp as UTC, ignoring fractional seconds.
fn parse_timestamp(raw: &str) -> Result<i64> {
    let trimmed = raw.trim().trim_end_matches('Z');
    let whole = trimmed.split('.').next().unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(whole, TIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| OgcError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CAPABILITIES: &str = r#"<?xml version="1.0"?>
<sos:Capabilities xmlns:sos="http://www.opengis.net/sos/1.0" xmlns:gml="http://www.opengis.net/gml" xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:ServiceIdentification xmlns:ows="http://www.opengis.net/ows/1.1"/>
  <sos:Contents>
    <sos:ObservationOfferingList>
      <sos:ObservationOffering gml:id="LUFTTEMPERATUR">
        <sos:time>
          <gml:TimePeriod>
            <gml:beginPosition>2019-01-01</gml:beginPosition>
            <gml:endPosition>2019-12-31</gml:endPosition>
          </gml:TimePeriod>
        </sos:time>
        <sos:observedProperty xlink:href="Temperature"/>
        <sos:featureOfInterest xlink:href="station_1"/>
      </sos:ObservationOffering>
      <sos:ObservationOffering gml:id="WASSERSTAND">
        <sos:observedProperty xlink:href="Level"/>
      </sos:ObservationOffering>
      <sos:ObservationOffering gml:id="LUFTFEUCHTE">
        <sos:observedProperty xlink:href="Humidity"/>
      </sos:ObservationOffering>
    </sos:ObservationOfferingList>
  </sos:Contents>
</sos:Capabilities>"#;

    const SENSOR: &str = r#"<?xml version="1.0"?>
<sml:SensorML xmlns:sml="http://www.opengis.net/sensorML/1.0.1" xmlns:swe="http://www.opengis.net/swe/1.0.1" xmlns:gml="http://www.opengis.net/gml">
  <sml:member>
    <sml:System>
      <gml:description>Weather station one</gml:description>
      <sml:position name="stationPosition">
        <swe:Position referenceFrame="urn:ogc:def:crs:EPSG::4326">
          <swe:location>
            <swe:Vector>
              <swe:coordinate name="easting"><swe:Quantity><swe:value>1.0</swe:value></swe:Quantity></swe:coordinate>
              <swe:coordinate name="northing"><swe:Quantity><swe:value>0.0</swe:value></swe:Quantity></swe:coordinate>
            </swe:Vector>
          </swe:location>
        </swe:Position>
      </sml:position>
    </sml:System>
  </sml:member>
</sml:SensorML>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap()
    }

    fn allowed() -> Vec<String> {
        vec!["LUFTTEMPERATUR".to_string(), "LUFTFEUCHTE".to_string()]
    }

    #[test]
    fn test_allow_list_filters_offerings() {
        let drafts =
            parse_capabilities(CAPABILITIES, "http://h/sos?", 10, &allowed(), now()).unwrap();
        let names: Vec<&str> = drafts.iter().map(|d| d.offering.offering.as_str()).collect();
        assert_eq!(names, vec!["LUFTTEMPERATUR", "LUFTFEUCHTE"]);

        let first = &drafts[0].offering;
        assert_eq!(first.color, "#e41a1c");
        assert_eq!(drafts[1].offering.color, "#377eb8");
        assert_eq!(first.name, "Temperature");
        assert_eq!(first.observed_property, "52n:Temperature");
        assert_eq!(first.procedure, "Temperature-station_1");
        assert_eq!(first.begin_time, "2019-01-01T00:00:00");
        assert_eq!(first.end_time, "2020-05-01T12:00:00");
        assert!(first.url.contains("observedProperty=Lufttemperatur"));
        assert!(first.url.contains(OM_RESPONSE_FORMAT));
        assert!(first.url.ends_with("eventTime=2019-01-01/2020-05-01T12:00:00"));
        assert_eq!(drafts[0].stations, vec![("station_1".to_string(), "Temperature-station_1".to_string())]);
    }

    #[test]
    fn test_sos_py_accepts_everything() {
        let drafts =
            parse_capabilities(CAPABILITIES, "http://h/sos.py?", 10, &[], now()).unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].offering.observed_property, "aa:Temperature");
        assert!(!drafts[0].offering.url.contains("responseformat"));
    }

    #[test]
    fn test_no_matching_offering_is_empty() {
        let drafts = parse_capabilities(
            CAPABILITIES,
            "http://h/sos?",
            10,
            &["NOTHING".to_string()],
            now(),
        )
        .unwrap();
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_missing_contents_is_unparseable() {
        let err =
            parse_capabilities("<Capabilities/>", "http://h/sos?", 10, &[], now()).unwrap_err();
        assert!(matches!(err, OgcError::Unparseable { .. }));
    }

    #[test]
    fn test_parse_sensor_position() {
        let sensor = parse_sensor(SENSOR).unwrap().unwrap();
        assert_eq!(sensor.description, "Weather station one");
        assert_eq!(sensor.reference_frame, "urn:ogc:def:crs:EPSG::4326");
        assert!((sensor.location[0] - 111_319.49).abs() < 0.01);
        assert!(sensor.location[1].abs() < 1e-6);
    }

    #[test]
    fn test_sensor_without_position() {
        assert!(parse_sensor("<SensorML/>").unwrap().is_none());
    }

    #[test]
    fn test_parse_observations() {
        let body = r#"<om:ObservationCollection xmlns:om="http://www.opengis.net/om/1.0" xmlns:swe="http://www.opengis.net/swe/1.0.1">
  <om:member><om:Observation><om:result><swe:DataArray>
    <swe:values>
2020-01-01T00:00:00.000Z,station_1,12.5;2020-01-01T01:00:00,station_1,n/a;</swe:values>
  </swe:DataArray></om:result></om:Observation></om:member>
</om:ObservationCollection>"#;
        let series = parse_observations(body).unwrap();
        assert_eq!(series.observations.len(), 2);
        assert_eq!(series.observations[0].timestamp, 1_577_836_800);
        assert_eq!(series.observations[0].sensor, "station_1");
        assert_eq!(series.observations[0].value, "12.5");
        assert_eq!(series.chartdata, vec![(1_577_836_800_000, 12.5)]);
    }

    #[test]
    fn test_invalid_timestamp() {
        let body = "<r><values>yesterday,s,1;</values></r>";
        let err = parse_observations(body).unwrap_err();
        assert!(matches!(err, OgcError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("LUFTTEMPERATUR"), "Lufttemperatur");
        assert_eq!(capitalize(""), "");
    }
}
