//! OGC capability adapters for the geoflow workflow engine.
//!
//! Each adapter fetches one capability or description document from a remote
//! OGC endpoint and normalizes it into the record shapes the workflow editor
//! and executor understand.
//!
//! # Example
//!
//! ```no_run
//! use geoflow_ogc::{OgcClient, Result, wps};
//!
//! # async fn example() -> Result<()> {
//! let client = OgcClient::builder()
//!     .default_url("http://localhost:8080/geoserver/ows")
//!     .build()?;
//!
//! if let Some(processes) = wps::list_processes(&client, None, 10, "gs:").await? {
//!     for process in processes {
//!         println!("{}: {}", process.id, process.metadata.longname);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Adapters return `Ok(None)` when the capability is unavailable (network
//! error, non-2xx status, empty body) and `Err(OgcError::Unparseable)` when a
//! document arrived but lacks a required branch.

pub mod client;
pub mod error;
pub mod geojson;
pub mod sos;
pub mod srs;
pub mod wcs;
pub mod wfs;
pub mod wps;
pub mod xml;

pub use client::{ClientBuilder, FetchedResponse, OgcClient};
pub use error::{OgcError, Result};
pub use geojson::{fetch_and_transform, transform_geojson};
pub use sos::{FeatureOfInterest, Observation, ObservationSeries, SosOffering};
pub use srs::{parse_epsg, transform_point, Srs};
pub use wcs::{Coverage, CoverageExtent};
pub use wfs::FeatureType;
pub use xml::XmlElement;
