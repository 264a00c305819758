//! Raster publishing for the geoflow workflow engine.
//!
//! Publishing a raster means:
//!
//! 1. download it into the media root,
//! 2. classify its first band into quantile buckets and write an SLD style,
//! 3. write a one-shot credentials file,
//! 4. run the external publishing tool,
//! 5. report the layer name and its extent in Web Mercator.
//!
//! Every temporary artifact is removed when the call returns, on success and
//! on failure alike.
//!
//! # Example
//!
//! ```no_run
//! use geoflow_ogc::OgcClient;
//! use geoflow_publish::{PublishRequest, PublisherConfig, RasterPublisher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OgcClient::builder().build()?;
//! let publisher = RasterPublisher::new(PublisherConfig::default(), client);
//!
//! let request = PublishRequest {
//!     raster_url: "http://example.org/dem.tif".to_string(),
//!     host: "geoserver.local".to_string(),
//!     workspace: String::new(),
//!     user: "admin".to_string(),
//!     password: "geoserver".to_string(),
//! };
//! let layer = publisher.publish(&request).await?;
//! println!("{} {:?}", layer.layer, layer.extent);
//! # Ok(())
//! # }
//! ```

pub mod classify;
mod config;
mod error;
mod publisher;
pub mod raster;
pub mod sld;
mod tool;

pub use classify::{classify, ColorMapEntry};
pub use config::PublisherConfig;
pub use error::{PublishError, PublishResult};
pub use publisher::{PublishRequest, PublishedLayer, RasterPublisher};
pub use raster::RasterInfo;
pub use tool::ToolOutput;
