//! The publish pipeline: download, style, invoke the tool, report.

use std::ffi::OsString;
use std::path::Path;

use geoflow_ogc::{parse_epsg, transform_point, OgcClient};
use geoflow_types::Operation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::{Builder, TempPath};
use tracing::{info, warn};

use crate::classify::classify;
use crate::config::PublisherConfig;
use crate::error::{PublishError, PublishResult};
use crate::raster::{self, RasterInfo};
use crate::sld;
use crate::tool;

/// Prefix for every temporary artifact in the media root.
const ARTIFACT_PREFIX: &str = "ds";
/// SRID of the reported extent.
const EXTENT_SRID: i32 = 3857;

/// Inputs of a publish step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    pub raster_url: String,
    pub host: String,
    /// Target workspace; blank means the configured default.
    pub workspace: String,
    pub user: String,
    pub password: String,
}

impl PublishRequest {
    /// Read the request from an operation's positional inputs.
    ///
    /// Inputs are `[raster url, host, workspace, user, password]`.
    pub fn from_operation(operation: &Operation) -> PublishResult<Self> {
        let [raster, host, workspace, user, password] = match operation.inputs.get(..5) {
            Some([a, b, c, d, e]) => [a, b, c, d, e].map(|p| p.value_text()),
            _ => {
                return Err(PublishError::MissingInput(format!(
                    "operation {} needs 5 inputs, has {}",
                    operation.id,
                    operation.inputs.len()
                )));
            }
        };
        if raster.is_empty() {
            return Err(PublishError::MissingInput("raster url".to_string()));
        }
        Ok(Self {
            raster_url: raster,
            host,
            workspace,
            user,
            password,
        })
    }
}

/// A layer that reached the map server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedLayer {
    /// `[minx, miny, maxx, maxy]` in EPSG:3857.
    pub extent: [f64; 4],
    /// `<workspace>:<layer>`.
    pub layer: String,
}

/// Publishes rasters through the external tool.
#[derive(Debug, Clone)]
pub struct RasterPublisher {
    config: PublisherConfig,
    client: OgcClient,
}

impl RasterPublisher {
    pub fn new(config: PublisherConfig, client: OgcClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Publish a raster.
    ///
    /// A raster that cannot be downloaded or decoded aborts before the tool
    /// runs. Temporary files are removed before returning.
    pub async fn publish(&self, request: &PublishRequest) -> PublishResult<PublishedLayer> {
        let Some(bytes) = self.client.fetch_bytes(&request.raster_url).await else {
            return Err(PublishError::Download(request.raster_url.clone()));
        };

        let media_root = &self.config.media_root;
        tokio::fs::create_dir_all(media_root).await?;

        let raster_path = artifact(media_root, ARTIFACT_PREFIX, ".tif", &bytes)?;
        let stem = raster_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let info = read_raster(&raster_path).await?;
        let style = sld::style_document(&classify(&info.values))?;
        let style_path = style_artifact(media_root, &stem, style.as_bytes())?;

        let credentials = json!({
            "geoserver": [{
                "host": request.host,
                "port": self.config.geoserver_port,
                "user": request.user,
                "password": request.password,
            }],
            "developer": self.config.developer,
        });
        let config_path = artifact(
            media_root,
            ARTIFACT_PREFIX,
            ".json",
            credentials.to_string().as_bytes(),
        )?;

        let workspace = if request.workspace.trim().is_empty() {
            self.config.default_workspace.clone()
        } else {
            request.workspace.clone()
        };
        let projection = match info.epsg {
            Some(code) => format!("EPSG:{code}"),
            None => self.config.default_projection.clone(),
        };

        let mut args: Vec<OsString> = self.config.args.iter().map(OsString::from).collect();
        args.push(workspace.clone().into());
        args.push(raster_path.as_os_str().to_owned());
        args.push(style_path.as_os_str().to_owned());
        args.push(projection.clone().into());
        args.push(config_path.as_os_str().to_owned());
        args.push("No".into());

        tool::run(&self.config.command, &args, self.config.timeout)
            .await?
            .check()?;

        let layer = format!("{workspace}:{stem}");
        info!(layer = %layer, projection = %projection, "raster published");

        let extent = extent(&info, &projection).map_err(|reason| {
            warn!(layer = %layer, reason = %reason, "published layer has no extent");
            PublishError::Report {
                layer: layer.clone(),
                reason,
            }
        })?;

        Ok(PublishedLayer { extent, layer })
    }
}

/// Write bytes to a uniquely named file that is removed on drop.
fn artifact(dir: &Path, prefix: &str, suffix: &str, bytes: &[u8]) -> PublishResult<TempPath> {
    let file = Builder::new().prefix(prefix).suffix(suffix).tempfile_in(dir)?;
    std::fs::write(file.path(), bytes)?;
    Ok(file.into_temp_path())
}

/// The style is named after the raster.
fn style_artifact(dir: &Path, stem: &str, bytes: &[u8]) -> PublishResult<TempPath> {
    let file = Builder::new()
        .prefix(stem)
        .suffix(".xml")
        .rand_bytes(0)
        .tempfile_in(dir)?;
    std::fs::write(file.path(), bytes)?;
    Ok(file.into_temp_path())
}

async fn read_raster(path: &Path) -> PublishResult<RasterInfo> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || raster::read(&path))
        .await
        .map_err(|e| PublishError::Raster(e.to_string()))?
}

fn extent(info: &RasterInfo, projection: &str) -> Result<[f64; 4], String> {
    let srid = parse_epsg(projection).ok_or_else(|| format!("unknown projection {projection}"))?;
    let [minx, miny, maxx, maxy] = info
        .bounds
        .ok_or_else(|| "raster carries no georeference".to_string())?;
    let southwest = transform_point([minx, miny], srid, EXTENT_SRID).map_err(|e| e.to_string())?;
    let northeast = transform_point([maxx, maxy], srid, EXTENT_SRID).map_err(|e| e.to_string())?;
    Ok([southwest[0], southwest[1], northeast[0], northeast[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoflow_types::{Port, PortType, Resource};

    fn operation(values: &[&str]) -> Operation {
        let mut op = Operation::new("publish", Resource::GeoServer);
        op.inputs = values
            .iter()
            .enumerate()
            .map(|(i, v)| Port::new(i, format!("in{i}"), PortType::Text).with_value(*v))
            .collect();
        op
    }

    #[test]
    fn test_request_from_operation() {
        let op = operation(&["http://h/r.tif", "gs.local", "", "admin", "secret"]);
        let request = PublishRequest::from_operation(&op).unwrap();
        assert_eq!(request.raster_url, "http://h/r.tif");
        assert_eq!(request.host, "gs.local");
        assert!(request.workspace.is_empty());
        assert_eq!(request.password, "secret");
    }

    #[test]
    fn test_request_missing_inputs() {
        let err = PublishRequest::from_operation(&operation(&["http://h/r.tif", "h"])).unwrap_err();
        assert!(matches!(err, PublishError::MissingInput(_)));

        let err = PublishRequest::from_operation(&operation(&["", "h", "w", "u", "p"])).unwrap_err();
        assert!(matches!(err, PublishError::MissingInput(_)));
    }

    #[test]
    fn test_extent_in_web_mercator() {
        let info = RasterInfo {
            width: 1,
            height: 1,
            values: vec![0.0],
            bounds: Some([0.0, 0.0, 1.0, 1.0]),
            epsg: Some(4326),
        };
        let extent = extent(&info, "EPSG:4326").unwrap();
        assert_eq!(extent[0], 0.0);
        assert!((extent[2] - 111_319.49).abs() < 0.01);
    }

    #[test]
    fn test_extent_unsupported_projection() {
        let info = RasterInfo {
            width: 1,
            height: 1,
            values: vec![0.0],
            bounds: Some([0.0, 0.0, 1.0, 1.0]),
            epsg: None,
        };
        assert!(extent(&info, "EPSG:2056").is_err());
        assert!(extent(&info, "local").is_err());
    }

    #[test]
    fn test_extent_without_georeference() {
        let info = RasterInfo {
            width: 4,
            height: 4,
            values: vec![0.0; 16],
            bounds: None,
            epsg: None,
        };
        let reason = extent(&info, "EPSG:32736").unwrap_err();
        assert!(reason.contains("georeference"));
    }

    #[test]
    fn test_report_error_counts_as_published() {
        let err = PublishError::Report {
            layer: "ws:ds1".into(),
            reason: "x".into(),
        };
        assert!(err.is_published());
        assert!(!PublishError::Download("u".into()).is_published());
    }
}
