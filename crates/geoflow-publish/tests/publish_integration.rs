//! End-to-end publishing against a mock raster host and a stand-in tool.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use geoflow_ogc::OgcClient;
use geoflow_publish::{PublishError, PublishRequest, PublisherConfig, RasterPublisher};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geotiff() -> Vec<u8> {
    let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(4, 4).unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[30.0f64, 30.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0f64, 0.0, 0.0, 500_000.0, 9_900_000.0, 0.0][..],
            )
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::GeoKeyDirectoryTag,
                &[1u16, 1, 0, 1, 3072, 0, 1, 32736][..],
            )
            .unwrap();
        image.write_data(&values).unwrap();
    }
    buffer.into_inner()
}

fn client() -> OgcClient {
    OgcClient::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn request(raster_url: String) -> PublishRequest {
    PublishRequest {
        raster_url,
        host: "geoserver.local".to_string(),
        workspace: String::new(),
        user: "admin".to_string(),
        password: "secret".to_string(),
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[tokio::test]
async fn test_missing_source_never_runs_tool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let media = tempfile::tempdir().unwrap();
    let marker = media.path().join("tool-ran");
    let config = PublisherConfig::new()
        .with_media_root(media.path())
        .with_command("touch", vec![marker.to_string_lossy().to_string()]);
    let publisher = RasterPublisher::new(config, client());

    let err = publisher
        .publish(&request(format!("{}/missing.tif", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Download(_)));
    assert!(!marker.exists());
    assert!(is_empty_dir(media.path()));
}

#[tokio::test]
async fn test_undecodable_raster_never_runs_tool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html/>"))
        .mount(&server)
        .await;

    let media = tempfile::tempdir().unwrap();
    let config = PublisherConfig::new()
        .with_media_root(media.path())
        .with_command("/nonexistent/geopub", vec![]);
    let publisher = RasterPublisher::new(config, client());

    let err = publisher
        .publish(&request(format!("{}/page.tif", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Raster(_)));
    assert!(is_empty_dir(media.path()));
}

#[cfg(unix)]
mod with_tool {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A plain TIFF with no georeferencing tags.
    fn plain_tiff() -> Vec<u8> {
        let values: Vec<f32> = (0..4).map(|v| v as f32).collect();
        let mut buffer = Cursor::new(Vec::new());
        TiffEncoder::new(&mut buffer)
            .unwrap()
            .write_image::<colortype::Gray32Float>(2, 2, &values)
            .unwrap();
        buffer.into_inner()
    }

    /// A tool that records its arguments and the style it was handed.
    fn fake_tool(dir: &Path, exit_code: i32) -> std::path::PathBuf {
        let script = dir.join("geopub.sh");
        let log = dir.join("args.log");
        let style = dir.join("style.copy");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\ncp \"$3\" {}\nexit {exit_code}\n",
                log.display(),
                style.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    async fn raster_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dem.tif"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(geotiff()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_publish_runs_tool_and_reports_extent() {
        let server = raster_server().await;
        let media = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let script = fake_tool(tools.path(), 0);

        let config = PublisherConfig::new()
            .with_media_root(media.path())
            .with_command(script.to_string_lossy(), vec![]);
        let publisher = RasterPublisher::new(config, client());

        let layer = publisher
            .publish(&request(format!("{}/dem.tif", server.uri())))
            .await
            .unwrap();

        assert!(layer.layer.starts_with("maris_mamase:ds"));
        assert!((layer.extent[0] - 3_673_543.2).abs() < 1.0);
        assert!(layer.extent[1] < 0.0);
        assert!(layer.extent[2] > layer.extent[0]);
        assert!(layer.extent[3] > layer.extent[1]);

        let args = std::fs::read_to_string(tools.path().join("args.log")).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(args.len(), 6);
        assert_eq!(args[0], "maris_mamase");
        assert!(args[1].ends_with(".tif"));
        assert!(args[2].ends_with(".xml"));
        assert_eq!(args[3], "EPSG:32736");
        assert!(args[4].ends_with(".json"));
        assert_eq!(args[5], "No");

        let style = std::fs::read_to_string(tools.path().join("style.copy")).unwrap();
        assert!(style.contains("StyledLayerDescriptor"));
        assert_eq!(style.matches("<ColorMapEntry").count(), 9);

        assert!(is_empty_dir(media.path()));
    }

    #[tokio::test]
    async fn test_failing_tool_is_reported() {
        let server = raster_server().await;
        let media = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let script = fake_tool(tools.path(), 2);

        let config = PublisherConfig::new()
            .with_media_root(media.path())
            .with_command(script.to_string_lossy(), vec![]);
        let publisher = RasterPublisher::new(config, client());

        let mut req = request(format!("{}/dem.tif", server.uri()));
        req.workspace = "flood".to_string();
        let err = publisher.publish(&req).await.unwrap_err();

        assert!(matches!(err, PublishError::ToolFailed { status: 2, .. }));
        assert!(!err.is_published());
        let args = std::fs::read_to_string(tools.path().join("args.log")).unwrap();
        assert!(args.starts_with("flood\n"));
        assert!(is_empty_dir(media.path()));
    }

    #[tokio::test]
    async fn test_ungeoreferenced_raster_is_a_report_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scan.tif"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(plain_tiff()))
            .mount(&server)
            .await;
        let media = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let script = fake_tool(tools.path(), 0);

        let config = PublisherConfig::new()
            .with_media_root(media.path())
            .with_command(script.to_string_lossy(), vec![]);
        let publisher = RasterPublisher::new(config, client());

        let err = publisher
            .publish(&request(format!("{}/scan.tif", server.uri())))
            .await
            .unwrap_err();

        match &err {
            PublishError::Report { layer, reason } => {
                assert!(layer.starts_with("maris_mamase:ds"));
                assert!(reason.contains("georeference"));
            }
            other => panic!("expected Report, got {other:?}"),
        }
        assert!(err.is_published());
        assert!(tools.path().join("args.log").exists());
        assert!(is_empty_dir(media.path()));
    }
}
