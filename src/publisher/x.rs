//! X (Twitter) API client.
//!
//! Images go through the v1.1 media upload endpoint (multipart `media`
//! field) and posts through `POST /2/tweets`. Both calls are signed with
//! OAuth 1.0a user-context credentials.

use super::PostClient;
use super::oauth::{OAuthCredentials, authorization_header};
use crate::models::RenderedImage;
use crate::utils::truncate_for_log;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{info, instrument};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia<'a>>,
}

#[derive(Debug, Serialize)]
struct TweetMedia<'a> {
    media_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: Option<String>,
    media_id: Option<u64>,
}

/// Error body shared by the v1.1 and v2 endpoints.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    title: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    message: Option<String>,
}

impl ApiErrorBody {
    fn describe(&self) -> Option<String> {
        self.detail
            .clone()
            .or_else(|| self.errors.iter().find_map(|e| e.message.clone()))
            .or_else(|| self.title.clone())
    }
}

/// Upload file name whose extension matches the image's content type.
fn upload_file_name(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match essence.as_deref() {
        Some("image/jpeg" | "image/jpg") => "image.jpg",
        Some("image/webp") => "image.webp",
        Some("image/gif") => "image.gif",
        _ => "image.png",
    }
}

fn api_error(endpoint: &str, status: reqwest::StatusCode, body: &str) -> Box<dyn Error> {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.describe())
        .unwrap_or_else(|| truncate_for_log(body, 300));
    format!("{} returned {}: {}", endpoint, status, message).into()
}

/// Signed client for the X API.
#[derive(Debug)]
pub struct XClient {
    credentials: OAuthCredentials,
    api_base: String,
    upload_base: String,
    http: reqwest::Client,
}

impl XClient {
    pub fn new(credentials: OAuthCredentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            http,
        }
    }

    /// Point both endpoints at other hosts.
    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }
}

impl PostClient for XClient {
    #[instrument(level = "info", skip_all, fields(bytes = image.bytes.len()))]
    async fn upload_media(&self, image: &RenderedImage) -> Result<String, Box<dyn Error>> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let auth = authorization_header(&self.credentials, "POST", &url)?;

        let mut part =
            Part::bytes(image.bytes.clone()).file_name(upload_file_name(image.content_type.as_deref()));
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("media", part);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error("media upload", status, &body));
        }

        let parsed: MediaUploadResponse = serde_json::from_str(&body)?;
        let media_id = parsed
            .media_id_string
            .or_else(|| parsed.media_id.map(|id| id.to_string()))
            .ok_or("media upload response had no media id")?;
        info!(%media_id, "Uploaded media");
        Ok(media_id)
    }

    #[instrument(level = "info", skip_all, fields(chars = text.chars().count(), media = media_ids.len()))]
    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, Box<dyn Error>> {
        let url = format!("{}/2/tweets", self.api_base);
        let auth = authorization_header(&self.credentials, "POST", &url)?;
        let request = CreateTweetRequest {
            text,
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
        };

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error("create tweet", status, &body));
        }

        let parsed: CreateTweetResponse = serde_json::from_str(&body)?;
        let id = parsed
            .data
            .map(|d| d.id)
            .filter(|id| !id.is_empty())
            .ok_or("create tweet response had no id")?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};
    use serde_json::json;

    fn client(server: &StubServer) -> XClient {
        let credentials = OAuthCredentials {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats".to_string(),
        };
        XClient::new(credentials, reqwest::Client::new())
            .with_base_urls(server.base_url(), server.base_url())
    }

    fn image() -> RenderedImage {
        RenderedImage {
            bytes: b"\x89PNG-bytes".to_vec(),
            source_url: "https://img.test/a.png".to_string(),
            content_type: Some("image/png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_post_text_only() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            "/2/tweets",
            StubResponse::json(201, json!({"data": {"id": "1850000000000000001", "text": "hi"}})),
        );

        let id = client(&server).create_post("hi https://x.test", &[]).await.unwrap();
        assert_eq!(id, "1850000000000000001");

        let request = &server.requests()[0];
        assert_eq!(request.method, "POST");
        let auth = request.header("authorization").unwrap();
        assert!(auth.starts_with("OAuth "));
        assert!(auth.contains(r#"oauth_consumer_key="ck""#));
        let body = request.body_json();
        assert_eq!(body["text"], "hi https://x.test");
        assert!(body.get("media").is_none());
    }

    #[tokio::test]
    async fn test_create_post_with_media() {
        let server = StubServer::start().await;
        server.route("POST", "/2/tweets", StubResponse::json(201, json!({"data": {"id": "7"}})));

        client(&server)
            .create_post("hi", &["710511363345354753".to_string()])
            .await
            .unwrap();

        let body = server.requests()[0].body_json();
        assert_eq!(body["media"]["media_ids"][0], "710511363345354753");
    }

    #[tokio::test]
    async fn test_create_post_error_surfaces_detail() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            "/2/tweets",
            StubResponse::json(
                403,
                json!({"title": "Forbidden", "detail": "You are not allowed to create a Tweet with duplicate content.", "status": 403}),
            ),
        );

        let err = client(&server).create_post("hi", &[]).await.unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("duplicate content"));
    }

    #[tokio::test]
    async fn test_upload_media_returns_id_string() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            "/1.1/media/upload.json",
            StubResponse::json(
                200,
                json!({"media_id": 710511363345354753u64, "media_id_string": "710511363345354753", "size": 11}),
            ),
        );

        let id = client(&server).upload_media(&image()).await.unwrap();
        assert_eq!(id, "710511363345354753");

        let request = &server.requests()[0];
        assert!(request.header("content-type").unwrap().starts_with("multipart/form-data"));
        let body = request.body_text();
        assert!(body.contains(r#"name="media""#));
        assert!(body.contains("PNG-bytes"));
    }

    #[test]
    fn test_upload_file_name_follows_content_type() {
        assert_eq!(upload_file_name(Some("image/jpeg")), "image.jpg");
        assert_eq!(upload_file_name(Some("Image/WebP; charset=binary")), "image.webp");
        assert_eq!(upload_file_name(Some("image/gif")), "image.gif");
        assert_eq!(upload_file_name(Some("image/png")), "image.png");
        assert_eq!(upload_file_name(None), "image.png");
    }

    #[tokio::test]
    async fn test_upload_media_names_jpeg_part() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            "/1.1/media/upload.json",
            StubResponse::json(200, json!({"media_id_string": "42"})),
        );
        let jpeg = RenderedImage {
            bytes: b"\xFF\xD8jpeg-bytes".to_vec(),
            source_url: "https://img.test/a.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
        };

        client(&server).upload_media(&jpeg).await.unwrap();

        let body = server.requests()[0].body_text();
        assert!(body.contains(r#"filename="image.jpg""#));
        assert!(body.to_ascii_lowercase().contains("content-type: image/jpeg"));
    }

    #[tokio::test]
    async fn test_upload_media_rejection_is_an_error() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            "/1.1/media/upload.json",
            StubResponse::json(400, json!({"errors": [{"code": 324, "message": "Image file size must be <= 5242880 bytes"}]})),
        );

        let err = client(&server).upload_media(&image()).await.unwrap_err();
        assert!(err.to_string().contains("5242880"));
    }
}
