// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web API and category overview page

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::guidance::{Guidance, GuidanceBook};
use crate::resolver::{ClassificationQuery, ClassificationResult, Resolver};
use crate::taxonomy::CategoryEntry;
use crate::vision::{classify_image, ImageClassifier, LabelScore};

/// Shared application state
pub struct AppState {
    pub resolver: Resolver,
    pub guidance: GuidanceBook,
    pub classifier: Arc<dyn ImageClassifier>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, classifier: Arc<dyn ImageClassifier>) -> crate::Result<Self> {
        Ok(Self {
            resolver: config.resolver()?,
            guidance: config.guidance_book(),
            classifier,
            max_upload_bytes: config.web.max_upload_mb * 1024 * 1024,
        })
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Pages
        .route("/", get(index_page))
        // API endpoints
        .route("/api/categories", get(api_get_categories))
        .route("/api/guidance/:category", get(api_get_guidance))
        .route("/api/resolve", post(api_resolve))
        .route("/api/classify", post(api_classify))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(&state))
}

// === API Handlers ===

#[derive(Serialize)]
struct CategoriesResponse<'a> {
    categories: &'a [CategoryEntry],
    fallback: &'a str,
}

async fn api_get_categories(State(state): State<Arc<AppState>>) -> Response {
    let table = state.resolver.table();
    Json(CategoriesResponse {
        categories: table.entries(),
        fallback: table.fallback(),
    })
    .into_response()
}

async fn api_get_guidance(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Guidance> {
    Json(state.guidance.get(&category))
}

/// Either a single label or a ranked candidate list
#[derive(Deserialize)]
#[serde(untagged)]
enum ResolveRequest {
    Ranked { labels: Vec<LabelScore> },
    Single(ClassificationQuery),
}

#[derive(Serialize)]
struct ResolveResponse {
    #[serde(flatten)]
    result: ClassificationResult,
    guidance: Guidance,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    candidates: Vec<LabelScore>,
}

async fn api_resolve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let result = match request {
        ResolveRequest::Ranked { labels } => state.resolver.classify_ranked(&labels),
        ResolveRequest::Single(query) => state.resolver.classify(&query),
    };
    let guidance = state.guidance.get(result.category());

    Json(ResolveResponse {
        result,
        guidance,
        candidates: Vec::new(),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

async fn api_classify(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut image = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("image") => match field.bytes().await {
                Ok(bytes) => {
                    image = Some(bytes);
                    break;
                }
                Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
            },
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        }
    }

    let Some(image) = image else {
        return error_response(StatusCode::BAD_REQUEST, "missing 'image' field");
    };

    match classify_image(state.classifier.as_ref(), &state.resolver, &image).await {
        Ok(outcome) => {
            let guidance = state.guidance.get(outcome.result.category());
            Json(ResolveResponse {
                result: outcome.result,
                guidance,
                candidates: outcome.candidates,
            })
            .into_response()
        }
        Err(e) => {
            warn!("Image classification failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

// === Template Rendering ===

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Wastewise</title>
    <style>
        :root {{
            --bg-primary: #f4f7f2;
            --bg-card: #ffffff;
            --text-primary: #1f2937;
            --text-secondary: #6b7280;
            --accent: #15803d;
            --border: #e5e7eb;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: var(--accent); margin-bottom: 20px; }}
        .card {{
            background: var(--bg-card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 20px;
        }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{
            padding: 12px;
            text-align: left;
            border-bottom: 1px solid var(--border);
            vertical-align: top;
        }}
        th {{ color: var(--text-secondary); font-weight: 500; }}
        .swatch {{
            display: inline-block;
            width: 14px;
            height: 14px;
            border-radius: 4px;
            margin-right: 8px;
        }}
        .keyword {{
            display: inline-block;
            background: var(--bg-primary);
            border: 1px solid var(--border);
            padding: 1px 8px;
            border-radius: 10px;
            font-size: 0.85em;
            margin: 2px;
        }}
        .fallback {{ color: var(--text-secondary); font-size: 0.85em; }}
    </style>
</head>
<body>
    <main class="container">
        {}
    </main>
</body>
</html>"#, title, content)
}

fn render_index(state: &AppState) -> String {
    let table = state.resolver.table();

    let rows: String = table.entries().iter()
        .map(|entry| {
            let guidance = state.guidance.get(&entry.name);
            let keywords: String = entry.keywords.iter()
                .map(|k| format!(r#"<span class="keyword">{}</span>"#, escape_html(k)))
                .collect();
            let marker = if entry.name == table.fallback() {
                r#" <span class="fallback">(fallback)</span>"#
            } else {
                ""
            };
            format!(r#"
                <tr>
                    <td><span class="swatch" style="background: {}"></span>{}{}</td>
                    <td>{}</td>
                    <td>{}</td>
                </tr>
            "#,
            escape_html(&guidance.color),
            escape_html(&entry.name),
            marker,
            keywords,
            escape_html(&guidance.guideline),
            )
        })
        .collect();

    let content = format!(r#"
        <h1>Waste Categories</h1>
        <div class="card">
            <table>
                <tr><th>Category</th><th>Keywords</th><th>Disposal</th></tr>
                {}
            </table>
        </div>
    "#, rows);

    base_template("Categories", &content)
}

/// Start the web server
pub async fn start_server(config: AppConfig, classifier: Arc<dyn ImageClassifier>) -> crate::Result<()> {
    let state = Arc::new(AppState::new(&config, classifier)?);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router).await
        .map_err(|e| crate::WastewiseError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct StubClassifier {
        labels: Option<Vec<LabelScore>>,
    }

    #[async_trait]
    impl ImageClassifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        async fn classify(&self, _image: &[u8]) -> crate::Result<Vec<LabelScore>> {
            self.labels
                .clone()
                .ok_or_else(|| crate::WastewiseError::Classifier("model offline".to_string()))
        }
    }

    fn router_with(labels: Option<Vec<LabelScore>>) -> Router {
        let state = AppState::new(&AppConfig::default(), Arc::new(StubClassifier { labels })).unwrap();
        create_router(Arc::new(state))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(field: &str, data: &[u8]) -> Request<Body> {
        let boundary = "wastewise-boundary";
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"item.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
            b = boundary,
            f = field
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Request::post("/api/classify")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_single_label() {
        let response = router_with(Some(vec![]))
            .oneshot(json_post("/api/resolve", r#"{"label":"Newspaper","score":0.7}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["category"], "paper");
        assert_eq!(json["label"], "Newspaper");
        assert_eq!(json["score"], 0.7);
        assert_eq!(json["fallback"], false);
        assert_eq!(json["guidance"]["guideline"], "Recycle in the blue bin. Keep it clean and dry.");
    }

    #[tokio::test]
    async fn test_resolve_ranked_labels() {
        let body = r#"{"labels":[{"label":"unknown_object_123","score":0.5},{"label":"plastic container","score":0.4}]}"#;
        let response = router_with(Some(vec![])).oneshot(json_post("/api/resolve", body)).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["category"], "plastic");
        assert_eq!(json["label"], "plastic container");
    }

    #[tokio::test]
    async fn test_resolve_empty_label_falls_back() {
        let response = router_with(Some(vec![])).oneshot(json_post("/api/resolve", r#"{"label":""}"#)).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["category"], "others");
        assert_eq!(json["fallback"], true);
        assert!(json.get("score").is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_body() {
        let response = router_with(Some(vec![])).oneshot(json_post("/api/resolve", r#"{"name":42}"#)).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_categories() {
        let response = router_with(Some(vec![]))
            .oneshot(Request::get("/api/categories").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["fallback"], "others");
        assert_eq!(json["categories"][0]["name"], "plastic");
        assert_eq!(json["categories"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_guidance_for_unknown_category() {
        let response = router_with(Some(vec![]))
            .oneshot(Request::get("/api/guidance/spaceship").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["guideline"], Guidance::general().guideline);
    }

    #[tokio::test]
    async fn test_classify_upload() {
        let labels = vec![LabelScore::new("zebra", 0.8), LabelScore::new("laptop battery", 0.1)];
        let response = router_with(Some(labels)).oneshot(multipart_post("image", b"jpeg bytes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["category"], "electronic");
        assert_eq!(json["candidates"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_classify_without_image_field() {
        let response = router_with(Some(vec![])).oneshot(multipart_post("photo", b"jpeg bytes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_classifier_failure_is_bad_gateway() {
        let response = router_with(None).oneshot(multipart_post("image", b"jpeg bytes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("model offline"));
    }

    #[tokio::test]
    async fn test_index_page_lists_categories() {
        let response = router_with(Some(vec![]))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("electronic"));
        assert!(html.contains("(fallback)"));
    }
}
