use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cutplan_core::{PlanError, PlanRequest, PlanResult, Planner};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const OPENAPI_SPEC: &str = include_str!("../../../openapi.yaml");
const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cutplan API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/openapi.yaml',
                dom_id: '#swagger-ui',
                presets: [SwaggerUIBundle.presets.apis],
                layout: 'BaseLayout',
            });
        };
    </script>
</body>
</html>"#;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Cutplan API");

    let app = Router::new()
        .route("/", get(serve_info))
        .route("/api/health", get(health_check))
        .route("/api/plan", post(plan))
        .route("/api/generate/svg", post(generate_svg))
        .route("/openapi.yaml", get(serve_openapi_spec))
        .route("/docs", get(serve_swagger_ui))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    info!("API server listening on http://0.0.0.0:3000");
    info!("Try: curl http://localhost:3000/api/health");

    axum::serve(listener, app).await.expect("Server error");
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "cutplan-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Main planning endpoint
async fn plan(Json(request): Json<PlanRequest>) -> Result<Json<PlanResult>, AppError> {
    info!(
        "Received plan request with {} parts",
        request.parts.len()
    );

    let planner = Planner::new(request)?;
    let result = planner.plan()?;

    let oversized: usize = result
        .by_thickness
        .values()
        .flat_map(|g| &g.placements)
        .filter(|p| p.is_oversized())
        .count();
    info!(
        "Plan complete: {} panels, {:.2}% used, {} oversized pieces",
        result.total_panels, result.overall_usage_percent, oversized
    );

    Ok(Json(result))
}

/// Render a cutting diagram for a previously computed plan
async fn generate_svg(Json(result): Json<PlanResult>) -> Result<Response, AppError> {
    info!("Generating SVG for {} panels", result.total_panels);

    let svg = render_svg_content(&result)?;

    Ok((StatusCode::OK, [("Content-Type", "image/svg+xml")], svg).into_response())
}

/// Generate SVG content from a plan result
fn render_svg_content(result: &PlanResult) -> Result<String, AppError> {
    use std::fmt::Write;

    let margin = 20.0;
    let scale = 2.0; // Scale down panels to fit in the SVG
    let panel_spacing = 40.0;
    let discard = (result.stock.width - result.usable.width) / 2.0;

    let panel_w = result.stock.width / scale;
    let panel_h = result.stock.height / scale;
    let svg_width = panel_w + 2.0 * margin;
    let svg_height = result.total_panels as f64 * (panel_h + panel_spacing) + 2.0 * margin;

    let mut svg = String::new();
    writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#).unwrap();
    writeln!(
        &mut svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        svg_width, svg_height, svg_width, svg_height
    )
    .unwrap();

    writeln!(
        &mut svg,
        r##"  <rect width="100%" height="100%" fill="#f5f5f5"/>"##
    )
    .unwrap();

    let mut y_offset = margin;

    for (thickness, group) in &result.by_thickness {
        for panel_index in 0..group.panel_count {
            let x = margin;

            // Panel outline and label
            writeln!(&mut svg, r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff" stroke="#333" stroke-width="2"/>"##,
                     x, y_offset, panel_w, panel_h).unwrap();
            writeln!(&mut svg, r##"  <text x="{}" y="{}" font-family="Arial" font-size="14" fill="#333">{} mm #{}</text>"##,
                     x, y_offset - 5.0, thickness, panel_index + 1).unwrap();

            for placement in group
                .placements
                .iter()
                .filter(|p| p.panel_index as u32 == panel_index)
            {
                let px = x + (discard + placement.x) / scale;
                let py = y_offset + (discard + placement.y) / scale;
                let pw = placement.placed_width / scale;
                let ph = placement.placed_height / scale;

                let fill = if placement.is_oversized() {
                    "#E53935"
                } else {
                    "#4CAF50"
                };
                writeln!(&mut svg, r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#2E7D32" stroke-width="1" opacity="0.7"/>"##,
                         px, py, pw, ph, fill).unwrap();

                let label = if placement.rotated {
                    format!("{} (R)", placement.part_name)
                } else {
                    placement.part_name.clone()
                };
                writeln!(&mut svg, r##"  <text x="{}" y="{}" font-family="Arial" font-size="10" fill="#fff" text-anchor="middle">{}</text>"##,
                         px + pw / 2.0, py + ph / 2.0 + 3.0, label).unwrap();
            }

            y_offset += panel_h + panel_spacing;
        }
    }

    // Summary line under the last panel
    writeln!(
        &mut svg,
        r##"  <text x="{}" y="{}" font-family="Arial" font-size="12" fill="#666">"##,
        margin,
        svg_height - margin + 15.0
    )
    .unwrap();
    writeln!(
        &mut svg,
        r#"    Panels: {} | Used: {:.1}%"#,
        result.total_panels, result.overall_usage_percent
    )
    .unwrap();
    writeln!(&mut svg, r#"  </text>"#).unwrap();

    writeln!(&mut svg, "</svg>").unwrap();

    Ok(svg)
}

/// Application error type
struct AppError(anyhow::Error);

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        let message = self.0.to_string();
        let status = if message.contains("Invalid input") {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}

async fn serve_info() -> impl IntoResponse {
    Html(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Cutplan</title>
        </head>
        <body>
            <h1>Cutplan API</h1>
            <h2>API Endpoints:</h2>
            <ul>
                <li>GET /api/health - Health check</li>
                <li>POST /api/plan - Compute a cutting plan</li>
                <li>POST /api/generate/svg - Render a cutting diagram</li>
                <li>GET /docs - Interactive API documentation</li>
            </ul>
        </body>
        </html>
    "#,
    )
}

async fn serve_openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/yaml")],
        OPENAPI_SPEC,
    )
}

async fn serve_swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
