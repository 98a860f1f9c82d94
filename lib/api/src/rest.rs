use actix_cors::Cors;
use actix_web::http::header::{HeaderMap, CONTENT_TYPE};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use pathwise_core::{CareerModel, ClusterMatch, ClusterMetadata, ClusterSet, Error};
use pathwise_schema::{profile_from_free_text, ExternalProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Matches returned when the request does not ask for a count
const DEFAULT_TOP_K: usize = 3;

#[derive(Deserialize)]
struct PredictQuery {
    top_k: Option<usize>,
    full: Option<String>,
}

#[derive(Serialize)]
struct CompactMatch {
    cluster_id: String,
    distance: f64,
    degraded: bool,
    size: usize,
    top_jobs: Vec<String>,
}

#[derive(Serialize)]
struct ClusterView {
    cluster_id: String,
    centroid: BTreeMap<String, f64>,
    size: usize,
    top_jobs: Vec<String>,
    primary_categories: BTreeMap<String, usize>,
}

impl ClusterView {
    fn new(clusters: &ClusterSet, cluster: &ClusterMetadata) -> Self {
        Self {
            cluster_id: cluster.cluster_id.clone(),
            centroid: clusters.centroid_map(cluster),
            size: cluster.size,
            top_jobs: cluster.top_items.clone(),
            primary_categories: cluster.category_histogram.clone(),
        }
    }
}

#[derive(Serialize)]
struct FullMatch {
    cluster_id: String,
    distance: f64,
    degraded: bool,
    meta: ClusterView,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(model: Arc<CareerModel>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(model.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register the inference endpoints.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict))
        .route("/clusters", web::get().to(list_clusters))
        .route("/clusters/{id}", web::get().to(get_cluster));
}

fn error(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn full_requested(query: &PredictQuery, headers: &HeaderMap, body: Option<&serde_json::Value>) -> bool {
    query.full.as_deref().is_some_and(truthy)
        || headers
            .get("X-Full-Response")
            .and_then(|v| v.to_str().ok())
            .is_some_and(truthy)
        || body
            .and_then(|b| b.get("full"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
}

async fn health(model: web::Data<Arc<CareerModel>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "model_loaded": true,
        "clusters": model.n_clusters(),
        "features": model.feature_columns.len(),
    })))
}

async fn predict(
    model: web::Data<Arc<CareerModel>>,
    req: HttpRequest,
    query: web::Query<PredictQuery>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (profile, json_body) = if content_type.contains("application/json") {
        let value: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(error("Expected JSON body with student data")));
            }
        };
        match profile_from_json(&value) {
            Ok(profile) => (profile, Some(value)),
            Err(e) => return Ok(HttpResponse::BadRequest().json(error(e))),
        }
    } else if content_type.starts_with("text/") {
        let text = String::from_utf8_lossy(&body);
        (profile_from_free_text(&text, Some(&model.mappings)), None)
    } else {
        // anything else is accepted when it parses as a JSON object
        match serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .filter(serde_json::Value::is_object)
        {
            Some(value) => match profile_from_json(&value) {
                Ok(profile) => (profile, Some(value)),
                Err(e) => return Ok(HttpResponse::BadRequest().json(error(e))),
            },
            None => {
                return Ok(HttpResponse::UnsupportedMediaType().json(error(
                    "Unsupported content type. Send application/json or text/plain free-text.",
                )));
            }
        }
    };

    let top_k = query.top_k.unwrap_or_else(|| DEFAULT_TOP_K.min(model.n_clusters()));
    let full = full_requested(&query, req.headers(), json_body.as_ref());
    tracing::debug!(fields = profile.len(), top_k, full, "predict request");

    let matches = match model.match_profile(&profile, top_k) {
        Ok(matches) => matches,
        Err(e @ Error::TooManyMatches { .. }) => return Ok(HttpResponse::BadRequest().json(error(e))),
        Err(e) => {
            tracing::warn!(error = %e, "predict failed");
            return Ok(HttpResponse::InternalServerError().json(error(e)));
        }
    };

    let body = if full {
        serde_json::json!({ "matches": full_matches(&model.clusters, matches) })
    } else {
        serde_json::json!({ "matches": compact_matches(matches) })
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Profile fields of a JSON request body; the `full` flag is not a field.
fn profile_from_json(value: &serde_json::Value) -> pathwise_schema::Result<ExternalProfile> {
    let mut value = value.clone();
    if let Some(object) = value.as_object_mut() {
        object.remove("full");
    }
    ExternalProfile::from_json(&value)
}

fn compact_matches(matches: Vec<ClusterMatch>) -> Vec<CompactMatch> {
    matches
        .into_iter()
        .map(|m| CompactMatch {
            cluster_id: m.cluster_id,
            distance: m.distance,
            degraded: m.degraded,
            size: m.summary.size,
            top_jobs: m.summary.top_items,
        })
        .collect()
}

fn full_matches(clusters: &ClusterSet, matches: Vec<ClusterMatch>) -> Vec<FullMatch> {
    matches
        .into_iter()
        .map(|m| FullMatch {
            meta: ClusterView::new(clusters, &m.summary),
            cluster_id: m.cluster_id,
            distance: m.distance,
            degraded: m.degraded,
        })
        .collect()
}

async fn list_clusters(model: web::Data<Arc<CareerModel>>) -> ActixResult<HttpResponse> {
    let clusters: Vec<ClusterView> = model
        .clusters
        .iter()
        .map(|c| ClusterView::new(&model.clusters, c))
        .collect();
    Ok(HttpResponse::Ok().json(clusters))
}

async fn get_cluster(
    model: web::Data<Arc<CareerModel>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match model.cluster(&id) {
        Some(cluster) => Ok(HttpResponse::Ok().json(ClusterView::new(&model.clusters, cluster))),
        None => Ok(HttpResponse::NotFound().json(error(format!("Cluster '{}' not found", id)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use pathwise_core::{BuildConfig, Catalog, ItemRecord, ModelBuilder, SplitConfig};
    use pathwise_schema::{CategoricalMapping, MappingRow};

    fn model() -> Arc<CareerModel> {
        let records = (0..12u64)
            .map(|i| {
                let tech = i < 6;
                ItemRecord::new(i, format!("Job {i}"), if tech { "Technology" } else { "Arts" })
                    .with_attribute("salary_inr_avg", (if tech { 1_500_000.0 } else { 400_000.0 }) + i as f64)
                    .with_attribute("creativity_requirement", (if tech { 3.0 } else { 9.0 }) + 0.01 * i as f64)
            })
            .collect();
        let config = BuildConfig {
            split: SplitConfig {
                max_cluster_size: 6,
                ..SplitConfig::default()
            },
            ..BuildConfig::default()
        };
        let mappings = CategoricalMapping::from_rows(vec![MappingRow::new("stream", "Science", "2")]);
        let model = ModelBuilder::new(config)
            .build(Catalog::from_records(records).unwrap(), mappings)
            .unwrap();
        Arc::new(model)
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(web::Data::new(model())).configure(routes)).await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["clusters"], 2);
    }

    #[actix_web::test]
    async fn test_predict_json_compact() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(serde_json::json!({ "expected_salary": 1_500_000, "creativity_score": 3, "stream": "science" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let matches = body["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0]["top_jobs"].is_array());
        assert!(matches[0].get("meta").is_none());
        assert_eq!(matches[0]["degraded"], false);
    }

    #[actix_web::test]
    async fn test_predict_full_flags() {
        let app = app!();
        let body_flag = test::TestRequest::post()
            .uri("/predict?top_k=1")
            .set_json(serde_json::json!({ "expected_salary": 400_000, "full": true }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, body_flag).await;
        assert_eq!(body["matches"].as_array().unwrap().len(), 1);
        assert!(body["matches"][0]["meta"]["centroid"].is_object());

        let header_flag = test::TestRequest::post()
            .uri("/predict")
            .insert_header(("X-Full-Response", "1"))
            .set_json(serde_json::json!({ "expected_salary": 400_000 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, header_flag).await;
        assert!(body["matches"][0]["meta"].is_object());
    }

    #[actix_web::test]
    async fn test_predict_ignores_nested_fields() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(serde_json::json!({
                "expected_salary": 1_500_000,
                "hobbies": ["chess", "music"],
                "guardian": { "occupation": "Teacher" }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["matches"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_predict_free_text() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/predict?full=yes")
            .insert_header((CONTENT_TYPE, "text/plain"))
            .set_payload("expected salary: 1500000; creativity_score = 3")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_predict_errors() {
        let app = app!();
        let too_many = test::TestRequest::post()
            .uri("/predict?top_k=5")
            .set_json(serde_json::json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, too_many).await.status(), StatusCode::BAD_REQUEST);

        let not_object = test::TestRequest::post()
            .uri("/predict")
            .set_json(serde_json::json!([1, 2, 3]))
            .to_request();
        assert_eq!(test::call_service(&app, not_object).await.status(), StatusCode::BAD_REQUEST);

        let binary = test::TestRequest::post()
            .uri("/predict")
            .insert_header((CONTENT_TYPE, "application/octet-stream"))
            .set_payload(vec![0u8, 159, 146, 150])
            .to_request();
        assert_eq!(
            test::call_service(&app, binary).await.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[actix_web::test]
    async fn test_clusters() {
        let app = app!();
        let req = test::TestRequest::get().uri("/clusters").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let clusters = body.as_array().unwrap();
        assert_eq!(clusters.len(), 2);
        let id = clusters[0]["cluster_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&format!("/clusters/{id}")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 6);

        let req = test::TestRequest::get().uri("/clusters/C9").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
