mod page;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yanbao_core::allocate::DEFAULT_BUDGET_PER_STOCK;
use yanbao_core::config::Settings;
use yanbao_core::domain::plan::AllocationPlan;
use yanbao_core::notify::pushplus::PushPlusNotifier;
use yanbao_core::pipeline::{Pipeline, RunConfig};
use yanbao_core::select::SelectionCriteria;
use yanbao_core::time::cn_market::{china_today, DateRange};
use yanbao_core::PickError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    if settings.require_pushplus_token().is_err() {
        tracing::warn!("PUSHPLUS_TOKEN missing; push button will report failure");
    }

    let pipeline = Pipeline::from_settings(&settings)?;
    let state = AppState {
        pipeline: Arc::new(pipeline),
        settings: Arc::new(settings),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "page listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(pick_page))
        .route("/push", axum::routing::post(push_result))
        .route("/reports", get(all_reports))
        .route("/api/plan", get(plan_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    settings: Arc<Settings>,
}

/// Raw form/query fields. Everything arrives as text so an empty box is not a 400.
///
/// Unchecked checkboxes are simply absent, so `submitted` tells "user unticked it"
/// apart from "first visit, use the defaults".
#[derive(Debug, Default, Deserialize)]
struct PickParams {
    begin: Option<String>,
    end: Option<String>,
    buy_only: Option<String>,
    rank: Option<String>,
    count: Option<String>,
    budget: Option<String>,
    submitted: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_field<T: std::str::FromStr>(
    v: &Option<String>,
    name: &str,
    default: T,
) -> Result<T, PickError> {
    match non_empty(v) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| PickError::InvalidInput(format!("{name} is not a number: {s:?}"))),
    }
}

impl PickParams {
    fn to_run_config(&self, now: DateTime<Utc>) -> Result<RunConfig, PickError> {
        let begin = non_empty(&self.begin)
            .map(str::to_string)
            .unwrap_or_else(|| DateRange::default_for(now).begin_str());
        let range = DateRange::parse(&begin, non_empty(&self.end), now)?;

        let defaults = SelectionCriteria::default();
        let submitted = self.submitted.is_some();
        let buy_only = !submitted || self.buy_only.is_some();
        let rank = !submitted || self.rank.is_some();

        let limit: usize = parse_field(&self.count, "count", defaults.limit)?;
        if limit == 0 {
            return Err(PickError::InvalidInput("count must be at least 1".to_string()));
        }

        Ok(RunConfig {
            range,
            criteria: SelectionCriteria {
                rating: if buy_only { defaults.rating } else { None },
                rank_by_report_count: rank,
                limit,
            },
            budget_per_stock: parse_field(&self.budget, "budget", DEFAULT_BUDGET_PER_STOCK)?,
        })
    }
}

fn status_for(err: &PickError) -> StatusCode {
    match err {
        PickError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PickError::TransportOrParse(_) | PickError::Notification(_) => StatusCode::BAD_GATEWAY,
        PickError::QuoteUnavailable(_) | PickError::AllocationArithmetic(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn report_error(err: PickError, route: &'static str) -> (StatusCode, String) {
    let status = status_for(&err);
    let message = err.to_string();
    if status.is_server_error() {
        let err = anyhow::Error::new(err);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(route, error = %message, "request failed");
    } else {
        tracing::info!(route, error = %message, "rejected input");
    }
    (status, message)
}

fn error_html(cfg: Option<&RunConfig>, err: PickError, route: &'static str) -> Response {
    let (status, message) = report_error(err, route);
    (status, Html(page::error_page(cfg, &message))).into_response()
}

async fn pick_page(State(state): State<AppState>, Query(params): Query<PickParams>) -> Response {
    let cfg = match params.to_run_config(Utc::now()) {
        Ok(cfg) => cfg,
        Err(err) => return error_html(None, err, "/"),
    };
    match state.pipeline.run(&cfg).await {
        Ok(output) => Html(page::picks_page(&cfg, &output, None)).into_response(),
        Err(err) => error_html(Some(&cfg), err, "/"),
    }
}

async fn push_result(State(state): State<AppState>, Form(params): Form<PickParams>) -> Response {
    let cfg = match params.to_run_config(Utc::now()) {
        Ok(cfg) => cfg,
        Err(err) => return error_html(None, err, "/push"),
    };
    let output = match state.pipeline.run(&cfg).await {
        Ok(output) => output,
        Err(err) => return error_html(Some(&cfg), err, "/push"),
    };

    let notice = match PushPlusNotifier::from_settings(&state.settings) {
        Err(err) => {
            tracing::warn!(error = %err, "push requested without a usable token");
            page::Notice::PushFailed(format!("{err:#}"))
        }
        Ok(notifier) => {
            let today = china_today(Utc::now());
            match state.pipeline.push(&notifier, &output, today).await {
                Ok(()) => page::Notice::Pushed,
                Err(err) => {
                    let (_, message) = report_error(err, "/push");
                    page::Notice::PushFailed(message)
                }
            }
        }
    };

    Html(page::picks_page(&cfg, &output, Some(notice))).into_response()
}

async fn all_reports(State(state): State<AppState>, Query(params): Query<PickParams>) -> Response {
    let cfg = match params.to_run_config(Utc::now()) {
        Ok(cfg) => cfg,
        Err(err) => return error_html(None, err, "/reports"),
    };
    match state.pipeline.reports(&cfg.range).await {
        Ok(fetch) => Html(page::reports_page(&cfg, &fetch)).into_response(),
        Err(err) => error_html(Some(&cfg), err, "/reports"),
    }
}

#[derive(Debug, Serialize)]
struct ApiPlan {
    range: DateRange,
    criteria: SelectionCriteria,
    report_total: usize,
    progress: Vec<String>,
    plan: AllocationPlan,
}

#[derive(Debug, Serialize)]
struct ApiError {
    kind: &'static str,
    message: String,
}

async fn plan_json(
    State(state): State<AppState>,
    Query(params): Query<PickParams>,
) -> Result<Json<ApiPlan>, (StatusCode, Json<ApiError>)> {
    let to_api = |err: PickError| {
        let kind = err.kind();
        let (status, message) = report_error(err, "/api/plan");
        (status, Json(ApiError { kind, message }))
    };

    let cfg = params.to_run_config(Utc::now()).map_err(to_api)?;
    let output = state.pipeline.run(&cfg).await.map_err(to_api)?;

    Ok(Json(ApiPlan {
        range: cfg.range,
        criteria: cfg.criteria,
        report_total: output.all_reports().len(),
        progress: output.fetch.progress_lines(),
        plan: output.plan,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // 2026-01-05 09:30 in Shanghai.
        Utc.with_ymd_and_hms(2026, 1, 5, 1, 30, 0).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> PickParams {
        let mut p = PickParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "begin" => p.begin = v,
                "end" => p.end = v,
                "buy_only" => p.buy_only = v,
                "rank" => p.rank = v,
                "count" => p.count = v,
                "budget" => p.budget = v,
                "submitted" => p.submitted = v,
                other => panic!("unknown field {other}"),
            }
        }
        p
    }

    #[test]
    fn first_visit_uses_defaults() {
        let cfg = PickParams::default().to_run_config(now()).unwrap();
        assert_eq!(cfg.range.begin_str(), "2026-01-04");
        assert_eq!(cfg.range.end_str(), "2026-01-05");
        assert_eq!(cfg.criteria, SelectionCriteria::default());
        assert_eq!(cfg.budget_per_stock, DEFAULT_BUDGET_PER_STOCK);
    }

    #[test]
    fn submitted_form_without_checkboxes_turns_them_off() {
        let cfg = params(&[
            ("submitted", "1"),
            ("begin", "2026-01-01"),
            ("count", "3"),
            ("budget", "50000"),
        ])
        .to_run_config(now())
        .unwrap();
        assert_eq!(cfg.criteria.rating, None);
        assert!(!cfg.criteria.rank_by_report_count);
        assert_eq!(cfg.criteria.limit, 3);
        assert_eq!(cfg.budget_per_stock, 50_000.0);
    }

    #[test]
    fn empty_boxes_fall_back_and_junk_is_rejected() {
        let cfg = params(&[("count", ""), ("budget", " ")]).to_run_config(now()).unwrap();
        assert_eq!(cfg.criteria.limit, 10);

        let err = params(&[("count", "ten")]).to_run_config(now()).unwrap_err();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
        assert!(params(&[("count", "0")]).to_run_config(now()).is_err());
        assert!(params(&[("begin", "2026/01/01")]).to_run_config(now()).is_err());
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = PickError::TransportOrParse(anyhow::anyhow!("HTTP 503"));
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
    }
}
