use std::collections::BTreeMap;

use axum::{
    extract::{Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use contracts::domain::a001_product_specification::aggregate::ProductSpecificationDto;
use contracts::domain::a001_product_specification::session::EditingSession;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::a001_product_specification::service::{self, ServiceError};
use crate::shared::config::get_config;
use crate::shared::sheets::client::GoogleSheetsClient;
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// Итоги по составу для формы: общая себестоимость и разбивка по
/// категориям. Денежные значения строками с двумя знаками.
#[derive(Debug, Serialize)]
pub struct CostSummary {
    #[serde(rename = "totalCost")]
    pub total_cost: String,
    #[serde(rename = "byCategory")]
    pub by_category: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SpecificationResponse {
    #[serde(flatten)]
    pub record: ProductSpecificationDto,
    pub summary: CostSummary,
}

fn to_response(session: EditingSession) -> SpecificationResponse {
    let mut record = session.master;
    record.line_items = session.ledger.rows().to_vec();

    let by_category = session
        .ledger
        .cost_by_category()
        .into_iter()
        .map(|(category, sum)| (category.as_str().to_string(), sum.to_string()))
        .collect();

    SpecificationResponse {
        summary: CostSummary {
            total_cost: session.ledger.total_cost().to_string(),
            by_category,
        },
        record,
    }
}

fn error_response(err: ServiceError) -> (StatusCode, ResponseJson<Value>) {
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::External(_) => StatusCode::BAD_GATEWAY,
        _ => {
            tracing::error!("product specification handler error: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, ResponseJson(json!({ "error": err.to_string() })))
}

/// GET /api/product_specification/search?q=
///
/// Отсутствие совпадения — 404 с текстом, который форма показывает
/// пользователю; пустой запрос трактуется так же.
pub async fn search(
    Query(params): Query<SearchParams>,
) -> Result<ResponseJson<SpecificationResponse>, (StatusCode, ResponseJson<Value>)> {
    match service::load(&params.q).await {
        Ok(Some(session)) => Ok(ResponseJson(to_response(session))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            ResponseJson(json!({ "error": format!("no specification matches '{}'", params.q.trim()) })),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/product_specification/:id
pub async fn get_by_id(
    Path(id): Path<i64>,
) -> Result<ResponseJson<SpecificationResponse>, (StatusCode, ResponseJson<Value>)> {
    match service::get(id).await {
        Ok(Some(session)) => Ok(ResponseJson(to_response(session))),
        Ok(None) => Err(error_response(ServiceError::NotFound(id))),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /api/product_specification
///
/// Создание и обновление одним маршрутом: payload без id создаёт
/// запись, с id — перезаписывает существующую вместе с составом.
pub async fn save(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<ProductSpecificationDto>,
) -> Result<ResponseJson<Value>, (StatusCode, ResponseJson<Value>)> {
    match service::save(dto, Some(&claims.username)).await {
        Ok(id) => Ok(ResponseJson(json!({ "id": id }))),
        Err(e) => Err(error_response(e)),
    }
}

/// DELETE /api/product_specification/:id
pub async fn delete(
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, ResponseJson<Value>)> {
    match service::delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /api/product_specification/:id/export-sheet
pub async fn export_sheet(
    Path(id): Path<i64>,
) -> Result<ResponseJson<Value>, (StatusCode, ResponseJson<Value>)> {
    let config = get_config();
    let Some(sheets_config) = config.sheets.clone() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            ResponseJson(json!({ "error": "spreadsheet export is not configured" })),
        ));
    };

    let client = GoogleSheetsClient::new(sheets_config)
        .map_err(|e| error_response(ServiceError::External(e)))?;

    match service::export_to_sheet(&client, id).await {
        Ok(url) => Ok(ResponseJson(json!({ "url": url }))),
        Err(e) => Err(error_response(e)),
    }
}
