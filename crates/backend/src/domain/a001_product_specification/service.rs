use std::str::FromStr;

use bigdecimal::BigDecimal;
use contracts::domain::a001_product_specification::aggregate::{
    ProductSpecification, ProductSpecificationDto, ProductSpecificationId,
};
use contracts::domain::a001_product_specification::ledger::{
    round_currency, LedgerError, LineItemLedger,
};
use contracts::domain::a001_product_specification::session::EditingSession;
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use thiserror::Error;

use super::repository;
use crate::shared::sheets::{self, SheetsError, SpreadsheetClient};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("field '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("specification {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    External(#[from] SheetsError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Ошибки, вызванные пользовательским вводом (HTTP 422)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ServiceError::MissingField(_)
                | ServiceError::InvalidField { .. }
                | ServiceError::Ledger(_)
        )
    }
}

/// Найти запись по строке поиска и открыть сеанс редактирования.
/// Пустой запрос и отсутствие совпадений — `Ok(None)`, не ошибка.
pub async fn load(query: &str) -> Result<Option<EditingSession>, ServiceError> {
    let Some(spec) = repository::search(query).await? else {
        return Ok(None);
    };

    let raw = repository::load_details(spec.base.id.value()).await?;
    let ledger = LineItemLedger::load(&raw)?;
    Ok(Some(EditingSession::from_record(&spec, ledger)))
}

pub async fn get(id: i64) -> Result<Option<EditingSession>, ServiceError> {
    let Some(spec) = repository::get_by_id(id).await? else {
        return Ok(None);
    };

    let raw = repository::load_details(id).await?;
    let ledger = LineItemLedger::load(&raw)?;
    Ok(Some(EditingSession::from_record(&spec, ledger)))
}

fn parse_price(raw: &str) -> Result<BigDecimal, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(BigDecimal::from(0));
    }
    let price = BigDecimal::from_str(trimmed).map_err(|_| ServiceError::InvalidField {
        field: "consumerPrice",
        message: format!("'{}' is not a decimal number", trimmed),
    })?;
    if price < BigDecimal::from(0) {
        return Err(ServiceError::InvalidField {
            field: "consumerPrice",
            message: "must not be negative".to_string(),
        });
    }
    Ok(round_currency(&price))
}

fn build_aggregate(
    dto: &ProductSpecificationDto,
    id: i64,
    metadata: EntityMetadata,
) -> Result<ProductSpecification, ServiceError> {
    let item_code = dto.item_code.trim();
    if item_code.is_empty() {
        return Err(ServiceError::MissingField("itemCode"));
    }
    let product_name = dto.product_name.trim();
    if product_name.is_empty() {
        return Err(ServiceError::MissingField("productName"));
    }

    Ok(ProductSpecification {
        base: BaseAggregate::with_metadata(
            ProductSpecificationId::new(id),
            item_code.to_string(),
            product_name.to_string(),
            dto.comment.clone(),
            metadata,
        ),
        brand: dto.brand.trim().to_string(),
        line_name: dto.line_name.trim().to_string(),
        distribution: dto.distribution,
        category_large: dto.category_large.trim().to_string(),
        category_medium: dto.category_medium.trim().to_string(),
        category_small: dto.category_small.trim().to_string(),
        product_name_intl: dto.product_name_intl.trim().to_string(),
        barcode: dto.barcode.trim().to_string(),
        volume: dto.volume.trim().to_string(),
        consumer_price: parse_price(&dto.consumer_price)?,
        reference_no: dto.reference_no.trim().to_string(),
        is_functional: dto.is_functional,
        manufacturer: dto.manufacturer.trim().to_string(),
        planning_manager: dto.planning_manager.trim().to_string(),
        design_manager: dto.design_manager.trim().to_string(),
        supply_chain_manager: dto.supply_chain_manager.trim().to_string(),
    })
}

/// Сохранить мастер-запись вместе с составом.
///
/// Новая запись (id отсутствует) получает идентификатор от БД, после
/// чего состав пишется уже с настоящим id. Пустой менеджер планирования
/// заполняется именем текущего пользователя.
pub async fn save(
    mut dto: ProductSpecificationDto,
    default_planning_manager: Option<&str>,
) -> Result<i64, ServiceError> {
    if dto.planning_manager.trim().is_empty() {
        if let Some(name) = default_planning_manager {
            dto.planning_manager = name.to_string();
        }
    }

    let mut ledger = LineItemLedger::reset();
    ledger.upsert_rows(dto.line_items.clone());

    let id = match dto.id {
        Some(id) if id > 0 => {
            let existing = repository::get_by_id(id)
                .await?
                .ok_or(ServiceError::NotFound(id))?;
            let spec = build_aggregate(&dto, id, existing.base.metadata.clone())?;
            repository::update(&spec).await?;
            id
        }
        _ => {
            let spec = build_aggregate(&dto, 0, EntityMetadata::new())?;
            repository::insert(&spec).await?
        }
    };

    let rows = ledger.to_persistable_rows(id)?;
    repository::replace_details(id, &rows).await?;

    tracing::info!("saved product specification {} ({})", id, dto.item_code);
    Ok(id)
}

pub async fn delete(id: i64) -> Result<(), ServiceError> {
    if repository::delete(id).await? {
        tracing::info!("deleted product specification {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound(id))
    }
}

/// Выгрузить запись в новую онлайн-таблицу, вернуть её URL
pub async fn export_to_sheet<C: SpreadsheetClient>(
    client: &C,
    id: i64,
) -> Result<String, ServiceError> {
    let session = get(id).await?.ok_or(ServiceError::NotFound(id))?;

    let title = format!(
        "{} - {}",
        session.master.item_code, session.master.product_name
    );
    let master = sheets::cell_map::master_cell_writes(&session.master);
    let block = session.ledger.to_spreadsheet_block();

    let url = client
        .create_specification_sheet(&title, &master, block)
        .await?;

    tracing::info!("exported specification {} to {}", id, url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(item_code: &str, product_name: &str) -> ProductSpecificationDto {
        ProductSpecificationDto {
            item_code: item_code.to_string(),
            product_name: product_name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn aggregate_requires_item_code_and_product_name() {
        let err = build_aggregate(&dto("", "Крем для рук"), 0, EntityMetadata::new())
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("required field 'itemCode' is empty"));

        let err = build_aggregate(&dto("SKU-1", "   "), 0, EntityMetadata::new())
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("required field 'productName' is empty"));
    }

    #[test]
    fn price_parsing_defaults_and_rounds() {
        assert_eq!(parse_price("").unwrap().to_string(), "0");
        assert_eq!(parse_price("10.005").unwrap().to_string(), "10.01");
        assert!(parse_price("-1").is_err());
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn validation_classification() {
        assert!(ServiceError::MissingField("itemCode").is_validation());
        assert!(!ServiceError::NotFound(7).is_validation());
    }
}
