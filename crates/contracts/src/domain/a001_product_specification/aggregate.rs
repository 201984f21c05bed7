use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::a001_product_specification::ledger::LineItem;
use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор спецификации продукта (autoincrement, выдаёт БД)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductSpecificationId(pub i64);

impl ProductSpecificationId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl AggregateId for ProductSpecificationId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        s.parse::<i64>()
            .map(ProductSpecificationId::new)
            .map_err(|e| format!("Invalid id: {}", e))
    }
}

// ============================================================================
// Distribution channel
// ============================================================================

/// Канал сбыта продукта
///
/// Отображение в индекс выпадающего списка тотально по enum: нет
/// молчаливого "всё неизвестное считаем внутренним рынком" — незнакомое
/// сохранённое значение является ошибкой разбора.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionChannel {
    Domestic,
    Export,
}

impl DistributionChannel {
    pub const ALL: [DistributionChannel; 2] =
        [DistributionChannel::Domestic, DistributionChannel::Export];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionChannel::Domestic => "domestic",
            DistributionChannel::Export => "export",
        }
    }

    /// Разбор строкового значения. Точное совпадение.
    pub fn parse(s: &str) -> Option<DistributionChannel> {
        match s {
            "domestic" => Some(DistributionChannel::Domestic),
            "export" => Some(DistributionChannel::Export),
            _ => None,
        }
    }

    /// Позиция в выпадающем списке (тотально по enum)
    pub fn to_index(&self) -> usize {
        match self {
            DistributionChannel::Domestic => 0,
            DistributionChannel::Export => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<DistributionChannel> {
        Self::ALL.get(index).copied()
    }
}

impl Default for DistributionChannel {
    // Значение по умолчанию для новой (пустой) формы
    fn default() -> Self {
        DistributionChannel::Domestic
    }
}

impl std::fmt::Display for DistributionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Спецификация продукта (агрегат a001)
///
/// Мастер-запись одной товарной спецификации. `base.code` — артикул
/// (item code), `base.description` — название продукта на локальном языке.
/// Строки состава хранятся отдельной таблицей и живут в `LineItemLedger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpecification {
    #[serde(flatten)]
    pub base: BaseAggregate<ProductSpecificationId>,

    pub brand: String,
    pub line_name: String,
    pub distribution: DistributionChannel,

    /// Классификация: большая/средняя/малая категории
    pub category_large: String,
    pub category_medium: String,
    pub category_small: String,

    /// Название продукта на международном языке
    pub product_name_intl: String,
    pub barcode: String,
    pub volume: String,
    pub consumer_price: BigDecimal,
    pub reference_no: String,
    /// Признак функционального продукта
    pub is_functional: bool,
    pub manufacturer: String,

    /// Ответственные
    pub planning_manager: String,
    pub design_manager: String,
    pub supply_chain_manager: String,
}

impl AggregateRoot for ProductSpecification {
    type Id = ProductSpecificationId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "product_specification"
    }

    fn element_name() -> &'static str {
        "Спецификация продукта"
    }

    fn list_name() -> &'static str {
        "Спецификации продуктов"
    }
}

// ============================================================================
// DTO
// ============================================================================

/// DTO спецификации для API (payload сохранения и ответ загрузки)
///
/// Денежные поля передаются строками — десятичная точность не должна
/// проходить через f64 на границе JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSpecificationDto {
    pub id: Option<i64>,
    #[serde(rename = "itemCode")]
    pub item_code: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub comment: Option<String>,

    #[serde(default)]
    pub brand: String,
    #[serde(rename = "lineName", default)]
    pub line_name: String,
    #[serde(default)]
    pub distribution: DistributionChannel,

    #[serde(rename = "categoryLarge", default)]
    pub category_large: String,
    #[serde(rename = "categoryMedium", default)]
    pub category_medium: String,
    #[serde(rename = "categorySmall", default)]
    pub category_small: String,

    #[serde(rename = "productNameIntl", default)]
    pub product_name_intl: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub volume: String,
    #[serde(rename = "consumerPrice", default)]
    pub consumer_price: String,
    #[serde(rename = "referenceNo", default)]
    pub reference_no: String,
    #[serde(rename = "isFunctional", default)]
    pub is_functional: bool,
    #[serde(default)]
    pub manufacturer: String,

    #[serde(rename = "planningManager", default)]
    pub planning_manager: String,
    #[serde(rename = "designManager", default)]
    pub design_manager: String,
    #[serde(rename = "supplyChainManager", default)]
    pub supply_chain_manager: String,

    /// Текущее состояние таблицы состава (включая незаполненные строки)
    #[serde(rename = "lineItems", default)]
    pub line_items: Vec<LineItem>,
}

impl From<&ProductSpecification> for ProductSpecificationDto {
    fn from(spec: &ProductSpecification) -> Self {
        Self {
            id: Some(spec.base.id.value()),
            item_code: spec.base.code.clone(),
            product_name: spec.base.description.clone(),
            comment: spec.base.comment.clone(),
            brand: spec.brand.clone(),
            line_name: spec.line_name.clone(),
            distribution: spec.distribution,
            category_large: spec.category_large.clone(),
            category_medium: spec.category_medium.clone(),
            category_small: spec.category_small.clone(),
            product_name_intl: spec.product_name_intl.clone(),
            barcode: spec.barcode.clone(),
            volume: spec.volume.clone(),
            consumer_price: spec.consumer_price.to_string(),
            reference_no: spec.reference_no.clone(),
            is_functional: spec.is_functional,
            manufacturer: spec.manufacturer.clone(),
            planning_manager: spec.planning_manager.clone(),
            design_manager: spec.design_manager.clone(),
            supply_chain_manager: spec.supply_chain_manager.clone(),
            line_items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_channel_index_mapping_is_total() {
        for channel in DistributionChannel::ALL {
            assert_eq!(
                DistributionChannel::from_index(channel.to_index()),
                Some(channel)
            );
        }
        assert_eq!(DistributionChannel::from_index(2), None);
    }

    #[test]
    fn distribution_channel_parse_rejects_unknown_values() {
        assert_eq!(
            DistributionChannel::parse("export"),
            Some(DistributionChannel::Export)
        );
        // никакого молчаливого fallback на domestic
        assert_eq!(DistributionChannel::parse("EXPORT"), None);
        assert_eq!(DistributionChannel::parse("common"), None);
        assert_eq!(DistributionChannel::parse(""), None);
    }

    #[test]
    fn id_round_trips_through_string() {
        let id = ProductSpecificationId::new(42);
        assert_eq!(id.as_string(), "42");
        assert_eq!(
            ProductSpecificationId::from_string("42").unwrap(),
            id
        );
        assert!(ProductSpecificationId::from_string("abc").is_err());
    }
}
