use std::str::FromStr;

use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::Utc;
use contracts::domain::a001_product_specification::aggregate::{
    DistributionChannel, ProductSpecification, ProductSpecificationId,
};
use contracts::domain::a001_product_specification::ledger::{
    round_currency, DetailRow, RawDetailRow,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::shared::data::db::get_connection;

/// Таблица a001_product_specification (мастер-записи)
pub mod master {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_product_specification")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub brand: String,
        pub line_name: String,
        pub distribution: String,
        pub category_large: String,
        pub category_medium: String,
        pub category_small: String,
        pub product_name_intl: String,
        pub barcode: String,
        pub volume: String,
        /// Денежное значение текстом, два знака после запятой
        pub consumer_price: String,
        pub reference_no: String,
        pub is_functional: bool,
        pub manufacturer: String,
        pub planning_manager: String,
        pub design_manager: String,
        pub supply_chain_manager: String,
        pub is_deleted: bool,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Таблица a001_specification_detail (строки состава)
pub mod detail {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_specification_detail")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub product_id: i64,
        /// Порядок отображения; семантики не несёт
        pub position: i32,
        pub category: String,
        pub sub_category: String,
        pub material: String,
        pub spec: String,
        pub unit_cost: String,
        pub supplier: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<master::Model> for ProductSpecification {
    type Error = anyhow::Error;

    fn try_from(m: master::Model) -> Result<Self> {
        // Нераспознанный канал сбыта — ошибка, а не молчаливый fallback
        let distribution = DistributionChannel::parse(&m.distribution).ok_or_else(|| {
            anyhow::anyhow!(
                "specification {}: unknown distribution channel '{}'",
                m.id,
                m.distribution
            )
        })?;
        let consumer_price = BigDecimal::from_str(&m.consumer_price).map_err(|e| {
            anyhow::anyhow!("specification {}: bad consumer price: {}", m.id, e)
        })?;

        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };

        Ok(ProductSpecification {
            base: BaseAggregate::with_metadata(
                ProductSpecificationId::new(m.id),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            brand: m.brand,
            line_name: m.line_name,
            distribution,
            category_large: m.category_large,
            category_medium: m.category_medium,
            category_small: m.category_small,
            product_name_intl: m.product_name_intl,
            barcode: m.barcode,
            volume: m.volume,
            consumer_price,
            reference_no: m.reference_no,
            is_functional: m.is_functional,
            manufacturer: m.manufacturer,
            planning_manager: m.planning_manager,
            design_manager: m.design_manager,
            supply_chain_manager: m.supply_chain_manager,
        })
    }
}

impl From<detail::Model> for RawDetailRow {
    fn from(m: detail::Model) -> Self {
        RawDetailRow {
            category: Some(m.category),
            sub_category: Some(m.sub_category),
            material: Some(m.material),
            spec: Some(m.spec),
            unit_cost: Some(m.unit_cost),
            supplier: Some(m.supplier),
        }
    }
}

fn master_fields(spec: &ProductSpecification) -> master::ActiveModel {
    master::ActiveModel {
        id: NotSet,
        code: Set(spec.base.code.clone()),
        description: Set(spec.base.description.clone()),
        comment: Set(spec.base.comment.clone()),
        brand: Set(spec.brand.clone()),
        line_name: Set(spec.line_name.clone()),
        distribution: Set(spec.distribution.as_str().to_string()),
        category_large: Set(spec.category_large.clone()),
        category_medium: Set(spec.category_medium.clone()),
        category_small: Set(spec.category_small.clone()),
        product_name_intl: Set(spec.product_name_intl.clone()),
        barcode: Set(spec.barcode.clone()),
        volume: Set(spec.volume.clone()),
        consumer_price: Set(round_currency(&spec.consumer_price).to_string()),
        reference_no: Set(spec.reference_no.clone()),
        is_functional: Set(spec.is_functional),
        manufacturer: Set(spec.manufacturer.clone()),
        planning_manager: Set(spec.planning_manager.clone()),
        design_manager: Set(spec.design_manager.clone()),
        supply_chain_manager: Set(spec.supply_chain_manager.clone()),
        is_deleted: Set(spec.base.metadata.is_deleted),
        created_at: NotSet,
        updated_at: Set(Some(Utc::now())),
        version: Set(spec.base.metadata.version),
    }
}

/// Поиск одной записи по точному или частичному совпадению
/// названия/артикула. Отсутствие совпадения — не ошибка.
pub async fn search(query: &str) -> Result<Option<ProductSpecification>> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(None);
    }

    let db = get_connection();
    let model = master::Entity::find()
        .filter(master::Column::IsDeleted.eq(false))
        .filter(
            Condition::any()
                .add(master::Column::Code.eq(q))
                .add(master::Column::Code.contains(q))
                .add(master::Column::Description.contains(q))
                .add(master::Column::ProductNameIntl.contains(q)),
        )
        .order_by_asc(master::Column::Id)
        .one(db)
        .await?;

    model.map(ProductSpecification::try_from).transpose()
}

pub async fn get_by_id(id: i64) -> Result<Option<ProductSpecification>> {
    let db = get_connection();
    let model = master::Entity::find_by_id(id)
        .filter(master::Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    model.map(ProductSpecification::try_from).transpose()
}

/// Вставка новой мастер-записи; БД присваивает идентификатор
pub async fn insert(spec: &ProductSpecification) -> Result<i64> {
    let db = get_connection();
    let mut active = master_fields(spec);
    active.created_at = Set(Some(Utc::now()));
    active.version = Set(1);

    let result = master::Entity::insert(active).exec(db).await?;
    Ok(result.last_insert_id)
}

pub async fn update(spec: &ProductSpecification) -> Result<()> {
    let db = get_connection();
    let mut active = master_fields(spec);
    active.id = Set(spec.base.id.value());
    active.version = Set(spec.base.metadata.version + 1);

    master::Entity::update(active).exec(db).await?;
    Ok(())
}

/// Строки состава в порядке отображения
pub async fn load_details(product_id: i64) -> Result<Vec<RawDetailRow>> {
    let db = get_connection();
    let models = detail::Entity::find()
        .filter(detail::Column::ProductId.eq(product_id))
        .order_by_asc(detail::Column::Position)
        .all(db)
        .await?;
    Ok(models.into_iter().map(RawDetailRow::from).collect())
}

/// Заменить весь состав записи новым набором строк
pub async fn replace_details(product_id: i64, rows: &[DetailRow]) -> Result<()> {
    let db = get_connection();

    detail::Entity::delete_many()
        .filter(detail::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    if rows.is_empty() {
        return Ok(());
    }

    let models: Vec<detail::ActiveModel> = rows
        .iter()
        .enumerate()
        .map(|(position, row)| detail::ActiveModel {
            id: NotSet,
            product_id: Set(row.product_id),
            position: Set(position as i32),
            category: Set(row.category.as_str().to_string()),
            sub_category: Set(row.sub_category.clone()),
            material: Set(row.material.clone()),
            spec: Set(row.spec.clone()),
            unit_cost: Set(row.unit_cost.to_string()),
            supplier: Set(row.supplier.clone()),
        })
        .collect();

    detail::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// Soft delete мастера; состав (композиция) удаляется вместе с ним
pub async fn delete(id: i64) -> Result<bool> {
    let db = get_connection();

    let Some(model) = master::Entity::find_by_id(id)
        .filter(master::Column::IsDeleted.eq(false))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    let mut active: master::ActiveModel = model.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Some(Utc::now()));
    master::Entity::update(active).exec(db).await?;

    detail::Entity::delete_many()
        .filter(detail::Column::ProductId.eq(id))
        .exec(db)
        .await?;

    Ok(true)
}
