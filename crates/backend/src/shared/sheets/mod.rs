pub mod cell_map;
pub mod client;

use async_trait::async_trait;
use thiserror::Error;

/// Запись одного значения в ячейку листа (A1-нотация)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub cell: &'static str,
    pub value: String,
}

/// Ошибки внешнего табличного сервиса. Не интерпретируются —
/// сообщение коллаборатора показывается пользователю как есть.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("spreadsheet auth failed: {0}")]
    Auth(String),

    #[error("spreadsheet API error: {0}")]
    Api(String),

    #[error("spreadsheet request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Внешний интерфейс выгрузки спецификации в таблицу
#[async_trait]
pub trait SpreadsheetClient {
    /// Создать документ: одиночные записи мастер-полей по фиксированным
    /// координатам и один блок строк состава. Возвращает URL документа.
    async fn create_specification_sheet(
        &self,
        title: &str,
        master: &[CellWrite],
        detail_block: Vec<Vec<String>>,
    ) -> Result<String, SheetsError>;
}
