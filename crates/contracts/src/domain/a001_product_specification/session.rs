use serde::{Deserialize, Serialize};

use super::aggregate::{ProductSpecification, ProductSpecificationDto};
use super::ledger::LineItemLedger;

/// Состояние одного сеанса редактирования спецификации
///
/// Явный объект, которым владеет вызывающая сторона: мастер-поля формы
/// плюс таблица состава. Никакого глобального изменяемого состояния
/// между обработчиками.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditingSession {
    pub master: ProductSpecificationDto,
    pub ledger: LineItemLedger,
}

impl EditingSession {
    /// Пустой сеанс (режим "новая запись")
    pub fn new_entry() -> Self {
        Self::default()
    }

    /// Сеанс поверх загруженной из БД записи
    pub fn from_record(spec: &ProductSpecification, ledger: LineItemLedger) -> Self {
        Self {
            master: ProductSpecificationDto::from(spec),
            ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_session_is_blank() {
        let session = EditingSession::new_entry();
        assert_eq!(session.master.id, None);
        assert!(session.ledger.rows().is_empty());
        assert!(session.ledger.cost_by_category().is_empty());
    }
}
