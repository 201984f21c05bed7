/// Трейт для типов идентификаторов агрегатов
///
/// Идентификаторы выдаёт БД (autoincrement), поэтому до первого
/// сохранения агрегат может существовать без постоянного ID.
pub trait AggregateId: Sized {
    /// Строковое представление для API и логов
    fn as_string(&self) -> String;

    /// Разбор из строки (например, из path-параметра запроса)
    fn from_string(s: &str) -> Result<Self, String>;
}
