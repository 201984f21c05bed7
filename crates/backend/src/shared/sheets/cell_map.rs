use contracts::domain::a001_product_specification::aggregate::ProductSpecificationDto;

use super::CellWrite;

/// Левая верхняя ячейка блока состава (заголовок + строки)
pub const DETAIL_BLOCK_ORIGIN: &str = "A12";

/// Фиксированное соответствие мастер-полей ячейкам шаблона листа.
/// Таблица поддерживается вручную: при изменении шаблона правится
/// только она, Ledger о координатах ничего не знает.
pub fn master_cell_writes(master: &ProductSpecificationDto) -> Vec<CellWrite> {
    vec![
        CellWrite {
            cell: "B2",
            value: master.brand.clone(),
        },
        CellWrite {
            cell: "B3",
            value: master.line_name.clone(),
        },
        CellWrite {
            cell: "B4",
            value: master.distribution.as_str().to_string(),
        },
        CellWrite {
            cell: "D2",
            value: master.category_large.clone(),
        },
        CellWrite {
            cell: "D3",
            value: master.category_medium.clone(),
        },
        CellWrite {
            cell: "D4",
            value: master.category_small.clone(),
        },
        CellWrite {
            cell: "F2",
            value: master.product_name.clone(),
        },
        CellWrite {
            cell: "F3",
            value: master.product_name_intl.clone(),
        },
        CellWrite {
            cell: "F4",
            value: if master.is_functional { "Y" } else { "N" }.to_string(),
        },
        CellWrite {
            cell: "B6",
            value: master.item_code.clone(),
        },
        CellWrite {
            cell: "D6",
            value: master.barcode.clone(),
        },
        CellWrite {
            cell: "F6",
            value: master.volume.clone(),
        },
        CellWrite {
            cell: "B7",
            value: master.consumer_price.clone(),
        },
        CellWrite {
            cell: "D7",
            value: master.reference_no.clone(),
        },
        CellWrite {
            cell: "F7",
            value: master.manufacturer.clone(),
        },
        CellWrite {
            cell: "B9",
            value: master.planning_manager.clone(),
        },
        CellWrite {
            cell: "D9",
            value: master.design_manager.clone(),
        },
        CellWrite {
            cell: "F9",
            value: master.supply_chain_manager.clone(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_master_field_maps_to_a_unique_cell() {
        let writes = master_cell_writes(&ProductSpecificationDto::default());
        let cells: HashSet<&str> = writes.iter().map(|w| w.cell).collect();
        assert_eq!(cells.len(), writes.len());
        assert!(!cells.contains(DETAIL_BLOCK_ORIGIN));
    }

    #[test]
    fn functional_flag_renders_as_letter() {
        let mut dto = ProductSpecificationDto::default();
        dto.is_functional = true;
        let writes = master_cell_writes(&dto);
        let flag = writes.iter().find(|w| w.cell == "F4").unwrap();
        assert_eq!(flag.value, "Y");

        dto.is_functional = false;
        let writes = master_cell_writes(&dto);
        let flag = writes.iter().find(|w| w.cell == "F4").unwrap();
        assert_eq!(flag.value, "N");
    }
}
