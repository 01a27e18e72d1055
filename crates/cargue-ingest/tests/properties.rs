use cargue_ingest::{CellValue, SheetRows, find_header_row, normalize_digits, strip_non_digits};
use cargue_model::{REQUIRED_COLUMNS, RecordField};
use proptest::prelude::*;

proptest! {
    #[test]
    fn stripped_text_is_all_digits_or_unchanged(text in "\\PC{0,24}") {
        let stripped = strip_non_digits(&text);
        if text.chars().any(|c| c.is_ascii_digit()) {
            prop_assert!(stripped.chars().all(|c| c.is_ascii_digit()));
        } else {
            prop_assert_eq!(stripped, text);
        }
    }

    #[test]
    fn digit_normalization_is_idempotent(text in "[0-9 .,$-]{0,16}[0-9][0-9 .,$-]{0,16}") {
        let once = normalize_digits(&CellValue::from(text.as_str())).unwrap();
        let twice = normalize_digits(&CellValue::from(once.as_str())).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn whole_numbers_render_without_fraction(value in 0u32..=u32::MAX) {
        let rendered = normalize_digits(&CellValue::Number(f64::from(value))).unwrap();
        prop_assert_eq!(rendered, value.to_string());
    }

    #[test]
    fn header_found_under_any_column_order(
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        padding in 0usize..4,
    ) {
        let mut header: Vec<CellValue> = vec![CellValue::Empty; padding];
        header.extend(order.iter().map(|&i| CellValue::from(REQUIRED_COLUMNS[i])));
        let sheet = SheetRows::new(vec![header]);

        let found = find_header_row(&sheet).unwrap();

        for (position, &i) in order.iter().enumerate() {
            prop_assert_eq!(found.column(RecordField::ALL[i]), padding + position);
        }
    }
}
