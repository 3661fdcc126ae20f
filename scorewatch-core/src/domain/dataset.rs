// scorewatch-core/src/domain/dataset.rs

/// In-memory tabular batch. Cells are kept as raw text so that coercion
/// rules (what counts as "missing") live in one place instead of in each reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    cells: Vec<Option<String>>,
}

impl Table {
    /// Builds a table from column names and row-major cells.
    /// Short rows are padded with missing cells, extra cells are ignored.
    pub fn new(
        name: impl Into<String>,
        column_names: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Column> = column_names
            .into_iter()
            .map(|name| Column {
                name,
                cells: Vec::with_capacity(row_count),
            })
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().flatten());
            }
        }

        Self {
            name: name.into(),
            columns,
            row_count,
        }
    }

    /// Convenience constructor used by tests and small fixtures.
    pub fn from_records(name: &str, column_names: &[&str], rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            None
                        } else {
                            Some((*cell).to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(
            name,
            column_names.iter().map(|c| c.to_string()).collect(),
            rows,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Raw cells of a column, `None` if the column does not exist.
    pub fn text_column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.iter().map(|cell| cell.as_deref()).collect())
    }

    /// Column coerced to numbers. Unparseable, empty, NaN and infinite cells become `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.text_column(name)
            .map(|cells| cells.into_iter().map(coerce_numeric).collect())
    }
}

/// Numeric coercion shared by every scorer: anything that is not a finite number is missing.
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Fraction of `None` entries over all entries (0.0 for an empty slice).
pub fn missing_rate(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let missing = values.iter().filter(|v| v.is_none()).count();
    missing as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_treats_inf_and_garbage_as_missing() {
        assert_eq!(coerce_numeric(Some("1.5")), Some(1.5));
        assert_eq!(coerce_numeric(Some(" 42 ")), Some(42.0));
        assert_eq!(coerce_numeric(Some("inf")), None);
        assert_eq!(coerce_numeric(Some("-inf")), None);
        assert_eq!(coerce_numeric(Some("NaN")), None);
        assert_eq!(coerce_numeric(Some("n/a")), None);
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = Table::new(
            "t",
            vec!["a".into(), "b".into()],
            vec![vec![Some("1".into())], vec![Some("2".into()), Some("x".into())]],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.numeric_column("a"), Some(vec![Some(1.0), Some(2.0)]));
        assert_eq!(table.text_column("b"), Some(vec![None, Some("x")]));
        assert!(table.numeric_column("missing").is_none());
    }

    #[test]
    fn test_missing_rate_counts_all_rows() {
        let values = [Some(1.0), None, Some(3.0), None];
        assert!((missing_rate(&values) - 0.5).abs() < 1e-12);
        assert_eq!(missing_rate(&[]), 0.0);
    }
}
