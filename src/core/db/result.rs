/// Result Buffer Module
///
/// Holds the fully materialized output of one query: column names plus every
/// row, copied out of the connection before `execute` returns. Borrowed rows
/// cannot outlive the next `execute` on the owning `Database`.

use super::field::Field;

/// One record of a result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    /// Creates a row from its fields
    pub fn new(fields: Vec<Field>) -> Self {
        Row { fields }
    }

    /// Field at `index`, or None past the last column
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Number of fields (the column count of the originating query)
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates the fields in column order
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Buffered rows of a single query execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Creates a result set from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        ResultSet { columns, rows }
    }

    /// Number of buffered rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows are buffered
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`; out-of-range yields None
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// First row, if any
    pub fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// All rows in server order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Column names in select order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the first column called `name` (ASCII case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// Field of `row` in the column called `name`
    pub fn field_by_name<'a>(&self, row: &'a Row, name: &str) -> Option<&'a Field> {
        self.column_index(name).and_then(|index| row.field(index))
    }

    /// Drops every buffered row and column name
    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["username".to_string(), "id".to_string()],
            vec![
                Row::new(vec![Field::text("alice"), Field::text("7")]),
                Row::new(vec![Field::text("bob"), Field::null()]),
            ],
        )
    }

    #[test]
    fn test_row_access() {
        let result = sample();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.first_row().unwrap().field(0).unwrap().as_text(), "alice");
        assert_eq!(result.row(1).unwrap().field(0).unwrap().as_text(), "bob");
        assert!(result.row(2).is_none());
        assert!(result.row(usize::MAX).is_none());
        assert!(result.first_row().unwrap().field(2).is_none());
    }

    #[test]
    fn test_named_access() {
        let result = sample();
        let row = result.first_row().unwrap();
        assert_eq!(result.column_index("ID"), Some(1));
        assert_eq!(result.field_by_name(row, "id").unwrap().as_unsigned(), 7);
        assert!(result.field_by_name(row, "email").is_none());
    }

    #[test]
    fn test_iteration_and_clear() {
        let mut result = sample();
        let texts: Vec<&str> = result.rows()[0].iter().map(Field::as_text).collect();
        assert_eq!(texts, vec!["alice", "7"]);

        result.clear();
        assert!(result.is_empty());
        assert!(result.columns().is_empty());
        assert!(result.first_row().is_none());
    }
}
