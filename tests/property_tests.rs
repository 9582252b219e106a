//! Property-based tests for the database access layer
//!
//! These tests verify through property-based testing that:
//! - Escaped text survives interpolation and comes back unchanged
//! - Formatting then executing equals executing the pre-expanded literal
//! - Overflowing templates never reach the database
//! - Permissive numeric decoding matches its documented rules

#[cfg(test)]
mod tests {
    use panel_db::core::db::{Database, Field, QueryFormatter, QueryOutcome};
    use panel_db::query_args;
    use proptest::prelude::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    // Test infrastructure

    /// Creates a host directory with a `notes` table seeded with `values`
    fn seeded_host(values: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let conn = Connection::open(dir.path().join("panel.sqlite")).unwrap();
        conn.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)", [])
            .unwrap();
        for value in values {
            conn.execute("INSERT INTO notes (body) VALUES (?)", [value]).unwrap();
        }
        dir
    }

    fn connect(dir: &TempDir, capacity: usize) -> Database {
        let mut db = Database::with_capacity(capacity);
        db.connect(&dir.path().to_string_lossy(), "panel", "", 0, "panel")
            .unwrap();
        db
    }

    /// Text without NUL: quotes, backslashes and multi-byte characters included
    fn arb_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "[^\u{0}]{0,40}",
            "['\\\\a-z ]{0,20}",
            "[äöü€✓日本語'\"]{1,10}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn escaped_text_round_trips(text in arb_text()) {
            let dir = seeded_host(&[text.as_str()]);
            let mut db = connect(&dir, 4096);

            let escaped = db.escape(&text).unwrap();
            let outcome = db.execute_formatted(
                "SELECT body FROM notes WHERE body = '%s'",
                &query_args![escaped],
            );

            prop_assert_eq!(outcome, QueryOutcome::Rows(1), "error: {}", db.last_error());
            prop_assert_eq!(db.first_row().unwrap().field(0).unwrap().as_text(), text.as_str());
        }

        #[test]
        fn formatting_is_transparent(
            signed in any::<i64>(),
            unsigned in any::<u32>(),
            word in "[a-zA-Z0-9 ]{0,30}",
        ) {
            let dir = seeded_host(&["first", "second"]);
            let mut db = connect(&dir, 512);
            let template = "SELECT %d, %u, '%s', COUNT(*) FROM notes";

            let literal = QueryFormatter::new(512)
                .format(template, &query_args![signed, unsigned, word.as_str()])
                .unwrap();

            let formatted = db.execute_formatted(template, &query_args![signed, unsigned, word.as_str()]);
            let formatted_result = db.result().clone();

            db.set_query(literal);
            let direct = db.run();

            prop_assert_eq!(formatted, direct);
            prop_assert_eq!(db.result(), &formatted_result);
            prop_assert_eq!(db.first_row().unwrap().field(0).unwrap().as_integer(), signed);
            prop_assert_eq!(db.first_row().unwrap().field(1).unwrap().as_unsigned(), unsigned as u64);
        }

        #[test]
        fn overflow_never_reaches_database(extra in 0usize..200) {
            let dir = seeded_host(&[]);
            let capacity = 128;
            let mut db = connect(&dir, capacity);
            let template = "INSERT INTO notes (body) VALUES ('%s')";
            let body = "x".repeat(capacity + extra);

            let outcome = db.execute_formatted(template, &query_args![body]);
            prop_assert_eq!(outcome, QueryOutcome::Overflow);

            db.execute("SELECT COUNT(*) FROM notes");
            prop_assert_eq!(db.first_row().unwrap().field(0).unwrap().as_unsigned(), 0);
        }

        #[test]
        fn repeated_execute_is_stable(values in prop::collection::vec("[a-z]{1,8}", 0..6)) {
            let refs: Vec<&str> = values.iter().map(String::as_str).collect();
            let dir = seeded_host(&refs);
            let mut db = connect(&dir, 512);

            let first = db.execute("SELECT id, body FROM notes ORDER BY id");
            let snapshot = db.result().clone();
            let second = db.execute("SELECT id, body FROM notes ORDER BY id");

            prop_assert_eq!(first, second);
            prop_assert_eq!(db.row_count(), values.len());
            prop_assert_eq!(db.result(), &snapshot);
        }

        #[test]
        fn unsigned_decode_of_numbers(n in any::<u64>(), suffix in "[a-z ]{0,5}") {
            prop_assert_eq!(Field::text(n.to_string()).as_unsigned(), n);
            prop_assert_eq!(Field::text(format!("  {}{}", n, suffix)).as_unsigned(), n);
        }

        #[test]
        fn non_numeric_text_decodes_to_zero(text in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
            let field = Field::text(text);
            prop_assert_eq!(field.as_unsigned(), 0);
            prop_assert_eq!(field.as_integer(), 0);
            prop_assert!(!field.as_bool());
        }
    }
}
