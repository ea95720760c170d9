//! Reserved words.
//!
//! Lists are kept sorted so lookups can binary-search an uppercased word.

/// Words reserved by ANSI SQL and every supported dialect.
pub const STANDARD: &[&str] = &[
    "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
    "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE",
    "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DELETE", "DESC",
    "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR",
    "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT",
    "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULL",
    "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RIGHT", "ROW",
    "SELECT", "SET", "SOME", "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE", "UPDATE",
    "USER", "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Extra words reserved by MySQL.
pub const MYSQL: &[&str] = &[
    "ACCESSIBLE", "ADD", "ANALYZE", "BEFORE", "BIGINT", "BINARY", "BLOB", "BOTH", "CALL",
    "CASCADE", "CHANGE", "CHAR", "CHARACTER", "CONDITION", "CONTINUE", "CONVERT",
    "DATABASE", "DATABASES", "DAY_HOUR", "DEC", "DECIMAL", "DECLARE", "DELAYED", "DESCRIBE",
    "DIV", "DOUBLE", "DUAL", "EACH", "ELSEIF", "ENCLOSED", "ESCAPED", "EXIT", "EXPLAIN",
    "FLOAT", "FORCE", "FULLTEXT", "GENERATED", "GROUPS", "HIGH_PRIORITY", "IF", "IGNORE",
    "INDEX", "INFILE", "INT", "INTEGER", "INTERVAL", "ITERATE", "KEY", "KEYS", "KILL",
    "LEADING", "LEAVE", "LINES", "LOAD", "LOCK", "LONG", "LOOP", "MATCH", "MOD", "OPTION",
    "OUT", "PARTITION", "PROCEDURE", "RANGE", "RANK", "READ", "REGEXP", "RELEASE", "RENAME",
    "REPEAT", "REPLACE", "REQUIRE", "RESTRICT", "RETURN", "REVOKE", "RLIKE", "ROWS",
    "SCHEMA", "SEPARATOR", "SHOW", "SIGNAL", "SPATIAL", "SQL", "STARTING", "STORED",
    "TERMINATED", "TRAILING", "TRIGGER", "UNDO", "UNLOCK", "UNSIGNED", "USAGE", "USE",
    "VARCHAR", "VIRTUAL", "WHILE", "WRITE", "XOR", "ZEROFILL",
];

/// Extra words reserved by PostgreSQL.
pub const POSTGRES: &[&str] = &[
    "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BINARY", "BOTH", "CONCURRENTLY",
    "DEFERRABLE", "DO", "FREEZE", "ILIKE", "INITIALLY", "ISNULL", "LATERAL", "LEADING",
    "LOCALTIME", "LOCALTIMESTAMP", "NOTNULL", "ONLY", "OVERLAPS", "PLACING", "RETURNING",
    "SESSION_USER", "SIMILAR", "SYMMETRIC", "TABLESAMPLE", "TRAILING", "VARIADIC",
    "VERBOSE",
];

/// Extra words reserved by SQLite.
pub const SQLITE: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN",
    "CASCADE", "COMMIT", "CONFLICT", "DATABASE", "DEFERRABLE", "DEFERRED", "DETACH", "EACH",
    "ESCAPE", "EXCLUSIVE", "EXPLAIN", "FAIL", "GLOB", "IF", "IGNORE", "IMMEDIATE", "INDEX",
    "INDEXED", "INITIALLY", "INSTEAD", "ISNULL", "KEY", "MATCH", "NO", "NOTNULL", "OF",
    "PLAN", "PRAGMA", "QUERY", "RAISE", "RECURSIVE", "REGEXP", "REINDEX", "RELEASE",
    "RENAME", "REPLACE", "RESTRICT", "ROLLBACK", "SAVEPOINT", "TEMP", "TEMPORARY",
    "TRANSACTION", "TRIGGER", "VACUUM", "VIEW", "VIRTUAL", "WITHOUT",
];

/// Returns true when `word` appears in the sorted `list` (case-insensitive).
#[must_use]
pub fn contains(list: &[&str], word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    list.binary_search(&upper.as_str()).is_ok()
}

/// Returns true when `word` is reserved by standard SQL.
#[must_use]
pub fn is_standard(word: &str) -> bool {
    contains(STANDARD, word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sorted(list: &[&str]) {
        for pair in list.windows(2) {
            assert!(pair[0] < pair[1], "{} must sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_lists_are_sorted() {
        assert_sorted(STANDARD);
        assert_sorted(MYSQL);
        assert_sorted(POSTGRES);
        assert_sorted(SQLITE);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(is_standard("order"));
        assert!(is_standard("Select"));
        assert!(!is_standard("status"));
        assert!(contains(MYSQL, "key"));
        assert!(!is_standard("key"));
    }
}
