//! Integration tests for env-file parsing and the ordered document model

use envref::cli::output::render_env;
use envref::envfile::{parse, EnvDocument, ParseErrorKind};
use envref::ResolvedEntry;
use proptest::prelude::*;

#[test]
fn double_quoted_newline_escape_becomes_real_newline() {
    let entries = parse(r#"KEY="line1\nline2""#).unwrap();
    assert_eq!(entries[0].value, "line1\nline2");
}

#[test]
fn unterminated_single_quote_fails_at_starting_line() {
    let err = parse("FIRST=1\n\n# comment\nKEY='abc\n").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnterminatedSingleQuote);
    assert_eq!(err.line, 4);
    assert!(err.to_string().contains("unterminated single-quoted value"));
    assert_eq!(err.parsed_entries().len(), 1);
    assert_eq!(err.parsed_entries()[0].key, "FIRST");
}

#[test]
fn realistic_file() {
    let text = r#"
# Database
export DB_HOST=db.internal
DB_PORT=5432 # default port
DB_PASS=ref://keychain/db_pass

# Quoting styles
GREETING="Hello,\tWorld"
LITERAL='$HOME stays literal'
PRIVATE_KEY="-----BEGIN KEY-----
MIIB
-----END KEY-----"
SCRIPT=`echo "a"
echo 'b'`
COLOR=#fff
ANCHOR=page#section

not an assignment
DB_PORT=6543
"#;

    let doc = EnvDocument::parse(text).unwrap();

    let keys: Vec<_> = doc.keys().collect();
    assert_eq!(
        keys,
        vec![
            "DB_HOST",
            "DB_PORT",
            "DB_PASS",
            "GREETING",
            "LITERAL",
            "PRIVATE_KEY",
            "SCRIPT",
            "COLOR",
            "ANCHOR"
        ]
    );

    assert_eq!(doc.get("DB_HOST").unwrap().value, "db.internal");
    assert_eq!(doc.get("DB_PORT").unwrap().value, "6543");
    assert!(doc.get("DB_PASS").unwrap().is_ref());
    assert_eq!(doc.get("GREETING").unwrap().value, "Hello,\tWorld");
    assert_eq!(doc.get("LITERAL").unwrap().value, "$HOME stays literal");
    assert_eq!(
        doc.get("PRIVATE_KEY").unwrap().value,
        "-----BEGIN KEY-----\nMIIB\n-----END KEY-----"
    );
    assert_eq!(doc.get("PRIVATE_KEY").unwrap().line, 10);
    assert_eq!(doc.get("SCRIPT").unwrap().value, "echo \"a\"\necho 'b'");
    assert_eq!(doc.get("COLOR").unwrap().value, "#fff");
    assert_eq!(doc.get("ANCHOR").unwrap().value, "page#section");
    assert_eq!(doc.references().count(), 1);
}

#[test]
fn raw_value_preserved_for_diagnostics() {
    let entries = parse("A=  \"quoted\"  # note").unwrap();
    assert_eq!(entries[0].value, "quoted");
    assert_eq!(entries[0].raw, "  \"quoted\"  # note");
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,6}"
}

proptest! {
    #[test]
    fn document_keeps_first_seen_order_and_last_value(
        assignments in prop::collection::vec((key_strategy(), "[a-z0-9]{0,8}"), 0..40)
    ) {
        let text: String = assignments
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect();

        let doc = EnvDocument::parse(&text).unwrap();

        let mut expected_order: Vec<&str> = Vec::new();
        for (key, _) in &assignments {
            if !expected_order.contains(&key.as_str()) {
                expected_order.push(key);
            }
        }
        prop_assert_eq!(doc.keys().collect::<Vec<_>>(), expected_order);

        for key in doc.keys() {
            let last = assignments.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
            prop_assert_eq!(Some(doc.get(key).unwrap().value.as_str()), last);
        }
    }

    #[test]
    fn rendered_env_output_parses_to_same_values(
        values in prop::collection::vec("\\PC{0,12}|[ \\t\\r\\n\"'`#=\\\\]{0,6}", 1..10)
    ) {
        let entries: Vec<ResolvedEntry> = values
            .iter()
            .enumerate()
            .map(|(i, v)| ResolvedEntry { key: format!("K{}", i), value: v.clone(), was_ref: true })
            .collect();

        let doc = EnvDocument::parse(&render_env(&entries)).unwrap();

        for entry in &entries {
            prop_assert_eq!(&doc.get(&entry.key).unwrap().value, &entry.value);
        }
    }
}
