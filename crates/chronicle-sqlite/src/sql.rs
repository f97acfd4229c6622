//! Small SQL text builders shared by the DDL and trigger generators.

/// Quote an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

/// `"a", "b", "c"`
pub fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
  columns
    .iter()
    .map(|c| quote_ident(c.as_ref()))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `NEW."a", NEW."b"`: columns of a trigger pseudo-row.
pub fn pseudo_row_list<S: AsRef<str>>(pseudo: &str, columns: &[S]) -> String {
  columns
    .iter()
    .map(|c| format!("{pseudo}.{}", quote_ident(c.as_ref())))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `"a" IS OLD."a" AND "b" IS OLD."b"`
///
/// `IS` rather than `=` so NULL key values (legal in non-integer SQLite
/// primary keys) still match.
pub fn key_match<S: AsRef<str>>(pseudo: &str, columns: &[S]) -> String {
  columns
    .iter()
    .map(|c| {
      let col = quote_ident(c.as_ref());
      format!("{col} IS {pseudo}.{col}")
    })
    .collect::<Vec<_>>()
    .join(" AND ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quotes_embedded_quotes() {
    assert_eq!(quote_ident("dogs"), "\"dogs\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
  }

  #[test]
  fn composite_key_fragments() {
    let keys = ["owner", "name"];
    assert_eq!(column_list(&keys), "\"owner\", \"name\"");
    assert_eq!(pseudo_row_list("NEW", &keys), "NEW.\"owner\", NEW.\"name\"");
    assert_eq!(
      key_match("OLD", &keys),
      "\"owner\" IS OLD.\"owner\" AND \"name\" IS OLD.\"name\""
    );
  }
}
