//! Helper functions for CLI operations

use anyhow::{bail, Context, Result};
use gitrows_core::{Column, Filter, Value, SCHEMA};
use gitrows_index::RepositoryPool;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Builds the repository pool from `--repos` and `--repo` arguments
pub fn build_pool(repos_dir: Option<&Path>, repos: &[String]) -> Result<RepositoryPool> {
    let mut pool = match repos_dir {
        Some(dir) => RepositoryPool::discover(dir)
            .with_context(|| format!("Failed to discover repositories under {:?}", dir))?,
        None => RepositoryPool::new(),
    };

    for arg in repos {
        let (id, path) = parse_repo_arg(arg)?;
        pool.add(&id, &path)
            .with_context(|| format!("Failed to register repository '{}' at {:?}", id, path))?;
    }

    Ok(pool)
}

/// Parses `name=path`; a bare path uses its directory name as id
fn parse_repo_arg(arg: &str) -> Result<(String, PathBuf)> {
    if let Some((id, path)) = arg.split_once('=') {
        if id.is_empty() || path.is_empty() {
            bail!("Invalid repository '{}', expected NAME=PATH", arg);
        }
        return Ok((id.to_string(), PathBuf::from(path)));
    }

    let path = PathBuf::from(arg);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Cannot derive a repository name from '{}'", arg))?;
    let id = name.strip_suffix(".git").unwrap_or(name).to_string();
    Ok((id, path))
}

/// Lexical unit of a `--where` expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Equals,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Quoted(q) => write!(f, "'{}'", q),
            Token::Equals => f.write_str("="),
        }
    }
}

/// Splits an expression into words, quoted strings and `=`
fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let token = Regex::new(r#"'([^']*)'|"([^"]*)"|(=)|([^\s='"]+)"#)
        .context("Failed to compile token regex")?;

    let mut tokens = Vec::new();
    let mut end = 0;
    for caps in token.captures_iter(expr) {
        let Some(whole) = caps.get(0) else { continue };
        if !expr[end..whole.start()].trim().is_empty() {
            bail!("Unterminated quote in filter '{}'", expr);
        }
        end = whole.end();

        tokens.push(if let Some(q) = caps.get(1).or_else(|| caps.get(2)) {
            Token::Quoted(q.as_str().to_string())
        } else if caps.get(3).is_some() {
            Token::Equals
        } else {
            Token::Word(whole.as_str().to_string())
        });
    }
    if !expr[end..].trim().is_empty() {
        bail!("Unterminated quote in filter '{}'", expr);
    }
    Ok(tokens)
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(token, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
}

/// Parses a `--where` expression.
///
/// Terms are `column = value` joined by `AND` and `OR` (`AND` binds tighter).
/// Text values may be quoted; `file_mode` values are octal, as git prints them.
pub fn parse_filter(expr: &str) -> Result<Filter> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        bail!("Empty filter '{}'", expr);
    }
    let mut tokens = tokens.into_iter();

    let mut result: Option<Filter> = None;
    let mut conjunction: Option<Filter> = None;
    loop {
        let eq = parse_term(&mut tokens)?;
        conjunction = Some(match conjunction {
            Some(f) => f.and(eq),
            None => eq,
        });

        match tokens.next() {
            None => break,
            Some(t) if is_keyword(&t, "AND") => {}
            Some(t) if is_keyword(&t, "OR") => {
                if let Some(c) = conjunction.take() {
                    result = Some(match result {
                        Some(f) => f.or(c),
                        None => c,
                    });
                }
            }
            Some(t) => bail!("Expected AND or OR, found '{}'", t),
        }
    }

    match (result, conjunction) {
        (Some(f), Some(c)) => Ok(f.or(c)),
        (None, Some(c)) => Ok(c),
        _ => bail!("Empty filter '{}'", expr),
    }
}

fn parse_term(tokens: &mut impl Iterator<Item = Token>) -> Result<Filter> {
    let (name, raw) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(Token::Word(name)), Some(Token::Equals), Some(Token::Word(v) | Token::Quoted(v))) => {
            (name, v)
        }
        (Some(first), _, _) => bail!("Invalid term at '{}', expected column = value", first),
        (None, _, _) => bail!("Missing term, expected column = value"),
    };

    let column: Column = name.parse().map_err(|_| match suggest_column(&name) {
        Some(hint) => anyhow::anyhow!("Unknown column '{}' (did you mean '{}'?)", name, hint),
        None => anyhow::anyhow!("Unknown column '{}'", name),
    })?;

    let value = if column.is_integer() {
        let mode = u32::from_str_radix(&raw, 8)
            .with_context(|| format!("Invalid {} '{}', expected an octal mode", column, raw))?;
        Value::Integer(mode)
    } else {
        Value::from(raw)
    };

    Ok(Filter::eq(column, value)?)
}

/// Closest known column name, if any is close enough.
///
/// Ties go to the column that comes first in the schema.
pub fn suggest_column(name: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;
    for column in SCHEMA {
        let score = strsim::jaro_winkler(name, column.name());
        if score > 0.7 && best.map_or(true, |(_, top)| score > top) {
            best = Some((column.name(), score));
        }
    }
    best.map(|(n, _)| n)
}

/// First `n` characters of a hash for table display
pub fn short_hash(hash: &str, n: usize) -> &str {
    hash.get(..n).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_term() {
        let f = parse_filter("commit_hash = 'abc'").unwrap();
        assert_eq!(f, Filter::eq(Column::CommitHash, "abc").unwrap());
    }

    #[test]
    fn test_parse_or_and() {
        let f = parse_filter(r#"commit_hash = abc OR file_path = "go/x.go" and repository_id = r"#)
            .unwrap();
        let expected = Filter::eq(Column::CommitHash, "abc").unwrap().or(Filter::eq(
            Column::FilePath,
            "go/x.go",
        )
        .unwrap()
        .and(Filter::eq(Column::RepositoryId, "r").unwrap()));
        assert_eq!(f, expected);
    }

    #[test]
    fn test_parse_octal_mode() {
        let f = parse_filter("file_mode = 100755").unwrap();
        assert_eq!(f, Filter::eq(Column::FileMode, 0o100755u32).unwrap());
        assert!(parse_filter("file_mode = 9").is_err());
    }

    #[test]
    fn test_unknown_column_suggestion() {
        let err = parse_filter("commit = abc").unwrap_err().to_string();
        assert!(err.contains("did you mean 'commit_hash'"), "{}", err);
        assert_eq!(suggest_column("zzzzzz"), None);
    }

    #[test]
    fn test_quoted_value_keeps_keywords() {
        let f = parse_filter("file_path = 'a OR b' AND repository_id = \"x and y\"").unwrap();
        let expected = Filter::eq(Column::FilePath, "a OR b")
            .unwrap()
            .and(Filter::eq(Column::RepositoryId, "x and y").unwrap());
        assert_eq!(f, expected);

        let f = parse_filter("file_path='a=b'").unwrap();
        assert_eq!(f, Filter::eq(Column::FilePath, "a=b").unwrap());

        assert!(parse_filter("file_path = 'open").is_err());
    }

    #[test]
    fn test_suggestion_ties_follow_schema_order() {
        // "file" is equally close to file_path and file_mode
        assert_eq!(
            strsim::jaro_winkler("file", "file_path"),
            strsim::jaro_winkler("file", "file_mode")
        );
        assert_eq!(suggest_column("file"), Some("file_path"));
        assert_eq!(suggest_column("file_mod"), Some("file_mode"));
    }

    #[test]
    fn test_invalid_term() {
        assert!(parse_filter("commit_hash = a b").is_err());
        assert!(parse_filter("commit_hash = a OR").is_err());
        assert!(parse_filter("commit_hash").is_err());
        assert!(parse_filter("").is_err());
    }

    #[test]
    fn test_repo_arg() {
        let (id, path) = parse_repo_arg("gitbase=/src/gitbase").unwrap();
        assert_eq!(id, "gitbase");
        assert_eq!(path, PathBuf::from("/src/gitbase"));

        let (id, _) = parse_repo_arg("/srv/git/tools.git").unwrap();
        assert_eq!(id, "tools");
        assert!(parse_repo_arg("=x").is_err());
    }
}
