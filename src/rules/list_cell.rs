//! Parsing of list-valued cells.
//!
//! Exports encode lists in several ways: a literal (`['1Rx4', '2Rx8']`, possibly
//! nested, tuples allowed), a delimited string (`1Rx4, 2Rx8`, `a|b`, `a;b`), or a
//! single bare value. This module flattens all of them into tokens.
//!
//! Rules:
//! - blank, `nan` and `[]` cells yield no tokens
//! - a well-formed literal is flattened recursively; strings are trimmed and
//!   stripped of stray quotes
//! - anything that is not a well-formed literal (or nests deeper than
//!   `MAX_DEPTH`) falls back to splitting on `,` `;` `|` and newlines

use std::collections::BTreeSet;

/// Deepest literal nesting parsed; deeper cells take the splitting path.
const MAX_DEPTH: usize = 64;

/// Tokens in cell order (duplicates kept).
pub fn parse_list_cell(cell: &str) -> Vec<String> {
    let text = cell.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") || text == "[]" {
        return Vec::new();
    }

    let mut out = Vec::new();
    match Literal::parse(text) {
        Some(lit) => lit.flatten_into(&mut out),
        None => split_delimited(text, &mut out),
    }
    out.retain(|t| !t.is_empty() && !t.eq_ignore_ascii_case("nan"));
    out
}

/// Distinct tokens, sorted.
pub fn parse_token_set(cell: &str) -> BTreeSet<String> {
    parse_list_cell(cell).into_iter().collect()
}

fn split_delimited(text: &str, out: &mut Vec<String>) {
    for part in text.split([',', ';', '|', '\n']) {
        out.push(clean_token(part));
    }
}

/// Trim whitespace plus any quote/bracket debris left by a broken literal.
fn clean_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | '[' | ']' | '(' | ')'))
        .to_string()
}

/// The subset of literal syntax that shows up in exports.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    /// Numbers keep their source spelling (`4`, `2.0`).
    Num(String),
    Bool(bool),
    Null,
    Seq(Vec<Literal>),
}

impl Literal {
    /// `None` unless the whole text is one well-formed literal.
    fn parse(text: &str) -> Option<Literal> {
        let mut parser = Parser {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        };
        let value = parser.value()?;
        parser.skip_ws();
        if parser.pos == parser.chars.len() {
            Some(value)
        } else {
            None
        }
    }

    fn flatten_into(self, out: &mut Vec<String>) {
        match self {
            Literal::Str(s) => out.push(s.trim().trim_matches(['\'', '"']).trim().to_string()),
            Literal::Num(n) => out.push(n),
            Literal::Bool(b) => out.push(if b { "True" } else { "False" }.to_string()),
            Literal::Null => {}
            Literal::Seq(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Option<Literal> {
        self.skip_ws();
        match self.peek()? {
            '[' => self.seq(']'),
            '(' => self.seq(')'),
            '\'' | '"' => self.string(),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            c if c.is_alphabetic() || c == '_' => self.keyword(),
            _ => None,
        }
    }

    fn seq(&mut self, close: char) -> Option<Literal> {
        if self.depth == MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let items = self.seq_items(close);
        self.depth -= 1;
        items.map(Literal::Seq)
    }

    fn seq_items(&mut self, close: char) -> Option<Vec<Literal>> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek()? == close {
                self.bump();
                return Some(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump()? {
                ',' => continue,
                c if c == close => return Some(items),
                _ => return None,
            }
        }
    }

    fn string(&mut self) -> Option<Literal> {
        let quote = self.bump()?;
        let mut s = String::new();
        loop {
            match self.bump()? {
                '\\' => match self.bump()? {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    c => s.push(c),
                },
                c if c == quote => return Some(Literal::Str(s)),
                c => s.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<Literal> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.replace('_', "").parse::<f64>().ok()?;
        Some(Literal::Num(text))
    }

    fn keyword(&mut self) -> Option<Literal> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Some(Literal::Bool(true)),
            "False" => Some(Literal::Bool(false)),
            "None" => Some(Literal::Null),
            // Bare words are not literals; the caller falls back to splitting.
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn literal_and_delimited_forms_agree() {
        let expected = set(&["1Rx2", "2Rx4"]);
        assert_eq!(parse_token_set("['1Rx2', '2Rx4']"), expected);
        assert_eq!(parse_token_set("1Rx2, 2Rx4"), expected);
        assert_eq!(parse_token_set("[\"1Rx2\",\"2Rx4\",]"), expected);
        assert_eq!(parse_token_set("('1Rx2', '2Rx4')"), expected);
        assert_eq!(parse_token_set("1Rx2|2Rx4"), expected);
        assert_eq!(parse_token_set("1Rx2;2Rx4"), expected);
    }

    #[test]
    fn empty_forms() {
        for cell in ["", "   ", "[]", "nan", "NaN", "[ ]", "['']"] {
            assert!(parse_list_cell(cell).is_empty(), "{cell:?}");
        }
    }

    #[test]
    fn single_bare_value() {
        assert_eq!(parse_list_cell("1Rx4"), vec!["1Rx4"]);
        assert_eq!(parse_list_cell("'1Rx4'"), vec!["1Rx4"]);
        assert_eq!(parse_list_cell("4"), vec!["4"]);
    }

    #[test]
    fn nested_literals_are_flattened() {
        assert_eq!(
            parse_list_cell("[['1Rx4', ['2Rx8']], ('4Rx4',), None]"),
            vec!["1Rx4", "2Rx8", "4Rx4"]
        );
    }

    #[test]
    fn pathological_nesting_does_not_recurse_without_bound() {
        assert!(parse_list_cell(&"[".repeat(200_000)).is_empty());

        let deep = format!("{}'1Rx4'{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(parse_list_cell(&deep), vec!["1Rx4"]);
    }

    #[test]
    fn nesting_up_to_the_cap_still_parses_as_a_literal() {
        let cell = format!("{}'1Rx4', '2Rx8'{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert_eq!(parse_list_cell(&cell), vec!["1Rx4", "2Rx8"]);
    }

    #[test]
    fn quoted_tokens_inside_strings_are_stripped() {
        assert_eq!(parse_list_cell("[\"'1Rx4'\", ' 2Rx8 ']"), vec!["1Rx4", "2Rx8"]);
    }

    #[test]
    fn malformed_literal_falls_back_to_splitting() {
        assert_eq!(parse_list_cell("['1Rx4', 2Rx8]"), vec!["1Rx4", "2Rx8"]);
        assert_eq!(parse_list_cell("['1Rx4', '2Rx8'"), vec!["1Rx4", "2Rx8"]);
    }

    #[test]
    fn numbers_keep_their_spelling() {
        assert_eq!(parse_list_cell("[1, 2.0, -3]"), vec!["1", "2.0", "-3"]);
    }

    #[test]
    fn processor_lists_with_commas_in_text() {
        let cell = "['AMD EPYC 7002 Series', 'AMD EPYC 7003 Series']";
        assert_eq!(
            parse_list_cell(cell),
            vec!["AMD EPYC 7002 Series", "AMD EPYC 7003 Series"]
        );
        assert_eq!(
            parse_list_cell("AMD Ryzen 5 Pro\nAMD Ryzen 7 Pro"),
            vec!["AMD Ryzen 5 Pro", "AMD Ryzen 7 Pro"]
        );
    }

    #[test]
    fn duplicates_are_kept_in_list_form() {
        assert_eq!(parse_list_cell("a, b, a"), vec!["a", "b", "a"]);
        assert_eq!(parse_token_set("a, b, a"), set(&["a", "b"]));
    }
}
