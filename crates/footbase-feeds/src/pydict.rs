//! Flat Python dict literals, as a dataframe writes dict-valued columns to
//! CSV: `{'h': '1', 'a': '3'}` or `{'id': '71', 'title': 'Aston Villa'}`.
//!
//! Only one level is understood. Values are kept as text; `None` reads as an
//! empty string.

use std::{collections::BTreeMap, iter::Peekable, str::Chars};

pub(crate) fn parse_flat_dict(text: &str) -> Option<BTreeMap<String, String>> {
  let mut p = Parser { chars: text.trim().chars().peekable() };
  let mut map = BTreeMap::new();

  p.expect('{')?;
  p.skip_ws();
  if !p.eat('}') {
    loop {
      p.skip_ws();
      let key = p.string()?;
      p.skip_ws();
      p.expect(':')?;
      p.skip_ws();
      let value = p.value()?;
      map.insert(key, value);
      p.skip_ws();
      if p.eat(',') {
        continue;
      }
      p.expect('}')?;
      break;
    }
  }

  p.skip_ws();
  p.at_end().then_some(map)
}

struct Parser<'a> {
  chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
  fn skip_ws(&mut self) { while self.chars.next_if(|c| c.is_whitespace()).is_some() {} }

  fn eat(&mut self, c: char) -> bool { self.chars.next_if_eq(&c).is_some() }

  fn expect(&mut self, c: char) -> Option<()> { self.eat(c).then_some(()) }

  fn at_end(&mut self) -> bool { self.chars.peek().is_none() }

  /// A single- or double-quoted string. A backslash keeps the next char.
  fn string(&mut self) -> Option<String> {
    let quote = self.chars.next_if(|c| *c == '\'' || *c == '"')?;
    let mut out = String::new();
    loop {
      match self.chars.next()? {
        '\\' => out.push(self.chars.next()?),
        c if c == quote => return Some(out),
        c => out.push(c),
      }
    }
  }

  /// A string, or a bare token (`12`, `0.5`, `True`) as written.
  fn value(&mut self) -> Option<String> {
    if matches!(self.chars.peek(), Some('\'' | '"')) {
      return self.string();
    }
    let mut token = String::new();
    while let Some(c) = self
      .chars
      .next_if(|c| !matches!(c, ',' | '}') && !c.is_whitespace())
    {
      token.push(c);
    }
    match token.as_str() {
      "" => None,
      "None" => Some(String::new()),
      _ => Some(token),
    }
  }
}
