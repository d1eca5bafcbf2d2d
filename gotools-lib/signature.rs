//! Lexer for the function types gocode prints, e.g.
//! `func(name string, n int) (string, error)`.

/// Splits a Go function type into its parameter and return descriptors.
///
/// The input is trusted tool output, so unbalanced parentheses are not
/// reported; they only produce odd tokens.
pub fn lex_func_type(typ: &str) -> (Vec<String>, Vec<String>) {
  let mut params = Vec::new();
  let mut returns = Vec::new();

  let typ = typ.strip_prefix("func").unwrap_or(typ).trim();

  let mut in_returns = false;
  // set once an unparenthesized return type starts, e.g. `error` or
  // `func(int) int`; everything after that belongs to a single token
  let mut bare_return = false;
  let mut depth: isize = 0;
  let mut val = String::new();

  for ch in typ.chars() {
    let current = if in_returns { &mut returns } else { &mut params };

    if bare_return {
      val.push(ch);
      continue;
    }

    match ch {
      '(' => {
        if depth != 0 {
          val.push(ch);
        }
        depth += 1;
      },
      ')' => {
        depth -= 1;
        if depth != 0 {
          val.push(ch);
        } else {
          push_token(current, &mut val);
          in_returns = true;
        }
      },
      ',' if depth == 1 => push_token(current, &mut val),
      ch if depth == 0 && in_returns && !ch.is_whitespace() => {
        bare_return = true;
        val.push(ch);
      },
      _ => val.push(ch),
    }
  }

  let current = if in_returns { &mut returns } else { &mut params };
  push_token(current, &mut val);

  (params, returns)
}

fn push_token(tokens: &mut Vec<String>, val: &mut String) {
  let token = val.trim();
  if !token.is_empty() {
    tokens.push(token.to_owned());
  }
  val.clear();
}

#[cfg(test)]
mod tests {
  use quickcheck::{
    Arbitrary,
    Gen,
    quickcheck,
  };

  use super::lex_func_type;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn params_and_grouped_returns() {
    assert_eq!(
      lex_func_type("func(a T1, b T2) (R1, R2)"),
      (strings(&["a T1", "b T2"]), strings(&["R1", "R2"]))
    );
  }

  #[test]
  fn bare_return() {
    assert_eq!(lex_func_type("func() error"), (vec![], strings(&["error"])));
    assert_eq!(
      lex_func_type("func(s string) *strings.Builder"),
      (strings(&["s string"]), strings(&["*strings.Builder"]))
    );
  }

  #[test]
  fn no_returns() {
    assert_eq!(
      lex_func_type("func(format string, a ...interface{})"),
      (strings(&["format string", "a ...interface{}"]), vec![])
    );
    assert_eq!(lex_func_type("func()"), (vec![], vec![]));
  }

  #[test]
  fn nested_function_types_stay_whole() {
    assert_eq!(
      lex_func_type("func(f func(int) int) bool"),
      (strings(&["f func(int) int"]), strings(&["bool"]))
    );
    assert_eq!(
      lex_func_type("func(f func(int, int) int) bool"),
      (strings(&["f func(int, int) int"]), strings(&["bool"]))
    );
    assert_eq!(
      lex_func_type("func(n int) func(int, int) (int, error)"),
      (strings(&["n int"]), strings(&["func(int, int) (int, error)"]))
    );
  }

  #[test]
  fn malformed_input_does_not_panic() {
    for input in ["func(", "func)", "func((a, b)", "func) (", "", "fun"] {
      let _ = lex_func_type(input);
    }
  }

  #[derive(Clone, Debug)]
  struct Ident(String);

  impl Arbitrary for Ident {
    fn arbitrary(g: &mut Gen) -> Self {
      let len = usize::arbitrary(g) % 8 + 1;
      let ident = (0..len)
        .map(|_| *g.choose(&['a', 'b', 'x', 'Z', '_', '1']).unwrap())
        .collect::<String>();
      Ident(format!("v{ident}"))
    }
  }

  quickcheck! {
    fn well_formed_signatures_split_on_top_level_commas(params: Vec<Ident>, returns: Vec<Ident>) -> bool {
      let params: Vec<String> = params.into_iter().map(|Ident(name)| format!("{name} int")).collect();
      let returns: Vec<String> = returns.into_iter().map(|Ident(name)| name).collect();
      let typ = format!("func({}) ({})", params.join(", "), returns.join(", "));
      lex_func_type(&typ) == (params, returns)
    }
  }
}
