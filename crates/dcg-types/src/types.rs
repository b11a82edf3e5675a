//! Tagged type expressions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A declared type of a compute function parameter or return value.
///
/// Serialized in its textual form (`"list[~T]"`), so signatures can be
/// declared in JSON config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
  /// Matches any type; conversions into `Any` are the identity.
  Any,
  /// A named, fully resolved type such as `int`.
  Concrete { name: String },
  /// An unbound type variable, written `~T`.
  Var { name: String },
  /// A parameterised type such as `list[int]`.
  Param { name: String, args: Vec<TypeExpr> },
}

impl TypeExpr {
  pub fn concrete(name: impl Into<String>) -> Self {
    Self::Concrete { name: name.into() }
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn param(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
    Self::Param {
      name: name.into(),
      args,
    }
  }

  pub fn int() -> Self {
    Self::concrete("int")
  }

  pub fn float() -> Self {
    Self::concrete("float")
  }

  pub fn str() -> Self {
    Self::concrete("str")
  }

  pub fn bool() -> Self {
    Self::concrete("bool")
  }

  pub fn none() -> Self {
    Self::concrete("none")
  }

  pub fn list(item: TypeExpr) -> Self {
    Self::param("list", vec![item])
  }

  pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
    Self::param("dict", vec![key, value])
  }

  /// True if the expression contains a type variable anywhere.
  pub fn is_generic(&self) -> bool {
    crate::generic::is_generic_type(self)
  }

  /// Names of the type variables in the expression, in order of first
  /// appearance.
  pub fn vars(&self) -> Vec<&str> {
    let mut out = Vec::new();
    self.collect_vars(&mut out);
    out
  }

  fn collect_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Self::Var { name } => {
        if !out.contains(&name.as_str()) {
          out.push(name);
        }
      }
      Self::Param { args, .. } => args.iter().for_each(|arg| arg.collect_vars(out)),
      Self::Any | Self::Concrete { .. } => {}
    }
  }
}

impl fmt::Display for TypeExpr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Any => f.write_str("any"),
      Self::Concrete { name } => f.write_str(name),
      Self::Var { name } => write!(f, "~{}", name),
      Self::Param { name, args } => {
        write!(f, "{}[", name)?;
        for (i, arg) in args.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{}", arg)?;
        }
        f.write_str("]")
      }
    }
  }
}

impl FromStr for TypeExpr {
  type Err = TypeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parser = Parser { input: s, pos: 0 };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != s.len() {
      return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
  }
}

impl TryFrom<String> for TypeExpr {
  type Error = TypeError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<TypeExpr> for String {
  fn from(value: TypeExpr) -> Self {
    value.to_string()
  }
}

/// Recursive descent parser for the textual form.
struct Parser<'a> {
  input: &'a str,
  pos: usize,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<char> {
    self.input[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.bump();
    }
  }

  fn ident(&mut self) -> Result<&'a str, TypeError> {
    self.skip_ws();
    let start = self.pos;
    while self
      .peek()
      .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
    {
      self.bump();
    }
    if start == self.pos {
      return Err(self.error("expected a type name"));
    }
    Ok(&self.input[start..self.pos])
  }

  fn parse_type(&mut self) -> Result<TypeExpr, TypeError> {
    self.skip_ws();
    if self.peek() == Some('~') {
      self.bump();
      return Ok(TypeExpr::var(self.ident()?));
    }

    let name = self.ident()?;
    self.skip_ws();
    if self.peek() != Some('[') {
      return Ok(match name {
        "any" => TypeExpr::Any,
        _ => TypeExpr::concrete(name),
      });
    }
    self.bump();

    let mut args = vec![self.parse_type()?];
    loop {
      self.skip_ws();
      match self.bump() {
        Some(',') => args.push(self.parse_type()?),
        Some(']') => break,
        _ => return Err(self.error("expected `,` or `]`")),
      }
    }
    Ok(TypeExpr::param(name, args))
  }

  fn error(&self, message: &str) -> TypeError {
    TypeError::Parse {
      input: self.input.to_string(),
      message: format!("{} at offset {}", message, self.pos),
    }
  }
}
