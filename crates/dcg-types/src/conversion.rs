//! Type conversions between producer and consumer types.
//!
//! The [`TypeConversion`] service resolves, for a pair of types, a callable
//! that turns a value of the first into a value of the second:
//!
//! 1. identity when the types are equal or the target is `any`
//! 2. the shortest chain of registered unit conversions (a direct conversion
//!    is a chain of length one)
//! 3. a compose conversion lifting an inner conversion through a
//!    parameterised type, e.g. `list[~A] -> list[~B]`

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::Value;
use crate::error::TypeError;
use crate::generic::{Substitution, unify};
use crate::types::TypeExpr;

/// Maximum nesting of compose conversions.
const MAX_COMPOSE_DEPTH: usize = 8;

type ConvertFn = dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync;

/// Higher-order conversion body: receives the resolved inner conversion and
/// the outer value.
pub type ComposeFn = dyn Fn(&Conversion, Value) -> anyhow::Result<Value> + Send + Sync;

/// A resolved conversion callable. Cheap to clone.
#[derive(Clone, Default)]
pub struct Conversion {
  func: Option<Arc<ConvertFn>>,
}

impl Conversion {
  pub fn identity() -> Self {
    Self { func: None }
  }

  pub fn new(func: impl Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static) -> Self {
    Self {
      func: Some(Arc::new(func)),
    }
  }

  pub fn is_identity(&self) -> bool {
    self.func.is_none()
  }

  pub fn apply(&self, value: Value) -> anyhow::Result<Value> {
    match &self.func {
      Some(func) => func(value),
      None => Ok(value),
    }
  }

  /// Run `self`, then `next`.
  pub fn then(self, next: Conversion) -> Conversion {
    match (self.func, next.func) {
      (None, next) => Conversion { func: next },
      (first, None) => Conversion { func: first },
      (Some(first), Some(second)) => Conversion::new(move |value| second(first(value)?)),
    }
  }
}

impl fmt::Debug for Conversion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.func {
      Some(_) => f.write_str("Conversion(fn)"),
      None => f.write_str("Conversion(identity)"),
    }
  }
}

/// A direct conversion from one type to another.
#[derive(Debug, Clone)]
pub struct UnitTypeConversion {
  pub source: TypeExpr,
  pub target: TypeExpr,
  pub func: Conversion,
}

impl UnitTypeConversion {
  pub fn new(
    source: TypeExpr,
    target: TypeExpr,
    func: impl Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
  ) -> Self {
    Self {
      source,
      target,
      func: Conversion::new(func),
    }
  }
}

/// A conversion between parameterised types that delegates the conversion
/// of its single type variable to another (recursively resolved) conversion.
#[derive(Clone)]
pub struct ComposeTypeConversion {
  source: TypeExpr,
  target: TypeExpr,
  source_var: String,
  target_var: String,
  func: Arc<ComposeFn>,
}

impl ComposeTypeConversion {
  /// # Errors
  /// `InvalidCompose` unless both patterns contain exactly one type variable.
  pub fn new(
    source: TypeExpr,
    target: TypeExpr,
    func: impl Fn(&Conversion, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
  ) -> Result<Self, TypeError> {
    let names = {
      let source_vars = source.vars();
      let target_vars = target.vars();
      match (source_vars.as_slice(), target_vars.as_slice()) {
        ([s], [t]) => Some((s.to_string(), t.to_string())),
        _ => None,
      }
    };
    let Some((source_var, target_var)) = names else {
      return Err(TypeError::InvalidCompose {
        source_pattern: source,
        target_pattern: target,
      });
    };
    Ok(Self {
      source,
      target,
      source_var,
      target_var,
      func: Arc::new(func),
    })
  }

  /// `list[~A] -> list[~B]`, converting each element.
  pub fn list() -> Self {
    Self {
      source: TypeExpr::list(TypeExpr::var("A")),
      target: TypeExpr::list(TypeExpr::var("B")),
      source_var: "A".to_string(),
      target_var: "B".to_string(),
      func: Arc::new(|inner: &Conversion, value: Value| match value {
        Value::Array(items) => items
          .into_iter()
          .map(|item| inner.apply(item))
          .collect::<anyhow::Result<Vec<_>>>()
          .map(Value::Array),
        other => anyhow::bail!("expected an array, got {}", other),
      }),
    }
  }

  pub fn source(&self) -> &TypeExpr {
    &self.source
  }

  pub fn target(&self) -> &TypeExpr {
    &self.target
  }
}

impl fmt::Debug for ComposeTypeConversion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComposeTypeConversion")
      .field("source", &self.source)
      .field("target", &self.target)
      .finish_non_exhaustive()
  }
}

/// A conversion registered with the service.
#[derive(Debug, Clone)]
pub enum ConversionRule {
  Unit(UnitTypeConversion),
  Compose(ComposeTypeConversion),
}

impl From<UnitTypeConversion> for ConversionRule {
  fn from(value: UnitTypeConversion) -> Self {
    Self::Unit(value)
  }
}

impl From<ComposeTypeConversion> for ConversionRule {
  fn from(value: ComposeTypeConversion) -> Self {
    Self::Compose(value)
  }
}

/// Registry of conversions and the resolver over it.
#[derive(Debug, Clone, Default)]
pub struct TypeConversion {
  units: Vec<UnitTypeConversion>,
  composes: Vec<ComposeTypeConversion>,
}

impl TypeConversion {
  pub fn new<R: Into<ConversionRule>>(rules: impl IntoIterator<Item = R>) -> Self {
    let mut service = Self::default();
    for rule in rules {
      service.register(rule);
    }
    service
  }

  pub fn register(&mut self, rule: impl Into<ConversionRule>) {
    match rule.into() {
      ConversionRule::Unit(unit) => self.units.push(unit),
      ConversionRule::Compose(compose) => self.composes.push(compose),
    }
  }

  /// Resolve a conversion from `from` to `to`.
  ///
  /// # Errors
  /// `UnknownConversion` when no identity, chain or compose path exists.
  pub fn get_conversion(&self, from: &TypeExpr, to: &TypeExpr) -> Result<Conversion, TypeError> {
    self.resolve(from, to, 0)
  }

  fn resolve(&self, from: &TypeExpr, to: &TypeExpr, depth: usize) -> Result<Conversion, TypeError> {
    if from == to || *to == TypeExpr::Any {
      return Ok(Conversion::identity());
    }

    if let Some(chain) = self.unit_chain(from, to) {
      return Ok(chain);
    }

    if depth < MAX_COMPOSE_DEPTH {
      for rule in &self.composes {
        if let Some(lifted) = self.lift(rule, from, to, depth) {
          return Ok(lifted);
        }
      }
    }

    Err(TypeError::UnknownConversion {
      from: from.clone(),
      to: to.clone(),
    })
  }

  /// Breadth-first search over unit conversions; each type is visited once,
  /// so the first chain found is a shortest one.
  fn unit_chain(&self, from: &TypeExpr, to: &TypeExpr) -> Option<Conversion> {
    let mut visited: HashSet<&TypeExpr> = HashSet::from([from]);
    let mut queue = VecDeque::from([(from, Conversion::identity(), 0usize)]);

    while let Some((ty, conversion, hops)) = queue.pop_front() {
      for unit in self.units.iter().filter(|unit| &unit.source == ty) {
        if !visited.insert(&unit.target) {
          continue;
        }
        let next = conversion.clone().then(unit.func.clone());
        if &unit.target == to {
          if hops > 0 {
            debug!(from = %from, to = %to, hops = hops + 1, "composed conversion chain");
          }
          return Some(next);
        }
        queue.push_back((&unit.target, next, hops + 1));
      }
    }

    None
  }

  fn lift(
    &self,
    rule: &ComposeTypeConversion,
    from: &TypeExpr,
    to: &TypeExpr,
    depth: usize,
  ) -> Option<Conversion> {
    let mut source_bindings = Substitution::new();
    unify(&rule.source, from, &mut source_bindings).ok()?;
    let mut target_bindings = Substitution::new();
    unify(&rule.target, to, &mut target_bindings).ok()?;

    let inner_from = source_bindings.get(&rule.source_var)?;
    let inner_to = target_bindings.get(&rule.target_var)?;
    let inner = self.resolve(inner_from, inner_to, depth + 1).ok()?;

    let func = rule.func.clone();
    Some(Conversion::new(move |value| func(&inner, value)))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn int_to_str() -> UnitTypeConversion {
    UnitTypeConversion::new(TypeExpr::int(), TypeExpr::str(), |v| Ok(Value::String(v.to_string())))
  }

  fn str_to_float() -> UnitTypeConversion {
    UnitTypeConversion::new(TypeExpr::str(), TypeExpr::float(), |v| {
      let s = v.as_str().ok_or_else(|| anyhow::anyhow!("expected a string"))?;
      Ok(json!(s.parse::<f64>()?))
    })
  }

  #[test]
  fn test_identity() {
    let service = TypeConversion::default();
    assert!(
      service
        .get_conversion(&TypeExpr::int(), &TypeExpr::int())
        .unwrap()
        .is_identity()
    );
    assert!(
      service
        .get_conversion(&TypeExpr::int(), &TypeExpr::Any)
        .unwrap()
        .is_identity()
    );
  }

  #[test]
  fn test_direct() {
    let service = TypeConversion::new([int_to_str()]);
    let conv = service
      .get_conversion(&TypeExpr::int(), &TypeExpr::str())
      .unwrap();
    assert_eq!(conv.apply(json!(42)).unwrap(), json!("42"));
  }

  #[test]
  fn test_chain() {
    let service = TypeConversion::new([str_to_float(), int_to_str()]);
    let conv = service
      .get_conversion(&TypeExpr::int(), &TypeExpr::float())
      .unwrap();
    assert_eq!(conv.apply(json!(42)).unwrap(), json!(42.0));
  }

  #[test]
  fn test_unknown() {
    let service = TypeConversion::new([int_to_str()]);
    let err = service
      .get_conversion(&TypeExpr::str(), &TypeExpr::int())
      .unwrap_err();
    assert_eq!(
      err,
      TypeError::UnknownConversion {
        from: TypeExpr::str(),
        to: TypeExpr::int()
      }
    );
  }

  #[test]
  fn test_cycle_terminates() {
    let service = TypeConversion::new([
      int_to_str(),
      UnitTypeConversion::new(TypeExpr::str(), TypeExpr::int(), Ok),
    ]);
    assert!(
      service
        .get_conversion(&TypeExpr::int(), &TypeExpr::bool())
        .is_err()
    );
  }

  #[test]
  fn test_compose_list() {
    let mut service = TypeConversion::new([int_to_str(), str_to_float()]);
    service.register(ComposeTypeConversion::list());

    let conv = service
      .get_conversion(
        &TypeExpr::list(TypeExpr::int()),
        &TypeExpr::list(TypeExpr::float()),
      )
      .unwrap();
    assert_eq!(conv.apply(json!([1, 2])).unwrap(), json!([1.0, 2.0]));

    let nested = service
      .get_conversion(
        &TypeExpr::list(TypeExpr::list(TypeExpr::int())),
        &TypeExpr::list(TypeExpr::list(TypeExpr::str())),
      )
      .unwrap();
    assert_eq!(nested.apply(json!([[1], [2, 3]])).unwrap(), json!([["1"], ["2", "3"]]));
  }

  #[test]
  fn test_compose_requires_single_variable() {
    let err = ComposeTypeConversion::new(
      TypeExpr::dict(TypeExpr::var("K"), TypeExpr::var("V")),
      TypeExpr::list(TypeExpr::var("V")),
      |_, v| Ok(v),
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::InvalidCompose { .. }));
  }

  #[test]
  fn test_conversion_failure_is_reported() {
    let service = TypeConversion::new([str_to_float()]);
    let conv = service
      .get_conversion(&TypeExpr::str(), &TypeExpr::float())
      .unwrap();
    assert!(conv.apply(json!("not a number")).is_err());
  }
}
