//! Generic type alignment and grounding.
//!
//! Alignment is structural unification of a generic type tree against the
//! concrete return type of an upstream producer. Grounding applies the
//! collected bindings to another type (usually the node's own return type).

use std::collections::HashMap;

use crate::error::TypeError;
use crate::types::TypeExpr;

/// Type variable name -> the type it stands for.
pub type Substitution = HashMap<String, TypeExpr>;

/// Check whether a type contains an unbound type variable.
pub fn is_generic_type(ty: &TypeExpr) -> bool {
  match ty {
    TypeExpr::Var { .. } => true,
    TypeExpr::Param { args, .. } => args.iter().any(is_generic_type),
    TypeExpr::Any | TypeExpr::Concrete { .. } => false,
  }
}

/// Align a generic type with a concrete type.
///
/// Returns the generic type with its variables replaced by the matching parts
/// of `concrete`, together with the bindings that were found.
///
/// # Errors
/// `ShapeMismatch` when the trees disagree, `ConflictingBinding` when one
/// variable would have to stand for two different types.
pub fn align_generic_type(
  generic: &TypeExpr,
  concrete: &TypeExpr,
) -> Result<(TypeExpr, Substitution), TypeError> {
  let mut bindings = Substitution::new();
  unify(generic, concrete, &mut bindings)?;
  Ok((substitute(generic, &bindings), bindings))
}

/// Replace every type variable in `ty` using `substitution`.
///
/// # Errors
/// `UnboundVariable` if a variable has no binding.
pub fn ground_generic_type(
  ty: &TypeExpr,
  substitution: &Substitution,
) -> Result<TypeExpr, TypeError> {
  match ty {
    TypeExpr::Var { name } => {
      substitution
        .get(name)
        .cloned()
        .ok_or_else(|| TypeError::UnboundVariable { var: name.clone() })
    }
    TypeExpr::Param { name, args } => {
      let args = args
        .iter()
        .map(|arg| ground_generic_type(arg, substitution))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(TypeExpr::param(name.clone(), args))
    }
    TypeExpr::Any | TypeExpr::Concrete { .. } => Ok(ty.clone()),
  }
}

/// Unify `pattern` against `ty`, extending `bindings`.
pub(crate) fn unify(
  pattern: &TypeExpr,
  ty: &TypeExpr,
  bindings: &mut Substitution,
) -> Result<(), TypeError> {
  match (pattern, ty) {
    (TypeExpr::Var { name }, _) => match bindings.get(name) {
      Some(bound) if bound != ty => Err(TypeError::ConflictingBinding {
        var: name.clone(),
        first: bound.clone(),
        second: ty.clone(),
      }),
      Some(_) => Ok(()),
      None => {
        bindings.insert(name.clone(), ty.clone());
        Ok(())
      }
    },
    (TypeExpr::Any, _) | (_, TypeExpr::Any) => Ok(()),
    (
      TypeExpr::Param { name, args },
      TypeExpr::Param {
        name: other_name,
        args: other_args,
      },
    ) if name == other_name && args.len() == other_args.len() => {
      for (arg, other) in args.iter().zip(other_args) {
        unify(arg, other, bindings)?;
      }
      Ok(())
    }
    (TypeExpr::Concrete { name }, TypeExpr::Concrete { name: other }) if name == other => Ok(()),
    _ => Err(TypeError::ShapeMismatch {
      generic: pattern.clone(),
      concrete: ty.clone(),
    }),
  }
}

/// Like `ground_generic_type`, but leaves unbound variables in place.
pub(crate) fn substitute(ty: &TypeExpr, bindings: &Substitution) -> TypeExpr {
  match ty {
    TypeExpr::Var { name } => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
    TypeExpr::Param { name, args } => TypeExpr::param(
      name.clone(),
      args.iter().map(|arg| substitute(arg, bindings)).collect(),
    ),
    TypeExpr::Any | TypeExpr::Concrete { .. } => ty.clone(),
  }
}
