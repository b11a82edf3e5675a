use std::collections::HashMap;

use dcg_types::{
  Conversion, Signature, Substitution, TypeConversion, TypeError, align_generic_type,
  ground_generic_type,
};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use tracing::{debug, info, instrument};

use crate::edge::DcgEdge;
use crate::error::GraphError;
use crate::flow::{Flow, FlowMap, FlowSpec};
use crate::node::DcgNode;
use crate::options::BuildOptions;

/// An immutable graph of compute functions, built once from a flow map and
/// executed any number of times.
#[derive(Debug, Clone)]
pub struct DirectedComputingGraph {
  graph: DiGraph<DcgNode, DcgEdge>,
  index: HashMap<String, NodeIndex>,
  /// Outgoing edges per node, in creation order, with their target.
  outgoing: Vec<Vec<(EdgeIndex, NodeIndex)>>,
  /// Incoming edges per node, in creation order.
  incoming: Vec<Vec<EdgeIndex>>,
  type_service: TypeConversion,
}

impl DirectedComputingGraph {
  /// Build a graph from an insertion-ordered mapping of node id to function
  /// or flow.
  ///
  /// Generic parameters of a flow's target are grounded against the return
  /// types of its upstream nodes, then every upstream link gets the
  /// conversion from the producer's return type to the consumer's parameter
  /// type.
  ///
  /// # Errors
  /// `UnknownSource` and `TooManySources` always; conversion and grounding
  /// failures only when `options.strict` is set.
  #[instrument(skip_all, fields(strict = options.strict))]
  pub fn from_flows<K, V>(
    flows: impl IntoIterator<Item = (K, V)>,
    conversions: TypeConversion,
    options: BuildOptions,
  ) -> Result<Self, GraphError>
  where
    K: Into<String>,
    V: Into<FlowSpec>,
  {
    let flows: FlowMap = flows
      .into_iter()
      .map(|(id, spec)| (id.into(), spec.into()))
      .collect();

    let mut graph: DiGraph<DcgNode, DcgEdge> = DiGraph::with_capacity(flows.len(), flows.len());
    let mut index = HashMap::with_capacity(flows.len());
    for (id, spec) in &flows {
      let idx = graph.add_node(DcgNode::new(id.clone(), spec.target().clone()));
      index.insert(id.clone(), idx);
    }

    for (id, flow) in flow_entries(&flows) {
      for source_id in flow.source.iter() {
        if !index.contains_key(source_id) {
          return Err(GraphError::UnknownSource {
            node_id: id.clone(),
            source_id: source_id.to_string(),
          });
        }
      }
      let params = flow.target.signature().len();
      if flow.source.len() > params {
        return Err(GraphError::TooManySources {
          node_id: id.clone(),
          sources: flow.source.len(),
          params,
        });
      }
    }

    for (id, flow) in flow_entries(&flows) {
      let idx = index[id];
      if graph[idx].signature.is_generic() {
        let signature = ground_signature(&graph, &index, id, idx, flow, options)?;
        graph[idx].signature = signature;
      }
    }

    let mut incoming: Vec<Vec<EdgeIndex>> = vec![Vec::new(); graph.node_count()];
    let mut outgoing: Vec<Vec<(EdgeIndex, NodeIndex)>> = vec![Vec::new(); graph.node_count()];
    for (id, flow) in flow_entries(&flows) {
      let target = index[id];
      for (argindex, source_id) in flow.source.iter().enumerate() {
        let source = index[source_id];
        let from = &graph[source].signature.return_type;
        let to = &graph[target].signature.params[argindex].ty;
        let type_conversion = match conversions.get_conversion(from, to) {
          Ok(conversion) => conversion,
          Err(cause) if options.strict => {
            return Err(GraphError::UnknownConversion {
              source_id: source_id.to_string(),
              target_id: id.clone(),
              argindex,
              cause,
            });
          }
          Err(cause) => {
            debug!(
              source_id,
              target_id = %id,
              argindex,
              error = %cause,
              "falling back to identity conversion"
            );
            Conversion::identity()
          }
        };

        let edge = DcgEdge {
          id: graph.edge_count(),
          source: source_id.to_string(),
          target: id.clone(),
          argindex,
          filter_fn: flow.filter_fn.clone(),
          type_conversion,
        };
        let edge_idx = graph.add_edge(source, target, edge);
        outgoing[source.index()].push((edge_idx, target));
        incoming[target.index()].push(edge_idx);
      }
    }

    for idx in graph.node_indices() {
      let in_edges: Vec<(usize, String, Conversion)> = incoming[idx.index()]
        .iter()
        .map(|&e| {
          let edge = &graph[e];
          (edge.argindex, edge.source.clone(), edge.type_conversion.clone())
        })
        .collect();

      let node = &mut graph[idx];
      let argnames: Vec<String> = node.signature.argnames().into_iter().map(String::from).collect();
      let in_degree = in_edges.len();

      node.required_args = argnames[..in_degree].to_vec();
      node.required_context = argnames[in_degree..].to_vec();
      node.required_context_defaults = node
        .signature
        .params
        .iter()
        .skip(in_degree)
        .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
        .collect();

      node.type_conversions = vec![Conversion::identity(); argnames.len()];
      node.upstream = vec![String::new(); in_degree];
      for (argindex, source, conversion) in in_edges {
        node.type_conversions[argindex] = conversion;
        node.upstream[argindex] = source;
      }
    }

    info!(
      nodes = graph.node_count(),
      edges = graph.edge_count(),
      "graph_built"
    );

    Ok(Self {
      graph,
      index,
      outgoing,
      incoming,
      type_service: conversions,
    })
  }

  /// Get a node by id.
  pub fn node(&self, id: &str) -> Option<&DcgNode> {
    self.index.get(id).map(|&idx| &self.graph[idx])
  }

  /// All nodes in insertion order.
  pub fn nodes(&self) -> impl Iterator<Item = &DcgNode> {
    self.graph.node_weights()
  }

  pub fn in_degree(&self, id: &str) -> Option<usize> {
    self.index.get(id).map(|idx| self.incoming[idx.index()].len())
  }

  /// Edges into `id`, ordered by edge id. Empty for unknown ids.
  pub fn in_edges(&self, id: &str) -> Vec<&DcgEdge> {
    match self.index.get(id) {
      Some(idx) => self.incoming[idx.index()].iter().map(|&e| &self.graph[e]).collect(),
      None => Vec::new(),
    }
  }

  /// Edges out of `id`, ordered by edge id. Empty for unknown ids.
  pub fn out_edges(&self, id: &str) -> Vec<&DcgEdge> {
    match self.index.get(id) {
      Some(idx) => self.outgoing[idx.index()].iter().map(|&(e, _)| &self.graph[e]).collect(),
      None => Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// The conversion registry the graph was built with.
  pub fn type_service(&self) -> &TypeConversion {
    &self.type_service
  }

  /// Graphviz rendering, for debugging.
  pub fn to_dot(&self) -> String {
    format!("{}", Dot::new(&self.graph))
  }

  /// Index of a node by id.
  pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
    self.index.get(id).copied()
  }

  /// Node at `idx`.
  ///
  /// # Panics
  /// If `idx` does not belong to this graph.
  pub fn node_at(&self, idx: NodeIndex) -> &DcgNode {
    &self.graph[idx]
  }

  /// Edge at `idx`.
  ///
  /// # Panics
  /// If `idx` does not belong to this graph.
  pub fn edge_at(&self, idx: EdgeIndex) -> &DcgEdge {
    &self.graph[idx]
  }

  /// Outgoing edges of `idx` with their target node, in creation order.
  pub fn successors(&self, idx: NodeIndex) -> &[(EdgeIndex, NodeIndex)] {
    self
      .outgoing
      .get(idx.index())
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// All node indices in insertion order.
  pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
    self.graph.node_indices()
  }
}

fn flow_entries(flows: &FlowMap) -> impl Iterator<Item = (&String, &Flow)> {
  flows.iter().filter_map(|(id, spec)| match spec {
    FlowSpec::Flow(flow) => Some((id, flow)),
    FlowSpec::Fn(_) => None,
  })
}

/// Ground the generic parameters of a flow's target against its upstream
/// return types, then ground its return type with the collected bindings.
fn ground_signature(
  graph: &DiGraph<DcgNode, DcgEdge>,
  index: &HashMap<String, NodeIndex>,
  id: &str,
  idx: NodeIndex,
  flow: &Flow,
  options: BuildOptions,
) -> Result<Signature, GraphError> {
  let mut signature = graph[idx].signature.clone();
  let mut bindings = Substitution::new();

  for (i, param) in signature.params.iter_mut().enumerate() {
    if !param.ty.is_generic() {
      continue;
    }

    let Some(source_id) = flow.source.0.get(i) else {
      if options.strict {
        return Err(GraphError::MissingGenericSource {
          node_id: id.to_string(),
          param: param.name.clone(),
          sources: flow.source.len(),
        });
      }
      debug!(node_id = %id, param = %param.name, "no upstream source to ground generic parameter");
      continue;
    };

    let source_type = &graph[index[source_id]].signature.return_type;
    let (aligned, found) = match align_generic_type(&param.ty, source_type) {
      Ok(result) => result,
      Err(cause) if options.strict => {
        return Err(GraphError::GenericGrounding {
          node_id: id.to_string(),
          param: param.name.clone(),
          cause,
        });
      }
      Err(cause) => {
        debug!(node_id = %id, param = %param.name, error = %cause, "leaving parameter generic");
        continue;
      }
    };

    let mut conflict = false;
    for (var, ty) in found {
      match bindings.get(&var) {
        Some(first) if *first != ty => {
          let cause = TypeError::ConflictingBinding {
            var,
            first: first.clone(),
            second: ty,
          };
          if options.strict {
            return Err(GraphError::GenericGrounding {
              node_id: id.to_string(),
              param: param.name.clone(),
              cause,
            });
          }
          debug!(node_id = %id, param = %param.name, error = %cause, "keeping first binding");
          conflict = true;
        }
        Some(_) => {}
        None => {
          bindings.insert(var, ty);
        }
      }
    }
    if !conflict {
      param.ty = aligned;
    }
  }

  if signature.return_type.is_generic() {
    match ground_generic_type(&signature.return_type, &bindings) {
      Ok(grounded) => signature.return_type = grounded,
      Err(cause) if options.strict => {
        return Err(GraphError::GenericGrounding {
          node_id: id.to_string(),
          param: "return".to_string(),
          cause,
        });
      }
      Err(cause) => {
        debug!(node_id = %id, error = %cause, "leaving return type generic");
      }
    }
  }

  Ok(signature)
}

#[cfg(test)]
mod tests {
  use dcg_types::{TypeExpr, UnitTypeConversion, Value};
  use serde_json::json;

  use super::*;
  use crate::compute::ComputeFn;

  fn unary(ty: TypeExpr, ret: TypeExpr) -> ComputeFn {
    ComputeFn::new(Signature::new().arg("x", ty).returns(ret), |args| Ok(args[0].clone()))
  }

  fn source(ret: TypeExpr) -> ComputeFn {
    unary(TypeExpr::int(), ret)
  }

  fn sum() -> ComputeFn {
    ComputeFn::new(
      Signature::new()
        .arg("a", TypeExpr::int())
        .arg("b", TypeExpr::int())
        .arg_with_default("bias", TypeExpr::int(), json!(0))
        .arg("scale", TypeExpr::int())
        .returns(TypeExpr::int()),
      |args| {
        let total: i64 = args.iter().filter_map(Value::as_i64).sum();
        Ok(json!(total))
      },
    )
  }

  fn build(
    flows: Vec<(&str, FlowSpec)>,
    conversions: TypeConversion,
    options: BuildOptions,
  ) -> Result<DirectedComputingGraph, GraphError> {
    DirectedComputingGraph::from_flows(flows, conversions, options)
  }

  #[test]
  fn test_required_args_and_context() {
    let graph = build(
      vec![
        ("square", source(TypeExpr::int()).into()),
        ("cube", source(TypeExpr::int()).into()),
        ("sum", Flow::new(["square", "cube"], sum()).into()),
      ],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap();

    let node = graph.node("sum").unwrap();
    assert_eq!(node.required_args, vec!["a", "b"]);
    assert_eq!(node.required_context, vec!["bias", "scale"]);
    assert_eq!(node.required_context_defaults.get("bias"), Some(&json!(0)));
    assert!(!node.required_context_defaults.contains_key("scale"));
    assert_eq!(node.type_conversions.len(), 4);
    assert_eq!(node.upstream, vec!["square", "cube"]);
    assert_eq!(node.slot_of("cube"), Some(1));

    assert_eq!(graph.in_degree("sum"), Some(2));
    assert_eq!(graph.in_degree("square"), Some(0));
    assert!(graph.node("square").unwrap().is_source());
    assert_eq!(graph.len(), 3);
  }

  #[test]
  fn test_edge_ids_follow_insertion_order() {
    let graph = build(
      vec![
        ("a", source(TypeExpr::int()).into()),
        ("b", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).into()),
        ("c", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).into()),
      ],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap();

    let out: Vec<(usize, &str)> = graph
      .out_edges("a")
      .iter()
      .map(|e| (e.id, e.target.as_str()))
      .collect();
    assert_eq!(out, vec![(0, "b"), (1, "c")]);
    assert_eq!(graph.in_edges("c")[0].id, 1);
    assert!(graph.out_edges("missing").is_empty());
  }

  #[test]
  fn test_unknown_source() {
    let err = build(
      vec![("b", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).into())],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GraphError::UnknownSource { ref source_id, .. } if source_id == "a"));
  }

  #[test]
  fn test_too_many_sources() {
    let err = build(
      vec![
        ("a", source(TypeExpr::int()).into()),
        ("b", Flow::new(["a", "a"], unary(TypeExpr::int(), TypeExpr::int())).into()),
      ],
      TypeConversion::default(),
      BuildOptions::lenient(),
    )
    .unwrap_err();
    assert!(matches!(
      err,
      GraphError::TooManySources { sources: 2, params: 1, .. }
    ));
  }

  #[test]
  fn test_strict_unknown_conversion() {
    let err = build(
      vec![
        ("a", source(TypeExpr::str()).into()),
        ("b", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).into()),
      ],
      TypeConversion::default(),
      BuildOptions::strict(),
    )
    .unwrap_err();
    assert!(err.is_conversion_error());
    assert_eq!(
      err.to_string(),
      "don't know how to convert output of `a` to input 0 of `b`"
    );
  }

  #[test]
  fn test_lenient_falls_back_to_identity() {
    let graph = build(
      vec![
        ("a", source(TypeExpr::str()).into()),
        ("b", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).into()),
      ],
      TypeConversion::default(),
      BuildOptions::lenient(),
    )
    .unwrap();
    assert!(graph.in_edges("b")[0].type_conversion.is_identity());
  }

  #[test]
  fn test_resolved_conversion_on_edge() {
    let conversions = TypeConversion::new([UnitTypeConversion::new(
      TypeExpr::int(),
      TypeExpr::str(),
      |v| Ok(json!(v.to_string())),
    )]);
    let graph = build(
      vec![
        ("a", source(TypeExpr::int()).into()),
        ("b", Flow::new("a", unary(TypeExpr::str(), TypeExpr::str())).into()),
      ],
      conversions,
      BuildOptions::default(),
    )
    .unwrap();

    let node = graph.node("b").unwrap();
    assert_eq!(node.convert_arg(0, json!(7)).unwrap(), json!("7"));
    assert_eq!(node.convert_arg(5, json!(7)).unwrap(), json!(7));
  }

  #[test]
  fn test_generic_grounding() {
    let identity = unary(TypeExpr::var("T"), TypeExpr::var("T"));
    let graph = build(
      vec![
        ("a", source(TypeExpr::list(TypeExpr::int())).into()),
        ("b", Flow::new("a", identity.clone()).into()),
      ],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap();

    let node = graph.node("b").unwrap();
    assert_eq!(node.signature.return_type, TypeExpr::list(TypeExpr::int()));
    assert_eq!(node.signature.params[0].ty, TypeExpr::list(TypeExpr::int()));
    assert!(identity.signature().is_generic());
  }

  #[test]
  fn test_grounding_uses_upstream_grounded_type() {
    let head = ComputeFn::new(
      Signature::new()
        .arg("items", TypeExpr::list(TypeExpr::var("T")))
        .returns(TypeExpr::var("T")),
      |args| Ok(args[0][0].clone()),
    );
    let graph = build(
      vec![
        ("a", source(TypeExpr::list(TypeExpr::str())).into()),
        ("b", Flow::new("a", head).into()),
        ("c", Flow::new("b", unary(TypeExpr::var("U"), TypeExpr::var("U"))).into()),
      ],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap();
    assert_eq!(graph.node("c").unwrap().signature.return_type, TypeExpr::str());
  }

  #[test]
  fn test_missing_generic_source() {
    let pick = ComputeFn::new(
      Signature::new()
        .arg("x", TypeExpr::int())
        .arg("fallback", TypeExpr::var("T"))
        .returns(TypeExpr::var("T")),
      |args| Ok(args[1].clone()),
    );
    let flows = || {
      vec![
        ("a", FlowSpec::from(source(TypeExpr::int()))),
        ("b", Flow::new("a", pick.clone()).into()),
      ]
    };

    let err = build(flows(), TypeConversion::default(), BuildOptions::strict()).unwrap_err();
    assert!(matches!(err, GraphError::MissingGenericSource { ref param, sources: 1, .. } if param == "fallback"));

    let graph = build(flows(), TypeConversion::default(), BuildOptions::lenient()).unwrap();
    assert_eq!(graph.node("b").unwrap().signature.return_type, TypeExpr::var("T"));
  }

  #[test]
  fn test_conflicting_bindings() {
    let pair = ComputeFn::new(
      Signature::new()
        .arg("x", TypeExpr::var("T"))
        .arg("y", TypeExpr::var("T"))
        .returns(TypeExpr::var("T")),
      |args| Ok(args[0].clone()),
    );
    let flows = || {
      vec![
        ("a", FlowSpec::from(source(TypeExpr::int()))),
        ("s", source(TypeExpr::str()).into()),
        ("b", Flow::new(["a", "s"], pair.clone()).into()),
      ]
    };

    let err = build(flows(), TypeConversion::default(), BuildOptions::strict()).unwrap_err();
    assert!(matches!(
      err,
      GraphError::GenericGrounding { cause: TypeError::ConflictingBinding { .. }, .. }
    ));

    let graph = build(flows(), TypeConversion::default(), BuildOptions::lenient()).unwrap();
    let node = graph.node("b").unwrap();
    assert_eq!(node.signature.return_type, TypeExpr::int());
    assert_eq!(node.signature.params[0].ty, TypeExpr::int());
    assert_eq!(node.signature.params[1].ty, TypeExpr::var("T"));
  }

  #[test]
  fn test_shape_mismatch() {
    let head = ComputeFn::new(
      Signature::new()
        .arg("items", TypeExpr::list(TypeExpr::var("T")))
        .returns(TypeExpr::var("T")),
      |args| Ok(args[0].clone()),
    );
    let flows = || {
      vec![
        ("a", FlowSpec::from(source(TypeExpr::int()))),
        ("b", Flow::new("a", head.clone()).into()),
      ]
    };
    let err = build(flows(), TypeConversion::default(), BuildOptions::strict()).unwrap_err();
    assert!(matches!(
      err,
      GraphError::GenericGrounding { ref node_id, cause: TypeError::ShapeMismatch { .. }, .. } if node_id == "b"
    ));

    let graph = build(flows(), TypeConversion::default(), BuildOptions::lenient()).unwrap();
    let node = graph.node("b").unwrap();
    assert_eq!(node.signature.params[0].ty, TypeExpr::list(TypeExpr::var("T")));
    assert_eq!(node.signature.return_type, TypeExpr::var("T"));
  }

  #[test]
  fn test_to_dot() {
    let graph = build(
      vec![
        ("a", source(TypeExpr::int()).into()),
        ("b", Flow::new("a", unary(TypeExpr::int(), TypeExpr::int())).with_filter(|_| true).into()),
      ],
      TypeConversion::default(),
      BuildOptions::default(),
    )
    .unwrap();

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("b(x: int) -> int"));
    assert!(dot.contains("b[0] (filtered)"));
  }
}
