//! Filter extraction from access chains
//!
//! A rule's target path may embed `where_` filters over the sequences it
//! crosses. Navigation wants the bare wildcard chain; the filters become
//! standalone guard conditions. This pass smashes the chain into its atomic
//! links, rebuilds it link by link with every filter removed, and returns the
//! extracted predicates positionally aligned with the wildcard elements of
//! the rewritten chain.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use crate::expr::ast::Expression;
use crate::expr::chain::smash;
use crate::expr::rewrite::substitute_parameter;
use crate::{Error, Result};

/// Rewrite a chain without its `where_` filters, returning the filters
///
/// The rewritten chain replaces each `where_` (and the wildcard call folded
/// into it, when one follows) with a single wildcard-element access. The
/// returned list holds one slot per wildcard element of the rewritten chain:
/// the predicate rebased over that wildcard element, or `None` where the
/// wildcard carried no filter. Extraction is purely syntactic.
pub fn extract_filters(expr: &Expression) -> Result<(Expression, Vec<Option<Expression>>)> {
    let links = smash(expr)?;
    let mut result = links[0].clone();
    let mut filters = Vec::new();

    let mut i = 1;
    while i < links.len() {
        match links[i] {
            Expression::Member { name, .. } => {
                result = result.member(name.clone());
            }
            Expression::Index { index, .. } => {
                result = result.index_expr((**index).clone());
            }
            Expression::Where { predicate, .. } => {
                let followed_by_wildcard = matches!(
                    links.get(i + 1),
                    Some(Expression::Each { .. }) | Some(Expression::Current { .. })
                );
                if !followed_by_wildcard && i + 1 != links.len() {
                    return Err(Error::FilterExtraction {
                        message: "filter must precede a wildcard element or end the chain"
                            .to_string(),
                        link: links[i + 1].shape().to_string(),
                    });
                }
                let wildcard = result.clone().each();
                filters.push(Some(substitute_parameter(predicate, &wildcard)));
                result = wildcard;
                if followed_by_wildcard {
                    i += 1;
                }
            }
            Expression::Each { .. } | Expression::Current { .. } => {
                filters.push(None);
                result = result.each();
            }
            Expression::TemplateIndex { .. } => {
                result = result.template_index();
            }
            Expression::Indexer { args, .. } => {
                result = result.indexer(args.clone());
            }
            other => {
                return Err(Error::FilterExtraction {
                    message: "unsupported link in filtered chain".to_string(),
                    link: other.shape().to_string(),
                });
            }
        }
        i += 1;
    }

    Ok((result, filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn b_type() -> DataType {
        DataType::object("B", vec![("n", DataType::Int), ("s", DataType::String)])
    }

    fn a_type() -> DataType {
        DataType::object("A", vec![("bs", DataType::array(b_type()))])
    }

    #[test]
    fn test_chain_without_filters_is_identity() {
        let path = Expression::parameter(a_type()).member("bs").index(0).member("s");
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten, path);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_trailing_where_appends_wildcard() {
        let pred = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let path = Expression::parameter(a_type()).member("bs").where_(pred);
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten.to_string(), "$.bs.each()");
        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters[0].as_ref().unwrap().to_string(),
            "($.bs.each().n == 5)"
        );
    }

    #[test]
    fn test_where_each_folds_into_one_wildcard() {
        let pred = Expression::parameter(b_type()).member("n").eq(Expression::int(5));
        let path = Expression::parameter(a_type())
            .member("bs")
            .where_(pred)
            .each()
            .member("s");
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten.to_string(), "$.bs.each().s");
        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters[0].as_ref().unwrap().to_string(),
            "($.bs.each().n == 5)"
        );
    }

    #[test]
    fn test_where_current_folds_like_each() {
        let pred = Expression::parameter(b_type()).member("n").gt(Expression::int(0));
        let path = Expression::parameter(a_type())
            .member("bs")
            .where_(pred)
            .current()
            .member("n");
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten.to_string(), "$.bs.each().n");
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_bare_wildcard_occupies_null_slot() {
        let path = Expression::parameter(a_type()).member("bs").each().member("s");
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten.to_string(), "$.bs.each().s");
        assert_eq!(filters, vec![None]);
    }

    #[test]
    fn test_filters_align_with_wildcard_count() {
        let cs_ty = DataType::object("C", vec![("bs", DataType::array(b_type()))]);
        let root = DataType::object("R", vec![("cs", DataType::array(cs_ty.clone()))]);
        let pred = Expression::parameter(b_type()).member("n").eq(Expression::int(1));
        let path = Expression::parameter(root)
            .member("cs")
            .each()
            .member("bs")
            .where_(pred)
            .each()
            .member("s");
        let (rewritten, filters) = extract_filters(&path).unwrap();
        assert_eq!(rewritten.to_string(), "$.cs.each().bs.each().s");
        assert_eq!(filters.len(), 2);
        assert!(filters[0].is_none());
        assert!(filters[1].is_some());
    }

    #[test]
    fn test_conversion_mid_chain_is_fatal() {
        let path = Expression::parameter(a_type())
            .member("bs")
            .convert(DataType::array(b_type()))
            .each();
        assert!(extract_filters(&path).is_err());
    }
}
