//! Tag-expression filtering of resolved targets.

use crate::target::Target;

/// A predicate over a target's declared tags, built from tag expressions.
///
/// Each expression is a comma-separated tag list with an optional polarity
/// prefix: `+` (or none) keeps targets carrying any listed tag, `-` drops
/// them. Multiple expressions must all pass. An empty filter accepts every
/// target.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
struct Clause {
    include: bool,
    tags: Vec<String>,
}

impl TagFilter {
    pub fn parse<S: AsRef<str>>(exprs: &[S]) -> Self {
        let clauses = exprs
            .iter()
            .map(|expr| {
                let expr = expr.as_ref();
                let (include, body) = match expr.strip_prefix('-') {
                    Some(body) => (false, body),
                    None => (true, expr.strip_prefix('+').unwrap_or(expr)),
                };
                Clause {
                    include,
                    tags: body
                        .split(',')
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string)
                        .collect(),
                }
            })
            .collect();
        Self { clauses }
    }

    pub fn accepts(&self, target: &Target) -> bool {
        let tags = target.tags();
        self.clauses.iter().all(|clause| {
            let hit = clause.tags.iter().any(|tag| tags.contains(tag));
            hit == clause.include
        })
    }
}
