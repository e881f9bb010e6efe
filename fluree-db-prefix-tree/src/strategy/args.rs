//! Spatial query arguments.
//!
//! Text form: `Operation(SHAPE) [distErrPct=x]`, for example
//! `Intersects(ENVELOPE(-10, 10, 20, -20)) distErrPct=0.05`.

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// Predicate between an indexed shape and the query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialOperation {
    /// Indexed shape shares at least one point with the query.
    Intersects,
    /// Indexed shape lies inside the query.
    IsWithin,
    /// Indexed shape holds the whole query.
    Contains,
    /// Indexed shape shares no point with the query.
    IsDisjointTo,
}

impl SpatialOperation {
    /// Parse an operation name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "intersects" => Ok(SpatialOperation::Intersects),
            "iswithin" | "within" => Ok(SpatialOperation::IsWithin),
            "contains" => Ok(SpatialOperation::Contains),
            "isdisjointto" | "disjoint" => Ok(SpatialOperation::IsDisjointTo),
            other => Err(SpatialError::Parse(format!(
                "unknown spatial operation: {}",
                other
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpatialOperation::Intersects => "Intersects",
            SpatialOperation::IsWithin => "IsWithin",
            SpatialOperation::Contains => "Contains",
            SpatialOperation::IsDisjointTo => "IsDisjointTo",
        }
    }
}

impl std::fmt::Display for SpatialOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation, query shape, and an optional per-query precision override.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialArgs {
    pub operation: SpatialOperation,
    pub shape: Shape,
    /// Overrides the strategy's `dist_err_pct` for the query walk.
    pub dist_err_pct: Option<f64>,
}

impl SpatialArgs {
    pub fn new(operation: SpatialOperation, shape: impl Into<Shape>) -> Self {
        Self {
            operation,
            shape: shape.into(),
            dist_err_pct: None,
        }
    }

    pub fn with_dist_err_pct(mut self, dist_err_pct: f64) -> Self {
        self.dist_err_pct = Some(dist_err_pct);
        self
    }

    /// Parse the text form, reading the shape through `ctx`.
    pub fn parse(text: &str, ctx: &SpatialContext) -> Result<Self> {
        let text = text.trim();
        let open = text
            .find('(')
            .ok_or_else(|| SpatialError::Parse(format!("expected Operation(SHAPE): {}", text)))?;
        let operation = SpatialOperation::from_name(&text[..open])?;

        // Matching close paren for the operation
        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in text[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close =
            close.ok_or_else(|| SpatialError::Parse(format!("unbalanced parentheses: {}", text)))?;

        let shape = ctx.read_shape(&text[open + 1..close])?;
        let mut args = SpatialArgs::new(operation, shape);

        for param in text[close + 1..].split_whitespace() {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| SpatialError::Parse(format!("expected key=value: {}", param)))?;
            if !key.eq_ignore_ascii_case("distErrPct") {
                return Err(SpatialError::Parse(format!("unknown parameter: {}", key)));
            }
            let pct = value
                .parse::<f64>()
                .map_err(|e| SpatialError::Parse(format!("bad distErrPct {:?}: {}", value, e)))?;
            args.dist_err_pct = Some(pct);
        }
        Ok(args)
    }
}
