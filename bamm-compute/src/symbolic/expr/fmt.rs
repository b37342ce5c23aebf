use std::{fmt, ops::Range};
use super::{BinaryOp, Expr, ExprKind, UnaryOp};

/// The precedence of a node, used to decide where parentheses are needed.
fn precedence(kind: &ExprKind) -> u8 {
    match kind {
        ExprKind::Sum(_) => 1,
        ExprKind::Binary(op, _) => match op {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::MatMul => 2,
            BinaryOp::Pow => 4,
        },
        ExprKind::Unary(UnaryOp::Neg, _) => 3,
        ExprKind::Scalar(value) if value.is_sign_negative() => 3,
        _ => 5,
    }
}

/// Accumulates the rendered text of a node, and the spans of its direct children.
struct Renderer {
    text: String,
    spans: Vec<Range<usize>>,
}

impl Renderer {
    fn push(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Renders a child, recording where its text lies. The span excludes any parentheses.
    fn child(&mut self, child: &Expr, parens: bool) {
        if parens {
            self.text.push('(');
        }
        let start = self.text.len();
        self.text.push_str(&child.to_string());
        self.spans.push(start..self.text.len());
        if parens {
            self.text.push(')');
        }
    }

    /// Renders a comma-separated list of children.
    fn list(&mut self, children: &[Expr]) {
        for (idx, child) in children.iter().enumerate() {
            if idx > 0 {
                self.push(", ");
            }
            self.child(child, false);
        }
    }
}

impl ExprKind {
    /// Renders this node as text, returning the text and the span of each direct child within
    /// it, in order.
    pub fn render(&self) -> (String, Vec<Range<usize>>) {
        let mut r = Renderer { text: String::new(), spans: Vec::new() };
        let prec = precedence(self);

        match self {
            Self::Scalar(value) => r.push(&value.to_string()),
            Self::Variable(name)
                | Self::Parameter(name)
                | Self::InputParameter(name)
                | Self::SpatialVariable(name) => r.push(name),
            Self::Time => r.push("t"),
            Self::Vector(values) => {
                if values.len() <= 4 {
                    let items = values.iter().map(f64::to_string).collect::<Vec<_>>();
                    r.push(&format!("[{}]", items.join(", ")));
                } else {
                    r.push(&format!("vector({})", values.len()));
                }
            },
            Self::Matrix(matrix) => r.push(&format!("matrix({}x{})", matrix.nrows(), matrix.ncols())),
            Self::StateVector(range) => r.push(&format!("y[{}:{}]", range.start, range.end)),
            Self::FunctionParameter(name, args) => {
                r.push(name);
                r.push("(");
                r.list(args);
                r.push(")");
            },
            Self::Unary(UnaryOp::Neg, child) => {
                r.push("-");
                r.child(child, precedence(child.kind()) < prec);
            },
            Self::Unary(UnaryOp::BoundaryValue(side), child) => {
                r.push("boundary_value(");
                r.child(child, false);
                r.push(", ");
                r.push(side.name());
                r.push(")");
            },
            Self::Unary(op, child) => {
                r.push(op.name());
                r.push("(");
                r.child(child, false);
                r.push(")");
            },
            Self::Binary(op, [lhs, rhs]) => {
                let lhs_prec = precedence(lhs.kind());
                let rhs_prec = precedence(rhs.kind());
                let (lhs_parens, rhs_parens) = if *op == BinaryOp::Pow {
                    // right-associative
                    (lhs_prec <= prec, rhs_prec < prec)
                } else {
                    (lhs_prec < prec, rhs_prec <= prec)
                };

                r.child(lhs, lhs_parens);
                if *op == BinaryOp::Pow {
                    r.push(op.symbol());
                } else {
                    r.push(&format!(" {} ", op.symbol()));
                }
                r.child(rhs, rhs_parens);
            },
            Self::Sum(terms) => {
                for (idx, term) in terms.iter().enumerate() {
                    if idx > 0 {
                        r.push(" + ");
                    }
                    r.child(term, precedence(term.kind()) < prec);
                }
            },
            Self::Concatenation(children) => {
                r.push("concat(");
                r.list(children);
                r.push(")");
            },
        }

        (r.text, r.spans)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind().render().0)
    }
}
