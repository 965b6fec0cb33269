//! The expression tree: a tagged sum over node kinds, evaluated by a
//! single recursive function matching on the tag.

use crate::context::Context;
use crate::error::{Error, ErrorCode, RuntimeError};
use crate::functions;
use crate::operators;
use crate::value::Value;

/// A node in the expression tree. Trees are immutable after construction;
/// parent owns children.
#[derive(Debug, Clone)]
pub enum Node {
    /// The empty expression; evaluates to integer 0, matching the original
    /// `expr_empty_t::eval`.
    Empty,
    Constant(Value),
    Variable(String),
    FunctionCall(String, Vec<Node>),
    Subscript(String, Box<Node>),
    Binary(&'static str, Box<Node>, Box<Node>),
    PreIncrement(String),
    PreDecrement(String),
    /// Unary `+`, `-`, `not`, `b_not` applied to an operand.
    Unary(&'static str, Box<Node>),
}

impl Node {
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Dotted concatenation of identifiers reachable through the left/right
    /// spines; used only by the function dispatcher for diagnostics.
    pub fn name(&self) -> Option<String> {
        match self {
            Node::Variable(name) => Some(name.clone()),
            Node::FunctionCall(name, _) => Some(name.clone()),
            Node::Subscript(name, _) => Some(name.clone()),
            Node::Binary(_, left, right) => match (left.name(), right.name()) {
                (Some(l), Some(r)) => Some(format!("{l}.{r}")),
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (None, None) => None,
            },
            _ => None,
        }
    }

    /// Flattened list of operand subtrees reachable through this node.
    pub fn arguments(&self) -> Vec<&Node> {
        match self {
            Node::FunctionCall(_, args) => args.iter().collect(),
            Node::Binary(_, left, right) => {
                let mut v = left.arguments();
                v.extend(right.arguments());
                v
            }
            Node::Subscript(_, index) => vec![index.as_ref()],
            _ => vec![],
        }
    }

    pub fn evaluate(&self, ctx: &mut Context) -> Result<Value, Error> {
        match self {
            Node::Empty => Ok(Value::int(0)),
            Node::Constant(v) => Ok(v.clone()),
            Node::Variable(name) => {
                check_identifier(name)?;
                Ok(ctx.get(name)?)
            }
            Node::PreIncrement(name) => {
                check_identifier(name)?;
                Ok(ctx.increment(name)?)
            }
            Node::PreDecrement(name) => {
                check_identifier(name)?;
                Ok(ctx.decrement(name)?)
            }
            Node::Unary(op, operand) => {
                let v = operand.evaluate(ctx)?;
                Ok(apply_unary(op, &v)?)
            }
            Node::Subscript(name, index) => {
                check_identifier(name)?;
                let idx_val = index.evaluate(ctx)?;
                let container = ctx.get(name)?;
                let idx = idx_val.to_int();
                if idx < 0 {
                    return Err(RuntimeError::new(ErrorCode::ValOutOfRange).into());
                }
                Ok(container.at(idx as usize)?)
            }
            Node::FunctionCall(name, arg_nodes) => evaluate_call(name, arg_nodes, ctx),
            Node::Binary(op, left, right) => {
                let l = left.evaluate(ctx)?;
                let r = right.evaluate(ctx)?;
                Ok(operators::apply(op, &l, &r)?)
            }
        }
    }
}

fn check_identifier(name: &str) -> Result<(), RuntimeError> {
    if crate::is_valid_identifier(name) {
        Ok(())
    } else {
        Err(RuntimeError::with_stmt(ErrorCode::InvIdentif, name))
    }
}

fn apply_unary(op: &str, v: &Value) -> Result<Value, RuntimeError> {
    match op {
        "+" => Ok(v.clone()),
        "-" => Value::int(0).sub(v),
        "not" => Ok(Value::boolean(!v.to_bool())),
        "b_not" => Ok(Value::int(!v.to_int())),
        _ => unreachable!("unknown unary operator {op}"),
    }
}

/// Resolves a call by name: a registered builtin dispatches through
/// [`functions::call`]; an unregistered name that happens to be a context
/// variable with exactly one argument is the legacy subscript fallback;
/// anything else is E_FUNC_UNDEF. Arity for registered builtins was
/// already checked by the compiler at parse time.
fn evaluate_call(name: &str, arg_nodes: &[Node], ctx: &mut Context) -> Result<Value, Error> {
    if functions::is_registered(name) {
        let mut args = Vec::with_capacity(arg_nodes.len());
        for node in arg_nodes {
            args.push(node.evaluate(ctx)?);
        }
        return Ok(functions::call(name, &args, ctx)?);
    }

    if ctx.is_defined(name) && arg_nodes.len() == 1 {
        check_identifier(name)?;
        let idx_val = arg_nodes[0].evaluate(ctx)?;
        let idx = idx_val.to_int();
        if idx < 0 {
            return Err(RuntimeError::new(ErrorCode::ValOutOfRange).into());
        }
        let container = ctx.get(name)?;
        return Ok(container.at(idx as usize)?);
    }

    Err(RuntimeError::with_stmt(ErrorCode::FuncUndef, name).into())
}
