// Expression evaluation methods for the evaluator
use super::*;

impl<'a> Evaluator<'a> {
    /// Evaluate an operand expression to a scalar value.
    pub fn eval_operand(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::StringLiteral(s) => Ok(Value::String(s.clone())),

            Expr::RValue(name) => self.lookup_identifier(name),

            Expr::ScopeResolution { type_name, member } => {
                self.eval_scope_resolution(type_name, member)
            }

            Expr::Call { name, args } => match self.eval_function_call(name, args)? {
                Some(value) => Ok(value),
                None => Err(EvalError::TypeMismatch(format!(
                    "function '{}' does not return a value",
                    name
                ))),
            },

            Expr::Binary { op, lhs, rhs } => {
                let left = self.eval_operand(lhs)?;
                // Short-circuit logical operators before touching the rhs
                match op {
                    Operator::LogAnd => {
                        if !left.to_bool()? {
                            return Ok(Value::Bool(false));
                        }
                        let right = self.eval_operand(rhs)?;
                        return Ok(Value::Bool(right.to_bool()?));
                    }
                    Operator::LogOr => {
                        if left.to_bool()? {
                            return Ok(Value::Bool(true));
                        }
                        let right = self.eval_operand(rhs)?;
                        return Ok(Value::Bool(right.to_bool()?));
                    }
                    _ => {}
                }
                let right = self.eval_operand(rhs)?;
                self.eval_binary_op(*op, &left, &right)
            }

            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                // Only the selected branch is evaluated; the untaken branch
                // must not touch the cursor or the log.
                if self.eval_operand(cond)?.to_bool()? {
                    self.eval_operand(then_expr)
                } else {
                    self.eval_operand(else_expr)
                }
            }
        }
    }

    /// Look up a named member's current value: active member scopes
    /// innermost-first, then the global node list.
    fn lookup_identifier(&self, name: &str) -> Result<Value, EvalError> {
        for frame in self.scopes.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Err(EvalError::UndefinedIdentifier(name.to_string()))
    }

    /// Resolve a function by name, validate its arity, reduce the arguments
    /// to scalars and dispatch. Returns `None` for functions without a
    /// return value.
    pub(crate) fn eval_function_call(
        &mut self,
        name: &str,
        args: &[Expr],
    ) -> Result<Option<Value>, EvalError> {
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::UndefinedFunction(name.to_string()))?;
        if !func.arity.accepts(args.len()) {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: func.arity.to_string(),
                got: args.len(),
            });
        }
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_operand(arg)?);
        }
        self.call_builtin(func.kind, name, &values)
    }

    /// Apply a binary operator. Integer operands promote to the wider
    /// 128-bit internal width, signed if either side is signed; floats take
    /// over when either side is a float.
    pub(crate) fn eval_binary_op(
        &self,
        op: Operator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, EvalError> {
        if matches!(left, Value::Float(_)) || matches!(right, Value::Float(_)) {
            let l = left.to_float()?;
            let r = right.to_float()?;
            return match op {
                Operator::Add => Ok(Value::Float(l + r)),
                Operator::Sub => Ok(Value::Float(l - r)),
                Operator::Mul => Ok(Value::Float(l * r)),
                Operator::Div => Ok(Value::Float(l / r)),
                Operator::Mod => Ok(Value::Float(l % r)),
                Operator::Eq => Ok(Value::Bool(l == r)),
                Operator::Ne => Ok(Value::Bool(l != r)),
                Operator::Lt => Ok(Value::Bool(l < r)),
                Operator::Gt => Ok(Value::Bool(l > r)),
                Operator::Le => Ok(Value::Bool(l <= r)),
                Operator::Ge => Ok(Value::Bool(l >= r)),
                _ => Err(EvalError::TypeMismatch(
                    "bitwise operator applied to float values".into(),
                )),
            };
        }

        macro_rules! int_binary_op {
            ($op:expr, $l:expr, $r:expr, $variant:ident) => {
                match $op {
                    Operator::Add => Ok(Value::$variant($l.wrapping_add($r))),
                    Operator::Sub => Ok(Value::$variant($l.wrapping_sub($r))),
                    Operator::Mul => Ok(Value::$variant($l.wrapping_mul($r))),
                    Operator::Div => {
                        if $r == 0 {
                            Err(EvalError::DivisionByZero)
                        } else {
                            Ok(Value::$variant($l.wrapping_div($r)))
                        }
                    }
                    Operator::Mod => {
                        if $r == 0 {
                            Err(EvalError::DivisionByZero)
                        } else {
                            Ok(Value::$variant($l.wrapping_rem($r)))
                        }
                    }
                    Operator::BitAnd => Ok(Value::$variant($l & $r)),
                    Operator::BitOr => Ok(Value::$variant($l | $r)),
                    Operator::BitXor => Ok(Value::$variant($l ^ $r)),
                    // Shift amounts are masked to the 128-bit operand width
                    Operator::Shl => Ok(Value::$variant($l << (($r as u32) & 0x7F))),
                    Operator::Shr => Ok(Value::$variant($l >> (($r as u32) & 0x7F))),
                    Operator::Eq => Ok(Value::Bool($l == $r)),
                    Operator::Ne => Ok(Value::Bool($l != $r)),
                    Operator::Lt => Ok(Value::Bool($l < $r)),
                    Operator::Gt => Ok(Value::Bool($l > $r)),
                    Operator::Le => Ok(Value::Bool($l <= $r)),
                    Operator::Ge => Ok(Value::Bool($l >= $r)),
                    Operator::LogAnd | Operator::LogOr => {
                        unreachable!("handled by short-circuit")
                    }
                }
            };
        }

        if matches!(left, Value::Signed(_)) || matches!(right, Value::Signed(_)) {
            let l = left.to_signed()?;
            let r = right.to_signed()?;
            return int_binary_op!(op, l, r, Signed);
        }

        let l = left.to_unsigned()?;
        let r = right.to_unsigned()?;
        int_binary_op!(op, l, r, Unsigned)
    }

    /// Resolve `Type::Member` against an enum definition in the registry.
    pub(crate) fn eval_scope_resolution(
        &mut self,
        type_name: &str,
        member: &str,
    ) -> Result<Value, EvalError> {
        let def = match self.registry.resolve(type_name)? {
            TypeDef::Enum(def) => def,
            _ => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' is not an enum type",
                    type_name
                )))
            }
        };
        let signed = def.underlying.is_signed();
        for (entry_name, value) in self.enum_entry_values(def)? {
            if entry_name == member {
                return Ok(if signed {
                    Value::Signed(value)
                } else {
                    Value::Unsigned(value as u128)
                });
            }
        }
        Err(EvalError::UndefinedMember {
            type_name: type_name.to_string(),
            member: member.to_string(),
        })
    }

    /// Bind each enum entry to its constant value in declaration order:
    /// previous + 1 unless an explicit expression overrides it.
    pub(crate) fn enum_entry_values(
        &mut self,
        def: &EnumDef,
    ) -> Result<Vec<(String, i128)>, EvalError> {
        let mut entries = Vec::with_capacity(def.entries.len());
        let mut previous: i128 = -1;
        for (name, expr) in &def.entries {
            let value = match expr {
                Some(expr) => self.eval_operand(expr)?.to_signed()?,
                None => previous.wrapping_add(1),
            };
            entries.push((name.clone(), value));
            previous = value;
        }
        Ok(entries)
    }
}

pub(crate) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Unsigned(v) => Value::Unsigned(*v),
        Literal::Signed(v) => Value::Signed(*v),
        Literal::Float(v) => Value::Float(*v),
        Literal::Bool(v) => Value::Bool(*v),
        Literal::Char(v) => Value::Char(*v),
    }
}
