//! Tree-walking evaluator

use super::builtins::{self, HostContext};
use super::env::{EnvRef, Environment, child_env};
use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::files::FileTable;
use super::value::{
    ArrayValue, BoundMethod, Builtin, Class, Instance, RecordValue, Routine, Value,
};
use crate::ast::{
    ClassDecl, DataType, Expr, InfixOp, ParamMode, PrefixOp, PrimitiveType, Program, Spanned,
    Stmt, TypeDefinition,
};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Nesting limit when building default values for record types
const MAX_DEFAULT_DEPTH: usize = 32;

/// Runtime knobs chosen by the host
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Seed for RAND and RANDOM; entropy when absent
    pub seed: Option<u64>,
    /// Deepest allowed chain of routine calls
    pub max_call_depth: usize,
    /// Directory relative filenames in OPENFILE resolve against
    pub base_dir: Option<PathBuf>,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            seed: None,
            max_call_depth: 10_000,
            base_dir: None,
        }
    }
}

/// Where INPUT reads its lines from
enum InputSource {
    /// Process stdin, locked only while a line is read so a line editor
    /// can share it between statements
    Stdin,
    Reader(Box<dyn BufRead>),
}

impl InputSource {
    fn read_line(&mut self, line: &mut String) -> io::Result<usize> {
        match self {
            InputSource::Stdin => io::stdin().read_line(line),
            InputSource::Reader(reader) => reader.read_line(line),
        }
    }
}

/// Caller storage a BYREF argument resolved to before the call
#[derive(Debug)]
enum Place {
    Variable(String),
    Element {
        array: Rc<RefCell<ArrayValue>>,
        indices: Vec<i64>,
    },
    Field {
        instance: Rc<Instance>,
        member: String,
    },
    /// Field of a record held by value in another place
    RecordField { holder: Box<Place>, member: String },
}

/// The interpreter
pub struct Interpreter {
    /// Global environment
    global_env: EnvRef,
    /// Builtin functions
    builtins: HashMap<String, Builtin>,
    /// Open files and the random generator
    host: HostContext,
    input: InputSource,
    output: Box<dyn Write>,
    /// Current routine call depth
    call_depth: usize,
    max_call_depth: usize,
}

impl Interpreter {
    /// Create an interpreter reading stdin and writing stdout
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    pub fn with_options(options: InterpreterOptions) -> Self {
        let mut host = HostContext::new(options.seed);
        if let Some(dir) = options.base_dir {
            host.files = FileTable::with_base_dir(dir);
        }
        let mut interp = Interpreter {
            global_env: Environment::new().into_ref(),
            builtins: HashMap::new(),
            host,
            input: InputSource::Stdin,
            output: Box::new(io::stdout()),
            call_depth: 0,
            max_call_depth: options.max_call_depth,
        };
        interp.register_builtins();
        interp
    }

    /// Redirect INPUT and OUTPUT
    pub fn with_io(mut self, input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        self.input = InputSource::Reader(input);
        self.output = output;
        self
    }

    fn register_builtins(&mut self) {
        for builtin in builtins::BUILTINS {
            self.builtins.insert(builtin.name.to_string(), *builtin);
        }
    }

    /// Run a program in the global scope
    ///
    /// Returns the value of the last top-level statement, or the value of
    /// a top-level RETURN. Bindings persist across calls, which is what the
    /// REPL relies on.
    pub fn run(&mut self, program: &Program) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        let result = match self.exec_block(&program.statements, &env) {
            Err(RuntimeError {
                kind: ErrorKind::Return(value),
                ..
            }) => Ok(*value),
            other => other,
        };
        self.output
            .flush()
            .map_err(|e| RuntimeError::io_error(format!("output error: {e}")))?;
        result
    }

    // ============ Statements ============

    fn exec_block(&mut self, block: &[Spanned<Stmt>], env: &EnvRef) -> InterpResult<Value> {
        let mut result = Value::Null;
        for stmt in block {
            result = self.exec(stmt, env)?;
        }
        Ok(result)
    }

    /// Execute one statement, stamping its position onto escaping errors
    fn exec(&mut self, stmt: &Spanned<Stmt>, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.exec_inner(&stmt.node, env)
        })
        .map_err(|e| e.at(stmt.pos))
    }

    fn exec_inner(&mut self, stmt: &Stmt, env: &EnvRef) -> InterpResult<Value> {
        match stmt {
            Stmt::Declare { name, data_type } => {
                let value = self.default_value(data_type, env, 0)?;
                env.borrow_mut().declare(name.as_str(), value);
                Ok(Value::Null)
            }

            Stmt::Constant { name, value } => {
                let value = self.eval(value, env)?;
                env.borrow_mut().declare_constant(name.as_str(), value);
                Ok(Value::Null)
            }

            Stmt::Assignment { target, value } => {
                let value = self.eval(value, env)?;
                self.assign(target, value.clone(), env)?;
                Ok(value)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.exec_block(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, env)
                } else {
                    Ok(Value::Null)
                }
            }

            Stmt::Case {
                subject,
                clauses,
                otherwise,
            } => {
                let subject = self.eval(subject, env)?;
                for clause in clauses {
                    for selector in &clause.selectors {
                        if self.case_matches(&subject, selector, env)? {
                            return self.exec_block(&clause.body, env);
                        }
                    }
                }
                match otherwise {
                    Some(body) => self.exec_block(body, env),
                    None => Ok(Value::Null),
                }
            }

            Stmt::For {
                variable,
                start,
                end,
                step,
                body,
            } => self.exec_for(variable, start, end, step.as_ref(), body, env),

            Stmt::While { condition, body } => {
                while self.eval(condition, env)?.is_truthy() {
                    self.exec_block(body, env)?;
                }
                Ok(Value::Null)
            }

            Stmt::Repeat { body, condition } => {
                loop {
                    self.exec_block(body, env)?;
                    if self.eval(condition, env)?.is_truthy() {
                        break;
                    }
                }
                Ok(Value::Null)
            }

            Stmt::Procedure(decl) | Stmt::Function(decl) => {
                let routine = Routine::new(decl.clone(), Rc::clone(env));
                env.borrow_mut()
                    .declare(decl.name.as_str(), Value::Routine(Rc::new(routine)));
                Ok(Value::Null)
            }

            Stmt::Call { callee, args } => {
                self.eval_call(callee, args, env)?;
                Ok(Value::Null)
            }

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                Err(RuntimeError::return_signal(value))
            }

            Stmt::Input(target) => {
                let mut line = String::new();
                self.input
                    .read_line(&mut line)
                    .map_err(|e| RuntimeError::io_error(format!("input error: {e}")))?;
                let line = line.trim_end_matches(['\r', '\n']);
                let value = self.coerce_line(target, line, env);
                self.assign(target, value, env)?;
                Ok(Value::Null)
            }

            Stmt::Output(exprs) => {
                let mut text = String::new();
                for expr in exprs {
                    text.push_str(&self.eval(expr, env)?.to_string());
                }
                writeln!(self.output, "{text}")
                    .map_err(|e| RuntimeError::io_error(format!("output error: {e}")))?;
                Ok(Value::Null)
            }

            Stmt::OpenFile { file, mode } => {
                let name = self.filename(file, env)?;
                self.host.files.open(&name, *mode)?;
                Ok(Value::Null)
            }

            Stmt::CloseFile(file) => {
                let name = self.filename(file, env)?;
                self.host.files.close(&name)?;
                Ok(Value::Null)
            }

            Stmt::ReadFile { file, target } => {
                let name = self.filename(file, env)?;
                if let Some(line) = self.host.files.read_line(&name)? {
                    let value = self.coerce_line(target, &line, env);
                    self.assign(target, value, env)?;
                }
                Ok(Value::Null)
            }

            Stmt::WriteFile { file, data } => {
                let name = self.filename(file, env)?;
                let text = self.eval(data, env)?.to_string();
                self.host.files.write_line(&name, &text)?;
                Ok(Value::Null)
            }

            Stmt::TypeDecl { name, definition } => {
                let mut scope = env.borrow_mut();
                if let TypeDefinition::Enum(values) = definition {
                    for (ordinal, value) in values.iter().enumerate() {
                        scope.declare(value.as_str(), Value::Integer(ordinal as i64));
                    }
                }
                scope.define_type(name.as_str(), definition.clone());
                Ok(Value::Null)
            }

            Stmt::Class(decl) => {
                self.declare_class(decl, env)?;
                Ok(Value::Null)
            }

            Stmt::Expression(expr) => self.eval(expr, env),
        }
    }

    fn exec_for(
        &mut self,
        variable: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &[Spanned<Stmt>],
        env: &EnvRef,
    ) -> InterpResult<Value> {
        let start = self
            .eval(start, env)?
            .as_int()
            .ok_or_else(|| RuntimeError::type_mismatch("FOR loop start must be an integer"))?;
        let end = self
            .eval(end, env)?
            .as_int()
            .ok_or_else(|| RuntimeError::type_mismatch("FOR loop end must be an integer"))?;
        let step = match step {
            Some(expr) => self
                .eval(expr, env)?
                .as_int()
                .ok_or_else(|| RuntimeError::type_mismatch("FOR loop step must be an integer"))?,
            None => 1,
        };

        let loop_env = child_env(env);
        let mut current = start;
        loop {
            if (step > 0 && current > end) || (step < 0 && current < end) {
                break;
            }
            loop_env.borrow_mut().set(variable, Value::Integer(current))?;
            self.exec_block(body, &loop_env)?;
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(Value::Null)
    }

    fn case_matches(&mut self, subject: &Value, selector: &Expr, env: &EnvRef) -> InterpResult<bool> {
        if let Expr::Range { start, end } = selector {
            let start = self.eval(start, env)?;
            let end = self.eval(end, env)?;
            return Ok(match (subject, &start, &end) {
                (Value::Integer(v), Value::Integer(lo), Value::Integer(hi)) => lo <= v && v <= hi,
                (Value::Char(v), Value::Char(lo), Value::Char(hi)) => lo <= v && v <= hi,
                _ => false,
            });
        }
        let value = self.eval(selector, env)?;
        Ok(subject.structurally_equal(&value))
    }

    fn filename(&mut self, file: &Expr, env: &EnvRef) -> InterpResult<String> {
        match self.eval(file, env)? {
            Value::String(name) => Ok(name),
            _ => Err(RuntimeError::type_mismatch("filename must be a string")),
        }
    }

    /// Convert a line of text to the type the target currently holds
    ///
    /// Falls back to STRING when the target is unset or the text does not
    /// parse as that type.
    fn coerce_line(&mut self, target: &Expr, line: &str, env: &EnvRef) -> Value {
        let text = line.trim();
        let coerced = match self.eval(target, env) {
            Ok(Value::Integer(_)) => text.parse().map(Value::Integer).ok(),
            Ok(Value::Real(_)) => text.parse().map(Value::Real).ok(),
            Ok(Value::Char(_)) => {
                let mut chars = line.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            Ok(Value::Boolean(_)) => match text.to_ascii_uppercase().as_str() {
                "TRUE" => Some(Value::Boolean(true)),
                "FALSE" => Some(Value::Boolean(false)),
                _ => None,
            },
            Ok(Value::Date(_)) => NaiveDate::parse_from_str(text, "%d/%m/%Y")
                .map(Value::Date)
                .ok(),
            _ => None,
        };
        coerced.unwrap_or_else(|| Value::String(line.to_string()))
    }

    /// Store `value` into an identifier, array element or member
    fn assign(&mut self, target: &Expr, value: Value, env: &EnvRef) -> InterpResult<()> {
        match target {
            Expr::Ident(name) => env.borrow_mut().set_in_place(name, value),

            Expr::ArrayAccess { base, indices } => {
                let base = self.eval(base, env)?;
                let indices = self.eval_indices(indices, env)?;
                match base {
                    Value::Array(array) => array.borrow_mut().set(&indices, value),
                    _ => Err(RuntimeError::type_mismatch("not an array")),
                }
            }

            Expr::MemberAccess { base, member } => match self.eval(base, env)? {
                Value::Instance(instance) => {
                    instance.set_field(member, value);
                    Ok(())
                }
                Value::Record(mut record) => {
                    if !record.set(member, value) {
                        return Err(RuntimeError::type_mismatch(format!(
                            "field not found: {member}"
                        )));
                    }
                    // records are values: write the updated copy back to its holder
                    self.assign(base, Value::Record(record), env)
                }
                _ => Err(RuntimeError::type_mismatch(
                    "cannot access member of non-record/instance",
                )),
            },

            _ => Err(RuntimeError::type_mismatch("invalid assignment target")),
        }
    }

    /// Initial value for a declared type
    fn default_value(&self, ty: &DataType, env: &EnvRef, depth: usize) -> InterpResult<Value> {
        Ok(match ty {
            DataType::Primitive(p) => match p {
                PrimitiveType::Integer => Value::Integer(0),
                PrimitiveType::Real => Value::Real(0.0),
                PrimitiveType::String => Value::String(String::new()),
                PrimitiveType::Char => Value::Char(' '),
                PrimitiveType::Boolean => Value::Boolean(false),
                PrimitiveType::Date => Value::Date(NaiveDate::default()),
            },
            DataType::Array {
                dimensions,
                element,
            } => {
                let fill = self.default_value(element, env, depth + 1)?;
                ArrayValue::new(dimensions.clone(), fill)?.into_value()
            }
            DataType::Pointer(_) => Value::Null,
            DataType::Custom(name) => {
                let definition = env.borrow().get_type(name);
                match definition {
                    Some(TypeDefinition::Record(fields)) if depth < MAX_DEFAULT_DEPTH => {
                        let mut values = Vec::with_capacity(fields.len());
                        for field in &fields {
                            let value = self.default_value(&field.data_type, env, depth + 1)?;
                            values.push((field.name.clone(), value));
                        }
                        Value::Record(RecordValue {
                            type_name: name.clone(),
                            fields: values,
                        })
                    }
                    _ => Value::Null,
                }
            }
        })
    }

    fn declare_class(&mut self, decl: &ClassDecl, env: &EnvRef) -> InterpResult<()> {
        let parent = match &decl.parent {
            Some(parent) => Some(self.lookup_class(parent, env)?),
            None => None,
        };

        let class_env = child_env(env);
        let mut methods = HashMap::new();
        let mut fields = Vec::new();
        for member in &decl.members {
            match &member.node {
                Stmt::Declare { name, data_type } => fields.push((name.clone(), data_type.clone())),
                Stmt::Procedure(routine) | Stmt::Function(routine) => {
                    let method = Routine::new(routine.clone(), Rc::clone(&class_env));
                    methods.insert(routine.name.clone(), Rc::new(method));
                }
                other => {
                    tracing::debug!(class = %decl.name, statement = ?other, "ignoring class member");
                }
            }
        }

        tracing::debug!(
            class = %decl.name,
            parent = ?decl.parent,
            methods = methods.len(),
            fields = fields.len(),
            "declare class"
        );
        let class = Class {
            name: decl.name.clone(),
            parent,
            methods,
            fields,
        };
        env.borrow_mut()
            .declare(decl.name.as_str(), Value::Class(Rc::new(class)));
        Ok(())
    }

    fn lookup_class(&self, name: &str, env: &EnvRef) -> InterpResult<Rc<Class>> {
        let found = env.borrow().get(name);
        match found {
            Some(Value::Class(class)) => Ok(class),
            Some(_) => Err(RuntimeError::class_error(format!("{name} is not a class"))),
            None => Err(RuntimeError::class_error(format!("class not found: {name}"))),
        }
    }

    // ============ Expressions ============

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Expr, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Expr, env: &EnvRef) -> InterpResult<Value> {
        match expr {
            Expr::Ident(name) => {
                let found = env.borrow().get(name);
                match found {
                    Some(value) => Ok(value),
                    None => self
                        .builtins
                        .get(name)
                        .map(|b| Value::Builtin(*b))
                        .ok_or_else(|| RuntimeError::name_not_found(name)),
                }
            }
            Expr::IntegerLit(n) => Ok(Value::Integer(*n)),
            Expr::RealLit(x) => Ok(Value::Real(*x)),
            Expr::StringLit(s) => Ok(Value::String(s.clone())),
            Expr::CharLit(c) => Ok(Value::Char(*c)),
            Expr::BoolLit(b) => Ok(Value::Boolean(*b)),

            Expr::Prefix { op, operand } => {
                let value = self.eval(operand, env)?;
                prefix_op(*op, &value)
            }

            Expr::Infix { op, left, right } => {
                let left = self.eval(left, env)?;
                match (op, &left) {
                    (InfixOp::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
                    (InfixOp::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
                    _ => {}
                }
                let right = self.eval(right, env)?;
                binary_op(*op, &left, &right)
            }

            Expr::ArrayAccess { base, indices } => {
                let base = self.eval(base, env)?;
                let indices = self.eval_indices(indices, env)?;
                match base {
                    Value::Array(array) => array.borrow().get(&indices),
                    _ => Err(RuntimeError::type_mismatch("not an array")),
                }
            }

            Expr::MemberAccess { base, member } => {
                let base = self.eval(base, env)?;
                member_access(base, member)
            }

            Expr::Call { callee, args } => self.eval_call(callee, args, env),

            Expr::New { class, args } => self.instantiate(class, args, env),

            Expr::Super => {
                let found = env.borrow().get("SUPER");
                match found {
                    Some(value @ Value::SuperRef { .. }) => Ok(value),
                    _ => Err(RuntimeError::class_error(
                        "SUPER can only be used within a class method",
                    )),
                }
            }

            Expr::Range { .. } => Err(RuntimeError::type_mismatch(
                "range is only valid as a CASE selector",
            )),
        }
    }

    fn eval_indices(&mut self, indices: &[Expr], env: &EnvRef) -> InterpResult<Vec<i64>> {
        let mut out = Vec::with_capacity(indices.len());
        for index in indices {
            let value = self.eval(index, env)?;
            let index = value
                .as_int()
                .ok_or_else(|| RuntimeError::index_error("array index must be an integer"))?;
            out.push(index);
        }
        Ok(out)
    }

    fn eval_args(&mut self, args: &[Expr], env: &EnvRef) -> InterpResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    // ============ Calls ============

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &EnvRef) -> InterpResult<Value> {
        let callee = self.eval(callee, env)?;
        match callee {
            Value::Routine(routine) => {
                let (values, places) = self.bind_args(&routine, args, env)?;
                let frame = child_env(&routine.closure);
                self.invoke(&routine, frame, values, places, env)
            }
            Value::BoundMethod(bound) => {
                let (values, places) = self.bind_args(&bound.method, args, env)?;
                let frame = Self::method_env(&bound.instance, &bound.method, &bound.owner);
                self.invoke(&bound.method, frame, values, places, env)
            }
            Value::Builtin(builtin) => {
                let values = self.eval_args(args, env)?;
                (builtin.func)(&mut self.host, &values)
            }
            other => Err(RuntimeError::type_mismatch(format!(
                "not a function: {}",
                other.type_name()
            ))),
        }
    }

    /// Evaluate call arguments, resolving those bound to BYREF parameters
    /// to the caller storage they will be copied back into
    fn bind_args(
        &mut self,
        routine: &Routine,
        args: &[Expr],
        env: &EnvRef,
    ) -> InterpResult<(Vec<Value>, Vec<Option<Place>>)> {
        let mut values = Vec::with_capacity(args.len());
        let mut places = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let by_ref = routine
                .decl
                .params
                .get(i)
                .is_some_and(|param| param.mode == ParamMode::ByRef);
            let place = if by_ref && arg.is_assignable() {
                self.resolve_place(arg, env)?
            } else {
                None
            };
            let value = match &place {
                Some(place) => self.read_place(place, env)?,
                None => self.eval(arg, env)?,
            };
            values.push(value);
            places.push(place);
        }
        Ok((values, places))
    }

    /// Pin down where `expr` lives; `None` for values with no home to write to
    fn resolve_place(&mut self, expr: &Expr, env: &EnvRef) -> InterpResult<Option<Place>> {
        match expr {
            Expr::Ident(name) => {
                let bound = env.borrow().get(name).is_some();
                Ok(bound.then(|| Place::Variable(name.clone())))
            }

            Expr::ArrayAccess { base, indices } => {
                let base = self.eval(base, env)?;
                let indices = self.eval_indices(indices, env)?;
                match base {
                    Value::Array(array) => Ok(Some(Place::Element { array, indices })),
                    _ => Err(RuntimeError::type_mismatch("not an array")),
                }
            }

            Expr::MemberAccess { base, member } => {
                let holder = self.resolve_place(base, env)?;
                let value = match &holder {
                    Some(place) => self.read_place(place, env)?,
                    None => self.eval(base, env)?,
                };
                Ok(match (value, holder) {
                    (Value::Instance(instance), _) if instance.has_field(member) => {
                        Some(Place::Field {
                            instance,
                            member: member.clone(),
                        })
                    }
                    (Value::Record(_), Some(holder)) => Some(Place::RecordField {
                        holder: Box::new(holder),
                        member: member.clone(),
                    }),
                    _ => None,
                })
            }

            _ => Ok(None),
        }
    }

    fn read_place(&mut self, place: &Place, env: &EnvRef) -> InterpResult<Value> {
        match place {
            Place::Variable(name) => {
                let found = env.borrow().get(name);
                found.ok_or_else(|| RuntimeError::name_not_found(name))
            }
            Place::Element { array, indices } => array.borrow().get(indices),
            Place::Field { instance, member } => instance
                .get_field(member)
                .ok_or_else(|| RuntimeError::type_mismatch(format!("field not found: {member}"))),
            Place::RecordField { holder, member } => match self.read_place(holder, env)? {
                Value::Record(record) => record.get(member).cloned().ok_or_else(|| {
                    RuntimeError::type_mismatch(format!("field not found: {member}"))
                }),
                _ => Err(RuntimeError::type_mismatch(
                    "cannot access member of non-record/instance",
                )),
            },
        }
    }

    /// Copy a BYREF result back; constants passed BYREF are left untouched
    fn write_place(&mut self, place: &Place, value: Value, env: &EnvRef) -> InterpResult<()> {
        match place {
            Place::Variable(name) => {
                if env.borrow().is_constant(name) {
                    return Ok(());
                }
                env.borrow_mut().set_in_place(name, value)
            }
            Place::Element { array, indices } => array.borrow_mut().set(indices, value),
            Place::Field { instance, member } => {
                instance.set_field(member, value);
                Ok(())
            }
            Place::RecordField { holder, member } => match self.read_place(holder, env)? {
                Value::Record(mut record) => {
                    if !record.set(member, value) {
                        return Err(RuntimeError::type_mismatch(format!(
                            "field not found: {member}"
                        )));
                    }
                    self.write_place(holder, Value::Record(record), env)
                }
                _ => Err(RuntimeError::type_mismatch(
                    "cannot access member of non-record/instance",
                )),
            },
        }
    }

    /// Run `routine` in `frame`, then copy BYREF parameters back to the caller
    ///
    /// Arguments are bound positionally; missing ones stay unbound and extra
    /// ones are ignored.
    fn invoke(
        &mut self,
        routine: &Rc<Routine>,
        frame: EnvRef,
        args: Vec<Value>,
        places: Vec<Option<Place>>,
        caller: &EnvRef,
    ) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.invoke_inner(routine, frame, args, places, caller)
        })
    }

    fn invoke_inner(
        &mut self,
        routine: &Rc<Routine>,
        frame: EnvRef,
        args: Vec<Value>,
        places: Vec<Option<Place>>,
        caller: &EnvRef,
    ) -> InterpResult<Value> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::stack_overflow(self.max_call_depth));
        }

        let decl = &routine.decl;
        {
            let mut scope = frame.borrow_mut();
            for (param, arg) in decl.params.iter().zip(args) {
                scope.declare(param.name.as_str(), arg);
            }
        }

        tracing::trace!(routine = %decl.name, depth = self.call_depth, "call");
        self.call_depth += 1;
        let result = self.exec_block(&decl.body, &frame);
        self.call_depth -= 1;

        let returned = match result {
            Ok(_) => Value::Null,
            Err(e) => match e.kind {
                ErrorKind::Return(value) => *value,
                _ => return Err(e),
            },
        };

        for (param, place) in decl.params.iter().zip(places) {
            let Some(place) = place else {
                continue;
            };
            let value = frame.borrow().bindings().get(&param.name).cloned();
            if let Some(value) = value {
                self.write_place(&place, value, caller)?;
            }
        }

        Ok(if routine.is_function() {
            returned
        } else {
            Value::Null
        })
    }

    // ============ Objects ============

    fn instantiate(&mut self, class_name: &str, args: &[Expr], env: &EnvRef) -> InterpResult<Value> {
        let class = self.lookup_class(class_name, env)?;
        let instance = Rc::new(Instance::new(Rc::clone(&class)));

        for ancestor in Class::lineage(&class).iter().rev() {
            for (name, ty) in &ancestor.fields {
                let value = self.default_value(ty, env, 0)?;
                instance.set_field(name, value);
            }
        }

        if let Some((owner, constructor)) = Class::resolve(&class, "NEW") {
            let (values, places) = self.bind_args(&constructor, args, env)?;
            let frame = Self::method_env(&instance, &constructor, &owner);
            self.invoke(&constructor, frame, values, places, env)?;
        }

        tracing::debug!(class = %class.name, "new instance");
        Ok(Value::Instance(instance))
    }

    /// Scope for a method body declared in `owner` running against `instance`
    fn method_env(instance: &Rc<Instance>, method: &Routine, owner: &Rc<Class>) -> EnvRef {
        let env = child_env(&method.closure);
        {
            let mut scope = env.borrow_mut();
            scope.set_instance(Rc::clone(instance));
            scope.declare("this", Value::Instance(Rc::clone(instance)));
            if let Some(parent) = &owner.parent {
                scope.declare(
                    "SUPER",
                    Value::SuperRef {
                        instance: Rc::clone(instance),
                        class: Rc::clone(parent),
                    },
                );
            }
            for class in Class::lineage(&instance.class) {
                for (name, method) in &class.methods {
                    if scope.declares(name) {
                        continue;
                    }
                    let bound = BoundMethod {
                        instance: Rc::clone(instance),
                        method: Rc::clone(method),
                        owner: Rc::clone(&class),
                    };
                    scope.declare(name.as_str(), Value::BoundMethod(bound));
                }
            }
        }
        env
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Operators ============

fn prefix_op(op: PrefixOp, value: &Value) -> InterpResult<Value> {
    match (op, value) {
        (PrefixOp::Neg, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
        (PrefixOp::Neg, Value::Real(x)) => Ok(Value::Real(-x)),
        (PrefixOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        _ => Err(RuntimeError::type_mismatch(format!(
            "unknown operator: {op}{}{}",
            if op == PrefixOp::Not { " " } else { "" },
            value.type_name()
        ))),
    }
}

fn is_arithmetic(op: InfixOp) -> bool {
    matches!(
        op,
        InfixOp::Add | InfixOp::Sub | InfixOp::Mul | InfixOp::Div | InfixOp::IntDiv | InfixOp::Mod
    )
}

fn mismatch(op: InfixOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(format!(
        "type mismatch: {} {op} {}",
        left.type_name(),
        right.type_name()
    ))
}

fn compare(op: InfixOp, ordering: Option<Ordering>) -> Value {
    let result = match (op, ordering) {
        (InfixOp::Eq, Some(o)) => o == Ordering::Equal,
        (InfixOp::Ne, Some(o)) => o != Ordering::Equal,
        (InfixOp::Ne, None) => true,
        (InfixOp::Lt, Some(o)) => o == Ordering::Less,
        (InfixOp::Gt, Some(o)) => o == Ordering::Greater,
        (InfixOp::Le, Some(o)) => o != Ordering::Greater,
        (InfixOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    };
    Value::Boolean(result)
}

/// Apply an infix operator to two evaluated operands
pub fn binary_op(op: InfixOp, left: &Value, right: &Value) -> InterpResult<Value> {
    use Value::{Boolean, Char, Date, Integer, Real};

    match (left, right) {
        (Integer(a), Integer(b)) if is_arithmetic(op) || op.is_comparison() => {
            integer_op(op, *a, *b)
        }
        (Integer(_) | Real(_), Integer(_) | Real(_)) if is_arithmetic(op) || op.is_comparison() => {
            match (left.as_real(), right.as_real()) {
                (Some(a), Some(b)) => real_op(op, a, b).ok_or_else(|| mismatch(op, left, right))?,
                _ => Err(mismatch(op, left, right)),
            }
        }
        (Value::String(a), Value::String(b)) if op == InfixOp::Concat => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::String(a), Value::String(b)) if op.is_comparison() => {
            Ok(compare(op, a.partial_cmp(b)))
        }
        (Char(a), Char(b)) if op.is_comparison() => Ok(compare(op, a.partial_cmp(b))),
        (Date(a), Date(b)) if op.is_comparison() => Ok(compare(op, a.partial_cmp(b))),
        (Boolean(a), Boolean(b)) => match op {
            InfixOp::And => Ok(Boolean(*a && *b)),
            InfixOp::Or => Ok(Boolean(*a || *b)),
            InfixOp::Eq => Ok(Boolean(a == b)),
            InfixOp::Ne => Ok(Boolean(a != b)),
            InfixOp::Concat => Ok(Value::String(format!("{left}{right}"))),
            _ => Err(mismatch(op, left, right)),
        },
        _ if op == InfixOp::Concat => Ok(Value::String(format!("{left}{right}"))),
        _ if op == InfixOp::Eq => Ok(Boolean(left.structurally_equal(right))),
        _ if op == InfixOp::Ne => Ok(Boolean(!left.structurally_equal(right))),
        _ => Err(mismatch(op, left, right)),
    }
}

fn integer_op(op: InfixOp, a: i64, b: i64) -> InterpResult<Value> {
    Ok(match op {
        InfixOp::Add => Value::Integer(a.wrapping_add(b)),
        InfixOp::Sub => Value::Integer(a.wrapping_sub(b)),
        InfixOp::Mul => Value::Integer(a.wrapping_mul(b)),
        InfixOp::Div => {
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Real(a as f64 / b as f64)
        }
        InfixOp::IntDiv => {
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Integer(a.wrapping_div(b))
        }
        InfixOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Integer(a.wrapping_rem(b))
        }
        _ => compare(op, Some(a.cmp(&b))),
    })
}

/// `None` for operators reals do not support
fn real_op(op: InfixOp, a: f64, b: f64) -> Option<InterpResult<Value>> {
    Some(Ok(match op {
        InfixOp::Add => Value::Real(a + b),
        InfixOp::Sub => Value::Real(a - b),
        InfixOp::Mul => Value::Real(a * b),
        InfixOp::Div => {
            if b == 0.0 {
                return Some(Err(RuntimeError::division_by_zero()));
            }
            Value::Real(a / b)
        }
        InfixOp::IntDiv | InfixOp::Mod => return None,
        _ => compare(op, a.partial_cmp(&b)),
    }))
}

fn member_access(base: Value, member: &str) -> InterpResult<Value> {
    match base {
        Value::Record(record) => record
            .get(member)
            .cloned()
            .ok_or_else(|| RuntimeError::type_mismatch(format!("field not found: {member}"))),
        Value::Instance(instance) => {
            if let Some(field) = instance.get_field(member) {
                return Ok(field);
            }
            let (owner, method) = Class::resolve(&instance.class, member)
                .ok_or_else(|| RuntimeError::class_error(format!("member not found: {member}")))?;
            Ok(Value::BoundMethod(BoundMethod {
                instance,
                method,
                owner,
            }))
        }
        Value::SuperRef { instance, class } => {
            let (owner, method) = Class::resolve(&class, member).ok_or_else(|| {
                RuntimeError::class_error(format!("method not found in parent class: {member}"))
            })?;
            Ok(Value::BoundMethod(BoundMethod {
                instance,
                method,
                owner,
            }))
        }
        _ => Err(RuntimeError::type_mismatch(
            "cannot access member of non-record/instance",
        )),
    }
}
