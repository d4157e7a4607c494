/*!
 * Lotus Script
 * Lexer, parser, and tree-walking interpreter for unit source text
 */

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod value;

pub use interpreter::{call, Interpreter};
pub use lexer::SyntaxError;
pub use parser::parse;
pub use scope::{Env, Scope, ScopeArena};
pub use value::{Function, ListRef, NativeFn, ObjectRef, ScriptError, ScriptResult, Value};
