//! Command templates for every package manager family.
//!
//! Each variant maps every [`Operation`] to either a command template or an
//! explicit [`Template::Unsupported`] marker. Templates are shell-words
//! strings with two kinds of placeholders:
//!
//! - `{}` anywhere inside a token is replaced by the next argument, verbatim
//! - a token that is exactly `{..}` expands to all remaining arguments
//!
//! Rendering never goes through a shell, so an argument is always exactly one
//! argv element.

mod apt;
mod snap;
mod yum;
mod zypper;

use std::fmt;

use crate::error::{PackagingError, Result};
use crate::variant::{Operation, Variant};

/// Placeholder for a single positional argument.
pub const ARG: &str = "{}";

/// Placeholder token for one or more trailing arguments.
pub const REST: &str = "{..}";

/// Command template for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Supported {
        program: &'static str,
        args: &'static str,
    },
    Unsupported,
}

impl Template {
    pub const fn new(program: &'static str, args: &'static str) -> Self {
        Template::Supported { program, args }
    }
}

/// A rendered command: the program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// All argv elements including the program.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(self.argv()))
    }
}

/// Capability shared by all package manager families.
pub trait CommandSet {
    fn template(&self, operation: Operation) -> Template;

    fn is_supported(&self, operation: Operation) -> bool {
        matches!(self.template(operation), Template::Supported { .. })
    }

    fn render(&self, operation: Operation, args: &[&str]) -> Result<CommandLine>;
}

impl CommandSet for Variant {
    fn template(&self, operation: Operation) -> Template {
        match self {
            Variant::Apt => apt::template(operation),
            Variant::Yum => yum::template(operation),
            Variant::Zypper => zypper::template(operation),
            Variant::Snap => snap::template(operation),
        }
    }

    fn render(&self, operation: Operation, args: &[&str]) -> Result<CommandLine> {
        match self.template(operation) {
            Template::Supported { program, args: arg_template } => {
                render_template(*self, operation, program, arg_template, args)
            }
            Template::Unsupported => Err(PackagingError::Unsupported {
                variant: *self,
                operation,
            }),
        }
    }
}

fn render_template(
    variant: Variant,
    operation: Operation,
    program: &str,
    arg_template: &str,
    args: &[&str],
) -> Result<CommandLine> {
    let mut tokens = split(variant, operation, program)?;
    tokens.extend(split(variant, operation, arg_template)?);

    let fixed: usize = tokens
        .iter()
        .filter(|t| t.as_str() != REST)
        .map(|t| t.matches(ARG).count())
        .sum();
    let variadic = tokens.iter().any(|t| t == REST);

    let arity_ok = if variadic {
        args.len() > fixed
    } else {
        args.len() == fixed
    };
    if !arity_ok {
        return Err(PackagingError::TemplateArity {
            variant,
            operation,
            expected: if variadic {
                format!("at least {}", fixed + 1)
            } else {
                fixed.to_string()
            },
            got: args.len(),
        });
    }

    let mut remaining = args.iter();
    let mut argv = Vec::with_capacity(tokens.len() + args.len());
    for token in tokens {
        if token == REST {
            argv.extend(remaining.by_ref().map(|a| a.to_string()));
            continue;
        }
        let mut pieces = token.split(ARG);
        let mut rendered = pieces.next().unwrap_or_default().to_string();
        for piece in pieces {
            // Arity was checked above, so there is always an argument left.
            if let Some(arg) = remaining.next() {
                rendered.push_str(arg);
            }
            rendered.push_str(piece);
        }
        argv.push(rendered);
    }

    let mut argv = argv.into_iter();
    let program = argv.next().ok_or_else(|| PackagingError::TemplateArity {
        variant,
        operation,
        expected: "a program".to_string(),
        got: 0,
    })?;
    Ok(CommandLine {
        program,
        args: argv.collect(),
    })
}

fn split(variant: Variant, operation: Operation, s: &str) -> Result<Vec<String>> {
    shell_words::split(s).map_err(|e| PackagingError::MalformedOutput {
        command: format!("{} template for {}", variant, operation),
        reason: e.to_string(),
        output: s.to_string(),
    })
}
